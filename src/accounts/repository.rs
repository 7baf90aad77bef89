use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use crate::db::models::{Account, LoginMethod, Person};
use crate::db::{is_unique_violation, new_id, now_timestamp, RepositoryError};
use crate::state::DbPool;

/// Everything needed to create an account and its person in one go.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub password_hash: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn username_taken(&self, username: &str) -> Result<bool, RepositoryError>;

    /// Inserts the account and its person in a single transaction. Returns
    /// `UniqueViolation` if the username is taken, even when another writer
    /// claimed it after the caller's own check.
    async fn create_with_person(
        &self,
        new: &NewAccount,
    ) -> Result<(Account, Person), RepositoryError>;

    async fn find_person_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Person>, RepositoryError>;

    /// The person and the credentials that log them in.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(Person, Account)>, RepositoryError>;
}

pub struct SqliteAccountRepository {
    pool: DbPool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn username_exists(conn: &rusqlite::Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM persons WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn username_taken(&self, username: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(username_exists(&conn, username)?)
    }

    async fn create_with_person(
        &self,
        new: &NewAccount,
    ) -> Result<(Account, Person), RepositoryError> {
        let mut conn = self.pool.get()?;
        // IMMEDIATE takes the write lock up front, so concurrent signups queue
        // here instead of racing between the check and the insert
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if username_exists(&tx, &new.username)? {
            return Err(RepositoryError::UniqueViolation("persons.username".into()));
        }

        let account = Account {
            id: new_id(),
            password_hash: new.password_hash.clone(),
            login_method: LoginMethod::Password,
        };
        tx.execute(
            "INSERT INTO accounts (id, password_hash, login_method) VALUES (?1, ?2, ?3)",
            params![account.id, account.password_hash, account.login_method.as_str()],
        )?;

        let person = Person {
            id: new_id(),
            account_id: account.id.clone(),
            username: new.username.clone(),
            display_name: new.display_name.clone(),
            bio: new.bio.clone(),
            created_at: now_timestamp(),
        };
        tx.execute(
            "INSERT INTO persons (id, account_id, username, display_name, bio, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                person.id,
                person.account_id,
                person.username,
                person.display_name,
                person.bio,
                person.created_at
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::UniqueViolation("persons.username".into())
            } else {
                RepositoryError::Sql(e)
            }
        })?;

        tx.commit()?;
        Ok((account, person))
    }

    async fn find_person_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Person>, RepositoryError> {
        let conn = self.pool.get()?;
        let person = conn
            .query_row(
                &format!("SELECT {} FROM persons p WHERE p.username = ?1", Person::COLUMNS),
                params![username],
                |row| Person::from_row(row, 0),
            )
            .optional()?;
        Ok(person)
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(Person, Account)>, RepositoryError> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {}, a.id, a.password_hash FROM persons p
                     JOIN accounts a ON a.id = p.account_id
                     WHERE p.username = ?1",
                    Person::COLUMNS
                ),
                params![username],
                |row| {
                    let person = Person::from_row(row, 0)?;
                    let account = Account {
                        id: row.get(6)?,
                        password_hash: row.get(7)?,
                        login_method: LoginMethod::Password,
                    };
                    Ok((person, account))
                },
            )
            .optional()?;
        Ok(found)
    }
}
