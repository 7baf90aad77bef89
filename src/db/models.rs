use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Password,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMethod::Password => "password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Followers,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Followers => "followers",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "followers" => Ok(Visibility::Followers),
            "private" => Ok(Visibility::Private),
            other => Err(format!(
                "Visibility must be one of public, followers, private (got '{}')",
                other
            )),
        }
    }
}

impl ToSql for Visibility {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Visibility {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Credential record. Never serialized to clients.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub password_hash: String,
    pub login_method: LoginMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(skip)]
    pub account_id: String,
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub created_at: String,
}

impl Person {
    pub const COLUMNS: &'static str =
        "p.id, p.account_id, p.username, p.display_name, p.bio, p.created_at";

    /// Reads a person from `COLUMNS` starting at column `offset`.
    pub fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Person {
            id: row.get(offset)?,
            account_id: row.get(offset + 1)?,
            username: row.get(offset + 2)?,
            display_name: row.get(offset + 3)?,
            bio: row.get(offset + 4)?,
            created_at: row.get(offset + 5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    pub visibility: Visibility,
    pub topic: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub last_modified_at: Option<String>,
}

impl Post {
    pub const COLUMNS: &'static str = "posts.id, posts.author_id, posts.title, posts.content, \
         posts.is_draft, posts.visibility, posts.topic, posts.created_at, posts.updated_at, \
         posts.last_modified_at";

    /// Unqualified column list, for `RETURNING` clauses.
    pub const RETURNING: &'static str = "id, author_id, title, content, is_draft, visibility, \
         topic, created_at, updated_at, last_modified_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get(0)?,
            author_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            is_draft: row.get(4)?,
            visibility: row.get(5)?,
            topic: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            last_modified_at: row.get(9)?,
        })
    }
}

/// A post joined with its author, as the feed shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: Person,
}

impl PostWithAuthor {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PostWithAuthor {
            post: Post::from_row(row)?,
            author: Person::from_row(row, 10)?,
        })
    }
}
