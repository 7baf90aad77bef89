use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Person, Post, PostWithAuthor};
use crate::db::{is_foreign_key_violation, new_id, RepositoryError};
use crate::state::DbPool;
use crate::validation::{NewPost, PostPatch};

/// Outcome of a write that is only allowed for the post's author.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedWrite<T> {
    Applied(T),
    NotFound,
    NotOwner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// `MissingReference` when `author_id` names no person.
    async fn insert(
        &self,
        author_id: &str,
        post: &NewPost,
        now: &str,
    ) -> Result<Post, RepositoryError>;

    /// Published posts, newest first.
    async fn list_published(&self, page: Page) -> Result<Vec<PostWithAuthor>, RepositoryError>;

    async fn list_published_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<PostWithAuthor>, RepositoryError>;

    /// Drafts, most recently touched first.
    async fn list_drafts_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<PostWithAuthor>, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<PostWithAuthor>, RepositoryError>;

    /// Applies `patch` without looking at who owns the post.
    async fn update(
        &self,
        id: &str,
        patch: &PostPatch,
        now: &str,
    ) -> Result<Option<Post>, RepositoryError>;

    /// Applies `patch` only if `author_id` owns the post. The ownership test is
    /// part of the UPDATE itself.
    async fn update_owned(
        &self,
        author_id: &str,
        id: &str,
        patch: &PostPatch,
        now: &str,
    ) -> Result<OwnedWrite<Post>, RepositoryError>;

    async fn delete(&self, id: &str) -> Result<Option<Post>, RepositoryError>;

    async fn delete_owned(
        &self,
        author_id: &str,
        id: &str,
    ) -> Result<OwnedWrite<Post>, RepositoryError>;
}

pub struct SqlitePostRepository {
    pool: DbPool,
}

impl SqlitePostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn select_with_author(filter: &str, order: &str) -> String {
    format!(
        "SELECT {}, {} FROM posts JOIN persons p ON p.id = posts.author_id WHERE {} ORDER BY {}",
        Post::COLUMNS,
        Person::COLUMNS,
        filter,
        order
    )
}

fn query_with_author(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<PostWithAuthor>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, PostWithAuthor::from_row)?;
    rows.collect()
}

/// `owner = None` skips the ownership predicate.
fn apply_patch(
    conn: &Connection,
    id: &str,
    owner: Option<&str>,
    patch: &PostPatch,
    now: &str,
) -> rusqlite::Result<Option<Post>> {
    let sql = format!(
        "UPDATE posts SET
            title = COALESCE(?1, title),
            content = COALESCE(?2, content),
            is_draft = COALESCE(?3, is_draft),
            visibility = COALESCE(?4, visibility),
            topic = CASE WHEN ?5 THEN ?6 ELSE topic END,
            updated_at = ?7,
            last_modified_at = ?7
         WHERE id = ?8 AND (?9 IS NULL OR author_id = ?9)
         RETURNING {}",
        Post::RETURNING
    );
    conn.query_row(
        &sql,
        params![
            patch.title,
            patch.content,
            patch.is_draft,
            patch.visibility,
            patch.topic.is_some(),
            patch.topic.clone().flatten(),
            now,
            id,
            owner
        ],
        Post::from_row,
    )
    .optional()
}

fn remove(conn: &Connection, id: &str, owner: Option<&str>) -> rusqlite::Result<Option<Post>> {
    let sql = format!(
        "DELETE FROM posts WHERE id = ?1 AND (?2 IS NULL OR author_id = ?2) RETURNING {}",
        Post::RETURNING
    );
    conn.query_row(&sql, params![id, owner], Post::from_row)
        .optional()
}

/// Tells a missing post apart from someone else's after an owned write matched nothing.
fn miss(conn: &Connection, id: &str) -> rusqlite::Result<OwnedWrite<Post>> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(if exists {
        OwnedWrite::NotOwner
    } else {
        OwnedWrite::NotFound
    })
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn insert(
        &self,
        author_id: &str,
        post: &NewPost,
        now: &str,
    ) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "INSERT INTO posts (id, author_id, title, content, is_draft, visibility, topic, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING {}",
            Post::RETURNING
        );
        let created = conn.query_row(
            &sql,
            params![
                new_id(),
                author_id,
                post.title,
                post.content,
                post.is_draft,
                post.visibility,
                post.topic,
                now
            ],
            Post::from_row,
        );
        created.map_err(|e| {
            if is_foreign_key_violation(&e) {
                RepositoryError::MissingReference("posts.author_id".into())
            } else {
                e.into()
            }
        })
    }

    async fn list_published(&self, page: Page) -> Result<Vec<PostWithAuthor>, RepositoryError> {
        let conn = self.pool.get()?;
        // SQLite reads a negative LIMIT as "no limit"
        let limit = page.limit.map(i64::from).unwrap_or(-1);
        let offset = page.offset.map(i64::from).unwrap_or(0);
        let sql = format!(
            "{} LIMIT ?1 OFFSET ?2",
            select_with_author(
                "posts.is_draft = 0",
                "posts.created_at DESC, posts.id DESC"
            )
        );
        Ok(query_with_author(&conn, &sql, params![limit, offset])?)
    }

    async fn list_published_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<PostWithAuthor>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = select_with_author(
            "posts.is_draft = 0 AND posts.author_id = ?1",
            "posts.created_at DESC, posts.id DESC",
        );
        Ok(query_with_author(&conn, &sql, params![author_id])?)
    }

    async fn list_drafts_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<PostWithAuthor>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = select_with_author(
            "posts.is_draft = 1 AND posts.author_id = ?1",
            "posts.updated_at DESC, posts.id DESC",
        );
        Ok(query_with_author(&conn, &sql, params![author_id])?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PostWithAuthor>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = select_with_author("posts.id = ?1", "posts.id");
        let post = conn
            .query_row(&sql, params![id], PostWithAuthor::from_row)
            .optional()?;
        Ok(post)
    }

    async fn update(
        &self,
        id: &str,
        patch: &PostPatch,
        now: &str,
    ) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(apply_patch(&conn, id, None, patch, now)?)
    }

    async fn update_owned(
        &self,
        author_id: &str,
        id: &str,
        patch: &PostPatch,
        now: &str,
    ) -> Result<OwnedWrite<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        match apply_patch(&conn, id, Some(author_id), patch, now)? {
            Some(post) => Ok(OwnedWrite::Applied(post)),
            None => Ok(miss(&conn, id)?),
        }
    }

    async fn delete(&self, id: &str) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(remove(&conn, id, None)?)
    }

    async fn delete_owned(
        &self,
        author_id: &str,
        id: &str,
    ) -> Result<OwnedWrite<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        match remove(&conn, id, Some(author_id))? {
            Some(post) => Ok(OwnedWrite::Applied(post)),
            None => Ok(miss(&conn, id)?),
        }
    }
}
