use std::sync::Arc;

use crate::db::models::{Post, PostWithAuthor};
use crate::db::{now_timestamp, RepositoryError};
use crate::error::{AppError, AppResult};
use crate::posts::repository::{OwnedWrite, Page, PostRepository};
use crate::validation::{PostFields, PostPatchFields};

pub const POST_NOT_FOUND: &str = "Post not found";
pub const NOT_YOUR_POST_TO_EDIT: &str = "You can only edit your own posts";
pub const NOT_YOUR_POST_TO_DELETE: &str = "You can only delete your own posts";
pub const AUTHOR_GONE: &str = "Your account no longer exists, please log in again";

/// Post CRUD. Every write validates through `crate::validation`.
///
/// `update_post` and `delete_post` trust the caller to have checked ownership.
/// Request-facing code goes through `update_owned_post` / `delete_owned_post`,
/// which check ownership inside the write.
#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_post(&self, author_id: &str, fields: PostFields) -> AppResult<Post> {
        let post = fields.validate()?;
        let created = self
            .repo
            .insert(author_id, &post, &now_timestamp())
            .await
            .map_err(|e| match e {
                // a signed session can outlive the account it names
                RepositoryError::MissingReference(_) => AppError::Auth(AUTHOR_GONE.into()),
                other => other.into(),
            })?;
        tracing::info!(post_id = %created.id, author_id, draft = created.is_draft, "Post created");
        Ok(created)
    }

    pub async fn get_published_posts(&self, page: Page) -> AppResult<Vec<PostWithAuthor>> {
        Ok(self.repo.list_published(page).await?)
    }

    pub async fn get_published_posts_by_author(
        &self,
        author_id: &str,
    ) -> AppResult<Vec<PostWithAuthor>> {
        Ok(self.repo.list_published_by_author(author_id).await?)
    }

    pub async fn get_drafts_by_author(&self, author_id: &str) -> AppResult<Vec<PostWithAuthor>> {
        Ok(self.repo.list_drafts_by_author(author_id).await?)
    }

    pub async fn get_post_by_id(&self, id: &str) -> AppResult<Option<PostWithAuthor>> {
        Ok(self.repo.find_by_id(id).await?)
    }

    /// Unchecked update. `None` when no such post.
    pub async fn update_post(&self, id: &str, patch: PostPatchFields) -> AppResult<Option<Post>> {
        let patch = patch.validate()?;
        Ok(self.repo.update(id, &patch, &now_timestamp()).await?)
    }

    /// Unchecked delete. Returns the removed row, `None` when no such post.
    pub async fn delete_post(&self, id: &str) -> AppResult<Option<Post>> {
        Ok(self.repo.delete(id).await?)
    }

    pub async fn update_owned_post(
        &self,
        actor_id: &str,
        post_id: &str,
        patch: PostPatchFields,
    ) -> AppResult<Post> {
        let patch = patch.validate()?;
        match self
            .repo
            .update_owned(actor_id, post_id, &patch, &now_timestamp())
            .await?
        {
            OwnedWrite::Applied(post) => {
                tracing::info!(post_id, actor_id, "Post updated");
                Ok(post)
            }
            OwnedWrite::NotFound => Err(AppError::NotFound(POST_NOT_FOUND.into())),
            OwnedWrite::NotOwner => {
                tracing::warn!(post_id, actor_id, "Refused update of another person's post");
                Err(AppError::Forbidden(NOT_YOUR_POST_TO_EDIT.into()))
            }
        }
    }

    pub async fn delete_owned_post(&self, actor_id: &str, post_id: &str) -> AppResult<Post> {
        match self.repo.delete_owned(actor_id, post_id).await? {
            OwnedWrite::Applied(post) => {
                tracing::info!(post_id, actor_id, "Post deleted");
                Ok(post)
            }
            OwnedWrite::NotFound => Err(AppError::NotFound(POST_NOT_FOUND.into())),
            OwnedWrite::NotOwner => {
                tracing::warn!(post_id, actor_id, "Refused delete of another person's post");
                Err(AppError::Forbidden(NOT_YOUR_POST_TO_DELETE.into()))
            }
        }
    }
}
