use crate::actions::ActionResult;
use crate::auth::CurrentUser;
use crate::db::models::{Post, PostWithAuthor};
use crate::error::AppError;
use crate::posts::service::POST_NOT_FOUND;
use crate::posts::{Page, PostService};
use crate::validation::{validate_word_count, PostFields, PostPatchFields, WordCountReport};

fn login_required(what: &str) -> AppError {
    AppError::Auth(format!("You must be logged in to {} a post", what))
}

pub async fn create_post(
    posts: &PostService,
    user: Option<&CurrentUser>,
    fields: PostFields,
) -> ActionResult<Post> {
    let Some(user) = user else {
        return ActionResult::fail(login_required("create"));
    };
    ActionResult::from_result(posts.create_post(&user.person_id, fields).await)
}

pub async fn save_post_draft(
    posts: &PostService,
    user: Option<&CurrentUser>,
    fields: PostFields,
) -> ActionResult<Post> {
    let fields = PostFields {
        is_draft: Some(true),
        ..fields
    };
    create_post(posts, user, fields).await
}

pub async fn publish_post(
    posts: &PostService,
    user: Option<&CurrentUser>,
    fields: PostFields,
) -> ActionResult<Post> {
    let fields = PostFields {
        is_draft: Some(false),
        ..fields
    };
    create_post(posts, user, fields).await
}

pub async fn get_posts(posts: &PostService, page: Page) -> ActionResult<Vec<PostWithAuthor>> {
    ActionResult::from_result(posts.get_published_posts(page).await)
}

pub async fn get_post(posts: &PostService, post_id: &str) -> ActionResult<PostWithAuthor> {
    match posts.get_post_by_id(post_id).await {
        Ok(Some(post)) => ActionResult::ok(post),
        Ok(None) => ActionResult::fail(AppError::NotFound(POST_NOT_FOUND.into())),
        Err(err) => ActionResult::fail(err),
    }
}

/// The caller's own drafts.
pub async fn get_drafts(
    posts: &PostService,
    user: Option<&CurrentUser>,
) -> ActionResult<Vec<PostWithAuthor>> {
    let Some(user) = user else {
        return ActionResult::fail(AppError::Auth(
            "You must be logged in to see your drafts".into(),
        ));
    };
    ActionResult::from_result(posts.get_drafts_by_author(&user.person_id).await)
}

pub async fn update_post(
    posts: &PostService,
    user: Option<&CurrentUser>,
    post_id: &str,
    patch: PostPatchFields,
) -> ActionResult<Post> {
    let Some(user) = user else {
        return ActionResult::fail(login_required("update"));
    };
    ActionResult::from_result(posts.update_owned_post(&user.person_id, post_id, patch).await)
}

pub async fn delete_post(
    posts: &PostService,
    user: Option<&CurrentUser>,
    post_id: &str,
) -> ActionResult<()> {
    let Some(user) = user else {
        return ActionResult::fail(login_required("delete"));
    };
    match posts.delete_owned_post(&user.person_id, post_id).await {
        Ok(_) => ActionResult::done(),
        Err(err) => ActionResult::fail(err),
    }
}

/// Pre-submit length check. Same rule the server applies on save.
pub fn check_word_count(content: &str) -> ActionResult<WordCountReport> {
    ActionResult::ok(validate_word_count(content))
}
