use crate::accounts::AccountRepository;
use crate::actions::ActionResult;
use crate::db::models::{Person, PostWithAuthor};
use crate::error::{AppError, AppResult};
use crate::posts::PostService;

const PERSON_NOT_FOUND: &str = "Person not found";

async fn find_person(accounts: &dyn AccountRepository, username: &str) -> AppResult<Person> {
    accounts
        .find_person_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(PERSON_NOT_FOUND.into()))
}

pub async fn get_person(accounts: &dyn AccountRepository, username: &str) -> ActionResult<Person> {
    ActionResult::from_result(find_person(accounts, username).await)
}

/// A person's published posts, newest first.
pub async fn get_posts_by_author(
    accounts: &dyn AccountRepository,
    posts: &PostService,
    username: &str,
) -> ActionResult<Vec<PostWithAuthor>> {
    let result = async {
        let person = find_person(accounts, username).await?;
        posts.get_published_posts_by_author(&person.id).await
    }
    .await;
    ActionResult::from_result(result)
}
