use crate::actions::{ActionResult, WithCookie};
use crate::auth::{AuthService, SessionIdentity};
use crate::db::models::Person;
use crate::error::AppResult;
use crate::validation::{LoginInput, SignupInput};

fn start_session(auth: &AuthService, outcome: AppResult<Person>) -> WithCookie<SessionIdentity> {
    match outcome {
        Ok(person) => WithCookie {
            set_cookie: Some(auth.create_session(&person.id, &person.username)),
            result: ActionResult::ok(SessionIdentity {
                person_id: person.id,
                username: person.username,
            }),
        },
        Err(err) => WithCookie {
            result: ActionResult::fail(err),
            set_cookie: None,
        },
    }
}

/// Creates the account and logs the new person in.
pub async fn signup(auth: &AuthService, input: SignupInput) -> WithCookie<SessionIdentity> {
    start_session(auth, auth.signup(input).await)
}

pub async fn login(auth: &AuthService, input: LoginInput) -> WithCookie<SessionIdentity> {
    start_session(auth, auth.login(input).await)
}

/// Always succeeds, logged in or not.
pub fn logout(auth: &AuthService) -> WithCookie<()> {
    WithCookie {
        result: ActionResult::done(),
        set_cookie: Some(auth.destroy_session()),
    }
}
