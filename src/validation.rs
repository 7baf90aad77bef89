//! Field rules for posts and accounts.
//!
//! The server gate (`PostFields::validate`) and the pre-submit check
//! (`validate_word_count`, served at `/api/validate/word-count`) share
//! `count_words`, so a client that calls the endpoint can never disagree
//! with the server about a post's length.

use serde::{Deserialize, Serialize};

use crate::db::models::Visibility;
use crate::error::{AppError, AppResult};

pub const MAX_WORDS: usize = 100;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_TOPIC_CHARS: usize = 50;
pub const MAX_BIO_CHARS: usize = 500;
pub const DEFAULT_TITLE: &str = "Untitled";

/// Number of whitespace-separated tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCountReport {
    pub is_valid: bool,
    pub count: usize,
    pub message: String,
}

pub fn validate_word_count(content: &str) -> WordCountReport {
    let count = count_words(content);
    let message = if count > MAX_WORDS {
        format!(
            "{}/{} words - please reduce by {}",
            count,
            MAX_WORDS,
            count - MAX_WORDS
        )
    } else {
        format!("{}/{} words - {} remaining", count, MAX_WORDS, MAX_WORDS - count)
    };
    WordCountReport {
        is_valid: count <= MAX_WORDS,
        count,
        message,
    }
}

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

fn check_content(content: &str) -> AppResult<()> {
    match count_words(content) {
        0 => Err(invalid("Content cannot be empty")),
        n if n > MAX_WORDS => Err(invalid("Post content must be 100 words or less")),
        _ => Ok(()),
    }
}

fn check_title(title: &str) -> AppResult<()> {
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(invalid("Title must be 200 characters or less"));
    }
    Ok(())
}

fn check_topic(topic: &str) -> AppResult<()> {
    if topic.chars().count() > MAX_TOPIC_CHARS {
        return Err(invalid("Topic must be 50 characters or less"));
    }
    Ok(())
}

fn parse_visibility(raw: &str) -> AppResult<Visibility> {
    raw.parse().map_err(invalid)
}

/// Trimmed, or `None` when nothing but whitespace.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Post fields as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFields {
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    pub is_draft: Option<bool>,
    pub visibility: Option<String>,
    pub topic: Option<String>,
}

/// A post that passed validation, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    pub visibility: Visibility,
    pub topic: Option<String>,
}

impl PostFields {
    pub fn validate(self) -> AppResult<NewPost> {
        check_content(&self.content)?;

        let title = non_blank(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string());
        check_title(&title)?;

        let topic = non_blank(self.topic);
        if let Some(ref topic) = topic {
            check_topic(topic)?;
        }

        let visibility = match self.visibility.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_visibility(raw.trim())?,
            _ => Visibility::default(),
        };

        Ok(NewPost {
            title,
            content: self.content,
            is_draft: self.is_draft.unwrap_or(true),
            visibility,
            topic,
        })
    }
}

/// A partial update as submitted by a client. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatchFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_draft: Option<bool>,
    pub visibility: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_draft: Option<bool>,
    pub visibility: Option<Visibility>,
    /// `Some(None)` clears the topic.
    pub topic: Option<Option<String>>,
}

impl PostPatchFields {
    pub fn validate(self) -> AppResult<PostPatch> {
        // A blank title leaves the current one alone
        let title = non_blank(self.title);
        if let Some(ref title) = title {
            check_title(title)?;
        }

        if let Some(ref content) = self.content {
            check_content(content)?;
        }

        let topic = match self.topic {
            None => None,
            Some(raw) => {
                let topic = non_blank(Some(raw));
                if let Some(ref t) = topic {
                    check_topic(t)?;
                }
                Some(topic)
            }
        };

        let visibility = self
            .visibility
            .as_deref()
            .map(|raw| parse_visibility(raw.trim()))
            .transpose()?;

        Ok(PostPatch {
            title,
            content: self.content,
            is_draft: self.is_draft,
            visibility,
            topic,
        })
    }
}

pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub bio: Option<String>,
}

impl SignupInput {
    /// Checks every field and returns the input with the username trimmed and
    /// a blank bio dropped.
    pub fn validate(self) -> AppResult<Self> {
        let username = self.username.trim().to_string();
        let username_len = username.chars().count();
        if username_len < 3 {
            return Err(invalid("Username must be at least 3 characters"));
        }
        if username_len > 50 {
            return Err(invalid("Username must be 50 characters or less"));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(invalid(
                "Username can only contain letters, numbers, underscores, and periods",
            ));
        }

        if self.password.chars().count() < 8 {
            return Err(invalid("Password must be at least 8 characters"));
        }
        // bcrypt only reads the first 72 bytes
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(invalid("Password must be 72 bytes or less"));
        }

        let display_name = self.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(invalid("Display name is required"));
        }
        if display_name.chars().count() > 100 {
            return Err(invalid("Display name must be 100 characters or less"));
        }

        let bio = non_blank(self.bio);
        if bio
            .as_ref()
            .is_some_and(|b| b.chars().count() > MAX_BIO_CHARS)
        {
            return Err(invalid("Bio must be 500 characters or less"));
        }

        Ok(SignupInput {
            username,
            password: self.password,
            display_name,
            bio,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn validate(self) -> AppResult<Self> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(invalid("Username is required"));
        }
        if self.password.is_empty() {
            return Err(invalid("Password is required"));
        }
        Ok(LoginInput {
            username,
            password: self.password,
        })
    }
}
