use thiserror::Error;
use url::Url;

pub const INSTAGRAM_BASE_URL: &str = "https://www.instagram.com";
pub const MAX_USERNAME_LEN: usize = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid profile URL: {0}")]
    InvalidUrl(String),
}

/// Turns a bare handle, an `@handle` or a profile URL into a canonical username.
///
/// URLs contribute their first non-empty path segment; query strings and
/// trailing slashes are ignored. The result always matches
/// `^[A-Za-z0-9._]{1,30}$`.
pub fn normalize_username(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();

    let candidate = if has_url_scheme(trimmed) {
        let url = Url::parse(trimmed).map_err(|_| ValidationError::InvalidUrl(input.to_string()))?;
        url.path_segments()
            .and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| ValidationError::InvalidUrl(input.to_string()))?
    } else {
        trimmed.strip_prefix('@').unwrap_or(trimmed).trim().to_string()
    };

    if is_valid_username(&candidate) {
        Ok(candidate)
    } else {
        Err(ValidationError::InvalidUsername(input.to_string()))
    }
}

pub fn is_valid_username(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_USERNAME_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

/// Public profile page for an already normalized username, e.g.
/// `profile_url(INSTAGRAM_BASE_URL, "drake")`.
pub fn profile_url(base_url: &str, username: &str) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), username)
}

fn has_url_scheme(input: &str) -> bool {
    match input.split_once("://") {
        Some((scheme, _)) => {
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
