use std::io::Cursor;

use rocket::http::{ContentType, Status};
use serde_json::json;

use crate::scrapers::instagram::{ScraperError, ValidationError};
use crate::storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    ScraperError(ScraperError),
    StorageError(StorageError),
    BadRequest(String),
    PayloadTooLarge(u64),
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Validation(error)
    }
}

impl From<ScraperError> for ApiError {
    fn from(error: ScraperError) -> Self {
        match error {
            ScraperError::Validation(e) => ApiError::Validation(e),
            other => ApiError::ScraperError(other),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        ApiError::StorageError(error)
    }
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::PayloadTooLarge(_) => Status::PayloadTooLarge,
            ApiError::StorageError(_) => Status::InternalServerError,
            ApiError::ScraperError(error) => match error {
                ScraperError::ProfileNotFound => Status::NotFound,
                ScraperError::RateLimited => Status::TooManyRequests,
                ScraperError::UnauthorizedAccess(_) => Status::Unauthorized,
                ScraperError::ProxyError(_) | ScraperError::HttpStatus(_) => Status::BadGateway,
                ScraperError::AllProxiesFailed | ScraperError::NetworkError(_) => Status::ServiceUnavailable,
                ScraperError::Timeout(_) => Status::GatewayTimeout,
                ScraperError::Validation(_) => Status::BadRequest,
            },
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Invalid username",
            ApiError::BadRequest(_) => "Bad request",
            ApiError::PayloadTooLarge(_) => "Payload too large",
            ApiError::StorageError(_) => "Storage error",
            ApiError::ScraperError(error) => match error {
                ScraperError::ProfileNotFound => "Profile not found",
                ScraperError::RateLimited => "Rate limited",
                ScraperError::UnauthorizedAccess(_) => "Unauthorized",
                ScraperError::ProxyError(_) => "Proxy error",
                ScraperError::AllProxiesFailed => "All proxies failed",
                ScraperError::NetworkError(_) => "Network error",
                ScraperError::Timeout(_) => "Timeout",
                ScraperError::HttpStatus(_) => "Upstream error",
                ScraperError::Validation(_) => "Invalid username",
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(error) => error.to_string(),
            ApiError::BadRequest(message) => message.clone(),
            ApiError::PayloadTooLarge(limit) => format!("Request body exceeds {} bytes", limit),
            ApiError::StorageError(error) => error.to_string(),
            ApiError::ScraperError(ScraperError::RateLimited) => {
                "Too many requests, please try again later".to_string()
            }
            ApiError::ScraperError(ScraperError::AllProxiesFailed) => {
                "All configured proxies failed to connect".to_string()
            }
            ApiError::ScraperError(ScraperError::UnauthorizedAccess(message)) => message.clone(),
            ApiError::ScraperError(error) => error.to_string(),
        }
    }
}

impl<'r> rocket::response::Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        let body = json!({
            "error": self.title(),
            "message": self.message(),
        })
        .to_string();

        rocket::Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn maps_errors_to_statuses() {
        let invalid = ValidationError::InvalidUsername("bad name!".to_string());
        assert_eq!(ApiError::from(invalid.clone()).status(), Status::BadRequest);
        assert_eq!(
            ApiError::from(ScraperError::Validation(invalid)).status(),
            Status::BadRequest
        );
        assert_eq!(ApiError::from(ScraperError::ProfileNotFound).status(), Status::NotFound);
        assert_eq!(ApiError::from(ScraperError::RateLimited).status(), Status::TooManyRequests);
        assert_eq!(
            ApiError::from(ScraperError::Timeout(Duration::from_secs(5))).status(),
            Status::GatewayTimeout
        );
        assert_eq!(ApiError::from(ScraperError::HttpStatus(500)).status(), Status::BadGateway);
        assert_eq!(ApiError::PayloadTooLarge(10).status(), Status::PayloadTooLarge);
    }

    #[test]
    fn unauthorized_keeps_its_message() {
        let error = ApiError::from(ScraperError::UnauthorizedAccess("Username 'x' not allowed".to_string()));
        assert_eq!(error.title(), "Unauthorized");
        assert_eq!(error.message(), "Username 'x' not allowed");
    }
}
