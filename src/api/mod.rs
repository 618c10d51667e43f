mod error;
pub mod instagram;

pub use error::ApiError;
