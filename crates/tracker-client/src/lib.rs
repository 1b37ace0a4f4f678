//! HTTP access to the tracker API.

pub mod api;
pub mod error;
pub mod http;

pub use api::{ApiResponse, EventQuery, TrackerApi};
pub use error::ClientError;
pub use http::{ClientConfig, Credentials, DEFAULT_TIMEOUT, HttpTrackerClient, ensure_trailing_slash};
