/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod api;
pub mod client;
pub mod error;
pub mod tasks;

pub use api::{CardloomApi, TaskSource};
pub use error::{CardloomError, Result};

pub use client::{CardloomClient, ClientConfig, Credentials};
