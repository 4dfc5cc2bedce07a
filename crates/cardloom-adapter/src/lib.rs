/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Cardloom adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;

// Re-export commonly used types from http
pub use http::{
    CardloomApi,
    CardloomClient,
    CardloomError,
    ClientConfig,
    Credentials,
    Result,
    TaskSource,
};

// Re-export all types
pub use types::*;
