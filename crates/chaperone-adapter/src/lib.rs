/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public console adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    ConsoleClient,
    ConsoleError,
    Credentials,
    Result,
    TailFetcher,
};

// Re-export all types
pub use types::*;
