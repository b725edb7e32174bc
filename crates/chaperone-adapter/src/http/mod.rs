/*
[INPUT]:  HTTP client configuration and console endpoints
[OUTPUT]: Tail text, command start acknowledgements, classified errors
[POS]:    HTTP layer - console backend communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod run;
pub mod tail;

pub use error::{ConsoleError, Result};
pub use tail::TailFetcher;

pub use client::{ClientConfig, ConsoleClient, Credentials};
