/*
[INPUT]:  Console URL schema and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for console communication
[UPDATE]: When console routes or form values change
*/

pub mod enums;
pub mod requests;
pub mod source;

pub use enums::*;
pub use requests::*;
pub use source::*;
