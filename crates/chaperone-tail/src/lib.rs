/*
[INPUT]:  Public API exports for chaperone-tail crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod context;
pub mod document;
pub mod messages;
pub mod navigator;
pub mod poller;
pub mod render;
pub mod runner;
pub mod terminal;

// Re-export main types for convenience
pub use config::TailConfig;
pub use context::AppContext;
pub use document::{Document, OutputRegion, RenderSink};
pub use messages::{Message, MessageArea, MessageLevel};
pub use navigator::SessionNavigator;
pub use poller::{ChainExit, FailurePolicy, LogTailPoller, PollHandle, PollState, PollerConfig};
pub use render::RenderPolicy;
pub use runner::CommandRunner;
