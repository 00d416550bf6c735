//! Transfer orchestration.
//!
//! # Data Flow
//! ```text
//! source.rs (TransferSource: terminal prompts, fixed inputs)
//!     → pipeline.rs (TransferPipeline: validate → build → sign → broadcast → confirm)
//!     → state.rs (forward-only states, TransferFailure with originating stage)
//! ```

pub mod pipeline;
pub mod source;
pub mod state;

pub use pipeline::{TransferEvent, TransferPipeline, TransferReport};
pub use source::{FixedSource, TerminalSource, TransferSource};
pub use state::{TransferFailure, TransferState};
