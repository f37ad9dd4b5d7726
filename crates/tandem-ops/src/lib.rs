//! Operation engine for tandem.
//!
//! Bulk file operations (copy, move, delete, mkdir, rename) run as async
//! drivers with a concurrency cap, chunked I/O, rate-limited progress
//! events and cancellation, reporting a single summary at the end. Every
//! mutating command is recorded with its reverse data in a bounded
//! undo/redo history.

mod conflict;
mod history;
mod pipeline;
mod progress;
mod request;
mod reversal;
mod staging;

pub use conflict::{suffixed_path, OverwritePolicy};
pub use history::{CommandHistory, CommandRecord, UndoAction, UndoPop};
pub use pipeline::{Pipeline, PipelineConfig};
pub use progress::{OperationEvent, OperationProgress, OperationSummary, Outcome};
pub use request::{DeleteOptions, OperationRequest, TransferOptions};
pub use reversal::Direction;
pub use staging::StagingArea;

/// Channel depth for operation event streams.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
