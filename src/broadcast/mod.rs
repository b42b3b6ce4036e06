//! Broadcast and export module.
//!
//! Consumes a roster owned by the caller and either messages every admin
//! in it or writes it to disk.

mod engine;
mod export;

pub use engine::{BroadcastSummary, Broadcaster, DeliveryError, DeliveryOutcome, PreconditionError};
pub use export::{AdminRecord, ExportError, ExportFormat, export};
