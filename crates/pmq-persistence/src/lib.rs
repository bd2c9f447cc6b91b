//! Event recorder for offline analysis.
//!
//! Records each quote cycle, fill, inventory snapshot, and rejection as one
//! JSON object per line. Not required for correct quoting.

pub mod error;
pub mod record;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use record::{FillRecord, InventoryRecord, QuoteRecord, RecordEvent, Recorder, RejectRecord};
pub use writer::JsonLinesWriter;
