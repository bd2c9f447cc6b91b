//! Core domain types for the prediction-market quoting engine.
//!
//! - `Price`, `Size`: precision-safe numeric types with quantization
//! - `BookSnapshot`, `BookShape`: order-book view handed to each cycle
//! - `PositionSnapshot`, `AccountSnapshot`: account state read per cycle
//! - `LimitOrder`, `MarketOrder`, `OrderSide`: what the engine submits
//! - `FillEvent`, `RejectEvent`, `CancelEvent`: what comes back

pub mod account;
pub mod decimal;
pub mod error;
pub mod events;
pub mod order;
pub mod types;

pub use account::{AccountSnapshot, PositionSnapshot};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use events::{CancelEvent, FillEvent, RejectEvent};
pub use order::{ClientOrderId, LimitOrder, MarketOrder, OrderSide, TimeInForce, VenueOrderId};
pub use types::{BookLevel, BookShape, BookSnapshot};
