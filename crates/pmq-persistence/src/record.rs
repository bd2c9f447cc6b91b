//! Logical event records and the recorder contract.

use pmq_core::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceResult;

/// One submitted quote pair and the inputs that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub ts_ms: u64,
    pub instrument: String,
    pub lifecycle: String,
    pub mid_price: Decimal,
    pub volatility: Decimal,
    pub spread: Decimal,
    pub skew: Decimal,
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub size: Decimal,
    pub time_remaining_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRecord {
    pub ts_ms: u64,
    pub instrument: String,
    pub cloid: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: Decimal,
    pub commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub ts_ms: u64,
    pub instrument: String,
    pub quantity: i64,
    pub avg_entry_price: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRecord {
    pub ts_ms: u64,
    pub instrument: String,
    pub cloid: String,
    pub category: String,
    pub reason: String,
}

/// Recorded event, tagged by kind in the `event` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecordEvent {
    Quote(QuoteRecord),
    Fill(FillRecord),
    Inventory(InventoryRecord),
    Reject(RejectRecord),
}

impl RecordEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Quote(_) => "quote",
            Self::Fill(_) => "fill",
            Self::Inventory(_) => "inventory",
            Self::Reject(_) => "reject",
        }
    }
}

/// Sink for recorded events.
pub trait Recorder: Send {
    fn record(&mut self, event: RecordEvent) -> PersistenceResult<()>;

    fn flush(&mut self) -> PersistenceResult<()> {
        Ok(())
    }
}

/// In-memory recorder, mostly for tests and dry runs.
impl Recorder for Vec<RecordEvent> {
    fn record(&mut self, event: RecordEvent) -> PersistenceResult<()> {
        self.push(event);
        Ok(())
    }
}
