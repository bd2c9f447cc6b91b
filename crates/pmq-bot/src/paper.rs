//! Paper venue: order sink and account source backed by replayed books.
//!
//! Resting GTC orders fill in full at their own price once a replayed book
//! trades through them. Market orders fill immediately at the opposite best
//! price. Fills, rejects and cancels are queued and handed to the strategy
//! by the replay loop, the way a live venue delivers them asynchronously.

use std::collections::VecDeque;

use parking_lot::Mutex;
use pmq_core::{
    AccountSnapshot, BookSnapshot, CancelEvent, ClientOrderId, FillEvent, LimitOrder, MarketOrder,
    OrderSide, PositionSnapshot, Price, RejectEvent, Size, VenueOrderId,
};
use pmq_engine::{AccountSource, OrderSink, SinkError};
use rust_decimal::prelude::{Signed, ToPrimitive};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Execution event produced by the paper venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueEvent {
    Fill(FillEvent),
    Reject(RejectEvent),
    Cancel(CancelEvent),
}

#[derive(Debug, Clone)]
struct RestingOrder {
    order: LimitOrder,
    venue_id: VenueOrderId,
}

/// Net position with average entry and realized PnL.
#[derive(Debug, Clone, Copy, Default)]
struct Ledger {
    net: Decimal,
    avg_entry: Decimal,
    realized_pnl: Decimal,
    fills: u64,
}

impl Ledger {
    fn apply(&mut self, side: OrderSide, price: Decimal, size: Decimal) {
        let signed = match side {
            OrderSide::Buy => size,
            OrderSide::Sell => -size,
        };
        let old = self.net;
        let new = old + signed;

        // Reducing: realize against the average entry.
        if (old > Decimal::ZERO && signed < Decimal::ZERO)
            || (old < Decimal::ZERO && signed > Decimal::ZERO)
        {
            let reduced = signed.abs().min(old.abs());
            let pnl = if old > Decimal::ZERO {
                (price - self.avg_entry) * reduced
            } else {
                (self.avg_entry - price) * reduced
            };
            self.realized_pnl += pnl;
        }

        if new.is_zero() {
            self.avg_entry = Decimal::ZERO;
        } else if !old.is_zero() && new.signum() != old.signum() {
            // Flipped through zero.
            self.avg_entry = price;
        } else if old.is_zero() || new.signum() == signed.signum() {
            let old_notional = old.abs() * self.avg_entry;
            self.avg_entry = (old_notional + size * price) / new.abs();
        }

        self.net = new;
        self.fills += 1;
    }

    fn unrealized(&self, mark: Option<Decimal>) -> Decimal {
        match mark {
            Some(m) if !self.net.is_zero() => (m - self.avg_entry) * self.net,
            _ => Decimal::ZERO,
        }
    }
}

#[derive(Debug)]
struct VenueState {
    cash: Decimal,
    fees_paid: Decimal,
    ledger: Ledger,
    mark: Option<Decimal>,
    book: Option<BookSnapshot>,
    resting: Vec<RestingOrder>,
    events: VecDeque<VenueEvent>,
    next_id: u64,
    now_ms: u64,
}

impl VenueState {
    fn next_venue_id(&mut self) -> VenueOrderId {
        self.next_id += 1;
        VenueOrderId(format!("paper-{}", self.next_id))
    }

    fn resting_buy_notional(&self) -> Decimal {
        self.resting
            .iter()
            .filter(|r| r.order.side == OrderSide::Buy)
            .map(|r| r.order.quantity.notional(r.order.price))
            .sum()
    }

    fn free_balance(&self) -> Decimal {
        self.cash - self.resting_buy_notional()
    }

    fn reject(&mut self, cloid: &ClientOrderId, reason: String) {
        debug!(cloid = %cloid, reason = %reason, "Paper order rejected");
        self.events.push_back(VenueEvent::Reject(RejectEvent {
            cloid: cloid.clone(),
            reason,
        }));
    }

    fn cancel(&mut self, resting: RestingOrder) {
        self.events.push_back(VenueEvent::Cancel(CancelEvent {
            cloid: resting.order.cloid,
            venue_order_id: Some(resting.venue_id),
        }));
    }

    fn fill(
        &mut self,
        cloid: ClientOrderId,
        venue_id: VenueOrderId,
        side: OrderSide,
        price: Price,
        quantity: Size,
        fee_rate: Decimal,
    ) {
        let notional = quantity.notional(price);
        let commission = notional * fee_rate;
        match side {
            OrderSide::Buy => self.cash -= notional + commission,
            OrderSide::Sell => self.cash += notional - commission,
        }
        self.fees_paid += commission;
        self.ledger.apply(side, price.inner(), quantity.inner());

        self.events.push_back(VenueEvent::Fill(FillEvent {
            cloid,
            venue_order_id: Some(venue_id),
            side,
            price,
            quantity,
            commission,
            ts_ms: self.now_ms,
        }));
    }
}

/// Single-instrument simulated venue.
pub struct PaperVenue {
    instrument: String,
    fee_rate: Decimal,
    replace_resting: bool,
    state: Mutex<VenueState>,
}

impl PaperVenue {
    pub fn new(instrument: &str, starting_balance: Decimal, fee_rate: Decimal) -> Self {
        Self {
            instrument: instrument.to_string(),
            fee_rate,
            replace_resting: true,
            state: Mutex::new(VenueState {
                cash: starting_balance,
                fees_paid: Decimal::ZERO,
                ledger: Ledger::default(),
                mark: None,
                book: None,
                resting: Vec::new(),
                events: VecDeque::new(),
                next_id: 0,
                now_ms: 0,
            }),
        }
    }

    /// Keep every quote resting instead of replacing the previous one per side.
    pub fn with_replace_resting(mut self, replace: bool) -> Self {
        self.replace_resting = replace;
        self
    }

    /// Apply a replayed book: update the mark and fill crossed resting orders.
    pub fn on_book(&self, book: &BookSnapshot) {
        let mut state = self.state.lock();
        state.now_ms = book.ts_ms;
        if let Some(mid) = book.mid_price().or(book.best_bid()).or(book.best_ask()) {
            state.mark = Some(mid.inner());
        }

        let best_bid = book.best_bid();
        let best_ask = book.best_ask();
        let (crossed, resting): (Vec<RestingOrder>, Vec<RestingOrder>) =
            std::mem::take(&mut state.resting)
                .into_iter()
                .partition(|r| match r.order.side {
                    OrderSide::Buy => best_ask.is_some_and(|ask| ask <= r.order.price),
                    OrderSide::Sell => best_bid.is_some_and(|bid| bid >= r.order.price),
                });
        state.resting = resting;

        for r in crossed {
            state.fill(
                r.order.cloid,
                r.venue_id,
                r.order.side,
                r.order.price,
                r.order.quantity,
                self.fee_rate,
            );
        }
        state.book = Some(book.clone());
    }

    /// Take all queued execution events.
    pub fn drain_events(&self) -> Vec<VenueEvent> {
        self.state.lock().events.drain(..).collect()
    }

    pub fn open_orders(&self) -> usize {
        self.state.lock().resting.len()
    }

    pub fn fill_count(&self) -> u64 {
        self.state.lock().ledger.fills
    }

    fn check_instrument(&self, instrument: &str) -> Result<(), SinkError> {
        if instrument != self.instrument {
            return Err(SinkError::Rejected(format!("unknown instrument {instrument}")));
        }
        Ok(())
    }
}

impl OrderSink for PaperVenue {
    fn submit_limit(&self, order: &LimitOrder) -> Result<VenueOrderId, SinkError> {
        self.check_instrument(&order.instrument)?;
        let mut state = self.state.lock();
        let venue_id = state.next_venue_id();

        if !order.price.is_positive() || order.price >= Price::ONE {
            state.reject(&order.cloid, format!("invalid price {}", order.price));
            return Ok(venue_id);
        }
        if !order.quantity.is_positive() {
            state.reject(&order.cloid, format!("invalid quantity {}", order.quantity));
            return Ok(venue_id);
        }

        if self.replace_resting {
            let (replaced, kept): (Vec<RestingOrder>, Vec<RestingOrder>) =
                std::mem::take(&mut state.resting)
                    .into_iter()
                    .partition(|r| r.order.side == order.side);
            state.resting = kept;
            for r in replaced {
                state.cancel(r);
            }
        }

        if order.side == OrderSide::Buy {
            let notional = order.quantity.notional(order.price);
            let free = state.free_balance();
            if notional > free {
                state.reject(
                    &order.cloid,
                    format!("insufficient balance: need {notional}, free {free}"),
                );
                return Ok(venue_id);
            }
        }

        state.resting.push(RestingOrder {
            order: order.clone(),
            venue_id: venue_id.clone(),
        });
        Ok(venue_id)
    }

    fn submit_market(&self, order: &MarketOrder) -> Result<VenueOrderId, SinkError> {
        self.check_instrument(&order.instrument)?;
        let mut state = self.state.lock();

        let price = state.book.as_ref().and_then(|b| match order.side {
            OrderSide::Buy => b.best_ask(),
            OrderSide::Sell => b.best_bid(),
        });
        let Some(price) = price else {
            return Err(SinkError::Rejected(format!(
                "no {} liquidity for market {}",
                order.side.opposite(),
                order.side
            )));
        };

        if order.side == OrderSide::Buy {
            let notional = order.quantity.notional(price);
            if notional > state.free_balance() {
                return Err(SinkError::Rejected(format!(
                    "insufficient balance for market buy of {notional}"
                )));
            }
        }

        let venue_id = state.next_venue_id();
        state.fill(
            order.cloid.clone(),
            venue_id.clone(),
            order.side,
            price,
            order.quantity,
            self.fee_rate,
        );
        Ok(venue_id)
    }

    fn cancel_all(&self, instrument: &str) -> Result<usize, SinkError> {
        self.check_instrument(instrument)?;
        let mut state = self.state.lock();
        let resting = std::mem::take(&mut state.resting);
        let count = resting.len();
        for r in resting {
            state.cancel(r);
        }
        info!(instrument, canceled = count, "Paper venue canceled all orders");
        Ok(count)
    }
}

impl AccountSource for PaperVenue {
    fn position(&self, instrument: &str) -> Option<PositionSnapshot> {
        if instrument != self.instrument {
            return None;
        }
        let state = self.state.lock();
        if state.ledger.fills == 0 {
            return None;
        }
        let ledger = state.ledger;
        Some(PositionSnapshot {
            quantity: ledger.net.trunc().to_i64().unwrap_or(0),
            avg_entry_price: (!ledger.net.is_zero()).then(|| Price::new(ledger.avg_entry)),
            current_price: state.mark.map(Price::new),
            realized_pnl: ledger.realized_pnl,
            unrealized_pnl: ledger.unrealized(state.mark),
        })
    }

    fn account(&self) -> Option<AccountSnapshot> {
        let state = self.state.lock();
        let locked = state.resting_buy_notional();
        let position_value = state.mark.map_or(Decimal::ZERO, |m| m * state.ledger.net);
        Some(AccountSnapshot {
            total_balance: state.cash + position_value,
            free_balance: state.cash - locked,
            locked_balance: locked,
            realized_pnl: state.ledger.realized_pnl - state.fees_paid,
            unrealized_pnl: state.ledger.unrealized(state.mark),
        })
    }
}
