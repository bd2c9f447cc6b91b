//! Quoting strategy: the per-market decision object.
//!
//! The host invokes the `on_*` handlers; the strategy holds no reference
//! back into the host beyond the four collaborator contracts.
//!
//! # Cycle
//!
//! ```text
//! book update / pulse timer
//!   → rate limit (update_interval_ms since last quote)
//!   → MarketLifecycleGuard: veto or resolved mid
//!   → PriceHistory ← mid
//!   → one position/account snapshot → RiskGate (all checks)
//!   → volatility → spread (cold-start override) → skew → quote pair
//!   → OrderSink: buy GTC, sell GTC
//!
//! fill → HedgingController → optional market order
//! ```

use std::sync::Arc;

use pmq_core::{
    AccountSnapshot, BookSnapshot, CancelEvent, FillEvent, LimitOrder, MarketOrder, OrderSide,
    PositionSnapshot, Price, RejectEvent,
};
use pmq_mm::{
    HedgingController, InventorySkewModel, LifecycleDecision, LifecycleState, MarketClock,
    MarketLifecycleGuard, PriceHistory, QuoteGenerator, QuoteParameters, SpreadModel,
    VolatilityEstimator,
};
use pmq_persistence::{
    FillRecord, InventoryRecord, QuoteRecord, RecordEvent, Recorder, RejectRecord,
};
use pmq_risk::{GateKind, RiskGate, RiskInputs};
use pmq_telemetry::Metrics;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, info, trace, warn};

use crate::config::StrategyConfig;
use crate::error::EngineResult;
use crate::ports::{AccountSource, Clock, MarketDataSource, OrderSink};
use crate::rejection::RejectCategory;

/// Name of the self-rearming forced-poll timer.
pub const PULSE_TIMER: &str = "strategy_pulse";

/// Collaborators the strategy talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub market_data: Arc<dyn MarketDataSource>,
    pub clock: Arc<dyn Clock>,
    pub account: Arc<dyn AccountSource>,
    pub orders: Arc<dyn OrderSink>,
}

/// Why a cycle produced no quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetoReason {
    /// Lifecycle state forbids quoting (zombie, expiring, out of range).
    Lifecycle(LifecycleState),
    /// A risk gate blocked; the first failing gate.
    RiskGate(GateKind),
    /// Rounded bid was not strictly below the rounded ask.
    CrossedQuote,
    /// No mid price could be resolved.
    NoMid,
}

impl VetoReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lifecycle(state) => state.as_str(),
            Self::RiskGate(_) => "risk_gate",
            Self::CrossedQuote => "crossed_quote",
            Self::NoMid => "no_mid",
        }
    }
}

/// Result of one decision cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Strategy not started, or already stopped.
    Inactive,
    /// Dropped: too soon after the last quoting cycle.
    RateLimited,
    Vetoed(VetoReason),
    /// A quote pair was sent to the order sink.
    Quoted(QuoteParameters),
}

impl CycleOutcome {
    pub fn is_quoted(&self) -> bool {
        matches!(self, Self::Quoted(_))
    }
}

/// Balances captured at start, for the session summary on stop.
#[derive(Debug, Clone, Copy)]
struct SessionStart {
    started_at_ms: u64,
    total_balance: Decimal,
    realized_pnl: Decimal,
}

pub struct QuotingStrategy {
    config: StrategyConfig,
    ports: Collaborators,
    recorder: Option<Box<dyn Recorder>>,

    history: PriceHistory,
    market_clock: MarketClock,
    lifecycle: MarketLifecycleGuard,
    volatility: VolatilityEstimator,
    spread: SpreadModel,
    skew: InventorySkewModel,
    quotes: QuoteGenerator,
    hedging: HedgingController,
    risk: RiskGate,

    last_quote_ms: Option<u64>,
    last_state: Option<LifecycleState>,
    pulse_enabled: bool,
    running: bool,
    session: Option<SessionStart>,
}

impl QuotingStrategy {
    pub fn new(config: StrategyConfig, ports: Collaborators) -> EngineResult<Self> {
        config.validate()?;

        let q = &config.quoting;
        let market_clock = match config.market_end_ms {
            Some(end) => MarketClock::with_end(q.market_duration_secs, end),
            None => MarketClock::new(q.market_duration_secs),
        };

        Ok(Self {
            history: PriceHistory::new(q.volatility_window),
            market_clock,
            lifecycle: MarketLifecycleGuard::new(q),
            volatility: VolatilityEstimator::new(q),
            spread: SpreadModel::new(q),
            skew: InventorySkewModel::new(q),
            quotes: QuoteGenerator::new(q, config.risk.min_price(), config.risk.max_price()),
            hedging: HedgingController::new(q),
            risk: RiskGate::new(config.risk.clone()),
            config,
            ports,
            recorder: None,
            last_quote_ms: None,
            last_state: None,
            pulse_enabled: false,
            running: false,
            session: None,
        })
    }

    /// Attach an event recorder.
    pub fn with_recorder(mut self, recorder: Box<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn instrument(&self) -> &str {
        &self.config.instrument_id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pulse_enabled(&self) -> bool {
        self.pulse_enabled
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_state(&self) -> Option<LifecycleState> {
        self.last_state
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------

    pub fn on_start(&mut self) {
        let now = self.ports.clock.now_ms();
        self.market_clock.start(now);
        self.running = true;

        let account = self.ports.account.account();
        let position = self.ports.account.position(&self.config.instrument_id);
        if let Some(acct) = account {
            self.session = Some(SessionStart {
                started_at_ms: now,
                total_balance: acct.total_balance,
                realized_pnl: acct.realized_pnl,
            });
        } else {
            warn!(
                instrument = %self.config.instrument_id,
                "Account snapshot unavailable at start; session PnL will not be reported"
            );
        }
        log_account("start", &self.config.instrument_id, account, position);

        info!(
            instrument = %self.config.instrument_id,
            update_interval_ms = self.config.update_interval_ms,
            market_end_ms = ?self.config.market_end_ms,
            "Quoting strategy started"
        );

        self.pulse_enabled = true;
        self.arm_pulse(now);
    }

    /// Run one decision cycle against `book`.
    pub fn on_book_update(&mut self, book: &BookSnapshot) -> CycleOutcome {
        if !self.running {
            trace!("book update ignored: strategy inactive");
            return CycleOutcome::Inactive;
        }
        let now = self.ports.clock.now_ms();
        self.run_cycle(book, now)
    }

    /// Timer callback. Only the pulse timer is handled; it runs a cycle on
    /// the current book and re-arms itself.
    pub fn on_timer(&mut self, name: &str) -> Option<CycleOutcome> {
        if name != PULSE_TIMER {
            debug!(timer = name, "Ignoring unknown timer");
            return None;
        }
        if !self.running || !self.pulse_enabled {
            return None;
        }

        let outcome = match self.ports.market_data.book() {
            Some(book) => {
                let now = self.ports.clock.now_ms();
                Some(self.run_cycle(&book, now))
            }
            None => {
                debug!("Pulse fired with no book available");
                None
            }
        };

        let now = self.ports.clock.now_ms();
        self.arm_pulse(now);
        outcome
    }

    /// Handle a fill; returns the hedge order if one was sent.
    pub fn on_fill(&mut self, fill: &FillEvent) -> Option<MarketOrder> {
        let instrument = self.config.instrument_id.clone();
        info!(
            instrument = %instrument,
            cloid = %fill.cloid,
            side = %fill.side,
            price = %fill.price,
            quantity = %fill.quantity,
            commission = %fill.commission,
            "Order filled"
        );
        Metrics::fill(&instrument, fill.side.as_str());
        self.record(RecordEvent::Fill(FillRecord {
            ts_ms: fill.ts_ms,
            instrument: instrument.clone(),
            cloid: fill.cloid.to_string(),
            side: fill.side,
            price: fill.price.inner(),
            quantity: fill.quantity.inner(),
            commission: fill.commission,
        }));

        let position = self.ports.account.position(&instrument);
        let inventory = position.map(|p| p.quantity).unwrap_or(0);
        Metrics::inventory(&instrument, inventory);
        if let Some(pos) = position {
            self.record_inventory(fill.ts_ms, &pos);
        }

        if !self.running {
            debug!(instrument = %instrument, inventory, "Fill after stop; hedging skipped");
            return None;
        }
        let decision = self.hedging.evaluate(inventory)?;
        let order = MarketOrder::new(&instrument, decision.side, decision.quantity);

        warn!(
            instrument = %instrument,
            inventory,
            threshold = self.config.quoting.hedge_threshold,
            side = %order.side,
            quantity = %order.quantity,
            "Inventory threshold reached, hedging"
        );

        match self.ports.orders.submit_market(&order) {
            Ok(venue_id) => {
                Metrics::hedge(&instrument, order.side.as_str());
                debug!(cloid = %order.cloid, venue_order_id = %venue_id, "Hedge submitted");
                Some(order)
            }
            Err(e) => {
                Metrics::sink_error(&instrument, "hedge");
                warn!(error = %e, cloid = %order.cloid, "Hedge submission failed");
                None
            }
        }
    }

    /// Classify and log a rejection. No corrective action is taken.
    pub fn on_order_rejected(&mut self, event: &RejectEvent) -> RejectCategory {
        let category = RejectCategory::classify(&event.reason);
        error!(
            instrument = %self.config.instrument_id,
            cloid = %event.cloid,
            category = %category,
            reason = %event.reason,
            "Order rejected: {}",
            category.description()
        );
        Metrics::order_rejected(&self.config.instrument_id, category.as_str());

        let ts_ms = self.ports.clock.now_ms();
        let instrument = self.config.instrument_id.clone();
        self.record(RecordEvent::Reject(RejectRecord {
            ts_ms,
            instrument,
            cloid: event.cloid.to_string(),
            category: category.as_str().to_string(),
            reason: event.reason.clone(),
        }));
        category
    }

    pub fn on_order_canceled(&mut self, event: &CancelEvent) {
        info!(
            instrument = %self.config.instrument_id,
            cloid = %event.cloid,
            venue_order_id = ?event.venue_order_id,
            "Order canceled"
        );
    }

    /// Cancel all resting orders and stop quoting.
    ///
    /// The strategy is stopped even if the cancel fails; the error is
    /// returned so the host can retry the cancel itself.
    pub fn on_stop(&mut self) -> EngineResult<usize> {
        self.running = false;
        self.pulse_enabled = false;

        let instrument = self.config.instrument_id.clone();
        let canceled = self.ports.orders.cancel_all(&instrument);

        let now = self.ports.clock.now_ms();
        let account = self.ports.account.account();
        let position = self.ports.account.position(&instrument);
        log_account("stop", &instrument, account, position);
        if let (Some(start), Some(acct)) = (self.session, account) {
            info!(
                instrument = %instrument,
                session_secs = now.saturating_sub(start.started_at_ms) / 1000,
                session_pnl = %(acct.realized_pnl - start.realized_pnl),
                balance_change = %(acct.total_balance - start.total_balance),
                "Session summary"
            );
        }
        if let Some(pos) = position {
            self.record_inventory(now, &pos);
        }
        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.flush() {
                warn!(error = %e, "Recorder flush failed on stop");
            }
        }

        match canceled {
            Ok(n) => {
                info!(instrument = %instrument, canceled = n, "Quoting strategy stopped");
                Ok(n)
            }
            Err(e) => {
                Metrics::sink_error(&instrument, "cancel_all");
                warn!(instrument = %instrument, error = %e, "Cancel-all failed on stop");
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Decision cycle
    // ------------------------------------------------------------------

    fn run_cycle(&mut self, book: &BookSnapshot, now: u64) -> CycleOutcome {
        if let Some(last) = self.last_quote_ms {
            if now.saturating_sub(last) < self.config.update_interval_ms {
                trace!(since_last_ms = now.saturating_sub(last), "cycle rate limited");
                return CycleOutcome::RateLimited;
            }
        }

        let time_remaining = self.market_clock.time_remaining_secs(now);
        let decision = self.lifecycle.classify(book, time_remaining);
        self.observe_lifecycle(&decision);

        if !decision.allows_quoting() {
            return self.veto(VetoReason::Lifecycle(decision.state));
        }
        let Some(mid) = decision.mid_price else {
            return self.veto(VetoReason::NoMid);
        };

        self.history.push(mid);

        // One snapshot for every check and for the skew.
        let position = self.ports.account.position(&self.config.instrument_id);
        let account = self.ports.account.account();
        let inventory = position.map(|p| p.quantity).unwrap_or(0);
        let volatility = self.volatility.estimate(&self.history);

        let report = self.risk.evaluate(&RiskInputs {
            mid_price: mid,
            volatility,
            position: position.as_ref(),
            account: account.as_ref(),
        });
        for gate in report.blocked() {
            Metrics::gate_blocked(&self.config.instrument_id, gate.as_str());
        }
        if let Some(gate) = report.blocked().next() {
            return self.veto(VetoReason::RiskGate(gate));
        }

        let mut spread = self.spread.spread(volatility, time_remaining);
        if decision.is_cold_start() {
            spread = self.spread.cold_start(spread);
        }
        let skew = self.skew.skew(inventory);

        let Some(pair) = self.quotes.quote(mid, spread, skew) else {
            debug!(mid = %mid, spread = %spread, skew = %skew, "quote pair crossed after rounding");
            return self.veto(VetoReason::CrossedQuote);
        };
        let size = self.quotes.order_size(book);

        let params = QuoteParameters {
            mid_price: mid,
            volatility,
            spread,
            skew,
            bid_price: pair.bid,
            ask_price: pair.ask,
            size,
            time_remaining_secs: time_remaining,
            cold_start: decision.is_cold_start(),
        };

        self.submit_quotes(&params);
        self.last_quote_ms = Some(now);

        info!(
            instrument = %self.config.instrument_id,
            state = %decision.state,
            mid = %mid,
            spread = %spread,
            skew = %skew,
            volatility = %volatility,
            bid = %pair.bid,
            ask = %pair.ask,
            size = %size,
            inventory,
            time_remaining_secs = time_remaining,
            "Quote submitted"
        );

        let instrument = self.config.instrument_id.clone();
        Metrics::quote_submitted(&instrument);
        Metrics::quote_params(
            &instrument,
            to_f64(mid.inner()),
            to_f64(spread),
            to_f64(skew),
            to_f64(volatility),
        );
        Metrics::inventory(&instrument, inventory);
        self.record(RecordEvent::Quote(QuoteRecord {
            ts_ms: now,
            instrument,
            lifecycle: decision.state.as_str().to_string(),
            mid_price: mid.inner(),
            volatility,
            spread,
            skew,
            bid_price: pair.bid.inner(),
            ask_price: pair.ask.inner(),
            size: size.inner(),
            time_remaining_secs: time_remaining,
        }));

        CycleOutcome::Quoted(params)
    }

    fn submit_quotes(&self, params: &QuoteParameters) {
        let legs = [
            (OrderSide::Buy, params.bid_price),
            (OrderSide::Sell, params.ask_price),
        ];
        for (side, price) in legs {
            let order = self.limit_order(side, price, params);
            if let Err(e) = self.ports.orders.submit_limit(&order) {
                Metrics::sink_error(&self.config.instrument_id, "submit_limit");
                warn!(
                    cloid = %order.cloid,
                    side = %side,
                    price = %price,
                    error = %e,
                    "Quote leg submission failed"
                );
            }
        }
    }

    fn limit_order(&self, side: OrderSide, price: Price, params: &QuoteParameters) -> LimitOrder {
        LimitOrder::gtc(&self.config.instrument_id, side, price, params.size)
    }

    fn observe_lifecycle(&mut self, decision: &LifecycleDecision) {
        let instrument = &self.config.instrument_id;
        Metrics::lifecycle_state(instrument, decision.state.code());
        Metrics::time_remaining(instrument, decision.time_remaining_secs);

        if self.last_state != Some(decision.state) {
            info!(
                instrument = %instrument,
                from = ?self.last_state.map(|s| s.as_str()),
                to = %decision.state,
                book = %decision.shape,
                mid = ?decision.mid_price.map(|m| m.to_string()),
                time_remaining_secs = decision.time_remaining_secs,
                "Lifecycle state changed"
            );
            self.last_state = Some(decision.state);
        }
    }

    fn veto(&self, reason: VetoReason) -> CycleOutcome {
        debug!(
            instrument = %self.config.instrument_id,
            reason = reason.as_str(),
            "cycle vetoed"
        );
        Metrics::cycle_vetoed(&self.config.instrument_id, reason.as_str());
        CycleOutcome::Vetoed(reason)
    }

    fn arm_pulse(&mut self, now: u64) {
        if !self.pulse_enabled {
            return;
        }
        let at = now.saturating_add(self.config.pulse_interval_ms);
        if let Err(e) = self.ports.clock.set_time_alert(PULSE_TIMER, at) {
            warn!(error = %e, "Pulse timer could not be armed; forced polling disabled");
            self.pulse_enabled = false;
        }
    }

    fn record_inventory(&mut self, ts_ms: u64, position: &PositionSnapshot) {
        let instrument = self.config.instrument_id.clone();
        self.record(RecordEvent::Inventory(InventoryRecord {
            ts_ms,
            instrument,
            quantity: position.quantity,
            avg_entry_price: position.avg_entry_price.map(|p| p.inner()),
            realized_pnl: position.realized_pnl,
            unrealized_pnl: position.unrealized_pnl,
        }));
    }

    fn record(&mut self, event: RecordEvent) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        let kind = event.kind();
        if let Err(e) = recorder.record(event) {
            warn!(error = %e, kind, "Failed to record event");
        }
    }
}

fn log_account(
    phase: &str,
    instrument: &str,
    account: Option<AccountSnapshot>,
    position: Option<PositionSnapshot>,
) {
    if let Some(acct) = account {
        info!(
            phase,
            total_balance = %acct.total_balance,
            free_balance = %acct.free_balance,
            locked_balance = %acct.locked_balance,
            realized_pnl = %acct.realized_pnl,
            unrealized_pnl = %acct.unrealized_pnl,
            "Account"
        );
    }
    match position {
        Some(pos) if !pos.is_flat() => info!(
            phase,
            instrument,
            quantity = pos.quantity,
            avg_entry = ?pos.avg_entry_price.map(|p| p.to_string()),
            current_price = ?pos.current_price.map(|p| p.to_string()),
            realized_pnl = %pos.realized_pnl,
            unrealized_pnl = %pos.unrealized_pnl,
            "Position"
        ),
        _ => info!(phase, instrument, "No open position"),
    }
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}
