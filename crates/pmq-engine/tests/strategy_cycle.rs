//! Strategy cycle tests driven through collaborator fakes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use mockall::mock;
use parking_lot::Mutex;
use pmq_core::{
    AccountSnapshot, BookLevel, BookSnapshot, CancelEvent, ClientOrderId, FillEvent, LimitOrder,
    MarketOrder, OrderSide, PositionSnapshot, Price, RejectEvent, Size, TimeInForce,
    VenueOrderId,
};
use pmq_engine::{
    AccountSource, Clock, ClockError, Collaborators, CycleOutcome, MarketDataSource, OrderSink,
    QuotingStrategy, RejectCategory, SinkError, StrategyConfig, VetoReason, PULSE_TIMER,
};
use pmq_mm::LifecycleState;
use pmq_persistence::{PersistenceError, PersistenceResult, RecordEvent, Recorder};
use pmq_risk::GateKind;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const INSTRUMENT: &str = "mkt-YES";
const T0: u64 = 1_700_000_000_000;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeMarket {
    book: Mutex<Option<BookSnapshot>>,
}

impl MarketDataSource for FakeMarket {
    fn book(&self) -> Option<BookSnapshot> {
        self.book.lock().clone()
    }
}

struct FakeClock {
    now: AtomicU64,
    alerts: Mutex<Vec<(String, u64)>>,
    fail_alerts: AtomicBool,
}

impl FakeClock {
    fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
            alerts: Mutex::new(Vec::new()),
            fail_alerts: AtomicBool::new(false),
        }
    }

    fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn set_time_alert(&self, name: &str, alert_at_ms: u64) -> Result<(), ClockError> {
        if self.fail_alerts.load(Ordering::SeqCst) {
            return Err(ClockError::AlertRejected {
                name: name.to_string(),
                reason: "scheduler closed".to_string(),
            });
        }
        self.alerts.lock().push((name.to_string(), alert_at_ms));
        Ok(())
    }
}

struct FakeAccount {
    position: Mutex<Option<PositionSnapshot>>,
    account: Mutex<Option<AccountSnapshot>>,
}

impl FakeAccount {
    fn funded() -> Self {
        Self {
            position: Mutex::new(None),
            account: Mutex::new(Some(AccountSnapshot {
                total_balance: dec!(100),
                free_balance: dec!(100),
                ..AccountSnapshot::default()
            })),
        }
    }

    fn set_quantity(&self, quantity: i64) {
        *self.position.lock() = Some(PositionSnapshot {
            quantity,
            ..PositionSnapshot::flat()
        });
    }

    fn set_pnl(&self, realized: Decimal, unrealized: Decimal) {
        if let Some(acct) = self.account.lock().as_mut() {
            acct.realized_pnl = realized;
            acct.unrealized_pnl = unrealized;
        }
    }
}

impl AccountSource for FakeAccount {
    fn position(&self, _instrument: &str) -> Option<PositionSnapshot> {
        *self.position.lock()
    }

    fn account(&self) -> Option<AccountSnapshot> {
        *self.account.lock()
    }
}

#[derive(Default)]
struct RecordingSink {
    limits: Mutex<Vec<LimitOrder>>,
    markets: Mutex<Vec<MarketOrder>>,
}

impl OrderSink for RecordingSink {
    fn submit_limit(&self, order: &LimitOrder) -> Result<VenueOrderId, SinkError> {
        let mut limits = self.limits.lock();
        limits.push(order.clone());
        Ok(VenueOrderId(format!("v{}", limits.len())))
    }

    fn submit_market(&self, order: &MarketOrder) -> Result<VenueOrderId, SinkError> {
        self.markets.lock().push(order.clone());
        Ok(VenueOrderId("hedge".to_string()))
    }

    fn cancel_all(&self, _instrument: &str) -> Result<usize, SinkError> {
        Ok(self.limits.lock().len())
    }
}

#[derive(Clone, Default)]
struct SharedRecorder(Arc<Mutex<Vec<RecordEvent>>>);

impl Recorder for SharedRecorder {
    fn record(&mut self, event: RecordEvent) -> PersistenceResult<()> {
        self.0.lock().push(event);
        Ok(())
    }
}

struct ClosedRecorder;

impl Recorder for ClosedRecorder {
    fn record(&mut self, _event: RecordEvent) -> PersistenceResult<()> {
        Err(PersistenceError::WriterClosed)
    }
}

mock! {
    pub Sink {}
    impl OrderSink for Sink {
        fn submit_limit(&self, order: &LimitOrder) -> Result<VenueOrderId, SinkError>;
        fn submit_market(&self, order: &MarketOrder) -> Result<VenueOrderId, SinkError>;
        fn cancel_all(&self, instrument: &str) -> Result<usize, SinkError>;
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    market: Arc<FakeMarket>,
    clock: Arc<FakeClock>,
    account: Arc<FakeAccount>,
    sink: Arc<RecordingSink>,
    recorded: SharedRecorder,
}

impl Harness {
    fn new() -> Self {
        Self {
            market: Arc::new(FakeMarket::default()),
            clock: Arc::new(FakeClock::new(T0)),
            account: Arc::new(FakeAccount::funded()),
            sink: Arc::new(RecordingSink::default()),
            recorded: SharedRecorder::default(),
        }
    }

    fn config() -> StrategyConfig {
        StrategyConfig {
            instrument_id: INSTRUMENT.to_string(),
            ..Default::default()
        }
    }

    fn ports(&self) -> Collaborators {
        Collaborators {
            market_data: self.market.clone(),
            clock: self.clock.clone(),
            account: self.account.clone(),
            orders: self.sink.clone(),
        }
    }

    fn strategy_with(&self, config: StrategyConfig) -> QuotingStrategy {
        let mut strategy = QuotingStrategy::new(config, self.ports())
            .unwrap()
            .with_recorder(Box::new(self.recorded.clone()));
        strategy.on_start();
        strategy
    }

    fn strategy(&self) -> QuotingStrategy {
        self.strategy_with(Self::config())
    }

    fn limits(&self) -> Vec<LimitOrder> {
        self.sink.limits.lock().clone()
    }

    fn recorded_kinds(&self) -> Vec<&'static str> {
        self.recorded.0.lock().iter().map(|e| e.kind()).collect()
    }
}

fn level(px: Decimal) -> Option<BookLevel> {
    Some(BookLevel::new(Price::new(px), Size::from_units(25)))
}

fn two_sided(bid: Decimal, ask: Decimal) -> BookSnapshot {
    BookSnapshot::top(level(bid), level(ask), T0)
}

fn fill(side: OrderSide) -> FillEvent {
    FillEvent {
        cloid: ClientOrderId::new(),
        venue_order_id: Some(VenueOrderId("v1".to_string())),
        side,
        price: Price::new(dec!(0.49)),
        quantity: Size::from_units(2),
        commission: dec!(0.01),
        ts_ms: T0,
    }
}

fn quoted(outcome: CycleOutcome) -> pmq_mm::QuoteParameters {
    match outcome {
        CycleOutcome::Quoted(params) => params,
        other => panic!("expected a quote, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Quote cycle
// ---------------------------------------------------------------------------

#[test]
fn test_two_sided_book_produces_gtc_pair() {
    let h = Harness::new();
    let mut strategy = h.strategy();

    let params = quoted(strategy.on_book_update(&two_sided(dec!(0.48), dec!(0.52))));

    // Default vol 0.05 with one sample; full time left:
    // spread = 0.02 + 0.5 × 0.0025 × 2 = 0.0225
    assert_eq!(params.mid_price.inner(), dec!(0.50));
    assert_eq!(params.spread, dec!(0.0225));
    assert_eq!(params.skew, Decimal::ZERO);
    assert_eq!(params.bid_price.inner(), dec!(0.494));
    assert_eq!(params.ask_price.inner(), dec!(0.506));
    assert_eq!(params.time_remaining_secs, 900);
    assert!(!params.cold_start);

    let orders = h.limits();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[0].price, params.bid_price);
    assert_eq!(orders[1].side, OrderSide::Sell);
    assert_eq!(orders[1].price, params.ask_price);
    for order in &orders {
        assert_eq!(order.tif, TimeInForce::GoodTilCancelled);
        assert_eq!(order.quantity, Size::from_units(2));
        assert_eq!(order.instrument, INSTRUMENT);
    }
    assert_eq!(h.recorded_kinds(), vec!["quote"]);
}

#[test]
fn test_recorder_failure_does_not_block_quoting() {
    let h = Harness::new();
    let mut strategy = QuotingStrategy::new(Harness::config(), h.ports())
        .unwrap()
        .with_recorder(Box::new(ClosedRecorder));
    strategy.on_start();

    assert!(strategy
        .on_book_update(&two_sided(dec!(0.48), dec!(0.52)))
        .is_quoted());
    assert_eq!(h.limits().len(), 2);

    h.account.set_quantity(9);
    assert!(strategy.on_fill(&fill(OrderSide::Buy)).is_some());
}

#[test]
fn test_updates_inside_interval_are_dropped() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    let book = two_sided(dec!(0.48), dec!(0.52));

    assert!(strategy.on_book_update(&book).is_quoted());
    h.clock.advance(500);
    assert_eq!(strategy.on_book_update(&book), CycleOutcome::RateLimited);
    h.clock.advance(500);
    assert!(strategy.on_book_update(&book).is_quoted());
    assert_eq!(h.limits().len(), 4);
}

#[test]
fn test_vetoed_cycles_do_not_consume_the_interval() {
    let h = Harness::new();
    let mut strategy = h.strategy();

    let zombie = BookSnapshot::top(None, level(dec!(0.01)), T0);
    assert!(matches!(strategy.on_book_update(&zombie), CycleOutcome::Vetoed(_)));
    // Same instant, healthy book: not rate limited.
    assert!(strategy
        .on_book_update(&two_sided(dec!(0.48), dec!(0.52)))
        .is_quoted());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_zombie_market_is_not_quoted() {
    let h = Harness::new();
    let mut strategy = h.strategy();

    let book = BookSnapshot::top(None, level(dec!(0.01)), T0);
    assert_eq!(
        strategy.on_book_update(&book),
        CycleOutcome::Vetoed(VetoReason::Lifecycle(LifecycleState::Zombie))
    );
    assert!(h.limits().is_empty());
    assert_eq!(strategy.last_state(), Some(LifecycleState::Zombie));
}

#[test]
fn test_expiring_market_is_never_quoted() {
    let h = Harness::new();
    let config = StrategyConfig {
        market_end_ms: Some(T0 + 300_000),
        ..Harness::config()
    };
    let mut strategy = h.strategy_with(config);

    let books = [
        two_sided(dec!(0.48), dec!(0.52)),
        BookSnapshot::default(),
        BookSnapshot::top(None, level(dec!(0.40)), T0),
    ];
    for book in &books {
        assert_eq!(
            strategy.on_book_update(book),
            CycleOutcome::Vetoed(VetoReason::Lifecycle(LifecycleState::Expiring))
        );
    }
    assert!(h.limits().is_empty());
    assert_eq!(strategy.history_len(), 0);
}

#[test]
fn test_ask_only_book_cold_starts_with_tighter_spread() {
    let h = Harness::new();
    let mut strategy = h.strategy();

    let params = quoted(strategy.on_book_update(&BookSnapshot::top(None, level(dec!(0.40)), T0)));

    assert_eq!(params.mid_price.inner(), dec!(0.392));
    assert!(params.cold_start);
    // 0.0225 / 3 = 0.0075, floored at min_spread.
    assert_eq!(params.spread, dec!(0.01));
    assert!(params.bid_price < params.ask_price);
}

#[test]
fn test_empty_book_quotes_around_prior() {
    let h = Harness::new();
    let mut strategy = h.strategy();

    let params = quoted(strategy.on_book_update(&BookSnapshot::default()));
    assert_eq!(params.mid_price.inner(), dec!(0.5));
    assert_eq!(strategy.last_state(), Some(LifecycleState::ColdStart));
}

// ---------------------------------------------------------------------------
// Risk gates and pricing vetoes
// ---------------------------------------------------------------------------

#[test]
fn test_daily_loss_floor_vetoes_quoting() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    let book = two_sided(dec!(0.48), dec!(0.52));

    h.account.set_pnl(dec!(-2.0), dec!(-1.5));
    assert_eq!(
        strategy.on_book_update(&book),
        CycleOutcome::Vetoed(VetoReason::RiskGate(GateKind::DailyLoss))
    );

    h.account.set_pnl(dec!(-2.0), dec!(-0.5));
    assert!(strategy.on_book_update(&book).is_quoted());
}

#[test]
fn test_missing_account_blocks_on_position_value() {
    let h = Harness::new();
    *h.account.account.lock() = None;
    let mut strategy = h.strategy();

    assert_eq!(
        strategy.on_book_update(&two_sided(dec!(0.48), dec!(0.52))),
        CycleOutcome::Vetoed(VetoReason::RiskGate(GateKind::PositionValue))
    );
}

#[test]
fn test_inventory_ceiling_vetoes_quoting() {
    let h = Harness::new();
    h.account.set_quantity(10);
    let mut strategy = h.strategy();

    assert_eq!(
        strategy.on_book_update(&two_sided(dec!(0.48), dec!(0.52))),
        CycleOutcome::Vetoed(VetoReason::RiskGate(GateKind::Inventory))
    );
}

#[test]
fn test_long_inventory_skews_quotes() {
    let h = Harness::new();
    h.account.set_quantity(5);
    let mut strategy = h.strategy();

    let params = quoted(strategy.on_book_update(&two_sided(dec!(0.48), dec!(0.52))));
    assert_eq!(params.skew, dec!(0.025));
    // bid = 0.5 × (1 − 0.01125 − 0.025), ask = 0.5 × (1 + 0.01125 + 0.025)
    assert_eq!(params.bid_price.inner(), dec!(0.482));
    assert_eq!(params.ask_price.inner(), dec!(0.518));
}

#[test]
fn test_large_short_inventory_crosses_and_is_vetoed() {
    let h = Harness::new();
    h.account.set_quantity(-8);
    let mut strategy = h.strategy();

    assert_eq!(
        strategy.on_book_update(&two_sided(dec!(0.48), dec!(0.52))),
        CycleOutcome::Vetoed(VetoReason::CrossedQuote)
    );
    assert!(h.limits().is_empty());
}

// ---------------------------------------------------------------------------
// Fills and hedging
// ---------------------------------------------------------------------------

#[test]
fn test_fill_over_threshold_sends_one_hedge() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    h.account.set_quantity(9);

    let hedge = strategy.on_fill(&fill(OrderSide::Buy)).unwrap();
    assert_eq!(hedge.side, OrderSide::Sell);
    assert_eq!(hedge.quantity, Size::from_units(3));
    assert_eq!(h.sink.markets.lock().len(), 1);
    assert_eq!(h.recorded_kinds(), vec!["fill", "inventory"]);
}

#[test]
fn test_short_inventory_hedge_buys() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    h.account.set_quantity(-6);

    let hedge = strategy.on_fill(&fill(OrderSide::Sell)).unwrap();
    assert_eq!(hedge.side, OrderSide::Buy);
    assert_eq!(hedge.quantity, Size::from_units(3));
}

#[test]
fn test_fill_below_threshold_does_not_hedge() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    h.account.set_quantity(3);

    assert!(strategy.on_fill(&fill(OrderSide::Buy)).is_none());
    assert!(h.sink.markets.lock().is_empty());
}

#[test]
fn test_fill_after_stop_is_recorded_but_not_hedged() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    strategy.on_stop().unwrap();
    h.account.set_quantity(9);

    assert!(strategy.on_fill(&fill(OrderSide::Buy)).is_none());
    assert!(h.sink.markets.lock().is_empty());
    assert_eq!(h.recorded_kinds(), vec!["fill", "inventory"]);
}

// ---------------------------------------------------------------------------
// Pulse timer
// ---------------------------------------------------------------------------

#[test]
fn test_pulse_is_armed_on_start_and_rearmed_after_each_run() {
    let h = Harness::new();
    *h.market.book.lock() = Some(two_sided(dec!(0.48), dec!(0.52)));
    let mut strategy = h.strategy();

    assert_eq!(
        h.clock.alerts.lock().clone(),
        vec![(PULSE_TIMER.to_string(), T0 + 1000)]
    );

    h.clock.advance(1000);
    let outcome = strategy.on_timer(PULSE_TIMER).unwrap();
    assert!(outcome.is_quoted());
    assert_eq!(h.clock.alerts.lock().len(), 2);
    assert_eq!(h.clock.alerts.lock()[1].1, T0 + 2000);
}

#[test]
fn test_failed_rearm_disables_pulse_without_stopping() {
    let h = Harness::new();
    *h.market.book.lock() = Some(two_sided(dec!(0.48), dec!(0.52)));
    let mut strategy = h.strategy();

    h.clock.fail_alerts.store(true, Ordering::SeqCst);
    assert!(strategy.on_timer(PULSE_TIMER).is_some());
    assert!(!strategy.pulse_enabled());
    assert!(strategy.is_running());

    h.clock.advance(1000);
    assert!(strategy.on_timer(PULSE_TIMER).is_none());
    // Book-driven cycles still work.
    assert!(strategy
        .on_book_update(&two_sided(dec!(0.48), dec!(0.52)))
        .is_quoted());
}

#[test]
fn test_failed_initial_arm_is_tolerated() {
    let h = Harness::new();
    h.clock.fail_alerts.store(true, Ordering::SeqCst);
    let mut strategy = h.strategy();

    assert!(strategy.is_running());
    assert!(!strategy.pulse_enabled());
    assert!(strategy
        .on_book_update(&two_sided(dec!(0.48), dec!(0.52)))
        .is_quoted());
}

#[test]
fn test_unknown_timer_is_ignored() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    assert!(strategy.on_timer("something_else").is_none());
    assert_eq!(h.clock.alerts.lock().len(), 1);
}

// ---------------------------------------------------------------------------
// Rejections, cancels, stop
// ---------------------------------------------------------------------------

#[test]
fn test_rejection_is_classified_and_recorded() {
    let h = Harness::new();
    let mut strategy = h.strategy();

    let category = strategy.on_order_rejected(&RejectEvent {
        cloid: ClientOrderId::new(),
        reason: "Insufficient balance".to_string(),
    });
    assert_eq!(category, RejectCategory::InsufficientBalance);
    assert_eq!(h.recorded_kinds(), vec!["reject"]);

    strategy.on_order_canceled(&CancelEvent {
        cloid: ClientOrderId::new(),
        venue_order_id: None,
    });
}

#[test]
fn test_stop_cancels_and_deactivates() {
    let h = Harness::new();
    let mut strategy = h.strategy();
    let book = two_sided(dec!(0.48), dec!(0.52));
    assert!(strategy.on_book_update(&book).is_quoted());

    assert_eq!(strategy.on_stop().unwrap(), 2);
    assert!(!strategy.is_running());
    h.clock.advance(5000);
    assert_eq!(strategy.on_book_update(&book), CycleOutcome::Inactive);
    assert!(strategy.on_timer(PULSE_TIMER).is_none());
}

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let h = Harness::new();
    let mut config = Harness::config();
    config.quoting.min_order_size = 0;
    assert!(QuotingStrategy::new(config, h.ports()).is_err());
}

// ---------------------------------------------------------------------------
// Order sink failures (mockall)
// ---------------------------------------------------------------------------

#[test]
fn test_failed_buy_leg_still_submits_sell_leg() {
    let h = Harness::new();
    let mut sink = MockSink::new();
    sink.expect_submit_limit()
        .withf(|order: &LimitOrder| order.side == OrderSide::Buy)
        .times(1)
        .returning(|_| Err(SinkError::Rejected("price out of band".to_string())));
    sink.expect_submit_limit()
        .withf(|order: &LimitOrder| order.side == OrderSide::Sell)
        .times(1)
        .returning(|_| Ok(VenueOrderId("sell-1".to_string())));

    let ports = Collaborators {
        orders: Arc::new(sink),
        ..h.ports()
    };
    let mut strategy = QuotingStrategy::new(Harness::config(), ports).unwrap();
    strategy.on_start();

    assert!(strategy
        .on_book_update(&two_sided(dec!(0.48), dec!(0.52)))
        .is_quoted());
}

#[test]
fn test_stop_reports_cancel_failure() {
    let h = Harness::new();
    let mut sink = MockSink::new();
    sink.expect_cancel_all()
        .withf(|instrument: &str| instrument == INSTRUMENT)
        .times(1)
        .returning(|_| Err(SinkError::Unavailable("disconnected".to_string())));

    let ports = Collaborators {
        orders: Arc::new(sink),
        ..h.ports()
    };
    let mut strategy = QuotingStrategy::new(Harness::config(), ports).unwrap();
    strategy.on_start();

    assert!(strategy.on_stop().is_err());
    assert!(!strategy.is_running());
}

#[test]
fn test_failed_hedge_returns_none() {
    let h = Harness::new();
    h.account.set_quantity(8);
    let mut sink = MockSink::new();
    sink.expect_submit_market()
        .withf(|order: &MarketOrder| order.side == OrderSide::Sell)
        .times(1)
        .returning(|_| Err(SinkError::Rejected("throttled".to_string())));

    let ports = Collaborators {
        orders: Arc::new(sink),
        ..h.ports()
    };
    let mut strategy = QuotingStrategy::new(Harness::config(), ports).unwrap();
    strategy.on_start();

    assert!(strategy.on_fill(&fill(OrderSide::Buy)).is_none());
}
