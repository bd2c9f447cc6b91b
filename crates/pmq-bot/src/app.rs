//! Replay host orchestration.
//!
//! Wires one quoting strategy to the replay feed, the simulated clock and
//! the paper venue, then steps through the recorded books:
//! - advance time and fire due timers
//! - apply the book to the venue (resting orders may fill)
//! - deliver venue events, then the book update, to the strategy
//!
//! Ctrl-C stops the replay early; the strategy is always stopped cleanly.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::paper::{PaperVenue, VenueEvent};
use crate::replay::{load_books, ReplayClock, ReplayFeed};
use pmq_core::BookSnapshot;
use pmq_engine::{Collaborators, CycleOutcome, QuotingStrategy};
use pmq_persistence::JsonLinesWriter;
use pmq_telemetry::Metrics;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on event-delivery rounds per step (hedge fills can produce
/// further events).
const MAX_EVENT_ROUNDS: usize = 8;

/// Counts over one replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: u64,
    pub quotes: u64,
    pub vetoes: u64,
    pub rate_limited: u64,
    pub pulses: u64,
    pub fills: u64,
    pub hedges: u64,
    pub rejects: u64,
    pub cancels: u64,
    pub canceled_on_stop: usize,
    pub interrupted: bool,
}

impl ReplaySummary {
    fn observe(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Quoted(_) => self.quotes += 1,
            CycleOutcome::Vetoed(_) => self.vetoes += 1,
            CycleOutcome::RateLimited => self.rate_limited += 1,
            CycleOutcome::Inactive => {}
        }
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    books: Vec<BookSnapshot>,
    venue: Arc<PaperVenue>,
    clock: Arc<ReplayClock>,
    feed: Arc<ReplayFeed>,
}

impl Application {
    /// Validate the configuration and load the book file.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let books = load_books(&config.replay.book_file, config.replay.step_ms)?;
        info!(
            book_file = %config.replay.book_file,
            snapshots = books.len(),
            "Replay books loaded"
        );

        let start_ms = books.first().map_or(0, |b| b.ts_ms);
        let venue = PaperVenue::new(
            &config.strategy.instrument_id,
            config.replay.starting_balance,
            config.replay.fee_rate,
        )
        .with_replace_resting(config.replay.replace_resting);

        Ok(Self {
            books,
            venue: Arc::new(venue),
            clock: Arc::new(ReplayClock::new(start_ms)),
            feed: Arc::new(ReplayFeed::new()),
            config,
        })
    }

    /// Paper venue, for inspection after a run.
    pub fn venue(&self) -> &Arc<PaperVenue> {
        &self.venue
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators {
            market_data: self.feed.clone(),
            clock: self.clock.clone(),
            account: self.venue.clone(),
            orders: self.venue.clone(),
        }
    }

    fn build_strategy(&self) -> AppResult<QuotingStrategy> {
        let mut strategy = QuotingStrategy::new(self.config.strategy.clone(), self.collaborators())?;
        if self.config.persistence.enabled {
            let writer = JsonLinesWriter::new(
                &self.config.persistence.data_dir,
                self.config.persistence.buffer_size,
            )?;
            strategy = strategy.with_recorder(Box::new(writer));
        }
        Ok(strategy)
    }

    /// Replay every snapshot, then stop the strategy.
    pub async fn run(&mut self) -> AppResult<ReplaySummary> {
        let mut strategy = self.build_strategy()?;
        let mut summary = ReplaySummary::default();
        let pace = Duration::from_millis(self.config.replay.pace_ms);

        info!(
            instrument = %self.config.strategy.instrument_id,
            snapshots = self.books.len(),
            pace_ms = self.config.replay.pace_ms,
            "Starting replay"
        );
        strategy.on_start();

        let books = std::mem::take(&mut self.books);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        for book in books {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    summary.interrupted = true;
                    break;
                }
                _ = tokio::time::sleep(pace) => {}
            }
            self.step(&mut strategy, book, &mut summary);
        }

        match strategy.on_stop() {
            Ok(n) => summary.canceled_on_stop = n,
            Err(e) => warn!(error = %e, "Strategy stop reported an error"),
        }
        self.deliver_events(&mut strategy, &mut summary);

        info!(
            steps = summary.steps,
            quotes = summary.quotes,
            vetoes = summary.vetoes,
            rate_limited = summary.rate_limited,
            pulses = summary.pulses,
            fills = summary.fills,
            hedges = summary.hedges,
            rejects = summary.rejects,
            cancels = summary.cancels,
            interrupted = summary.interrupted,
            "Replay finished"
        );

        if let Some(path) = &self.config.telemetry.metrics_file {
            Metrics::write_to_file(Path::new(path))?;
            info!(path = %path, "Metrics written");
        }

        Ok(summary)
    }

    fn step(&self, strategy: &mut QuotingStrategy, book: BookSnapshot, summary: &mut ReplaySummary) {
        summary.steps += 1;
        self.clock.advance_to(book.ts_ms);

        for name in self.clock.take_due() {
            if let Some(outcome) = strategy.on_timer(&name) {
                summary.pulses += 1;
                summary.observe(&outcome);
            }
            self.deliver_events(strategy, summary);
        }

        self.venue.on_book(&book);
        self.feed.update(book.clone());
        self.deliver_events(strategy, summary);

        let outcome = strategy.on_book_update(&book);
        summary.observe(&outcome);
        self.deliver_events(strategy, summary);
    }

    fn deliver_events(&self, strategy: &mut QuotingStrategy, summary: &mut ReplaySummary) {
        for _ in 0..MAX_EVENT_ROUNDS {
            let events = self.venue.drain_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                match event {
                    VenueEvent::Fill(fill) => {
                        summary.fills += 1;
                        if strategy.on_fill(&fill).is_some() {
                            summary.hedges += 1;
                        }
                    }
                    VenueEvent::Reject(reject) => {
                        summary.rejects += 1;
                        strategy.on_order_rejected(&reject);
                    }
                    VenueEvent::Cancel(cancel) => {
                        summary.cancels += 1;
                        strategy.on_order_canceled(&cancel);
                    }
                }
            }
        }
        debug!("Event delivery round limit reached; remaining events deferred");
    }
}
