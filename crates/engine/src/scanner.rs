use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use common::{
    Evaluation, MarketDataProvider, MatchRecord, Rejection, ScanResult, ScanStrategy,
    SymbolUniverse,
};
use strategy::{Screener, ScreenerRegistry};

/// Progress is logged every this many evaluated symbols.
const PROGRESS_EVERY: usize = 100;

/// Fans one strategy out over the symbol universe with a bounded worker pool.
///
/// Workers pull symbols from a shared queue, fetch history, score it and
/// push matches to a single collector. A failing provider only shrinks the
/// result; `run_scan` itself never fails.
#[derive(Clone)]
pub struct Scanner {
    universe: Arc<dyn SymbolUniverse>,
    market: Arc<dyn MarketDataProvider>,
    screeners: ScreenerRegistry,
    workers: usize,
}

impl Scanner {
    pub const DEFAULT_WORKERS: usize = 10;

    pub fn new(
        universe: Arc<dyn SymbolUniverse>,
        market: Arc<dyn MarketDataProvider>,
        screeners: ScreenerRegistry,
        workers: usize,
    ) -> Self {
        Self {
            universe,
            market,
            screeners,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Scan the first `limit` symbols of the universe, in listing order.
    pub async fn run_scan(&self, strategy: ScanStrategy, limit: usize) -> ScanResult {
        let started = Instant::now();
        let symbols = self.select_symbols(limit).await;
        let total = symbols.len();
        if total == 0 {
            info!(%strategy, "No symbols to scan");
            return ScanResult::empty(strategy);
        }

        let workers = self.workers.min(total);
        info!(%strategy, symbols = total, workers, "Scan started");

        // Every job is queued up front, so the channel never blocks the producer
        let (job_tx, job_rx) = mpsc::channel::<String>(total);
        for symbol in symbols {
            let _ = job_tx.send(symbol).await;
        }
        drop(job_tx);
        let jobs = Arc::new(Mutex::new(job_rx));

        let (match_tx, mut match_rx) = mpsc::channel::<MatchRecord>(64);
        let processed = Arc::new(AtomicUsize::new(0));
        let screener = self.screeners.get(strategy);

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(worker_loop(
                worker_id,
                jobs.clone(),
                match_tx.clone(),
                self.market.clone(),
                screener.clone(),
                processed.clone(),
                total,
            ));
        }
        drop(match_tx);

        let mut rows = Vec::new();
        while let Some(record) = match_rx.recv().await {
            rows.push(record);
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Scan worker terminated abnormally");
            }
        }

        info!(
            %strategy,
            symbols = total,
            matches = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );

        ScanResult {
            strategy,
            rows,
            symbols_scanned: total,
            scanned_at: Utc::now(),
        }
    }

    /// Universe in listing order, duplicates removed, truncated to `limit`.
    /// A universe failure degrades to an empty selection.
    async fn select_symbols(&self, limit: usize) -> Vec<String> {
        let listed = match self.universe.symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(error = %e, "Symbol universe unavailable; scanning nothing");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        listed
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .take(limit)
            .collect()
    }
}

async fn worker_loop(
    worker_id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<String>>>,
    match_tx: mpsc::Sender<MatchRecord>,
    market: Arc<dyn MarketDataProvider>,
    screener: Arc<dyn Screener>,
    processed: Arc<AtomicUsize>,
    total: usize,
) {
    loop {
        // Lock only long enough to take the next symbol
        let next = jobs.lock().await.recv().await;
        let Some(symbol) = next else {
            break;
        };

        let outcome = evaluate_symbol(market.as_ref(), &screener, &symbol).await;

        let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_EVERY == 0 || done == total {
            info!(done, total, "Scan progress");
        }

        match outcome {
            Evaluation::Match(record) => {
                debug!(worker_id, symbol = %symbol, "Match");
                if match_tx.send(record).await.is_err() {
                    warn!(worker_id, "Match collector closed; stopping worker");
                    return;
                }
            }
            Evaluation::NoMatch(reason) => {
                debug!(worker_id, symbol = %symbol, %reason, "No match");
            }
        }
    }
}

/// Fetch and score one symbol. Provider failure is a no-match, not an error.
///
/// The fetch suspends on I/O; scoring is synchronous indicator math and runs
/// on the blocking pool so it never stalls the fetches of other workers.
pub async fn evaluate_symbol(
    market: &dyn MarketDataProvider,
    screener: &Arc<dyn Screener>,
    symbol: &str,
) -> Evaluation {
    let series = match market.daily_history(symbol).await {
        Ok(series) => series,
        Err(e) => return Evaluation::NoMatch(Rejection::DataUnavailable(e.to_string())),
    };

    let screener = Arc::clone(screener);
    match tokio::task::spawn_blocking(move || screener.evaluate(&series)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(symbol, error = %e, "Scoring aborted");
            Evaluation::NoMatch(Rejection::ScoringFailed(e.to_string()))
        }
    }
}
