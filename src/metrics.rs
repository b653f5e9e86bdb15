//! Counters for classifications, resolution paths and prediction fetches.

use crate::classifier::RiskTier;
use crate::resolver::ResolutionPath;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

/// Metrics collector shared by all views of a process
#[derive(Debug)]
pub struct ReviewMetrics {
    /// Total views loaded
    pub views_loaded: AtomicU64,
    /// Views that failed to load
    pub views_failed: AtomicU64,
    /// Classifications by tier
    tiers: RwLock<HashMap<RiskTier, u64>>,
    /// Initial resolution path per loaded view
    paths: RwLock<HashMap<ResolutionPath, u64>>,
    /// Prediction fetch attempts
    fetch_attempts: AtomicU64,
    /// Prediction fetch failures
    fetch_failures: AtomicU64,
    /// Prediction fetch latencies (in milliseconds)
    fetch_times: RwLock<Vec<u64>>,
}

impl ReviewMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            views_loaded: AtomicU64::new(0),
            views_failed: AtomicU64::new(0),
            tiers: RwLock::new(HashMap::new()),
            paths: RwLock::new(HashMap::new()),
            fetch_attempts: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            fetch_times: RwLock::new(Vec::with_capacity(256)),
        }
    }

    /// Record a loaded view with its tier and initial resolution path
    pub fn record_view(&self, tier: RiskTier, path: ResolutionPath) {
        self.views_loaded.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut tiers) = self.tiers.write() {
            *tiers.entry(tier).or_insert(0) += 1;
        }
        if let Ok(mut paths) = self.paths.write() {
            *paths.entry(path).or_insert(0) += 1;
        }
    }

    /// Record a view that could not be loaded
    pub fn record_view_failure(&self) {
        self.views_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a settled prediction fetch
    pub fn record_fetch(&self, duration: Duration, success: bool) {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.fetch_failures.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.fetch_times.write() {
            times.push(duration.as_millis() as u64);
            // Keep only the most recent samples
            if times.len() > 1000 {
                times.drain(0..500);
            }
        }
    }

    /// Get prediction fetch statistics
    pub fn fetch_stats(&self) -> FetchStats {
        let attempts = self.fetch_attempts.load(Ordering::Relaxed);
        let failures = self.fetch_failures.load(Ordering::Relaxed);

        let mut sorted = match self.fetch_times.read() {
            Ok(times) => times.clone(),
            Err(_) => Vec::new(),
        };
        if sorted.is_empty() {
            return FetchStats {
                attempts,
                failures,
                ..FetchStats::default()
            };
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        FetchStats {
            attempts,
            failures,
            mean_ms: sum / count as u64,
            p50_ms: sorted[count / 2],
            p95_ms: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            max_ms: sorted[count - 1],
        }
    }

    /// Get classifications by tier
    pub fn tier_counts(&self) -> HashMap<RiskTier, u64> {
        self.tiers.read().map(|t| t.clone()).unwrap_or_default()
    }

    /// Get initial resolution paths
    pub fn path_counts(&self) -> HashMap<ResolutionPath, u64> {
        self.paths.read().map(|p| p.clone()).unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let loaded = self.views_loaded.load(Ordering::Relaxed);
        let failed = self.views_failed.load(Ordering::Relaxed);
        let fetch = self.fetch_stats();
        let tiers = self.tier_counts();
        let paths = self.path_counts();

        info!(views_loaded = loaded, views_failed = failed, "Review metrics summary");
        for tier in RiskTier::ALL {
            let count = tiers.get(&tier).copied().unwrap_or(0);
            let pct = if loaded > 0 {
                (count as f64 / loaded as f64) * 100.0
            } else {
                0.0
            };
            info!("  {:8}: {:>6} ({:>5.1}%)", tier.label(), count, pct);
        }
        for (path, count) in &paths {
            info!("  resolved via {:?}: {}", path, count);
        }
        if fetch.attempts > 0 {
            info!(
                "  prediction fetches: {} ({} failed) mean={}ms p50={}ms p95={}ms max={}ms",
                fetch.attempts, fetch.failures, fetch.mean_ms, fetch.p50_ms, fetch.p95_ms, fetch.max_ms
            );
        }
    }
}

impl Default for ReviewMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prediction fetch statistics
#[derive(Debug, Default, PartialEq)]
pub struct FetchStats {
    pub attempts: u64,
    pub failures: u64,
    pub mean_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub max_ms: u64,
}
