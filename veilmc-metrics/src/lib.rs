use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct DisguiseMetrics {
    // Interaction Stats
    pub total_applied: AtomicUsize,
    pub total_removed: AtomicUsize,
    pub total_captured: AtomicUsize,
    pub total_debounced: AtomicUsize,
    pub total_pruned: AtomicUsize,

    // Replication Stats
    pub total_broadcasts: AtomicUsize,
    pub total_broadcast_failures: AtomicUsize,
    pub total_full_syncs: AtomicUsize,
    pub total_messages_applied: AtomicUsize,
    pub total_messages_rejected: AtomicUsize,

    // Persistence Stats
    pub total_saves: AtomicUsize,
    pub total_save_time_us: AtomicU64,
    pub total_entries_saved: AtomicUsize,
    pub total_loads: AtomicUsize,
    pub total_load_time_us: AtomicU64,
    pub total_entries_loaded: AtomicUsize,
    pub total_entries_skipped: AtomicUsize,
    pub total_persistence_failures: AtomicUsize,

    // Session
    pub start_time: Option<Instant>,
}

impl DisguiseMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn record_apply(&self) {
        self.total_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.total_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture(&self) {
        self.total_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debounce(&self) {
        self.total_debounced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pruned(&self, count: usize) {
        self.total_pruned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_broadcast(&self, ok: bool) {
        self.total_broadcasts.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.total_broadcast_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_full_sync(&self) {
        self.total_full_syncs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message(&self, accepted: bool) {
        if accepted {
            self.total_messages_applied.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_messages_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_save(&self, duration: Duration, entries: usize) {
        self.total_saves.fetch_add(1, Ordering::Relaxed);
        self.total_save_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_entries_saved.fetch_add(entries, Ordering::Relaxed);
    }

    pub fn record_load(&self, duration: Duration, restored: usize, skipped: usize) {
        self.total_loads.fetch_add(1, Ordering::Relaxed);
        self.total_load_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_entries_loaded.fetch_add(restored, Ordering::Relaxed);
        self.total_entries_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.total_persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generate_report(&self) -> String {
        let uptime = self.start_time.unwrap_or_else(Instant::now).elapsed();

        let saves = self.total_saves.load(Ordering::Relaxed);
        let save_time = self.total_save_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let save_avg = if saves > 0 { save_time / saves as f64 } else { 0.0 };

        let loads = self.total_loads.load(Ordering::Relaxed);
        let load_time = self.total_load_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let load_avg = if loads > 0 { load_time / loads as f64 } else { 0.0 };

        let broadcasts = self.total_broadcasts.load(Ordering::Relaxed);
        let failures = self.total_broadcast_failures.load(Ordering::Relaxed);
        let failure_rate = if broadcasts > 0 {
            (failures as f64 / broadcasts as f64) * 100.0
        } else {
            0.0
        };

        format!(
            "Disguise Report\n\
             ===============\n\
             Session Duration: {:.2?}\n\n\
             [Interactions]\n\
             Applied: {}\n\
             Removed: {}\n\
             Captured: {}\n\
             Debounced: {}\n\
             Pruned: {}\n\n\
             [Replication]\n\
             Broadcasts: {}\n\
             Failures: {} ({:.1}%)\n\
             Full Syncs: {}\n\
             Messages Applied: {}\n\
             Messages Rejected: {}\n\n\
             [Persistence]\n\
             Saves: {} (avg {:.2} ms, {} entries written)\n\
             Loads: {} (avg {:.2} ms, {} restored, {} skipped)\n\
             Failures: {}\n",
            uptime,
            self.total_applied.load(Ordering::Relaxed),
            self.total_removed.load(Ordering::Relaxed),
            self.total_captured.load(Ordering::Relaxed),
            self.total_debounced.load(Ordering::Relaxed),
            self.total_pruned.load(Ordering::Relaxed),
            broadcasts,
            failures,
            failure_rate,
            self.total_full_syncs.load(Ordering::Relaxed),
            self.total_messages_applied.load(Ordering::Relaxed),
            self.total_messages_rejected.load(Ordering::Relaxed),
            saves,
            save_avg,
            self.total_entries_saved.load(Ordering::Relaxed),
            loads,
            load_avg,
            self.total_entries_loaded.load(Ordering::Relaxed),
            self.total_entries_skipped.load(Ordering::Relaxed),
            self.total_persistence_failures.load(Ordering::Relaxed),
        )
    }
}
