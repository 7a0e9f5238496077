use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Usage counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub users_registered: Arc<AtomicU64>,
    pub logins_succeeded: Arc<AtomicU64>,
    pub logins_failed: Arc<AtomicU64>,
    pub roadmaps_created: Arc<AtomicU64>,
    pub comments_posted: Arc<AtomicU64>,
    pub votes_cast: Arc<AtomicU64>,
    pub rankings_computed: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            users_registered: Arc::new(AtomicU64::new(0)),
            logins_succeeded: Arc::new(AtomicU64::new(0)),
            logins_failed: Arc::new(AtomicU64::new(0)),
            roadmaps_created: Arc::new(AtomicU64::new(0)),
            comments_posted: Arc::new(AtomicU64::new(0)),
            votes_cast: Arc::new(AtomicU64::new(0)),
            rankings_computed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_users_registered(&self) {
        self.users_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_login(&self, ok: bool) {
        let counter = if ok { &self.logins_succeeded } else { &self.logins_failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_roadmaps_created(&self) {
        self.roadmaps_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_comments_posted(&self) {
        self.comments_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_votes_cast(&self) {
        self.votes_cast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rankings_computed(&self) {
        self.rankings_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            users_registered: self.users_registered.load(Ordering::Relaxed),
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            roadmaps_created: self.roadmaps_created.load(Ordering::Relaxed),
            comments_posted: self.comments_posted.load(Ordering::Relaxed),
            votes_cast: self.votes_cast.load(Ordering::Relaxed),
            rankings_computed: self.rankings_computed.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub users_registered: u64,
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub roadmaps_created: u64,
    pub comments_posted: u64,
    pub votes_cast: u64,
    pub rankings_computed: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Prometheus text exposition format.
    pub fn to_prometheus(&self) -> String {
        let counters = [
            ("users_registered", "Accounts created", self.users_registered),
            ("logins_succeeded", "Successful logins", self.logins_succeeded),
            ("logins_failed", "Rejected logins", self.logins_failed),
            ("roadmaps_created", "Roadmaps created", self.roadmaps_created),
            ("comments_posted", "Comments posted", self.comments_posted),
            ("votes_cast", "Votes cast on roadmaps and comments", self.votes_cast),
            ("rankings_computed", "Bayesian rankings computed", self.rankings_computed),
        ];
        let mut out = String::new();
        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP roadmapper_{name} {help}\n# TYPE roadmapper_{name} counter\nroadmapper_{name} {value}\n"
            ));
        }
        out.push_str(&format!(
            "# HELP roadmapper_uptime_seconds Uptime seconds\n# TYPE roadmapper_uptime_seconds gauge\nroadmapper_uptime_seconds {}\n",
            self.uptime_seconds
        ));
        out
    }
}
