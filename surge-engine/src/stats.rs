use crate::config::Config;
use crate::outcome::{CapturedResponse, Outcome};
use fnv::FnvHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Accumulated results for one target. Owned exclusively by the aggregation
/// consumer; nothing else ever writes to it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetStats {
    pub total: u64,
    pub failures: u64,
    /// Count per classification label ("200 : OK", "Timeout", ...).
    pub status: FnvHashMap<String, u64>,
    pub sum_elapsed: f64,
    pub min_elapsed: f64,
    pub max_elapsed: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<CapturedResponse>,
}

impl TargetStats {
    pub fn new() -> TargetStats {
        TargetStats::default()
    }

    /// Fold one outcome into the stats. Must be called strictly
    /// sequentially for a given run.
    pub fn apply(&mut self, outcome: Outcome) {
        self.total += 1;
        if outcome.disposition.is_failure() {
            self.failures += 1;
        }
        *self.status.entry(outcome.disposition.label()).or_insert(0) += 1;

        let took = outcome.elapsed.as_secs_f64();
        if self.total == 1 {
            // First sample seeds the extremes; zero-initialized min would
            // never lose a comparison again.
            self.sum_elapsed = took;
            self.min_elapsed = took;
            self.max_elapsed = took;
        } else {
            self.sum_elapsed += took;
            self.min_elapsed = self.min_elapsed.min(took);
            self.max_elapsed = self.max_elapsed.max(took);
        }

        if let Some(response) = outcome.response {
            self.responses.push(response);
        }
    }

    /// Mean elapsed seconds, derived on demand.
    pub fn avg_elapsed(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.sum_elapsed / self.total as f64
        }
    }
}

/// Per-target stats for a whole run, one entry per configured target,
/// created empty at run start.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RunStats {
    targets: BTreeMap<String, TargetStats>,
}

impl RunStats {
    pub fn new(config: &Config) -> RunStats {
        let targets = config
            .targets
            .keys()
            .map(|name| (name.clone(), TargetStats::new()))
            .collect();
        RunStats { targets }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        self.targets
            .entry(outcome.target.clone())
            .or_insert_with(TargetStats::new)
            .apply(outcome);
    }

    pub fn get(&self, target: &str) -> Option<&TargetStats> {
        self.targets.get(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TargetStats)> {
        self.targets.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::outcome::{Disposition, FailureKind};
    use http::StatusCode;
    use std::time::Duration;

    fn outcome(target: &str, disposition: Disposition, millis: u64) -> Outcome {
        Outcome {
            target: target.into(),
            disposition,
            elapsed: Duration::from_millis(millis),
            response: None,
        }
    }

    fn ok(millis: u64) -> Outcome {
        outcome("t", Disposition::Status(StatusCode::OK), millis)
    }

    #[test]
    fn first_sample_seeds_extremes() {
        let mut stats = TargetStats::new();
        stats.apply(ok(250));
        assert_eq!(stats.total, 1);
        assert_eq!(stats.min_elapsed, 0.25);
        assert_eq!(stats.max_elapsed, 0.25);
        assert_eq!(stats.sum_elapsed, 0.25);
    }

    #[test]
    fn extremes_track_later_samples() {
        let mut stats = TargetStats::new();
        stats.apply(ok(250));
        stats.apply(ok(100));
        stats.apply(ok(400));
        assert_eq!(stats.min_elapsed, 0.1);
        assert_eq!(stats.max_elapsed, 0.4);
        assert_eq!(stats.total, 3);
        assert!((stats.avg_elapsed() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn http_error_status_is_not_a_failure() {
        let mut stats = TargetStats::new();
        for _ in 0..5 {
            stats.apply(outcome(
                "t",
                Disposition::Status(StatusCode::NOT_FOUND),
                10,
            ));
        }
        assert_eq!(stats.total, 5);
        assert_eq!(stats.failures, 0);
        assert_eq!(stats.status["404 : Not Found"], 5);
    }

    #[test]
    fn one_success_one_failure() {
        let mut stats = TargetStats::new();
        stats.apply(ok(100));
        stats.apply(outcome(
            "t",
            Disposition::Failed(FailureKind::Timeout),
            1000,
        ));
        assert_eq!(stats.total, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.status.len(), 2);
        assert_eq!(stats.status["200 : OK"], 1);
        assert_eq!(stats.status["Timeout"], 1);
        assert!((stats.avg_elapsed() - stats.sum_elapsed / 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_stats_average_is_zero() {
        let stats = TargetStats::new();
        assert_eq!(stats.avg_elapsed(), 0.0);
    }

    // Invariant check over a generated outcome stream: total equals the
    // histogram sum, failures never exceed total, and min/max bound every
    // applied sample, after every single application.
    #[test]
    fn invariants_hold_over_generated_stream() {
        let mut stats = TargetStats::new();
        let mut applied = Vec::new();
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            // xorshift, deterministic across runs
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;

            let millis = state % 2000;
            let disposition = match state % 5 {
                0 => Disposition::Failed(FailureKind::Timeout),
                1 => Disposition::Failed(FailureKind::Transport("connection refused".into())),
                2 => Disposition::Status(StatusCode::NOT_FOUND),
                3 => Disposition::Status(StatusCode::INTERNAL_SERVER_ERROR),
                _ => Disposition::Status(StatusCode::OK),
            };
            stats.apply(outcome("t", disposition, millis));
            applied.push(Duration::from_millis(millis).as_secs_f64());

            assert_eq!(stats.total, stats.status.values().sum::<u64>());
            assert!(stats.failures <= stats.total);
            for took in &applied {
                assert!(stats.min_elapsed <= *took);
                assert!(*took <= stats.max_elapsed);
            }
        }
        assert_eq!(stats.total, 500);
    }

    #[test]
    fn run_stats_routes_by_target() {
        let mut run = RunStats {
            targets: BTreeMap::new(),
        };
        run.apply(outcome("a", Disposition::Status(StatusCode::OK), 10));
        run.apply(outcome("b", Disposition::Failed(FailureKind::Timeout), 20));
        run.apply(outcome("a", Disposition::Status(StatusCode::OK), 30));
        assert_eq!(run.get("a").unwrap().total, 2);
        assert_eq!(run.get("b").unwrap().total, 1);
        assert_eq!(run.get("b").unwrap().failures, 1);
    }
}
