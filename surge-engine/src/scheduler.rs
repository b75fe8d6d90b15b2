use crate::config::Config;
use crate::executor::{self, RequestError};
use crate::stats::RunStats;
use slog::{debug, o};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("a worker task exited without reporting an outcome")]
    WorkerLost,
}

/// Drives a full run: repeated waves of `concurrency x targets` concurrent
/// requests, with every wave fully drained and applied before the next one
/// starts.
///
/// Executor tasks never share mutable state; each one hands its outcome to
/// the scheduler over a channel, and the scheduler applies outcomes to the
/// stats one at a time. That single-writer split is what makes the stats
/// race-free without locks.
pub struct WaveScheduler {
    config: Config,
    capture: bool,
    logger: slog::Logger,
}

impl WaveScheduler {
    pub fn new(config: Config, capture: bool, logger: slog::Logger) -> WaveScheduler {
        WaveScheduler {
            config,
            capture,
            logger,
        }
    }

    pub async fn run(self) -> Result<RunStats, EngineError> {
        let client = executor::build_client();
        let timeout = Duration::from_secs(self.config.timeout);
        let mut stats = RunStats::new(&self.config);
        let wave_size = self.config.concurrency as usize * self.config.targets.len();

        // Coarse budget accounting: the final wave may overshoot `requests`
        // by up to `concurrency - 1` per target. Intentional; per-target
        // totals come out to concurrency * ceil(requests / concurrency).
        let mut remaining = self.config.requests;
        let mut wave = 0u64;
        while remaining > 0 {
            wave += 1;
            let (tx, mut rx) = mpsc::unbounded_channel();
            for _ in 0..self.config.concurrency {
                for (name, spec) in self.config.targets.iter() {
                    let tx = tx.clone();
                    let client = client.clone();
                    let name = name.clone();
                    let spec = spec.clone();
                    let capture = self.capture;
                    let logger = self.logger.new(o!("target" => name.clone()));
                    tokio::spawn(async move {
                        let result = executor::execute(&client, &name, &spec, timeout, capture).await;
                        match &result {
                            Ok(outcome) => debug!(
                                logger,
                                "request finished";
                                "status" => outcome.disposition.label(),
                                "took_s" => outcome.elapsed.as_secs_f64()
                            ),
                            Err(e) => debug!(logger, "request could not be built"; "error" => %e),
                        }
                        // The receiver only goes away if the run already
                        // failed; nothing to do with the outcome then.
                        let _ = tx.send(result);
                    });
                }
            }
            drop(tx);

            // Hard barrier: apply every outcome of this wave before the
            // next wave starts.
            for _ in 0..wave_size {
                let outcome = rx.recv().await.ok_or(EngineError::WorkerLost)??;
                stats.apply(outcome);
            }
            debug!(
                self.logger,
                "wave complete";
                "wave" => wave,
                "applied" => wave_size,
                "remaining" => remaining.saturating_sub(self.config.concurrency)
            );
            remaining = remaining.saturating_sub(self.config.concurrency);
        }
        Ok(stats)
    }
}
