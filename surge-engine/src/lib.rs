mod config;
mod executor;
mod outcome;
mod scheduler;
mod stats;

pub use self::config::{Config, ConfigError, TargetSpec};
pub use self::executor::{build_client, execute, HttpsClient, RequestError};
pub use self::outcome::{CapturedResponse, Disposition, FailureKind, Outcome};
pub use self::scheduler::{EngineError, WaveScheduler};
pub use self::stats::{RunStats, TargetStats};
