mod reporting;

use anyhow::Error;
use clap::{App, Arg};
use slog::{o, Drain, Level};
use surge_engine::{Config, RunStats, WaveScheduler};
use tokio::runtime::Runtime;

fn root_logger(level: Level) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stdout().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let async_drain = slog_async::Async::new(drain).build().fuse();
    let level_filter = slog::LevelFilter(async_drain, level).fuse();
    slog::Logger::root(level_filter, o!())
}

fn run_waves(logger: slog::Logger, config: Config, capture: bool) -> Result<RunStats, Error> {
    let mut rt = Runtime::new()?;
    let scheduler = WaveScheduler::new(config, capture, logger);
    let stats = rt.block_on(scheduler.run())?;
    Ok(stats)
}

fn main() {
    let matches = App::new("Surge")
        .version("1.0")
        .about("Issue waves of concurrent requests against configured targets and report per-target statistics")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Path to config file")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("FILE")
                .help("Store full results, captured responses included, as JSON")
                .required(false)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets verbosity level"),
        )
        .get_matches();
    let config_path = matches.value_of("config").unwrap();
    let config = match Config::load(&config_path) {
        Ok(conf) => conf,
        Err(e) => {
            eprintln!("Could not load config: {}", e);
            std::process::exit(1);
        }
    };
    let output = matches.value_of("output").map(String::from);
    let level = match matches.occurrences_of("v") {
        0 => Level::Warning,
        1 => Level::Info,
        2 => Level::Debug,
        3 => Level::Trace,
        _ => {
            eprintln!("WARNING: more than -vvv is ignored");
            Level::Trace
        }
    };
    let logger = root_logger(level);
    // Responses are only worth holding onto when they will be persisted.
    let capture = output.is_some();
    let stats = match run_waves(logger.clone(), config.clone(), capture) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Error running tests: {}", e);
            std::process::exit(1);
        }
    };
    reporting::render(&config, &stats);
    if let Some(path) = output {
        if let Err(e) = reporting::persist(&path, &stats) {
            eprintln!("Could not store results: {}", e);
            std::process::exit(1);
        }
    }
    reporting::log_summary(&logger, &stats);
}
