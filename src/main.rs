//! Onion Vanity Name Generator CLI
//!
//! Usage:
//!   onion_vanity -p test                      # Find a name starting with "test"
//!   onion_vanity -v -r '^dusk.*dawn$'         # Find a name matching a regex
//!   onion_vanity -cvt4 -l8-12 -f words.txt    # Keep finding names from a word list

use std::io;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::info;

use onion_vanity::worker::telemetry::format_number;
use onion_vanity::worker::Telemetry;
use onion_vanity::{
    Cli, Matcher, PoolEvent, ResultReporter, SearchConfig, SearchError, WorkerPool,
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let config = match cli.into_search_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}\n", e);
            eprintln!("{}", Cli::command().render_usage());
            process::exit(1);
        }
    };

    init_logging(config.verbose);

    if let Err(e) = run(&config) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "off" };

    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();
}

fn run(config: &SearchConfig) -> Result<(), SearchError> {
    info!("Verbose, {}.", config);

    let matcher = Matcher::from_config(config)?;
    if let Matcher::Prefix(prefix) = &matcher {
        info!(
            "Expected trials per match: {}",
            format_number(prefix.estimated_difficulty())
        );
    }
    info!("Searching for {}.", matcher);

    let pool = WorkerPool::new(config.threads, matcher, config.continuous)?;
    ctrlc_handler(pool.stop_flag_clone())?;

    let mut telemetry = config.verbose.then(|| {
        info!("Running, collecting performance data...");
        Telemetry::new(Instant::now())
    });
    let mut reporter = ResultReporter::new(io::stdout().lock(), config.continuous);

    loop {
        let timeout = telemetry.as_ref().map(|t| t.until_due(Instant::now()));

        match pool.next_event(timeout) {
            PoolEvent::Found(result) => {
                let written = reporter.report(&result).map_err(SearchError::Output)?;
                if written && !config.continuous {
                    pool.stop();
                }
            }
            PoolEvent::Idle => {
                if let Some(sample) = telemetry
                    .as_mut()
                    .and_then(|t| t.sample(Instant::now(), pool.total_trials()))
                {
                    info!(
                        "Total hashes: {}, running time: {} seconds, hashes per second: {}",
                        sample.trials,
                        sample.elapsed.as_secs(),
                        format_number(sample.rate as u64)
                    );
                }
            }
            PoolEvent::Finished => break,
        }
    }

    for id in 0..pool.num_workers() {
        info!("Thread #{}: {} hashes.", id + 1, pool.worker_trials(id));
    }
    info!(
        "Done. {} hashes, {} result(s), {:.2}s elapsed.",
        pool.total_trials(),
        reporter.reported(),
        pool.elapsed().as_secs_f64()
    );

    pool.join()
}

fn ctrlc_handler(stop_flag: Arc<AtomicBool>) -> Result<(), SearchError> {
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Release);
    })?;
    Ok(())
}
