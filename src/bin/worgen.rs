//! Word combination generator for onion_vanity word lists.
//!
//! Usage:
//!   worgen 8-12 wordlist1.txt 5-10 wordlist2.txt 3-5 > results.txt

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;

use onion_vanity::combine::{combine, CombineError, WordList};
use onion_vanity::config::LengthRange;

const EXAMPLE: &str = "\
Example: worgen 8-12 wordlist1.txt 5-10 wordlist2.txt 3-5 > results.txt

    Generates word combinations from 8 to 12 characters long
    using 5-10 character long words from 'wordlist1.txt'
    followed by 3-5 character long words from 'wordlist2.txt'.
    Saves the results to 'results.txt'.";

/// Generates word combinations out of one to three word lists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = EXAMPLE)]
struct Args {
    /// Length limits for the output strings
    #[arg(value_name = "min-max")]
    range: LengthRange,

    /// Word list file name followed by the length limits for its words
    #[arg(value_name = "filename min-max", required = true, num_args = 2..=6)]
    lists: Vec<String>,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let specs = match list_specs(&args.lists) {
        Ok(specs) => specs,
        Err(msg) => {
            eprintln!("error: {}\n\n{}", msg, EXAMPLE);
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(args.range, &specs) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

/// Pairs up `filename min-max` arguments.
fn list_specs(raw: &[String]) -> Result<Vec<(PathBuf, LengthRange)>, String> {
    if raw.len() % 2 != 0 {
        return Err("every word list needs a min-max length range".into());
    }
    raw.chunks(2)
        .map(|pair| {
            let range = pair[1]
                .parse::<LengthRange>()
                .map_err(|e| format!("{}: {}", pair[0], e))?;
            Ok((PathBuf::from(&pair[0]), range))
        })
        .collect()
}

fn run(output: LengthRange, specs: &[(PathBuf, LengthRange)]) -> Result<(), CombineError> {
    info!("Will be producing {} character long word combinations.", output);

    let mut lists = Vec::with_capacity(specs.len());
    for (path, range) in specs {
        info!("Reading {} characters words from {}.", range, path.display());
        let list = WordList::load(path, *range)?;
        info!("Loaded {} words from {}.", list.len(), path.display());
        lists.push(list);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = combine(&lists, output, &mut out, |i, total, written| {
        eprint!(
            "\rWorking. {}% complete, {} words produced.",
            (i + 1) * 100 / total,
            written
        );
    })
    .and_then(|n| out.flush().map(|_| n))
    .map_err(CombineError::Write)?;

    eprintln!();
    info!("Final count: {} word combinations.", written);
    Ok(())
}
