//! Replay keystrokes against a corpus and print the selected entry after each one.
//!
//! Usage:
//!     cargo run --release --bin typeahead -- --corpus names.txt b r a
//!     printf 'Alpha\nBravo\n' | cargo run --bin typeahead -- --corpus - br
//!
//! One corpus entry per line. Keystrokes separated by less than the timeout
//! extend the query; use `--delay-ms` to simulate pauses.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::time::Duration;
use typeahead::{SearchSession, SessionConfig, DEFAULT_TIMEOUT_MS};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File with one entry per line, or `-` for stdin
    #[arg(short, long)]
    corpus: String,

    /// Index the search starts from
    #[arg(short, long, default_value_t = 0)]
    start: usize,

    /// Debounce timeout in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Pause between keystrokes in milliseconds
    #[arg(short, long, default_value_t = 0)]
    delay_ms: u64,

    /// Keep whitespace typed into an empty query
    #[arg(long)]
    allow_leading_spaces: bool,

    /// Keystrokes, fed in order
    #[arg(required = true)]
    keystrokes: Vec<String>,
}

fn read_corpus(source: &str) -> Result<Vec<String>> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read corpus from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read corpus file {}", source))?
    };
    Ok(text.lines().map(str::to_string).collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let entries = read_corpus(&args.corpus)?;

    let config = SessionConfig::default()
        .with_timeout(Duration::from_millis(args.timeout_ms))
        .with_leading_spaces(args.allow_leading_spaces);
    let session = SearchSession::new(config);
    session.set_strings(entries);
    println!("Loaded {} entries (workload threshold {})", session.corpus_len(), session.workload_threshold());

    for (i, keystroke) in args.keystrokes.iter().enumerate() {
        if i > 0 && args.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }
        session.search_from(keystroke, args.start);
        session.wait_idle().await;

        let corpus = session.corpus();
        match session.current_index() {
            Some(index) => println!(
                "{:?} -> [{}] {}",
                session.buffer(),
                index,
                corpus.get(index).unwrap_or_default()
            ),
            None => println!("{:?} -> no match", session.buffer()),
        }
    }

    Ok(())
}
