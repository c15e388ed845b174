use std::io::{self, Write};

use serde::Serialize;

use crate::app::{BatchResult, ProgressEvent, ProgressSink, RunResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_batch(result: &BatchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress on stderr, summary on stdout.
pub struct TextOutput;

impl TextOutput {
    pub fn print_run(result: &RunResult) {
        if let Some(query) = &result.query {
            println!(
                "-- {} {} -> {}",
                result.dataset, result.date, result.database
            );
            println!("{query}");
            return;
        }
        println!("{} {}", result.dataset, result.date);
        println!("   records fetched: {}", result.fetched);
        println!(
            "   inserted: {}, skipped: {}",
            result.inserted, result.skipped
        );
        println!("   rows in table: {}", result.total_rows);
        println!("   database: {}", result.database);
    }

    pub fn print_batch(result: &BatchResult) {
        for run in &result.runs {
            Self::print_run(run);
        }
    }
}

impl ProgressSink for TextOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({:.1}s)", event.message, elapsed.as_secs_f64()),
            None => eprintln!("{}", event.message),
        }
    }
}
