// file: src/utils/logging.rs
// description: Tracing subscriber initialization with optional ANSI coloring

use crate::models::BookRecord;
use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. `RUST_LOG` wins over the verbose flag.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

/// One numbered book block for terminal listings.
pub fn format_book(index: usize, book: &BookRecord) -> String {
    let heading = match (book.title(), book.author()) {
        (Some(title), Some(author)) => format!("{} by {}", title.bold(), author),
        (Some(title), None) => title.bold().to_string(),
        (None, Some(author)) => format!("(untitled) by {}", author),
        (None, None) => "(untitled)".dimmed().to_string(),
    };

    let mut out = format!("{} {}", format!("{:>3}.", index).cyan().bold(), heading);
    for (key, value) in book.iter() {
        if key == "title" || key == "author" {
            continue;
        }
        out.push_str(&format!("\n     {} {}", format!("{}:", key).dimmed(), value));
    }
    out
}
