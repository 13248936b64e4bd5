//! Per-testbench progress lines.
//!
//! Single lines go through the logger so concurrent tasks never interleave
//! within a line. Full log dumps are printed to stdout and are only used when
//! one testbench runs.

use console::Style;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

static TITLE: Lazy<Style> = Lazy::new(|| Style::new().red().bold());

pub fn info(test: &str, line: &str) {
    info!("{test}: {line}");
}

pub fn warning(test: &str, line: &str) {
    warn!("{test}: {line}");
}

pub fn error(test: &str, line: &str) {
    error!("{test}: {line}");
}

/// Prints the whole file under a banner, falling back to a one-liner when it can't be read.
pub fn dump(test: &str, title: &str, path: &Path) {
    match fs::read(path) {
        Ok(text) => {
            println!();
            println!("{}", TITLE.apply_to(format!("===== {title} =====")));
            println!();
            println!("{}", String::from_utf8_lossy(&text));
        }
        Err(_) => error(
            test,
            &format!("{title}, \"{}\" is not readable", path.to_string_lossy()),
        ),
    }
}

/// Reports a failure recorded in `path`: dumped in full when `verbose`, one line otherwise.
pub fn surface(test: &str, verbose: bool, title: &str, hint: &str, path: &Path) {
    if verbose {
        dump(test, title, path);
    } else {
        error(test, &format!("{title}. {hint}"));
    }
}
