//! fieldguard CLI entry point
//!
//! Parses nothing and loads nothing itself; everything is delegated to
//! `cli::run`. Errors go to stderr with a non-zero exit status.

use fieldguard::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
