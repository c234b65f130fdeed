//! Headless session runner (default binary).
//!
//! Reads one JSON command per stdin line and answers each with one JSON line
//! on stdout. Diagnostics go to stderr.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use blockfall::session::{Session, SessionConfig};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = SessionConfig::from_env().apply_args(&args)?;
    let mut session = Session::new(&config)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if let Some(reply) = session.handle_line(&line) {
            out.write_all(reply.to_line()?.as_bytes())?;
            out.write_all(b"\n")?;
            out.flush()?;
        }
        if session.is_finished() {
            break;
        }
    }

    Ok(())
}
