//! USI protocol output formatting
//!
//! The search itself prints `info` and `bestmove` lines; this module only
//! covers the handshake and option responses emitted by the front end.

use std::fmt;
use std::io::Write;

use anyhow::Result;

/// USI protocol responses
#[derive(Debug, Clone)]
pub enum UsiResponse {
    /// Engine identification
    Id { name: String, author: String },

    /// USI mode confirmed
    UsiOk,

    /// Ready confirmation
    ReadyOk,

    /// Engine option
    Option(String),

    /// String message (for errors/warnings)
    String(String),
}

impl fmt::Display for UsiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsiResponse::Id { name, author } => {
                writeln!(f, "id name {name}")?;
                write!(f, "id author {author}")
            }
            UsiResponse::UsiOk => write!(f, "usiok"),
            UsiResponse::ReadyOk => write!(f, "readyok"),
            UsiResponse::Option(opt) => write!(f, "{opt}"),
            UsiResponse::String(msg) => write!(f, "info string {msg}"),
        }
    }
}

/// Print a response line and flush stdout
///
/// GUIs read the engine through a pipe, so every line must be flushed
/// explicitly.
pub fn send_response(response: UsiResponse) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{response}")?;
    out.flush()?;
    Ok(())
}
