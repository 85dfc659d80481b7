//! Error and stop-reason taxonomy.
//!
//! A separate `thiserror` enum per concern rather than a single
//! crate-wide error type: setup failures and driver stop reasons are
//! different kinds of thing and are never propagated through the same
//! `Result`.

use std::fmt;
use thiserror::Error;

use crate::state::MEM_SIZE;

/// Fatal setup errors: argument parsing or image loading failed
/// before any instruction ran. Always maps to exit code 1.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Usage: {program} <machine_code_file_name>")]
    BadUsage { program: String },
    #[error("could not open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why the fetch-decode-execute loop stopped. Every variant is a
/// graceful, expected outcome -- the driver returns one of these from
/// every run, it never returns a `Result` error for these conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStop {
    /// `pc + 1 >= MEM_SIZE` before a fetch.
    EndOfMemory { pc: u16 },
    /// Fetched a zero instruction word, the halt sentinel.
    ZeroInstruction { pc: u16 },
    /// `ecall 3` was executed.
    Ecall3,
    /// `MAX_INSTRUCTIONS` instructions retired without stopping.
    InstructionCap { limit: u64 },
}

impl DriverStop {
    /// Whether this stop reason should be reported on stdout (guest
    /// halt) rather than stderr (bounded-termination diagnostics).
    pub fn is_guest_halt(&self) -> bool {
        matches!(self, DriverStop::Ecall3)
    }
}

impl fmt::Display for DriverStop {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DriverStop::EndOfMemory { pc } => {
                write!(f, "Reached end of memory at 0x{pc:04X}")
            }
            DriverStop::ZeroInstruction { pc } => {
                write!(f, "Encountered zero instruction at 0x{pc:04X}")
            }
            DriverStop::Ecall3 => write!(f, "Simulation terminated by ecall"),
            DriverStop::InstructionCap { limit } => write!(
                f,
                "Simulation terminated: Exceeded maximum instruction count ({limit})"
            ),
        }
    }
}

/// Sanity check used by the loader: an image larger than `MEM_SIZE`
/// is truncated, not rejected, so this exists only for the diagnostic
/// the CLI prints, not as a hard error.
pub fn truncated_len(image_len: usize) -> usize {
    image_len.min(MEM_SIZE)
}
