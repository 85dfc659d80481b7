use std::fs;
use std::io;
use std::process::ExitCode;

use clap::Parser;

use z16emu::driver;
use z16emu::error::{truncated_len, LoadError};
use z16emu::state::State;

/// Instruction-set simulator for the Z16 16-bit RISC-style architecture
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the raw Z16 binary memory image
    binary_file: String,

    /// Suppress the per-instruction trace line (stdout); guest ecall
    /// output and the final register dump are unaffected
    #[arg(short, long)]
    quiet: bool,
}

fn load(args: &Args) -> Result<Vec<u8>, LoadError> {
    fs::read(&args.binary_file).map_err(|source| LoadError::OpenFailed {
        path: args.binary_file.clone(),
        source,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .without_time()
        .init();

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "z16emu".to_string());
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => {
            eprintln!("{}", LoadError::BadUsage { program });
            return ExitCode::FAILURE;
        }
    };

    let image = match load(&args) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut state = State::new();
    let n = truncated_len(image.len());
    state.memory.load_image(&image);
    println!("Loaded {n} bytes into memory");

    let stop = if args.quiet {
        driver::run(&mut state, &mut io::sink())
    } else {
        driver::run(&mut state, &mut io::stdout())
    };

    // Bounded-termination diagnostics are already logged by the
    // driver on stderr; only the guest-halt message belongs on stdout.
    if stop.is_guest_halt() {
        println!("{stop}");
    }

    print!("\n--- Final Register State ---\n{}", state.registers);
    println!("PC: 0x{:04X}", state.pc);
    println!("---------------------------");

    ExitCode::SUCCESS
}
