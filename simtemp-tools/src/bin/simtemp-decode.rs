//! Print a raw sample file as a table

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use simtemp_tools::decode::decode_to;

#[derive(Parser)]
#[command(name = "simtemp-decode")]
#[command(about = "Decode 16-byte simtemp sample records", long_about = None)]
struct Cli {
    /// File of concatenated records
    file: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::from(1) } else { ExitCode::SUCCESS };
        }
    };

    let file = match File::open(&cli.file) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open file: {}: {}", cli.file.display(), e);
            return ExitCode::from(1);
        }
    };

    let stdout = io::stdout();
    match decode_to(BufReader::new(file), &mut stdout.lock()) {
        Ok(summary) => {
            if summary.trailing_bytes > 0 {
                eprintln!("ignored {} trailing bytes", summary.trailing_bytes);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
