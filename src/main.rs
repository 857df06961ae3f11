//! Trellis - hierarchical work-item tracker

use std::process::ExitCode;

fn main() -> ExitCode {
    trellis_cli::cli::run()
}
