//! CLI driver (§6, "CLI (driver)").
//!
//! A single positional argument names the input AIGER file. The program
//! runs [`aig_toolkit::mc::Driver`] over every PO in turn and reports the
//! combined verdict with the exact exit-code contract §6 specifies:
//! `10` for SAT-with-cex (witness on stdout), `20` for UNSAT (`0\n` on
//! stdout), `0` for UNDECIDED. No other exit codes are ever produced.

use std::path::PathBuf;

use clap::Parser;

use aig_toolkit::mc::{Budget, Driver, Status};

/// And-Inverter-Graph logic synthesis and formal verification toolkit.
#[derive(Parser, Debug)]
#[command(name = "aigsat", about = "Check every PO of an AIGER file for SAT/UNSAT/UNDECIDED")]
struct Args {
    /// Path to the input AIGER file.
    input: PathBuf,

    /// Verbose logging (`RUST_LOG` takes precedence if set).
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn install_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let args = Args::parse();
    install_tracing(args.verbose);

    let seq = match aig_toolkit::io::aiger::read_file(&args.input) {
        Ok(seq) => seq,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let n_pos = seq.aig().pos().len();
    let mut any_undecided = false;
    for po in 0..n_pos {
        let mut driver = Driver::new(Budget::default());
        match driver.run(&seq, po) {
            Status::SatWithCex { frame, pi_frames } => {
                println!("1");
                for frame_vals in &pi_frames {
                    let line: Vec<String> = frame_vals.iter().map(|&b| if b { "1" } else { "0" }.to_string()).collect();
                    println!("{}", line.join(" "));
                }
                tracing::debug!(po, frame, "found counterexample");
                std::process::exit(10);
            }
            Status::Unsat => continue,
            Status::Undecided => any_undecided = true,
        }
    }

    if any_undecided {
        std::process::exit(0);
    }
    println!("0");
    std::process::exit(20);
}
