//! the simulator binary. takes an executable image, passes the remaining
//! arguments to the guest program, and runs it to completion.
//!
//! run with `--help` for more info.

use std::process::ExitCode;

use clap::Parser;

use mipsim::machine::Machine;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// the executable image to run
    file: String,
    /// arguments handed to the guest program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
    /// print each instruction to stderr as it executes
    #[arg(short, long)]
    trace: bool,
    /// treat signed arithmetic overflow as a fatal fault
    #[arg(long)]
    strict_overflow: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let image = match std::fs::read(&args.file) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("mipsim: cannot read {}: {err}", args.file);
            return ExitCode::FAILURE;
        }
    };

    // The guest sees its own path as argv[0].
    let mut guest_args = vec![args.file.clone()];
    guest_args.extend(args.args);

    let mut machine = match Machine::load(&image, &guest_args) {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("mipsim: {}: {err}", args.file);
            return ExitCode::FAILURE;
        }
    };
    machine.trace = args.trace;
    machine.strict_overflow = args.strict_overflow;

    match machine.run() {
        Ok(status) => {
            if let Some(status) = status.filter(|&s| s != 0) {
                eprintln!("mipsim: guest exited with status {status}");
            }
            ExitCode::SUCCESS
        }
        Err(fault) => {
            eprintln!("mipsim: {fault} at pc=0x{:08X}", machine.regs.pc);
            ExitCode::FAILURE
        }
    }
}
