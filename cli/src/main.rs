//! Command-line front end: loads an Intel HEX program and runs it at a
//! fixed instruction rate, printing a register snapshot once per
//! simulated second until the run duration elapses or the user presses
//! Ctrl-C.

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use mcs51_core::cpu::Mcs51;
use mcs51_core::emulator::{CycleObserver, Emulator, StopHandle};

#[derive(Parser, Debug)]
#[command(name = "mcs51", about = "Intel MCS-51 (8051) interpreting emulator")]
struct Args {
    /// Path to an Intel HEX program image.
    program: String,

    /// Instructions executed per simulated second.
    #[arg(short = 'b', long, default_value_t = 1_000_000)]
    budget: u32,

    /// Stop automatically after this many simulated seconds. Runs until
    /// Ctrl-C if omitted.
    #[arg(short = 's', long)]
    seconds: Option<u32>,

    /// Suppress the per-second register snapshot.
    #[arg(short = 'q', long)]
    quiet: bool,
}

struct SnapshotPrinter {
    quiet: bool,
}

impl CycleObserver for SnapshotPrinter {
    fn on_cycle_boundary(&mut self, cpu: &Mcs51, instructions_executed: u64) {
        if self.quiet {
            return;
        }
        let mem = cpu.memory();
        println!(
            "t={instructions_executed:>12}  pc={:04X} acc={:02X} b={:02X} sp={:02X} dptr={:04X} psw={:02X}",
            cpu.pc(),
            mem.get_acc(),
            mem.get_b(),
            mem.get_sp(),
            mem.get_dptr(),
            mem.get_psw(),
        );
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut emulator = Emulator::new();
    if let Err(e) = emulator.load_program(&args.program) {
        eprintln!("mcs51: {e}");
        return ExitCode::FAILURE;
    }

    let stop = StopHandle::new();
    let mut observer = SnapshotPrinter { quiet: args.quiet };

    // With no --seconds bound, the run loop itself never stops; the
    // process relies on an external signal (Ctrl-C, SIGTERM) to exit.
    if let Some(seconds) = args.seconds {
        let stop_for_timer = stop.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(seconds as u64));
            stop_for_timer.stop();
        });
    }

    emulator.run(args.budget, &mut observer, &stop);
    ExitCode::SUCCESS
}
