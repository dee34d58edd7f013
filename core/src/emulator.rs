//! The cycle-budget driver: loads a program, then runs the CPU at a
//! configurable instruction rate until told to stop.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cpu::Mcs51;
use crate::hex::{self, IntelHexError};

/// Errors that can prevent an emulator run from starting.
#[derive(Debug)]
pub enum EmulatorError {
    /// Failure opening the program file.
    Io(std::io::Error),
    /// Failure parsing the program file as Intel HEX.
    Hex(IntelHexError),
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::Io(e) => write!(f, "could not open program file: {e}"),
            EmulatorError::Hex(e) => write!(f, "could not load program: {e}"),
        }
    }
}

impl std::error::Error for EmulatorError {}

impl From<std::io::Error> for EmulatorError {
    fn from(e: std::io::Error) -> Self {
        EmulatorError::Io(e)
    }
}

impl From<IntelHexError> for EmulatorError {
    fn from(e: IntelHexError) -> Self {
        EmulatorError::Hex(e)
    }
}

/// Called once per cycle-budget boundary (i.e. once per simulated second,
/// not once per instruction) while an [`Emulator`] is running.
///
/// This replaces the raw function-pointer-plus-context-pointer callback
/// of the source this emulator is modeled on with an ordinary trait
/// object, so observers can hold whatever state they need as plain
/// fields instead of behind a `void*`.
pub trait CycleObserver {
    fn on_cycle_boundary(&mut self, cpu: &Mcs51, instructions_executed: u64);
}

/// A no-op observer, useful when a caller only wants the side effects of
/// running the program.
impl CycleObserver for () {
    fn on_cycle_boundary(&mut self, _cpu: &Mcs51, _instructions_executed: u64) {}
}

/// A cross-thread handle that asks a running [`Emulator`] to stop.
///
/// Cloning shares the same underlying flag: any clone's [`StopHandle::stop`]
/// is visible to every other clone and to the thread running
/// [`Emulator::run`].
#[derive(Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request that the run loop stop before its next instruction.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns a CPU and drives it at a fixed instruction budget per wall-clock
/// second until stopped.
pub struct Emulator {
    cpu: Mcs51,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    pub fn new() -> Self {
        Self { cpu: Mcs51::new() }
    }

    pub fn cpu(&self) -> &Mcs51 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mcs51 {
        &mut self.cpu
    }

    /// Load an Intel HEX program into ROM from a path, resetting the CPU
    /// first so a previous run's register state cannot leak into this one.
    pub fn load_program(&mut self, path: impl AsRef<Path>) -> Result<usize, EmulatorError> {
        let file = File::open(path)?;
        self.cpu.reset();
        let n = hex::load(BufReader::new(file), self.cpu.memory_mut().rom_mut())?;
        Ok(n)
    }

    /// Run until `stop` is signalled, executing `instructions_per_second`
    /// instructions per wall-clock second and calling `observer` once at
    /// the end of each such second.
    ///
    /// Pacing is wall-clock sleep rather than free-running: each budget
    /// block is timed, and any leftover time in that second is slept away
    /// before the next block begins. A block that overruns its second
    /// (e.g. because the host is under load) proceeds immediately into
    /// the next block without trying to make up the lost time.
    pub fn run(
        &mut self,
        instructions_per_second: u32,
        observer: &mut dyn CycleObserver,
        stop: &StopHandle,
    ) {
        let tick = Duration::from_secs(1);
        let mut total_executed: u64 = 0;

        while !stop.is_stopped() {
            let block_start = Instant::now();
            for _ in 0..instructions_per_second {
                if stop.is_stopped() {
                    break;
                }
                self.cpu.step();
                total_executed += 1;
            }
            observer.on_cycle_boundary(&self.cpu, total_executed);

            let elapsed = block_start.elapsed();
            if elapsed < tick {
                thread::sleep(tick - elapsed);
            }
        }
    }

    /// Run for a fixed number of cycle-budget boundaries (i.e. simulated
    /// seconds), ignoring wall-clock pacing. Intended for tests and
    /// scripted/batch use where real-time throttling is undesirable.
    pub fn run_for_ticks(
        &mut self,
        instructions_per_second: u32,
        ticks: u32,
        observer: &mut dyn CycleObserver,
    ) {
        let mut total_executed: u64 = 0;
        for _ in 0..ticks {
            for _ in 0..instructions_per_second {
                self.cpu.step();
                total_executed += 1;
            }
            observer.on_cycle_boundary(&self.cpu, total_executed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingObserver {
        boundaries: u32,
    }
    impl CycleObserver for CountingObserver {
        fn on_cycle_boundary(&mut self, _cpu: &Mcs51, _instructions_executed: u64) {
            self.boundaries += 1;
        }
    }

    #[test]
    fn run_for_ticks_executes_budget_times_ticks() {
        let mut emu = Emulator::new();
        // fill ROM with NOPs
        for b in emu.cpu_mut().memory_mut().rom_mut().iter_mut() {
            *b = 0x00;
        }
        let mut observer = CountingObserver { boundaries: 0 };
        emu.run_for_ticks(10, 3, &mut observer);
        assert_eq!(observer.boundaries, 3);
    }

    #[test]
    fn stop_handle_halts_run() {
        let mut emu = Emulator::new();
        for b in emu.cpu_mut().memory_mut().rom_mut().iter_mut() {
            *b = 0x00;
        }
        let stop = StopHandle::new();
        stop.stop();
        let mut observer = CountingObserver { boundaries: 0 };
        emu.run(1, &mut observer, &stop);
        assert_eq!(observer.boundaries, 0);
    }
}
