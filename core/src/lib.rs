//! Interpreting emulator core for the Intel MCS-51 (8051) instruction set.
//!
//! This crate owns the CPU state, the Intel HEX loader, the opcode
//! dispatch table, and the cycle-budget driver. It has no knowledge of
//! any particular front end.

pub mod cpu;
pub mod emulator;
pub mod hex;
pub mod memory;

pub mod prelude {
    pub use crate::cpu::Mcs51;
    pub use crate::emulator::{CycleObserver, Emulator, EmulatorError, StopHandle};
    pub use crate::hex::IntelHexError;
    pub use crate::memory::{Memory, PswFlag};
}
