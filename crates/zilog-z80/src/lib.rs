//! Cycle-accurate Z80 CPU emulator.
//!
//! Each call to [`Z80::execute_cycle`] services one pending signal or fetches
//! one opcode byte and, once an instruction is fully decoded, runs it with
//! per-phase tick accounting. [`Z80::step`] runs a whole instruction.

mod alu;
mod config;
mod cpu;
mod error;
mod flags;
mod registers;
mod signals;
mod trace;

pub use config::{Z80Builder, Z80Config};
pub use cpu::Z80;
pub use error::Z80Error;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::Registers;
pub use signals::{IndexMode, PrefixMode, Signals};
pub use trace::{
    BranchEvent, CpuTracer, InterruptEvent, NmiEvent, StackContentEvent, StackPointerEvent,
};
