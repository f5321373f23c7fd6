//! Core traits and types for cycle-accurate emulation.
//!
//! The CPU owns the clock: memory and port devices are plain data
//! sources and sinks, and every access cost is charged by the CPU itself.

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, IoBus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
