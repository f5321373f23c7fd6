//! CPU core trait.

use crate::Ticks;

/// A CPU core.
///
/// The CPU owns its memory and port devices and drives time itself: each
/// call to [`Cpu::execute_cycle`] charges the ticks the work consumed.
/// Signals raised between cycles are only ever sampled at the top of the
/// next cycle.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Run one engine cycle: either service a pending signal or fetch one
    /// opcode byte and act on it.
    fn execute_cycle(&mut self);

    /// Reset the CPU synchronously.
    fn reset(&mut self);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns the tick counter.
    fn ticks(&self) -> Ticks;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Assert the maskable interrupt line.
    fn interrupt(&mut self);

    /// Assert the non-maskable interrupt line.
    fn nmi(&mut self);
}
