//! Debug hooks for stack, branch and interrupt activity.
//!
//! Install a [`CpuTracer`] with [`crate::Z80::set_tracer`] or the builder.
//! With no tracer installed the CPU builds no events.

/// An instruction changed SP directly (`LD SP,..`, `INC SP`, `DEC SP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPointerEvent {
    /// Address of the first byte of the instruction, prefixes included.
    pub origin_pc: u16,
    /// Lowercase mnemonic, e.g. `"ld sp,hl"`.
    pub operation: &'static str,
    pub old_sp: u16,
    pub new_sp: u16,
    /// Tick counter after the instruction completed.
    pub ticks: u64,
}

/// An instruction moved data through the stack.
///
/// `content` is the word pushed or popped when there is one; returns report
/// `None` since the popped value is the new PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackContentEvent {
    pub origin_pc: u16,
    pub operation: &'static str,
    pub old_sp: u16,
    pub content: Option<u16>,
    pub ticks: u64,
}

/// A taken jump, relative jump or DJNZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchEvent {
    pub origin_pc: u16,
    pub operation: &'static str,
    pub target: u16,
    pub ticks: u64,
}

/// A maskable interrupt was accepted and the CPU is at its service routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptEvent {
    /// Address pushed as the return address.
    pub return_pc: u16,
    /// Interrupt mode in force (0, 1 or 2).
    pub mode: u8,
    /// Start of the service routine.
    pub vector: u16,
    pub ticks: u64,
}

/// A non-maskable interrupt was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NmiEvent {
    pub return_pc: u16,
    pub vector: u16,
    pub ticks: u64,
}

/// Receiver for CPU debug events. Every method defaults to doing nothing.
pub trait CpuTracer {
    fn stack_pointer(&mut self, _event: &StackPointerEvent) {}

    fn stack_content(&mut self, _event: &StackContentEvent) {}

    fn branch(&mut self, _event: &BranchEvent) {}

    fn interrupt(&mut self, _event: &InterruptEvent) {}

    fn nmi(&mut self, _event: &NmiEvent) {}
}
