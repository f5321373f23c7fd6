//! Z80 CPU engine.
//!
//! One call to [`Z80::execute_cycle`] either services a pending signal or
//! fetches one opcode byte. A prefix byte only switches the decode mode; the
//! byte after it runs the handler from the matching table.

mod bit;
mod dispatch;
mod extended;
mod indexed;
mod indexed_bit;
mod standard;

use emu_core::{Bus, Cpu, IoBus, Observable, Ticks, Value};
use log::{debug, trace};

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::Registers;
use crate::signals::{IndexMode, PrefixMode, Signals};
use crate::trace::{
    BranchEvent, CpuTracer, InterruptEvent, NmiEvent, StackContentEvent, StackPointerEvent,
};

use dispatch::DispatchTables;

/// NMI service routine address.
const NMI_VECTOR: u16 = 0x0066;

/// IM 0/1 service routine address.
const IM1_VECTOR: u16 = 0x0038;

/// Z80 CPU.
///
/// Owns its memory (`M`) and port (`P`) devices. The register file is public
/// so embedders can inspect and patch it between cycles.
pub struct Z80<M, P> {
    // === Registers ===
    pub regs: Registers,

    // === Devices ===
    memory: M,
    ports: P,

    // === Timing ===
    ticks: Ticks,

    // === Interrupt state ===
    signals: Signals,
    iff1: bool,
    iff2: bool,
    im: u8,
    /// Set by prefixes and EI; INT is not accepted while set.
    interrupt_blocked: bool,

    // === Decode state ===
    opcode: u8,
    prefix: PrefixMode,
    index: IndexMode,
    /// True between a prefix byte and the end of its instruction.
    in_op_execution: bool,
    /// Address of the first byte (prefixes included) of the current instruction.
    instruction_start: u16,

    tables: Box<DispatchTables<M, P>>,
    tracer: Option<Box<dyn CpuTracer>>,
}

impl<M: Bus, P: IoBus> Z80<M, P> {
    /// Create a CPU wired to `memory` and `ports`, in the power-on state.
    #[must_use]
    pub fn new(memory: M, ports: P) -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            memory,
            ports,
            ticks: Ticks::ZERO,
            signals: Signals::empty(),
            iff1: false,
            iff2: false,
            im: 0,
            interrupt_blocked: false,
            opcode: 0,
            prefix: PrefixMode::None,
            index: IndexMode::None,
            in_op_execution: false,
            instruction_start: 0,
            tables: Box::new(DispatchTables::new()),
            tracer: None,
        };
        cpu.execute_reset();
        cpu.apply_config(&crate::Z80Config::default());
        cpu
    }

    // =========================================================================
    // Engine
    // =========================================================================

    /// Run one engine cycle.
    ///
    /// Pending signals are checked first (INT, then HALT idle, then reset,
    /// then NMI). Otherwise one opcode byte is fetched: 3 ticks for the read
    /// plus 1 for the refresh cycle.
    pub fn execute_cycle(&mut self) {
        if self.process_signals() {
            return;
        }

        if !self.in_op_execution {
            self.instruction_start = self.regs.pc;
        }
        let opcode = self.read_memory(self.regs.pc);
        self.tick(3);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.refresh();

        match self.prefix {
            PrefixMode::None => match opcode {
                0xDD => self.enter_prefix(IndexMode::Ix, PrefixMode::None),
                0xFD => self.enter_prefix(IndexMode::Iy, PrefixMode::None),
                0xCB => self.enter_prefix(self.index, PrefixMode::Bit),
                0xED => self.enter_prefix(self.index, PrefixMode::Extended),
                _ => {
                    self.interrupt_blocked = false;
                    self.opcode = opcode;
                    let handler = if self.index == IndexMode::None {
                        self.tables.standard[opcode as usize]
                    } else {
                        self.tables.indexed[opcode as usize]
                    };
                    handler(self);
                    self.finish_instruction();
                }
            },
            PrefixMode::Bit => {
                self.interrupt_blocked = false;
                self.opcode = opcode;
                if self.index == IndexMode::None {
                    let handler = self.tables.bit[opcode as usize];
                    handler(self);
                } else {
                    self.execute_indexed_bit(opcode);
                }
                self.finish_instruction();
            }
            PrefixMode::Extended => {
                self.interrupt_blocked = false;
                self.opcode = opcode;
                let handler = self.tables.extended[opcode as usize];
                handler(self);
                self.finish_instruction();
            }
        }
    }

    /// Run engine cycles until a whole instruction has executed or a signal
    /// was serviced. Returns the ticks consumed.
    pub fn step(&mut self) -> u64 {
        let start = self.ticks;
        loop {
            self.execute_cycle();
            if !self.in_op_execution {
                break;
            }
        }
        (self.ticks - start).get()
    }

    /// Synchronous reset, bracketed by raising and dropping the RESET signal.
    pub fn reset(&mut self) {
        self.signals.insert(Signals::RESET);
        self.execute_reset();
        self.signals.remove(Signals::RESET);
    }

    fn enter_prefix(&mut self, index: IndexMode, prefix: PrefixMode) {
        self.index = index;
        self.prefix = prefix;
        self.in_op_execution = true;
        self.interrupt_blocked = true;
        trace!(
            "Z80 prefix at {:#06X}: prefix={} index={}",
            self.regs.pc.wrapping_sub(1),
            prefix.name(),
            index.name()
        );
    }

    fn finish_instruction(&mut self) {
        self.prefix = PrefixMode::None;
        self.index = IndexMode::None;
        self.in_op_execution = false;
    }

    /// DD CB d op / FD CB d op. The displacement arrived as the byte just
    /// fetched; the real opcode follows it.
    fn execute_indexed_bit(&mut self, displacement: u8) {
        let address = self.index_reg().wrapping_add_signed(i16::from(displacement as i8));
        self.regs.wz = address;
        self.tick(1);
        let opcode = self.read_memory(self.regs.pc);
        self.tick(3);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.opcode = opcode;
        let handler = self.tables.indexed_bit[opcode as usize];
        handler(self, address);
    }

    /// Returns true if a signal consumed this cycle.
    fn process_signals(&mut self) -> bool {
        if self.signals.is_empty() {
            return false;
        }

        if self.signals.contains(Signals::INT) && !self.interrupt_blocked && self.iff1 {
            self.execute_interrupt();
            return true;
        }

        if self.signals.contains(Signals::HALTED) {
            // Halted: NOPs keep the refresh counter moving.
            self.tick(3);
            self.refresh();
            return true;
        }

        if self.signals.contains(Signals::RESET) {
            self.execute_reset();
            return true;
        }

        if self.signals.contains(Signals::NMI) {
            self.execute_nmi();
            return true;
        }

        false
    }

    fn execute_reset(&mut self) {
        debug!("Z80 reset at {}", self.ticks);
        self.iff1 = false;
        self.iff2 = false;
        self.im = 0;
        self.interrupt_blocked = false;
        self.signals = Signals::empty();
        self.prefix = PrefixMode::None;
        self.index = IndexMode::None;
        self.regs.pc = 0x0000;
        self.regs.set_ir(0x0000);
        self.in_op_execution = false;
    }

    fn execute_nmi(&mut self) {
        if self.signals.contains(Signals::HALTED) {
            // Step over the HALT opcode.
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
        self.iff1 = false;
        self.signals.remove(Signals::HALTED | Signals::NMI);
        debug!("Z80 NMI from {:#06X} at {}", self.regs.pc, self.ticks);

        let return_pc = self.regs.pc;
        self.push_return_address();
        self.regs.pc = NMI_VECTOR;
        self.trace_nmi(return_pc);
    }

    fn execute_interrupt(&mut self) {
        if self.signals.contains(Signals::HALTED) {
            // Step over the HALT opcode.
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
        self.iff1 = false;
        self.iff2 = false;
        self.signals.remove(Signals::HALTED);
        debug!(
            "Z80 INT (IM {}) from {:#06X} at {}",
            self.im, self.regs.pc, self.ticks
        );

        let return_pc = self.regs.pc;
        self.push_return_address();

        if self.im < 2 {
            // No device drives the data bus, so IM 0 behaves like IM 1.
            self.regs.wz = IM1_VECTOR;
            self.tick(5);
        } else {
            // The device supplies the low byte of the table address; the
            // device here always supplies zero. The table entry is added
            // onto the latch, not loaded into it.
            self.tick(2);
            let table = u16::from(self.regs.i) << 8;
            self.tick(5);
            let lo = self.read_memory(table);
            self.tick(3);
            let hi = self.read_memory(table.wrapping_add(1));
            self.tick(3);
            self.regs.wz = self.regs.wz.wrapping_add(u16::from_le_bytes([lo, hi]));
            self.tick(6);
        }
        self.regs.pc = self.regs.wz;
        self.trace_interrupt(return_pc);
    }

    /// SP-1 <- PCh, SP-2 <- PCl, as done on NMI and INT entry.
    fn push_return_address(&mut self) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.tick(1);
        self.write_memory(self.regs.sp, (self.regs.pc >> 8) as u8);
        self.tick(3);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_memory(self.regs.sp, self.regs.pc as u8);
        self.tick(3);
    }

    /// Memory refresh: R's low 7 bits count, bit 7 is kept. One tick.
    fn refresh(&mut self) {
        let r = self.regs.r;
        self.regs.r = (r.wrapping_add(1) & 0x7F) | (r & 0x80);
        self.tick(1);
    }

    // =========================================================================
    // Bus and timing helpers for handlers
    // =========================================================================

    #[inline]
    pub(crate) fn tick(&mut self, count: u64) {
        self.ticks += count;
    }

    #[inline]
    pub(crate) fn read_memory(&mut self, address: u16) -> u8 {
        self.memory.read(address)
    }

    #[inline]
    pub(crate) fn write_memory(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }

    #[inline]
    pub(crate) fn read_port(&mut self, port: u16) -> u8 {
        self.ports.read_port(port)
    }

    #[inline]
    pub(crate) fn write_port(&mut self, port: u16, value: u8) {
        self.ports.write_port(port, value);
    }

    /// Read the byte at PC and advance PC. 3 ticks.
    pub(crate) fn fetch_operand(&mut self) -> u8 {
        let value = self.read_memory(self.regs.pc);
        self.tick(3);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// Read a little-endian word at PC. 6 ticks.
    pub(crate) fn fetch_operand_word(&mut self) -> u16 {
        let lo = self.fetch_operand();
        let hi = self.fetch_operand();
        u16::from_le_bytes([lo, hi])
    }

    /// Push a word, high byte first. 6 ticks; callers charge any lead-in tick.
    pub(crate) fn push_word(&mut self, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_memory(self.regs.sp, (value >> 8) as u8);
        self.tick(3);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_memory(self.regs.sp, value as u8);
        self.tick(3);
    }

    /// Pop a word, low byte first. 6 ticks.
    pub(crate) fn pop_word(&mut self) -> u16 {
        let lo = self.read_memory(self.regs.sp);
        self.tick(3);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read_memory(self.regs.sp);
        self.tick(3);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    /// Read a little-endian word from memory. 6 ticks.
    pub(crate) fn read_word(&mut self, address: u16) -> u16 {
        let lo = self.read_memory(address);
        self.tick(3);
        let hi = self.read_memory(address.wrapping_add(1));
        self.tick(3);
        u16::from_le_bytes([lo, hi])
    }

    /// Write a little-endian word to memory. 6 ticks.
    pub(crate) fn write_word(&mut self, address: u16, value: u16) {
        self.write_memory(address, value as u8);
        self.tick(3);
        self.write_memory(address.wrapping_add(1), (value >> 8) as u8);
        self.tick(3);
    }

    /// IX or IY, whichever the current index mode selects (IX if none).
    pub(crate) fn index_reg(&self) -> u16 {
        if self.index == IndexMode::Iy {
            self.regs.iy
        } else {
            self.regs.ix
        }
    }

    pub(crate) fn set_index_reg(&mut self, value: u16) {
        if self.index == IndexMode::Iy {
            self.regs.iy = value;
        } else {
            self.regs.ix = value;
        }
    }

    /// Condition code from opcode bits 5-3: NZ Z NC C PO PE P M.
    pub(crate) fn condition(&self, cc: u8) -> bool {
        let f = self.regs.f;
        match cc & 7 {
            0 => f & ZF == 0,
            1 => f & ZF != 0,
            2 => f & CF == 0,
            3 => f & CF != 0,
            4 => f & PF == 0,
            5 => f & PF != 0,
            6 => f & SF == 0,
            _ => f & SF != 0,
        }
    }

    #[inline]
    pub(crate) fn carry(&self) -> bool {
        self.regs.f & CF != 0
    }

    pub(crate) fn set_interrupt_enables(&mut self, enabled: bool) {
        self.iff1 = enabled;
        self.iff2 = enabled;
    }

    pub(crate) fn block_interrupt(&mut self) {
        self.interrupt_blocked = true;
    }

    pub(crate) fn enter_halt(&mut self) {
        self.signals.insert(Signals::HALTED);
        debug!("Z80 HALT at {:#06X}", self.regs.pc.wrapping_sub(1));
    }

    // =========================================================================
    // Trace hook
    // =========================================================================

    pub(crate) fn trace_stack_pointer(&mut self, operation: &'static str, old_sp: u16) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.stack_pointer(&StackPointerEvent {
                origin_pc: self.instruction_start,
                operation,
                old_sp,
                new_sp: self.regs.sp,
                ticks: self.ticks.get(),
            });
        }
    }

    pub(crate) fn trace_stack_content(
        &mut self,
        operation: &'static str,
        old_sp: u16,
        content: Option<u16>,
    ) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.stack_content(&StackContentEvent {
                origin_pc: self.instruction_start,
                operation,
                old_sp,
                content,
                ticks: self.ticks.get(),
            });
        }
    }

    fn trace_interrupt(&mut self, return_pc: u16) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.interrupt(&InterruptEvent {
                return_pc,
                mode: self.im,
                vector: self.regs.pc,
                ticks: self.ticks.get(),
            });
        }
    }

    fn trace_nmi(&mut self, return_pc: u16) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.nmi(&NmiEvent {
                return_pc,
                vector: self.regs.pc,
                ticks: self.ticks.get(),
            });
        }
    }

    pub(crate) fn trace_branch(&mut self, operation: &'static str) {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.branch(&BranchEvent {
                origin_pc: self.instruction_start,
                operation,
                target: self.regs.pc,
                ticks: self.ticks.get(),
            });
        }
    }

    // =========================================================================
    // Public accessors
    // =========================================================================

    #[must_use]
    pub fn ticks(&self) -> Ticks {
        self.ticks
    }

    pub fn set_ticks(&mut self, ticks: Ticks) {
        self.ticks = ticks;
    }

    /// Length of the call-like instruction at PC, or 0 if there is none.
    ///
    /// A debugger stepping over a call puts a breakpoint at PC plus this
    /// length. CALL and CALL cc count 3, RST and HALT 1, and the repeating
    /// block instructions 2.
    #[must_use]
    pub fn call_instruction_length(&mut self) -> u16 {
        let pc = self.regs.pc;
        match self.memory.read(pc) {
            0xCD => 3,
            op if op & 0xC7 == 0xC4 => 3,
            op if op & 0xC7 == 0xC7 => 1,
            0x76 => 1,
            0xED => match self.memory.read(pc.wrapping_add(1)) {
                0xB0..=0xB3 | 0xB8..=0xBB => 2,
                _ => 0,
            },
            _ => 0,
        }
    }

    /// Charge extra ticks, e.g. contention computed by the embedder.
    pub fn delay(&mut self, ticks: u64) {
        self.tick(ticks);
    }

    #[must_use]
    pub fn interrupt_mode(&self) -> u8 {
        self.im
    }

    pub fn set_interrupt_mode(&mut self, mode: u8) {
        self.im = mode.min(2);
    }

    #[must_use]
    pub fn iff1(&self) -> bool {
        self.iff1
    }

    #[must_use]
    pub fn iff2(&self) -> bool {
        self.iff2
    }

    pub fn set_iff1(&mut self, value: bool) {
        self.iff1 = value;
    }

    pub fn set_iff2(&mut self, value: bool) {
        self.iff2 = value;
    }

    /// True while INT acceptance is suppressed (after a prefix or EI).
    #[must_use]
    pub fn is_interrupt_blocked(&self) -> bool {
        self.interrupt_blocked
    }

    /// True between a prefix byte and the end of its instruction.
    #[must_use]
    pub fn is_in_op_execution(&self) -> bool {
        self.in_op_execution
    }

    #[must_use]
    pub fn prefix_mode(&self) -> PrefixMode {
        self.prefix
    }

    #[must_use]
    pub fn index_mode(&self) -> IndexMode {
        self.index
    }

    /// The last opcode byte handed to a handler.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    #[must_use]
    pub fn signals(&self) -> Signals {
        self.signals
    }

    /// Raise signals. They are sampled at the top of the next cycle.
    pub fn raise(&mut self, signals: Signals) {
        self.signals.insert(signals);
    }

    /// Drop signals, e.g. release the INT line.
    pub fn clear(&mut self, signals: Signals) {
        self.signals.remove(signals);
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn CpuTracer>) {
        self.tracer = Some(tracer);
    }

    pub fn take_tracer(&mut self) -> Option<Box<dyn CpuTracer>> {
        self.tracer.take()
    }

    #[must_use]
    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    #[must_use]
    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }

    /// Give back the devices.
    #[must_use]
    pub fn into_parts(self) -> (M, P) {
        (self.memory, self.ports)
    }
}

// =========================================================================
// Test utilities
// =========================================================================

#[cfg(feature = "test-utils")]
impl<M: Bus, P: IoBus> Z80<M, P> {
    pub fn set_prefix_mode(&mut self, prefix: PrefixMode) {
        self.prefix = prefix;
    }

    pub fn set_index_mode(&mut self, index: IndexMode) {
        self.index = index;
    }

    /// Replace the whole signal mask without side effects.
    pub fn set_signals_raw(&mut self, signals: Signals) {
        self.signals = signals;
    }
}

impl<M: Bus, P: IoBus> Cpu for Z80<M, P> {
    type Registers = Registers;

    fn execute_cycle(&mut self) {
        Z80::execute_cycle(self);
    }

    fn reset(&mut self) {
        Z80::reset(self);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn ticks(&self) -> Ticks {
        self.ticks
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.signals.contains(Signals::HALTED)
    }

    fn interrupt(&mut self) {
        self.raise(Signals::INT);
    }

    fn nmi(&mut self) {
        self.raise(Signals::NMI);
    }
}

/// All valid query paths for the Z80.
const Z80_QUERY_PATHS: &[&str] = &[
    "a", "f", "b", "c", "d", "e", "h", "l", "af", "bc", "de", "hl", "af'", "bc'", "de'", "hl'",
    "ix", "iy", "ixh", "ixl", "iyh", "iyl", "sp", "pc", "i", "r", "wz", "flags.s", "flags.z",
    "flags.y", "flags.h", "flags.x", "flags.pv", "flags.n", "flags.c", "iff1", "iff2", "im",
    "halted", "ticks", "opcode", "prefix", "index",
];

impl<M: Bus, P: IoBus> Observable for Z80<M, P> {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        let value = match path {
            "a" => r.a.into(),
            "f" => r.f.into(),
            "b" => r.b.into(),
            "c" => r.c.into(),
            "d" => r.d.into(),
            "e" => r.e.into(),
            "h" => r.h.into(),
            "l" => r.l.into(),
            "af" => r.af().into(),
            "bc" => r.bc().into(),
            "de" => r.de().into(),
            "hl" => r.hl().into(),
            "af'" => r.af_alt().into(),
            "bc'" => r.bc_alt().into(),
            "de'" => r.de_alt().into(),
            "hl'" => r.hl_alt().into(),
            "ix" => r.ix.into(),
            "iy" => r.iy.into(),
            "ixh" => ((r.ix >> 8) as u8).into(),
            "ixl" => (r.ix as u8).into(),
            "iyh" => ((r.iy >> 8) as u8).into(),
            "iyl" => (r.iy as u8).into(),
            "sp" => r.sp.into(),
            "pc" => r.pc.into(),
            "i" => r.i.into(),
            "r" => r.r.into(),
            "wz" => r.wz.into(),
            "flags.s" => (r.f & SF != 0).into(),
            "flags.z" => (r.f & ZF != 0).into(),
            "flags.y" => (r.f & YF != 0).into(),
            "flags.h" => (r.f & HF != 0).into(),
            "flags.x" => (r.f & XF != 0).into(),
            "flags.pv" => (r.f & PF != 0).into(),
            "flags.n" => (r.f & NF != 0).into(),
            "flags.c" => (r.f & CF != 0).into(),
            "iff1" => self.iff1.into(),
            "iff2" => self.iff2.into(),
            "im" => self.im.into(),
            "halted" => self.signals.contains(Signals::HALTED).into(),
            "ticks" => self.ticks.get().into(),
            "opcode" => self.opcode.into(),
            "prefix" => self.prefix.name().into(),
            "index" => self.index.name().into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
