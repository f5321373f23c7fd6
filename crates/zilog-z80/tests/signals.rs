//! Interrupt, NMI, HALT and reset behavior.

mod common;

use common::{TestCpu, cpu_with_program};
use emu_core::Cpu;
use zilog_z80::{PrefixMode, Signals};

/// NOPs from 0x0000 with SP at 0x8000 and interrupts enabled.
fn interruptible_cpu() -> TestCpu {
    let mut cpu = cpu_with_program(&[0x00; 16]);
    cpu.regs.sp = 0x8000;
    cpu.set_iff1(true);
    cpu.set_iff2(true);
    cpu
}

#[test]
fn int_in_mode_one_calls_0038() {
    let mut cpu = interruptible_cpu();
    cpu.set_interrupt_mode(1);
    cpu.step();
    cpu.raise(Signals::INT);

    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(cpu.regs.wz, 0x0038);
    assert_eq!(cpu.regs.sp, 0x7FFE);
    // High byte first, at SP-1
    assert_eq!(cpu.memory().peek(0x7FFF), 0x00);
    assert_eq!(cpu.memory().peek(0x7FFE), 0x01);
    assert!(!cpu.iff1());
    assert!(!cpu.iff2());
}

#[test]
fn int_in_mode_zero_behaves_like_mode_one() {
    let mut cpu = interruptible_cpu();
    cpu.raise(Signals::INT);
    cpu.step();
    assert_eq!(cpu.regs.pc, 0x0038);
}

#[test]
fn int_in_mode_two_reads_vector_table() {
    let mut cpu = interruptible_cpu();
    cpu.set_interrupt_mode(2);
    cpu.regs.i = 0x80;
    cpu.memory_mut().load(0x8000, &[0x34, 0x12]);
    cpu.regs.sp = 0x9000;
    cpu.raise(Signals::INT);

    assert_eq!(cpu.step(), 26);
    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.wz, 0x1234);
    assert_eq!(cpu.memory().peek_word(0x8FFE), 0x0000);
}

#[test]
fn int_in_mode_two_adds_table_entry_to_latch() {
    // JP 0x0100 leaves 0x0100 in WZ.
    let mut cpu = cpu_with_program(&[0xC3, 0x00, 0x01]);
    cpu.step();
    assert_eq!(cpu.regs.wz, 0x0100);

    cpu.set_iff1(true);
    cpu.set_interrupt_mode(2);
    cpu.regs.i = 0x80;
    cpu.memory_mut().load(0x8000, &[0x34, 0x12]);
    cpu.regs.sp = 0x9000;
    cpu.raise(Signals::INT);

    assert_eq!(cpu.step(), 26);
    assert_eq!(cpu.regs.pc, 0x1334);
    assert_eq!(cpu.regs.wz, 0x1334);
    assert_eq!(cpu.memory().peek_word(0x8FFE), 0x0100);
}

#[test]
fn int_is_ignored_while_disabled() {
    let mut cpu = interruptible_cpu();
    cpu.set_iff1(false);
    cpu.raise(Signals::INT);
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.regs.pc, 0x0001);
}

#[test]
fn int_stays_raised_until_cleared() {
    let mut cpu = interruptible_cpu();
    cpu.raise(Signals::INT);
    cpu.step();
    assert!(cpu.signals().contains(Signals::INT));

    // Interrupts are now disabled, so the handler runs undisturbed.
    cpu.step();
    assert_eq!(cpu.regs.pc, 0x0039);

    cpu.clear(Signals::INT);
    assert!(!cpu.signals().contains(Signals::INT));
}

#[test]
fn ei_defers_int_by_one_instruction() {
    // EI ; NOP ; NOP
    let mut cpu = cpu_with_program(&[0xFB, 0x00, 0x00]);
    cpu.regs.sp = 0x8000;
    cpu.raise(Signals::INT);

    cpu.step();
    assert!(cpu.iff1());
    assert!(cpu.is_interrupt_blocked());

    // The instruction after EI still runs.
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.regs.pc, 0x0002);

    cpu.step();
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(cpu.memory().peek_word(0x7FFE), 0x0002);
}

#[test]
fn prefix_blocks_int_until_instruction_ends() {
    // LD IX,0x1234
    let mut cpu = cpu_with_program(&[0xDD, 0x21, 0x34, 0x12]);
    cpu.regs.sp = 0x8000;
    cpu.set_iff1(true);

    cpu.execute_cycle();
    cpu.raise(Signals::INT);
    cpu.execute_cycle();
    assert_eq!(cpu.regs.ix, 0x1234);
    assert_eq!(cpu.regs.pc, 0x0004);

    cpu.execute_cycle();
    assert_eq!(cpu.regs.pc, 0x0038);
}

#[test]
fn int_wakes_halted_cpu_past_halt() {
    let mut cpu = cpu_with_program(&[0x76]);
    cpu.regs.sp = 0x8000;
    cpu.set_iff1(true);
    cpu.step();
    cpu.step();
    assert!(cpu.is_halted());

    cpu.raise(Signals::INT);
    cpu.step();
    assert!(!cpu.is_halted());
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(cpu.memory().peek_word(0x7FFE), 0x0001);
}

#[test]
fn nmi_calls_0066_and_keeps_iff2() {
    let mut cpu = interruptible_cpu();
    cpu.nmi();

    assert_eq!(cpu.step(), 7);
    assert_eq!(cpu.regs.pc, 0x0066);
    assert!(!cpu.iff1());
    assert!(cpu.iff2());
    assert!(!cpu.signals().contains(Signals::NMI));
    assert_eq!(cpu.memory().peek_word(0x7FFE), 0x0000);
}

#[test]
fn retn_after_nmi_restores_interrupts() {
    let mut program = vec![0u8; 0x68];
    program[0x66] = 0xED;
    program[0x67] = 0x45;
    let mut cpu = cpu_with_program(&program);
    cpu.regs.sp = 0x8000;
    cpu.set_iff1(true);
    cpu.set_iff2(true);
    cpu.step();

    cpu.raise(Signals::NMI);
    cpu.step();
    assert!(!cpu.iff1());
    cpu.step();
    assert!(cpu.iff1());
    assert_eq!(cpu.regs.pc, 0x0001);
    assert_eq!(cpu.regs.sp, 0x8000);
}

#[test]
fn int_is_serviced_before_nmi() {
    let mut cpu = interruptible_cpu();
    cpu.raise(Signals::INT | Signals::NMI);

    cpu.step();
    assert_eq!(cpu.regs.pc, 0x0038);
    cpu.step();
    assert_eq!(cpu.regs.pc, 0x0066);
}

#[test]
fn reset_clears_control_state() {
    let mut cpu = interruptible_cpu();
    cpu.set_interrupt_mode(2);
    cpu.regs.pc = 0x1234;
    cpu.regs.i = 0x55;
    cpu.regs.r = 0x66;
    cpu.regs.a = 0x77;
    cpu.raise(Signals::INT | Signals::HALTED);

    cpu.reset();

    assert_eq!(cpu.regs.pc, 0x0000);
    assert_eq!(cpu.regs.i, 0x00);
    assert_eq!(cpu.regs.r, 0x00);
    assert_eq!(cpu.regs.a, 0x77);
    assert_eq!(cpu.interrupt_mode(), 0);
    assert!(!cpu.iff1());
    assert!(!cpu.iff2());
    assert!(cpu.signals().is_empty());
    assert_eq!(cpu.prefix_mode(), PrefixMode::None);
}

#[test]
fn reset_signal_is_serviced_by_cycle() {
    let mut cpu = interruptible_cpu();
    cpu.step();
    let ticks = cpu.ticks();
    cpu.raise(Signals::RESET);
    cpu.execute_cycle();

    assert_eq!(cpu.regs.pc, 0x0000);
    assert!(!cpu.iff1());
    assert!(cpu.signals().is_empty());
    assert_eq!(cpu.ticks(), ticks);
}

#[test]
fn halted_cycles_refresh_memory() {
    let mut cpu = cpu_with_program(&[0x00]);
    cpu.set_signals_raw(Signals::HALTED);
    cpu.regs.r = 0x80;

    cpu.execute_cycle();
    cpu.execute_cycle();
    assert_eq!(cpu.ticks().get(), 8);
    assert_eq!(cpu.regs.r, 0x82);
    assert_eq!(cpu.regs.pc, 0x0000);
}

#[test]
fn ticks_only_increase() {
    let mut cpu = interruptible_cpu();
    let mut last = cpu.ticks();
    for _ in 0..8 {
        cpu.execute_cycle();
        assert!(cpu.ticks() > last);
        last = cpu.ticks();
    }
}
