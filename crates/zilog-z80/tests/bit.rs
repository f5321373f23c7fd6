//! CB-prefixed instruction tests.

mod common;

use common::{cpu_with_program, run_step_cases};
use zilog_z80::{CF, HF, PF, SF, ZF};

#[test]
fn single_step_cases() {
    run_step_cases(include_str!("data/bit.json"));
}

#[test]
fn bit_tests_each_position() {
    for bit in 0..8u8 {
        let opcode = 0x40 | (bit << 3); // BIT n,B
        let mut cpu = cpu_with_program(&[0xCB, opcode, 0xCB, opcode]);

        cpu.regs.b = 1 << bit;
        cpu.regs.f = CF;
        assert_eq!(cpu.step(), 8);
        let sign = if bit == 7 { SF } else { 0 };
        assert_eq!(cpu.regs.f & (SF | ZF | PF | HF | CF), sign | HF | CF, "bit {bit} set");

        cpu.regs.b = !(1 << bit);
        cpu.step();
        assert_eq!(cpu.regs.f & (SF | ZF | PF | HF), ZF | PF | HF, "bit {bit} clear");
    }
}

#[test]
fn res_and_set_leave_flags_alone() {
    // SET 3,A ; RES 3,A
    let mut cpu = cpu_with_program(&[0xCB, 0xDF, 0xCB, 0x9F]);
    cpu.regs.f = 0xA5;
    cpu.step();
    assert_eq!(cpu.regs.a, 0x08);
    cpu.step();
    assert_eq!(cpu.regs.a, 0x00);
    assert_eq!(cpu.regs.f, 0xA5);
}

#[test]
fn rotates_through_carry_round_trip() {
    // RL C nine times brings the value back
    let program = [0xCB, 0x11].repeat(9);
    let mut cpu = cpu_with_program(&program);
    cpu.regs.c = 0b1011_0010;
    for _ in 0..9 {
        assert_eq!(cpu.step(), 8);
    }
    assert_eq!(cpu.regs.c, 0b1011_0010);
    assert_eq!(cpu.regs.f & CF, 0);
}
