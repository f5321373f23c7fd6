//! CB-prefixed instructions: rotates, shifts, BIT, RES and SET.

use emu_core::{Bus, IoBus};

use crate::alu;
use crate::flags::{CF, HF, PF, SF, XY, ZF};

use super::Z80;
use super::dispatch::{OpFn, empty_table};

impl<M: Bus, P: IoBus> Z80<M, P> {
    pub(super) fn bit_table() -> [OpFn<M, P>; 256] {
        let mut t = empty_table::<M, P>();
        for op in 0..256usize {
            let memory = op & 7 == 6;
            t[op] = match (op >> 6, memory) {
                (0, false) => Self::shift_r as OpFn<M, P>,
                (0, true) => Self::shift_hli,
                (1, false) => Self::bit_r,
                (1, true) => Self::bit_hli,
                (_, false) => Self::res_set_r,
                (_, true) => Self::res_set_hli,
            };
        }
        t
    }

    /// Flags for BIT. `xy` supplies bits 3 and 5, which come from a
    /// different place for each addressing mode.
    pub(super) fn bit_test(&mut self, value: u8, xy: u8) {
        let bit = (self.opcode >> 3) & 7;
        let set = value & (1 << bit) != 0;
        let mut f = HF | (self.regs.f & CF) | (xy & XY);
        if !set {
            f |= ZF | PF;
        }
        if bit == 7 && set {
            f |= SF;
        }
        self.regs.f = f;
    }

    /// RES or SET on `value`, selected by opcode bit 6.
    pub(super) fn res_set(&self, value: u8) -> u8 {
        let mask = 1 << ((self.opcode >> 3) & 7);
        if self.opcode & 0x40 == 0 {
            value & !mask
        } else {
            value | mask
        }
    }

    /// RLC/RRC/RL/RR/SLA/SRA/SLL/SRL on `value`, updating F.
    pub(super) fn shift(&mut self, value: u8) -> u8 {
        let result = alu::shift_op((self.opcode >> 3) & 7, value, self.carry());
        self.regs.f = result.flags;
        result.value
    }

    // rot r (8)
    fn shift_r(&mut self) {
        let r = self.opcode & 7;
        let value = self.shift(self.regs.reg8(r));
        self.regs.set_reg8(r, value);
    }

    // rot (HL) (15)
    fn shift_hli(&mut self) {
        let address = self.regs.hl();
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.shift(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }

    // BIT b,r (8)
    fn bit_r(&mut self) {
        let value = self.regs.reg8(self.opcode & 7);
        self.bit_test(value, value);
    }

    // BIT b,(HL) (12)
    fn bit_hli(&mut self) {
        let value = self.read_memory(self.regs.hl());
        self.tick(3);
        self.tick(1);
        self.bit_test(value, (self.regs.wz >> 8) as u8);
    }

    // RES/SET b,r (8)
    fn res_set_r(&mut self) {
        let r = self.opcode & 7;
        let value = self.res_set(self.regs.reg8(r));
        self.regs.set_reg8(r, value);
    }

    // RES/SET b,(HL) (15)
    fn res_set_hli(&mut self) {
        let address = self.regs.hl();
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.res_set(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }
}
