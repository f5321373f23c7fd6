//! DD CB d op / FD CB d op instructions.
//!
//! By the time a handler runs, 16 ticks are charged: both prefixes, the
//! displacement, one internal tick and the final opcode read. WZ already
//! holds the effective address.
//!
//! Rotates, shifts, RES and SET write the result back to memory and, unless
//! the register field is 6, also copy it into that register.

use emu_core::{Bus, IoBus};

use super::Z80;
use super::dispatch::IndexedBitFn;

impl<M: Bus, P: IoBus> Z80<M, P> {
    pub(super) fn indexed_bit_table() -> [IndexedBitFn<M, P>; 256] {
        let mut t = [Self::shift_ixi as IndexedBitFn<M, P>; 256];
        for op in 0x40..0x80usize {
            t[op] = Self::bit_ixi;
        }
        for op in 0x80..0x100usize {
            t[op] = Self::res_set_ixi;
        }
        t
    }

    fn copy_to_register(&mut self, value: u8) {
        let q = self.opcode & 7;
        if q != 6 {
            self.regs.set_reg8(q, value);
        }
    }

    // rot (IX+d) / rot (IX+d),r (23)
    fn shift_ixi(&mut self, address: u16) {
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.shift(value);
        self.copy_to_register(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }

    // BIT b,(IX+d) (20). Bits 3 and 5 come from the address high byte.
    fn bit_ixi(&mut self, address: u16) {
        let value = self.read_memory(address);
        self.tick(4);
        self.bit_test(value, (address >> 8) as u8);
    }

    // RES/SET b,(IX+d) / RES/SET b,(IX+d),r (23)
    fn res_set_ixi(&mut self, address: u16) {
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.res_set(value);
        self.copy_to_register(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }
}
