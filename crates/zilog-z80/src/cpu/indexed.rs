//! DD/FD-prefixed instructions.
//!
//! The table starts as a copy of the unprefixed one: opcodes that do not
//! touch HL run their plain handler after the 4-tick prefix fetch. The rest
//! substitute IX or IY (and their halves) for HL, and `(HL)` becomes
//! `(IX+d)`. Totals in the comments include both fetches.

use emu_core::{Bus, IoBus};

use crate::alu;
use crate::flags::SZP;
use crate::signals::IndexMode;

use super::Z80;
use super::dispatch::OpFn;

impl<M: Bus, P: IoBus> Z80<M, P> {
    pub(super) fn indexed_table(standard: &[OpFn<M, P>; 256]) -> [OpFn<M, P>; 256] {
        let mut t = *standard;

        for rr in 0..4usize {
            t[(rr << 4) | 0x09] = Self::add_ix_rr;
        }
        t[0x21] = Self::ld_ix_nn;
        t[0x22] = Self::ld_nni_ix;
        t[0x2A] = Self::ld_ix_nni;
        t[0x23] = Self::inc_ix;
        t[0x2B] = Self::dec_ix;
        t[0x24] = Self::inc_ixhl;
        t[0x2C] = Self::inc_ixhl;
        t[0x25] = Self::dec_ixhl;
        t[0x2D] = Self::dec_ixhl;
        t[0x26] = Self::ld_ixhl_n;
        t[0x2E] = Self::ld_ixhl_n;
        t[0x34] = Self::inc_ixi;
        t[0x35] = Self::dec_ixi;
        t[0x36] = Self::ld_ixi_n;

        for dst in 0..8usize {
            for src in 0..8usize {
                let op = 0x40 | (dst << 3) | src;
                let uses_half = matches!(dst, 4 | 5) || matches!(src, 4 | 5);
                match (dst, src) {
                    (6, 6) => {}
                    (_, 6) => t[op] = Self::ld_r_ixi,
                    (6, _) => t[op] = Self::ld_ixi_r,
                    _ if uses_half => t[op] = Self::ld_ixhl_r,
                    _ => {}
                }
            }
        }

        for op in 0x80..0xC0usize {
            match op & 7 {
                4 | 5 => t[op] = Self::alu_a_ixhl,
                6 => t[op] = Self::alu_a_ixi,
                _ => {}
            }
        }

        t[0xE1] = Self::pop_ix;
        t[0xE3] = Self::ex_spi_ix;
        t[0xE5] = Self::push_ix;
        t[0xE9] = Self::jp_ix;
        t[0xF9] = Self::ld_sp_ix;

        t
    }

    // =========================================================================
    // Addressing helpers
    // =========================================================================

    /// Register by 3-bit encoding, with 4 and 5 meaning the index halves.
    fn indexed_reg8(&self, r: u8) -> u8 {
        match r & 7 {
            4 => (self.index_reg() >> 8) as u8,
            5 => self.index_reg() as u8,
            _ => self.regs.reg8(r),
        }
    }

    fn set_indexed_reg8(&mut self, r: u8, value: u8) {
        let ix = self.index_reg();
        match r & 7 {
            4 => self.set_index_reg((ix & 0x00FF) | (u16::from(value) << 8)),
            5 => self.set_index_reg((ix & 0xFF00) | u16::from(value)),
            _ => self.regs.set_reg8(r, value),
        }
    }

    /// Read the displacement and form IX+d / IY+d. 3 ticks. WZ takes the
    /// effective address.
    fn displacement_address(&mut self) -> u16 {
        let d = self.fetch_operand() as i8;
        let address = self.index_reg().wrapping_add_signed(i16::from(d));
        self.regs.wz = address;
        address
    }

    fn index_name(&self, ix: &'static str, iy: &'static str) -> &'static str {
        if self.index == IndexMode::Iy { iy } else { ix }
    }

    // =========================================================================
    // 16-bit index arithmetic and loads
    // =========================================================================

    // ADD IX,rr (15). Pair 2 is IX itself.
    fn add_ix_rr(&mut self) {
        let ix = self.index_reg();
        let rr = match (self.opcode >> 4) & 3 {
            2 => ix,
            n => self.regs.reg16(n),
        };
        self.regs.wz = ix.wrapping_add(1);
        let (result, flags) = alu::add16(ix, rr);
        self.set_index_reg(result);
        self.regs.f = (self.regs.f & SZP) | flags;
        self.tick(7);
    }

    // LD IX,nn (14)
    fn ld_ix_nn(&mut self) {
        let value = self.fetch_operand_word();
        self.set_index_reg(value);
    }

    // LD (nn),IX (20)
    fn ld_nni_ix(&mut self) {
        let address = self.fetch_operand_word();
        self.write_word(address, self.index_reg());
        self.regs.wz = address.wrapping_add(1);
    }

    // LD IX,(nn) (20)
    fn ld_ix_nni(&mut self) {
        let address = self.fetch_operand_word();
        let value = self.read_word(address);
        self.set_index_reg(value);
        self.regs.wz = address.wrapping_add(1);
    }

    // INC IX (10)
    fn inc_ix(&mut self) {
        self.tick(2);
        self.set_index_reg(self.index_reg().wrapping_add(1));
    }

    // DEC IX (10)
    fn dec_ix(&mut self) {
        self.tick(2);
        self.set_index_reg(self.index_reg().wrapping_sub(1));
    }

    // LD SP,IX (10)
    fn ld_sp_ix(&mut self) {
        let old_sp = self.regs.sp;
        self.tick(2);
        self.regs.sp = self.index_reg();
        let operation = self.index_name("ld sp,ix", "ld sp,iy");
        self.trace_stack_pointer(operation, old_sp);
    }

    // =========================================================================
    // Index register halves
    // =========================================================================

    // INC IXH/IXL (8)
    fn inc_ixhl(&mut self) {
        let r = (self.opcode >> 3) & 7;
        let value = self.inc8(self.indexed_reg8(r));
        self.set_indexed_reg8(r, value);
    }

    // DEC IXH/IXL (8)
    fn dec_ixhl(&mut self) {
        let r = (self.opcode >> 3) & 7;
        let value = self.dec8(self.indexed_reg8(r));
        self.set_indexed_reg8(r, value);
    }

    // LD IXH/IXL,n (11)
    fn ld_ixhl_n(&mut self) {
        let value = self.fetch_operand();
        self.set_indexed_reg8((self.opcode >> 3) & 7, value);
    }

    // LD r,IXH / LD IXH,r / LD IXH,IXL ... (8)
    fn ld_ixhl_r(&mut self) {
        let value = self.indexed_reg8(self.opcode & 7);
        self.set_indexed_reg8((self.opcode >> 3) & 7, value);
    }

    // ALU A,IXH/IXL (8)
    fn alu_a_ixhl(&mut self) {
        let value = self.indexed_reg8(self.opcode & 7);
        self.alu_a(value);
    }

    // =========================================================================
    // (IX+d) addressing
    // =========================================================================

    // INC (IX+d) (23)
    fn inc_ixi(&mut self) {
        let address = self.displacement_address();
        self.tick(5);
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.inc8(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }

    // DEC (IX+d) (23)
    fn dec_ixi(&mut self) {
        let address = self.displacement_address();
        self.tick(5);
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.dec8(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }

    // LD (IX+d),n (19)
    fn ld_ixi_n(&mut self) {
        let address = self.displacement_address();
        let value = self.fetch_operand();
        self.tick(2);
        self.write_memory(address, value);
        self.tick(3);
    }

    // LD r,(IX+d) (19). H and L here are the real registers.
    fn ld_r_ixi(&mut self) {
        let address = self.displacement_address();
        self.tick(5);
        let value = self.read_memory(address);
        self.tick(3);
        self.regs.set_reg8((self.opcode >> 3) & 7, value);
    }

    // LD (IX+d),r (19). H and L here are the real registers.
    fn ld_ixi_r(&mut self) {
        let address = self.displacement_address();
        self.tick(5);
        let value = self.regs.reg8(self.opcode & 7);
        self.write_memory(address, value);
        self.tick(3);
    }

    // ALU A,(IX+d) (19)
    fn alu_a_ixi(&mut self) {
        let address = self.displacement_address();
        self.tick(5);
        let value = self.read_memory(address);
        self.tick(3);
        self.alu_a(value);
    }

    // =========================================================================
    // Stack and jumps
    // =========================================================================

    // POP IX (14)
    fn pop_ix(&mut self) {
        let old_sp = self.regs.sp;
        let value = self.pop_word();
        self.set_index_reg(value);
        self.trace_stack_content("pop", old_sp, Some(value));
    }

    // PUSH IX (15)
    fn push_ix(&mut self) {
        let value = self.index_reg();
        let old_sp = self.regs.sp;
        self.tick(1);
        self.push_word(value);
        self.trace_stack_content("push", old_sp, Some(value));
    }

    // EX (SP),IX (23)
    fn ex_spi_ix(&mut self) {
        let old_sp = self.regs.sp;
        let ix = self.index_reg();
        let top = self.exchange_stack_top(ix);
        self.set_index_reg(top);
        let operation = self.index_name("ex (sp),ix", "ex (sp),iy");
        self.trace_stack_content(operation, old_sp, Some(ix));
    }

    // JP (IX) (8)
    fn jp_ix(&mut self) {
        self.regs.pc = self.index_reg();
        let operation = self.index_name("jp (ix)", "jp (iy)");
        self.trace_branch(operation);
    }
}
