//! ED-prefixed instructions.
//!
//! Totals in the comments include both fetches (8 ticks). Slots without a
//! handler cost just those 8 ticks.

use emu_core::{Bus, IoBus};

use crate::alu::{self, DEC_FLAGS, LOGIC_FLAGS};
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, sz53};

use super::Z80;
use super::dispatch::{OpFn, empty_table};

impl<M: Bus, P: IoBus> Z80<M, P> {
    pub(super) fn extended_table() -> [OpFn<M, P>; 256] {
        let mut t = empty_table::<M, P>();

        for r in 0..8usize {
            let base = 0x40 | (r << 3);
            t[base] = Self::in_r_c;
            t[base | 1] = Self::out_c_r;
            t[base | 4] = Self::neg;
            t[base | 5] = Self::retn;
            t[base | 6] = Self::im_n;
        }
        for rr in 0..4usize {
            let base = 0x40 | (rr << 4);
            t[base | 0x02] = Self::sbc_hl_rr;
            t[base | 0x0A] = Self::adc_hl_rr;
            t[base | 0x03] = Self::ld_nni_rr;
            t[base | 0x0B] = Self::ld_rr_nni;
        }
        t[0x4D] = Self::reti;
        t[0x47] = Self::ld_i_a;
        t[0x4F] = Self::ld_r_a;
        t[0x57] = Self::ld_a_i;
        t[0x5F] = Self::ld_a_r;
        t[0x67] = Self::rrd;
        t[0x6F] = Self::rld;

        t[0xA0] = Self::ldi;
        t[0xA8] = Self::ldd;
        t[0xB0] = Self::ldir;
        t[0xB8] = Self::lddr;
        t[0xA1] = Self::cpi;
        t[0xA9] = Self::cpd;
        t[0xB1] = Self::cpir;
        t[0xB9] = Self::cpdr;
        t[0xA2] = Self::ini;
        t[0xAA] = Self::ind;
        t[0xB2] = Self::inir;
        t[0xBA] = Self::indr;
        t[0xA3] = Self::outi;
        t[0xAB] = Self::outd;
        t[0xB3] = Self::otir;
        t[0xBB] = Self::otdr;

        t
    }

    // =========================================================================
    // I/O through C
    // =========================================================================

    // IN r,(C) (12). Register 6 is IN F,(C): flags only.
    fn in_r_c(&mut self) {
        let port = self.regs.bc();
        self.regs.wz = port.wrapping_add(1);
        let value = self.read_port(port);
        self.tick(4);
        self.regs.f = LOGIC_FLAGS[value as usize] | (self.regs.f & CF);
        let r = (self.opcode >> 3) & 7;
        if r != 6 {
            self.regs.set_reg8(r, value);
        }
    }

    // OUT (C),r (12). Register 6 is OUT (C),0.
    fn out_c_r(&mut self) {
        let r = (self.opcode >> 3) & 7;
        let value = if r == 6 { 0 } else { self.regs.reg8(r) };
        let port = self.regs.bc();
        self.regs.wz = port.wrapping_add(1);
        self.tick(3);
        self.write_port(port, value);
        self.tick(1);
    }

    // =========================================================================
    // 16-bit arithmetic
    // =========================================================================

    // SBC HL,rr (15)
    fn sbc_hl_rr(&mut self) {
        let hl = self.regs.hl();
        let rr = self.regs.reg16((self.opcode >> 4) & 3);
        self.regs.wz = hl.wrapping_add(1);
        let (result, flags) = alu::sbc16(hl, rr, self.carry());
        self.regs.set_hl(result);
        self.regs.f = flags;
        self.tick(7);
    }

    // ADC HL,rr (15)
    fn adc_hl_rr(&mut self) {
        let hl = self.regs.hl();
        let rr = self.regs.reg16((self.opcode >> 4) & 3);
        self.regs.wz = hl.wrapping_add(1);
        let (result, flags) = alu::adc16(hl, rr, self.carry());
        self.regs.set_hl(result);
        self.regs.f = flags;
        self.tick(7);
    }

    // =========================================================================
    // 16-bit loads
    // =========================================================================

    // LD (nn),rr (20)
    fn ld_nni_rr(&mut self) {
        let address = self.fetch_operand_word();
        let value = self.regs.reg16((self.opcode >> 4) & 3);
        self.write_word(address, value);
        self.regs.wz = address.wrapping_add(1);
    }

    // LD rr,(nn) (20)
    fn ld_rr_nni(&mut self) {
        let rr = (self.opcode >> 4) & 3;
        let old_sp = self.regs.sp;
        let address = self.fetch_operand_word();
        let value = self.read_word(address);
        self.regs.set_reg16(rr, value);
        self.regs.wz = address.wrapping_add(1);
        if rr == 3 {
            self.trace_stack_pointer("ld sp,(nn)", old_sp);
        }
    }

    // =========================================================================
    // Accumulator and interrupt control
    // =========================================================================

    // NEG (8)
    fn neg(&mut self) {
        let result = alu::sub8(0, self.regs.a, false);
        self.regs.a = result.value;
        self.regs.f = result.flags;
    }

    // RETN (14)
    fn retn(&mut self) {
        self.iff1 = self.iff2;
        self.return_from("retn");
    }

    // RETI (14)
    fn reti(&mut self) {
        self.iff1 = self.iff2;
        self.return_from("reti");
    }

    // IM 0/1/2 (8)
    fn im_n(&mut self) {
        // Bits 4-3: 0 and 1 select IM 0, 2 selects IM 1, 3 selects IM 2.
        let mode = (self.opcode & 0x18) >> 3;
        self.im = mode.max(1) - 1;
    }

    // LD I,A (9)
    fn ld_i_a(&mut self) {
        self.tick(1);
        self.regs.i = self.regs.a;
    }

    // LD R,A (9)
    fn ld_r_a(&mut self) {
        self.tick(1);
        self.regs.r = self.regs.a;
    }

    fn set_ir_load_flags(&mut self) {
        let pv = if self.iff2 { PF } else { 0 };
        self.regs.f = sz53(self.regs.a) | pv | (self.regs.f & CF);
    }

    // LD A,I (9)
    fn ld_a_i(&mut self) {
        self.tick(1);
        self.regs.a = self.regs.i;
        self.set_ir_load_flags();
    }

    // LD A,R (9)
    fn ld_a_r(&mut self) {
        self.tick(1);
        self.regs.a = self.regs.r;
        self.set_ir_load_flags();
    }

    // =========================================================================
    // Decimal rotates
    // =========================================================================

    // RRD (18)
    fn rrd(&mut self) {
        let address = self.regs.hl();
        let value = self.read_memory(address);
        self.tick(3);
        self.regs.wz = address.wrapping_add(1);
        let a = self.regs.a;
        self.write_memory(address, (a << 4) | (value >> 4));
        self.regs.a = (a & 0xF0) | (value & 0x0F);
        self.tick(3);
        self.tick(4);
        self.regs.f = LOGIC_FLAGS[self.regs.a as usize] | (self.regs.f & CF);
    }

    // RLD (18)
    fn rld(&mut self) {
        let address = self.regs.hl();
        let value = self.read_memory(address);
        self.tick(3);
        self.regs.wz = address.wrapping_add(1);
        let a = self.regs.a;
        self.write_memory(address, (value << 4) | (a & 0x0F));
        self.regs.a = (a & 0xF0) | (value >> 4);
        self.tick(3);
        self.tick(4);
        self.regs.f = LOGIC_FLAGS[self.regs.a as usize] | (self.regs.f & CF);
    }

    // =========================================================================
    // Block transfer
    // =========================================================================

    /// Rewind onto the current instruction so the next cycle repeats it.
    fn repeat_block(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.wz = self.regs.pc.wrapping_add(1);
        self.tick(5);
    }

    /// One LDI/LDD step. 8 ticks after the fetches.
    fn block_load(&mut self, step: u16) {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = self.read_memory(hl);
        self.tick(3);
        self.write_memory(de, value);
        self.tick(5);
        self.regs.set_hl(hl.wrapping_add(step));
        self.regs.set_de(de.wrapping_add(step));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        // Bits 3 and 5 come from bits 3 and 1 of A + value.
        let n = value.wrapping_add(self.regs.a);
        let mut f = (self.regs.f & (SF | ZF | CF)) | (n & XF) | ((n << 4) & YF);
        if bc != 0 {
            f |= PF;
        }
        self.regs.f = f;
    }

    // LDI (16)
    fn ldi(&mut self) {
        self.block_load(1);
    }

    // LDD (16)
    fn ldd(&mut self) {
        self.block_load(0xFFFF);
    }

    // LDIR (21/16)
    fn ldir(&mut self) {
        self.block_load(1);
        if self.regs.bc() != 0 {
            self.repeat_block();
        }
    }

    // LDDR (21/16)
    fn lddr(&mut self) {
        self.block_load(0xFFFF);
        if self.regs.bc() != 0 {
            self.repeat_block();
        }
    }

    // =========================================================================
    // Block compare
    // =========================================================================

    /// One CPI/CPD step. 8 ticks after the fetches.
    fn block_compare(&mut self, step: u16) {
        let hl = self.regs.hl();
        let value = self.read_memory(hl);
        self.tick(3);
        self.tick(5);
        self.regs.set_hl(hl.wrapping_add(step));
        self.regs.wz = self.regs.wz.wrapping_add(step);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let a = self.regs.a;
        let result = a.wrapping_sub(value);
        let half = (a ^ value ^ result) & HF;
        // Bits 3 and 5 come from bits 3 and 1 of the result less H.
        let n = result.wrapping_sub(u8::from(half != 0));
        let mut f = (self.regs.f & CF) | NF | (result & SF) | half | (n & XF) | ((n << 4) & YF);
        if result == 0 {
            f |= ZF;
        }
        if bc != 0 {
            f |= PF;
        }
        self.regs.f = f;
    }

    fn should_repeat_compare(&self) -> bool {
        self.regs.bc() != 0 && self.regs.f & ZF == 0
    }

    // CPI (16)
    fn cpi(&mut self) {
        self.block_compare(1);
    }

    // CPD (16)
    fn cpd(&mut self) {
        self.block_compare(0xFFFF);
    }

    // CPIR (21/16)
    fn cpir(&mut self) {
        self.block_compare(1);
        if self.should_repeat_compare() {
            self.repeat_block();
        }
    }

    // CPDR (21/16)
    fn cpdr(&mut self) {
        self.block_compare(0xFFFF);
        if self.should_repeat_compare() {
            self.repeat_block();
        }
    }

    // =========================================================================
    // Block input
    // =========================================================================

    /// One INI/IND step. 8 ticks after the fetches.
    fn block_in(&mut self, step: u16) {
        let port = self.regs.bc();
        self.regs.wz = port.wrapping_add(step);
        self.tick(1);
        let value = self.read_port(port);
        let hl = self.regs.hl();
        self.write_memory(hl, value);
        self.tick(3);
        self.regs.set_hl(hl.wrapping_add(step));
        self.regs.f = DEC_FLAGS[self.regs.b as usize] | (self.regs.f & CF);
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.tick(4);
    }

    /// Repeat tail shared by INIR/INDR/OTIR/OTDR: P/V reports "still going".
    fn repeat_io_block(&mut self) {
        if self.regs.b != 0 {
            self.regs.f |= PF;
            self.repeat_block();
        } else {
            self.regs.f &= !PF;
        }
    }

    // INI (16)
    fn ini(&mut self) {
        self.block_in(1);
    }

    // IND (16)
    fn ind(&mut self) {
        self.block_in(0xFFFF);
    }

    // INIR (21/16)
    fn inir(&mut self) {
        self.block_in(1);
        self.repeat_io_block();
    }

    // INDR (21/16)
    fn indr(&mut self) {
        self.block_in(0xFFFF);
        self.repeat_io_block();
    }

    // =========================================================================
    // Block output
    // =========================================================================

    /// One OUTI/OUTD step. B is decremented before the port address is
    /// formed. 8 ticks after the fetches.
    fn block_out(&mut self, step: u16) {
        self.regs.f = DEC_FLAGS[self.regs.b as usize];
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.tick(1);
        let hl = self.regs.hl();
        let value = self.read_memory(hl);
        self.tick(3);
        self.regs.set_hl(hl.wrapping_add(step));
        let port = self.regs.bc();
        self.write_port(port, value);
        self.tick(4);
        self.regs.wz = port.wrapping_add(step);

        let wrapped = if step == 1 {
            self.regs.l == 0x00
        } else {
            self.regs.l == 0xFF
        };
        if wrapped {
            self.regs.f |= CF;
        }
    }

    // OUTI (16)
    fn outi(&mut self) {
        self.block_out(1);
    }

    // OUTD (16)
    fn outd(&mut self) {
        self.block_out(0xFFFF);
    }

    // OTIR (21/16)
    fn otir(&mut self) {
        self.block_out(1);
        self.repeat_io_block();
    }

    // OTDR (21/16)
    fn otdr(&mut self) {
        self.block_out(0xFFFF);
        self.repeat_io_block();
    }
}
