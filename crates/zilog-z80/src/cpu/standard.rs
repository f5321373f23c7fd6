//! Unprefixed instructions.
//!
//! Every handler runs after the 4-tick opcode fetch; the tick counts in the
//! comments are instruction totals including that fetch.

use emu_core::{Bus, IoBus};

use crate::alu::{self, DEC_FLAGS, INC_FLAGS};
use crate::flags::{CF, HF, NF, SZP, XY};

use super::Z80;
use super::dispatch::{OpFn, empty_table};

impl<M: Bus, P: IoBus> Z80<M, P> {
    pub(super) fn standard_table() -> [OpFn<M, P>; 256] {
        let mut t = empty_table::<M, P>();

        for rr in 0..4usize {
            let base = rr << 4;
            t[base | 0x01] = Self::ld_rr_nn;
            t[base | 0x03] = Self::inc_rr;
            t[base | 0x09] = Self::add_hl_rr;
            t[base | 0x0B] = Self::dec_rr;
            t[base | 0xC1] = Self::pop_qq;
            t[base | 0xC5] = Self::push_qq;
        }

        for r in 0..8usize {
            let base = r << 3;
            t[0x04 | base] = Self::inc_r;
            t[0x05 | base] = Self::dec_r;
            t[0x06 | base] = Self::ld_r_n;
            t[0x80 | base | 6] = Self::alu_a_hli;
            t[0xC0 | base] = Self::ret_cc;
            t[0xC2 | base] = Self::jp_cc_nn;
            t[0xC4 | base] = Self::call_cc_nn;
            t[0xC6 | base] = Self::alu_a_n;
            t[0xC7 | base] = Self::rst;
            for src in 0..8usize {
                if src != 6 {
                    t[0x80 | base | src] = Self::alu_a_r;
                }
            }
        }
        t[0x34] = Self::inc_hli;
        t[0x35] = Self::dec_hli;
        t[0x36] = Self::ld_hli_n;

        // LD r,r' / LD r,(HL) / LD (HL),r
        for dst in 0..8usize {
            for src in 0..8usize {
                let op = 0x40 | (dst << 3) | src;
                t[op] = match (dst, src) {
                    (6, 6) => Self::halt as OpFn<M, P>,
                    (_, 6) => Self::ld_r_hli,
                    (6, _) => Self::ld_hli_r,
                    _ if dst == src => t[op],
                    _ => Self::ld_r_r,
                };
            }
        }

        t[0x02] = Self::ld_bci_a;
        t[0x12] = Self::ld_dei_a;
        t[0x0A] = Self::ld_a_bci;
        t[0x1A] = Self::ld_a_dei;
        t[0x07] = Self::rlca;
        t[0x0F] = Self::rrca;
        t[0x17] = Self::rla;
        t[0x1F] = Self::rra;
        t[0x08] = Self::ex_af_af;
        t[0x10] = Self::djnz;
        t[0x18] = Self::jr_e;
        t[0x20] = Self::jr_cc_e;
        t[0x28] = Self::jr_cc_e;
        t[0x30] = Self::jr_cc_e;
        t[0x38] = Self::jr_cc_e;
        t[0x22] = Self::ld_nni_hl;
        t[0x2A] = Self::ld_hl_nni;
        t[0x32] = Self::ld_nni_a;
        t[0x3A] = Self::ld_a_nni;
        t[0x27] = Self::daa;
        t[0x2F] = Self::cpl;
        t[0x37] = Self::scf;
        t[0x3F] = Self::ccf;

        t[0xC3] = Self::jp_nn;
        t[0xC9] = Self::ret;
        t[0xCD] = Self::call_nn;
        t[0xD3] = Self::out_n_a;
        t[0xDB] = Self::in_a_n;
        t[0xD9] = Self::exx;
        t[0xE3] = Self::ex_spi_hl;
        t[0xE9] = Self::jp_hl;
        t[0xEB] = Self::ex_de_hl;
        t[0xF3] = Self::di;
        t[0xF9] = Self::ld_sp_hl;
        t[0xFB] = Self::ei;

        t
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    /// INC on a byte; carry is kept.
    pub(super) fn inc8(&mut self, value: u8) -> u8 {
        self.regs.f = INC_FLAGS[value as usize] | (self.regs.f & CF);
        value.wrapping_add(1)
    }

    /// DEC on a byte; carry is kept.
    pub(super) fn dec8(&mut self, value: u8) -> u8 {
        self.regs.f = DEC_FLAGS[value as usize] | (self.regs.f & CF);
        value.wrapping_sub(1)
    }

    /// ADD/ADC/SUB/SBC/AND/XOR/OR/CP A with `value`, selected by opcode bits 5-3.
    pub(super) fn alu_a(&mut self, value: u8) {
        let result = alu::accumulator_op((self.opcode >> 3) & 7, self.regs.a, value, self.carry());
        self.regs.a = result.value;
        self.regs.f = result.flags;
    }

    /// Relative jump by a signed displacement. Five extra ticks.
    fn jump_relative(&mut self, e: u8) {
        self.tick(5);
        self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(e as i8));
        self.regs.wz = self.regs.pc;
    }

    // =========================================================================
    // 8-bit loads
    // =========================================================================

    // LD r,r' (4)
    fn ld_r_r(&mut self) {
        let value = self.regs.reg8(self.opcode & 7);
        self.regs.set_reg8((self.opcode >> 3) & 7, value);
    }

    // LD r,n (7)
    fn ld_r_n(&mut self) {
        let value = self.fetch_operand();
        self.regs.set_reg8((self.opcode >> 3) & 7, value);
    }

    // LD r,(HL) (7)
    fn ld_r_hli(&mut self) {
        let value = self.read_memory(self.regs.hl());
        self.tick(3);
        self.regs.set_reg8((self.opcode >> 3) & 7, value);
    }

    // LD (HL),r (7)
    fn ld_hli_r(&mut self) {
        let value = self.regs.reg8(self.opcode & 7);
        self.write_memory(self.regs.hl(), value);
        self.tick(3);
    }

    // LD (HL),n (10)
    fn ld_hli_n(&mut self) {
        let value = self.fetch_operand();
        self.write_memory(self.regs.hl(), value);
        self.tick(3);
    }

    // LD (BC),A (7)
    fn ld_bci_a(&mut self) {
        let address = self.regs.bc();
        self.store_a_indirect(address);
    }

    // LD (DE),A (7)
    fn ld_dei_a(&mut self) {
        let address = self.regs.de();
        self.store_a_indirect(address);
    }

    fn store_a_indirect(&mut self, address: u16) {
        self.write_memory(address, self.regs.a);
        self.tick(3);
        self.regs.wz = (u16::from(self.regs.a) << 8) | (address.wrapping_add(1) & 0xFF);
    }

    // LD A,(BC) (7)
    fn ld_a_bci(&mut self) {
        let address = self.regs.bc();
        self.load_a_indirect(address);
    }

    // LD A,(DE) (7)
    fn ld_a_dei(&mut self) {
        let address = self.regs.de();
        self.load_a_indirect(address);
    }

    fn load_a_indirect(&mut self, address: u16) {
        self.regs.a = self.read_memory(address);
        self.tick(3);
        self.regs.wz = address.wrapping_add(1);
    }

    // LD (nn),A (13)
    fn ld_nni_a(&mut self) {
        let address = self.fetch_operand_word();
        self.write_memory(address, self.regs.a);
        self.tick(3);
        self.regs.wz = (u16::from(self.regs.a) << 8) | (address.wrapping_add(1) & 0xFF);
    }

    // LD A,(nn) (13)
    fn ld_a_nni(&mut self) {
        let address = self.fetch_operand_word();
        self.regs.a = self.read_memory(address);
        self.tick(3);
        self.regs.wz = address.wrapping_add(1);
    }

    // =========================================================================
    // 16-bit loads and stack
    // =========================================================================

    // LD rr,nn (10)
    fn ld_rr_nn(&mut self) {
        let rr = (self.opcode >> 4) & 3;
        let old_sp = self.regs.sp;
        let value = self.fetch_operand_word();
        self.regs.set_reg16(rr, value);
        if rr == 3 {
            self.trace_stack_pointer("ld sp,nn", old_sp);
        }
    }

    // LD (nn),HL (16)
    fn ld_nni_hl(&mut self) {
        let address = self.fetch_operand_word();
        self.write_word(address, self.regs.hl());
        self.regs.wz = address.wrapping_add(1);
    }

    // LD HL,(nn) (16)
    fn ld_hl_nni(&mut self) {
        let address = self.fetch_operand_word();
        let value = self.read_word(address);
        self.regs.set_hl(value);
        self.regs.wz = address.wrapping_add(1);
    }

    // LD SP,HL (6)
    fn ld_sp_hl(&mut self) {
        let old_sp = self.regs.sp;
        self.tick(2);
        self.regs.sp = self.regs.hl();
        self.trace_stack_pointer("ld sp,hl", old_sp);
    }

    /// BC, DE, HL, AF by the 2-bit field of PUSH/POP.
    fn stack_pair(&self, qq: u8) -> u16 {
        if qq == 3 {
            self.regs.af()
        } else {
            self.regs.reg16(qq)
        }
    }

    fn set_stack_pair(&mut self, qq: u8, value: u16) {
        if qq == 3 {
            self.regs.set_af(value);
        } else {
            self.regs.set_reg16(qq, value);
        }
    }

    // PUSH qq (11)
    fn push_qq(&mut self) {
        let value = self.stack_pair((self.opcode >> 4) & 3);
        let old_sp = self.regs.sp;
        self.tick(1);
        self.push_word(value);
        self.trace_stack_content("push", old_sp, Some(value));
    }

    // POP qq (10)
    fn pop_qq(&mut self) {
        let old_sp = self.regs.sp;
        let value = self.pop_word();
        self.set_stack_pair((self.opcode >> 4) & 3, value);
        self.trace_stack_content("pop", old_sp, Some(value));
    }

    // =========================================================================
    // Exchanges
    // =========================================================================

    // EX AF,AF' (4)
    fn ex_af_af(&mut self) {
        self.regs.exchange_af();
    }

    // EXX (4)
    fn exx(&mut self) {
        self.regs.exchange_main();
    }

    // EX DE,HL (4)
    fn ex_de_hl(&mut self) {
        let de = self.regs.de();
        self.regs.set_de(self.regs.hl());
        self.regs.set_hl(de);
    }

    /// Swap a word with the top of the stack. 15 ticks after the fetch.
    pub(super) fn exchange_stack_top(&mut self, value: u16) -> u16 {
        let sp = self.regs.sp;
        let lo = self.read_memory(sp);
        self.tick(3);
        let hi = self.read_memory(sp.wrapping_add(1));
        self.tick(4);
        self.write_memory(sp.wrapping_add(1), (value >> 8) as u8);
        self.tick(3);
        self.write_memory(sp, value as u8);
        self.tick(5);
        let top = u16::from_le_bytes([lo, hi]);
        self.regs.wz = top;
        top
    }

    // EX (SP),HL (19)
    fn ex_spi_hl(&mut self) {
        let old_sp = self.regs.sp;
        let hl = self.regs.hl();
        let top = self.exchange_stack_top(hl);
        self.regs.set_hl(top);
        self.trace_stack_content("ex (sp),hl", old_sp, Some(hl));
    }

    // =========================================================================
    // 8-bit arithmetic and logic
    // =========================================================================

    // INC r (4)
    fn inc_r(&mut self) {
        let r = (self.opcode >> 3) & 7;
        let value = self.inc8(self.regs.reg8(r));
        self.regs.set_reg8(r, value);
    }

    // DEC r (4)
    fn dec_r(&mut self) {
        let r = (self.opcode >> 3) & 7;
        let value = self.dec8(self.regs.reg8(r));
        self.regs.set_reg8(r, value);
    }

    // INC (HL) (11)
    fn inc_hli(&mut self) {
        let address = self.regs.hl();
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.inc8(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }

    // DEC (HL) (11)
    fn dec_hli(&mut self) {
        let address = self.regs.hl();
        let value = self.read_memory(address);
        self.tick(3);
        let value = self.dec8(value);
        self.tick(1);
        self.write_memory(address, value);
        self.tick(3);
    }

    // ALU A,r (4)
    fn alu_a_r(&mut self) {
        let value = self.regs.reg8(self.opcode & 7);
        self.alu_a(value);
    }

    // ALU A,(HL) (7)
    fn alu_a_hli(&mut self) {
        let value = self.read_memory(self.regs.hl());
        self.tick(3);
        self.alu_a(value);
    }

    // ALU A,n (7)
    fn alu_a_n(&mut self) {
        let value = self.fetch_operand();
        self.alu_a(value);
    }

    // DAA (4)
    fn daa(&mut self) {
        let af = alu::daa(self.regs.a, self.regs.f);
        self.regs.set_af(af);
    }

    // CPL (4)
    fn cpl(&mut self) {
        self.regs.a ^= 0xFF;
        self.regs.f = (self.regs.f & (SZP | CF)) | HF | NF | (self.regs.a & XY);
    }

    // SCF (4)
    fn scf(&mut self) {
        self.regs.f = (self.regs.f & SZP) | (self.regs.a & XY) | CF;
    }

    // CCF (4)
    fn ccf(&mut self) {
        let carry = if self.carry() { HF } else { CF };
        self.regs.f = (self.regs.f & SZP) | (self.regs.a & XY) | carry;
    }

    // =========================================================================
    // Accumulator rotates
    // =========================================================================

    fn set_rotate_a_flags(&mut self, carry: bool) {
        self.regs.f = (self.regs.f & SZP) | (self.regs.a & XY) | u8::from(carry);
    }

    // RLCA (4)
    fn rlca(&mut self) {
        let carry = self.regs.a & 0x80 != 0;
        self.regs.a = self.regs.a.rotate_left(1);
        self.set_rotate_a_flags(carry);
    }

    // RRCA (4)
    fn rrca(&mut self) {
        let carry = self.regs.a & 0x01 != 0;
        self.regs.a = self.regs.a.rotate_right(1);
        self.set_rotate_a_flags(carry);
    }

    // RLA (4)
    fn rla(&mut self) {
        let carry = self.regs.a & 0x80 != 0;
        self.regs.a = (self.regs.a << 1) | u8::from(self.carry());
        self.set_rotate_a_flags(carry);
    }

    // RRA (4)
    fn rra(&mut self) {
        let carry = self.regs.a & 0x01 != 0;
        self.regs.a = (self.regs.a >> 1) | if self.carry() { 0x80 } else { 0 };
        self.set_rotate_a_flags(carry);
    }

    // =========================================================================
    // 16-bit arithmetic
    // =========================================================================

    // INC rr (6)
    fn inc_rr(&mut self) {
        let rr = (self.opcode >> 4) & 3;
        let old_sp = self.regs.sp;
        self.tick(2);
        self.regs.set_reg16(rr, self.regs.reg16(rr).wrapping_add(1));
        if rr == 3 {
            self.trace_stack_pointer("inc sp", old_sp);
        }
    }

    // DEC rr (6)
    fn dec_rr(&mut self) {
        let rr = (self.opcode >> 4) & 3;
        let old_sp = self.regs.sp;
        self.tick(2);
        self.regs.set_reg16(rr, self.regs.reg16(rr).wrapping_sub(1));
        if rr == 3 {
            self.trace_stack_pointer("dec sp", old_sp);
        }
    }

    // ADD HL,rr (11)
    fn add_hl_rr(&mut self) {
        let hl = self.regs.hl();
        let rr = self.regs.reg16((self.opcode >> 4) & 3);
        self.regs.wz = hl.wrapping_add(1);
        let (result, flags) = alu::add16(hl, rr);
        self.regs.set_hl(result);
        self.regs.f = (self.regs.f & SZP) | flags;
        self.tick(7);
    }

    // =========================================================================
    // Jumps
    // =========================================================================

    // DJNZ e (8/13)
    fn djnz(&mut self) {
        self.tick(1);
        let e = self.fetch_operand();
        self.regs.b = self.regs.b.wrapping_sub(1);
        if self.regs.b != 0 {
            self.jump_relative(e);
            self.trace_branch("djnz");
        }
    }

    // JR e (12)
    fn jr_e(&mut self) {
        let e = self.fetch_operand();
        self.jump_relative(e);
        self.trace_branch("jr");
    }

    // JR NZ/Z/NC/C,e (7/12)
    fn jr_cc_e(&mut self) {
        let e = self.fetch_operand();
        if self.condition((self.opcode >> 3) & 3) {
            self.jump_relative(e);
            self.trace_branch("jr cc");
        }
    }

    // JP nn (10)
    fn jp_nn(&mut self) {
        let target = self.fetch_operand_word();
        self.regs.wz = target;
        self.regs.pc = target;
        self.trace_branch("jp");
    }

    // JP cc,nn (10)
    fn jp_cc_nn(&mut self) {
        let target = self.fetch_operand_word();
        self.regs.wz = target;
        if self.condition((self.opcode >> 3) & 7) {
            self.regs.pc = target;
            self.trace_branch("jp cc");
        }
    }

    // JP (HL) (4)
    fn jp_hl(&mut self) {
        self.regs.pc = self.regs.hl();
        self.trace_branch("jp (hl)");
    }

    // =========================================================================
    // Calls and returns
    // =========================================================================

    fn call_to(&mut self, target: u16, operation: &'static str) {
        let old_sp = self.regs.sp;
        let return_address = self.regs.pc;
        self.tick(1);
        self.push_word(return_address);
        self.regs.pc = target;
        self.trace_stack_content(operation, old_sp, Some(return_address));
    }

    // CALL nn (17)
    fn call_nn(&mut self) {
        let target = self.fetch_operand_word();
        self.regs.wz = target;
        self.call_to(target, "call");
    }

    // CALL cc,nn (10/17)
    fn call_cc_nn(&mut self) {
        let target = self.fetch_operand_word();
        self.regs.wz = target;
        if self.condition((self.opcode >> 3) & 7) {
            self.call_to(target, "call cc");
        }
    }

    // RST p (11)
    fn rst(&mut self) {
        let target = u16::from(self.opcode & 0x38);
        self.regs.wz = target;
        self.call_to(target, "rst");
    }

    /// Pop PC and report the return. 6 ticks.
    pub(super) fn return_from(&mut self, operation: &'static str) {
        let old_sp = self.regs.sp;
        self.regs.pc = self.pop_word();
        self.regs.wz = self.regs.pc;
        self.trace_stack_content(operation, old_sp, None);
    }

    // RET (10)
    fn ret(&mut self) {
        self.return_from("ret");
    }

    // RET cc (5/11)
    fn ret_cc(&mut self) {
        self.tick(1);
        if self.condition((self.opcode >> 3) & 7) {
            self.return_from("ret cc");
        }
    }

    // =========================================================================
    // I/O
    // =========================================================================

    // OUT (n),A (11)
    fn out_n_a(&mut self) {
        let n = self.fetch_operand();
        let port = u16::from(n) | (u16::from(self.regs.a) << 8);
        self.regs.wz = (u16::from(self.regs.a) << 8) | u16::from(n.wrapping_add(1));
        self.write_port(port, self.regs.a);
        self.tick(4);
    }

    // IN A,(n) (11)
    fn in_a_n(&mut self) {
        let n = self.fetch_operand();
        let port = u16::from(n) | (u16::from(self.regs.a) << 8);
        self.regs.wz = port.wrapping_add(1);
        self.regs.a = self.read_port(port);
        self.tick(4);
    }

    // =========================================================================
    // CPU control
    // =========================================================================

    // HALT (4)
    fn halt(&mut self) {
        // PC stays on the HALT opcode until an interrupt steps over it.
        self.regs.pc = self.regs.pc.wrapping_sub(1);
        self.enter_halt();
    }

    // DI (4)
    fn di(&mut self) {
        self.set_interrupt_enables(false);
    }

    // EI (4)
    fn ei(&mut self) {
        self.set_interrupt_enables(true);
        self.block_interrupt();
    }
}
