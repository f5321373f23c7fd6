//! Z80 register file.

/// The Z80 register file.
///
/// Pure data: the CPU engine and opcode handlers are the only writers while
/// emulation runs. Embedders may read or patch it between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    // Main registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Alternate registers
    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    // Other registers
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,

    /// WZ/MEMPTR - internal address latch.
    /// Leaks into the undocumented flag bits of `BIT n,(HL)`.
    pub wz: u16,
}

impl Registers {
    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    /// I in the high byte, R in the low byte.
    #[must_use]
    pub const fn ir(&self) -> u16 {
        (self.i as u16) << 8 | self.r as u16
    }

    #[must_use]
    pub const fn af_alt(&self) -> u16 {
        (self.a_alt as u16) << 8 | self.f_alt as u16
    }

    #[must_use]
    pub const fn bc_alt(&self) -> u16 {
        (self.b_alt as u16) << 8 | self.c_alt as u16
    }

    #[must_use]
    pub const fn de_alt(&self) -> u16 {
        (self.d_alt as u16) << 8 | self.e_alt as u16
    }

    #[must_use]
    pub const fn hl_alt(&self) -> u16 {
        (self.h_alt as u16) << 8 | self.l_alt as u16
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    pub fn set_ir(&mut self, value: u16) {
        self.i = (value >> 8) as u8;
        self.r = value as u8;
    }

    pub fn set_af_alt(&mut self, value: u16) {
        self.a_alt = (value >> 8) as u8;
        self.f_alt = value as u8;
    }

    pub fn set_bc_alt(&mut self, value: u16) {
        self.b_alt = (value >> 8) as u8;
        self.c_alt = value as u8;
    }

    pub fn set_de_alt(&mut self, value: u16) {
        self.d_alt = (value >> 8) as u8;
        self.e_alt = value as u8;
    }

    pub fn set_hl_alt(&mut self, value: u16) {
        self.h_alt = (value >> 8) as u8;
        self.l_alt = value as u8;
    }

    /// 8-bit register by its 3-bit opcode encoding.
    ///
    /// 0=B 1=C 2=D 3=E 4=H 5=L 6=F 7=A. Encoding 6 means `(HL)` in opcodes;
    /// handlers route that case to memory before calling this.
    #[must_use]
    pub const fn reg8(&self, index: u8) -> u8 {
        match index & 7 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            6 => self.f,
            _ => self.a,
        }
    }

    /// Set an 8-bit register by its 3-bit opcode encoding (see [`Self::reg8`]).
    pub fn set_reg8(&mut self, index: u8, value: u8) {
        match index & 7 {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            6 => self.f = value,
            _ => self.a = value,
        }
    }

    /// Register pair by its 2-bit encoding: 0=BC 1=DE 2=HL 3=SP.
    #[must_use]
    pub const fn reg16(&self, index: u8) -> u16 {
        match index & 3 {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            _ => self.sp,
        }
    }

    /// Set a register pair by its 2-bit encoding (see [`Self::reg16`]).
    pub fn set_reg16(&mut self, index: u8, value: u16) {
        match index & 3 {
            0 => self.set_bc(value),
            1 => self.set_de(value),
            2 => self.set_hl(value),
            _ => self.sp = value,
        }
    }

    /// `EX AF,AF'`
    pub fn exchange_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        std::mem::swap(&mut self.f, &mut self.f_alt);
    }

    /// `EXX`: swap BC, DE and HL with their shadows.
    pub fn exchange_main(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }
}
