//! CPU signal lines and decode modes.

use bitflags::bitflags;

bitflags! {
    /// Pending signals, sampled at the top of every engine cycle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Signals: u8 {
        /// Maskable interrupt line. Level-triggered: stays raised until the
        /// embedder clears it.
        const INT = 0b0000_0001;
        /// Non-maskable interrupt. Edge-triggered: the core clears it when
        /// the NMI is serviced, so one raise produces exactly one NMI.
        /// Earlier cores left it set and relied on IFF1 being off to avoid
        /// re-entry.
        const NMI = 0b0000_0010;
        /// Hard reset request.
        const RESET = 0b0000_0100;
        /// Set by HALT, cleared by INT/NMI service or reset.
        const HALTED = 0b0000_1000;
    }
}

/// Which opcode table the next fetched byte resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixMode {
    #[default]
    None,
    /// After 0xED.
    Extended,
    /// After 0xCB.
    Bit,
}

/// Which index register replaces HL for the current instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    #[default]
    None,
    /// After 0xDD.
    Ix,
    /// After 0xFD.
    Iy,
}

impl PrefixMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Extended => "ED",
            Self::Bit => "CB",
        }
    }
}

impl IndexMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ix => "IX",
            Self::Iy => "IY",
        }
    }
}
