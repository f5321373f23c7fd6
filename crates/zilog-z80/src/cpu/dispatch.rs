//! Opcode dispatch tables.
//!
//! Five 256-entry tables of plain function pointers, one per decode mode.
//! Every slot is populated; unassigned opcodes point at [`noop`], which
//! leaves all state alone beyond the fetch costs already charged.

use emu_core::{Bus, IoBus};

use super::Z80;

/// Handler for a fully decoded opcode.
pub(super) type OpFn<M, P> = fn(&mut Z80<M, P>);

/// Handler for DD CB / FD CB opcodes; receives the effective address.
pub(super) type IndexedBitFn<M, P> = fn(&mut Z80<M, P>, u16);

pub(super) struct DispatchTables<M, P> {
    pub(super) standard: [OpFn<M, P>; 256],
    pub(super) extended: [OpFn<M, P>; 256],
    pub(super) bit: [OpFn<M, P>; 256],
    pub(super) indexed: [OpFn<M, P>; 256],
    pub(super) indexed_bit: [IndexedBitFn<M, P>; 256],
}

impl<M: Bus, P: IoBus> DispatchTables<M, P> {
    pub(super) fn new() -> Self {
        let standard = Z80::<M, P>::standard_table();
        let indexed = Z80::<M, P>::indexed_table(&standard);
        Self {
            standard,
            extended: Z80::<M, P>::extended_table(),
            bit: Z80::<M, P>::bit_table(),
            indexed,
            indexed_bit: Z80::<M, P>::indexed_bit_table(),
        }
    }
}

/// Unassigned slot.
pub(super) fn noop<M: Bus, P: IoBus>(_cpu: &mut Z80<M, P>) {}

/// A table with every slot unassigned.
pub(super) fn empty_table<M: Bus, P: IoBus>() -> [OpFn<M, P>; 256] {
    [noop::<M, P> as OpFn<M, P>; 256]
}
