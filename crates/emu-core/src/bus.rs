//! Memory and I/O port interfaces.

use std::collections::HashMap;

/// Memory interface.
///
/// The CPU reaches memory through this trait. Accesses are synchronous and
/// never re-enter the CPU. Timing is the CPU's concern: a read or write here
/// only moves data.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// I/O port interface.
///
/// The Z80 has a separate 16-bit port space reached with IN and OUT. The
/// full 16-bit port address is passed through; decoding is up to the device.
pub trait IoBus {
    /// Read a byte from the given port.
    fn read_port(&mut self, port: u16) -> u8;

    /// Write a byte to the given port.
    fn write_port(&mut self, port: u16, value: u8);
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn read(&mut self, address: u16) -> u8 {
        (**self).read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        (**self).write(address, value);
    }
}

impl<B: IoBus + ?Sized> IoBus for &mut B {
    fn read_port(&mut self, port: u16) -> u8 {
        (**self).read_port(port)
    }

    fn write_port(&mut self, port: u16, value: u8) {
        (**self).write_port(port, value);
    }
}

impl<B: Bus + ?Sized> Bus for Box<B> {
    fn read(&mut self, address: u16) -> u8 {
        (**self).read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        (**self).write(address, value);
    }
}

impl<B: IoBus + ?Sized> IoBus for Box<B> {
    fn read_port(&mut self, port: u16) -> u8 {
        (**self).read_port(port)
    }

    fn write_port(&mut self, port: u16, value: u8) {
        (**self).write_port(port, value);
    }
}

/// Flat 64 KiB RAM with a port latch.
///
/// Useful for tests and hosts without memory mapping. Port reads return the
/// value registered with [`SimpleBus::set_port`], or `0xFF` (floating bus)
/// for unmapped ports. Every memory and port write is logged in order so
/// tests can assert on exactly which addresses an instruction touched.
#[derive(Debug, Clone)]
pub struct SimpleBus {
    ram: Vec<u8>,
    port_values: HashMap<u16, u8>,
    port_writes: Vec<(u16, u8)>,
    memory_writes: Vec<u16>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; 0x1_0000],
            port_values: HashMap::new(),
            port_writes: Vec::new(),
            memory_writes: Vec::new(),
        }
    }

    /// Copy `data` into RAM starting at `address`, wrapping at 64 KiB.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read RAM without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    /// Read a little-endian word without side effects.
    #[must_use]
    pub fn peek_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.peek(address), self.peek(address.wrapping_add(1))])
    }

    /// Set the value returned when `port` is read.
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.port_values.insert(port, value);
    }

    /// Port writes in the order they happened.
    #[must_use]
    pub fn port_writes(&self) -> &[(u16, u8)] {
        &self.port_writes
    }

    /// Memory write addresses in the order they happened.
    #[must_use]
    pub fn memory_writes(&self) -> &[u16] {
        &self.memory_writes
    }

    /// Forget logged writes, keeping RAM and port values.
    pub fn clear_logs(&mut self) {
        self.port_writes.clear();
        self.memory_writes.clear();
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
        self.memory_writes.push(address);
    }
}

impl IoBus for SimpleBus {
    fn read_port(&mut self, port: u16) -> u8 {
        self.port_values.get(&port).copied().unwrap_or(0xFF)
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.port_writes.push((port, value));
    }
}
