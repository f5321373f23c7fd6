//! CPU construction: configuration and builder.

use emu_core::{Bus, IoBus, Ticks};

use crate::Z80;
use crate::error::Z80Error;
use crate::trace::CpuTracer;

/// Power-on configuration for a [`Z80`].
///
/// Applied once, after the construction-time reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Z80Config {
    /// Initial value of the tick counter.
    pub start_ticks: u64,
    /// Interrupt mode after power-on (0, 1 or 2).
    pub interrupt_mode: u8,
    /// Initial stack pointer.
    pub sp: u16,
    /// Initial AF pair.
    pub af: u16,
}

impl Default for Z80Config {
    /// Real silicon powers up with AF and SP at `0xFFFF`.
    fn default() -> Self {
        Self {
            start_ticks: 0,
            interrupt_mode: 0,
            sp: 0xFFFF,
            af: 0xFFFF,
        }
    }
}

/// Builder for a [`Z80`] that checks both devices are present.
pub struct Z80Builder<M, P> {
    memory: Option<M>,
    ports: Option<P>,
    config: Z80Config,
    tracer: Option<Box<dyn CpuTracer>>,
}

impl<M: Bus, P: IoBus> Z80Builder<M, P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: None,
            ports: None,
            config: Z80Config::default(),
            tracer: None,
        }
    }

    #[must_use]
    pub fn memory(mut self, memory: M) -> Self {
        self.memory = Some(memory);
        self
    }

    #[must_use]
    pub fn ports(mut self, ports: P) -> Self {
        self.ports = Some(ports);
        self
    }

    #[must_use]
    pub fn config(mut self, config: Z80Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn tracer(mut self, tracer: Box<dyn CpuTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Build the CPU. Fails if either device is missing.
    pub fn build(self) -> Result<Z80<M, P>, Z80Error> {
        let memory = self.memory.ok_or(Z80Error::MissingMemory)?;
        let ports = self.ports.ok_or(Z80Error::MissingPorts)?;

        let mut cpu = Z80::new(memory, ports);
        cpu.apply_config(&self.config);
        if let Some(tracer) = self.tracer {
            cpu.set_tracer(tracer);
        }
        Ok(cpu)
    }
}

impl<M: Bus, P: IoBus> Default for Z80Builder<M, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Bus, P: IoBus> Z80<M, P> {
    /// Start building a CPU.
    #[must_use]
    pub fn builder() -> Z80Builder<M, P> {
        Z80Builder::new()
    }

    pub(crate) fn apply_config(&mut self, config: &Z80Config) {
        self.set_ticks(Ticks::new(config.start_ticks));
        self.set_interrupt_mode(config.interrupt_mode);
        self.regs.sp = config.sp;
        self.regs.set_af(config.af);
    }
}
