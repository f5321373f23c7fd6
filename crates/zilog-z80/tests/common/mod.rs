//! Shared helpers for the Z80 integration tests.

#![allow(dead_code)]

use emu_core::SimpleBus;
use serde::Deserialize;
use zilog_z80::{Registers, Z80};

pub type TestCpu = Z80<SimpleBus, SimpleBus>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// CPU with `program` at 0x0000 and every register cleared.
pub fn cpu_with_program(program: &[u8]) -> TestCpu {
    cpu_with_program_at(0x0000, program)
}

/// CPU with `program` at `address`, PC pointing at it and every other
/// register cleared.
pub fn cpu_with_program_at(address: u16, program: &[u8]) -> TestCpu {
    init_logging();
    let mut memory = SimpleBus::new();
    memory.load(address, program);
    let mut cpu = Z80::new(memory, SimpleBus::new());
    cpu.regs = Registers {
        pc: address,
        ..Registers::default()
    };
    cpu
}

/// CPU about to run `prefix` then `opcode`, with flags set so that a
/// conditional jump, call or return at `opcode` is not taken and B set so
/// DJNZ falls through. SP points at free RAM.
pub fn untaken_branch_cpu(prefix: &[u8], opcode: u8) -> TestCpu {
    let mut program = prefix.to_vec();
    program.extend_from_slice(&[opcode, 0x00, 0x00, 0x00]);
    let mut cpu = cpu_with_program(&program);
    cpu.regs.sp = 0x8000;
    cpu.regs.b = 1;
    // Even conditions (NZ, NC, PO, P) fail with every flag set, odd ones
    // with every flag clear.
    cpu.regs.f = if (opcode >> 3) & 1 == 0 { 0xFF } else { 0x00 };
    cpu
}

/// Run `count` whole instructions, returning the ticks they took.
pub fn run_instructions(cpu: &mut TestCpu, count: usize) -> u64 {
    (0..count).map(|_| cpu.step()).sum()
}

// =========================================================================
// JSON single-step cases
// =========================================================================

/// Register and RAM snapshot. Omitted registers are zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CpuState {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    /// Only compared when present in the expected state.
    pub wz: Option<u16>,
    pub ram: Vec<(u16, u8)>,
}

impl CpuState {
    fn registers(&self) -> Registers {
        Registers {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.r,
            wz: self.wz.unwrap_or(0),
            ..Registers::default()
        }
    }
}

/// One instruction: initial state, expected state, and tick count.
#[derive(Debug, Deserialize)]
pub struct StepCase {
    pub name: String,
    pub initial: CpuState,
    #[serde(rename = "final")]
    pub final_state: CpuState,
    pub ticks: u64,
    /// Values returned by port reads.
    #[serde(default)]
    pub ports: Vec<(u16, u8)>,
    /// Every port write the instruction is expected to make, in order.
    #[serde(default)]
    pub port_writes: Vec<(u16, u8)>,
    /// Every memory address the instruction is expected to write, in order.
    #[serde(default)]
    pub memory_writes: Vec<u16>,
}

fn run_case(case: &StepCase) -> Result<(), String> {
    let mut memory = SimpleBus::new();
    for &(address, value) in &case.initial.ram {
        memory.load(address, &[value]);
    }
    let mut ports = SimpleBus::new();
    for &(port, value) in &case.ports {
        ports.set_port(port, value);
    }

    let mut cpu = Z80::new(memory, ports);
    cpu.regs = case.initial.registers();
    let ticks = cpu.step();

    let mut errors = Vec::new();
    if ticks != case.ticks {
        errors.push(format!("ticks: got {ticks}, expected {}", case.ticks));
    }

    let expected = &case.final_state;
    let r = &cpu.regs;
    let checks: [(&str, u16, u16); 14] = [
        ("a", r.a.into(), expected.a.into()),
        ("f", r.f.into(), expected.f.into()),
        ("b", r.b.into(), expected.b.into()),
        ("c", r.c.into(), expected.c.into()),
        ("d", r.d.into(), expected.d.into()),
        ("e", r.e.into(), expected.e.into()),
        ("h", r.h.into(), expected.h.into()),
        ("l", r.l.into(), expected.l.into()),
        ("ix", r.ix, expected.ix),
        ("iy", r.iy, expected.iy),
        ("sp", r.sp, expected.sp),
        ("pc", r.pc, expected.pc),
        ("i", r.i.into(), expected.i.into()),
        ("r", r.r.into(), expected.r.into()),
    ];
    for (name, got, want) in checks {
        if got != want {
            errors.push(format!("{name}: got {got:#06X}, expected {want:#06X}"));
        }
    }
    if let Some(want) = expected.wz {
        if r.wz != want {
            errors.push(format!("wz: got {:#06X}, expected {want:#06X}", r.wz));
        }
    }

    for &(address, want) in &expected.ram {
        let got = cpu.memory().peek(address);
        if got != want {
            errors.push(format!("ram[{address:#06X}]: got {got:#04X}, expected {want:#04X}"));
        }
    }

    if cpu.memory().memory_writes() != case.memory_writes.as_slice() {
        errors.push(format!(
            "memory writes: got {:04X?}, expected {:04X?}",
            cpu.memory().memory_writes(),
            case.memory_writes
        ));
    }

    if cpu.ports().port_writes() != case.port_writes.as_slice() {
        errors.push(format!(
            "port writes: got {:?}, expected {:?}",
            cpu.ports().port_writes(),
            case.port_writes
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join(", "))
    }
}

/// Run every case in a JSON array and report all failures together.
pub fn run_step_cases(json: &str) {
    init_logging();
    let cases: Vec<StepCase> = serde_json::from_str(json).expect("test data should parse");
    assert!(!cases.is_empty(), "no cases in test data");

    let failures: Vec<String> = cases
        .iter()
        .filter_map(|case| run_case(case).err().map(|e| format!("{}: {e}", case.name)))
        .collect();

    assert!(
        failures.is_empty(),
        "{} of {} cases failed:\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n")
    );
}
