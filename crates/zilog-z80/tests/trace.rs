//! Trace hook events.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{TestCpu, cpu_with_program};
use zilog_z80::{
    BranchEvent, CpuTracer, InterruptEvent, NmiEvent, Signals, StackContentEvent,
    StackPointerEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    StackPointer(StackPointerEvent),
    StackContent(StackContentEvent),
    Branch(BranchEvent),
    Interrupt(InterruptEvent),
    Nmi(NmiEvent),
}

#[derive(Clone, Default)]
struct Recorder {
    events: Rc<RefCell<Vec<Event>>>,
}

impl CpuTracer for Recorder {
    fn stack_pointer(&mut self, event: &StackPointerEvent) {
        self.events.borrow_mut().push(Event::StackPointer(*event));
    }

    fn stack_content(&mut self, event: &StackContentEvent) {
        self.events.borrow_mut().push(Event::StackContent(*event));
    }

    fn branch(&mut self, event: &BranchEvent) {
        self.events.borrow_mut().push(Event::Branch(*event));
    }

    fn interrupt(&mut self, event: &InterruptEvent) {
        self.events.borrow_mut().push(Event::Interrupt(*event));
    }

    fn nmi(&mut self, event: &NmiEvent) {
        self.events.borrow_mut().push(Event::Nmi(*event));
    }
}

fn traced_cpu(program: &[u8]) -> (TestCpu, Rc<RefCell<Vec<Event>>>) {
    let mut cpu = cpu_with_program(program);
    let recorder = Recorder::default();
    let events = Rc::clone(&recorder.events);
    cpu.set_tracer(Box::new(recorder));
    (cpu, events)
}

#[test]
fn ld_sp_reports_old_and_new_stack_pointer() {
    // LD SP,0x8000 ; LD SP,HL
    let (mut cpu, events) = traced_cpu(&[0x31, 0x00, 0x80, 0xF9]);
    cpu.regs.set_hl(0x9000);
    cpu.step();
    cpu.step();

    assert_eq!(
        *events.borrow(),
        vec![
            Event::StackPointer(StackPointerEvent {
                origin_pc: 0x0000,
                operation: "ld sp,nn",
                old_sp: 0x0000,
                new_sp: 0x8000,
                ticks: 10,
            }),
            Event::StackPointer(StackPointerEvent {
                origin_pc: 0x0003,
                operation: "ld sp,hl",
                old_sp: 0x8000,
                new_sp: 0x9000,
                ticks: 16,
            }),
        ]
    );
}

#[test]
fn prefixed_instruction_reports_prefix_address() {
    // NOP ; LD SP,IY
    let (mut cpu, events) = traced_cpu(&[0x00, 0xFD, 0xF9]);
    cpu.regs.iy = 0x7000;
    cpu.step();
    cpu.step();

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    let Event::StackPointer(event) = &events[0] else {
        panic!("expected a stack pointer event, got {:?}", events[0]);
    };
    assert_eq!(event.origin_pc, 0x0001);
    assert_eq!(event.operation, "ld sp,iy");
    assert_eq!(event.new_sp, 0x7000);
    assert_eq!(event.ticks, 4 + 10);
}

#[test]
fn call_and_return_report_stack_traffic() {
    // CALL 0x0004 ; NOP ; RET
    let (mut cpu, events) = traced_cpu(&[0xCD, 0x04, 0x00, 0x00, 0xC9]);
    cpu.regs.sp = 0x8000;
    cpu.step();
    cpu.step();

    assert_eq!(
        *events.borrow(),
        vec![
            Event::StackContent(StackContentEvent {
                origin_pc: 0x0000,
                operation: "call",
                old_sp: 0x8000,
                content: Some(0x0003),
                ticks: 17,
            }),
            Event::StackContent(StackContentEvent {
                origin_pc: 0x0004,
                operation: "ret",
                old_sp: 0x7FFE,
                content: None,
                ticks: 27,
            }),
        ]
    );
}

#[test]
fn retn_and_reti_are_reported() {
    // RETN at 0x0000, RETI at 0x1000
    let (mut cpu, events) = traced_cpu(&[0xED, 0x45]);
    cpu.regs.sp = 0x7FFC;
    cpu.memory_mut().load(0x7FFC, &[0x00, 0x10, 0x00, 0x20]);
    cpu.memory_mut().load(0x1000, &[0xED, 0x4D]);
    cpu.step();
    cpu.step();

    let operations: Vec<&str> = events
        .borrow()
        .iter()
        .map(|event| match event {
            Event::StackContent(e) => e.operation,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(operations, ["retn", "reti"]);
    assert_eq!(cpu.regs.pc, 0x2000);
}

#[test]
fn untaken_branches_are_silent() {
    // JR NZ,+2 (Z set) ; JP 0x0010
    let (mut cpu, events) = traced_cpu(&[0x20, 0x02, 0xC3, 0x10, 0x00]);
    cpu.regs.f = zilog_z80::ZF;
    cpu.step();
    assert!(events.borrow().is_empty());

    cpu.step();
    assert_eq!(
        *events.borrow(),
        vec![Event::Branch(BranchEvent {
            origin_pc: 0x0002,
            operation: "jp",
            target: 0x0010,
            ticks: 17,
        })]
    );
}

#[test]
fn push_pop_and_inc_sp_are_reported() {
    // PUSH HL ; POP DE ; INC SP
    let (mut cpu, events) = traced_cpu(&[0xE5, 0xD1, 0x33]);
    cpu.regs.sp = 0x8000;
    cpu.regs.set_hl(0xBEEF);
    for _ in 0..3 {
        cpu.step();
    }

    let events = events.borrow();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[0],
        Event::StackContent(StackContentEvent { operation: "push", content: Some(0xBEEF), .. })
    ));
    assert!(matches!(
        events[1],
        Event::StackContent(StackContentEvent { operation: "pop", content: Some(0xBEEF), .. })
    ));
    assert!(matches!(
        events[2],
        Event::StackPointer(StackPointerEvent { operation: "inc sp", old_sp: 0x8000, new_sp: 0x8001, .. })
    ));
}

#[test]
fn removing_tracer_stops_events() {
    let (mut cpu, events) = traced_cpu(&[0x31, 0x00, 0x80, 0x31, 0x00, 0x90]);
    cpu.step();
    assert!(cpu.take_tracer().is_some());
    cpu.step();
    assert_eq!(events.borrow().len(), 1);
    assert_eq!(cpu.regs.sp, 0x9000);
}

#[test]
fn builder_installs_tracer() {
    let mut memory = emu_core::SimpleBus::new();
    memory.load(0x0000, &[0x3B]);
    let recorder = Recorder::default();
    let events = Rc::clone(&recorder.events);
    let Ok(mut cpu) = TestCpu::builder()
        .memory(memory)
        .ports(emu_core::SimpleBus::new())
        .tracer(Box::new(recorder))
        .build()
    else {
        panic!("both devices were supplied");
    };

    cpu.step();
    assert_eq!(
        *events.borrow(),
        vec![Event::StackPointer(StackPointerEvent {
            origin_pc: 0x0000,
            operation: "dec sp",
            old_sp: 0xFFFF,
            new_sp: 0xFFFE,
            ticks: 6,
        })]
    );
}

#[test]
fn accepted_int_reports_return_address_and_vector() {
    let (mut cpu, events) = traced_cpu(&[0x00, 0x00]);
    cpu.regs.sp = 0x8000;
    cpu.set_iff1(true);
    cpu.set_interrupt_mode(1);
    cpu.step();
    cpu.raise(Signals::INT);
    cpu.step();

    assert_eq!(
        *events.borrow(),
        vec![Event::Interrupt(InterruptEvent {
            return_pc: 0x0001,
            mode: 1,
            vector: 0x0038,
            ticks: 16,
        })]
    );
}

#[test]
fn mode_two_int_reports_table_vector() {
    let (mut cpu, events) = traced_cpu(&[0x00]);
    cpu.regs.sp = 0x9000;
    cpu.regs.i = 0x80;
    cpu.memory_mut().load(0x8000, &[0x34, 0x12]);
    cpu.set_iff1(true);
    cpu.set_interrupt_mode(2);
    cpu.raise(Signals::INT);
    cpu.step();

    assert_eq!(
        *events.borrow(),
        vec![Event::Interrupt(InterruptEvent {
            return_pc: 0x0000,
            mode: 2,
            vector: 0x1234,
            ticks: 26,
        })]
    );
}

#[test]
fn accepted_nmi_is_reported() {
    let (mut cpu, events) = traced_cpu(&[0x00, 0x00]);
    cpu.regs.sp = 0x8000;
    cpu.step();
    cpu.raise(Signals::NMI);
    cpu.step();

    assert_eq!(
        *events.borrow(),
        vec![Event::Nmi(NmiEvent {
            return_pc: 0x0001,
            vector: 0x0066,
            ticks: 11,
        })]
    );
}

#[test]
fn ignored_int_is_silent() {
    let (mut cpu, events) = traced_cpu(&[0x00]);
    cpu.raise(Signals::INT);
    cpu.step();
    assert!(events.borrow().is_empty());
}
