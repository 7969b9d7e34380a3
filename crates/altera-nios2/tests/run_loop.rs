//! Run-loop, reset, fault, and halt-line behavior.
//!
//! Exercises the execution-state invariants: retirement counting, halt
//! causes, reset idempotence, the branch-offset law, and the error
//! strings graders embed in feedback.

use std::cell::Cell;
use std::rc::Rc;

use altera_nios2::{
    Fault, HaltCause, MmioHandler, Nios2, SP, TOP_OF_STACK, encode,
};
use format_objimg::ImageBuilder;

fn cpu_from_words(words: &[u32]) -> Nios2 {
    let image = ImageBuilder::new()
        .words(0, words)
        .symbol("_start", 0)
        .build()
        .expect("test image is well-formed");
    Nios2::new(image)
}

#[test]
fn reset_installs_stack_and_entry() {
    let image = ImageBuilder::new()
        .words(0x40, &[encode::brk()])
        .symbol("_start", 0x40)
        .build()
        .expect("image");
    let cpu = Nios2::new(image);

    assert_eq!(cpu.get_pc(), 0x40, "pc starts at _start");
    assert_eq!(cpu.get_reg(SP), TOP_OF_STACK);
    assert_eq!(cpu.get_reg(0), 0);
}

#[test]
fn reset_is_idempotent_and_restores_image_bytes() {
    let mut cpu = cpu_from_words(&[encode::movi(4, 7), encode::stw(4, 0, 5), encode::brk()]);
    cpu.set_reg(5, 0x100);
    cpu.run_until_halted(100);
    assert_eq!(cpu.loadword(0x100), 7);

    cpu.reset();
    let first: Vec<u32> = (0..8).map(|r| cpu.get_reg(r)).collect();
    let pc1 = cpu.get_pc();
    cpu.reset();
    let second: Vec<u32> = (0..8).map(|r| cpu.get_reg(r)).collect();

    assert_eq!(first, second, "back-to-back resets agree");
    assert_eq!(pc1, cpu.get_pc());
    assert_eq!(cpu.loadword(0x100), 0, "stores are rolled back to the image");
    assert_eq!(cpu.loadword(0), encode::movi(4, 7), "code bytes restored");
    assert_eq!(cpu.instruction_count(), 0);
    assert!(!cpu.is_halted());
}

#[test]
fn raw_word_access_round_trips_little_endian() {
    let mut cpu = cpu_from_words(&[encode::brk()]);
    cpu.storeword(0x0800, 0xDEAD_BEEF);
    assert_eq!(cpu.loadword(0x0800), 0xDEAD_BEEF);
    // unmapped reads are zero, never faults
    assert_eq!(cpu.loadword(0xFFFF_0000), 0);
}

#[test]
fn symbol_word_access() {
    let image = ImageBuilder::new()
        .words(0, &[encode::brk()])
        .words(0x1000, &[0, 0, 0])
        .symbol("_start", 0)
        .symbol("ARR", 0x1004)
        .build()
        .expect("image");
    let mut cpu = Nios2::new(image);

    cpu.write_symbol_word("ARR", 55, 4).expect("known symbol");
    assert_eq!(cpu.get_symbol_word("ARR", 4).expect("known symbol"), 55);
    assert_eq!(cpu.loadword(0x1008), 55);

    let err = cpu.get_symbol_word("MISSING", 0).expect_err("unknown symbol");
    assert_eq!(err.to_string(), "symbol MISSING not found in the image");
}

// ---------------------------------------------------------------------------
// Branch-offset law: offsets are relative to the next instruction
// ---------------------------------------------------------------------------

#[test]
fn br_zero_falls_through_to_its_successor() {
    // If offsets were (incorrectly) relative to the branch itself,
    // `br 0` would spin forever and this would hit the ceiling.
    let mut cpu = cpu_from_words(&[encode::br(0), encode::brk()]);
    let count = cpu.run_until_halted(1_000);

    assert_eq!(cpu.halt_cause(), Some(HaltCause::Break));
    assert_eq!(count, 2, "br and break retire");
}

#[test]
fn self_branch_spins_until_the_ceiling() {
    // br -4: target = pc+4-4 = its own address
    let mut cpu = cpu_from_words(&[encode::br(-4)]);
    let count = cpu.run_until_halted(500);

    assert_eq!(cpu.halt_cause(), Some(HaltCause::Ceiling));
    assert_eq!(count, 500, "count stops exactly at the cap");
    let err = cpu.get_error().expect("ceiling is reported");
    assert!(err.contains("ceiling"), "unexpected error text: {err}");
}

#[test]
fn ceiling_then_resume_is_not_a_thing_but_rerun_after_reset_is() {
    let mut cpu = cpu_from_words(&[encode::br(-4)]);
    cpu.run_until_halted(10);
    assert_eq!(cpu.run_until_halted(10), 10, "halted run returns at once");

    cpu.reset();
    assert_eq!(cpu.run_until_halted(25), 25, "fresh cap after reset");
}

// ---------------------------------------------------------------------------
// Faults
// ---------------------------------------------------------------------------

#[test]
fn misaligned_word_load_faults_with_context() {
    let mut cpu = cpu_from_words(&[
        encode::movi(4, 0x102),
        encode::ldw(10, 0, 4), // at pc=0x04
    ]);
    let count = cpu.run_until_halted(100);

    assert_eq!(cpu.halt_cause(), Some(HaltCause::Fault));
    assert_eq!(count, 1, "the faulting instruction does not retire");
    assert!(matches!(
        cpu.fault(),
        Some(Fault::Misaligned {
            pc: 4,
            addr: 0x102,
            size: 4,
            ..
        })
    ));
    let err = cpu.get_error().expect("fault is reported");
    assert!(
        err.contains("pc=0x00000004") && err.contains("0x00000102"),
        "error names the pc and the address: {err}"
    );
}

#[test]
fn unknown_opcode_faults_and_state_survives() {
    // div r2, r3, r4 is outside the implemented subset
    let div = (3u32 << 27) | (4 << 22) | (2 << 17) | (0x25 << 11) | 0x3a;
    let image = ImageBuilder::new()
        .words(0, &[encode::movi(9, 77), div])
        .symbol("_start", 0)
        .build()
        .expect("image");
    let mut cpu = Nios2::new(image);
    cpu.run_until_halted(100);

    assert_eq!(cpu.halt_cause(), Some(HaltCause::Fault));
    assert!(matches!(
        cpu.fault(),
        Some(Fault::UnknownOpcode { pc: 4, .. })
    ));
    assert_eq!(cpu.get_reg(9), 77, "register state is retained for dumps");
    let err = cpu.get_error().expect("fault is reported");
    assert!(err.contains("unknown opcode"), "{err}");
}

#[test]
fn misaligned_fetch_faults() {
    let mut cpu = cpu_from_words(&[encode::movi(4, 0x0a), encode::jmp(4)]);
    cpu.run_until_halted(100);

    assert_eq!(cpu.halt_cause(), Some(HaltCause::Fault));
    assert!(matches!(
        cpu.fault(),
        Some(Fault::Misaligned { addr: 0x0a, .. })
    ));
}

#[test]
fn mmio_protocol_faults() {
    // write to a read-only device register
    let mut cpu = cpu_from_words(&[encode::stw(5, 0, 4)]);
    cpu.add_mmio(0xFF20_0040, MmioHandler::ReadOnly(Box::new(|| 0)));
    cpu.set_reg(4, 0xFF20_0040);
    cpu.run_until_halted(100);
    assert_eq!(cpu.halt_cause(), Some(HaltCause::Fault));
    let err = cpu.get_error().expect("fault");
    assert!(err.contains("read-only"), "{err}");

    // halfword access inside a device word
    let mut cpu = cpu_from_words(&[encode::ldhu(10, 2, 4)]);
    cpu.add_mmio(0xFF20_0000, MmioHandler::WriteOnly(Box::new(|_| ())));
    cpu.set_reg(4, 0xFF20_0000);
    cpu.run_until_halted(100);
    assert!(matches!(
        cpu.fault(),
        Some(Fault::MmioProtocol { addr: 0xFF20_0002, .. })
    ));
}

// ---------------------------------------------------------------------------
// Halt line
// ---------------------------------------------------------------------------

#[test]
fn mmio_callback_halts_at_the_retirement_boundary() {
    // The program stores to the device in a tight loop; the device
    // raises the halt line on the third write. The store that triggered
    // the halt still retires.
    let mut cpu = cpu_from_words(&[
        encode::addi(5, 5, 1),   // 0x00
        encode::stwio(5, 0, 4),  // 0x04
        encode::br(-12),         // 0x08 -> 0x00
    ]);
    let halt = cpu.halt_line();
    let writes = Rc::new(Cell::new(0u32));
    let writes_in = Rc::clone(&writes);
    cpu.add_mmio(
        0xFF20_0000,
        MmioHandler::WriteOnly(Box::new(move |_| {
            writes_in.set(writes_in.get() + 1);
            if writes_in.get() == 3 {
                halt.raise();
            }
        })),
    );
    cpu.set_reg(4, 0xFF20_0000);
    let count = cpu.run_until_halted(1_000);

    assert_eq!(cpu.halt_cause(), Some(HaltCause::Break));
    assert_eq!(cpu.get_error(), None, "a requested halt is not an error");
    assert_eq!(writes.get(), 3);
    assert_eq!(count, 8, "two full loop turns plus addi and the final store");
    assert_eq!(cpu.get_reg(5), 3);
}

#[test]
fn halt_before_run_stops_immediately() {
    let mut cpu = cpu_from_words(&[encode::br(-4)]);
    cpu.halt();
    let count = cpu.run_until_halted(1_000);

    assert_eq!(count, 0);
    assert_eq!(cpu.halt_cause(), Some(HaltCause::Break));
}

#[test]
fn r0_stays_zero_across_a_whole_run() {
    // A program that tries hard to dirty r0, sampled at the end; the
    // per-write invariant is covered in the instruction tests.
    let mut cpu = cpu_from_words(&[
        encode::movi(0, 1),
        encode::orhi(0, 0, 0xFFFF),
        encode::add(0, 4, 4),
        encode::brk(),
    ]);
    cpu.set_reg(4, 0x8000_0000);
    cpu.run_until_halted(100);
    assert_eq!(cpu.get_reg(0), 0);
}

#[test]
fn dumps_render_after_a_fault() {
    let image = ImageBuilder::new()
        .words(0, &[encode::movi(4, 0x101), encode::ldw(2, 0, 4)])
        .symbol("_start", 0)
        .symbol("DATA", 0x100)
        .build()
        .expect("image");
    let mut cpu = Nios2::new(image);
    cpu.run_until_halted(100);

    let mem = cpu.dump_mem(0, 0x20);
    assert!(mem.lines().count() == 2, "two 16-byte rows");
    let symbols = cpu.dump_symbols();
    assert!(symbols.contains("_start = 0x00000000"));
    assert!(symbols.contains("DATA = 0x00000100"));
    let stack = cpu.dump_stack();
    assert!(!stack.is_empty(), "sp is at the sentinel, window below it");
}
