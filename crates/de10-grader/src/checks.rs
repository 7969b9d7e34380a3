//! Per-exercise checkers.
//!
//! A checker takes the submitted object image, drives the simulator
//! through the exercise's test cases, and produces a [`Verdict`]:
//! pass/fail, accumulated feedback text, and optional extra detail.
//! Failures append the diagnostic block (error string, memory dump,
//! symbol table, optionally the stack window) so a learner can see what
//! their program actually did.
//!
//! Test vectors match the course's grading battery exactly.

use std::fmt::Write as _;

use altera_nios2::{FP, Nios2, SP};
use format_objimg::ObjectImage;

use crate::drivers::{AdderDriver, LED_ADDR, LED_MASK, MmioReg, SWITCH_ADDR};

/// Outcome of grading one submission against one exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub feedback: String,
    pub extra: Option<String>,
}

impl Verdict {
    fn pass(feedback: String) -> Self {
        Self {
            passed: true,
            feedback,
            extra: None,
        }
    }

    fn fail(feedback: String) -> Self {
        Self {
            passed: false,
            feedback,
            extra: None,
        }
    }
}

/// Check that every symbol the exercise relies on is present.
fn require_symbols(image: &ObjectImage, names: &[&str]) -> Result<(), String> {
    for name in names {
        if image.symbol(name).is_none() {
            return Err(format!(
                "{name} not found in memory (did you enter any instructions?)"
            ));
        }
    }
    Ok(())
}

/// The diagnostic block appended to failing feedback: the error (if
/// any), a memory dump, the symbol table, and optionally the stack
/// window under `sp`.
fn debug_text(cpu: &Nios2, mem_len: u32, show_stack: bool) -> String {
    let mut out = String::from("\n");
    if let Some(err) = cpu.get_error() {
        out.push_str(&err);
        out.push('\n');
    }
    out.push_str("\nMemory:\n");
    out.push_str(&cpu.dump_mem(0, mem_len));
    out.push_str("\nSymbols:\n");
    out.push_str(&cpu.dump_symbols());
    if show_stack {
        let _ = write!(
            out,
            "\nStack:\nsp = 0x{:08x}\nfp = 0x{:08x}\n\n",
            cpu.get_reg(SP),
            cpu.get_reg(FP),
        );
        out.push_str(&cpu.dump_stack());
    }
    out
}

/// find-min: lowest signed word of `ARR[0..N]` written to `MIN`.
pub fn check_find_min(image: &ObjectImage) -> Verdict {
    let mut feedback = String::new();
    if let Err(msg) = require_symbols(image, &["MIN", "N", "ARR"]) {
        return Verdict::fail(msg);
    }

    let cases: [(&[i32], i32); 2] = [(&[5, 3, 9, 2], 2), (&[5, -8, 1, 12, 6], -8)];

    let mut cpu = Nios2::new(image.clone());
    for (index, (arr, ans)) in cases.iter().enumerate() {
        cpu.reset();
        for (i, value) in arr.iter().enumerate() {
            cpu.write_symbol_word("ARR", *value as u32, (i * 4) as u32)
                .expect("presence checked by require_symbols");
        }
        cpu.write_symbol_word("N", arr.len() as u32, 0)
            .expect("presence checked by require_symbols");

        cpu.run_until_halted(10_000);

        let theirs = cpu
            .get_symbol_word("MIN", 0)
            .expect("presence checked by require_symbols") as i32;
        if theirs != *ans {
            let _ = write!(
                feedback,
                "Failed test case {}: MIN should be {} (0x{:08x}) for ARR {:?}. \
                 Your code produced MIN=0x{:08x}",
                index + 1,
                ans,
                *ans as u32,
                arr,
                theirs as u32,
            );
            feedback.push_str(&debug_text(&cpu, 0x100, false));
            return Verdict::fail(feedback);
        }
        let _ = writeln!(feedback, "Passed test case {}", index + 1);
    }
    Verdict::pass(feedback)
}

/// sum-array: sum of the positive words of `ARR[0..N]` written to `SUM`.
pub fn check_array_sum(image: &ObjectImage) -> Verdict {
    let mut feedback = String::new();
    if let Err(msg) = require_symbols(image, &["SUM", "N", "ARR"]) {
        return Verdict::fail(msg);
    }

    let cases: [(&[i32], u32); 3] = [
        (&[5, 3, 9, 2], 19),
        (&[5, -8, 1, 12, 6], 24),
        (&[1, -8, -1, 0, 1, 1], 3),
    ];

    let mut cpu = Nios2::new(image.clone());
    for (index, (arr, ans)) in cases.iter().enumerate() {
        cpu.reset();
        for (i, value) in arr.iter().enumerate() {
            cpu.write_symbol_word("ARR", *value as u32, (i * 4) as u32)
                .expect("presence checked by require_symbols");
        }
        cpu.write_symbol_word("N", arr.len() as u32, 0)
            .expect("presence checked by require_symbols");

        cpu.run_until_halted(10_000);

        let theirs = cpu
            .get_symbol_word("SUM", 0)
            .expect("presence checked by require_symbols");
        if theirs != *ans {
            let _ = write!(
                feedback,
                "Failed test case {}: SUM should be {} (0x{:08x}) for ARR {:?}. \
                 Your code produced SUM=0x{:08x}",
                index + 1,
                ans,
                ans,
                arr,
                theirs,
            );
            feedback.push_str(&debug_text(&cpu, 0x100, false));
            return Verdict::fail(feedback);
        }
        let _ = writeln!(feedback, "Passed test case {}", index + 1);
    }
    Verdict::pass(feedback)
}

/// led-on: all ten LEDs driven high.
pub fn check_led_on(image: &ObjectImage) -> Verdict {
    let mut feedback = String::new();
    let mut cpu = Nios2::new(image.clone());

    let leds = MmioReg::new(0);
    cpu.add_mmio(LED_ADDR, leds.handler());

    cpu.run_until_halted(1_000_000);

    if leds.load() & LED_MASK != LED_MASK {
        let _ = write!(
            feedback,
            "Failed test case 1: LEDs are set to {:#012b} (should be {:#012b})",
            leds.load() & LED_MASK,
            LED_MASK,
        );
        feedback.push_str(&debug_text(&cpu, 0x100, false));
        return Verdict::fail(feedback);
    }
    Verdict::pass("Passed test case 1\n".to_string())
}

/// proj1: LEDs must show the sum of the two 5-bit switch operands.
pub fn check_adder(image: &ObjectImage) -> Verdict {
    let cases = vec![
        (0, 0),
        (0b00_0010_0001, 2),
        (0b00_0110_0010, 5),
        (0b10_1110_1110, 37),
        (0b11_1111_1111, 62),
        (0b11_1101_1111, 61),
        (0b00_0011_1111, 32),
    ];

    let mut cpu = Nios2::new(image.clone());
    let driver = AdderDriver::new(cases, cpu.halt_line());
    cpu.add_mmio(LED_ADDR, driver.led_handler());
    cpu.add_mmio(SWITCH_ADDR, driver.switch_handler());

    cpu.run_until_halted(10_000);

    let mut feedback = String::new();
    if let Some(err) = cpu.get_error() {
        feedback.push_str(&err);
        feedback.push('\n');
    }
    feedback.push_str(&driver.feedback());
    if driver.case_failed() {
        feedback.push_str(&debug_text(&cpu, 0x100, false));
    }

    let extra = format!("Passed {} of {}", driver.passed(), driver.total());
    Verdict {
        passed: driver.all_passed(),
        feedback,
        extra: Some(extra),
    }
}

/// list-sum: sum of `value` fields along the `next` chain from `HEAD`.
pub fn check_list_sum(image: &ObjectImage) -> Verdict {
    let mut feedback = String::new();
    if let Err(msg) = require_symbols(image, &["SUM", "HEAD"]) {
        return Verdict::fail(msg);
    }
    let head_addr = image.symbol("HEAD").unwrap_or(0);

    let cases: [(&[i32], i32); 3] = [
        (&[3, 2, 1], 6),
        (&[1, 0, 4], 5),
        (&[-1, 2, 15, 8, 6], 30),
    ];

    let mut cpu = Nios2::new(image.clone());
    for (index, (values, ans)) in cases.iter().enumerate() {
        cpu.reset();
        // Nodes are (next, value) pairs 8 bytes apart, starting at
        // HEAD; the last node's next pointer is null.
        for (i, value) in values.iter().enumerate() {
            let next_ptr = if i == values.len() - 1 {
                0
            } else {
                head_addr + (i as u32 + 1) * 8
            };
            cpu.storeword(head_addr + i as u32 * 8, next_ptr);
            cpu.storeword(head_addr + i as u32 * 8 + 4, *value as u32);
        }

        cpu.run_until_halted(1_000_000);

        let theirs = cpu
            .get_symbol_word("SUM", 0)
            .expect("presence checked by require_symbols") as i32;
        if theirs != *ans {
            let _ = write!(
                feedback,
                "Failed test case {}: SUM was {} (0x{:08x}), should be {} (0x{:08x})",
                index + 1,
                theirs,
                theirs as u32,
                ans,
                *ans as u32,
            );
            feedback.push_str(&debug_text(&cpu, 0x100, false));
            return Verdict::fail(feedback);
        }
        let _ = writeln!(feedback, "Passed test case {}", index + 1);
    }
    Verdict::pass(feedback)
}

/// fibonacci: `F = fib(N)` computed with a real call/ret and stack.
pub fn check_fib(image: &ObjectImage) -> Verdict {
    let mut feedback = String::new();
    if let Err(msg) = require_symbols(image, &["N", "F"]) {
        return Verdict::fail(msg);
    }

    let cases = [(10, 55), (15, 610), (12, 144), (30, 832_040)];

    let mut cpu = Nios2::new(image.clone());
    for (index, (n, ans)) in cases.iter().enumerate() {
        cpu.reset();
        cpu.write_symbol_word("N", *n, 0)
            .expect("presence checked by require_symbols");

        cpu.run_until_halted(100_000_000);

        let theirs = cpu
            .get_symbol_word("F", 0)
            .expect("presence checked by require_symbols");
        if theirs != *ans {
            let _ = write!(
                feedback,
                "Failed test case {}: fib({n}) returned {theirs}, \
                 should have returned {ans}",
                index + 1,
            );
            feedback.push_str(&debug_text(&cpu, 0x100, true));
            return Verdict::fail(feedback);
        }
        let _ = writeln!(feedback, "Passed test case {}", index + 1);
    }
    Verdict::pass(feedback)
}

/// sort: `SORT[0..N]` sorted ascending in place.
pub fn check_sort(image: &ObjectImage) -> Verdict {
    let mut feedback = String::new();
    if let Err(msg) = require_symbols(image, &["N", "SORT"]) {
        return Verdict::fail(msg);
    }

    let cases: [&[i32]; 5] = [
        &[5, 4, 3, 2, 1],
        &[5, 4, 2, 3, 1],
        &[2, 8, 3, 9, 15, 10],
        &[8, -1, 11, 14, 12, 14, 0],
        &[
            9, -2, 5, 0, -2, 0, -1, -4, 1, 9, 10, 6, -3, 7, 5, 10, 9, -2, 2, 9, 0, 3,
            -3, 7, 7, 6, -5, -2, -1, -4,
        ],
    ];

    let mut cpu = Nios2::new(image.clone());
    let mut total_instructions = 0u64;
    for (index, values) in cases.iter().enumerate() {
        cpu.reset();
        let mut expected = values.to_vec();
        expected.sort_unstable();
        cpu.write_symbol_word("N", values.len() as u32, 0)
            .expect("presence checked by require_symbols");
        for (i, value) in values.iter().enumerate() {
            cpu.write_symbol_word("SORT", *value as u32, (i * 4) as u32)
                .expect("presence checked by require_symbols");
        }

        total_instructions += cpu.run_until_halted(100_000_000);

        let theirs: Vec<i32> = (0..values.len())
            .map(|i| {
                cpu.get_symbol_word("SORT", (i * 4) as u32)
                    .expect("presence checked by require_symbols") as i32
            })
            .collect();
        if theirs != expected {
            let _ = write!(
                feedback,
                "Failed test case {}: Sorting {:?}\nCode provided: {:?}\nCorrect answer: {:?}",
                index + 1,
                values,
                theirs,
                expected,
            );
            feedback.push_str(&debug_text(&cpu, 0x100, false));
            return Verdict::fail(feedback);
        }
        let _ = writeln!(feedback, "Passed test case {}", index + 1);
    }

    Verdict {
        passed: true,
        feedback,
        extra: Some(format!("{total_instructions} total instructions")),
    }
}
