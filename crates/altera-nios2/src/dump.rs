//! Diagnostic dumps: memory, symbol table, stack window.
//!
//! All output is plain text for embedding in grader feedback. Memory
//! rows are 16 bytes: address, hex bytes, then the printable-ASCII
//! gutter.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::memory::Memory;
use crate::registers::{Registers, SP, TOP_OF_STACK};

/// Render `len` bytes starting at `start`, 16 per row.
#[must_use]
pub fn dump_mem(mem: &Memory, start: u32, len: u32) -> String {
    let mut out = String::new();
    let mut row = start;
    let end = u64::from(start) + u64::from(len);
    while u64::from(row) < end {
        let row_len = (end - u64::from(row)).min(16) as u32;
        let _ = write!(out, "{row:08x}  ");
        for i in 0..16 {
            if i < row_len {
                let _ = write!(out, "{:02x} ", mem.peek_byte(row.wrapping_add(i)));
            } else {
                out.push_str("   ");
            }
            if i == 7 {
                out.push(' ');
            }
        }
        out.push_str(" |");
        for i in 0..row_len {
            let byte = mem.peek_byte(row.wrapping_add(i));
            out.push(if (0x20..0x7f).contains(&byte) {
                byte as char
            } else {
                '.'
            });
        }
        out.push_str("|\n");
        match row.checked_add(16) {
            Some(next) => row = next,
            None => break,
        }
    }
    out
}

/// Render the symbol table, one `name = address` line per symbol,
/// sorted by address.
#[must_use]
pub fn dump_symbols(symbols: &BTreeMap<String, u32>) -> String {
    let mut entries: Vec<(&String, u32)> = symbols.iter().map(|(n, &a)| (n, a)).collect();
    entries.sort_by(|x, y| x.1.cmp(&y.1).then_with(|| x.0.cmp(y.0)));

    let mut out = String::new();
    for (name, addr) in entries {
        let _ = writeln!(out, "{name} = 0x{addr:08x}");
    }
    out
}

/// Render the active stack window: from `sp - 0x80` upward, at most
/// 0x100 bytes, clipped at the top-of-stack sentinel.
#[must_use]
pub fn dump_stack(mem: &Memory, regs: &Registers) -> String {
    let sp = regs.get(SP);
    let start = sp.wrapping_sub(0x80);
    if start >= TOP_OF_STACK {
        return String::new();
    }
    let len = (TOP_OF_STACK - start).min(0x100);
    dump_mem(mem, start, len)
}
