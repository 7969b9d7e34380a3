//! Fault taxonomy and halt causes.
//!
//! A fault aborts the run loop but leaves all processor state intact so
//! the grader can dump registers and memory afterwards. Every fault
//! carries the PC and the 32-bit instruction word it was raised under;
//! `Display` renders the short diagnostic string that `get_error()`
//! reports.

use std::fmt;

use crate::memory::AccessError;

/// Why a run stopped. Exactly one cause is set once the loop is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltCause {
    /// The program executed `break` (or an MMIO callback raised the halt
    /// line).
    Break,
    /// Decode or execute raised a [`Fault`].
    Fault,
    /// The instruction ceiling was reached without `break`.
    Ceiling,
}

/// The ways an MMIO access can violate the register protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmioViolation {
    /// Load from an address registered with a write-only handler.
    ReadFromWriteOnly,
    /// Store to an address registered with a read-only handler.
    WriteToReadOnly,
    /// Byte or halfword access inside a registered MMIO word.
    SubWordAccess,
}

impl fmt::Display for MmioViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFromWriteOnly => write!(f, "read from a write-only MMIO register"),
            Self::WriteToReadOnly => write!(f, "write to a read-only MMIO register"),
            Self::SubWordAccess => write!(f, "sub-word access to an MMIO register"),
        }
    }
}

/// An execution fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// No implemented encoding matches the fetched word.
    UnknownOpcode { pc: u32, word: u32 },
    /// Word or halfword access to an address that is not suitably
    /// aligned. `size` is the access width in bytes; `addr` is the
    /// offending address (the PC itself for a misaligned fetch).
    Misaligned {
        pc: u32,
        word: u32,
        addr: u32,
        size: u8,
    },
    /// An access at `addr` broke the MMIO register protocol.
    MmioProtocol {
        pc: u32,
        word: u32,
        addr: u32,
        violation: MmioViolation,
    },
}

impl Fault {
    /// Attach the faulting instruction's context to a memory-level error.
    #[must_use]
    pub fn from_access(pc: u32, word: u32, err: AccessError) -> Self {
        match err {
            AccessError::Misaligned { addr, size } => Self::Misaligned {
                pc,
                word,
                addr,
                size,
            },
            AccessError::Mmio { addr, violation } => Self::MmioProtocol {
                pc,
                word,
                addr,
                violation,
            },
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { pc, word } => write!(
                f,
                "Error at pc=0x{pc:08x} (instruction 0x{word:08x}): unknown opcode"
            ),
            Self::Misaligned {
                pc,
                word,
                addr,
                size,
            } => write!(
                f,
                "Error at pc=0x{pc:08x} (instruction 0x{word:08x}): \
                 misaligned {size}-byte access at 0x{addr:08x}"
            ),
            Self::MmioProtocol {
                pc,
                word,
                addr,
                violation,
            } => write!(
                f,
                "Error at pc=0x{pc:08x} (instruction 0x{word:08x}): \
                 {violation} at 0x{addr:08x}"
            ),
        }
    }
}

impl std::error::Error for Fault {}
