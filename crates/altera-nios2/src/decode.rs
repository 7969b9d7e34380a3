//! Instruction decoder.
//!
//! Decodes a fetched 32-bit word into one tagged variant per mnemonic.
//! The three Nios II formats share the OP field in bits [5:0]:
//!
//! - R-type (`OP=0x3a`): `A` [31:27], `B` [26:22], `C` [21:17],
//!   OPX [16:11], IMM5 [10:6].
//! - I-type: `A` [31:27], `B` [26:22], IMM16 [21:6]. Whether IMM16 is
//!   sign- or zero-extended is per-instruction and handled at execute.
//! - J-type (`call`, `jmpi`): IMM26 [31:6].
//!
//! Decode is total and never panics: anything outside the implemented
//! subset (the `div` family, cache management, control-register moves,
//! `custom`, ...) returns `None` and the CPU reports an unknown-opcode
//! fault. Assembler pseudo-instructions (`mov*`, `movia`, the swapped
//! comparison/branch forms) never reach the decoder; the toolchain
//! materializes them as the primitives below.

use crate::opcodes::*;

/// A decoded instruction. `imm` fields hold the raw IMM16 bits; sign
/// extension happens in the executor where the semantics demand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    // R-type arithmetic/logical
    Add { a: u8, b: u8, c: u8 },
    Sub { a: u8, b: u8, c: u8 },
    Mul { a: u8, b: u8, c: u8 },
    And { a: u8, b: u8, c: u8 },
    Or { a: u8, b: u8, c: u8 },
    Xor { a: u8, b: u8, c: u8 },
    Nor { a: u8, b: u8, c: u8 },
    // R-type comparisons
    Cmpeq { a: u8, b: u8, c: u8 },
    Cmpne { a: u8, b: u8, c: u8 },
    Cmpge { a: u8, b: u8, c: u8 },
    Cmpgeu { a: u8, b: u8, c: u8 },
    Cmplt { a: u8, b: u8, c: u8 },
    Cmpltu { a: u8, b: u8, c: u8 },
    // Shifts and rotates
    Sll { a: u8, b: u8, c: u8 },
    Srl { a: u8, b: u8, c: u8 },
    Sra { a: u8, b: u8, c: u8 },
    Rol { a: u8, b: u8, c: u8 },
    Ror { a: u8, b: u8, c: u8 },
    Slli { a: u8, c: u8, shift: u8 },
    Srli { a: u8, c: u8, shift: u8 },
    Srai { a: u8, c: u8, shift: u8 },
    Roli { a: u8, c: u8, shift: u8 },
    // R-type control
    Jmp { a: u8 },
    Callr { a: u8 },
    Ret,
    Nextpc { c: u8 },
    Break,
    // I-type arithmetic/logical
    Addi { a: u8, b: u8, imm: u16 },
    Muli { a: u8, b: u8, imm: u16 },
    Andi { a: u8, b: u8, imm: u16 },
    Ori { a: u8, b: u8, imm: u16 },
    Xori { a: u8, b: u8, imm: u16 },
    Andhi { a: u8, b: u8, imm: u16 },
    Orhi { a: u8, b: u8, imm: u16 },
    Xorhi { a: u8, b: u8, imm: u16 },
    // I-type comparisons
    Cmpeqi { a: u8, b: u8, imm: u16 },
    Cmpnei { a: u8, b: u8, imm: u16 },
    Cmpgei { a: u8, b: u8, imm: u16 },
    Cmpgeui { a: u8, b: u8, imm: u16 },
    Cmplti { a: u8, b: u8, imm: u16 },
    Cmpltui { a: u8, b: u8, imm: u16 },
    // Loads and stores (the `*io` forms are semantically identical
    // here: with no cache in the model, both paths consult MMIO)
    Ldw { a: u8, b: u8, imm: u16 },
    Ldh { a: u8, b: u8, imm: u16 },
    Ldhu { a: u8, b: u8, imm: u16 },
    Ldb { a: u8, b: u8, imm: u16 },
    Ldbu { a: u8, b: u8, imm: u16 },
    Stw { a: u8, b: u8, imm: u16 },
    Sth { a: u8, b: u8, imm: u16 },
    Stb { a: u8, b: u8, imm: u16 },
    Ldwio { a: u8, b: u8, imm: u16 },
    Ldhio { a: u8, b: u8, imm: u16 },
    Ldhuio { a: u8, b: u8, imm: u16 },
    Ldbio { a: u8, b: u8, imm: u16 },
    Ldbuio { a: u8, b: u8, imm: u16 },
    Stwio { a: u8, b: u8, imm: u16 },
    Sthio { a: u8, b: u8, imm: u16 },
    Stbio { a: u8, b: u8, imm: u16 },
    // Branches (IMM16 is a byte offset from the next instruction)
    Br { imm: u16 },
    Beq { a: u8, b: u8, imm: u16 },
    Bne { a: u8, b: u8, imm: u16 },
    Bge { a: u8, b: u8, imm: u16 },
    Bgeu { a: u8, b: u8, imm: u16 },
    Blt { a: u8, b: u8, imm: u16 },
    Bltu { a: u8, b: u8, imm: u16 },
    // J-type
    Call { imm26: u32 },
    Jmpi { imm26: u32 },
}

/// Decode one instruction word. Returns `None` for anything outside the
/// implemented subset.
#[must_use]
pub fn decode(word: u32) -> Option<Instr> {
    let a = ((word >> 27) & 0x1f) as u8;
    let b = ((word >> 22) & 0x1f) as u8;
    let imm = ((word >> 6) & 0xffff) as u16;
    let imm26 = (word >> 6) & 0x03ff_ffff;

    Some(match word & 0x3f {
        OP_CALL => Instr::Call { imm26 },
        OP_JMPI => Instr::Jmpi { imm26 },
        OP_ADDI => Instr::Addi { a, b, imm },
        OP_MULI => Instr::Muli { a, b, imm },
        OP_ANDI => Instr::Andi { a, b, imm },
        OP_ORI => Instr::Ori { a, b, imm },
        OP_XORI => Instr::Xori { a, b, imm },
        OP_ANDHI => Instr::Andhi { a, b, imm },
        OP_ORHI => Instr::Orhi { a, b, imm },
        OP_XORHI => Instr::Xorhi { a, b, imm },
        OP_CMPEQI => Instr::Cmpeqi { a, b, imm },
        OP_CMPNEI => Instr::Cmpnei { a, b, imm },
        OP_CMPGEI => Instr::Cmpgei { a, b, imm },
        OP_CMPGEUI => Instr::Cmpgeui { a, b, imm },
        OP_CMPLTI => Instr::Cmplti { a, b, imm },
        OP_CMPLTUI => Instr::Cmpltui { a, b, imm },
        OP_LDW => Instr::Ldw { a, b, imm },
        OP_LDH => Instr::Ldh { a, b, imm },
        OP_LDHU => Instr::Ldhu { a, b, imm },
        OP_LDB => Instr::Ldb { a, b, imm },
        OP_LDBU => Instr::Ldbu { a, b, imm },
        OP_STW => Instr::Stw { a, b, imm },
        OP_STH => Instr::Sth { a, b, imm },
        OP_STB => Instr::Stb { a, b, imm },
        OP_LDWIO => Instr::Ldwio { a, b, imm },
        OP_LDHIO => Instr::Ldhio { a, b, imm },
        OP_LDHUIO => Instr::Ldhuio { a, b, imm },
        OP_LDBIO => Instr::Ldbio { a, b, imm },
        OP_LDBUIO => Instr::Ldbuio { a, b, imm },
        OP_STWIO => Instr::Stwio { a, b, imm },
        OP_STHIO => Instr::Sthio { a, b, imm },
        OP_STBIO => Instr::Stbio { a, b, imm },
        OP_BR => Instr::Br { imm },
        OP_BEQ => Instr::Beq { a, b, imm },
        OP_BNE => Instr::Bne { a, b, imm },
        OP_BGE => Instr::Bge { a, b, imm },
        OP_BGEU => Instr::Bgeu { a, b, imm },
        OP_BLT => Instr::Blt { a, b, imm },
        OP_BLTU => Instr::Bltu { a, b, imm },
        OP_RTYPE => {
            let c = ((word >> 17) & 0x1f) as u8;
            let shift = ((word >> 6) & 0x1f) as u8;
            match (word >> 11) & 0x3f {
                OPX_ADD => Instr::Add { a, b, c },
                OPX_SUB => Instr::Sub { a, b, c },
                OPX_MUL => Instr::Mul { a, b, c },
                OPX_AND => Instr::And { a, b, c },
                OPX_OR => Instr::Or { a, b, c },
                OPX_XOR => Instr::Xor { a, b, c },
                OPX_NOR => Instr::Nor { a, b, c },
                OPX_CMPEQ => Instr::Cmpeq { a, b, c },
                OPX_CMPNE => Instr::Cmpne { a, b, c },
                OPX_CMPGE => Instr::Cmpge { a, b, c },
                OPX_CMPGEU => Instr::Cmpgeu { a, b, c },
                OPX_CMPLT => Instr::Cmplt { a, b, c },
                OPX_CMPLTU => Instr::Cmpltu { a, b, c },
                OPX_SLL => Instr::Sll { a, b, c },
                OPX_SRL => Instr::Srl { a, b, c },
                OPX_SRA => Instr::Sra { a, b, c },
                OPX_ROL => Instr::Rol { a, b, c },
                OPX_ROR => Instr::Ror { a, b, c },
                OPX_SLLI => Instr::Slli { a, c, shift },
                OPX_SRLI => Instr::Srli { a, c, shift },
                OPX_SRAI => Instr::Srai { a, c, shift },
                OPX_ROLI => Instr::Roli { a, c, shift },
                OPX_JMP => Instr::Jmp { a },
                OPX_CALLR => Instr::Callr { a },
                OPX_RET => Instr::Ret,
                OPX_NEXTPC => Instr::Nextpc { c },
                OPX_BREAK => Instr::Break,
                _ => return None,
            }
        }
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_gas_encodings() {
        // Encodings checked against nios2-elf-objdump output.
        assert_eq!(decode(0xf800_283a), Some(Instr::Ret)); // ret
        assert_eq!(decode(0x003d_a03a), Some(Instr::Break)); // break
        assert_eq!(
            decode(0x0001_883a),
            Some(Instr::Add { a: 0, b: 0, c: 0 })
        ); // nop = add r0, r0, r0
        assert_eq!(
            decode(0x0080_0144),
            Some(Instr::Addi { a: 0, b: 2, imm: 5 })
        ); // movi r2, 5
    }

    #[test]
    fn rtype_field_extraction() {
        // add r6, r4, r5: A=4 B=5 C=6 OPX=0x31
        let word = (4 << 27) | (5 << 22) | (6 << 17) | (0x31 << 11) | 0x3a;
        assert_eq!(decode(word), Some(Instr::Add { a: 4, b: 5, c: 6 }));

        // srai r2, r3, 31: shift lives in IMM5
        let word = (3 << 27) | (2 << 17) | (0x3a << 11) | (31 << 6) | 0x3a;
        assert_eq!(
            decode(word),
            Some(Instr::Srai {
                a: 3,
                c: 2,
                shift: 31
            })
        );
    }

    #[test]
    fn itype_keeps_raw_imm16() {
        // addi r2, r2, -1: IMM16 = 0xFFFF
        let word = (2 << 27) | (2 << 22) | (0xffff << 6) | 0x04;
        assert_eq!(
            decode(word),
            Some(Instr::Addi {
                a: 2,
                b: 2,
                imm: 0xffff
            })
        );
    }

    #[test]
    fn unimplemented_encodings_decode_to_none() {
        // div r2, r3, r4 (OPX=0x25) is deliberately outside the subset
        let div = (3 << 27) | (4 << 22) | (2 << 17) | (0x25 << 11) | 0x3a;
        assert_eq!(decode(div), None);
        // trap (OPX=0x2d)
        let trap = (0x2d << 11) | 0x3a;
        assert_eq!(decode(trap), None);
        // custom (OP=0x32)
        assert_eq!(decode(0x32), None);
    }

    #[test]
    fn decode_is_total() {
        // A spread of arbitrary words must decode or return None, never
        // panic. Step keeps the sweep cheap but covers every OP value.
        for word in (0..=u32::MAX).step_by(0x0101_0101) {
            let _ = decode(word);
        }
        for op in 0..0x40u32 {
            let _ = decode(op);
        }
    }
}
