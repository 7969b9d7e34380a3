//! Instruction word encoders.
//!
//! One function per implemented mnemonic, taking operands in assembly
//! order and returning the encoded 32-bit word. The conformance suite
//! and the grader's end-to-end tests assemble their programs with these
//! instead of shelling out to the external toolchain.
//!
//! Register operands are 5-bit indices (`0..=31`). Branch and memory
//! offsets are the signed byte offsets the assembler would emit;
//! `call`/`jmpi` take the byte target address within the current 256 MiB
//! page. `break` is a Rust keyword, so its encoder is [`brk`].

use crate::opcodes::*;

fn r_type(opx: u32, a: u8, b: u8, c: u8, imm5: u8) -> u32 {
    (u32::from(a) << 27)
        | (u32::from(b) << 22)
        | (u32::from(c) << 17)
        | (opx << 11)
        | (u32::from(imm5) << 6)
        | OP_RTYPE
}

fn i_type(op: u32, a: u8, b: u8, imm: u16) -> u32 {
    (u32::from(a) << 27) | (u32::from(b) << 22) | (u32::from(imm) << 6) | op
}

fn j_type(op: u32, target: u32) -> u32 {
    ((target >> 2) & 0x03ff_ffff) << 6 | op
}

// --- R-type arithmetic/logical: `op rC, rA, rB` ---

#[must_use]
pub fn add(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_ADD, a, b, c, 0)
}

#[must_use]
pub fn sub(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_SUB, a, b, c, 0)
}

#[must_use]
pub fn mul(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_MUL, a, b, c, 0)
}

#[must_use]
pub fn and(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_AND, a, b, c, 0)
}

#[must_use]
pub fn or(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_OR, a, b, c, 0)
}

#[must_use]
pub fn xor(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_XOR, a, b, c, 0)
}

#[must_use]
pub fn nor(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_NOR, a, b, c, 0)
}

// --- R-type comparisons: `cmpXX rC, rA, rB` ---

#[must_use]
pub fn cmpeq(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_CMPEQ, a, b, c, 0)
}

#[must_use]
pub fn cmpne(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_CMPNE, a, b, c, 0)
}

#[must_use]
pub fn cmpge(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_CMPGE, a, b, c, 0)
}

#[must_use]
pub fn cmpgeu(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_CMPGEU, a, b, c, 0)
}

#[must_use]
pub fn cmplt(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_CMPLT, a, b, c, 0)
}

#[must_use]
pub fn cmpltu(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_CMPLTU, a, b, c, 0)
}

// --- shifts and rotates ---

#[must_use]
pub fn sll(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_SLL, a, b, c, 0)
}

#[must_use]
pub fn srl(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_SRL, a, b, c, 0)
}

#[must_use]
pub fn sra(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_SRA, a, b, c, 0)
}

#[must_use]
pub fn rol(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_ROL, a, b, c, 0)
}

#[must_use]
pub fn ror(c: u8, a: u8, b: u8) -> u32 {
    r_type(OPX_ROR, a, b, c, 0)
}

#[must_use]
pub fn slli(c: u8, a: u8, shift: u8) -> u32 {
    r_type(OPX_SLLI, a, 0, c, shift)
}

#[must_use]
pub fn srli(c: u8, a: u8, shift: u8) -> u32 {
    r_type(OPX_SRLI, a, 0, c, shift)
}

#[must_use]
pub fn srai(c: u8, a: u8, shift: u8) -> u32 {
    r_type(OPX_SRAI, a, 0, c, shift)
}

#[must_use]
pub fn roli(c: u8, a: u8, shift: u8) -> u32 {
    r_type(OPX_ROLI, a, 0, c, shift)
}

// --- R-type control ---

#[must_use]
pub fn jmp(a: u8) -> u32 {
    r_type(OPX_JMP, a, 0, 0, 0)
}

#[must_use]
pub fn callr(a: u8) -> u32 {
    r_type(OPX_CALLR, a, 0, crate::registers::RA, 0)
}

#[must_use]
pub fn ret() -> u32 {
    r_type(OPX_RET, crate::registers::RA, 0, 0, 0)
}

#[must_use]
pub fn nextpc(c: u8) -> u32 {
    r_type(OPX_NEXTPC, 0, 0, c, 0)
}

/// `break` (keyword-mangled).
#[must_use]
pub fn brk() -> u32 {
    r_type(OPX_BREAK, 0, 0, crate::registers::BA, 0)
}

#[must_use]
pub fn nop() -> u32 {
    add(0, 0, 0)
}

// --- I-type arithmetic/logical: `opi rB, rA, imm` ---

#[must_use]
pub fn addi(b: u8, a: u8, imm: i16) -> u32 {
    i_type(OP_ADDI, a, b, imm as u16)
}

#[must_use]
pub fn muli(b: u8, a: u8, imm: i16) -> u32 {
    i_type(OP_MULI, a, b, imm as u16)
}

#[must_use]
pub fn andi(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_ANDI, a, b, imm)
}

#[must_use]
pub fn ori(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_ORI, a, b, imm)
}

#[must_use]
pub fn xori(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_XORI, a, b, imm)
}

#[must_use]
pub fn andhi(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_ANDHI, a, b, imm)
}

#[must_use]
pub fn orhi(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_ORHI, a, b, imm)
}

#[must_use]
pub fn xorhi(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_XORHI, a, b, imm)
}

// --- I-type comparisons ---

#[must_use]
pub fn cmpeqi(b: u8, a: u8, imm: i16) -> u32 {
    i_type(OP_CMPEQI, a, b, imm as u16)
}

#[must_use]
pub fn cmpnei(b: u8, a: u8, imm: i16) -> u32 {
    i_type(OP_CMPNEI, a, b, imm as u16)
}

#[must_use]
pub fn cmpgei(b: u8, a: u8, imm: i16) -> u32 {
    i_type(OP_CMPGEI, a, b, imm as u16)
}

#[must_use]
pub fn cmpgeui(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_CMPGEUI, a, b, imm)
}

#[must_use]
pub fn cmplti(b: u8, a: u8, imm: i16) -> u32 {
    i_type(OP_CMPLTI, a, b, imm as u16)
}

#[must_use]
pub fn cmpltui(b: u8, a: u8, imm: u16) -> u32 {
    i_type(OP_CMPLTUI, a, b, imm)
}

// --- loads and stores: `op rB, offset(rA)` ---

#[must_use]
pub fn ldw(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDW, a, b, offset as u16)
}

#[must_use]
pub fn ldh(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDH, a, b, offset as u16)
}

#[must_use]
pub fn ldhu(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDHU, a, b, offset as u16)
}

#[must_use]
pub fn ldb(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDB, a, b, offset as u16)
}

#[must_use]
pub fn ldbu(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDBU, a, b, offset as u16)
}

#[must_use]
pub fn stw(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_STW, a, b, offset as u16)
}

#[must_use]
pub fn sth(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_STH, a, b, offset as u16)
}

#[must_use]
pub fn stb(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_STB, a, b, offset as u16)
}

#[must_use]
pub fn ldwio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDWIO, a, b, offset as u16)
}

#[must_use]
pub fn ldhio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDHIO, a, b, offset as u16)
}

#[must_use]
pub fn ldhuio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDHUIO, a, b, offset as u16)
}

#[must_use]
pub fn ldbio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDBIO, a, b, offset as u16)
}

#[must_use]
pub fn ldbuio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_LDBUIO, a, b, offset as u16)
}

#[must_use]
pub fn stwio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_STWIO, a, b, offset as u16)
}

#[must_use]
pub fn sthio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_STHIO, a, b, offset as u16)
}

#[must_use]
pub fn stbio(b: u8, offset: i16, a: u8) -> u32 {
    i_type(OP_STBIO, a, b, offset as u16)
}

// --- branches: offset is relative to the next instruction ---

#[must_use]
pub fn br(offset: i16) -> u32 {
    i_type(OP_BR, 0, 0, offset as u16)
}

#[must_use]
pub fn beq(a: u8, b: u8, offset: i16) -> u32 {
    i_type(OP_BEQ, a, b, offset as u16)
}

#[must_use]
pub fn bne(a: u8, b: u8, offset: i16) -> u32 {
    i_type(OP_BNE, a, b, offset as u16)
}

#[must_use]
pub fn bge(a: u8, b: u8, offset: i16) -> u32 {
    i_type(OP_BGE, a, b, offset as u16)
}

#[must_use]
pub fn bgeu(a: u8, b: u8, offset: i16) -> u32 {
    i_type(OP_BGEU, a, b, offset as u16)
}

#[must_use]
pub fn blt(a: u8, b: u8, offset: i16) -> u32 {
    i_type(OP_BLT, a, b, offset as u16)
}

#[must_use]
pub fn bltu(a: u8, b: u8, offset: i16) -> u32 {
    i_type(OP_BLTU, a, b, offset as u16)
}

// --- J-type: byte target within the current 256 MiB page ---

#[must_use]
pub fn call(target: u32) -> u32 {
    j_type(OP_CALL, target)
}

#[must_use]
pub fn jmpi(target: u32) -> u32 {
    j_type(OP_JMPI, target)
}

// --- pseudo-instructions, materialized the way the assembler does ---

/// `mov rC, rA` = `add rC, rA, r0`.
#[must_use]
pub fn mov(c: u8, a: u8) -> u32 {
    add(c, a, 0)
}

/// `movi rB, imm` = `addi rB, r0, imm`.
#[must_use]
pub fn movi(b: u8, imm: i16) -> u32 {
    addi(b, 0, imm)
}

/// `movui rB, imm` = `ori rB, r0, imm`.
#[must_use]
pub fn movui(b: u8, imm: u16) -> u32 {
    ori(b, 0, imm)
}

/// `movhi rB, imm` = `orhi rB, r0, imm`.
#[must_use]
pub fn movhi(b: u8, imm: u16) -> u32 {
    orhi(b, 0, imm)
}

/// `movia rB, addr`: the `orhi` + `addi` pair. The high half uses
/// `%hiadj` (carry-adjusted for the sign extension `addi` applies to
/// the low half).
#[must_use]
pub fn movia(b: u8, addr: u32) -> [u32; 2] {
    let hiadj = ((addr >> 16) + ((addr >> 15) & 1)) as u16;
    let lo = addr as u16;
    [orhi(b, 0, hiadj), addi(b, b, lo as i16)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{Instr, decode};

    #[test]
    fn matches_known_gas_encodings() {
        assert_eq!(ret(), 0xf800_283a);
        assert_eq!(brk(), 0x003d_a03a);
        assert_eq!(nop(), 0x0001_883a);
        assert_eq!(movi(2, 5), 0x0080_0144);
    }

    #[test]
    fn encodings_decode_back() {
        assert_eq!(decode(add(6, 4, 5)), Some(Instr::Add { a: 4, b: 5, c: 6 }));
        assert_eq!(
            decode(addi(2, 2, -1)),
            Some(Instr::Addi {
                a: 2,
                b: 2,
                imm: 0xffff
            })
        );
        assert_eq!(
            decode(ldw(6, -4, 5)),
            Some(Instr::Ldw {
                a: 5,
                b: 6,
                imm: 0xfffc
            })
        );
        assert_eq!(decode(br(-8)), Some(Instr::Br { imm: 0xfff8 }));
        assert_eq!(
            decode(slli(3, 7, 2)),
            Some(Instr::Slli {
                a: 7,
                c: 3,
                shift: 2
            })
        );
        assert_eq!(
            decode(call(0x0000_0040)),
            Some(Instr::Call { imm26: 0x10 })
        );
    }

    #[test]
    fn movia_reassembles_the_address() {
        for addr in [0u32, 0x1000, 0xFF20_0000, 0xFF20_0040, 0x0400_0000, 0xFFFF_FFFF] {
            let [hi, lo] = movia(4, addr);
            let Some(Instr::Orhi { imm: hiadj, .. }) = decode(hi) else {
                panic!("movia high half must be orhi");
            };
            let Some(Instr::Addi { imm: low, .. }) = decode(lo) else {
                panic!("movia low half must be addi");
            };
            let value =
                (u32::from(hiadj) << 16).wrapping_add(i32::from(low as i16) as u32);
            assert_eq!(value, addr, "movia must reassemble 0x{addr:08x}");
        }
    }
}
