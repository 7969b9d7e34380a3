//! Nios II opcode field values.
//!
//! `OP_*` are values of the low 6 bits of the instruction word. R-type
//! instructions all carry `OP_RTYPE` and select the operation with the
//! `OPX_*` value in bits [16:11]. Values per the Nios II Processor
//! Reference Handbook instruction encodings.

// OP field (I-type and J-type)
pub const OP_CALL: u32 = 0x00;
pub const OP_JMPI: u32 = 0x01;
pub const OP_LDBU: u32 = 0x03;
pub const OP_ADDI: u32 = 0x04;
pub const OP_STB: u32 = 0x05;
pub const OP_BR: u32 = 0x06;
pub const OP_LDB: u32 = 0x07;
pub const OP_CMPGEI: u32 = 0x08;
pub const OP_LDHU: u32 = 0x0b;
pub const OP_ANDI: u32 = 0x0c;
pub const OP_STH: u32 = 0x0d;
pub const OP_BGE: u32 = 0x0e;
pub const OP_LDH: u32 = 0x0f;
pub const OP_CMPLTI: u32 = 0x10;
pub const OP_ORI: u32 = 0x14;
pub const OP_STW: u32 = 0x15;
pub const OP_BLT: u32 = 0x16;
pub const OP_LDW: u32 = 0x17;
pub const OP_CMPNEI: u32 = 0x18;
pub const OP_XORI: u32 = 0x1c;
pub const OP_BNE: u32 = 0x1e;
pub const OP_CMPEQI: u32 = 0x20;
pub const OP_LDBUIO: u32 = 0x23;
pub const OP_MULI: u32 = 0x24;
pub const OP_STBIO: u32 = 0x25;
pub const OP_BEQ: u32 = 0x26;
pub const OP_LDBIO: u32 = 0x27;
pub const OP_CMPGEUI: u32 = 0x28;
pub const OP_LDHUIO: u32 = 0x2b;
pub const OP_ANDHI: u32 = 0x2c;
pub const OP_STHIO: u32 = 0x2d;
pub const OP_BGEU: u32 = 0x2e;
pub const OP_LDHIO: u32 = 0x2f;
pub const OP_CMPLTUI: u32 = 0x30;
pub const OP_ORHI: u32 = 0x34;
pub const OP_STWIO: u32 = 0x35;
pub const OP_BLTU: u32 = 0x36;
pub const OP_LDWIO: u32 = 0x37;
pub const OP_RTYPE: u32 = 0x3a;
pub const OP_XORHI: u32 = 0x3c;

// OPX field (R-type)
pub const OPX_ROLI: u32 = 0x02;
pub const OPX_ROL: u32 = 0x03;
pub const OPX_RET: u32 = 0x05;
pub const OPX_NOR: u32 = 0x06;
pub const OPX_CMPGE: u32 = 0x08;
pub const OPX_ROR: u32 = 0x0b;
pub const OPX_JMP: u32 = 0x0d;
pub const OPX_AND: u32 = 0x0e;
pub const OPX_CMPLT: u32 = 0x10;
pub const OPX_SLLI: u32 = 0x12;
pub const OPX_SLL: u32 = 0x13;
pub const OPX_OR: u32 = 0x16;
pub const OPX_CMPNE: u32 = 0x18;
pub const OPX_SRLI: u32 = 0x1a;
pub const OPX_SRL: u32 = 0x1b;
pub const OPX_NEXTPC: u32 = 0x1c;
pub const OPX_CALLR: u32 = 0x1d;
pub const OPX_XOR: u32 = 0x1e;
pub const OPX_CMPEQ: u32 = 0x20;
pub const OPX_MUL: u32 = 0x27;
pub const OPX_CMPGEU: u32 = 0x28;
pub const OPX_CMPLTU: u32 = 0x30;
pub const OPX_ADD: u32 = 0x31;
pub const OPX_BREAK: u32 = 0x34;
pub const OPX_SUB: u32 = 0x39;
pub const OPX_SRAI: u32 = 0x3a;
pub const OPX_SRA: u32 = 0x3b;
