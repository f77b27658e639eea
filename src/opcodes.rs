//! The static opcode table: every legal opcode byte maps to a mnemonic,
//! an addressing mode, an instruction size, and a base cycle count.
//!
//! Undocumented/illegal opcodes are deliberately left unmapped: decoding
//! one of those bytes is indistinguishable, from the CPU's point of view,
//! from decoding any other byte nobody ever assigned an instruction to. It
//! falls through to the halt sentinel in [`crate::cpu`].

use std::fmt;
use std::str::FromStr;

/// One of the 56 legal 6502 mnemonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC, CLD,
    CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP, JSR, LDA,
    LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR, RTI, RTS, SBC, SEC,
    SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
}

impl Mnemonic {
    pub const ALL: [Mnemonic; 56] = [
        Mnemonic::ADC, Mnemonic::AND, Mnemonic::ASL, Mnemonic::BCC, Mnemonic::BCS,
        Mnemonic::BEQ, Mnemonic::BIT, Mnemonic::BMI, Mnemonic::BNE, Mnemonic::BPL,
        Mnemonic::BRK, Mnemonic::BVC, Mnemonic::BVS, Mnemonic::CLC, Mnemonic::CLD,
        Mnemonic::CLI, Mnemonic::CLV, Mnemonic::CMP, Mnemonic::CPX, Mnemonic::CPY,
        Mnemonic::DEC, Mnemonic::DEX, Mnemonic::DEY, Mnemonic::EOR, Mnemonic::INC,
        Mnemonic::INX, Mnemonic::INY, Mnemonic::JMP, Mnemonic::JSR, Mnemonic::LDA,
        Mnemonic::LDX, Mnemonic::LDY, Mnemonic::LSR, Mnemonic::NOP, Mnemonic::ORA,
        Mnemonic::PHA, Mnemonic::PHP, Mnemonic::PLA, Mnemonic::PLP, Mnemonic::ROL,
        Mnemonic::ROR, Mnemonic::RTI, Mnemonic::RTS, Mnemonic::SBC, Mnemonic::SEC,
        Mnemonic::SED, Mnemonic::SEI, Mnemonic::STA, Mnemonic::STX, Mnemonic::STY,
        Mnemonic::TAX, Mnemonic::TAY, Mnemonic::TSX, Mnemonic::TXA, Mnemonic::TXS,
        Mnemonic::TYA,
    ];
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Mnemonic::*;
        Ok(match s.to_ascii_uppercase().as_str() {
            "ADC" => ADC, "AND" => AND, "ASL" => ASL, "BCC" => BCC, "BCS" => BCS,
            "BEQ" => BEQ, "BIT" => BIT, "BMI" => BMI, "BNE" => BNE, "BPL" => BPL,
            "BRK" => BRK, "BVC" => BVC, "BVS" => BVS, "CLC" => CLC, "CLD" => CLD,
            "CLI" => CLI, "CLV" => CLV, "CMP" => CMP, "CPX" => CPX, "CPY" => CPY,
            "DEC" => DEC, "DEX" => DEX, "DEY" => DEY, "EOR" => EOR, "INC" => INC,
            "INX" => INX, "INY" => INY, "JMP" => JMP, "JSR" => JSR, "LDA" => LDA,
            "LDX" => LDX, "LDY" => LDY, "LSR" => LSR, "NOP" => NOP, "ORA" => ORA,
            "PHA" => PHA, "PHP" => PHP, "PLA" => PLA, "PLP" => PLP, "ROL" => ROL,
            "ROR" => ROR, "RTI" => RTI, "RTS" => RTS, "SBC" => SBC, "SEC" => SEC,
            "SED" => SED, "SEI" => SEI, "STA" => STA, "STX" => STX, "STY" => STY,
            "TAX" => TAX, "TAY" => TAY, "TSX" => TSX, "TXA" => TXA, "TXS" => TXS,
            "TYA" => TYA,
            _ => return Err(()),
        })
    }
}

/// The closed set of 13 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    Relative,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirectX,
    IndirectIndexedY,
}

impl Mode {
    /// Instruction size in bytes, including the opcode byte.
    pub fn size(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator => 1,
            Mode::Immediate
            | Mode::Relative
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndexedIndirectX
            | Mode::IndirectIndexedY => 2,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 3,
        }
    }
}

/// One row of the opcode table: what a given opcode byte means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub mode: Mode,
    pub size: u8,
    pub base_cycles: u8,
    /// Whether a read through this addressing mode earns an extra cycle
    /// when indexing crosses a page boundary. Only ever true for
    /// AbsoluteX/AbsoluteY/IndirectIndexedY *read* instructions; stores and
    /// read-modify-write instructions never set this even in those modes.
    pub page_penalty: bool,
}

macro_rules! ins {
    ($mnemonic:ident, $mode:ident, $cycles:expr) => {
        Some(Instruction {
            mnemonic: Mnemonic::$mnemonic,
            mode: Mode::$mode,
            size: Mode::$mode.size(),
            base_cycles: $cycles,
            page_penalty: false,
        })
    };
    ($mnemonic:ident, $mode:ident, $cycles:expr, page) => {
        Some(Instruction {
            mnemonic: Mnemonic::$mnemonic,
            mode: Mode::$mode,
            size: Mode::$mode.size(),
            base_cycles: $cycles,
            page_penalty: true,
        })
    };
}

/// Decodes a single opcode byte. `None` means the byte is not one of the
/// 151 legal opcodes; the CPU front-end treats that as the halt sentinel.
pub fn decode(opcode: u8) -> Option<Instruction> {
    match opcode {
        0x00 => ins!(BRK, Implied, 7),
        0x01 => ins!(ORA, IndexedIndirectX, 6),
        0x05 => ins!(ORA, ZeroPage, 3),
        0x06 => ins!(ASL, ZeroPage, 5),
        0x08 => ins!(PHP, Implied, 3),
        0x09 => ins!(ORA, Immediate, 2),
        0x0A => ins!(ASL, Accumulator, 2),
        0x0D => ins!(ORA, Absolute, 4),
        0x0E => ins!(ASL, Absolute, 6),

        0x10 => ins!(BPL, Relative, 2),
        0x11 => ins!(ORA, IndirectIndexedY, 5, page),
        0x15 => ins!(ORA, ZeroPageX, 4),
        0x16 => ins!(ASL, ZeroPageX, 6),
        0x18 => ins!(CLC, Implied, 2),
        0x19 => ins!(ORA, AbsoluteY, 4, page),
        0x1D => ins!(ORA, AbsoluteX, 4, page),
        0x1E => ins!(ASL, AbsoluteX, 7),

        0x20 => ins!(JSR, Absolute, 6),
        0x21 => ins!(AND, IndexedIndirectX, 6),
        0x24 => ins!(BIT, ZeroPage, 3),
        0x25 => ins!(AND, ZeroPage, 3),
        0x26 => ins!(ROL, ZeroPage, 5),
        0x28 => ins!(PLP, Implied, 4),
        0x29 => ins!(AND, Immediate, 2),
        0x2A => ins!(ROL, Accumulator, 2),
        0x2C => ins!(BIT, Absolute, 4),
        0x2D => ins!(AND, Absolute, 4),
        0x2E => ins!(ROL, Absolute, 6),

        0x30 => ins!(BMI, Relative, 2),
        0x31 => ins!(AND, IndirectIndexedY, 5, page),
        0x35 => ins!(AND, ZeroPageX, 4),
        0x36 => ins!(ROL, ZeroPageX, 6),
        0x38 => ins!(SEC, Implied, 2),
        0x39 => ins!(AND, AbsoluteY, 4, page),
        0x3D => ins!(AND, AbsoluteX, 4, page),
        0x3E => ins!(ROL, AbsoluteX, 7),

        0x40 => ins!(RTI, Implied, 6),
        0x41 => ins!(EOR, IndexedIndirectX, 6),
        0x45 => ins!(EOR, ZeroPage, 3),
        0x46 => ins!(LSR, ZeroPage, 5),
        0x48 => ins!(PHA, Implied, 3),
        0x49 => ins!(EOR, Immediate, 2),
        0x4A => ins!(LSR, Accumulator, 2),
        0x4C => ins!(JMP, Absolute, 3),
        0x4D => ins!(EOR, Absolute, 4),
        0x4E => ins!(LSR, Absolute, 6),

        0x50 => ins!(BVC, Relative, 2),
        0x51 => ins!(EOR, IndirectIndexedY, 5, page),
        0x55 => ins!(EOR, ZeroPageX, 4),
        0x56 => ins!(LSR, ZeroPageX, 6),
        0x58 => ins!(CLI, Implied, 2),
        0x59 => ins!(EOR, AbsoluteY, 4, page),
        0x5D => ins!(EOR, AbsoluteX, 4, page),
        0x5E => ins!(LSR, AbsoluteX, 7),

        0x60 => ins!(RTS, Implied, 6),
        0x61 => ins!(ADC, IndexedIndirectX, 6),
        0x65 => ins!(ADC, ZeroPage, 3),
        0x66 => ins!(ROR, ZeroPage, 5),
        0x68 => ins!(PLA, Implied, 4),
        0x69 => ins!(ADC, Immediate, 2),
        0x6A => ins!(ROR, Accumulator, 2),
        0x6C => ins!(JMP, Indirect, 5),
        0x6D => ins!(ADC, Absolute, 4),
        0x6E => ins!(ROR, Absolute, 6),

        0x70 => ins!(BVS, Relative, 2),
        0x71 => ins!(ADC, IndirectIndexedY, 5, page),
        0x75 => ins!(ADC, ZeroPageX, 4),
        0x76 => ins!(ROR, ZeroPageX, 6),
        0x78 => ins!(SEI, Implied, 2),
        0x79 => ins!(ADC, AbsoluteY, 4, page),
        0x7D => ins!(ADC, AbsoluteX, 4, page),
        0x7E => ins!(ROR, AbsoluteX, 7),

        0x81 => ins!(STA, IndexedIndirectX, 6),
        0x84 => ins!(STY, ZeroPage, 3),
        0x85 => ins!(STA, ZeroPage, 3),
        0x86 => ins!(STX, ZeroPage, 3),
        0x88 => ins!(DEY, Implied, 2),
        0x8A => ins!(TXA, Implied, 2),
        0x8C => ins!(STY, Absolute, 4),
        0x8D => ins!(STA, Absolute, 4),
        0x8E => ins!(STX, Absolute, 4),

        0x90 => ins!(BCC, Relative, 2),
        0x91 => ins!(STA, IndirectIndexedY, 6),
        0x94 => ins!(STY, ZeroPageX, 4),
        0x95 => ins!(STA, ZeroPageX, 4),
        0x96 => ins!(STX, ZeroPageY, 4),
        0x98 => ins!(TYA, Implied, 2),
        0x99 => ins!(STA, AbsoluteY, 5),
        0x9A => ins!(TXS, Implied, 2),
        0x9D => ins!(STA, AbsoluteX, 5),

        0xA0 => ins!(LDY, Immediate, 2),
        0xA1 => ins!(LDA, IndexedIndirectX, 6),
        0xA2 => ins!(LDX, Immediate, 2),
        0xA4 => ins!(LDY, ZeroPage, 3),
        0xA5 => ins!(LDA, ZeroPage, 3),
        0xA6 => ins!(LDX, ZeroPage, 3),
        0xA8 => ins!(TAY, Implied, 2),
        0xA9 => ins!(LDA, Immediate, 2),
        0xAA => ins!(TAX, Implied, 2),
        0xAC => ins!(LDY, Absolute, 4),
        0xAD => ins!(LDA, Absolute, 4),
        0xAE => ins!(LDX, Absolute, 4),

        0xB0 => ins!(BCS, Relative, 2),
        0xB1 => ins!(LDA, IndirectIndexedY, 5, page),
        0xB4 => ins!(LDY, ZeroPageX, 4),
        0xB5 => ins!(LDA, ZeroPageX, 4),
        0xB6 => ins!(LDX, ZeroPageY, 4),
        0xB8 => ins!(CLV, Implied, 2),
        0xB9 => ins!(LDA, AbsoluteY, 4, page),
        0xBA => ins!(TSX, Implied, 2),
        0xBC => ins!(LDY, AbsoluteX, 4, page),
        0xBD => ins!(LDA, AbsoluteX, 4, page),
        0xBE => ins!(LDX, AbsoluteY, 4, page),

        0xC0 => ins!(CPY, Immediate, 2),
        0xC1 => ins!(CMP, IndexedIndirectX, 6),
        0xC4 => ins!(CPY, ZeroPage, 3),
        0xC5 => ins!(CMP, ZeroPage, 3),
        0xC6 => ins!(DEC, ZeroPage, 5),
        0xC8 => ins!(INY, Implied, 2),
        0xC9 => ins!(CMP, Immediate, 2),
        0xCA => ins!(DEX, Implied, 2),
        0xCC => ins!(CPY, Absolute, 4),
        0xCD => ins!(CMP, Absolute, 4),
        0xCE => ins!(DEC, Absolute, 6),

        0xD0 => ins!(BNE, Relative, 2),
        0xD1 => ins!(CMP, IndirectIndexedY, 5, page),
        0xD5 => ins!(CMP, ZeroPageX, 4),
        0xD6 => ins!(DEC, ZeroPageX, 6),
        0xD8 => ins!(CLD, Implied, 2),
        0xD9 => ins!(CMP, AbsoluteY, 4, page),
        0xDD => ins!(CMP, AbsoluteX, 4, page),
        0xDE => ins!(DEC, AbsoluteX, 7),

        0xE0 => ins!(CPX, Immediate, 2),
        0xE1 => ins!(SBC, IndexedIndirectX, 6),
        0xE4 => ins!(CPX, ZeroPage, 3),
        0xE5 => ins!(SBC, ZeroPage, 3),
        0xE6 => ins!(INC, ZeroPage, 5),
        0xE8 => ins!(INX, Implied, 2),
        0xE9 => ins!(SBC, Immediate, 2),
        0xEA => ins!(NOP, Implied, 2),
        0xEC => ins!(CPX, Absolute, 4),
        0xED => ins!(SBC, Absolute, 4),
        0xEE => ins!(INC, Absolute, 6),

        0xF0 => ins!(BEQ, Relative, 2),
        0xF1 => ins!(SBC, IndirectIndexedY, 5, page),
        0xF5 => ins!(SBC, ZeroPageX, 4),
        0xF6 => ins!(INC, ZeroPageX, 6),
        0xF8 => ins!(SED, Implied, 2),
        0xF9 => ins!(SBC, AbsoluteY, 4, page),
        0xFD => ins!(SBC, AbsoluteX, 4, page),
        0xFE => ins!(INC, AbsoluteX, 7),

        _ => None,
    }
}

/// Finds the opcode byte for a `(mnemonic, mode)` pair, if the instruction
/// table has one. Used by the assembler, which works the other direction
/// from the CPU front-end: it starts with a mnemonic and a parsed operand
/// form and needs the byte to emit.
pub fn encode(mnemonic: Mnemonic, mode: Mode) -> Option<u8> {
    (0..=255u8).find(|&opcode| {
        matches!(decode(opcode), Some(ins) if ins.mnemonic == mnemonic && ins.mode == mode)
    })
}
