//! Formats one instruction at an address into a human-readable line. Pure
//! view over a [`Memory`]; never writes.

use crate::memory::Memory;
use crate::opcodes::{decode, Mode};

pub struct Disassembler<'a> {
    memory: &'a Memory,
    address: u16,
}

impl<'a> Disassembler<'a> {
    pub fn new(memory: &'a Memory, address: u16) -> Self {
        Disassembler { memory, address }
    }

    pub fn set_address(&mut self, address: u16) {
        self.address = address;
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    /// Advances past the instruction currently at `address`; one byte if
    /// the opcode there isn't legal (mirroring the halt sentinel's
    /// one-byte footprint).
    pub fn step(&mut self) {
        let opcode = self.memory.read_u8(self.address);
        let size = decode(opcode).map(|ins| ins.size).unwrap_or(1);
        self.address = self.address.wrapping_add(size as u16);
    }

    fn operand8(&self) -> u8 {
        self.memory.read_u8(self.address.wrapping_add(1))
    }

    fn operand16(&self) -> u16 {
        self.memory.read_u16(self.address.wrapping_add(1))
    }

    /// Renders the instruction at the current address as
    /// `AAAA B1 B2 B3  MNE operand`, upper-cased, the way the original
    /// viewer does.
    pub fn disassemble(&self) -> String {
        let opcode = self.memory.read_u8(self.address);
        let instruction = decode(opcode);
        let size = instruction.map(|ins| ins.size).unwrap_or(1);

        let mut bytes = String::new();
        for i in 0..3 {
            if i < size {
                bytes.push_str(&format!(
                    "{:02X} ",
                    self.memory.read_u8(self.address.wrapping_add(i as u16))
                ));
            } else {
                bytes.push_str("   ");
            }
        }

        let operand = match instruction {
            None => String::new(),
            Some(ins) => match ins.mode {
                Mode::Implied | Mode::Accumulator => String::new(),
                Mode::Immediate => format!("#${:02X}", self.operand8()),
                Mode::Absolute => format!("${:04X}", self.operand16()),
                Mode::AbsoluteX => format!("${:04X},X", self.operand16()),
                Mode::AbsoluteY => format!("${:04X},Y", self.operand16()),
                Mode::ZeroPage => format!("${:02X}", self.operand8()),
                Mode::ZeroPageX => format!("${:02X},X", self.operand8()),
                Mode::ZeroPageY => format!("${:02X},Y", self.operand8()),
                Mode::IndexedIndirectX => format!("(${:02X},X)", self.operand8()),
                Mode::IndirectIndexedY => format!("(${:02X}),Y", self.operand8()),
                Mode::Indirect => format!("(${:04X})", self.operand16()),
                Mode::Relative => {
                    let target = self
                        .address
                        .wrapping_add(2)
                        .wrapping_add(self.operand8() as i8 as i16 as u16);
                    format!("${:04X}", target)
                }
            },
        };

        let mnemonic = instruction
            .map(|ins| ins.mnemonic.to_string())
            .unwrap_or_else(|| "???".to_string());

        format!("{:04X} {}{} {}", self.address, bytes, mnemonic, operand)
            .trim_end()
            .to_string()
    }
}
