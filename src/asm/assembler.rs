//! Two-pass assembler driver. `ScanForSymbols` and `EmitCode` run every
//! line through the same [`Assembler::process_line`]; only the
//! [`ProcessingMode`] differs between them, so the addressing-mode
//! inference and byte-sizing logic can never drift between the two passes.

use log::{debug, trace};

use super::error::{AssembleError, RawError, RawResult};
use super::expr::{self, OperandValue, Pass};
use super::parser::{self, IndexRegister, LineBody, OperandForm};
use super::symbol::{AddressRange, SymbolTable};
use crate::memory::SharedMemory;
use crate::opcodes::{self, Mnemonic, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessingMode {
    ScanForSymbols,
    EmitCode,
}

impl From<ProcessingMode> for Pass {
    fn from(mode: ProcessingMode) -> Self {
        match mode {
            ProcessingMode::ScanForSymbols => Pass::ScanForSymbols,
            ProcessingMode::EmitCode => Pass::EmitCode,
        }
    }
}

/// Footprint of a successfully assembled program.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyStats {
    pub address_range: AddressRange,
    pub bytes_written: usize,
}

pub struct Assembler {
    memory: SharedMemory,
    symbols: SymbolTable,
    location_counter: u16,
    address_range: AddressRange,
    bytes_written: usize,
    mode: ProcessingMode,
}

impl Assembler {
    pub fn new(memory: SharedMemory) -> Self {
        Assembler {
            memory,
            symbols: SymbolTable::new(),
            location_counter: 0,
            address_range: AddressRange::new(),
            bytes_written: 0,
            mode: ProcessingMode::ScanForSymbols,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Assembles `source` starting at `origin`, running the scanning pass
    /// to resolve every label before the emitting pass writes bytes to
    /// memory. Aborts with the first error either pass encounters.
    pub fn assemble(&mut self, source: &str, origin: u16) -> Result<AssemblyStats, AssembleError> {
        debug!("scanning for symbols from origin {:#06X}", origin);
        self.run_pass(source, origin, ProcessingMode::ScanForSymbols)?;

        debug!("emitting code from origin {:#06X}", origin);
        self.address_range = AddressRange::new();
        self.bytes_written = 0;
        self.run_pass(source, origin, ProcessingMode::EmitCode)?;

        Ok(AssemblyStats {
            address_range: self.address_range,
            bytes_written: self.bytes_written,
        })
    }

    fn run_pass(&mut self, source: &str, origin: u16, mode: ProcessingMode) -> Result<(), AssembleError> {
        self.mode = mode;
        self.location_counter = origin;
        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            self.process_line(line).map_err(|raw| raw.at_line(line_number))?;
        }
        Ok(())
    }

    fn process_line(&mut self, line: &str) -> RawResult<()> {
        let parsed = parser::parse_line(line)?;

        if let Some(label) = &parsed.label {
            self.define_symbol(label)?;
        }

        match parsed.body {
            LineBody::NoOp => Ok(()),
            LineBody::SetOrigin(expr_text) => self.set_origin(&expr_text),
            LineBody::EmitBytes(items) => self.emit_bytes(&items),
            LineBody::EmitWords(items) => self.emit_words(&items),
            LineBody::Instruction { mnemonic, operand } => self.assemble_instruction(&mnemonic, operand),
        }
    }

    /// Labels are only defined during the scanning pass; by the emitting
    /// pass every label already holds its final address, and re-running
    /// `put` would spuriously report a redefinition.
    fn define_symbol(&mut self, name: &str) -> RawResult<()> {
        if self.mode == ProcessingMode::ScanForSymbols {
            trace!("defining symbol {} = {:#06X}", name, self.location_counter);
            if !self.symbols.put(name, self.location_counter) {
                return Err(RawError::SymbolAlreadyDefined(name.to_string()));
            }
        }
        Ok(())
    }

    fn set_origin(&mut self, expr_text: &str) -> RawResult<()> {
        let value = self.evaluate(expr_text)?;
        self.location_counter = value.value();
        Ok(())
    }

    fn evaluate(&self, text: &str) -> RawResult<OperandValue> {
        expr::evaluate(text, &self.symbols, self.mode.into())
    }

    fn emit_byte(&mut self, byte: u8) {
        if self.mode == ProcessingMode::EmitCode {
            self.memory.borrow_mut().write_u8(self.location_counter, byte);
            self.address_range.expand(self.location_counter);
            self.bytes_written += 1;
        }
        self.location_counter = self.location_counter.wrapping_add(1);
    }

    fn emit_bytes(&mut self, items: &[String]) -> RawResult<()> {
        for item in items {
            let value = self.evaluate(item)?;
            let byte = safe_cast_u8(value.value())?;
            self.emit_byte(byte);
        }
        Ok(())
    }

    fn emit_words(&mut self, items: &[String]) -> RawResult<()> {
        for item in items {
            let value = self.evaluate(item)?.value();
            self.emit_byte((value & 0xFF) as u8);
            self.emit_byte((value >> 8) as u8);
        }
        Ok(())
    }

    fn assemble_instruction(&mut self, mnemonic_text: &str, form: OperandForm) -> RawResult<()> {
        let mnemonic: Mnemonic = mnemonic_text
            .parse()
            .map_err(|_| RawError::InvalidMnemonic(mnemonic_text.to_string()))?;

        let (mode, operand) = self.resolve_operand_form(mnemonic, form)?;

        let opcode = opcodes::encode(mnemonic, mode)
            .ok_or_else(|| RawError::InvalidInstructionFormat(mnemonic_text.to_string()))?;

        self.emit_byte(opcode);
        match operand {
            EmittedOperand::None => {}
            EmittedOperand::Byte(b) => self.emit_byte(b),
            EmittedOperand::Word(w) => {
                self.emit_byte((w & 0xFF) as u8);
                self.emit_byte((w >> 8) as u8);
            }
        }
        Ok(())
    }

    /// Picks the concrete [`Mode`] and the bytes to follow the opcode,
    /// applying zero-page shortening for bare `Absolute`-shaped operands
    /// when the mnemonic isn't `JMP`/`JSR` and the address fits in a byte.
    fn resolve_operand_form(
        &self,
        mnemonic: Mnemonic,
        form: OperandForm,
    ) -> RawResult<(Mode, EmittedOperand)> {
        match form {
            OperandForm::ImpliedOrAccumulator => {
                if opcodes::encode(mnemonic, Mode::Implied).is_some() {
                    Ok((Mode::Implied, EmittedOperand::None))
                } else {
                    Ok((Mode::Accumulator, EmittedOperand::None))
                }
            }
            OperandForm::Accumulator => Ok((Mode::Accumulator, EmittedOperand::None)),
            OperandForm::Immediate(text) => {
                let value = self.evaluate(&text)?;
                Ok((Mode::Immediate, EmittedOperand::Byte(safe_cast_u8(value.value())?)))
            }
            OperandForm::Indirect(text) => {
                let value = self.evaluate(&text)?;
                Ok((Mode::Indirect, EmittedOperand::Word(value.value())))
            }
            OperandForm::IndexedIndirectX(text) => {
                let value = self.evaluate(&text)?;
                Ok((
                    Mode::IndexedIndirectX,
                    EmittedOperand::Byte(safe_cast_u8(value.value())?),
                ))
            }
            OperandForm::IndirectIndexedY(text) => {
                let value = self.evaluate(&text)?;
                Ok((
                    Mode::IndirectIndexedY,
                    EmittedOperand::Byte(safe_cast_u8(value.value())?),
                ))
            }
            OperandForm::Indexed { text, register } => {
                let value = self.evaluate(&text)?;
                let shortens = value.is_literal()
                    && value.value() <= 0xFF
                    && !matches!(mnemonic, Mnemonic::JMP | Mnemonic::JSR);
                match (shortens, register) {
                    (true, IndexRegister::X) => {
                        Ok((Mode::ZeroPageX, EmittedOperand::Byte(value.value() as u8)))
                    }
                    (true, IndexRegister::Y) => {
                        Ok((Mode::ZeroPageY, EmittedOperand::Byte(value.value() as u8)))
                    }
                    (false, IndexRegister::X) => Ok((Mode::AbsoluteX, EmittedOperand::Word(value.value()))),
                    (false, IndexRegister::Y) => Ok((Mode::AbsoluteY, EmittedOperand::Word(value.value()))),
                }
            }
            OperandForm::Absolute(text) => {
                let value = self.evaluate(&text)?;
                let shortens = value.is_literal()
                    && value.value() <= 0xFF
                    && !matches!(mnemonic, Mnemonic::JMP | Mnemonic::JSR);
                if shortens {
                    Ok((Mode::ZeroPage, EmittedOperand::Byte(value.value() as u8)))
                } else {
                    Ok((Mode::Absolute, EmittedOperand::Word(value.value())))
                }
            }
            OperandForm::Branch(text) => {
                let value = expr::evaluate_branch_operand(&text, &self.symbols, self.mode.into())?;
                let displacement = expr::branch_displacement(value, self.mode.into(), self.location_counter)?;
                Ok((Mode::Relative, EmittedOperand::Byte(displacement as u8)))
            }
        }
    }
}

enum EmittedOperand {
    None,
    Byte(u8),
    Word(u16),
}

fn safe_cast_u8(value: u16) -> RawResult<u8> {
    u8::try_from(value).map_err(|_| RawError::ValueOutOfRange)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::memory::Memory;

    fn assemble(source: &str, origin: u16) -> (Assembler, AssemblyStats) {
        let memory = Memory::new_shared();
        let mut assembler = Assembler::new(memory);
        let stats = assembler.assemble(source, origin).expect("assembly to succeed");
        (assembler, stats)
    }

    fn bytes_at(assembler: &Assembler, start: u16, len: usize) -> Vec<u8> {
        let memory = assembler.memory.borrow();
        (0..len as u16).map(|i| memory.read_u8(start.wrapping_add(i))).collect()
    }

    #[test]
    fn immediate_load_shortens_to_two_bytes() {
        let (assembler, _) = assemble("LDX #$2F", 0xC000);
        assert_eq!(bytes_at(&assembler, 0xC000, 2), vec![0xA2, 0x2F]);
    }

    #[test]
    fn bare_absolute_operand_shortens_to_zero_page() {
        let (assembler, _) = assemble("ROR $34", 0xC000);
        assert_eq!(bytes_at(&assembler, 0xC000, 2), vec![0x66, 0x34]);
    }

    #[test]
    fn jmp_never_shortens_even_for_a_byte_sized_address() {
        let (assembler, _) = assemble("JMP $34", 0xC000);
        assert_eq!(bytes_at(&assembler, 0xC000, 3), vec![0x4C, 0x34, 0x00]);
    }

    #[test]
    fn negative_literal_branch_operand_encodes_directly() {
        let (assembler, _) = assemble("BCC -1", 0xC000);
        assert_eq!(bytes_at(&assembler, 0xC000, 2), vec![0x90, 0xFF]);
    }

    #[test]
    fn forward_reference_to_a_label_resolves_after_the_scanning_pass() {
        let source = "START: SEI\nCLD\nJMP START";
        let (assembler, stats) = assemble(source, 0xC000);
        assert_eq!(
            bytes_at(&assembler, 0xC000, 5),
            vec![0x78, 0xD8, 0x4C, 0x00, 0xC0]
        );
        assert_eq!(stats.bytes_written, 5);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let memory = Memory::new_shared();
        let mut assembler = Assembler::new(memory);
        let err = assembler.assemble("A: NOP\nA: NOP", 0xC000).unwrap_err();
        assert!(matches!(err, AssembleError::SymbolAlreadyDefined { line: 2, .. }));
    }

    #[test]
    fn unresolved_symbol_is_rejected() {
        let memory = Memory::new_shared();
        let mut assembler = Assembler::new(memory);
        let err = assembler.assemble("LDA MISSING", 0xC000).unwrap_err();
        assert!(matches!(err, AssembleError::SymbolNotDefined { line: 1, .. }));
    }

    #[test]
    fn immediate_value_out_of_byte_range_is_rejected() {
        let memory = Memory::new_shared();
        let mut assembler = Assembler::new(memory);
        let err = assembler.assemble("LDA #$1FF", 0xC000).unwrap_err();
        assert!(matches!(err, AssembleError::ValueOutOfRange { line: 1 }));
    }

    #[test]
    fn origin_directive_relocates_the_location_counter() {
        let source = ".ORG $0300\nNOP";
        let (assembler, stats) = assemble(source, 0);
        assert_eq!(bytes_at(&assembler, 0x0300, 1), vec![0xEA]);
        assert_eq!(stats.address_range.first(), Some(0x0300));
    }

    #[test]
    fn dcb_and_word_directives_emit_literal_bytes() {
        let source = ".BYTE $01,$02\n.WORD $1234";
        let (assembler, _) = assemble(source, 0xC000);
        assert_eq!(bytes_at(&assembler, 0xC000, 4), vec![0x01, 0x02, 0x34, 0x12]);
    }
}
