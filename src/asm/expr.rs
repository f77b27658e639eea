//! Operand expression parsing and evaluation: numeric literals, symbol
//! references, and the `<`/`>` low/high byte prefixes.

use super::error::RawError;
use super::symbol::SymbolTable;

/// Whether a pass is allowed to leave identifiers unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    ScanForSymbols,
    EmitCode,
}

/// The result of evaluating an operand expression. An `UndefinedIdentifier`
/// only ever arises during [`Pass::ScanForSymbols`]; by the time
/// [`Pass::EmitCode`] runs, every symbol must resolve or the line errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandValue {
    Literal(u16),
    Identifier(u16),
    UndefinedIdentifier,
}

impl OperandValue {
    pub fn is_literal(&self) -> bool {
        matches!(self, OperandValue::Literal(_))
    }

    /// The numeric value to use for size/byte computation. Unresolved
    /// identifiers stand in for zero during the scanning pass, matching
    /// the placeholder the original two-pass design reads back.
    pub fn value(&self) -> u16 {
        match self {
            OperandValue::Literal(v) | OperandValue::Identifier(v) => *v,
            OperandValue::UndefinedIdentifier => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteSelect {
    None,
    Low,
    High,
}

impl ByteSelect {
    fn apply(self, value: u16) -> u16 {
        match self {
            ByteSelect::None => value,
            ByteSelect::Low => value & 0xFF,
            ByteSelect::High => (value >> 8) & 0xFF,
        }
    }
}

fn strip_byte_select(text: &str) -> (ByteSelect, &str) {
    match text.as_bytes().first() {
        Some(b'<') => (ByteSelect::Low, &text[1..]),
        Some(b'>') => (ByteSelect::High, &text[1..]),
        _ => (ByteSelect::None, text),
    }
}

fn looks_like_a_number(text: &str) -> bool {
    matches!(text.as_bytes().first(), Some(b'$') | Some(b'%') | Some(b'0'..=b'9'))
}

fn parse_unsigned_number(text: &str) -> RawError_or_u16 {
    let (radix, digits) = match text.as_bytes().first() {
        Some(b'$') => (16, &text[1..]),
        Some(b'%') => (2, &text[1..]),
        _ => (10, text),
    };
    if digits.is_empty() {
        return Err(RawError::SyntaxError);
    }
    u16::from_str_radix(digits, radix).map_err(|_| RawError::ValueOutOfRange)
}

type RawError_or_u16 = Result<u16, RawError>;

fn is_symbol_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Evaluates a general (non-branch) operand expression: an optional
/// `<`/`>` prefix, then either a numeric literal or a symbol reference.
pub fn evaluate(text: &str, symbols: &SymbolTable, pass: Pass) -> Result<OperandValue, RawError> {
    let text = text.trim();
    let (select, rest) = strip_byte_select(text);
    if rest.is_empty() {
        return Err(RawError::SyntaxError);
    }

    if looks_like_a_number(rest) {
        let value = parse_unsigned_number(rest)?;
        return Ok(OperandValue::Literal(select.apply(value)));
    }

    if !is_symbol_name(rest) {
        return Err(RawError::SyntaxError);
    }

    match symbols.get(rest) {
        Some(value) => Ok(OperandValue::Identifier(select.apply(value))),
        None => match pass {
            Pass::EmitCode => Err(RawError::SymbolNotDefined(rest.to_string())),
            Pass::ScanForSymbols => Ok(OperandValue::UndefinedIdentifier),
        },
    }
}

/// Evaluates a branch-mnemonic operand: either a signed decimal literal
/// (no `$`/`%` forms) used as the displacement directly, or a symbol whose
/// resolved address becomes a branch target.
pub fn evaluate_branch_operand(
    text: &str,
    symbols: &SymbolTable,
    pass: Pass,
) -> Result<OperandValue, RawError> {
    let text = text.trim();
    match text.as_bytes().first() {
        Some(b'+') | Some(b'-') | Some(b'0'..=b'9') => {
            let n: i32 = text.parse().map_err(|_| RawError::ValueOutOfRange)?;
            if !(i8::MIN as i32..=i8::MAX as i32).contains(&n) {
                return Err(RawError::ValueOutOfRange);
            }
            Ok(OperandValue::Literal((n as i16 as u16) & 0xFFFF))
        }
        _ => {
            if !is_symbol_name(text) {
                return Err(RawError::SyntaxError);
            }
            match symbols.get(text) {
                Some(value) => Ok(OperandValue::Identifier(value)),
                None => match pass {
                    Pass::EmitCode => Err(RawError::SymbolNotDefined(text.to_string())),
                    Pass::ScanForSymbols => Ok(OperandValue::UndefinedIdentifier),
                },
            }
        }
    }
}

/// Turns a branch operand's resolved value into the signed 8-bit
/// displacement encoded after the opcode. During the scanning pass the
/// displacement is always reported as zero to dodge spurious range errors
/// before every label's final address is known.
pub fn branch_displacement(
    operand: OperandValue,
    pass: Pass,
    location_counter: u16,
) -> Result<i8, RawError> {
    if pass == Pass::ScanForSymbols {
        return Ok(0);
    }
    let raw: i32 = if operand.is_literal() {
        operand.value() as i16 as i32
    } else {
        operand.value() as i32 - location_counter as i32 - 2
    };
    i8::try_from(raw).map_err(|_| RawError::ValueOutOfRange)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_hex_binary_and_decimal_literals() {
        let symbols = SymbolTable::new();
        assert_eq!(
            evaluate("$2F", &symbols, Pass::EmitCode).unwrap(),
            OperandValue::Literal(0x2F)
        );
        assert_eq!(
            evaluate("%00101111", &symbols, Pass::EmitCode).unwrap(),
            OperandValue::Literal(0x2F)
        );
        assert_eq!(
            evaluate("47", &symbols, Pass::EmitCode).unwrap(),
            OperandValue::Literal(0x2F)
        );
    }

    #[test]
    fn low_and_high_byte_prefixes_extract_after_lookup() {
        let mut symbols = SymbolTable::new();
        symbols.put("ADDR", 0x1234);
        assert_eq!(
            evaluate("<ADDR", &symbols, Pass::EmitCode).unwrap().value(),
            0x34
        );
        assert_eq!(
            evaluate(">ADDR", &symbols, Pass::EmitCode).unwrap().value(),
            0x12
        );
    }

    #[test]
    fn scanning_pass_tolerates_unresolved_symbols() {
        let symbols = SymbolTable::new();
        assert_eq!(
            evaluate("LATER", &symbols, Pass::ScanForSymbols).unwrap(),
            OperandValue::UndefinedIdentifier
        );
    }

    #[test]
    fn emit_pass_rejects_unresolved_symbols() {
        let symbols = SymbolTable::new();
        assert_eq!(
            evaluate("LATER", &symbols, Pass::EmitCode),
            Err(RawError::SymbolNotDefined("LATER".to_string()))
        );
    }

    #[test]
    fn branch_displacement_uses_literal_directly() {
        let operand = OperandValue::Literal((-1i16) as u16);
        assert_eq!(branch_displacement(operand, Pass::EmitCode, 0x0200).unwrap(), -1);
    }

    #[test]
    fn branch_displacement_computes_relative_to_location_plus_two() {
        let operand = OperandValue::Identifier(0x0200);
        assert_eq!(branch_displacement(operand, Pass::EmitCode, 0x0200).unwrap(), -2);
    }
}
