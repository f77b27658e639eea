//! Splits one source line into an optional label and a body: a directive,
//! a bare mnemonic, or a mnemonic with an operand whose surface syntax
//! (`#`, `(...)`, `,X`/`,Y`) already narrows down the addressing mode.

use super::error::RawError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub body: LineBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineBody {
    NoOp,
    SetOrigin(String),
    EmitBytes(Vec<String>),
    EmitWords(Vec<String>),
    Instruction { mnemonic: String, operand: OperandForm },
}

/// The operand's surface form, before a mnemonic/mode lookup decides the
/// concrete addressing mode (and, for bare `Absolute`, whether it shortens
/// to a zero-page form).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandForm {
    ImpliedOrAccumulator,
    Accumulator,
    Immediate(String),
    Indirect(String),
    IndexedIndirectX(String),
    IndirectIndexedY(String),
    Indexed { text: String, register: IndexRegister },
    Absolute(String),
    Branch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRegister {
    X,
    Y,
}

const BRANCH_MNEMONICS: &[&str] = &[
    "BCC", "BCS", "BEQ", "BMI", "BNE", "BPL", "BVC", "BVS",
];

fn is_branch_mnemonic(mnemonic: &str) -> bool {
    BRANCH_MNEMONICS.contains(&mnemonic.to_ascii_uppercase().as_str())
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(index) => &line[..index],
        None => line,
    }
}

fn take_identifier(text: &str) -> Option<(&str, &str)> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return None,
    }
    let mut end = text.len();
    for (i, c) in chars {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            end = i;
            break;
        }
    }
    Some((&text[..end], &text[end..]))
}

fn strip_label(line: &str) -> (Option<String>, &str) {
    if let Some((name, rest)) = take_identifier(line) {
        let rest_trimmed = rest.trim_start();
        if let Some(after_colon) = rest_trimmed.strip_prefix(':') {
            return (Some(name.to_string()), after_colon.trim_start());
        }
    }
    (None, line.trim_start())
}

fn split_operand_list(text: &str) -> Vec<String> {
    text.split(',').map(|part| part.trim().to_string()).collect()
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    if text.len() >= suffix.len() && text[text.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    {
        Some(&text[..text.len() - suffix.len()])
    } else {
        None
    }
}

fn parse_operand(mnemonic: &str, text: &str) -> Result<OperandForm, RawError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(OperandForm::ImpliedOrAccumulator);
    }
    if text.eq_ignore_ascii_case("a") {
        return Ok(OperandForm::Accumulator);
    }
    if let Some(rest) = text.strip_prefix('#') {
        return Ok(OperandForm::Immediate(rest.trim().to_string()));
    }
    if let Some(inner) = text.strip_prefix('(') {
        let close = inner.find(')').ok_or(RawError::SyntaxError)?;
        let body = &inner[..close];
        let after = inner[close + 1..].trim();
        if after.is_empty() {
            return parse_indirect_or_indexed_indirect(body);
        }
        if after.eq_ignore_ascii_case(",y") {
            return Ok(OperandForm::IndirectIndexedY(body.trim().to_string()));
        }
        return Err(RawError::SyntaxError);
    }
    if let Some(body) = strip_suffix_ci(text, ",x") {
        return Ok(OperandForm::Indexed {
            text: body.trim().to_string(),
            register: IndexRegister::X,
        });
    }
    if let Some(body) = strip_suffix_ci(text, ",y") {
        return Ok(OperandForm::Indexed {
            text: body.trim().to_string(),
            register: IndexRegister::Y,
        });
    }
    if is_branch_mnemonic(mnemonic) {
        return Ok(OperandForm::Branch(text.to_string()));
    }
    Ok(OperandForm::Absolute(text.to_string()))
}

/// Parses `(expr,X)` by reusing [`parse_operand`]'s paren-scanning and then
/// checking for the `,X` suffix inside the parens.
fn parse_indirect_or_indexed_indirect(inner: &str) -> Result<OperandForm, RawError> {
    if let Some(body) = strip_suffix_ci(inner, ",x") {
        Ok(OperandForm::IndexedIndirectX(body.trim().to_string()))
    } else {
        Ok(OperandForm::Indirect(inner.trim().to_string()))
    }
}

pub fn parse_line(line: &str) -> Result<ParsedLine, RawError> {
    let without_comment = strip_comment(line);
    let (label, rest) = strip_label(without_comment);
    let rest = rest.trim();

    if rest.is_empty() {
        return Ok(ParsedLine { label, body: LineBody::NoOp });
    }

    if let Some(expr) = strip_prefix_ci(rest, ".ORG") {
        return Ok(ParsedLine { label, body: LineBody::SetOrigin(expr.trim().to_string()) });
    }
    if let Some(expr) = rest.strip_prefix('*') {
        let expr = expr.trim_start().strip_prefix('=').ok_or(RawError::SyntaxError)?;
        return Ok(ParsedLine { label, body: LineBody::SetOrigin(expr.trim().to_string()) });
    }
    if let Some(list) = strip_prefix_ci(rest, ".BYTE").or_else(|| strip_prefix_ci(rest, "DCB")) {
        return Ok(ParsedLine { label, body: LineBody::EmitBytes(split_operand_list(list)) });
    }
    if let Some(list) = strip_prefix_ci(rest, ".WORD") {
        return Ok(ParsedLine { label, body: LineBody::EmitWords(split_operand_list(list)) });
    }

    let (mnemonic, operand_text) = take_identifier(rest).ok_or(RawError::SyntaxError)?;
    let mnemonic = mnemonic.to_string();
    let operand_text = operand_text.trim_start();
    let form = parse_operand(&mnemonic, operand_text)?;

    Ok(ParsedLine { label, body: LineBody::Instruction { mnemonic, operand: form } })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_a_bare_label_and_implied_instruction() {
        let parsed = parse_line("START: SEI").unwrap();
        assert_eq!(parsed.label.as_deref(), Some("START"));
        assert_eq!(
            parsed.body,
            LineBody::Instruction {
                mnemonic: "SEI".to_string(),
                operand: OperandForm::ImpliedOrAccumulator,
            }
        );
    }

    #[test]
    fn parses_immediate_operand() {
        let parsed = parse_line("LDX #$2F").unwrap();
        assert_eq!(
            parsed.body,
            LineBody::Instruction {
                mnemonic: "LDX".to_string(),
                operand: OperandForm::Immediate("$2F".to_string()),
            }
        );
    }

    #[test]
    fn parses_indexed_indirect_x() {
        let parsed = parse_line("LDA ($20,X)").unwrap();
        assert_eq!(
            parsed.body,
            LineBody::Instruction {
                mnemonic: "LDA".to_string(),
                operand: OperandForm::IndexedIndirectX("$20".to_string()),
            }
        );
    }

    #[test]
    fn parses_indirect_indexed_y() {
        let parsed = parse_line("LDA ($20),Y").unwrap();
        assert_eq!(
            parsed.body,
            LineBody::Instruction {
                mnemonic: "LDA".to_string(),
                operand: OperandForm::IndirectIndexedY("$20".to_string()),
            }
        );
    }

    #[test]
    fn strips_trailing_comments() {
        let parsed = parse_line("CLC ; clear carry").unwrap();
        assert_eq!(
            parsed.body,
            LineBody::Instruction {
                mnemonic: "CLC".to_string(),
                operand: OperandForm::ImpliedOrAccumulator,
            }
        );
    }

    #[test]
    fn parses_origin_directives_in_both_spellings() {
        assert_eq!(
            parse_line(".ORG $C000").unwrap().body,
            LineBody::SetOrigin("$C000".to_string())
        );
        assert_eq!(parse_line("* = $C000").unwrap().body, LineBody::SetOrigin("$C000".to_string()));
    }

    #[test]
    fn directives_are_case_insensitive() {
        assert_eq!(parse_line(".org $C000").unwrap().body, LineBody::SetOrigin("$C000".to_string()));
        assert_eq!(
            parse_line(".byte $01").unwrap().body,
            LineBody::EmitBytes(vec!["$01".to_string()])
        );
        assert_eq!(
            parse_line("dcb $01").unwrap().body,
            LineBody::EmitBytes(vec!["$01".to_string()])
        );
    }

    #[test]
    fn parses_byte_and_word_lists() {
        assert_eq!(
            parse_line(".BYTE $01,$02,$03").unwrap().body,
            LineBody::EmitBytes(vec!["$01".to_string(), "$02".to_string(), "$03".to_string()])
        );
        assert_eq!(
            parse_line(".WORD $1234").unwrap().body,
            LineBody::EmitWords(vec!["$1234".to_string()])
        );
    }

    #[test]
    fn branch_mnemonic_gets_branch_operand_form() {
        let parsed = parse_line("BCC -1").unwrap();
        assert_eq!(
            parsed.body,
            LineBody::Instruction {
                mnemonic: "BCC".to_string(),
                operand: OperandForm::Branch("-1".to_string()),
            }
        );
    }
}
