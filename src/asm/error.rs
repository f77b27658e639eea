use snafu::Snafu;

/// The closed assembler result taxonomy. Errors are local to a single
/// line; a pass aborts on the first one and reports the 1-based line
/// number it occurred on.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[snafu(display("line {line}: no grammar rule matched the line"))]
    SyntaxError { line: usize },

    #[snafu(display("line {line}: '{mnemonic}' is not a known mnemonic"))]
    InvalidMnemonic { line: usize, mnemonic: String },

    #[snafu(display("line {line}: '{mnemonic}' does not support this addressing mode"))]
    InvalidInstructionFormat { line: usize, mnemonic: String },

    #[snafu(display("line {line}: symbol '{name}' is already defined"))]
    SymbolAlreadyDefined { line: usize, name: String },

    #[snafu(display("line {line}: symbol '{name}' is not defined"))]
    SymbolNotDefined { line: usize, name: String },

    #[snafu(display("line {line}: value does not fit in the target width"))]
    ValueOutOfRange { line: usize },
}

/// Line-number-agnostic version of [`AssembleError`], used internally
/// while processing a single line; [`RawError::at_line`] attaches the
/// line number once the caller knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawError {
    SyntaxError,
    InvalidMnemonic(String),
    InvalidInstructionFormat(String),
    SymbolAlreadyDefined(String),
    SymbolNotDefined(String),
    ValueOutOfRange,
}

impl RawError {
    pub(crate) fn at_line(self, line: usize) -> AssembleError {
        match self {
            RawError::SyntaxError => AssembleError::SyntaxError { line },
            RawError::InvalidMnemonic(mnemonic) => AssembleError::InvalidMnemonic { line, mnemonic },
            RawError::InvalidInstructionFormat(mnemonic) => {
                AssembleError::InvalidInstructionFormat { line, mnemonic }
            }
            RawError::SymbolAlreadyDefined(name) => AssembleError::SymbolAlreadyDefined { line, name },
            RawError::SymbolNotDefined(name) => AssembleError::SymbolNotDefined { line, name },
            RawError::ValueOutOfRange => AssembleError::ValueOutOfRange { line },
        }
    }
}

pub(crate) type RawResult<T> = Result<T, RawError>;
