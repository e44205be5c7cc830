// ABOUTME: Error types for the reader and the evaluator

use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_ONE_OR_TWO: &str = "1-2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";

/// Errors raised turning source text into a Value tree: the lexer, the
/// token classifier, and the parser all share this family.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error("empty input")]
    EmptyInput,

    #[error("invalid character literal: {0}")]
    InvalidCharacter(String),

    #[error("invalid unicode escape: {0}")]
    InvalidUnicode(String),

    #[error("invalid octal escape: {0}")]
    InvalidOctal(String),

    #[error("invalid keyword: {0}")]
    InvalidKeyword(String),

    #[error("invalid dispatch macro: #{0}")]
    InvalidDispatchMacro(char),

    #[error("invalid string escape sequence: \\{0}")]
    InvalidStringEscapeSequence(char),

    #[error("non-terminated string literal")]
    NonTerminatedString,

    #[error("unexpected token at start of form: {0}")]
    BadStartToken(String),

    #[error("mismatched delimiter: expected {expected}, found {found}")]
    MismatchedDelimiter { expected: char, found: String },

    #[error("reader macro with no following form")]
    MismatchedReaderMacro,

    #[error("map literal has an odd number of forms")]
    MapKeyValueMismatch,
}

/// Errors raised evaluating a Value tree against a Context.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    ArityError {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: invalid argument: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("index {index} out of bounds for length {length}")]
    OutOfBounds { index: i64, length: usize },

    #[error("divide by zero")]
    DivideByZero,

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("symbol is unbound: {0}")]
    Unbound(String),

    #[error("value is not evalable: {0}")]
    NotEvalable(String),

    #[error("recur used outside tail position of a loop or function")]
    RecurMisuse,
}

impl EvalError {
    pub fn arity(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::ArityError {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// The outermost result of running one top-level form through `Interpreter::evaluate`.
#[derive(Debug, Clone)]
pub enum EvalOutcome {
    Success(crate::value::Value),
    ReadFailure(ReadError),
    EvalFailure(EvalError),
}
