use crate::value::Sequence;

/// A single matching attempt that did not succeed.
///
/// Failures carry the sequence being matched when the failure was recorded
/// and the position inside it, so reports can show the offending input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{description} at {position}")]
pub struct MatchFailure {
    pub description: String,
    pub items: Sequence,
    pub position: usize,
}

impl MatchFailure {
    pub fn new(description: impl Into<String>, items: Sequence, position: usize) -> Self {
        Self {
            description: description.into(),
            items,
            position,
        }
    }
}

/// Errors detected while assembling a grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("rule `{0}` is called but never defined")]
    UndefinedRule(String),

    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),

    #[error("main rule `{0}` is not defined")]
    MissingMain(String),
}

/// Errors raised while evaluating a deferred action.
///
/// Unlike [`MatchFailure`] these are never backtracked over: they indicate a
/// broken action or a host that refused an effect.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unbound name `{0}`")]
    Unbound(String),

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("`{op}` expected {expected}, got {got}")]
    Type {
        op: String,
        expected: &'static str,
        got: String,
    },

    #[error("integer overflow in `{0}`")]
    Overflow(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("host refused effect: {0}")]
    Host(String),
}

impl EvalError {
    pub fn type_mismatch(op: &str, expected: &'static str, got: &crate::Value) -> Self {
        EvalError::Type {
            op: op.to_string(),
            expected,
            got: got.repr(),
        }
    }
}

pub type MatchResult<T> = std::result::Result<T, MatchFailure>;

pub type EvalResult<T> = std::result::Result<T, EvalError>;
