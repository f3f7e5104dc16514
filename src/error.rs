use thiserror::Error;

/// Errors raised while parsing or evaluating a formula.
///
/// Positions are character offsets into the formula as the user typed it,
/// whitespace included.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("unknown symbol '{symbol}' at position {position}")]
    UnknownSymbol { symbol: char, position: usize },

    #[error("missing operand at position {position}")]
    EmptyOperand { position: usize },

    #[error("missing operator before position {position}")]
    MissingOperator { position: usize },

    #[error("unmatched ')' at position {position}")]
    UnmatchedParenthesis { position: usize },

    #[error("parentheses nested deeper than {limit} levels at position {position}")]
    NestingTooDeep { position: usize, limit: usize },

    #[error("symbol table refers to series '{name}' which is not loaded")]
    MissingSeries { name: String },

    #[error("series '{name}' has {got} samples, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("{count} series requested but only 26 formula symbols (A-Z) exist")]
    TooManySymbols { count: usize },
}

impl FormulaError {
    /// Translate a position in a rewritten formula back to the user's text.
    ///
    /// `origin[i]` is the original offset of rewritten character `i`; positions
    /// past the end map to `end`.
    pub(crate) fn relocate(self, origin: &[usize], end: usize) -> Self {
        let map = |position: usize| origin.get(position).copied().unwrap_or(end);
        match self {
            FormulaError::UnknownSymbol { symbol, position } => FormulaError::UnknownSymbol {
                symbol,
                position: map(position),
            },
            FormulaError::EmptyOperand { position } => FormulaError::EmptyOperand {
                position: map(position),
            },
            FormulaError::MissingOperator { position } => FormulaError::MissingOperator {
                position: map(position),
            },
            FormulaError::UnmatchedParenthesis { position } => {
                FormulaError::UnmatchedParenthesis {
                    position: map(position),
                }
            }
            FormulaError::NestingTooDeep { position, limit } => FormulaError::NestingTooDeep {
                position: map(position),
                limit,
            },
            other => other,
        }
    }
}

/// Errors raised by the series containers and the smoother.
#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("moving average window must be at least 1, got {0}")]
    InvalidWindow(usize),

    #[error("series '{name}' has {got} samples, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("series '{0}' appears more than once")]
    DuplicateSeries(String),

    #[error("no series named '{0}'")]
    UnknownSeries(String),

    #[error("date '{0}' is not part of the log")]
    UnknownDate(String),

    #[error("invalid range: start index {start} is after end index {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("failed to parse series document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading [`crate::settings::Settings`].
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("moving average window must be at least 1, got {0}")]
    InvalidWindow(usize),
}
