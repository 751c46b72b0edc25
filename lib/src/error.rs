//! Error types shared by datasets, solvers and models.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure surfaced by the library.
///
/// All variants are raised eagerly at the point of violation; nothing is
/// retried and no partially-updated model state is rolled back.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `predict`/`evaluate` called before a successful `fit`.
    #[error("model is not fitted, call fit() first")]
    NotFitted,
    /// Batch or feature shape does not match what the model was fitted on.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: String, got: String },
    /// Binary classifier target is not a single column of 0/1 labels.
    #[error("invalid labels: {0}")]
    LabelDomain(String),
    /// `XᵀX` of the augmented design matrix could not be inverted.
    #[error("normal equation matrix is singular")]
    SingularMatrix,
    /// Solver name that is unknown, or not available for the model kind.
    #[error("unrecognised solver `{0}`")]
    UnknownSolver(String),
    /// Training requires target columns but the dataset has none.
    #[error("dataset has no target columns")]
    MissingTarget,
    #[error("dataset is empty")]
    EmptyDataset,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    /// A CSV cell could not be parsed as a number.
    #[error("cannot parse `{value}` at row {row}, column {column}")]
    Parse {
        row: usize,
        column: usize,
        value: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub(crate) fn dimension(expected: impl ToString, got: impl ToString) -> Self {
        Error::Dimension {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
