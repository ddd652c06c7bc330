use thiserror::Error;

/// Problems found while building or querying a distance matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    /// The value, or one of its rows, is not a sequence of numbers
    #[error("Expected list or tuple: {0}")]
    NotListOrTuple(String),

    /// The matrix has no rows, or one of its rows is empty
    #[error("Empty matrix or row: {0}")]
    Empty(String),

    /// A row's length differs from the number of rows
    #[error("Row {row} has {len} values, expected {expected}")]
    LengthMismatch {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// Distance of an item to itself is not zero
    #[error("Distance of item {index} from itself is {value}, expected 0")]
    NonZeroDiagonal { index: usize, value: f64 },

    /// `m[i][j] != m[j][i]`
    #[error("Distance [{i}][{j}] = {ij} differs from [{j}][{i}] = {ji}")]
    AsymmetricMatrix { i: usize, j: usize, ij: f64, ji: f64 },

    /// Distances should be zero or positive
    #[error("Distances should be positive: [{i}][{j}] = {value}")]
    NegativeDistance { i: usize, j: usize, value: f64 },

    /// Query outside `0..N`
    #[error("Index ({i}, {j}) out of range for a {size}x{size} matrix")]
    IndexOutOfRange { i: usize, j: usize, size: usize },

    /// Item names do not cover the matrix
    #[error("{found} names given for a {expected}x{expected} matrix")]
    NameCount { found: usize, expected: usize },

    /// Malformed text input
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl MatrixError {
    /// Short name of the error class, stable across messages.
    ///
    /// ```
    /// use slink::libs::error::MatrixError;
    /// let err = MatrixError::Empty("no rows".to_string());
    /// assert_eq!(err.kind(), "Empty");
    /// ```
    pub fn kind(&self) -> &'static str {
        match self {
            MatrixError::NotListOrTuple(_) => "NotListOrTuple",
            MatrixError::Empty(_) => "Empty",
            MatrixError::LengthMismatch { .. } => "LengthMismatch",
            MatrixError::NonZeroDiagonal { .. } => "NonZeroDiagonal",
            MatrixError::AsymmetricMatrix { .. } => "AsymmetricMatrix",
            MatrixError::NegativeDistance { .. } => "NegativeDistance",
            MatrixError::IndexOutOfRange { .. } => "IndexOutOfRange",
            MatrixError::NameCount { .. } => "NameCount",
            MatrixError::Parse { .. } => "Parse",
        }
    }
}

/// Problems with trait tables and marker lists.
#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Duplicated trait name: {0}")]
    DuplicateTrait(String),

    #[error("Duplicated strain name: {0}")]
    DuplicateStrain(String),

    #[error("No traits to cluster")]
    NoTraits,

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
