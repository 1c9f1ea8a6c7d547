//! Error types for flavtag

/// Result type alias using flavtag's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for flavtag operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input column is absent from the event record
    #[error("missing input column: {0}")]
    MissingInput(String),

    /// A decision column holds something other than -1, 0 or +1
    #[error("invalid tag decision {value} in column {column}")]
    InvalidDecision { column: String, value: i64 },

    /// A mistag probability outside [0, 1] (or NaN)
    #[error("invalid mistag probability {value}")]
    InvalidMistag { value: f64 },

    /// Malformed input that fits no more specific kind
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Joint flavour probabilities summed to zero
    #[error("degenerate probability in {stage}: joint probabilities sum to zero")]
    DegenerateProbability { stage: String },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a new missing-input error
    pub fn missing_input(column: impl Into<String>) -> Self {
        Self::MissingInput(column.into())
    }

    /// Create a new invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new degenerate-probability error
    pub fn degenerate(stage: impl Into<String>) -> Self {
        Self::DegenerateProbability {
            stage: stage.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
