use thiserror::Error;

/// Rejected galaxy parameters. Raised before any buffer is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("galaxy radius must be finite and greater than zero, got {0}")]
    InvalidRadius(f32),
    #[error("galaxy needs at least one branch, got {0}")]
    InvalidBranches(u32),
}

impl ConfigurationError {
    /// Name of the offending parameter field.
    pub fn field(&self) -> &'static str {
        match self {
            ConfigurationError::InvalidRadius(_) => "radius",
            ConfigurationError::InvalidBranches(_) => "branches",
        }
    }
}
