use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] finsift_core::ValidationError),

    #[error(transparent)]
    Provider(#[from] finsift_core::ProviderError),

    #[error(transparent)]
    Store(#[from] finsift_core::StoreError),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            // Missing credential and unreadable inputs are startup failures.
            Self::Provider(finsift_core::ProviderError::MissingCredential) => 2,
            Self::Validation(_) => 2,
            Self::Provider(_) => 3,
            Self::Store(_) => 4,
        }
    }
}
