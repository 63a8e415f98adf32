use {
    alloy::primitives::TxHash,
    std::{path::PathBuf, time::Duration},
    thiserror::Error,
};

/// Everything that can make a deployment run fail. Nothing is retried: each
/// variant surfaces to the binary which logs it and exits with a failure code.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("missing configuration: {key} is not set")]
    MissingConfiguration { key: &'static str },

    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfiguration { key: &'static str, reason: String },

    #[error("invalid contract artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("signer unavailable: {0:#}")]
    SignerUnavailable(anyhow::Error),

    #[error("connected to chain {actual} but expected chain {expected}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("failed to compute constructor argument {argument}: {reason}")]
    ArgumentComputation {
        argument: &'static str,
        reason: String,
    },

    #[error("deployment rejected: {0:#}")]
    DeploymentRejected(anyhow::Error),

    #[error("deployment transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: TxHash },

    #[error("deployment transaction {tx_hash} was not confirmed within {timeout:?}")]
    ConfirmationTimeout { tx_hash: TxHash, timeout: Duration },

    #[error("failed to confirm deployment transaction {tx_hash}: {reason:#}")]
    ConfirmationUnavailable {
        tx_hash: TxHash,
        reason: anyhow::Error,
    },

    #[error("stopped waiting for deployment transaction {tx_hash}, it may still get mined")]
    Cancelled { tx_hash: TxHash },
}

impl DeployError {
    /// Stable identifier of the error kind so that callers (e.g. CI jobs
    /// grepping the logs) can tell configuration mistakes from network
    /// failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingConfiguration { .. } => "MissingConfiguration",
            Self::InvalidConfiguration { .. } => "InvalidConfiguration",
            Self::InvalidArtifact { .. } => "InvalidArtifact",
            Self::SignerUnavailable(_) => "SignerUnavailable",
            Self::WrongNetwork { .. } => "WrongNetwork",
            Self::ArgumentComputation { .. } => "ArgumentComputationError",
            Self::DeploymentRejected(_) => "DeploymentRejected",
            Self::TransactionReverted { .. } => "TransactionReverted",
            Self::ConfirmationTimeout { .. } => "ConfirmationTimeout",
            Self::ConfirmationUnavailable { .. } => "ConfirmationUnavailable",
            Self::Cancelled { .. } => "Cancelled",
        }
    }

    pub(crate) fn invalid_artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
