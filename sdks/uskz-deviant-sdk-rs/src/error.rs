//! Error types

use {
    crate::pda::DerivationError, solana_client::client_error::ClientError,
    solana_sdk::pubkey::Pubkey, thiserror::Error,
};

/// Errors from the metadata storage network.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Reading a local asset failed
    #[error("failed to read asset {path}: {source}")]
    Io {
        /// Path that could not be read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Transport-level failure (connect, TLS, timeout)
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The storage service answered but refused the upload
    #[error("storage rejected upload ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message reported by the service
        message: String,
    },
    /// The storage service answered with something we could not parse
    #[error("malformed storage response: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by the mint orchestrator.
#[derive(Debug, Error)]
pub enum MintError {
    /// PDA derivation failed; never transient
    #[error("address derivation failed: {0}")]
    Derivation(#[from] DerivationError),
    /// Metadata upload failed; no transaction was built
    #[error("metadata upload failed: {0}")]
    Upload(#[from] UploadError),
    /// RPC or on-chain rejection, as reported by the cluster
    #[error("transaction failed: {0}")]
    Transaction(#[from] ClientError),
    /// A metadata field exceeds the metadata program's limit
    #[error("{field} too long: {len} bytes, max {max}")]
    FieldTooLong {
        /// Field name
        field: &'static str,
        /// Actual length in bytes
        len: usize,
        /// Allowed length in bytes
        max: usize,
    },
    /// Instruction data could not be serialized
    #[error("failed to encode instruction: {0}")]
    Encoding(#[from] std::io::Error),
    /// An on-chain account did not have the expected layout
    #[error("failed to decode account {address}: {source}")]
    Decode {
        /// Account address
        address: Pubkey,
        /// Borsh error
        #[source]
        source: std::io::Error,
    },
}
