//! USKZ Deviant – Rust SDK (client-side helpers)
//!
//! This crate provides:
//! - PDA helpers for the mint, token, metadata and master-edition accounts
//! - Instruction builders with correct account ordering and client-side validation
//! - A metadata uploader for NFT.Storage-compatible endpoints
//! - A mint orchestrator that composes upload → derive → submit
//!
//! Signers are always passed explicitly; nothing here holds a global wallet.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod error;
pub mod instruction;
pub mod orchestrator;
pub mod pda;
pub mod reader;
pub mod upload;

use solana_sdk::pubkey::Pubkey;

pub use client::{CreateSingleNftParams, MintToCollectionParams, UskzDeviantClient};
pub use error::{MintError, UploadError};
pub use orchestrator::{AssetMetadata, MintOrchestrator, MintReceipt, MintTarget, TransactionSubmitter};
pub use pda::{DerivationError, MintAccounts, MintSeed};
pub use reader::{MetadataAccount, MetadataReader};
pub use upload::{AssetUpload, MetadataUploader, NftStorageUploader};

/// Metaplex token metadata program.
pub const METADATA_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Native system program.
pub const SYSTEM_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("11111111111111111111111111111111");

/// SPL token program.
pub const TOKEN_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// SPL associated token account program.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// PDA seed for mint accounts
pub const MINT_SEED: &[u8] = b"mint";

/// PDA seed for metadata and master edition accounts
pub const METADATA_SEED: &[u8] = b"metadata";

/// Trailing PDA seed for master edition accounts
pub const EDITION_SEED: &[u8] = b"edition";

/// Metadata program limits, checked before anything is submitted.
pub const NAME_MAX_LEN: usize = 32;
pub const SYMBOL_MAX_LEN: usize = 10;
pub const URI_MAX_LEN: usize = 200;
