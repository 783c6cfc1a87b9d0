//! Mint orchestration: upload → derive → submit.
//!
//! Each step is independent. [`MetadataUploader`] produces a URI,
//! [`UskzDeviantClient`] derives accounts and builds the instruction, and a
//! [`TransactionSubmitter`] signs and sends exactly one transaction. The payer
//! is passed into every call.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use tracing::{debug, info, warn};

use crate::client::{check_len, CreateSingleNftParams, MintToCollectionParams, UskzDeviantClient};
use crate::error::MintError;
use crate::pda::MintAccounts;
use crate::upload::{AssetUpload, MetadataUploader};
use crate::{NAME_MAX_LEN, SYMBOL_MAX_LEN};

/// Transport seam: fetch a blockhash and send a signed transaction.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, MintError>;

    /// Send and wait for confirmation. Rejections come back unmodified.
    async fn send(&self, tx: &Transaction) -> Result<Signature, MintError>;
}

#[async_trait]
impl TransactionSubmitter for RpcClient {
    async fn latest_blockhash(&self) -> Result<Hash, MintError> {
        Ok(self.get_latest_blockhash().await?)
    }

    async fn send(&self, tx: &Transaction) -> Result<Signature, MintError> {
        Ok(self.send_and_confirm_transaction(tx).await?)
    }
}

/// Name, symbol and URI of an asset whose metadata is already hosted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

impl AssetMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            uri: uri.into(),
        }
    }
}

/// Where a new mint goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MintTarget {
    Standalone { id: u64, mark_as_collection: bool },
    Collection { parent: u64, child: u64 },
}

/// Result of a successful mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintReceipt {
    pub signature: Signature,
    pub accounts: MintAccounts,
    pub uri: String,
}

pub struct MintOrchestrator<S> {
    client: UskzDeviantClient,
    submitter: S,
    compute_unit_limit: Option<u32>,
}

impl<S: TransactionSubmitter> MintOrchestrator<S> {
    pub fn new(client: UskzDeviantClient, submitter: S) -> Self {
        Self {
            client,
            submitter,
            compute_unit_limit: None,
        }
    }

    /// Prepend a compute-unit limit instruction to every transaction.
    pub fn with_compute_unit_limit(mut self, units: u32) -> Self {
        self.compute_unit_limit = Some(units);
        self
    }

    pub fn client(&self) -> &UskzDeviantClient {
        &self.client
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Invoke the program's `initialize` instruction.
    pub async fn initialize(&self, payer: &Keypair) -> Result<Signature, MintError> {
        let ix = self.client.initialize_ix(payer.pubkey())?;
        self.submit(payer, ix).await
    }

    /// Mint a top-level NFT seeded by `id`.
    pub async fn mint_standalone(
        &self,
        payer: &Keypair,
        id: u64,
        asset: AssetMetadata,
        mark_as_collection: bool,
    ) -> Result<MintReceipt, MintError> {
        let uri = asset.uri.clone();
        let (ix, accounts) = self.client.create_single_nft_ix(CreateSingleNftParams {
            payer: payer.pubkey(),
            id,
            name: asset.name,
            symbol: asset.symbol,
            uri: asset.uri,
            is_collection: mark_as_collection,
        })?;
        debug!(id, mint = %accounts.mint, metadata = %accounts.metadata, edition = %accounts.master_edition, "derived accounts");

        let signature = self.submit(payer, ix).await?;
        info!(id, %signature, mint = %accounts.mint, mark_as_collection, "minted");
        Ok(MintReceipt {
            signature,
            accounts,
            uri,
        })
    }

    /// Mint `child` into the collection whose parent was minted with `parent`.
    pub async fn mint_into_collection(
        &self,
        payer: &Keypair,
        parent: u64,
        child: u64,
        asset: AssetMetadata,
    ) -> Result<MintReceipt, MintError> {
        let uri = asset.uri.clone();
        let (ix, accounts) = self.client.mint_to_collection_ix(MintToCollectionParams {
            payer: payer.pubkey(),
            parent_id: parent,
            child_id: child,
            name: asset.name,
            symbol: asset.symbol,
            uri: asset.uri,
        })?;
        debug!(parent, child, mint = %accounts.mint, "derived collection item accounts");

        let signature = self.submit(payer, ix).await?;
        info!(parent, child, %signature, mint = %accounts.mint, "minted into collection");
        Ok(MintReceipt {
            signature,
            accounts,
            uri,
        })
    }

    /// Upload the asset, then mint it. Nothing is uploaded if the name or
    /// symbol would be rejected, and nothing is submitted if the upload fails.
    pub async fn upload_and_mint(
        &self,
        payer: &Keypair,
        uploader: &dyn MetadataUploader,
        upload: &AssetUpload,
        target: MintTarget,
    ) -> Result<MintReceipt, MintError> {
        check_len("name", &upload.name, NAME_MAX_LEN)?;
        check_len("symbol", &upload.symbol, SYMBOL_MAX_LEN)?;

        let uri = uploader.upload(upload).await.inspect_err(|e| {
            warn!(error = %e, name = %upload.name, "upload failed, not minting");
        })?;
        let asset = AssetMetadata::new(upload.name.clone(), upload.symbol.clone(), uri);
        match target {
            MintTarget::Standalone {
                id,
                mark_as_collection,
            } => self.mint_standalone(payer, id, asset, mark_as_collection).await,
            MintTarget::Collection { parent, child } => {
                self.mint_into_collection(payer, parent, child, asset).await
            }
        }
    }

    async fn submit(&self, payer: &Keypair, ix: Instruction) -> Result<Signature, MintError> {
        let mut ixs = Vec::with_capacity(2);
        if let Some(units) = self.compute_unit_limit {
            ixs.push(self.client.set_compute_unit_limit_ix(units));
        }
        ixs.push(ix);

        let blockhash = self.submitter.latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(&ixs, Some(&payer.pubkey()), &[payer], blockhash);
        self.submitter.send(&tx).await.inspect_err(|e| {
            warn!(error = %e, "transaction failed");
        })
    }
}
