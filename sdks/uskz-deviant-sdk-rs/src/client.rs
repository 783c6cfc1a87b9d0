use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    sysvar,
};

use crate::error::MintError;
use crate::instruction::UskzInstruction;
use crate::pda::{self, DerivationError, MintAccounts, MintSeed};
use crate::{
    ASSOCIATED_TOKEN_PROGRAM_ID, METADATA_PROGRAM_ID, NAME_MAX_LEN, SYMBOL_MAX_LEN,
    SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID, URI_MAX_LEN,
};

/// Thin client for building PDAs and instructions for the USKZ Deviant program.
///
/// The `program_id` must be the deployed USKZ Deviant program id.
#[derive(Clone, Copy, Debug)]
pub struct UskzDeviantClient {
    pub program_id: Pubkey,
    pub metadata_program_id: Pubkey,
}

impl UskzDeviantClient {
    /// Client targeting the canonical Metaplex metadata program.
    pub fn new(program_id: Pubkey) -> Self {
        Self::with_metadata_program(program_id, METADATA_PROGRAM_ID)
    }

    pub fn with_metadata_program(program_id: Pubkey, metadata_program_id: Pubkey) -> Self {
        Self {
            program_id,
            metadata_program_id,
        }
    }

    /// Derive the mint PDA for a top-level identifier.
    pub fn mint_pda(&self, id: u64) -> Result<Pubkey, DerivationError> {
        Ok(pda::find_mint_pda(&self.program_id, MintSeed::Standalone(id))?.0)
    }

    /// Derive the mint PDA for an item inside collection `parent`.
    pub fn collection_item_pda(&self, parent: u64, child: u64) -> Result<Pubkey, DerivationError> {
        Ok(pda::find_mint_pda(&self.program_id, MintSeed::CollectionItem { parent, child })?.0)
    }

    /// Derive the metadata PDA for a mint.
    pub fn metadata_pda(&self, mint: &Pubkey) -> Result<Pubkey, DerivationError> {
        Ok(pda::find_metadata_pda(&self.metadata_program_id, mint)?.0)
    }

    /// Derive the master edition PDA for a mint.
    pub fn master_edition_pda(&self, mint: &Pubkey) -> Result<Pubkey, DerivationError> {
        Ok(pda::find_master_edition_pda(&self.metadata_program_id, mint)?.0)
    }

    /// Derive every account a mint instruction touches.
    pub fn derive_accounts(
        &self,
        owner: &Pubkey,
        seed: MintSeed,
    ) -> Result<MintAccounts, DerivationError> {
        MintAccounts::derive(&self.program_id, &self.metadata_program_id, owner, seed)
    }

    /// Build an Initialize instruction.
    ///
    /// Accounts (strict order):
    /// - payer (writable, signer)
    /// - system_program (readonly)
    pub fn initialize_ix(&self, payer: Pubkey) -> Result<Instruction, MintError> {
        Ok(Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(payer, true),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            data: UskzInstruction::Initialize.pack()?,
        })
    }

    /// Build a CreateSingleNft instruction.
    ///
    /// Accounts (strict order):
    /// - payer (writable, signer)
    /// - mint (writable)
    /// - token_account (writable)
    /// - associated_token_program (readonly)
    /// - rent (readonly)
    /// - system_program (readonly)
    /// - token_program (readonly)
    /// - metadata_program (readonly)
    /// - master_edition_account (writable)
    /// - nft_metadata (writable)
    pub fn create_single_nft_ix(
        &self,
        params: CreateSingleNftParams,
    ) -> Result<(Instruction, MintAccounts), MintError> {
        validate_metadata_fields(&params.name, &params.symbol, &params.uri)?;
        let accounts = self.derive_accounts(&params.payer, MintSeed::Standalone(params.id))?;

        let data = UskzInstruction::CreateSingleNft {
            id: params.id,
            name: params.name,
            symbol: params.symbol,
            uri: params.uri,
            is_collection: params.is_collection,
        }
        .pack()?;

        Ok((
            Instruction {
                program_id: self.program_id,
                accounts: self.mint_account_metas(params.payer, &accounts),
                data,
            },
            accounts,
        ))
    }

    /// Build a MintToCollection instruction.
    ///
    /// Accounts (strict order): the CreateSingleNft list, followed by
    /// - collection (readonly), the parent's mint
    pub fn mint_to_collection_ix(
        &self,
        params: MintToCollectionParams,
    ) -> Result<(Instruction, MintAccounts), MintError> {
        validate_metadata_fields(&params.name, &params.symbol, &params.uri)?;
        let accounts = self.derive_accounts(
            &params.payer,
            MintSeed::CollectionItem {
                parent: params.parent_id,
                child: params.child_id,
            },
        )?;
        let collection = self.mint_pda(params.parent_id)?;

        let data = UskzInstruction::MintToCollection {
            id_collection: params.parent_id,
            id_nft: params.child_id,
            name: params.name,
            symbol: params.symbol,
            uri: params.uri,
        }
        .pack()?;

        let mut metas = self.mint_account_metas(params.payer, &accounts);
        metas.push(AccountMeta::new_readonly(collection, false));

        Ok((
            Instruction {
                program_id: self.program_id,
                accounts: metas,
                data,
            },
            accounts,
        ))
    }

    /// Build a ComputeBudget set_compute_unit_limit instruction.
    pub fn set_compute_unit_limit_ix(&self, units: u32) -> Instruction {
        ComputeBudgetInstruction::set_compute_unit_limit(units)
    }

    fn mint_account_metas(&self, payer: Pubkey, accounts: &MintAccounts) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(payer, true),
            AccountMeta::new(accounts.mint, false),
            AccountMeta::new(accounts.token_account, false),
            AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
            AccountMeta::new_readonly(self.metadata_program_id, false),
            AccountMeta::new(accounts.master_edition, false),
            AccountMeta::new(accounts.metadata, false),
        ]
    }
}

// === Params ===
/// Parameters for the CreateSingleNft instruction.
#[derive(Clone, Debug)]
pub struct CreateSingleNftParams {
    /// Fee payer; also receives the minted token
    pub payer: Pubkey,
    /// Identifier used as the mint seed
    pub id: u64,
    /// Token name (<= NAME_MAX_LEN)
    pub name: String,
    /// Token symbol (<= SYMBOL_MAX_LEN)
    pub symbol: String,
    /// Metadata URI (<= URI_MAX_LEN)
    pub uri: String,
    /// Mark the NFT as a collection parent
    pub is_collection: bool,
}

/// Parameters for the MintToCollection instruction.
#[derive(Clone, Debug)]
pub struct MintToCollectionParams {
    pub payer: Pubkey,
    /// Identifier of the collection parent, minted earlier with `is_collection`
    pub parent_id: u64,
    pub child_id: u64,
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

// === Validation helpers ===
fn validate_metadata_fields(name: &str, symbol: &str, uri: &str) -> Result<(), MintError> {
    check_len("name", name, NAME_MAX_LEN)?;
    check_len("symbol", symbol, SYMBOL_MAX_LEN)?;
    check_len("uri", uri, URI_MAX_LEN)
}

pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), MintError> {
    if value.len() > max {
        return Err(MintError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}
