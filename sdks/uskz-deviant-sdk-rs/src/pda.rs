//! Program-derived address helpers.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::{
    ASSOCIATED_TOKEN_PROGRAM_ID, EDITION_SEED, METADATA_SEED, MINT_SEED, TOKEN_PROGRAM_ID,
};

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds, including the bump.
pub const MAX_SEEDS: usize = 16;

/// Reasons a derivation can fail. All of them are configuration bugs.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DerivationError {
    /// A seed exceeded [`MAX_SEED_LEN`]
    #[error("seed {index} is {len} bytes, max is {MAX_SEED_LEN}")]
    SeedTooLong { index: usize, len: usize },
    /// More seeds than fit alongside the bump
    #[error("{0} seeds given, at most {max} allowed", max = MAX_SEEDS - 1)]
    TooManySeeds(usize),
    /// Every bump from 255 down to 0 landed on the curve
    #[error("no bump yields an off-curve address")]
    NoViableBump,
}

/// Derive a program address, searching the bump from 255 downward.
///
/// Returns the first off-curve address and the bump that produced it.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), DerivationError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(DerivationError::TooManySeeds(seeds.len()));
    }
    if let Some((index, seed)) = seeds
        .iter()
        .enumerate()
        .find(|(_, seed)| seed.len() > MAX_SEED_LEN)
    {
        return Err(DerivationError::SeedTooLong {
            index,
            len: seed.len(),
        });
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump = seeds.to_vec();
        with_bump.push(&bump_seed);
        if let Ok(address) = Pubkey::create_program_address(&with_bump, program_id) {
            return Ok((address, bump));
        }
    }
    Err(DerivationError::NoViableBump)
}

/// How a mint account is seeded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MintSeed {
    /// `["mint", id]`
    Standalone(u64),
    /// `["mint", parent, child]`
    CollectionItem { parent: u64, child: u64 },
}

impl MintSeed {
    /// Identifier passed to the program for the minted token itself.
    pub fn id(&self) -> u64 {
        match self {
            MintSeed::Standalone(id) => *id,
            MintSeed::CollectionItem { child, .. } => *child,
        }
    }
}

/// Derive the mint PDA for a seed under the minting program.
pub fn find_mint_pda(program_id: &Pubkey, seed: MintSeed) -> Result<(Pubkey, u8), DerivationError> {
    match seed {
        MintSeed::Standalone(id) => find_program_address(&[MINT_SEED, &id.to_le_bytes()], program_id),
        MintSeed::CollectionItem { parent, child } => find_program_address(
            &[MINT_SEED, &parent.to_le_bytes(), &child.to_le_bytes()],
            program_id,
        ),
    }
}

/// Derive the metadata PDA for a mint.
pub fn find_metadata_pda(
    metadata_program_id: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, u8), DerivationError> {
    find_program_address(
        &[METADATA_SEED, metadata_program_id.as_ref(), mint.as_ref()],
        metadata_program_id,
    )
}

/// Derive the master edition PDA for a mint.
pub fn find_master_edition_pda(
    metadata_program_id: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, u8), DerivationError> {
    find_program_address(
        &[
            METADATA_SEED,
            metadata_program_id.as_ref(),
            mint.as_ref(),
            EDITION_SEED,
        ],
        metadata_program_id,
    )
}

/// Derive the associated token account holding `mint` for `owner`.
pub fn find_associated_token_address(
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, u8), DerivationError> {
    find_program_address(
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
}

/// Every derived account a mint instruction needs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MintAccounts {
    pub mint: Pubkey,
    pub mint_bump: u8,
    pub token_account: Pubkey,
    pub metadata: Pubkey,
    pub metadata_bump: u8,
    pub master_edition: Pubkey,
    pub master_edition_bump: u8,
}

impl MintAccounts {
    /// Derive the mint, token, metadata and master edition addresses for `seed`,
    /// with `owner` receiving the minted token.
    pub fn derive(
        program_id: &Pubkey,
        metadata_program_id: &Pubkey,
        owner: &Pubkey,
        seed: MintSeed,
    ) -> Result<Self, DerivationError> {
        let (mint, mint_bump) = find_mint_pda(program_id, seed)?;
        let (token_account, _) = find_associated_token_address(owner, &mint)?;
        let (metadata, metadata_bump) = find_metadata_pda(metadata_program_id, &mint)?;
        let (master_edition, master_edition_bump) =
            find_master_edition_pda(metadata_program_id, &mint)?;
        Ok(Self {
            mint,
            mint_bump,
            token_account,
            metadata,
            metadata_bump,
            master_edition,
            master_edition_bump,
        })
    }
}
