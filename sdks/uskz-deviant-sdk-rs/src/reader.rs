//! Read-side helpers: fetch and decode metadata accounts.

use borsh::BorshDeserialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;

use crate::error::MintError;
use crate::pda;

/// Account discriminant of a Metaplex `MetadataV1` account.
pub const METADATA_V1_KEY: u8 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Creator {
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

/// Collection an NFT claims membership of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionRef {
    pub verified: bool,
    pub key: Pubkey,
}

/// Present only on collection parents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionDetails {
    V1 { size: u64 },
    V2,
}

/// Decoded metadata account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataAccount {
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Vec<Creator>,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
    pub edition_nonce: Option<u8>,
    pub token_standard: Option<u8>,
    pub collection: Option<CollectionRef>,
    pub collection_details: Option<CollectionDetails>,
}

impl MetadataAccount {
    /// Whether this NFT can act as the collection of other NFTs.
    pub fn is_collection_parent(&self) -> bool {
        self.collection_details.is_some()
    }

    /// Mint of the collection this NFT belongs to, if any.
    pub fn collection_key(&self) -> Option<Pubkey> {
        self.collection.as_ref().map(|c| c.key)
    }

    /// Decode account data. Fields after `is_mutable` were added over time and
    /// may be absent on older accounts.
    pub fn unpack(data: &[u8]) -> std::io::Result<Self> {
        let mut buf = data;
        let head = RawHead::deserialize(&mut buf)?;
        if head.key != METADATA_V1_KEY {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unexpected account key {}", head.key),
            ));
        }
        let edition_nonce = tail::<u8>(&mut buf)?;
        let token_standard = tail::<u8>(&mut buf)?;
        let collection = tail::<RawCollection>(&mut buf)?;
        let _uses = tail::<RawUses>(&mut buf)?;
        let collection_details = tail::<RawCollectionDetails>(&mut buf)?;

        Ok(Self {
            update_authority: Pubkey::new_from_array(head.update_authority),
            mint: Pubkey::new_from_array(head.mint),
            name: trim_padding(head.name),
            symbol: trim_padding(head.symbol),
            uri: trim_padding(head.uri),
            seller_fee_basis_points: head.seller_fee_basis_points,
            creators: head
                .creators
                .unwrap_or_default()
                .into_iter()
                .map(|c| Creator {
                    address: Pubkey::new_from_array(c.address),
                    verified: c.verified,
                    share: c.share,
                })
                .collect(),
            primary_sale_happened: head.primary_sale_happened,
            is_mutable: head.is_mutable,
            edition_nonce,
            token_standard,
            collection: collection.map(|c| CollectionRef {
                verified: c.verified,
                key: Pubkey::new_from_array(c.key),
            }),
            collection_details: collection_details.map(|d| match d {
                RawCollectionDetails::V1 { size } => CollectionDetails::V1 { size },
                RawCollectionDetails::V2 { .. } => CollectionDetails::V2,
            }),
        })
    }
}

#[derive(BorshDeserialize)]
struct RawHead {
    key: u8,
    update_authority: [u8; 32],
    mint: [u8; 32],
    name: String,
    symbol: String,
    uri: String,
    seller_fee_basis_points: u16,
    creators: Option<Vec<RawCreator>>,
    primary_sale_happened: bool,
    is_mutable: bool,
}

#[derive(BorshDeserialize)]
struct RawCreator {
    address: [u8; 32],
    verified: bool,
    share: u8,
}

#[derive(BorshDeserialize)]
struct RawCollection {
    verified: bool,
    key: [u8; 32],
}

#[derive(BorshDeserialize)]
#[allow(dead_code)]
struct RawUses {
    use_method: u8,
    remaining: u64,
    total: u64,
}

#[derive(BorshDeserialize)]
#[allow(dead_code)]
enum RawCollectionDetails {
    V1 { size: u64 },
    V2 { padding: [u8; 8] },
}

fn tail<T: BorshDeserialize>(buf: &mut &[u8]) -> std::io::Result<Option<T>> {
    if buf.is_empty() {
        return Ok(None);
    }
    Option::<T>::deserialize(buf)
}

fn trim_padding(s: String) -> String {
    s.trim_end_matches('\0').to_string()
}

/// Reads metadata accounts over RPC.
pub struct MetadataReader {
    metadata_program_id: Pubkey,
    rpc: RpcClient,
}

impl MetadataReader {
    pub fn new(metadata_program_id: Pubkey, rpc: RpcClient) -> Self {
        Self {
            metadata_program_id,
            rpc,
        }
    }

    /// Fetch the metadata account for `mint`. `None` if it does not exist.
    pub async fn metadata_for_mint(&self, mint: &Pubkey) -> Result<Option<MetadataAccount>, MintError> {
        let (address, _) = pda::find_metadata_pda(&self.metadata_program_id, mint)?;
        let account = self
            .rpc
            .get_account_with_commitment(&address, self.rpc.commitment())
            .await?
            .value;
        let Some(account) = account else {
            return Ok(None);
        };
        if account.owner != self.metadata_program_id {
            return Ok(None);
        }
        MetadataAccount::unpack(&account.data)
            .map(Some)
            .map_err(|source| MintError::Decode { address, source })
    }
}
