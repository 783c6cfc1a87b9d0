//! Instruction types for the USKZ Deviant program.
//!
//! The program is an Anchor program: instruction data is an 8-byte
//! discriminator, `sha256("global:<name>")[..8]`, followed by the
//! Borsh-encoded arguments in declaration order.

use {borsh::BorshSerialize, solana_sdk::hash::hash};

/// Length of the Anchor instruction discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Instructions exposed by the USKZ Deviant program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UskzInstruction {
    /// One-time program setup
    Initialize,
    /// Mint a single NFT under `["mint", id]`
    CreateSingleNft {
        /// Identifier used as the mint seed
        id: u64,
        /// Token name
        name: String,
        /// Token symbol
        symbol: String,
        /// Off-chain JSON metadata URI
        uri: String,
        /// If true, the NFT is created as a sized collection parent
        is_collection: bool,
    },
    /// Mint an NFT under `["mint", id_collection, id_nft]` that belongs to a collection
    MintToCollection {
        /// Identifier of the collection parent
        id_collection: u64,
        /// Identifier of the new item
        id_nft: u64,
        /// Token name
        name: String,
        /// Token symbol
        symbol: String,
        /// Off-chain JSON metadata URI
        uri: String,
    },
}

impl UskzInstruction {
    /// The instruction's name as declared in the program.
    pub fn name(&self) -> &'static str {
        match self {
            UskzInstruction::Initialize => "initialize",
            UskzInstruction::CreateSingleNft { .. } => "create_single_nft",
            UskzInstruction::MintToCollection { .. } => "mint_to_collection",
        }
    }

    /// Anchor discriminator for this instruction.
    pub fn discriminator(&self) -> [u8; DISCRIMINATOR_LEN] {
        sighash(self.name())
    }

    /// Pack the instruction into Anchor wire format.
    pub fn pack(&self) -> std::io::Result<Vec<u8>> {
        let mut data = self.discriminator().to_vec();
        match self {
            UskzInstruction::Initialize => {}
            UskzInstruction::CreateSingleNft {
                id,
                name,
                symbol,
                uri,
                is_collection,
            } => {
                id.serialize(&mut data)?;
                name.serialize(&mut data)?;
                symbol.serialize(&mut data)?;
                uri.serialize(&mut data)?;
                is_collection.serialize(&mut data)?;
            }
            UskzInstruction::MintToCollection {
                id_collection,
                id_nft,
                name,
                symbol,
                uri,
            } => {
                id_collection.serialize(&mut data)?;
                id_nft.serialize(&mut data)?;
                name.serialize(&mut data)?;
                symbol.serialize(&mut data)?;
                uri.serialize(&mut data)?;
            }
        }
        Ok(data)
    }
}

/// `sha256("global:<name>")[..8]`
pub fn sighash(name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let preimage = format!("global:{name}");
    let digest = hash(preimage.as_bytes()).to_bytes();
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_discriminator_matches_anchor() {
        assert_eq!(
            UskzInstruction::Initialize.pack().unwrap(),
            vec![175, 175, 109, 31, 13, 152, 155, 237]
        );
    }

    #[test]
    fn create_single_nft_layout() {
        let data = UskzInstruction::CreateSingleNft {
            id: 1,
            name: "uskz deviant".into(),
            symbol: "USKZ".into(),
            uri: "https://u".into(),
            is_collection: true,
        }
        .pack()
        .unwrap();

        assert_eq!(&data[..8], &sighash("create_single_nft"));
        let mut expected = 1u64.to_le_bytes().to_vec();
        expected.extend_from_slice(&12u32.to_le_bytes());
        expected.extend_from_slice(b"uskz deviant");
        expected.extend_from_slice(&4u32.to_le_bytes());
        expected.extend_from_slice(b"USKZ");
        expected.extend_from_slice(&9u32.to_le_bytes());
        expected.extend_from_slice(b"https://u");
        expected.push(1);
        assert_eq!(&data[8..], &expected[..]);
    }

    #[test]
    fn mint_to_collection_puts_collection_id_first() {
        let data = UskzInstruction::MintToCollection {
            id_collection: 1,
            id_nft: 2,
            name: String::new(),
            symbol: String::new(),
            uri: String::new(),
        }
        .pack()
        .unwrap();
        assert_eq!(&data[..8], &sighash("mint_to_collection"));
        assert_eq!(&data[8..16], &1u64.to_le_bytes());
        assert_eq!(&data[16..24], &2u64.to_le_bytes());
        assert_eq!(data.len(), 8 + 16 + 12);
    }

    #[test]
    fn discriminators_are_distinct() {
        let a = sighash("initialize");
        let b = sighash("create_single_nft");
        let c = sighash("mint_to_collection");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }
}
