use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use uskz_deviant_sdk::{pda, MintAccounts, MintSeed, UskzDeviantClient, METADATA_PROGRAM_ID};

fn program_id() -> Pubkey {
    std::env::var("USKZ_PROGRAM_ID")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| Pubkey::new_from_array([0x55; 32]))
}

#[test]
fn identifier_one_derives_identically_twice() {
    let owner = Keypair::new().pubkey();
    let client = UskzDeviantClient::new(program_id());

    let first = client.derive_accounts(&owner, MintSeed::Standalone(1)).unwrap();
    let second = client.derive_accounts(&owner, MintSeed::Standalone(1)).unwrap();

    assert_eq!(first.mint, second.mint);
    assert_eq!(first.metadata, second.metadata);
    assert_eq!(first.master_edition, second.master_edition);
    assert_eq!(first, second);
}

#[test]
fn standalone_and_collection_seeds_never_collide() {
    let program_id = program_id();
    let mut seen = std::collections::HashSet::new();
    for i in 0..16u64 {
        let (top, _) = pda::find_mint_pda(&program_id, MintSeed::Standalone(i)).unwrap();
        assert!(seen.insert(top), "collision at ({i})");
        for j in 0..16u64 {
            let (child, _) =
                pda::find_mint_pda(&program_id, MintSeed::CollectionItem { parent: i, child: j })
                    .unwrap();
            assert!(seen.insert(child), "collision at ({i}, {j})");
        }
    }
}

#[test]
fn every_derived_account_is_distinct() {
    let owner = Pubkey::new_unique();
    let a = MintAccounts::derive(&program_id(), &METADATA_PROGRAM_ID, &owner, MintSeed::Standalone(1))
        .unwrap();
    let all = [a.mint, a.token_account, a.metadata, a.master_edition];
    for (i, x) in all.iter().enumerate() {
        for y in &all[i + 1..] {
            assert_ne!(x, y);
        }
    }
}

#[test]
fn metadata_matches_runtime_formula() {
    let mint = Pubkey::new_unique();
    let (ours, bump) = pda::find_metadata_pda(&METADATA_PROGRAM_ID, &mint).unwrap();
    let (runtime, runtime_bump) = Pubkey::find_program_address(
        &[&b"metadata"[..], METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &METADATA_PROGRAM_ID,
    );
    assert_eq!((ours, bump), (runtime, runtime_bump));
}
