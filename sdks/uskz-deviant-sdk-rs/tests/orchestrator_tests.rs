use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use uskz_deviant_sdk::{
    instruction::sighash, AssetMetadata, AssetUpload, MetadataUploader, MintError,
    MintOrchestrator, MintSeed, MintTarget, NftStorageUploader, TransactionSubmitter,
    UploadError, UskzDeviantClient, SYSTEM_PROGRAM_ID,
};

#[derive(Default)]
struct RecordingSubmitter {
    sent: Mutex<Vec<Transaction>>,
    reject_with: Option<String>,
}

impl RecordingSubmitter {
    fn rejecting(message: &str) -> Self {
        Self {
            sent: Mutex::default(),
            reject_with: Some(message.to_string()),
        }
    }

    fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSubmitter for RecordingSubmitter {
    async fn latest_blockhash(&self) -> Result<Hash, MintError> {
        Ok(Hash::new_unique())
    }

    async fn send(&self, tx: &Transaction) -> Result<Signature, MintError> {
        self.sent.lock().unwrap().push(tx.clone());
        match &self.reject_with {
            Some(msg) => Err(ClientError::from(ClientErrorKind::Custom(msg.clone())).into()),
            None => Ok(tx.signatures[0]),
        }
    }
}

struct FixedUploader {
    uri: Result<String, u16>,
    calls: AtomicUsize,
}

impl FixedUploader {
    fn ok(uri: &str) -> Self {
        Self {
            uri: Ok(uri.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            uri: Err(status),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MetadataUploader for FixedUploader {
    async fn upload(&self, _asset: &AssetUpload) -> Result<String, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.uri {
            Ok(uri) => Ok(uri.clone()),
            Err(status) => Err(UploadError::Rejected {
                status: *status,
                message: "quota exceeded".into(),
            }),
        }
    }
}

fn orchestrator(submitter: RecordingSubmitter) -> MintOrchestrator<RecordingSubmitter> {
    MintOrchestrator::new(
        UskzDeviantClient::new(Pubkey::new_from_array([3u8; 32])),
        submitter,
    )
}

fn image() -> AssetUpload {
    AssetUpload {
        name: "uskz deviant".into(),
        symbol: "USKZ".into(),
        description: "first of its kind".into(),
        image: vec![0x89, b'P', b'N', b'G'],
        content_type: "image/png".into(),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn standalone_mint_submits_one_signed_transaction() {
    let orch = orchestrator(RecordingSubmitter::default());
    let payer = Keypair::new();

    let receipt = orch
        .mint_standalone(
            &payer,
            1,
            AssetMetadata::new("uskz deviant", "USKZ", "https://example.com/1.json"),
            true,
        )
        .await
        .unwrap();

    let sent = orch.submitter().sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert!(tx.verify().is_ok());
    assert_eq!(receipt.signature, tx.signatures[0]);
    assert_ne!(receipt.signature, Signature::default());

    let expected = orch
        .client()
        .derive_accounts(&payer.pubkey(), MintSeed::Standalone(1))
        .unwrap();
    assert_eq!(receipt.accounts, expected);

    assert_eq!(tx.message.instructions.len(), 1);
    let data = &tx.message.instructions[0].data;
    assert_eq!(&data[..8], &sighash("create_single_nft"));
    assert_eq!(&data[8..16], &1u64.to_le_bytes());
    assert_eq!(data.last(), Some(&1u8), "collection flag");
    assert!(tx.message.account_keys.contains(&expected.mint));
    assert!(tx.message.account_keys.contains(&expected.master_edition));
}

#[tokio::test]
async fn initialize_submits_payer_and_system_program() {
    let orch = orchestrator(RecordingSubmitter::default());
    let payer = Keypair::new();

    let signature = orch.initialize(&payer).await.unwrap();

    let sent = orch.submitter().sent();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0];
    assert!(tx.verify().is_ok());
    assert_eq!(signature, tx.signatures[0]);

    let ix = &tx.message.instructions[0];
    assert_eq!(ix.data, sighash("initialize").to_vec());
    let keys: Vec<Pubkey> = ix
        .accounts
        .iter()
        .map(|&i| tx.message.account_keys[i as usize])
        .collect();
    assert_eq!(keys, vec![payer.pubkey(), SYSTEM_PROGRAM_ID]);
    assert_eq!(
        tx.message.account_keys[ix.program_id_index as usize],
        orch.client().program_id
    );
}

#[tokio::test]
async fn collection_mint_references_parent_mint() {
    let orch = orchestrator(RecordingSubmitter::default());
    let payer = Keypair::new();

    let receipt = orch
        .mint_into_collection(
            &payer,
            1,
            2,
            AssetMetadata::new("uskz deviant #1", "USKZ1", "https://example.com/2.json"),
        )
        .await
        .unwrap();

    let parent_mint = orch.client().mint_pda(1).unwrap();
    assert_eq!(receipt.accounts.mint, orch.client().collection_item_pda(1, 2).unwrap());

    let sent = orch.submitter().sent();
    assert_eq!(sent.len(), 1);
    let ix = &sent[0].message.instructions[0];
    let last = *ix.accounts.last().unwrap() as usize;
    assert_eq!(sent[0].message.account_keys[last], parent_mint);
    assert_eq!(&ix.data[..8], &sighash("mint_to_collection"));
}

#[tokio::test]
async fn compute_limit_is_prepended() {
    let orch = orchestrator(RecordingSubmitter::default()).with_compute_unit_limit(400_000);
    let payer = Keypair::new();
    orch.mint_standalone(&payer, 7, AssetMetadata::new("n", "S", "u"), false)
        .await
        .unwrap();

    let sent = orch.submitter().sent();
    let tx = &sent[0];
    assert_eq!(tx.message.instructions.len(), 2);
    let first = &tx.message.instructions[0];
    assert_eq!(
        tx.message.account_keys[first.program_id_index as usize],
        ComputeBudgetInstruction::set_compute_unit_limit(1).program_id
    );
}

#[tokio::test]
async fn rejection_is_surfaced_verbatim() {
    let orch = orchestrator(RecordingSubmitter::rejecting(
        "custom program error: 0x0 (account already in use)",
    ));
    let err = orch
        .mint_standalone(&Keypair::new(), 1, AssetMetadata::new("n", "S", "u"), false)
        .await
        .unwrap_err();

    assert!(matches!(err, MintError::Transaction(_)));
    assert!(err.to_string().contains("account already in use"));
    assert_eq!(orch.submitter().sent().len(), 1);
}

#[tokio::test]
async fn invalid_fields_never_reach_the_network() {
    let orch = orchestrator(RecordingSubmitter::default());
    let err = orch
        .mint_standalone(
            &Keypair::new(),
            1,
            AssetMetadata::new("x".repeat(33), "S", "u"),
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MintError::FieldTooLong { field: "name", .. }));
    assert!(orch.submitter().sent().is_empty());
}

#[tokio::test]
async fn uploaded_uri_flows_into_instruction() {
    let orch = orchestrator(RecordingSubmitter::default());
    let uploader = FixedUploader::ok("https://gw/ipfs/bafymeta");

    let receipt = orch
        .upload_and_mint(
            &Keypair::new(),
            &uploader,
            &image(),
            MintTarget::Standalone {
                id: 1,
                mark_as_collection: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(receipt.uri, "https://gw/ipfs/bafymeta");
    assert_eq!(uploader.calls.load(Ordering::SeqCst), 1);
    let sent = orch.submitter().sent();
    assert!(contains(
        &sent[0].message.instructions[0].data,
        b"https://gw/ipfs/bafymeta"
    ));
}

#[tokio::test]
async fn upload_failure_skips_mint() {
    let orch = orchestrator(RecordingSubmitter::default());
    let uploader = FixedUploader::failing(429);

    let err = orch
        .upload_and_mint(
            &Keypair::new(),
            &uploader,
            &image(),
            MintTarget::Collection {
                parent: 1,
                child: 2,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MintError::Upload(UploadError::Rejected { status: 429, .. })
    ));
    assert!(orch.submitter().sent().is_empty());
}

#[tokio::test]
async fn oversized_name_is_rejected_before_upload() {
    let orch = orchestrator(RecordingSubmitter::default());
    let uploader = FixedUploader::ok("https://gw/ipfs/bafymeta");
    let asset = AssetUpload {
        name: "n".repeat(33),
        ..image()
    };

    let err = orch
        .upload_and_mint(
            &Keypair::new(),
            &uploader,
            &asset,
            MintTarget::Standalone {
                id: 1,
                mark_as_collection: false,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MintError::FieldTooLong {
            field: "name",
            len: 33,
            max: 32
        }
    ));
    assert_eq!(uploader.calls.load(Ordering::SeqCst), 0);
    assert!(orch.submitter().sent().is_empty());
}

#[tokio::test]
async fn unreachable_storage_skips_mint() {
    let orch = orchestrator(RecordingSubmitter::default());
    // Port 9 (discard) is not listening on test machines.
    let uploader = NftStorageUploader::new("http://127.0.0.1:9", "token");

    let err = orch
        .upload_and_mint(
            &Keypair::new(),
            &uploader,
            &image(),
            MintTarget::Standalone {
                id: 1,
                mark_as_collection: true,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MintError::Upload(_)), "{err}");
    assert!(orch.submitter().sent().is_empty());
}

#[tokio::test]
async fn from_file_reads_image_and_type() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("deviant.jpg");
    std::fs::write(&path, [0xff, 0xd8, 0xff])?;

    let asset = AssetUpload::from_file(&path, "uskz deviant", "USKZ", "desc")?;
    assert_eq!(asset.content_type, "image/jpeg");
    assert_eq!(asset.image, vec![0xff, 0xd8, 0xff]);

    let missing = AssetUpload::from_file(dir.path().join("nope.png"), "n", "s", "d");
    assert!(matches!(missing, Err(UploadError::Io { .. })));
    Ok(())
}
