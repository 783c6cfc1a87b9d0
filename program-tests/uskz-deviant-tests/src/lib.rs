use std::{
    future::Future,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tokio::time::sleep;
use uskz_deviant_sdk::{MetadataReader, MintOrchestrator, UskzDeviantClient, METADATA_PROGRAM_ID};

/// Metadata document used by the live scenarios.
pub const TEST_NFT_URI: &str = "https://gist.githubusercontent.com/prasmalla/447c6cf49f50bd25616d20b09f9db446/raw/c142d0af6f239bbceedec47ccc7ccb46162b1e1b/marbles-1.json";

/// Mint plus metadata CPI needs more than the default compute budget.
pub const MINT_COMPUTE_UNITS: u32 = 400_000;

/// Connection details for a local validator with the program deployed.
pub struct TestContext {
    pub rpc_url: String,
    pub program_id: Pubkey,
}

impl TestContext {
    /// Read `USKZ_RPC` (default `http://localhost:8899`) and `USKZ_PROGRAM_ID`.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv().ok();
        let rpc_url =
            std::env::var("USKZ_RPC").unwrap_or_else(|_| "http://localhost:8899".to_string());
        let program_id = std::env::var("USKZ_PROGRAM_ID")
            .context("USKZ_PROGRAM_ID env var is required")?
            .parse()
            .context("USKZ_PROGRAM_ID must be a base58 pubkey")?;
        Ok(Self {
            rpc_url,
            program_id,
        })
    }

    pub fn rpc(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), CommitmentConfig::confirmed())
    }

    pub fn client(&self) -> UskzDeviantClient {
        UskzDeviantClient::new(self.program_id)
    }

    pub fn orchestrator(&self) -> MintOrchestrator<RpcClient> {
        MintOrchestrator::new(self.client(), self.rpc()).with_compute_unit_limit(MINT_COMPUTE_UNITS)
    }

    pub fn reader(&self) -> MetadataReader {
        MetadataReader::new(METADATA_PROGRAM_ID, self.rpc())
    }

    /// Fresh keypair funded from the validator faucet.
    pub async fn funded_payer(&self) -> anyhow::Result<Keypair> {
        let payer = Keypair::new();
        let rpc = self.rpc();
        let sig = rpc
            .request_airdrop(&payer.pubkey(), 2 * LAMPORTS_PER_SOL)
            .await?;
        for _ in 0..60 {
            if rpc.confirm_transaction(&sig).await? {
                return Ok(payer);
            }
            sleep(Duration::from_millis(500)).await;
        }
        anyhow::bail!("airdrop {sig} not confirmed")
    }
}

/// Identifier unlikely to collide with mints from earlier runs on the same validator.
pub fn unique_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Run a live scenario, failing the test on any error.
pub async fn run<F, Fut>(test: F)
where
    F: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    init_tracing();
    let ctx = match TestContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => panic!("test environment: {e:#}"),
    };
    tracing::info!(program_id = %ctx.program_id, rpc = %ctx.rpc_url, "running scenario");
    if let Err(e) = test(ctx).await {
        panic!("{e:?}");
    }
}
