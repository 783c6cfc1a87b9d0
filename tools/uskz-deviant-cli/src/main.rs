use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::{path::PathBuf, str::FromStr};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uskz_deviant_sdk::{
    upload::{DEFAULT_GATEWAY, DEFAULT_STORAGE_ENDPOINT},
    AssetMetadata, AssetUpload, MetadataReader, MetadataUploader, MintOrchestrator, MintReceipt,
    MintSeed, MintTarget, NftStorageUploader, UskzDeviantClient, METADATA_PROGRAM_ID,
};
use zeroize::Zeroize;

const DEFAULT_KEYPAIR: &str = "file:~/.config/solana/id.json";

fn parse_pubkey(s: &str) -> anyhow::Result<Pubkey> {
    Pubkey::from_str(s.trim()).with_context(|| format!("invalid pubkey {s}"))
}

#[derive(Clone, Debug)]
enum SignerSourceKind {
    Prompt,
    Stdin,
    File,
    Env,
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Accepts a Solana JSON byte array or a base58 secret key.
fn keypair_from_secret_text(text: &str) -> anyhow::Result<Keypair> {
    let trimmed = text.trim();
    let mut bytes: Vec<u8> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("keypair JSON must be a byte array")?
    } else {
        bs58::decode(trimmed)
            .into_vec()
            .context("keypair must be base58 or a JSON byte array")?
    };
    #[allow(deprecated)]
    let kp = Keypair::from_bytes(&bytes).map_err(|e| anyhow::anyhow!("invalid keypair: {e}"));
    bytes.zeroize();
    kp
}

fn keypair_from_source(spec: &str) -> anyhow::Result<Keypair> {
    use std::io::Read as _;
    let (kind, rest) = if let Some(rest) = spec.strip_prefix("file:") {
        (SignerSourceKind::File, Some(rest.to_string()))
    } else if let Some(rest) = spec.strip_prefix("env:") {
        (SignerSourceKind::Env, Some(rest.to_string()))
    } else if spec == "stdin" {
        (SignerSourceKind::Stdin, None)
    } else if spec == "prompt" {
        (SignerSourceKind::Prompt, None)
    } else {
        (SignerSourceKind::File, Some(spec.to_string()))
    };

    let mut secret: String = match (kind, rest) {
        (SignerSourceKind::Prompt, _) => {
            rpassword::prompt_password("enter signer private key (base58): ")?
        }
        (SignerSourceKind::Stdin, _) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        (SignerSourceKind::File, Some(path)) => {
            let path = expand_home(&path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("read {}", path.display()))?
        }
        (SignerSourceKind::Env, Some(var)) => {
            std::env::var(&var).with_context(|| format!("env {} not set", var))?
        }
        (_, None) => anyhow::bail!("signer source {spec} is missing a path or variable"),
    };
    let kp = keypair_from_secret_text(&secret);
    secret.zeroize();
    kp
}

#[derive(Parser, Debug)]
#[command(
    name = "uskz",
    version,
    about = "USKZ Deviant mint CLI",
    long_about = "Command-line interface for minting USKZ Deviant NFTs and collections.\nJSON is always printed to stdout; logs/status to stderr."
)]
struct Cli {
    /// RPC endpoint URL
    #[arg(
        default_value = "http://localhost:8899",
        env = "USKZ_RPC",
        global = true,
        long
    )]
    rpc: String,

    /// USKZ Deviant program id (base58). Required for on-chain operations
    #[arg(env = "USKZ_PROGRAM_ID", global = true, long)]
    program_id: Option<String>,

    /// Token metadata program id (base58)
    #[arg(env = "USKZ_METADATA_PROGRAM_ID", global = true, long)]
    metadata_program_id: Option<String>,

    /// Payer signer source: file:/path|env:VAR|stdin|prompt
    #[arg(
        long = "payer",
        alias = "keypair",
        env = "USKZ_PAYER",
        global = true,
        default_value = DEFAULT_KEYPAIR
    )]
    payer: String,

    /// Optional compute unit limit
    #[arg(global = true, long)]
    cu_units: Option<u32>,

    #[command(flatten)]
    storage: StorageArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct StorageArgs {
    /// Metadata storage endpoint
    #[arg(
        long,
        env = "USKZ_STORAGE_ENDPOINT",
        global = true,
        default_value = DEFAULT_STORAGE_ENDPOINT
    )]
    storage_endpoint: String,

    /// Metadata storage API token
    #[arg(long, env = "USKZ_STORAGE_TOKEN", global = true, hide_env_values = true)]
    storage_token: Option<String>,

    /// Gateway prefix for returned URIs
    #[arg(long, env = "USKZ_GATEWAY", global = true, default_value = DEFAULT_GATEWAY)]
    gateway: String,
}

impl StorageArgs {
    fn uploader(&self) -> anyhow::Result<NftStorageUploader> {
        let token = self
            .storage_token
            .as_ref()
            .context("--storage-token or USKZ_STORAGE_TOKEN required to upload")?;
        Ok(NftStorageUploader::new(&self.storage_endpoint, token).with_gateway(&self.gateway))
    }
}

/// Metadata for a mint: either an existing URI, or an image to upload first.
#[derive(Args, Debug)]
struct AssetArgs {
    /// Token name
    #[arg(long)]
    name: String,

    /// Token symbol
    #[arg(long)]
    symbol: String,

    /// Existing metadata URI
    #[arg(long, conflicts_with = "image", required_unless_present = "image")]
    uri: Option<String>,

    /// Local image to upload before minting
    #[arg(long)]
    image: Option<PathBuf>,

    /// Description for uploaded metadata
    #[arg(long, default_value = "")]
    description: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print derived addresses without touching the network
    #[command(alias = "addresses", about = "Derive mint, token, metadata and edition addresses")]
    Pda {
        /// Identifier of the mint (the child, when --parent is given)
        #[arg(long)]
        id: u64,
        /// Collection parent identifier
        #[arg(long)]
        parent: Option<u64>,
        /// Token owner (defaults to the payer)
        #[arg(long)]
        owner: Option<String>,
    },
    /// Call the program's initialize instruction
    #[command(alias = "initialize")]
    Init,
    /// Mint a standalone NFT, optionally as a collection parent
    #[command(alias = "create", about = "Mint a standalone NFT")]
    Mint {
        #[arg(long)]
        id: u64,
        /// Mark the NFT as a collection parent
        #[arg(long, default_value_t = false)]
        collection: bool,
        #[command(flatten)]
        asset: AssetArgs,
    },
    /// Mint an NFT into an existing collection
    #[command(alias = "mint-into-collection", about = "Mint an NFT into a collection")]
    MintToCollection {
        /// Collection parent identifier
        #[arg(long)]
        parent: u64,
        /// New item identifier
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        asset: AssetArgs,
    },
    /// Upload an image and its metadata document; prints the URI
    Upload {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show on-chain metadata for a mint
    #[command(alias = "inspect", alias = "info")]
    Show {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        parent: Option<u64>,
    },
}

impl Cli {
    fn client(&self) -> anyhow::Result<UskzDeviantClient> {
        let program_id = parse_pubkey(
            self.program_id
                .as_ref()
                .context("--program-id or USKZ_PROGRAM_ID required")?,
        )?;
        let metadata_program_id = match self.metadata_program_id.as_ref() {
            Some(s) => parse_pubkey(s)?,
            None => METADATA_PROGRAM_ID,
        };
        Ok(UskzDeviantClient::with_metadata_program(
            program_id,
            metadata_program_id,
        ))
    }

    fn rpc(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc.clone(), CommitmentConfig::confirmed())
    }

    fn orchestrator(&self) -> anyhow::Result<MintOrchestrator<RpcClient>> {
        let orch = MintOrchestrator::new(self.client()?, self.rpc());
        Ok(match self.cu_units {
            Some(units) => orch.with_compute_unit_limit(units),
            None => orch,
        })
    }
}

fn seed_for(id: u64, parent: Option<u64>) -> MintSeed {
    match parent {
        Some(parent) => MintSeed::CollectionItem { parent, child: id },
        None => MintSeed::Standalone(id),
    }
}

fn receipt_json(receipt: &MintReceipt) -> serde_json::Value {
    serde_json::json!({
        "signature": receipt.signature.to_string(),
        "uri": receipt.uri,
        "mint": receipt.accounts.mint.to_string(),
        "token_account": receipt.accounts.token_account.to_string(),
        "metadata": receipt.accounts.metadata.to_string(),
        "master_edition": receipt.accounts.master_edition.to_string(),
    })
}

async fn run_mint(
    cli: &Cli,
    payer: &Keypair,
    asset: &AssetArgs,
    target: MintTarget,
) -> anyhow::Result<MintReceipt> {
    let orch = cli.orchestrator()?;
    let receipt = match (&asset.uri, &asset.image) {
        (Some(uri), _) => {
            let metadata = AssetMetadata::new(&asset.name, &asset.symbol, uri);
            match target {
                MintTarget::Standalone {
                    id,
                    mark_as_collection,
                } => {
                    orch.mint_standalone(payer, id, metadata, mark_as_collection)
                        .await?
                }
                MintTarget::Collection { parent, child } => {
                    orch.mint_into_collection(payer, parent, child, metadata)
                        .await?
                }
            }
        }
        (None, Some(image)) => {
            let upload =
                AssetUpload::from_file(image, &asset.name, &asset.symbol, &asset.description)?;
            let uploader = cli.storage.uploader()?;
            orch.upload_and_mint(payer, &uploader, &upload, target)
                .await?
        }
        (None, None) => anyhow::bail!("either --uri or --image is required"),
    };
    Ok(receipt)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    match &args.command {
        Commands::Pda { id, parent, owner } => {
            let client = args.client()?;
            let owner_pk = match owner.as_ref() {
                Some(s) => parse_pubkey(s)?,
                None => keypair_from_source(&args.payer)?.pubkey(),
            };
            let accounts = client.derive_accounts(&owner_pk, seed_for(*id, *parent))?;
            let collection = match parent {
                Some(p) => Some(client.mint_pda(*p)?.to_string()),
                None => None,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "owner": owner_pk.to_string(),
                    "mint": accounts.mint.to_string(),
                    "mint_bump": accounts.mint_bump,
                    "token_account": accounts.token_account.to_string(),
                    "metadata": accounts.metadata.to_string(),
                    "metadata_bump": accounts.metadata_bump,
                    "master_edition": accounts.master_edition.to_string(),
                    "master_edition_bump": accounts.master_edition_bump,
                    "collection": collection,
                }))?
            );
        }
        Commands::Init => {
            let payer = keypair_from_source(&args.payer)?;
            let signature = args.orchestrator()?.initialize(&payer).await?;
            info!(%signature, "init");
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "signature": signature.to_string(),
                }))?
            );
        }
        Commands::Mint {
            id,
            collection,
            asset,
        } => {
            let payer = keypair_from_source(&args.payer)?;
            let receipt = run_mint(
                &args,
                &payer,
                asset,
                MintTarget::Standalone {
                    id: *id,
                    mark_as_collection: *collection,
                },
            )
            .await?;
            info!(signature = %receipt.signature, mint = %receipt.accounts.mint, "mint");
            println!("{}", serde_json::to_string_pretty(&receipt_json(&receipt))?);
        }
        Commands::MintToCollection { parent, id, asset } => {
            let payer = keypair_from_source(&args.payer)?;
            let receipt = run_mint(
                &args,
                &payer,
                asset,
                MintTarget::Collection {
                    parent: *parent,
                    child: *id,
                },
            )
            .await?;
            info!(signature = %receipt.signature, mint = %receipt.accounts.mint, "mint-to-collection");
            let mut json = receipt_json(&receipt);
            json["collection"] = args.client()?.mint_pda(*parent)?.to_string().into();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Upload {
            image,
            name,
            symbol,
            description,
        } => {
            let upload = AssetUpload::from_file(image, name, symbol, description)?;
            let uri = args.storage.uploader()?.upload(&upload).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "uri": uri }))?
            );
        }
        Commands::Show { id, parent } => {
            let client = args.client()?;
            let mint = match parent {
                Some(p) => client.collection_item_pda(*p, *id)?,
                None => client.mint_pda(*id)?,
            };
            let reader = MetadataReader::new(client.metadata_program_id, args.rpc());
            let md = reader.metadata_for_mint(&mint).await?;
            let md_json = md.as_ref().map(|m| {
                serde_json::json!({
                    "update_authority": m.update_authority.to_string(),
                    "name": m.name,
                    "symbol": m.symbol,
                    "uri": m.uri,
                    "is_mutable": m.is_mutable,
                    "is_collection_parent": m.is_collection_parent(),
                    "collection": m.collection.as_ref().map(|c| serde_json::json!({
                        "key": c.key.to_string(),
                        "verified": c.verified,
                    })),
                })
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "mint": mint.to_string(),
                    "metadata": md_json,
                }))?
            );
        }
    }

    Ok(())
}
