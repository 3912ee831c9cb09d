use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod classify;
mod config;
mod engine;
mod rpc;
mod strkey;
mod wallet;
mod xdr;

use classify::ContractErrorTable;
use config::{AstrolabeConfig, load_config, write_template};
use engine::{PipelineSettings, ProposalPipeline};
use rpc::SorobanRpcClient;
use wallet::{BridgeSigner, SigningAuthority, WalletSession};

#[derive(Parser, Debug)]
#[command(name = "astrolabe", version, about = "Multisig treasury proposal client")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Config file path (defaults to astrolabe.toml or config/astrolabe.toml)"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propose a treasury transfer through the configured vault
    Propose(ProposeCmd),
    /// Wallet bridge utilities
    #[command(subcommand)]
    Wallet(WalletCmd),
    /// Print the active contract error-code table
    Codes,
    /// Write a commented config template
    Init(InitCmd),
}

#[derive(Args, Debug)]
struct ProposeCmd {
    #[arg(long, value_name = "ADDRESS", help = "Recipient account (G...)")]
    recipient: String,
    #[arg(long, value_name = "ADDRESS", help = "Token contract (C...) or issuer account")]
    token: String,
    #[arg(
        long,
        value_name = "STROOPS",
        help = "Amount as a plain decimal integer in the token's smallest unit"
    )]
    amount: String,
    #[arg(long, default_value = "", help = "Short memo symbol")]
    memo: String,
}

#[derive(Subcommand, Debug)]
enum WalletCmd {
    /// Check bridge reachability and print the signing identity
    Status,
    /// Request wallet access for this client
    Connect,
}

#[derive(Args, Debug)]
struct InitCmd {
    #[arg(long, value_name = "FILE", help = "Output path (default astrolabe.toml)")]
    output: Option<PathBuf>,
    #[arg(long, help = "Overwrite an existing file")]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.clone())?;
    init_tracing(&config.logging);

    match cli.command {
        Command::Propose(cmd) => run_propose(&config, cmd).await,
        Command::Wallet(cmd) => run_wallet(&config, cmd).await,
        Command::Codes => run_codes(&config),
        Command::Init(cmd) => {
            let path = cmd
                .output
                .unwrap_or_else(|| PathBuf::from(config::loader::DEFAULT_CONFIG_PATHS[0]));
            write_template(&path, cmd.force)?;
            println!("wrote config template to {}", path.display());
            Ok(())
        }
    }
}

fn init_tracing(config: &config::LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn build_signer(config: &AstrolabeConfig, http: &reqwest::Client) -> BridgeSigner {
    BridgeSigner::new(
        http.clone(),
        config.wallet.bridge_url.clone(),
        config.network.request_timeout_ms,
    )
}

async fn connect_session(signer: &dyn SigningAuthority) -> Result<WalletSession> {
    if !signer.is_allowed().await? {
        info!(target: "wallet::bridge", "requesting wallet access");
        signer.request_access().await?;
    }
    let identity = signer.user_identity().await?;
    Ok(WalletSession::new(identity.public_key))
}

async fn run_propose(config: &AstrolabeConfig, cmd: ProposeCmd) -> Result<()> {
    if config.vault.contract_id.is_empty() {
        bail!("no vault contract id configured; set [vault] contract_id");
    }

    let table = ContractErrorTable::with_overrides(&config.contract_errors)
        .context("invalid [contract_errors] table")?;
    let http = reqwest::Client::new();
    let rpc = SorobanRpcClient::new(
        http.clone(),
        config.network.rpc_url.clone(),
        config.network.request_timeout_ms,
    );
    let signer = build_signer(config, &http);

    let session = connect_session(&signer).await?;
    info!(
        target: "astrolabe",
        address = %session.address,
        contract = %config.vault.contract_id,
        "proposing transfer"
    );

    let pipeline = ProposalPipeline::new(
        Arc::new(rpc),
        Arc::new(signer),
        table,
        PipelineSettings {
            contract_id: config.vault.contract_id.clone(),
            network_passphrase: config.network.network_passphrase.clone(),
            base_fee: config.pipeline.base_fee,
            validity_window_secs: config.pipeline.validity_window_secs,
        },
    );

    match pipeline
        .propose_transfer(&session, &cmd.recipient, &cmd.token, &cmd.amount, &cmd.memo)
        .await
    {
        Ok(result) => {
            // Submitted, not yet confirmed: callers needing finality must
            // poll the transaction status themselves.
            println!("transaction {} accepted ({})", result.hash, result.status);
            Ok(())
        }
        Err(err) => bail!("{}: {}", err.code, err.message),
    }
}

async fn run_wallet(config: &AstrolabeConfig, cmd: WalletCmd) -> Result<()> {
    let http = reqwest::Client::new();
    let signer = build_signer(config, &http);

    match cmd {
        WalletCmd::Status => {
            let allowed = signer.is_allowed().await?;
            if !allowed {
                println!("wallet bridge reachable, access not granted");
                return Ok(());
            }
            let identity = signer.user_identity().await?;
            println!("wallet ready, signing as {}", identity.public_key);
        }
        WalletCmd::Connect => {
            let session = connect_session(&signer).await?;
            println!("wallet connected as {}", session.address);
        }
    }
    Ok(())
}

fn run_codes(config: &AstrolabeConfig) -> Result<()> {
    let table = ContractErrorTable::with_overrides(&config.contract_errors)
        .context("invalid [contract_errors] table")?;
    for (code, kind) in table.entries() {
        println!("{code:>5}  {kind}");
    }
    Ok(())
}
