use anyhow::Context as _;
use clap::Parser;
use fogseal_config::{FromEnv, VerifierConfig};
use fogseal_verifier::Verifier;
use tracing_subscriber::EnvFilter;

/// Checks a cloud-stored batch against its anchored Merkle root and
/// prints the per-leaf report.
#[derive(Debug, Parser)]
#[command(name = "verifier")]
struct Cli {
    /// Batch id to verify.
    batch_id: i64,

    /// The anchored Merkle root (lowercase hex).
    #[arg(long)]
    root: String,

    /// CID of the Merkle paths blob on the object-store gateway.
    #[arg(long)]
    cid: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = VerifierConfig::from_env().context("verifier config")?;
    let verifier = Verifier::new(&config)?;

    let report = verifier
        .verify_batch(cli.batch_id, &cli.root, &cli.cid)
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.global_ok {
        std::process::exit(1);
    }
    Ok(())
}
