//! Bootstrap a lending market group
//!
//! Reads `CLUSTER_URL` and `MANGO_MAINNET_PAYER_KEYPAIR` (plus optional
//! `BOOTSTRAP_*` overrides), provisions the group and prints the resulting
//! banks to stdout. Logs go to stderr.
//!
//! `CLUSTER_URL` must point at the lending program's administrative JSON-RPC
//! gateway. A plain Solana RPC node rejects every step with -32601.

use anyhow::Context;
use bootstrap_core::BootstrapConfig;
use chain_client::{load_admin_keypair, RpcChainClient};
use market_bootstrap::{bootstrap, AssetCatalog, VerificationReport};
use solana_sdk::signature::Signer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("market_bootstrap=debug".parse()?)
                .add_directive("bootstrap_admin=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let config = BootstrapConfig::from_env().context("Invalid configuration")?;
    let catalog = AssetCatalog::for_cluster(config.cluster)?;

    let keypair = load_admin_keypair(&config.keypair_path)?;
    tracing::info!(
        admin = %keypair.pubkey(),
        cluster = %config.cluster,
        url = %config.rpc.url,
        "Loaded admin keypair"
    );

    let client = RpcChainClient::new(&config.rpc, config.program_id, keypair)?;
    let run = bootstrap(&client, &catalog, config.group_num)
        .await
        .context("Provisioning plan could not be resolved")?;

    let summary = run.summary();
    if summary.tolerated + summary.skipped > 0 {
        tracing::warn!(
            tolerated = summary.tolerated,
            skipped = summary.skipped,
            "Some steps did not complete; re-run to retry"
        );
    }

    let report = VerificationReport::from_run(&run).render(config.report_format);
    println!("{}", report.trim_end());
    Ok(())
}
