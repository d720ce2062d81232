use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use clap::Parser;
use eyre::{Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowbid_cli::{
    config::{self, API_KEY_ENV, CliArgs, Settings},
    services::{BankrClient, FlowClient},
    shell::{self, Shell},
};
use flowbid_core::{
    AuctionService, BidSubmitter, ChainReader, EventPoller, FallbackChain, MonitorConfig,
    RpcChain, constants::USDC_BASE_ADDRESS, math::format_usd,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let file = config::load_file_config(&args)?;
    let settings = Settings::resolve(args, file, std::env::var(API_KEY_ENV).ok())?;
    init_tracing(&settings.log_level);

    info!(endpoints = settings.rpc_urls.len(), "initializing");
    let chain = connect_chain(&settings);
    let custody = Arc::new(BankrClient::new(&settings.api_key)?);
    let flow = Arc::new(FlowClient::new()?);

    let wallet = custody.agent_wallet().await?;
    let launch = flow.get_launch(settings.auction).await?;
    if !launch.is_settled_in(USDC_BASE_ADDRESS) {
        bail!(
            "auction {} settles in {}, only USDC auctions are supported",
            launch.auction,
            launch.currency
        );
    }

    info!(%wallet, "custody wallet");
    info!(
        auction = %launch.auction,
        token = launch.token_symbol.as_deref().unwrap_or("?"),
        start = %launch.start_block,
        end = %launch.end_block,
        claim = %launch.claim_block,
        "auction loaded"
    );
    if let Some(floor) = launch.floor_fdv_usd()? {
        info!("floor FDV ${}", format_usd(floor));
    }

    let monitor_config = MonitorConfig::for_launch(&launch)
        .with_poll_interval(settings.poll_interval)
        .with_retry(settings.retry);
    let mut poller = EventPoller::new(chain.clone(), monitor_config);
    let feed = shell::spawn_feed(poller.subscribe());
    poller.start().await?;

    let submitter = BidSubmitter::new(
        chain.clone(),
        custody,
        flow,
        launch,
        wallet,
        settings.min_native_eth,
    );
    let shell = Shell::new(chain, submitter);

    let outcome = tokio::select! {
        result = shell.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            Ok(())
        }
    };

    poller.stop().await;
    drop(poller);
    // An interrupted bid keeps running until its relay calls settle.
    shell.wait_idle().await;
    let _ = feed.await;
    outcome?;

    info!("exiting");
    // The stdin reader thread would otherwise hold the runtime open.
    std::process::exit(0)
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn connect_chain(settings: &Settings) -> Arc<dyn ChainReader> {
    let endpoints = settings
        .rpc_urls
        .iter()
        .map(|url| {
            let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
            let label = url.host_str().unwrap_or("rpc").to_string();
            Arc::new(RpcChain::new(provider, label)) as Arc<dyn ChainReader>
        })
        .collect();
    Arc::new(FallbackChain::new(endpoints))
}
