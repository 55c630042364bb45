//! A tokio-based daemon which answers `ens_getclaimdata` JSON-RPC calls over HTTP.

#![deny(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, info_span};
use tracing_subscriber::EnvFilter;

use edcd::claim::ClaimService;
use edcd::config::RawConfig;
use edcd::daemon::run_server;
use edcd::error::ConfigError;
use edcd::eth::EthClient;
use edcd::owner::DnsOwnerResolver;
use edcd::registrar::EnsRegistrar;
use edcd::signer::Unsigned;

#[derive(Parser)]
#[command(name = "edcd", version, about = "ENS domain claim daemon")]
struct Cli {
	/// The JSON configuration file.
	#[arg(long, env = "EDCD_CONFIG")]
	config: Option<PathBuf>,
	/// The address to listen on, overriding the configuration file.
	#[arg(long, env = "EDCD_LISTEN_ADDRESS")]
	listen_address: Option<String>,
	/// The recursive DNS resolver, overriding the configuration file.
	#[arg(long, env = "EDCD_DNS_RESOLVER")]
	dns_resolver: Option<String>,
	/// The execution-layer JSON-RPC endpoint, overriding the configuration file.
	#[arg(long, env = "EDCD_ETH1CLIENT_ADDRESS")]
	eth1client_address: Option<String>,
	/// The log filter, used when RUST_LOG is not set.
	#[arg(long, env = "EDCD_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

fn fail(e: ConfigError) -> ! {
	error!(error = %e, "Invalid configuration");
	std::process::exit(1);
}

async fn shutdown_signal() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{signal, SignalKind};
		let mut terminate = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {},
			_ = terminate.recv() => {},
		}
	}
	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
	}
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let mut raw = match &cli.config {
		Some(path) => RawConfig::from_file(path).unwrap_or_else(|e| fail(e)),
		None => RawConfig::default(),
	};
	if cli.listen_address.is_some() { raw.listen_address = cli.listen_address; }
	if cli.dns_resolver.is_some() { raw.dns_resolver = cli.dns_resolver; }
	if cli.eth1client_address.is_some() { raw.eth1client_address = cli.eth1client_address; }

	let config = raw.validate().unwrap_or_else(|e| fail(e));
	let listen_address = config.listen_address.unwrap_or_else(|| fail(ConfigError::Missing("listen address")));
	info!(domains = config.domain_controls.len(), eth1client = %config.eth1client_address,
		dns_resolver = %config.dns_resolver, "Loaded configuration");

	let eth = EthClient::new(config.eth1client_address, config.timeout).unwrap_or_else(|e| fail(e));
	let registrar = EnsRegistrar::new(eth, config.ens_registry, info_span!("ens"));
	let owners = DnsOwnerResolver::new(config.dns_resolver, info_span!("dns"));
	let claim_data = ClaimService::new(config.domain_controls, Box::new(owners), Box::new(registrar),
		Box::new(Unsigned), config.timeout, info_span!("claimdata"));

	let listener = tokio::net::TcpListener::bind(listen_address).await
		.expect("Failed to bind to socket");
	info!(%listen_address, "Starting daemon");

	tokio::select! {
		_ = run_server(listener, Arc::new(claim_data), info_span!("daemon")) => {},
		_ = shutdown_signal() => info!("Shutting down"),
	}
}
