//! `mock-oidc` binary: generate or load keys, then serve them over HTTP.

// std
use std::{process::ExitCode, sync::Arc};
// crates.io
use clap::Parser;
use tokio::{net::TcpListener, runtime::Builder};
use tracing_subscriber::EnvFilter;
// self
use mock_oidc::{OidcConfig, Provider, Result};

fn main() -> ExitCode {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	match run(OidcConfig::parse()) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			tracing::error!(error = %err, "mock-oidc failed");

			ExitCode::FAILURE
		},
	}
}

fn run(config: OidcConfig) -> Result<()> {
	let bind = config.bind;
	// Key generation is CPU bound and finishes before the runtime starts.
	let provider = Arc::new(Provider::bootstrap(config)?);

	#[cfg(feature = "prometheus")]
	mock_oidc::install_default_exporter()?;

	Builder::new_multi_thread().enable_all().build()?.block_on(async move {
		let listener = TcpListener::bind(bind).await?;

		mock_oidc::server::serve(listener, provider).await
	})
}
