//! Token issuance and key generation telemetry.
//!
//! Every recorder is a no-op unless the `metrics` feature is enabled; the `prometheus` feature
//! additionally installs a Prometheus recorder whose rendering backs the `/metrics` route.

#![cfg_attr(not(feature = "metrics"), allow(dead_code, unused_variables))]

// std
#[cfg(feature = "prometheus")] use std::sync::OnceLock;
// crates.io
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
// self
use crate::_prelude::*;

const METRIC_TOKENS_ISSUED: &str = "mock_oidc_tokens_issued_total";
const METRIC_TOKEN_ERRORS: &str = "mock_oidc_token_errors_total";
const METRIC_KEY_GENERATIONS: &str = "mock_oidc_key_generations_total";
const METRIC_KEYS_GENERATED: &str = "mock_oidc_keys_generated_total";
const METRIC_KEY_GENERATION_DURATION: &str = "mock_oidc_key_generation_duration_seconds";

/// Shared Prometheus handle installed by [`install_default_exporter`].
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the default Prometheus recorder backed by `metrics`.
///
/// Multiple invocations are safe; subsequent calls become no-ops once the recorder is installed.
#[cfg(feature = "prometheus")]
pub fn install_default_exporter() -> Result<()> {
	if PROMETHEUS_HANDLE.get().is_some() {
		return Ok(());
	}

	let handle = PrometheusBuilder::new()
		.install_recorder()
		.map_err(|err| Error::Metrics(err.to_string()))?;
	let _ = PROMETHEUS_HANDLE.set(handle);

	Ok(())
}

/// Access the global Prometheus exporter handle when installed.
#[cfg(feature = "prometheus")]
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
	PROMETHEUS_HANDLE.get()
}

/// Record a token signed with the key `kid`.
pub fn record_token_issued(kid: &str) {
	#[cfg(feature = "metrics")]
	metrics::counter!(METRIC_TOKENS_ISSUED, "kid" => kid.to_owned()).increment(1);
}

/// Record a failed issuance.
pub fn record_token_error() {
	#[cfg(feature = "metrics")]
	metrics::counter!(METRIC_TOKEN_ERRORS).increment(1);
}

/// Record one generation run of `count` keys and its latency.
pub fn record_key_generation(count: usize, elapsed: Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(METRIC_KEY_GENERATIONS).increment(1);
		metrics::counter!(METRIC_KEYS_GENERATED).increment(count as u64);
		metrics::histogram!(METRIC_KEY_GENERATION_DURATION).record(elapsed.as_secs_f64());
	}
}
