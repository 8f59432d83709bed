//! HTTP surface over a [`Provider`].

// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	response::{IntoResponse, Response},
	routing::get,
};
use http::{StatusCode, header};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	service::{Provider, ProviderMetadata},
};

/// Route serving the public JWKS.
pub const JWKS_ROUTE: &str = "/.well-known/jwks";
/// Route serving the discovery document.
pub const DISCOVERY_ROUTE: &str = "/.well-known/openid-configuration";
/// Route issuing a fresh token.
pub const TOKEN_ROUTE: &str = "/token";
/// Route rendering Prometheus metrics.
#[cfg(feature = "prometheus")]
pub const METRICS_ROUTE: &str = "/metrics";

/// Body returned by the token route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Compact JWS.
	pub token: String,
}

/// Body returned when a handler fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Human readable failure.
	pub error: String,
}

struct ApiError(Error);
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		Self(err)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		tracing::error!(error = %self.0, "request failed");

		(StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: self.0.to_string() }))
			.into_response()
	}
}

/// Build the router for `provider`.
pub fn router(provider: Arc<Provider>) -> Router {
	let router = Router::new()
		.route(JWKS_ROUTE, get(jwks))
		.route(DISCOVERY_ROUTE, get(openid_configuration))
		.route(TOKEN_ROUTE, get(token));
	#[cfg(feature = "prometheus")]
	let router = router.route(METRICS_ROUTE, get(render_metrics));

	router.with_state(provider)
}

/// Serve `provider` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, provider: Arc<Provider>) -> Result<()> {
	tracing::info!(address = %listener.local_addr()?, "listening");

	axum::serve(listener, router(provider)).with_graceful_shutdown(shutdown_signal()).await?;

	tracing::info!("server stopped");

	Ok(())
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::warn!(error = %err, "failed to listen for Ctrl-C; shutting down");
	}
}

async fn jwks(
	State(provider): State<Arc<Provider>>,
) -> ([(header::HeaderName, &'static str); 1], Bytes) {
	([(header::CONTENT_TYPE, "application/json")], provider.jwks_document())
}

async fn openid_configuration(State(provider): State<Arc<Provider>>) -> Json<ProviderMetadata> {
	Json(provider.openid_configuration())
}

async fn token(
	State(provider): State<Arc<Provider>>,
) -> std::result::Result<Json<TokenResponse>, ApiError> {
	Ok(Json(TokenResponse { token: provider.issue_token()? }))
}

#[cfg(feature = "prometheus")]
async fn render_metrics() -> Response {
	match crate::metrics::prometheus_handle() {
		Some(handle) => handle.render().into_response(),
		None => (StatusCode::NOT_FOUND, "metrics exporter not installed").into_response(),
	}
}
