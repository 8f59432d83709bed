//! Provider state shared by the HTTP handlers.

// crates.io
use axum::body::Bytes;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
// self
use crate::{
	_prelude::*,
	config::OidcConfig,
	key::{KeyRing, KeySet},
	lifecycle::{KeyLifecycle, Regeneration},
	selector::{KeySelector, UniformSelector},
	store::FileKeyStore,
	token::{Clock, SystemClock, TokenIssuer},
};

/// OpenID Provider metadata served from the discovery endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
	/// Issuer identifier.
	pub issuer: String,
	/// Location of the public JWKS.
	pub jwks_uri: String,
	/// Supported `response_type` values.
	pub response_types_supported: Vec<String>,
	/// Supported subject identifier types.
	pub subject_types_supported: Vec<String>,
	/// Algorithms used to sign ID tokens.
	pub id_token_signing_alg_values_supported: Vec<Algorithm>,
	/// Supported scopes.
	pub scopes_supported: Vec<String>,
	/// Supported client authentication methods at the token endpoint.
	pub token_endpoint_auth_methods_supported: Vec<String>,
}

/// Loaded keys plus everything needed to publish them and sign with them.
#[derive(Debug)]
pub struct Provider {
	config: OidcConfig,
	keys: KeyRing,
	jwks_document: Bytes,
	issuer: TokenIssuer<Arc<dyn Clock>>,
	selector: Arc<dyn KeySelector>,
}
impl Provider {
	/// Serve `keys` with the system clock and a uniform key choice.
	///
	/// Every key must have been created for the configured algorithm.
	pub fn new(config: OidcConfig, keys: KeyRing) -> Result<Self> {
		keys.ensure_algorithm(config.algorithm)?;

		let jwks_document = Bytes::from(serde_json::to_vec(keys.public())?);

		Ok(Self {
			config,
			keys,
			jwks_document,
			issuer: TokenIssuer::with_clock(Arc::new(SystemClock)),
			selector: Arc::new(UniformSelector),
		})
	}

	/// Replace the clock used for time-based claims.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.issuer = TokenIssuer::with_clock(clock);

		self
	}

	/// Replace the signing key selection policy.
	pub fn with_selector(mut self, selector: Arc<dyn KeySelector>) -> Self {
		self.selector = selector;

		self
	}

	/// Validate `config`, make sure keys exist under its directory, and load them.
	pub fn bootstrap(config: OidcConfig) -> Result<Self> {
		config.validate()?;

		let store = FileKeyStore::create_dir(&config.keys_dir)?;
		let lifecycle = KeyLifecycle::new(store);
		let outcome = lifecycle.ensure_keys_ready(config.regenerate_at_start, &config.key_spec())?;
		let keys = lifecycle.load()?;

		tracing::info!(
			dir = %config.keys_dir.display(),
			regenerated = outcome == Regeneration::Regenerated,
			keys = keys.public().len(),
			"provider ready"
		);

		Self::new(config, keys)
	}

	/// Configuration the provider was built with.
	pub fn config(&self) -> &OidcConfig {
		&self.config
	}

	/// Loaded key pair.
	pub fn keys(&self) -> &KeyRing {
		&self.keys
	}

	/// Public key set, as served at the JWKS endpoint.
	pub fn public_jwks(&self) -> &KeySet {
		self.keys.public()
	}

	/// Serialised public key set, encoded once at construction.
	pub fn jwks_document(&self) -> Bytes {
		self.jwks_document.clone()
	}

	/// Discovery document describing this provider.
	pub fn openid_configuration(&self) -> ProviderMetadata {
		let strings = |values: &[&str]| values.iter().map(|&value| value.to_owned()).collect();

		ProviderMetadata {
			issuer: self.config.issuer.clone(),
			jwks_uri: self.config.jwks_uri(),
			response_types_supported: strings(&["code", "id_token", "id_token code"]),
			subject_types_supported: strings(&["public"]),
			id_token_signing_alg_values_supported: vec![self.config.algorithm],
			scopes_supported: strings(&["openid", "profile", "email"]),
			token_endpoint_auth_methods_supported: strings(&["client_secret_basic"]),
		}
	}

	/// Sign a fresh token with a key chosen by the selector.
	pub fn issue_token(&self) -> Result<String> {
		let key = self.keys.private().pick(self.selector.as_ref());

		self.issuer.issue(key, key.algorithm(), &self.config.issuer, &self.config.token_expiration)
	}
}
