//! Process configuration, read once at startup from flags and environment variables.

// std
use std::{net::SocketAddr, path::PathBuf};
// crates.io
use clap::{ArgAction, Parser, builder::BoolishValueParser};
use jsonwebtoken::Algorithm;
use url::Url;
// self
use crate::{
	_prelude::*,
	duration,
	key::{KeySpec, KeyType},
};

/// Default `iss` claim and discovery issuer.
pub const DEFAULT_ISSUER: &str = "http://localhost";
/// Default token lifetime.
pub const DEFAULT_TOKEN_EXPIRATION: &str = "30m";
/// Default directory holding the persisted key sets.
pub const DEFAULT_KEYS_DIR: &str = "files";
/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
/// Path of the JWKS document relative to the issuer.
pub const JWKS_PATH: &str = "/.well-known/jwks";

/// Immutable provider configuration.
#[derive(Clone, Debug, Parser)]
#[command(
	name = "mock-oidc",
	version,
	about = "Mock OpenID Connect provider for testing token consumers."
)]
pub struct OidcConfig {
	/// Regenerate the signing keys on every start, overwriting persisted ones.
	#[arg(
		long,
		env = "REGEN_KEYS_AT_RESTART",
		default_value_t = true,
		action = ArgAction::Set,
		value_parser = BoolishValueParser::new(),
	)]
	pub regenerate_at_start: bool,
	/// Number of keys in a generated set.
	#[arg(long, env = "NUMBER_OF_KEYS", default_value_t = 10)]
	pub number_of_keys: usize,
	/// Key family of generated keys.
	#[arg(
		long,
		env = "KEY_TYPE",
		default_value_t = KeyType::Rsa,
		value_parser = parse_key_type,
	)]
	pub key_type: KeyType,
	/// Modulus size of generated keys, in bits.
	#[arg(long, env = "KEY_SIZE", default_value_t = 2048)]
	pub key_size: u32,
	/// Signature algorithm for generated keys and issued tokens.
	#[arg(long, env = "KEY_ALGORITHM", default_value = "RS256", value_parser = parse_algorithm)]
	pub algorithm: Algorithm,
	/// Value of the `iss` claim.
	#[arg(long, env = "ISSUER", default_value = DEFAULT_ISSUER)]
	pub issuer: String,
	/// Advertised JWKS location; derived from the issuer when omitted.
	#[arg(long, env = "JWKS_URI")]
	pub jwks_uri: Option<Url>,
	/// Token lifetime such as `30m`, `2h` or `1d`.
	#[arg(long, env = "TOKEN_EXPIRATION_TIME", default_value = DEFAULT_TOKEN_EXPIRATION)]
	pub token_expiration: String,
	/// Directory holding the persisted key sets.
	#[arg(long, env = "KEYS_DIR", default_value = DEFAULT_KEYS_DIR)]
	pub keys_dir: PathBuf,
	/// Listen address of the HTTP server.
	#[arg(long, env = "BIND_ADDRESS", default_value = DEFAULT_BIND)]
	pub bind: SocketAddr,
}
impl OidcConfig {
	/// Check every setting that can be verified before generating keys.
	pub fn validate(&self) -> Result<()> {
		if self.number_of_keys == 0 {
			return Err(Error::Validation {
				field: "number_of_keys",
				reason: "Must be at least 1.".into(),
			});
		}
		if self.issuer.is_empty() {
			return Err(Error::Validation { field: "issuer", reason: "Must not be empty.".into() });
		}
		if let Err(err) = duration::parse_duration(&self.token_expiration) {
			return Err(Error::Validation { field: "token_expiration", reason: err.to_string() });
		}

		self.key_spec().validate().map_err(|err| Error::Validation {
			field: "key_spec",
			reason: err.to_string(),
		})
	}

	/// Shape of the key set generated at startup.
	pub fn key_spec(&self) -> KeySpec {
		KeySpec {
			count: self.number_of_keys,
			key_type: self.key_type,
			size: self.key_size,
			algorithm: self.algorithm,
		}
	}

	/// Advertised JWKS location.
	pub fn jwks_uri(&self) -> String {
		match &self.jwks_uri {
			Some(uri) => uri.to_string(),
			None => format!("{}{JWKS_PATH}", self.issuer.trim_end_matches('/')),
		}
	}

	/// Override the issuer.
	pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
		self.issuer = issuer.into();

		self
	}

	/// Override the key directory.
	pub fn with_keys_dir(mut self, keys_dir: impl Into<PathBuf>) -> Self {
		self.keys_dir = keys_dir.into();

		self
	}

	/// Override the number of generated keys.
	pub fn with_number_of_keys(mut self, number_of_keys: usize) -> Self {
		self.number_of_keys = number_of_keys;

		self
	}

	/// Override whether keys are regenerated at startup.
	pub fn with_regenerate_at_start(mut self, regenerate_at_start: bool) -> Self {
		self.regenerate_at_start = regenerate_at_start;

		self
	}
}
impl Default for OidcConfig {
	fn default() -> Self {
		let spec = KeySpec::default();

		Self {
			regenerate_at_start: true,
			number_of_keys: spec.count,
			key_type: spec.key_type,
			key_size: spec.size,
			algorithm: spec.algorithm,
			issuer: DEFAULT_ISSUER.into(),
			jwks_uri: None,
			token_expiration: DEFAULT_TOKEN_EXPIRATION.into(),
			keys_dir: DEFAULT_KEYS_DIR.into(),
			bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
		}
	}
}

fn parse_key_type(value: &str) -> std::result::Result<KeyType, String> {
	value.parse().map_err(|err: Error| err.to_string())
}

fn parse_algorithm(value: &str) -> std::result::Result<Algorithm, String> {
	value.parse().map_err(|_| format!("Unknown signature algorithm '{value}'."))
}
