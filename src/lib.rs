//! Mock OpenID Connect provider: rotates RSA signing keys, publishes them as a JWKS, and issues
//! signed test tokens for exercising OIDC consumers without a real identity provider.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod duration;
pub mod key;
pub mod lifecycle;
pub mod metrics;
pub mod selector;
pub mod server;
pub mod service;
pub mod store;
pub mod token;

mod error;
mod _prelude {
	pub use std::{sync::Arc, time::Duration};

	pub use crate::{Error, Result};
}

// Used by the binary only.
use tracing_subscriber as _;

#[cfg(feature = "prometheus")] pub use crate::metrics::install_default_exporter;
pub use crate::{
	config::OidcConfig,
	duration::parse_duration,
	error::{Error, Result},
	key::{
		KeyRing, KeySet, KeySpec, KeyType, SigningKey,
		generator::{GenerateKeys, RsaKeyGenerator},
	},
	lifecycle::{KeyLifecycle, Regeneration},
	selector::{FixedSelector, KeySelector, UniformSelector},
	service::{Provider, ProviderMetadata},
	store::{FileKeyStore, KeyStore, MemoryKeyStore},
	token::{Claims, Clock, ManualClock, SystemClock, TokenIssuer},
};
