//! Signed token construction.

// std
use std::{
	fmt::Debug,
	sync::atomic::{AtomicI64, Ordering},
};
// crates.io
use chrono::Utc;
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
// self
use crate::{_prelude::*, duration, key::SigningKey, metrics};

/// `sub` claim placed in every token.
pub const SUBJECT: &str = "thetoken";
/// `aud` claim placed in every token, matching workload-identity token exchange.
pub const AUDIENCE: &str = "api://AzureADTokenExchange";

/// Claim set of an issued token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Issuer.
	pub iss: String,
	/// Subject.
	pub sub: String,
	/// Audience.
	pub aud: String,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Not-before, seconds since the Unix epoch.
	pub nbf: i64,
	/// Unique token ID.
	pub jti: String,
}

/// Wall-clock source in whole Unix seconds.
pub trait Clock: Debug + Send + Sync {
	/// Current time.
	fn now(&self) -> i64;
}
impl<C> Clock for Arc<C>
where
	C: Clock + ?Sized,
{
	fn now(&self) -> i64 {
		(**self).now()
	}
}

/// System clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> i64 {
		Utc::now().timestamp()
	}
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
	now: AtomicI64,
}
impl ManualClock {
	/// Start at `now`.
	pub fn new(now: i64) -> Self {
		Self { now: AtomicI64::new(now) }
	}

	/// Jump to `now`.
	pub fn set(&self, now: i64) {
		self.now.store(now, Ordering::SeqCst);
	}

	/// Move forward by `seconds`.
	pub fn advance(&self, seconds: i64) {
		self.now.fetch_add(seconds, Ordering::SeqCst);
	}
}
impl Clock for ManualClock {
	fn now(&self) -> i64 {
		self.now.load(Ordering::SeqCst)
	}
}

/// Builds and signs tokens. Holds no key material and may be shared across tasks.
#[derive(Clone, Debug, Default)]
pub struct TokenIssuer<C = SystemClock> {
	clock: C,
}
impl TokenIssuer {
	/// Issuer reading the system clock.
	pub fn new() -> Self {
		Self::default()
	}
}
impl<C> TokenIssuer<C>
where
	C: Clock,
{
	/// Issuer reading `clock`.
	pub fn with_clock(clock: C) -> Self {
		Self { clock }
	}

	/// Clock used for time-based claims.
	pub fn clock(&self) -> &C {
		&self.clock
	}

	/// Sign a token with `key`, expiring `expiry` (e.g. `30m`) after issuance.
	///
	/// The clock is read once, so `iat == nbf` and `exp - iat` equals the parsed expiry.
	pub fn issue(
		&self,
		key: &SigningKey,
		algorithm: Algorithm,
		issuer: &str,
		expiry: &str,
	) -> Result<String> {
		let result = self.sign(key, algorithm, issuer, expiry);

		match &result {
			Ok(_) => metrics::record_token_issued(key.kid()),
			Err(err) => {
				tracing::warn!(kid = key.kid(), error = %err, "token issuance failed");
				metrics::record_token_error();
			},
		}

		result
	}

	fn sign(
		&self,
		key: &SigningKey,
		algorithm: Algorithm,
		issuer: &str,
		expiry: &str,
	) -> Result<String> {
		if issuer.is_empty() {
			return Err(Error::MissingIssuer);
		}

		let lifetime = duration::parse_duration(expiry)?;

		if !key.key_type().supports(algorithm) {
			return Err(Error::Signing(format!(
				"Algorithm {algorithm:?} cannot be used with {} key '{}'.",
				key.key_type(),
				key.kid()
			)));
		}

		let now = self.clock.now();
		let exp = now
			.checked_add(lifetime)
			.ok_or_else(|| Error::InvalidDurationFormat { input: expiry.to_owned() })?;
		let claims = Claims {
			iss: issuer.to_owned(),
			sub: SUBJECT.into(),
			aud: AUDIENCE.into(),
			exp,
			iat: now,
			nbf: now,
			jti: Uuid::new_v4().to_string(),
		};
		let mut header = Header::new(algorithm);

		header.kid = Some(key.kid().to_owned());

		let token = jsonwebtoken::encode(&header, &claims, &key.encoding_key()?)
			.map_err(|err| Error::Signing(err.to_string()))?;

		tracing::debug!(kid = key.kid(), jti = %claims.jti, exp, "issued token");

		Ok(token)
	}
}
