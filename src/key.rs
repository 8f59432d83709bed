//! Signing key model: individual keys, ordered key sets, and the loaded public/private pair.

pub mod generator;

mod jwk;

// std
use std::{
	collections::HashSet,
	fmt::{Debug, Display, Formatter, Result as FmtResult},
	str::FromStr,
};
// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::{RsaPrivateKey, RsaPublicKey, pkcs1::EncodeRsaPrivateKey, traits::PublicKeyParts};
use serde::{Deserialize, Serialize};
// self
use crate::{_prelude::*, key::jwk::RawJwk, selector::KeySelector};

pub use generator::KeySpec;

/// JWK `use` value carried by every key.
pub const SIGNATURE_USE: &str = "sig";

/// Key family of a [`SigningKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
	/// RSA key pair.
	#[serde(rename = "RSA")]
	Rsa,
}
impl KeyType {
	/// JWK `kty` value.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Rsa => "RSA",
		}
	}

	/// Whether keys of this family can sign with `algorithm`.
	pub fn supports(self, algorithm: Algorithm) -> bool {
		match self {
			Self::Rsa => matches!(
				algorithm,
				Algorithm::RS256
					| Algorithm::RS384
					| Algorithm::RS512
					| Algorithm::PS256
					| Algorithm::PS384
					| Algorithm::PS512
			),
		}
	}
}
impl Display for KeyType {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for KeyType {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		if value.eq_ignore_ascii_case("RSA") {
			Ok(Self::Rsa)
		} else {
			Err(Error::Validation {
				field: "kty",
				reason: format!("Unsupported key type '{value}'; only RSA is available."),
			})
		}
	}
}

/// An asymmetric signing key, either a full key pair or its public projection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RawJwk", into = "RawJwk")]
pub struct SigningKey {
	kid: String,
	algorithm: Algorithm,
	key_type: KeyType,
	size: u32,
	public: RsaPublicKey,
	private: Option<RsaPrivateKey>,
}
impl SigningKey {
	/// Wrap a freshly generated RSA private key.
	pub fn from_rsa_private(
		kid: impl Into<String>,
		algorithm: Algorithm,
		private: RsaPrivateKey,
	) -> Self {
		let public = private.to_public_key();
		let size = public.n().bits() as u32;

		Self {
			kid: kid.into(),
			algorithm,
			key_type: KeyType::Rsa,
			size,
			public,
			private: Some(private),
		}
	}

	/// Key ID, copied into the `kid` header of every token signed with this key.
	pub fn kid(&self) -> &str {
		&self.kid
	}

	/// Signature algorithm the key was created for.
	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	/// Key family.
	pub fn key_type(&self) -> KeyType {
		self.key_type
	}

	/// Modulus size in bits.
	pub fn size(&self) -> u32 {
		self.size
	}

	/// JWK `use` value.
	pub fn key_use(&self) -> &'static str {
		SIGNATURE_USE
	}

	/// Whether private material is present.
	pub fn is_private(&self) -> bool {
		self.private.is_some()
	}

	/// Public half of the key.
	pub fn public_key(&self) -> &RsaPublicKey {
		&self.public
	}

	/// Private half of the key, absent on public projections.
	pub fn private_key(&self) -> Option<&RsaPrivateKey> {
		self.private.as_ref()
	}

	/// Copy of this key without private material.
	pub fn to_public(&self) -> Self {
		Self { private: None, ..self.clone() }
	}

	/// Build the `jsonwebtoken` signing key from the private material.
	pub fn encoding_key(&self) -> Result<EncodingKey> {
		let private = self.private.as_ref().ok_or_else(|| {
			Error::Signing(format!("Key '{}' carries no private material.", self.kid))
		})?;
		let der = private.to_pkcs1_der().map_err(|err| Error::Signing(err.to_string()))?;

		Ok(EncodingKey::from_rsa_der(der.as_bytes()))
	}

	/// Build the `jsonwebtoken` verification key from the public material.
	pub fn decoding_key(&self) -> Result<DecodingKey> {
		let n = jwk::encode_uint(self.public.n());
		let e = jwk::encode_uint(self.public.e());

		Ok(DecodingKey::from_rsa_components(&n, &e)?)
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("SigningKey")
			.field("kid", &self.kid)
			.field("algorithm", &self.algorithm)
			.field("key_type", &self.key_type)
			.field("size", &self.size)
			.field("private", &self.private.is_some())
			.finish()
	}
}

/// Ordered, non-empty collection of signing keys with pairwise-distinct key IDs.
///
/// Serialises to the standard JWKS document shape `{"keys": [...]}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawKeySet")]
pub struct KeySet {
	keys: Vec<SigningKey>,
}
impl KeySet {
	/// Build a set, rejecting empty input and duplicate key IDs.
	pub fn new(keys: Vec<SigningKey>) -> Result<Self> {
		if keys.is_empty() {
			return Err(Error::Validation {
				field: "keys",
				reason: "A key set must contain at least one key.".into(),
			});
		}

		let mut seen = HashSet::with_capacity(keys.len());

		for key in &keys {
			if !seen.insert(key.kid()) {
				return Err(Error::Validation {
					field: "keys",
					reason: format!("Duplicate key ID '{}'.", key.kid()),
				});
			}
		}

		Ok(Self { keys })
	}

	/// Keys in set order.
	pub fn keys(&self) -> &[SigningKey] {
		&self.keys
	}

	/// Number of keys; never zero.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Always `false`; present for API symmetry.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Iterate over the keys in set order.
	pub fn iter(&self) -> impl Iterator<Item = &SigningKey> {
		self.keys.iter()
	}

	/// Key IDs in set order.
	pub fn kids(&self) -> impl Iterator<Item = &str> {
		self.keys.iter().map(SigningKey::kid)
	}

	/// Look a key up by ID.
	pub fn find(&self, kid: &str) -> Option<&SigningKey> {
		self.keys.iter().find(|key| key.kid() == kid)
	}

	/// Pick one key using the provided selection policy.
	pub fn pick(&self, selector: &dyn KeySelector) -> &SigningKey {
		let index = selector.select(self.keys.len()).min(self.keys.len() - 1);

		&self.keys[index]
	}

	/// Whether any member still carries private material.
	pub fn has_private_material(&self) -> bool {
		self.keys.iter().any(SigningKey::is_private)
	}

	/// Public projection: same IDs, same order, no private material.
	pub fn to_public(&self) -> Self {
		Self { keys: self.keys.iter().map(SigningKey::to_public).collect() }
	}

	/// Serialise to a JWKS JSON document.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}
impl TryFrom<RawKeySet> for KeySet {
	type Error = Error;

	fn try_from(raw: RawKeySet) -> Result<Self> {
		Self::new(raw.keys)
	}
}

#[derive(Deserialize)]
struct RawKeySet {
	keys: Vec<SigningKey>,
}

/// The loaded public and private key sets, kept read-only for the process lifetime.
#[derive(Clone, Debug)]
pub struct KeyRing {
	public: KeySet,
	private: KeySet,
}
impl KeyRing {
	/// Pair up persisted sets after checking they describe the same keys.
	pub fn new(public: KeySet, private: KeySet) -> Result<Self> {
		if public.has_private_material() {
			return Err(Error::KeySetMismatch("Public key set carries private material.".into()));
		}
		if let Some(key) = private.iter().find(|key| !key.is_private()) {
			return Err(Error::KeySetMismatch(format!(
				"Private key set entry '{}' has no private material.",
				key.kid()
			)));
		}
		if public.len() != private.len() {
			return Err(Error::KeySetMismatch(format!(
				"Public set holds {} keys but private set holds {}.",
				public.len(),
				private.len()
			)));
		}

		for (public_key, private_key) in public.iter().zip(private.iter()) {
			if public_key.kid() != private_key.kid() {
				return Err(Error::KeySetMismatch(format!(
					"Key ID '{}' does not match '{}' at the same position.",
					public_key.kid(),
					private_key.kid()
				)));
			}
			if public_key.public_key() != private_key.public_key() {
				return Err(Error::KeySetMismatch(format!(
					"Public material for '{}' differs between sets.",
					public_key.kid()
				)));
			}
		}

		Ok(Self { public, private })
	}

	/// Fail unless every key was created for `algorithm`.
	pub fn ensure_algorithm(&self, algorithm: Algorithm) -> Result<()> {
		match self.private.iter().find(|key| key.algorithm() != algorithm) {
			Some(key) => Err(Error::KeySetMismatch(format!(
				"Key '{}' was created for {:?} but {algorithm:?} is configured.",
				key.kid(),
				key.algorithm()
			))),
			None => Ok(()),
		}
	}

	/// Derive the pair from a private set.
	pub fn from_private(private: KeySet) -> Result<Self> {
		Self::new(private.to_public(), private)
	}

	/// Publishable key set.
	pub fn public(&self) -> &KeySet {
		&self.public
	}

	/// Key set holding signing material.
	pub fn private(&self) -> &KeySet {
		&self.private
	}
}
