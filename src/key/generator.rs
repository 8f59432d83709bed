//! In-memory generation of fresh signing key sets.

// std
use std::time::Instant;
// crates.io
use jsonwebtoken::Algorithm;
use rsa::{RsaPrivateKey, rand_core::OsRng};
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	key::{KeySet, KeyType, SigningKey},
	metrics,
};

/// Smallest RSA modulus accepted for generation.
pub const MIN_RSA_KEY_SIZE: u32 = 2048;
/// Largest RSA modulus accepted for generation.
pub const MAX_RSA_KEY_SIZE: u32 = 4096;

/// Shape of a key set to generate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySpec {
	/// Number of keys in the set.
	pub count: usize,
	/// Key family.
	pub key_type: KeyType,
	/// Modulus size in bits.
	pub size: u32,
	/// Signature algorithm recorded on each key.
	pub algorithm: Algorithm,
}
impl KeySpec {
	/// Check that the combination can be generated.
	pub fn validate(&self) -> Result<()> {
		if self.count == 0 {
			return Err(Error::KeyGeneration("At least one key must be requested.".into()));
		}
		if !self.key_type.supports(self.algorithm) {
			return Err(Error::KeyGeneration(format!(
				"Algorithm {:?} cannot be used with {} keys.",
				self.algorithm, self.key_type
			)));
		}
		let in_range = (MIN_RSA_KEY_SIZE..=MAX_RSA_KEY_SIZE).contains(&self.size);

		if !in_range || !self.size.is_multiple_of(8) {
			return Err(Error::KeyGeneration(format!(
				"Key size {} is not supported; use a multiple of 8 between {MIN_RSA_KEY_SIZE} and \
				 {MAX_RSA_KEY_SIZE} bits.",
				self.size
			)));
		}

		Ok(())
	}
}
impl Default for KeySpec {
	fn default() -> Self {
		Self { count: 10, key_type: KeyType::Rsa, size: 2048, algorithm: Algorithm::RS256 }
	}
}

/// Source of fresh key sets.
pub trait GenerateKeys {
	/// Produce `spec.count` keys, each with a unique key ID.
	fn generate(&self, spec: &KeySpec) -> Result<KeySet>;
}
impl<G> GenerateKeys for &G
where
	G: GenerateKeys + ?Sized,
{
	fn generate(&self, spec: &KeySpec) -> Result<KeySet> {
		(**self).generate(spec)
	}
}

/// Generator backed by the `rsa` crate and the operating system RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RsaKeyGenerator;
impl GenerateKeys for RsaKeyGenerator {
	fn generate(&self, spec: &KeySpec) -> Result<KeySet> {
		spec.validate()?;

		let started = Instant::now();
		let mut rng = OsRng;
		let mut keys = Vec::with_capacity(spec.count);

		for _ in 0..spec.count {
			let private = RsaPrivateKey::new(&mut rng, spec.size as usize)
				.map_err(|err| Error::KeyGeneration(err.to_string()))?;

			keys.push(SigningKey::from_rsa_private(
				Uuid::new_v4().to_string(),
				spec.algorithm,
				private,
			));
		}

		let elapsed = started.elapsed();

		tracing::debug!(
			count = spec.count,
			size = spec.size,
			algorithm = ?spec.algorithm,
			?elapsed,
			"generated signing keys"
		);
		metrics::record_key_generation(spec.count, elapsed);

		KeySet::new(keys)
	}
}

#[cfg(test)]
pub(crate) fn test_keys(count: usize) -> KeySet {
	RsaKeyGenerator
		.generate(&KeySpec { count, ..KeySpec::default() })
		.expect("test key generation")
}
