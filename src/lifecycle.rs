//! First-run setup, forced rotation, and loading of the persisted key pair.

// self
use crate::{
	_prelude::*,
	key::{
		KeyRing,
		generator::{GenerateKeys, KeySpec, RsaKeyGenerator},
	},
	store::KeyStore,
};

/// Store name of the publishable key set.
pub const PUBLIC_KEY_SET: &str = "jwks";
/// Store name of the key set holding private material.
pub const PRIVATE_KEY_SET: &str = "jwks_private";

/// Outcome of [`KeyLifecycle::ensure_keys_ready`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regeneration {
	/// A fresh set was generated and both artifacts were overwritten.
	Regenerated,
	/// Persisted artifacts were left untouched.
	Unchanged,
}

/// Decides when keys are (re)generated and persists them through a [`KeyStore`].
///
/// Run once at startup, before any reader touches the store: regeneration overwrites two
/// artifacts one after the other, and a crash in between leaves a pair that [`Self::load`]
/// rejects.
#[derive(Debug)]
pub struct KeyLifecycle<S, G = RsaKeyGenerator> {
	store: S,
	generator: G,
}
impl<S> KeyLifecycle<S>
where
	S: KeyStore,
{
	/// Manage `store` with the default RSA generator.
	pub fn new(store: S) -> Self {
		Self::with_generator(store, RsaKeyGenerator)
	}
}
impl<S, G> KeyLifecycle<S, G>
where
	S: KeyStore,
	G: GenerateKeys,
{
	/// Manage `store` with a custom generator.
	pub fn with_generator(store: S, generator: G) -> Self {
		Self { store, generator }
	}

	/// Backing store.
	pub fn store(&self) -> &S {
		&self.store
	}

	/// Generate and persist a fresh set when forced or when neither artifact exists.
	///
	/// The private set is written before its public projection. When only one artifact exists
	/// and `force` is off nothing is written.
	pub fn ensure_keys_ready(&self, force: bool, spec: &KeySpec) -> Result<Regeneration> {
		let public_exists = self.store.exists(PUBLIC_KEY_SET);
		let private_exists = self.store.exists(PRIVATE_KEY_SET);

		if !force && (public_exists || private_exists) {
			if public_exists != private_exists {
				tracing::warn!(
					public_exists,
					private_exists,
					"only one persisted key set found; leaving it untouched"
				);
			}

			tracing::info!("persisted key sets found; skipping generation");

			return Ok(Regeneration::Unchanged);
		}

		tracing::info!(
			force,
			count = spec.count,
			size = spec.size,
			algorithm = ?spec.algorithm,
			"generating signing keys"
		);

		let keys = self.generator.generate(spec)?;

		self.store.write_key_set(PRIVATE_KEY_SET, &keys)?;
		self.store.write_key_set(PUBLIC_KEY_SET, &keys.to_public())?;

		Ok(Regeneration::Regenerated)
	}

	/// Read both artifacts and pair them into a [`KeyRing`].
	pub fn load(&self) -> Result<KeyRing> {
		let public = self.store.read(PUBLIC_KEY_SET)?;
		let private = self.store.read(PRIVATE_KEY_SET)?;
		let ring = KeyRing::new(public, private)?;

		tracing::info!(keys = ring.private().len(), "loaded signing keys");

		Ok(ring)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		key::{KeySet, generator::test_keys},
		store::{FileKeyStore, MemoryKeyStore, scratch_dir},
	};

	#[derive(Debug)]
	struct CountingGenerator {
		calls: AtomicUsize,
	}
	impl CountingGenerator {
		fn new() -> Self {
			Self { calls: AtomicUsize::new(0) }
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl GenerateKeys for CountingGenerator {
		fn generate(&self, spec: &KeySpec) -> Result<KeySet> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Ok(test_keys(spec.count))
		}
	}

	fn small_spec() -> KeySpec {
		KeySpec { count: 2, ..KeySpec::default() }
	}

	#[test]
	fn first_run_generates_and_writes_both_sets() {
		let store = MemoryKeyStore::new();
		let generator = CountingGenerator::new();
		let lifecycle = KeyLifecycle::with_generator(&store, &generator);

		assert_eq!(
			lifecycle.ensure_keys_ready(false, &small_spec()).unwrap(),
			Regeneration::Regenerated
		);
		assert_eq!(generator.calls(), 1);
		assert_eq!(store.writes(), 2);

		let ring = lifecycle.load().unwrap();

		assert_eq!(ring.public().len(), 2);
		assert!(!ring.public().has_private_material());
	}

	#[test]
	fn existing_sets_are_left_alone_without_force() {
		let store = MemoryKeyStore::new();
		let generator = CountingGenerator::new();
		let lifecycle = KeyLifecycle::with_generator(&store, &generator);

		lifecycle.ensure_keys_ready(true, &small_spec()).unwrap();

		let before = lifecycle.load().unwrap();

		assert_eq!(
			lifecycle.ensure_keys_ready(false, &small_spec()).unwrap(),
			Regeneration::Unchanged
		);
		assert_eq!(generator.calls(), 1);
		assert_eq!(store.writes(), 2);

		let after = lifecycle.load().unwrap();

		assert_eq!(
			before.private().kids().collect::<Vec<_>>(),
			after.private().kids().collect::<Vec<_>>()
		);
	}

	#[test]
	fn force_always_regenerates() {
		let store = MemoryKeyStore::new();
		let generator = CountingGenerator::new();
		let lifecycle = KeyLifecycle::with_generator(&store, &generator);

		lifecycle.ensure_keys_ready(true, &small_spec()).unwrap();

		let first = lifecycle.load().unwrap();

		assert_eq!(
			lifecycle.ensure_keys_ready(true, &small_spec()).unwrap(),
			Regeneration::Regenerated
		);
		assert_eq!(generator.calls(), 2);
		assert_eq!(store.writes(), 4);

		let second = lifecycle.load().unwrap();

		assert_ne!(first.private().keys()[0].kid(), second.private().keys()[0].kid());
	}

	#[test]
	fn a_single_leftover_artifact_blocks_generation_and_loading() {
		let store = MemoryKeyStore::new();
		let generator = CountingGenerator::new();
		let lifecycle = KeyLifecycle::with_generator(&store, &generator);

		lifecycle.ensure_keys_ready(true, &small_spec()).unwrap();
		store.remove(PUBLIC_KEY_SET);

		assert_eq!(
			lifecycle.ensure_keys_ready(false, &small_spec()).unwrap(),
			Regeneration::Unchanged
		);
		assert_eq!(generator.calls(), 1);
		assert!(matches!(lifecycle.load(), Err(Error::StorageRead { .. })));
	}

	#[test]
	fn torn_pair_is_rejected_on_load() {
		let store = MemoryKeyStore::new();
		let lifecycle = KeyLifecycle::with_generator(&store, CountingGenerator::new());

		lifecycle.ensure_keys_ready(true, &small_spec()).unwrap();
		store.write_key_set(PUBLIC_KEY_SET, &test_keys(2).to_public()).unwrap();

		assert!(matches!(lifecycle.load(), Err(Error::KeySetMismatch(_))));
	}

	#[test]
	fn generation_errors_prevent_any_write() {
		let store = MemoryKeyStore::new();
		let lifecycle = KeyLifecycle::new(&store);
		let spec = KeySpec { size: 512, ..small_spec() };

		assert!(matches!(lifecycle.ensure_keys_ready(true, &spec), Err(Error::KeyGeneration(_))));
		assert_eq!(store.writes(), 0);
	}

	#[test]
	fn file_store_lays_out_both_artifacts() {
		let dir = scratch_dir("lifecycle");
		let lifecycle = KeyLifecycle::new(FileKeyStore::new(&dir));

		lifecycle.ensure_keys_ready(false, &KeySpec { count: 1, ..KeySpec::default() }).unwrap();

		assert!(dir.join(PUBLIC_KEY_SET).is_file());
		assert!(dir.join(PRIVATE_KEY_SET).is_file());

		let public = std::fs::read_to_string(dir.join(PUBLIC_KEY_SET)).unwrap();

		assert!(!public.contains("\"d\""));
		assert!(lifecycle.load().is_ok());
	}
}
