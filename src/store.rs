//! Durable persistence of serialised key sets under logical names.
//!
//! Stores are unaware of which name holds public or private material; that policy belongs to
//! [`crate::lifecycle`].

// std
use std::{
	collections::HashMap,
	fs, io,
	path::{Path, PathBuf},
	sync::{
		PoisonError, RwLock,
		atomic::{AtomicUsize, Ordering},
	},
};
// self
use crate::{_prelude::*, key::KeySet};

/// Name-addressed storage for serialised key sets.
pub trait KeyStore {
	/// Whether content exists under `name`. Never fails for a missing entry.
	fn exists(&self, name: &str) -> bool;

	/// Persist `contents` under `name`, replacing prior content.
	fn write(&self, name: &str, contents: &[u8]) -> Result<()>;

	/// Raw content stored under `name`.
	fn read_bytes(&self, name: &str) -> Result<Vec<u8>>;

	/// Deserialise the key set stored under `name`.
	fn read(&self, name: &str) -> Result<KeySet> {
		let bytes = self.read_bytes(name)?;

		serde_json::from_slice(&bytes)
			.map_err(|source| Error::KeySetParse { name: name.to_owned(), source })
	}

	/// Serialise and persist `keys` under `name`.
	fn write_key_set(&self, name: &str, keys: &KeySet) -> Result<()> {
		self.write(name, keys.to_json()?.as_bytes())
	}
}
impl<S> KeyStore for &S
where
	S: KeyStore + ?Sized,
{
	fn exists(&self, name: &str) -> bool {
		(**self).exists(name)
	}

	fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
		(**self).write(name, contents)
	}

	fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
		(**self).read_bytes(name)
	}
}

/// Key sets stored as files inside one directory.
///
/// Each write lands in a hidden temporary sibling first and is renamed into place, so a
/// single artifact is never observed half-written.
#[derive(Clone, Debug)]
pub struct FileKeyStore {
	dir: PathBuf,
}
impl FileKeyStore {
	/// Use an existing directory.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Create the directory (and parents) if needed, then use it.
	pub fn create_dir(dir: impl Into<PathBuf>) -> Result<Self> {
		let dir = dir.into();

		fs::create_dir_all(&dir)?;

		Ok(Self::new(dir))
	}

	/// Backing directory.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// File path used for `name`.
	pub fn path(&self, name: &str) -> PathBuf {
		self.dir.join(name)
	}

	fn write_atomically(&self, name: &str, contents: &[u8]) -> io::Result<()> {
		let staging = self.dir.join(format!(".{name}.tmp"));

		fs::write(&staging, contents)?;

		if let Err(err) = fs::rename(&staging, self.path(name)) {
			let _ = fs::remove_file(&staging);

			return Err(err);
		}

		Ok(())
	}
}
impl KeyStore for FileKeyStore {
	fn exists(&self, name: &str) -> bool {
		self.path(name).is_file()
	}

	fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
		self.write_atomically(name, contents)
			.map_err(|source| Error::StorageWrite { name: name.to_owned(), source })?;

		tracing::debug!(path = %self.path(name).display(), bytes = contents.len(), "wrote key set");

		Ok(())
	}

	fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
		fs::read(self.path(name))
			.map_err(|source| Error::StorageRead { name: name.to_owned(), source })
	}
}

/// Process-local store, mainly for tests; counts every write it receives.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
	entries: RwLock<HashMap<String, Vec<u8>>>,
	writes: AtomicUsize,
}
impl MemoryKeyStore {
	/// Create an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Total number of successful writes.
	pub fn writes(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}

	/// Drop the entry stored under `name`, returning whether it existed.
	pub fn remove(&self, name: &str) -> bool {
		self.entries.write().unwrap_or_else(PoisonError::into_inner).remove(name).is_some()
	}
}
impl KeyStore for MemoryKeyStore {
	fn exists(&self, name: &str) -> bool {
		self.entries.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
	}

	fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
		self.entries
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(name.to_owned(), contents.to_vec());
		self.writes.fetch_add(1, Ordering::SeqCst);

		Ok(())
	}

	fn read_bytes(&self, name: &str) -> Result<Vec<u8>> {
		self.entries.read().unwrap_or_else(PoisonError::into_inner).get(name).cloned().ok_or_else(
			|| Error::StorageRead {
				name: name.to_owned(),
				source: io::Error::new(io::ErrorKind::NotFound, "no such key set"),
			},
		)
	}
}

#[cfg(test)]
pub(crate) fn scratch_dir(label: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("mock-oidc-{label}-{}", uuid::Uuid::new_v4()));

	fs::create_dir_all(&dir).expect("scratch directory");

	dir
}
