//! Policies choosing which private key signs the next token.

// std
use std::{cell::RefCell, fmt::Debug};
// crates.io
use rand::{Rng, SeedableRng, rngs::SmallRng};

thread_local! {
	static SMALL_RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_rng(&mut rand::rng()));
}

/// Chooses an index into a key set of `len` members.
///
/// Implementations must return a value below `len` whenever `len > 0`.
pub trait KeySelector: Debug + Send + Sync {
	/// Select a key index.
	fn select(&self, len: usize) -> usize;
}

/// Uniform draw over the whole set from a thread-local [`SmallRng`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformSelector;
impl KeySelector for UniformSelector {
	fn select(&self, len: usize) -> usize {
		if len <= 1 {
			return 0;
		}

		SMALL_RNG.with(|cell| cell.borrow_mut().random_range(0..len))
	}
}

/// Always returns the same index, clamped to the last member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedSelector(pub usize);
impl KeySelector for FixedSelector {
	fn select(&self, len: usize) -> usize {
		self.0.min(len.saturating_sub(1))
	}
}
