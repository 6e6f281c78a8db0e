//! Process-local credential store shared by the broker and every caller.

// self
use crate::{_prelude::*, auth::Credential};

/// Snapshot held by the store: the current credential or the failure that replaced it.
pub type CredentialState = Result<Arc<Credential>, Arc<Error>>;

/// Holds at most one credential (or the last fetch error) for unbounded concurrent readers.
///
/// Reads never block on I/O and never observe a partially written value; writes replace the
/// whole snapshot (last writer wins). Clones share the same underlying slot.
#[derive(Clone, Debug)]
pub struct CredentialStore(Arc<RwLock<CredentialState>>);
impl CredentialStore {
	/// Creates a store seeded with an initial fetch outcome.
	pub fn new(initial: Result<Credential>) -> Self {
		Self(Arc::new(RwLock::new(into_state(initial))))
	}

	/// Returns the current snapshot.
	pub fn read(&self) -> CredentialState {
		// Recursive reads do not queue behind waiting writers, which keeps the hot path
		// reader-biased.
		self.0.read_recursive().clone()
	}

	/// Replaces the snapshot with a fetch outcome and returns what was stored.
	pub fn write(&self, outcome: Result<Credential>) -> CredentialState {
		let state = into_state(outcome);

		*self.0.write() = state.clone();

		state
	}

	/// Replaces the snapshot with an already shared state.
	pub fn replace(&self, state: CredentialState) {
		*self.0.write() = state;
	}

	/// Returns the current credential, or [`Error::CredentialUnavailable`] when an error is held.
	pub fn current(&self) -> Result<Arc<Credential>> {
		self.read().map_err(Error::CredentialUnavailable)
	}
}

fn into_state(outcome: Result<Credential>) -> CredentialState {
	outcome.map(Arc::new).map_err(Arc::new)
}
