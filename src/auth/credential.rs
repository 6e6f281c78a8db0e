//! Immutable credential values handed out by the broker.

// self
use crate::{_prelude::*, auth::CredentialSecret};

/// Short-lived bearer credential.
///
/// A credential is never mutated once issued; renewals replace it wholesale. `valid_until`
/// already has the safety margin subtracted, so a credential is trusted until then (barring
/// clock skew or out-of-band invalidation).
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	secret: CredentialSecret,
	obtained_at: OffsetDateTime,
	valid_until: OffsetDateTime,
}
impl Credential {
	/// Creates a credential valid for `valid_for` starting at `obtained_at`.
	///
	/// Fails with [`Error::InvalidExpiry`] when `valid_until` falls outside the representable
	/// date range.
	pub fn new(
		value: impl Into<String>,
		obtained_at: OffsetDateTime,
		valid_for: Duration,
	) -> Result<Self> {
		let valid_until = obtained_at
			.checked_add(valid_for)
			.ok_or(Error::InvalidExpiry { expires_in: valid_for.whole_seconds() })?;

		Ok(Self { secret: CredentialSecret::new(value), obtained_at, valid_until })
	}

	/// Bearer secret attached to outbound requests.
	pub fn secret(&self) -> &CredentialSecret {
		&self.secret
	}

	/// Instant the credential was received from the issuer.
	pub fn obtained_at(&self) -> OffsetDateTime {
		self.obtained_at
	}

	/// Instant after which the broker stops trusting the credential.
	pub fn valid_until(&self) -> OffsetDateTime {
		self.valid_until
	}

	/// Total trusted validity (`valid_until - obtained_at`).
	pub fn lifetime(&self) -> Duration {
		self.valid_until - self.obtained_at
	}

	/// Returns `true` when this credential carries the given raw value.
	pub fn matches(&self, value: &str) -> bool {
		self.secret.expose() == value
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("secret", &"<redacted>")
			.field("obtained_at", &self.obtained_at)
			.field("valid_until", &self.valid_until)
			.finish()
	}
}
