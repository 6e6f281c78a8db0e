//! Credential sources: the single upstream call that mints a credential.
//!
//! [`CredentialSource`] is the seam between the broker and whatever issues credentials.
//! [`IssuerTokenSource`] exchanges the two long-lived application secrets for an access token;
//! [`TicketSource`] derives a ticket from an access token through the request wrapper, so the
//! same broker machinery can keep either kind fresh.

mod issuer_token;
mod ticket;

pub use issuer_token::*;
pub use ticket::*;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialSource::fetch`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Credential>> + 'a + Send>>;

/// Performs exactly one upstream call per [`fetch`](CredentialSource::fetch).
///
/// Implementations must apply the safety margin before returning, so the credential's
/// `valid_until` is already safe to trust. Failures are returned as-is; retrying is the
/// broker's business.
pub trait CredentialSource
where
	Self: 'static + Send + Sync,
{
	/// Fetches a fresh credential.
	fn fetch(&self) -> SourceFuture<'_>;
}
impl<T> CredentialSource for Arc<T>
where
	T: ?Sized + CredentialSource,
{
	fn fetch(&self) -> SourceFuture<'_> {
		(**self).fetch()
	}
}

/// Converts an advertised validity (seconds) into the validity the broker will trust.
///
/// | advertised `e` | trusted      |
/// |----------------|--------------|
/// | `e > 3600`     | `e - 600`    |
/// | `e > 1800`     | `e - 300`    |
/// | `e > 300`      | `e - 60`     |
/// | `e > 60`       | `e - 10`     |
/// | `e > 0`        | `e`          |
///
/// Non-positive values yield [`Error::InvalidExpiry`].
pub fn apply_safety_margin(expires_in: i64) -> Result<Duration> {
	let margin = match expires_in {
		e if e > 3600 => 600,
		e if e > 1800 => 300,
		e if e > 300 => 60,
		e if e > 60 => 10,
		e if e > 0 => 0,
		_ => return Err(Error::InvalidExpiry { expires_in }),
	};

	Ok(Duration::seconds(expires_in - margin))
}

/// Builds a credential obtained now from an advertised validity in seconds.
///
/// Validities that would push `valid_until` past the representable date range are rejected
/// with [`Error::InvalidExpiry`] carrying the advertised value.
pub(crate) fn credential_from_grant(value: String, expires_in: i64) -> Result<Credential> {
	let valid_for = apply_safety_margin(expires_in)?;

	Credential::new(value, OffsetDateTime::now_utc(), valid_for)
		.map_err(|_| Error::InvalidExpiry { expires_in })
}
