//! Issuer error envelope and code classification.

// self
use crate::{_prelude::*, error::IssuerError};

/// Code the issuer reports for a successful call.
pub const ERR_CODE_OK: i64 = 0;
/// Code the issuer reports when a credential is invalid (rotated or revoked out of band).
pub const ERR_CODE_INVALID_CREDENTIAL: i64 = 40001;
/// Code the issuer reports when a credential has timed out.
pub const ERR_CODE_CREDENTIAL_TIMEOUT: i64 = 42001;

/// How the request wrapper treats an issuer code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssuerCodeClass {
	/// The call succeeded.
	Ok,
	/// The attached credential was rejected; one coordinated retry is allowed.
	CredentialExpired,
	/// Any other failure; surfaced to the caller as-is.
	Terminal,
}

/// Issuer codes that drive the request wrapper's retry decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerCodes {
	/// Distinguished success code.
	pub ok: i64,
	/// Codes signalling an expired or invalid credential.
	pub expired: BTreeSet<i64>,
}
impl IssuerCodes {
	/// Classifies a raw issuer code.
	pub fn classify(&self, code: i64) -> IssuerCodeClass {
		if code == self.ok {
			IssuerCodeClass::Ok
		} else if self.expired.contains(&code) {
			IssuerCodeClass::CredentialExpired
		} else {
			IssuerCodeClass::Terminal
		}
	}
}
impl Default for IssuerCodes {
	fn default() -> Self {
		Self {
			ok: ERR_CODE_OK,
			expired: BTreeSet::from([ERR_CODE_INVALID_CREDENTIAL, ERR_CODE_CREDENTIAL_TIMEOUT]),
		}
	}
}

/// Error envelope embedded in every issuer response body.
///
/// Bodies that omit the fields are treated as successful, matching issuers that only send
/// `errcode` on failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerStatus {
	/// Issuer error code.
	#[serde(default)]
	pub errcode: i64,
	/// Human-readable description.
	#[serde(default)]
	pub errmsg: String,
}
impl IssuerStatus {
	/// Converts the envelope into an [`IssuerError`].
	pub fn into_error(self) -> IssuerError {
		IssuerError::new(self.errcode, self.errmsg)
	}
}
