//! Validated names for applications and issuers.

// self
use crate::_prelude::*;

const MAX_CHARS: usize = 128;

/// Reason an identifier was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierProblem {
	/// Nothing was supplied.
	Empty,
	/// Whitespace (including non-ASCII spaces) appeared in the value.
	Whitespace,
	/// More than 128 characters were supplied.
	TooLong,
}
impl Display for IdentifierProblem {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Empty => f.write_str("cannot be empty"),
			Self::Whitespace => f.write_str("cannot contain whitespace"),
			Self::TooLong => write!(f, "cannot exceed {MAX_CHARS} characters"),
		}
	}
}

/// Error returned when an identifier fails validation.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{kind} identifier {problem}.")]
pub struct IdentifierError {
	/// Which identifier was rejected (`App`, `Issuer`).
	pub kind: &'static str,
	/// Why it was rejected.
	pub problem: IdentifierProblem,
}

fn check(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
	let problem = if value.is_empty() {
		IdentifierProblem::Empty
	} else if value.chars().any(char::is_whitespace) {
		IdentifierProblem::Whitespace
	} else if value.chars().count() > MAX_CHARS {
		IdentifierProblem::TooLong
	} else {
		return Ok(());
	};

	Err(IdentifierError { kind, problem })
}

macro_rules! def_id {
	($name:ident, $kind:literal, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps an identifier.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				Self::try_from(value.into())
			}

			/// Identifier text as sent on the wire.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				check($kind, &value).map(|()| Self(value))
			}
		}
		impl From<$name> for String {
			fn from(id: $name) -> Self {
				id.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

def_id! { AppId, "App", "Application identifier (`appid`/`corpid`) presented to the issuer." }
def_id! { IssuerId, "Issuer", "Name of an issuer descriptor, used in logs and metrics." }
