//! Mail address and recipient decoding
//!
//! Two entry points turn administrator input into [`AddressParts`]:
//!
//! - [`decode_address`] accepts a bare address: `user`, `user+tag@domain`,
//!   or a catch-all `@domain`.
//! - [`decode_target`] also accepts the special alias targets of aliases(5):
//!   a file path (`/var/mail/archive`), a pipe (`|/usr/bin/vacation`), a
//!   quoted pipe (`"|/usr/bin/procmail -a x"`), or an include
//!   (`:include:/etc/mail/staff`).
//!
//! # Examples
//!
//! ```
//! use maildb::mail::{decode_address, decode_target};
//!
//! let addr = decode_address(" Bill+Lists@Example.COM ").unwrap();
//! assert_eq!(addr.localpart, "bill");
//! assert_eq!(addr.extension.as_deref(), Some("lists"));
//! assert_eq!(addr.domain.as_deref(), Some("example.com"));
//!
//! let pipe = decode_target("|/usr/bin/vacation").unwrap();
//! assert!(pipe.is_pipe());
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Characters that never appear in a stored address
const ILLEGAL_CHARS: &[char] = &[
    '\n', '\r', '\t', '\x0c', '{', '}', '(', ')', '[', ']', ';', '"', ',', '#',
];

/// Map file separators; a file, pipe or include target holding one could
/// not be read back from an exported aliases file
const MAP_RESERVED: &[char] = &[',', '#'];

const INCLUDE_PREFIX: &str = ":include:";

/// Error type for address decoding
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address contains illegal characters: '{0}'")]
    IllegalCharacters(String),

    #[error("address has an extension but no local part: '{0}'")]
    NoLocalPart(String),

    #[error("address has an empty domain: '{0}'")]
    EmptyDomain(String),

    #[error("pipe target has no command: '{0}'")]
    NoLocalPipe(String),

    #[error("pipe command with spaces must be quoted: '{0}'")]
    NoQuotedSpace(String),

    #[error("malformed include directive: '{0}'")]
    BadInclude(String),

    #[error("target may not contain ',' or '#': '{0}'")]
    MapReserved(String),
}

/// A decoded address or recipient target
///
/// For ordinary addresses `localpart` and `domain` are set and `extension`
/// holds the `+tag` part if there was one. For file, pipe and include
/// targets only `extension` is set, holding the original text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AddressParts {
    pub localpart: String,
    pub domain: Option<String>,
    pub extension: Option<String>,
}

impl AddressParts {
    /// A local address: no domain
    pub fn is_local(&self) -> bool {
        !self.localpart.is_empty() && self.domain.is_none()
    }

    /// A file, pipe or include target
    pub fn is_pipe(&self) -> bool {
        self.localpart.is_empty() && self.domain.is_none() && self.extension.is_some()
    }

    /// The local part as stored, with any `+extension` kept
    pub fn mailbox(&self) -> String {
        match &self.extension {
            Some(ext) if !self.is_pipe() => format!("{}+{}", self.localpart, ext),
            _ => self.localpart.clone(),
        }
    }
}

impl fmt::Display for AddressParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pipe() {
            return f.write_str(self.extension.as_deref().unwrap_or_default());
        }
        f.write_str(&self.mailbox())?;
        if let Some(domain) = &self.domain {
            write!(f, "@{}", domain)?;
        }
        Ok(())
    }
}

/// Decode a bare address
///
/// The input is trimmed and lowercased. The part before the first `@` is the
/// local part, which is further split on the first `+` into local part and
/// extension.
pub fn decode_address(s: &str) -> Result<AddressParts, AddressError> {
    let text = s.trim().to_lowercase();
    if text.is_empty() {
        return Err(AddressError::Empty);
    }
    if text.contains(ILLEGAL_CHARS) || text.contains(' ') {
        return Err(AddressError::IllegalCharacters(text));
    }

    let (local, domain) = match text.split_once('@') {
        Some((_, "")) => return Err(AddressError::EmptyDomain(text)),
        Some((local, domain)) => (local, Some(domain.to_string())),
        None => (text.as_str(), None),
    };

    let (localpart, extension) = match local.split_once('+') {
        Some(("", _)) => return Err(AddressError::NoLocalPart(text)),
        Some((lpart, ext)) => (lpart.to_string(), Some(ext.to_string())),
        None => (local.to_string(), None),
    };

    if localpart.is_empty() && domain.is_none() {
        return Err(AddressError::Empty);
    }

    Ok(AddressParts {
        localpart,
        domain,
        extension,
    })
}

/// Decode the right-hand side of an alias
///
/// Special targets are recognised first, in this order: a path starting with
/// `/`, a bare pipe `|cmd`, a quoted pipe `"|cmd args"`, and an include
/// `:include:path`. Anything else must be an address.
pub fn decode_target(s: &str) -> Result<AddressParts, AddressError> {
    let text = s.trim();

    let special_target = text.starts_with(['/', '|', ':']) || text.starts_with("\"|");
    if special_target && text.contains(MAP_RESERVED) {
        return Err(AddressError::MapReserved(text.to_string()));
    }

    if text.starts_with('/') {
        return Ok(special(text));
    }

    if let Some(command) = text.strip_prefix('|') {
        if command.is_empty() {
            return Err(AddressError::NoLocalPipe(text.to_string()));
        }
        if command.contains(char::is_whitespace) {
            return Err(AddressError::NoQuotedSpace(text.to_string()));
        }
        return Ok(special(text));
    }

    if let Some(quoted) = text.strip_prefix("\"|") {
        return match quoted.strip_suffix('"') {
            Some(command) if !command.trim().is_empty() => Ok(special(text)),
            _ => Err(AddressError::NoLocalPipe(text.to_string())),
        };
    }

    if text.starts_with(':') {
        return match text.get(..INCLUDE_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(INCLUDE_PREFIX) => {
                let path = text[INCLUDE_PREFIX.len()..].trim();
                if path.is_empty() || path.contains(char::is_whitespace) {
                    Err(AddressError::BadInclude(text.to_string()))
                } else {
                    Ok(special(text))
                }
            }
            _ => Err(AddressError::BadInclude(text.to_string())),
        };
    }

    decode_address(text)
}

fn special(text: &str) -> AddressParts {
    AddressParts {
        extension: Some(text.to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain() {
        let addr = decode_address("Bill@SomeWhere.org").unwrap();
        assert_eq!(addr.localpart, "bill");
        assert_eq!(addr.domain.as_deref(), Some("somewhere.org"));
        assert_eq!(addr.extension, None);
        assert!(!addr.is_local());
        assert_eq!(addr.to_string(), "bill@somewhere.org");
    }

    #[test]
    fn test_decode_local() {
        let addr = decode_address("  postmaster ").unwrap();
        assert!(addr.is_local());
        assert!(!addr.is_pipe());
        assert_eq!(addr.to_string(), "postmaster");
    }

    #[test]
    fn test_decode_extension() {
        let addr = decode_address("dave+noc+x@example.com").unwrap();
        assert_eq!(addr.localpart, "dave");
        assert_eq!(addr.extension.as_deref(), Some("noc+x"));
        assert_eq!(addr.mailbox(), "dave+noc+x");
        assert_eq!(addr.to_string(), "dave+noc+x@example.com");
    }

    #[test]
    fn test_decode_catch_all() {
        let addr = decode_address("@example.com").unwrap();
        assert_eq!(addr.localpart, "");
        assert_eq!(addr.to_string(), "@example.com");
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_address("   "), Err(AddressError::Empty));
        assert!(matches!(
            decode_address("bad;name@example.com"),
            Err(AddressError::IllegalCharacters(_))
        ));
        assert!(matches!(
            decode_address("a\"b"),
            Err(AddressError::IllegalCharacters(_))
        ));
        assert!(matches!(
            decode_address("+ext@example.com"),
            Err(AddressError::NoLocalPart(_))
        ));
        assert!(matches!(
            decode_address("bill@"),
            Err(AddressError::EmptyDomain(_))
        ));
    }

    #[test]
    fn test_canonical_round_trip() {
        for text in ["bill", "bill@sysops", "bill+x@a.b.org", "@catch.all"] {
            assert_eq!(decode_address(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_targets() {
        let file = decode_target("/var/spool/archive").unwrap();
        assert!(file.is_pipe());
        assert_eq!(file.extension.as_deref(), Some("/var/spool/archive"));

        let pipe = decode_target("|/usr/bin/vacation").unwrap();
        assert!(pipe.is_pipe());

        let quoted = decode_target("\"|/usr/bin/procmail -a Work\"").unwrap();
        assert_eq!(quoted.to_string(), "\"|/usr/bin/procmail -a Work\"");

        let include = decode_target(":include:/etc/mail/staff").unwrap();
        assert!(include.is_pipe());

        let addr = decode_target("Dave@NOC").unwrap();
        assert_eq!(addr.to_string(), "dave@noc");
        assert!(!addr.is_pipe());
    }

    #[test]
    fn test_target_errors() {
        assert!(matches!(decode_target("|"), Err(AddressError::NoLocalPipe(_))));
        assert!(matches!(decode_target("\"|\""), Err(AddressError::NoLocalPipe(_))));
        assert!(matches!(
            decode_target("|/bin/cat -n"),
            Err(AddressError::NoQuotedSpace(_))
        ));
        assert!(matches!(
            decode_target(":exclude:/etc/x"),
            Err(AddressError::BadInclude(_))
        ));
        assert!(matches!(decode_target(":include:"), Err(AddressError::BadInclude(_))));
        assert!(matches!(
            decode_target("\""),
            Err(AddressError::IllegalCharacters(_))
        ));
    }

    #[test]
    fn test_targets_reject_map_separators() {
        for text in [
            "\"|/usr/bin/procmail -a x,y\"",
            "\"|/usr/bin/tagit #1\"",
            "|/usr/bin/tagit#1",
            "/var/spool/a,b",
            ":include:/etc/mail/#staff",
        ] {
            assert!(
                matches!(decode_target(text), Err(AddressError::MapReserved(_))),
                "accepted {}",
                text
            );
        }
        assert!(matches!(
            decode_address("bill#1@example.com"),
            Err(AddressError::IllegalCharacters(_))
        ));
        assert!(matches!(
            decode_target("bill,dave"),
            Err(AddressError::IllegalCharacters(_))
        ));
    }
}
