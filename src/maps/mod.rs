//! Import and export of map files
//!
//! Each [`MapKind`] pairs an entity with the text convention administrators
//! already keep it in. Import reads a whole file in one transaction, so a
//! bad record leaves the database untouched. Export writes the same form
//! back out in name order.

mod export;
mod import;

pub use export::export;
pub use import::import;

use crate::repo::AliasKind;
use mapfile::Syntax;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    /// `name action`
    Access,
    /// `name transport:nexthop`
    Transport,
    /// `name class key=value ...`
    Domain,
    /// `address key=value, ...`
    Address,
    /// `address recipient, ...`
    VirtualAlias,
    /// `name: recipient, ...`
    LocalAlias,
    /// Dovecot passwd-file lines
    Mailbox,
}

impl MapKind {
    pub fn syntax(self) -> Syntax {
        match self {
            MapKind::Access | MapKind::Transport | MapKind::Domain => Syntax::Simple,
            MapKind::Address | MapKind::VirtualAlias | MapKind::Mailbox => Syntax::Postfix,
            MapKind::LocalAlias => Syntax::Aliases,
        }
    }

    pub(crate) fn alias_kind(self) -> Option<AliasKind> {
        match self {
            MapKind::VirtualAlias => Some(AliasKind::Virtual),
            MapKind::LocalAlias => Some(AliasKind::Local),
            _ => None,
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MapKind::Access => "access",
            MapKind::Transport => "transport",
            MapKind::Domain => "domain",
            MapKind::Address => "address",
            MapKind::VirtualAlias => "virtual",
            MapKind::LocalAlias => "alias",
            MapKind::Mailbox => "mailbox",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_per_kind() {
        assert_eq!(MapKind::Transport.syntax(), Syntax::Simple);
        assert_eq!(MapKind::Mailbox.syntax(), Syntax::Postfix);
        assert_eq!(MapKind::LocalAlias.syntax(), Syntax::Aliases);
        assert_eq!(MapKind::VirtualAlias.alias_kind(), Some(AliasKind::Virtual));
        assert_eq!(MapKind::Domain.alias_kind(), None);
    }
}
