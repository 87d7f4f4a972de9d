use std::collections::BTreeMap;

use crate::tokens::types::{Token, TokenKey, Version};

/// What changed between the persisted list and the rebuilt one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDiff {
    pub additions: Vec<TokenKey>,
    pub removals: Vec<TokenKey>,
    pub modifications: Vec<TokenKey>,
}

impl TokenDiff {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty() && self.modifications.is_empty()
    }

    /// Removals break consumers (major), additions extend the list (minor),
    /// anything else is a metadata fix (patch).
    pub fn bump(&self) -> Option<Bump> {
        if !self.removals.is_empty() {
            Some(Bump::Major)
        } else if !self.additions.is_empty() {
            Some(Bump::Minor)
        } else if !self.modifications.is_empty() {
            Some(Bump::Patch)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump {
    Major,
    Minor,
    Patch,
}

impl Bump {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
        }
    }
}

impl Version {
    pub fn bumped(self, bump: Bump) -> Version {
        match bump {
            Bump::Major => Version {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            Bump::Minor => Version {
                minor: self.minor + 1,
                patch: 0,
                ..self
            },
            Bump::Patch => Version {
                patch: self.patch + 1,
                ..self
            },
        }
    }
}

/// Compare two token maps. Keys come out in ascending order.
pub fn diff_tokens(
    previous: &BTreeMap<TokenKey, Token>,
    next: &BTreeMap<TokenKey, Token>,
) -> TokenDiff {
    let mut diff = TokenDiff::default();
    let mut remaining = previous.clone();

    for (key, token) in next {
        match remaining.remove(key) {
            None => diff.additions.push(*key),
            Some(old) if old != *token => diff.modifications.push(*key),
            Some(_) => {}
        }
    }
    diff.removals.extend(remaining.into_keys());
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    fn entry(n: u8, symbol: &str) -> (TokenKey, Token) {
        let address = Address::with_last_byte(n);
        (
            TokenKey::new(1, address),
            Token {
                address: address.to_checksum(None),
                name: format!("Token {}", n),
                symbol: symbol.to_string(),
                chain_id: 1,
                decimals: 18,
                ..Default::default()
            },
        )
    }

    fn map(entries: &[(TokenKey, Token)]) -> BTreeMap<TokenKey, Token> {
        entries.iter().cloned().collect()
    }

    const V: Version = Version {
        major: 2,
        minor: 3,
        patch: 4,
    };

    #[test]
    fn test_identical_is_noop() {
        let previous = map(&[entry(1, "A"), entry(2, "B")]);
        let diff = diff_tokens(&previous, &previous.clone());
        assert!(diff.is_empty());
        assert_eq!(diff.bump(), None);
    }

    #[test]
    fn test_addition_is_minor() {
        let previous = map(&[entry(1, "A")]);
        let next = map(&[entry(1, "A"), entry(2, "B")]);
        let diff = diff_tokens(&previous, &next);
        assert_eq!(diff.additions, vec![entry(2, "B").0]);
        assert_eq!(diff.bump(), Some(Bump::Minor));
        assert_eq!(V.bumped(Bump::Minor), Version { major: 2, minor: 4, patch: 0 });
    }

    #[test]
    fn test_modification_is_patch() {
        let previous = map(&[entry(1, "A")]);
        let next = map(&[entry(1, "A2")]);
        let diff = diff_tokens(&previous, &next);
        assert_eq!(diff.modifications.len(), 1);
        assert_eq!(diff.bump(), Some(Bump::Patch));
        assert_eq!(V.bumped(Bump::Patch), Version { major: 2, minor: 3, patch: 5 });
    }

    #[test]
    fn test_occurrence_change_is_modification() {
        let (key, token) = entry(1, "A");
        let mut counted = token.clone();
        counted.occurrence = Some(3);
        let diff = diff_tokens(&map(&[(key, token)]), &map(&[(key, counted)]));
        assert_eq!(diff.bump(), Some(Bump::Patch));
    }

    #[test]
    fn test_removal_beats_addition() {
        let previous = map(&[entry(1, "A"), entry(2, "B")]);
        let next = map(&[entry(1, "A changed"), entry(3, "C")]);
        let diff = diff_tokens(&previous, &next);
        assert_eq!(diff.removals, vec![entry(2, "B").0]);
        assert_eq!(diff.additions, vec![entry(3, "C").0]);
        assert_eq!(diff.modifications, vec![entry(1, "A").0]);
        assert_eq!(diff.bump(), Some(Bump::Major));
        assert_eq!(V.bumped(Bump::Major), Version { major: 3, minor: 0, patch: 0 });
    }

    #[test]
    fn test_diff_leaves_inputs_untouched() {
        let previous = map(&[entry(1, "A"), entry(2, "B")]);
        let next = map(&[entry(1, "A")]);
        diff_tokens(&previous, &next);
        assert_eq!(previous.len(), 2);
    }
}
