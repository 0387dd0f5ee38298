// SPDX-License-Identifier: MIT

//! The closed set of game categories.

use std::fmt;

/// One game category. Each category owns a top-level field of the user
/// document and a fixed legacy local-storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GameCategory {
    Typing,
    Arithmetic,
    Stroop,
    NBack,
    Reaction,
    Memory,
    VisualSearch,
}

impl GameCategory {
    /// All known categories, in wire-field order.
    pub const ALL: [GameCategory; 7] = [
        GameCategory::Typing,
        GameCategory::Arithmetic,
        GameCategory::Stroop,
        GameCategory::NBack,
        GameCategory::Reaction,
        GameCategory::Memory,
        GameCategory::VisualSearch,
    ];

    /// Top-level field name of this category's sub-record in the user
    /// document. Also the name used in field masks, so it must stay a
    /// plain identifier.
    pub fn field_name(self) -> &'static str {
        match self {
            GameCategory::Typing => "typing",
            GameCategory::Arithmetic => "arithmetic",
            GameCategory::Stroop => "stroop",
            GameCategory::NBack => "nback",
            GameCategory::Reaction => "reaction",
            GameCategory::Memory => "memory",
            GameCategory::VisualSearch => "visualSearch",
        }
    }

    /// Fixed legacy local-storage key for this category.
    pub fn legacy_key(self) -> String {
        format!("focus-games-{}", self.field_name())
    }

    /// Reverse of [`field_name`](Self::field_name).
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.field_name() == name)
    }
}

impl fmt::Display for GameCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_categories() {
        assert_eq!(GameCategory::ALL.len(), 7);
    }

    #[test]
    fn test_legacy_keys() {
        assert_eq!(GameCategory::Stroop.legacy_key(), "focus-games-stroop");
        assert_eq!(GameCategory::Typing.legacy_key(), "focus-games-typing");
    }

    #[test]
    fn test_field_name_roundtrip() {
        for category in GameCategory::ALL {
            assert_eq!(
                GameCategory::from_field_name(category.field_name()),
                Some(category)
            );
        }
        assert_eq!(GameCategory::from_field_name("chess"), None);
    }
}
