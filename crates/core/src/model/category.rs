use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("unknown game category: {0}")]
    Unknown(String),
}

//
// ─── CATEGORY ─────────────────────────────────────────────────────────────────
//

/// The kind of game a session plays.
///
/// Each category owns its own difficulty table, fallback problems and default
/// game configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Probability questions about dice rolls.
    DiceProbability,
    /// Lateral-thinking and logic riddles.
    LogicRiddle,
    /// Riddles (paheliyan) posed in Hindi.
    HindiRiddle,
    /// School curriculum quiz questions.
    K12Quiz,
    /// Arithmetic expressions evaluated by operator precedence.
    Bodmas,
    /// Short arithmetic word problems.
    WordProblem,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::DiceProbability,
        Category::LogicRiddle,
        Category::HindiRiddle,
        Category::K12Quiz,
        Category::Bodmas,
        Category::WordProblem,
    ];

    /// Stable identifier used on the command line and in storage keys.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Category::DiceProbability => "dice-probability",
            Category::LogicRiddle => "logic-riddle",
            Category::HindiRiddle => "hindi-riddle",
            Category::K12Quiz => "k12-quiz",
            Category::Bodmas => "bodmas",
            Category::WordProblem => "word-problem",
        }
    }

    /// Human readable title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Category::DiceProbability => "Dice Probability",
            Category::LogicRiddle => "Logic Riddles",
            Category::HindiRiddle => "Hindi Riddles",
            Category::K12Quiz => "K-12 Quiz",
            Category::Bodmas => "BODMAS",
            Category::WordProblem => "Word Problems",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.slug() == wanted)
            .ok_or(CategoryError::Unknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_parse_back() {
        for category in Category::ALL {
            assert_eq!(category.slug().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(" BODMAS ".parse::<Category>().unwrap(), Category::Bodmas);
    }

    #[test]
    fn unknown_slug_is_rejected() {
        let err = "chess".parse::<Category>().unwrap_err();
        assert_eq!(err, CategoryError::Unknown("chess".into()));
    }

    #[test]
    fn serde_uses_slug() {
        let json = serde_json::to_string(&Category::K12Quiz).unwrap();
        assert_eq!(json, "\"k12-quiz\"");
    }
}
