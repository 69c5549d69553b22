use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a provider-supplied problem is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProblemError {
    #[error("problem statement cannot be empty")]
    EmptyStatement,

    #[error("correct answer cannot be empty")]
    EmptyAnswer,

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("options contain a duplicate: {0}")]
    DuplicateOption(String),

    #[error("correct answer {answer:?} is not one of the options")]
    AnswerNotInOptions { answer: String },

    #[error("level {level} is outside 1..={max_level}")]
    LevelOutOfRange { level: u32, max_level: u32 },
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// Unvalidated problem as it arrives from a provider.
///
/// Field names follow the JSON shape requested from the model
/// (`statement`, `options`, `correctAnswer`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDraft {
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: String,
}

impl ProblemDraft {
    #[must_use]
    pub fn new(
        statement: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            statement: statement.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer: correct_answer.into(),
        }
    }

    /// Free-answer problem without options.
    #[must_use]
    pub fn open(statement: impl Into<String>, correct_answer: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            options: Vec::new(),
            correct_answer: correct_answer.into(),
        }
    }

    /// Validate the draft into a `Problem` for the given level.
    ///
    /// Surrounding whitespace is trimmed from every field.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError` if a field is blank, options repeat, the answer
    /// is missing from non-empty options, or the level is outside `1..=max_level`.
    pub fn validate(self, level: u32, max_level: u32) -> Result<Problem, ProblemError> {
        if level == 0 || level > max_level {
            return Err(ProblemError::LevelOutOfRange { level, max_level });
        }

        let statement = self.statement.trim().to_string();
        if statement.is_empty() {
            return Err(ProblemError::EmptyStatement);
        }

        let correct_answer = self.correct_answer.trim().to_string();
        if correct_answer.is_empty() {
            return Err(ProblemError::EmptyAnswer);
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        let mut options = Vec::with_capacity(self.options.len());
        for (index, option) in self.options.into_iter().enumerate() {
            let option = option.trim().to_string();
            if option.is_empty() {
                return Err(ProblemError::EmptyOption { index });
            }
            if !seen.insert(option.clone()) {
                return Err(ProblemError::DuplicateOption(option));
            }
            options.push(option);
        }

        if !options.is_empty() && !options.contains(&correct_answer) {
            return Err(ProblemError::AnswerNotInOptions {
                answer: correct_answer,
            });
        }

        Ok(Problem {
            statement,
            options,
            correct_answer,
            level,
        })
    }
}

//
// ─── PROBLEM ──────────────────────────────────────────────────────────────────
//

/// How a player is expected to answer a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    /// Pick one of the listed options.
    Choice,
    /// Type a number.
    Numeric,
    /// Type free text.
    Text,
}

/// A validated problem.
///
/// If `options` is non-empty, `correct_answer` is one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    statement: String,
    options: Vec<String>,
    correct_answer: String,
    level: u32,
}

impl Problem {
    /// Build from built-in content that is known to hold the invariant.
    pub(crate) fn from_trusted(draft: ProblemDraft, level: u32) -> Self {
        debug_assert!(
            draft.options.is_empty() || draft.options.contains(&draft.correct_answer),
            "built-in problem must list its answer"
        );
        Self {
            statement: draft.statement,
            options: draft.options,
            correct_answer: draft.correct_answer,
            level: level.max(1),
        }
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    #[must_use]
    pub fn answer_kind(&self) -> AnswerKind {
        if self.has_options() {
            AnswerKind::Choice
        } else if is_numeric(&self.correct_answer) {
            AnswerKind::Numeric
        } else {
            AnswerKind::Text
        }
    }

    /// Exact comparison of a (trimmed) selection against the correct answer.
    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        selected.trim() == self.correct_answer
    }
}

/// Accepts integers, decimals and simple fractions such as `1/6`.
pub(crate) fn is_numeric(value: &str) -> bool {
    let value = value.trim();
    if value.parse::<f64>().is_ok_and(f64::is_finite) {
        return true;
    }
    match value.split_once('/') {
        Some((num, den)) => {
            num.trim().parse::<i64>().is_ok()
                && den.trim().parse::<i64>().is_ok_and(|den| den != 0)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_multiple_choice_problem() {
        let problem = ProblemDraft::new("2+2", ["3", "4", "5", "6"], "4")
            .validate(1, 10)
            .unwrap();

        assert_eq!(problem.statement(), "2+2");
        assert_eq!(problem.options().len(), 4);
        assert_eq!(problem.answer_kind(), AnswerKind::Choice);
        assert!(problem.is_correct("4"));
        assert!(!problem.is_correct("3"));
    }

    #[test]
    fn answer_must_be_among_options() {
        let err = ProblemDraft::new("2+2", ["3", "5"], "4")
            .validate(1, 10)
            .unwrap_err();

        assert_eq!(
            err,
            ProblemError::AnswerNotInOptions {
                answer: "4".into()
            }
        );
    }

    #[test]
    fn fields_are_trimmed_before_checks() {
        let problem = ProblemDraft::new("  2+2 ", [" 3", "4 "], " 4")
            .validate(2, 10)
            .unwrap();

        assert_eq!(problem.options(), ["3", "4"]);
        assert_eq!(problem.correct_answer(), "4");
        assert_eq!(problem.level(), 2);
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            ProblemDraft::open("   ", "4").validate(1, 3).unwrap_err(),
            ProblemError::EmptyStatement
        );
        assert_eq!(
            ProblemDraft::open("2+2", "").validate(1, 3).unwrap_err(),
            ProblemError::EmptyAnswer
        );
        assert_eq!(
            ProblemDraft::new("2+2", ["4", " "], "4")
                .validate(1, 3)
                .unwrap_err(),
            ProblemError::EmptyOption { index: 1 }
        );
    }

    #[test]
    fn duplicate_options_are_rejected() {
        let err = ProblemDraft::new("2+2", ["4", "4"], "4")
            .validate(1, 3)
            .unwrap_err();
        assert_eq!(err, ProblemError::DuplicateOption("4".into()));
    }

    #[test]
    fn level_must_be_in_range() {
        let err = ProblemDraft::open("2+2", "4").validate(0, 3).unwrap_err();
        assert!(matches!(err, ProblemError::LevelOutOfRange { level: 0, .. }));

        let err = ProblemDraft::open("2+2", "4").validate(4, 3).unwrap_err();
        assert!(matches!(err, ProblemError::LevelOutOfRange { level: 4, .. }));
    }

    #[test]
    fn answer_kind_detects_numbers_and_fractions() {
        let numeric = ProblemDraft::open("1/2 + 1/3", "5/6").validate(1, 3).unwrap();
        assert_eq!(numeric.answer_kind(), AnswerKind::Numeric);

        let decimal = ProblemDraft::open("half of 3", "1.5").validate(1, 3).unwrap();
        assert_eq!(decimal.answer_kind(), AnswerKind::Numeric);

        let text = ProblemDraft::open("What has keys but no locks?", "a piano")
            .validate(1, 3)
            .unwrap();
        assert_eq!(text.answer_kind(), AnswerKind::Text);
    }

    #[test]
    fn draft_parses_model_json() {
        let draft: ProblemDraft = serde_json::from_str(
            r#"{"statement":"2+2","options":["3","4"],"correctAnswer":"4"}"#,
        )
        .unwrap();
        assert_eq!(draft, ProblemDraft::new("2+2", ["3", "4"], "4"));

        let partial: ProblemDraft = serde_json::from_str(r#"{"statement":"x"}"#).unwrap();
        assert!(partial.options.is_empty());
        assert!(partial.correct_answer.is_empty());
    }
}
