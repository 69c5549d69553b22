//! Built-in problems used whenever a provider fails or returns an invalid shape.
//!
//! Every category has exactly one fallback builder. Output depends only on
//! `(category, level)`, so a replayed session sees the same substitutes.

use crate::model::{Category, Problem, ProblemDraft};

/// Deterministic, always-valid problem for a category and level.
#[must_use]
pub fn fallback_problem(category: Category, level: u32) -> Problem {
    let level = level.max(1);
    let draft = match category {
        Category::DiceProbability => pick(&DICE, level),
        Category::LogicRiddle => pick(&LOGIC, level),
        Category::HindiRiddle => pick(&HINDI, level),
        Category::K12Quiz => pick(&K12, level),
        Category::Bodmas => bodmas(level),
        Category::WordProblem => word_problem(level),
    };
    Problem::from_trusted(draft, level)
}

struct Canned {
    statement: &'static str,
    options: [&'static str; 4],
    answer: &'static str,
}

fn pick(table: &[Canned], level: u32) -> ProblemDraft {
    let index = usize::try_from(level - 1).unwrap_or(0) % table.len();
    let canned = &table[index];
    ProblemDraft::new(canned.statement, canned.options, canned.answer)
}

static DICE: [Canned; 3] = [
    Canned {
        statement: "A fair six-sided die is rolled once. What is the probability of rolling a 6?",
        options: ["1/2", "1/3", "1/6", "1/12"],
        answer: "1/6",
    },
    Canned {
        statement: "Two fair dice are rolled. What is the probability that the sum is 7?",
        options: ["1/6", "1/12", "7/36", "1/9"],
        answer: "1/6",
    },
    Canned {
        statement: "Two fair dice are rolled. What is the probability of rolling a double?",
        options: ["1/36", "1/6", "1/3", "1/12"],
        answer: "1/6",
    },
];

static LOGIC: [Canned; 3] = [
    Canned {
        statement: "What has keys but can't open locks?",
        options: ["A piano", "A map", "A door", "A treasure chest"],
        answer: "A piano",
    },
    Canned {
        statement: "The more you take, the more you leave behind. What am I?",
        options: ["Footsteps", "Money", "Time", "Memories"],
        answer: "Footsteps",
    },
    Canned {
        statement: "What gets wetter the more it dries?",
        options: ["A towel", "A sponge", "Rain", "A river"],
        answer: "A towel",
    },
];

static HINDI: [Canned; 3] = [
    Canned {
        statement: "हरी थी मन भरी थी, लाख मोती जड़ी थी, राजा जी के बाग में दुशाला ओढ़े खड़ी थी। बताओ क्या?",
        options: ["भुट्टा", "आम", "केला", "गन्ना"],
        answer: "भुट्टा",
    },
    Canned {
        statement: "एक थाल मोतियों से भरा, सबके सिर पर औंधा धरा। बताओ क्या?",
        options: ["आसमान", "छाता", "पेड़", "बादल"],
        answer: "आसमान",
    },
    Canned {
        statement: "काला घोड़ा सफेद सवारी, एक उतरा तो दूसरे की बारी। बताओ क्या?",
        options: ["तवा और रोटी", "रात और दिन", "कोयला", "बादल"],
        answer: "तवा और रोटी",
    },
];

static K12: [Canned; 3] = [
    Canned {
        statement: "Which planet is known as the Red Planet?",
        options: ["Venus", "Mars", "Jupiter", "Saturn"],
        answer: "Mars",
    },
    Canned {
        statement: "What gas do plants absorb from the air for photosynthesis?",
        options: ["Oxygen", "Nitrogen", "Carbon dioxide", "Hydrogen"],
        answer: "Carbon dioxide",
    },
    Canned {
        statement: "What is the value of x if 3x + 2 = 11?",
        options: ["2", "3", "4", "5"],
        answer: "3",
    },
];

fn bodmas(level: u32) -> ProblemDraft {
    let a = u64::from(level) + 2;
    let b = u64::from(level % 5) + 2;
    let c = 3_u64;
    let answer = a + b * c;
    ProblemDraft::open(format!("Evaluate: {a} + {b} × {c}"), answer.to_string())
}

fn word_problem(level: u32) -> ProblemDraft {
    let boxes = u64::from(level) + 2;
    let per_box = 6_u64;
    let eaten = u64::from(level);
    let answer = boxes * per_box - eaten;
    ProblemDraft::open(
        format!(
            "Riya buys {boxes} boxes of pencils with {per_box} pencils in each box. \
             She gives away {eaten}. How many pencils does she have left?"
        ),
        answer.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerKind, ProblemDraft};

    #[test]
    fn fallbacks_pass_validation_for_every_level() {
        for category in Category::ALL {
            for level in 1..=12 {
                let problem = fallback_problem(category, level);
                assert_eq!(problem.level(), level);
                let draft = ProblemDraft::new(
                    problem.statement(),
                    problem.options().to_vec(),
                    problem.correct_answer(),
                );
                assert!(draft.validate(level, 12).is_ok(), "{category} level {level}");
            }
        }
    }

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(
            fallback_problem(Category::LogicRiddle, 4),
            fallback_problem(Category::LogicRiddle, 4)
        );
    }

    #[test]
    fn bodmas_fallback_is_numeric_and_correct() {
        let problem = fallback_problem(Category::Bodmas, 1);
        assert_eq!(problem.statement(), "Evaluate: 3 + 3 × 3");
        assert_eq!(problem.correct_answer(), "12");
        assert_eq!(problem.answer_kind(), AnswerKind::Numeric);
    }

    #[test]
    fn level_zero_is_treated_as_one() {
        assert_eq!(fallback_problem(Category::K12Quiz, 0).level(), 1);
    }
}
