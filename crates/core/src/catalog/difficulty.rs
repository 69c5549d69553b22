use std::ops::RangeInclusive;

use crate::model::Category;

//
// ─── TYPES ────────────────────────────────────────────────────────────────────
//

/// Instruction handed to the generator for a contiguous range of levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyBand {
    pub levels: RangeInclusive<u32>,
    pub instruction: &'static str,
}

/// Shape of the content the generator must return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemShape {
    /// A statement with `options` choices, one of which is correct.
    MultipleChoice { options: usize },
    /// A statement with a single typed answer.
    FreeAnswer { numeric: bool },
}

/// Declarative prompt data for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProfile {
    pub category: Category,
    pub topic: &'static str,
    pub audience: &'static str,
    pub shape: ProblemShape,
    pub bands: &'static [DifficultyBand],
}

impl CategoryProfile {
    /// Band covering `level`; levels past the table use the last band.
    #[must_use]
    pub fn band_for(&self, level: u32) -> &DifficultyBand {
        self.bands
            .iter()
            .find(|band| band.levels.contains(&level))
            .or_else(|| self.bands.last())
            .unwrap_or(&EMPTY_BAND)
    }
}

static EMPTY_BAND: DifficultyBand = DifficultyBand {
    levels: 1..=u32::MAX,
    instruction: "Keep it simple.",
};

//
// ─── TABLE ────────────────────────────────────────────────────────────────────
//

static DICE_BANDS: [DifficultyBand; 3] = [
    DifficultyBand {
        levels: 1..=3,
        instruction: "Use a single fair six-sided die and one event such as rolling a given number.",
    },
    DifficultyBand {
        levels: 4..=6,
        instruction: "Use two dice and ask about sums, doubles or 'at least' events.",
    },
    DifficultyBand {
        levels: 7..=10,
        instruction: "Use several rolls or dice with conditional or complementary events; answers are reduced fractions.",
    },
];

static LOGIC_BANDS: [DifficultyBand; 3] = [
    DifficultyBand {
        levels: 1..=3,
        instruction: "A short, classic riddle with a concrete everyday answer.",
    },
    DifficultyBand {
        levels: 4..=7,
        instruction: "A riddle that needs one step of lateral thinking or wordplay.",
    },
    DifficultyBand {
        levels: 8..=10,
        instruction: "A multi-clue logic puzzle whose answer follows from eliminating alternatives.",
    },
];

static HINDI_BANDS: [DifficultyBand; 2] = [
    DifficultyBand {
        levels: 1..=5,
        instruction: "A simple traditional paheli in Devanagari about common objects, animals or food.",
    },
    DifficultyBand {
        levels: 6..=10,
        instruction: "A poetic paheli in Devanagari using metaphor; the answer is a single Hindi word.",
    },
];

static K12_BANDS: [DifficultyBand; 4] = [
    DifficultyBand {
        levels: 1..=3,
        instruction: "Primary school (grades 1-3) general knowledge or arithmetic.",
    },
    DifficultyBand {
        levels: 4..=6,
        instruction: "Upper primary (grades 4-6) science, geography or mathematics.",
    },
    DifficultyBand {
        levels: 7..=9,
        instruction: "Middle school (grades 7-9) science, history or algebra.",
    },
    DifficultyBand {
        levels: 10..=12,
        instruction: "High school (grades 10-12) physics, chemistry, biology or calculus.",
    },
];

static BODMAS_BANDS: [DifficultyBand; 3] = [
    DifficultyBand {
        levels: 1..=3,
        instruction: "Three small whole numbers with + and x only; the answer is a whole number.",
    },
    DifficultyBand {
        levels: 4..=6,
        instruction: "Four or five numbers with brackets, +, -, x and exact division.",
    },
    DifficultyBand {
        levels: 7..=10,
        instruction: "Nested brackets, powers (orders) and all four operators; the answer is a whole number.",
    },
];

static WORD_BANDS: [DifficultyBand; 3] = [
    DifficultyBand {
        levels: 1..=3,
        instruction: "One-step addition or subtraction story with numbers below 50.",
    },
    DifficultyBand {
        levels: 4..=6,
        instruction: "Two-step story using multiplication or division with numbers below 500.",
    },
    DifficultyBand {
        levels: 7..=10,
        instruction: "Multi-step story involving rates, percentages or unit conversion; the answer is a number.",
    },
];

static PROFILES: [CategoryProfile; 6] = [
    CategoryProfile {
        category: Category::DiceProbability,
        topic: "probability of dice outcomes",
        audience: "students learning basic probability",
        shape: ProblemShape::MultipleChoice { options: 4 },
        bands: &DICE_BANDS,
    },
    CategoryProfile {
        category: Category::LogicRiddle,
        topic: "logic riddles",
        audience: "curious students of any age",
        shape: ProblemShape::MultipleChoice { options: 4 },
        bands: &LOGIC_BANDS,
    },
    CategoryProfile {
        category: Category::HindiRiddle,
        topic: "Hindi riddles (paheliyan)",
        audience: "Hindi-speaking students",
        shape: ProblemShape::MultipleChoice { options: 4 },
        bands: &HINDI_BANDS,
    },
    CategoryProfile {
        category: Category::K12Quiz,
        topic: "school curriculum quiz",
        audience: "K-12 students; the level is the grade",
        shape: ProblemShape::MultipleChoice { options: 4 },
        bands: &K12_BANDS,
    },
    CategoryProfile {
        category: Category::Bodmas,
        topic: "order of operations (BODMAS) arithmetic",
        audience: "students practising mental arithmetic",
        shape: ProblemShape::FreeAnswer { numeric: true },
        bands: &BODMAS_BANDS,
    },
    CategoryProfile {
        category: Category::WordProblem,
        topic: "arithmetic word problems",
        audience: "primary and middle school students",
        shape: ProblemShape::FreeAnswer { numeric: true },
        bands: &WORD_BANDS,
    },
];

/// Prompt data for a category.
#[must_use]
pub fn profile(category: Category) -> &'static CategoryProfile {
    PROFILES
        .iter()
        .find(|profile| profile.category == category)
        .unwrap_or(&PROFILES[0])
}

/// Difficulty band for a category and level.
#[must_use]
pub fn difficulty_for(category: Category, level: u32) -> &'static DifficultyBand {
    profile(category).band_for(level)
}
