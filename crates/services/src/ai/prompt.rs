use study_core::catalog::{ProblemShape, profile};
use study_core::model::Category;

/// System and user messages for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SYSTEM: &str = "You write practice problems for a study assistant. \
Reply with a single JSON object and nothing else.";

/// Render the problem prompt for a category and level from the difficulty table.
#[must_use]
pub fn problem_prompt(category: Category, level: u32) -> Prompt {
    let profile = profile(category);
    let band = profile.band_for(level);

    let shape = match profile.shape {
        ProblemShape::MultipleChoice { options } => format!(
            "Give exactly {options} distinct answer options in \"options\"; \
             \"correctAnswer\" must be copied exactly from one of them."
        ),
        ProblemShape::FreeAnswer { numeric: true } => {
            "Leave \"options\" empty; \"correctAnswer\" is only the final number \
             (an integer, decimal or reduced fraction like 3/4), without units."
                .to_string()
        }
        ProblemShape::FreeAnswer { numeric: false } => {
            "Leave \"options\" empty; \"correctAnswer\" is a short phrase.".to_string()
        }
    };

    let user = format!(
        "Create one {topic} problem for {audience}.\n\
         Difficulty level {level}: {instruction}\n\
         {shape}\n\
         Respond as {{\"statement\": string, \"options\": [string], \"correctAnswer\": string}}.",
        topic = profile.topic,
        audience = profile.audience,
        instruction = band.instruction,
    );

    Prompt {
        system: SYSTEM.to_string(),
        user,
    }
}
