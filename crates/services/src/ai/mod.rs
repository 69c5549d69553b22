pub mod client;
pub mod prompt;

pub use client::StructuredClient;
pub use prompt::{Prompt, problem_prompt};
