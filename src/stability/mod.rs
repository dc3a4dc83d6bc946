mod client;
mod types;

pub use client::{ImageGenerator, StabilityClient};
pub use types::{GeneratedImage, GenerationRequest, PROMPT_REQUIRED};
