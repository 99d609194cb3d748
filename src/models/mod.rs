pub mod chutes;
pub mod openai;
