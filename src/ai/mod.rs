// src/ai/mod.rs

pub mod client;
pub mod generator;
pub mod grader;
pub mod parser;
pub mod prompts;
pub mod retry;
