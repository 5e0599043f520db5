// src/models/mod.rs

pub mod evaluation;
pub mod question;
pub mod report;
pub mod session;
