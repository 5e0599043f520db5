// src/utils/mod.rs

pub mod jwt;
pub mod store;
pub mod submit;
