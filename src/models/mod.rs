// src/models/mod.rs

pub mod attempt;
pub mod ids;
pub mod quiz;
