//! Resume analysis — the two remote model round trips and their data model.

pub mod analyzer;
pub mod models;
pub mod prompts;
pub mod refiner;
