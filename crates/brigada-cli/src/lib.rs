//! # Brigada CLI
//!
//! Library side of the `brigada-cli` binary: chief account creation and
//! fake-data seeding for development databases.

pub mod chief;
pub mod seeder;
