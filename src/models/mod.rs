//! Data models for the fitness service's entities.
//!
//! This module contains the data structures the client exchanges with the
//! data service:
//!
//! - `Exercise`, `ExerciseCategory`, `ExerciseGroup`: the program catalog
//! - `TrainingDayAssignment`, `WorkoutCompletion`: per-user schedule and log
//! - `Note`, `ImbalanceImage`: per-user journal data

pub mod exercise;
pub mod journal;
pub mod workout;

pub use exercise::{Exercise, ExerciseCategory, ExerciseGroup};
pub use journal::{ImbalanceImage, Note};
pub use workout::{TrainingDayAssignment, WorkoutCompletion};
