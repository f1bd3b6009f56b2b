//! Dialogue automaton.
//!
//! A dialogue is one command/response exchange that may span several
//! sub-prompts (`[confirm]`, `Destination filename [...]?`, progress
//! markers) before control returns to the caller. Every device operation in
//! this crate is a [`Dialogue`] built from [`Rule`]s; the loop that runs them
//! lives in one place and knows nothing about any particular device.

mod automaton;
mod outcome;
mod rule;

pub use automaton::Dialogue;
pub use outcome::{DialogueResult, DialogueStatus};
pub use rule::{Action, Reply, Rule};
