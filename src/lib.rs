//! persona-sim: synthetic persona research driven by an LLM.
//!
//! Personas loaded from a JSON dataset answer survey questions, sit through
//! multi-turn depth interviews, and judge pairs of ad copy. Every engine talks
//! to the model through a single [`providers::Gateway`].
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod logging;
pub mod output;
pub mod persona;
pub mod prompts;
pub mod providers;
