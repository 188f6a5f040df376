//! Research engines and the shared batch runner.
//!
//! - [`survey`]: one question per persona, sequential
//! - [`interview`]: persona/interviewer dialogue bounded by a turn count
//! - [`ab_test`]: evaluate plan A, evaluate plan B, pick a winner
//!
//! Each engine turns one [`PersonaProfile`](crate::persona::PersonaProfile)
//! into one serializable record; [`batch`] runs that over a whole persona
//! set with failures isolated per persona.

pub mod batch;
pub mod interview;
pub mod survey;

pub use batch::{run_batch, run_sequential, BatchOutcome, TaskFailure};
