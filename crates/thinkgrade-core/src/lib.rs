//! thinkgrade-core: data model, prompt building and reply validation.
//!
//! This crate defines the types and pure logic shared by the evaluation
//! gateway and the learner-side session: the exercise catalog, the prompt
//! builder, the LLM reply validator, the evaluation engine and the
//! draft/evaluating/scored state machine.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod prompt;
pub mod session;
pub mod store;
pub mod traits;
