//! Request dispatch: the instruction set and the cascade engine.
//!
//! Resolving one request means composing an ordered sequence of
//! [`FetchInstruction`]s from the active manifest and executing them lazily,
//! in order, until one yields a response. Instructions that yield nothing
//! are skipped silently; an exhausted cascade resolves to no response and
//! the host falls back to its default behavior.

mod engine;
mod instruction;

pub use engine::{DispatchEngine, DispatchOptions};
pub use instruction::FetchInstruction;
