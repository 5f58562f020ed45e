//! Forge to C code generation
//!
//! This module lowers a parsed [`Program`](crate::parser::Program) into one
//! self-contained C compilation unit:
//! - [`engine`]: The [`Generator`] and its per-run state
//! - [`types`]: The inferred type lattice and its C spellings
//! - [`errors`]: Translation, module resolution and wrapped syntax errors
//! - [`config`]: Module search path configuration
//!
//! Lowering itself is split by construct across private submodules
//! (statements, expressions, calls, builtins, functions, modules), each
//! adding methods to [`Generator`].
//!
//! # Type Inference
//!
//! Types are inferred heuristically and forward only: a variable takes the
//! type of its first assignment unless annotated, and a function's return
//! type is that of its last `return`. Where nothing is known, `int` is
//! assumed.
//!
//! # Error Recovery
//!
//! `attempt`/`rescue` is lowered to `setjmp`/`longjmp` around a chain of
//! checkpoints maintained by the C runtime (see [`crate::runtime`]).

pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod types;

mod builtins;
mod calls;
mod emit;
mod expressions;
mod functions;
mod modules;
mod scope;
mod statements;
mod type_system;

pub use config::GeneratorConfig;
pub use engine::{CExpr, Generator};
pub use errors::{ErrorCategory, ForgeError, ModuleResolutionError, TranslationError};
pub use types::Ty;
