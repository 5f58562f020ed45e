//! # Introduction
//!
//! forgec compiles Forge, a small dynamically flavoured scripting language,
//! into a single self-contained C compilation unit that is then handed to a
//! native C compiler.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Generator → C unit (+ runtime headers) → cc
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST.
//! 2. [`codegen`]: infers types, resolves calls and loaded modules, and
//!    lowers the AST to C text.
//! 3. [`runtime`]: the C headers every generated unit includes (lists,
//!    arrays, file I/O and the `attempt`/`rescue` checkpoint stack).
//!
//! ## Language overview
//!
//! Types: `int`, `float`, `bool`, `str`, `char`, `list`, `StringList`,
//! arrays, `pointer`, structs and `&` references.
//! Control flow: `if/elif/else`, `while`, `for`, `break`, `continue`,
//! `return`, `attempt { } rescue err { }` and `attempt expr rescue expr`.
//! Modules: `load "file.forge"`. Foreign functions: `extern("name", types...)`.
//!
//! ```
//! use forgec::codegen::GeneratorConfig;
//!
//! let c = forgec::translate("let x = 5\nprint(x)", GeneratorConfig::default()).unwrap();
//! assert!(c.contains("int x = 5;"));
//! ```

pub mod codegen;
pub mod parser;
pub mod runtime;

use codegen::{ForgeError, Generator, GeneratorConfig};

/// Parse `source` and generate its C unit.
pub fn translate(source: &str, config: GeneratorConfig) -> Result<String, ForgeError> {
    let program = parser::parse_source(source)?;
    Generator::new(config).generate(&program)
}
