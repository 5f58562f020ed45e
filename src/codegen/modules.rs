//! Module loading for `load "file.forge"`
//!
//! A module is located on the search path, parsed, and its declarations
//! (externs, structs, functions) are processed as soon as the load is
//! discovered, before the loading unit's own functions are registered. Its
//! remaining top-level statements are lowered where the `load` statement
//! appears. Each module is loaded at most once per run.

use crate::codegen::constants::SOURCE_EXTENSION;
use crate::codegen::engine::{Generator, PendingModule};
use crate::codegen::errors::{CodegenResult, ForgeError, ModuleResolutionError};
use crate::codegen::statements::protected_writes;
use crate::parser::ast::*;
use crate::parser::parse_source;
use std::fs;
use std::path::{Path, PathBuf};

impl Generator {
    /// Load every module referenced anywhere in `stmts`.
    pub(crate) fn preload_modules(&mut self, stmts: &[AstNode]) -> CodegenResult<()> {
        let mut loads = Vec::new();
        for stmt in stmts {
            stmt.walk(&mut |node| {
                if let AstNode::Load { path, .. } = node {
                    loads.push(path.as_str());
                }
            });
        }
        for path in loads {
            self.load_module(path)?;
        }
        Ok(())
    }

    fn locate_module(&self, path: &str) -> Result<PathBuf, ModuleResolutionError> {
        if Path::new(path).extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION) {
            return Err(ModuleResolutionError::InvalidExtension {
                path: path.to_string(),
            });
        }

        let searched = self.config.search_dirs();
        searched
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ModuleResolutionError::NotFound {
                path: path.to_string(),
                searched: searched.clone(),
            })
    }

    pub(crate) fn load_module(&mut self, path: &str) -> CodegenResult<()> {
        if self.ctx.loaded_modules.contains(path) {
            return Ok(());
        }
        let file = self.locate_module(path)?;
        // Marked before processing so cyclic loads terminate
        self.ctx.loaded_modules.insert(path.to_string());

        let source = fs::read_to_string(&file).map_err(|source| {
            ModuleResolutionError::Unreadable {
                path: file.clone(),
                source,
            }
        })?;
        let program = parse_source(&source).map_err(|source| ForgeError::Syntax {
            module: Some(path.to_string()),
            source,
        })?;

        let stem = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(path)
            .to_string();
        log::debug!("loading module {} from {}", stem, file.display());

        self.ctx.next_unit += 1;
        let unit = self.ctx.next_unit;
        let saved_unit = std::mem::replace(&mut self.ctx.unit, unit);
        let saved_stem = self.ctx.module_stem.replace(stem.clone());

        let result = self.process_declarations(&program.statements);

        self.ctx.unit = saved_unit;
        self.ctx.module_stem = saved_stem;
        result?;

        let statements = program
            .statements
            .into_iter()
            .filter(|stmt| {
                !matches!(
                    stmt,
                    AstNode::FunctionDef { .. } | AstNode::StructDef { .. }
                )
            })
            .collect();
        self.ctx.pending_modules.insert(
            path.to_string(),
            PendingModule {
                unit,
                stem,
                statements,
            },
        );
        Ok(())
    }

    /// Emit the top-level statements of a module at the `load` site. They
    /// run once, at the first `load` reached; later loads emit nothing.
    pub(crate) fn lower_load(&mut self, path: &str, _location: SourceLocation) -> CodegenResult<()> {
        self.load_module(path)?;

        let pending = if self.ctx.dry_run {
            self.ctx.pending_modules.get(path).cloned()
        } else {
            self.ctx.pending_modules.remove(path)
        };
        let Some(module) = pending else {
            return Ok(());
        };

        let saved_unit = std::mem::replace(&mut self.ctx.unit, module.unit);
        let saved_stem = self.ctx.module_stem.replace(module.stem);
        let written = protected_writes(&module.statements);
        self.ctx.volatile_names.extend(written);

        let result = self.lower_statements(&module.statements);

        self.ctx.unit = saved_unit;
        self.ctx.module_stem = saved_stem;
        result
    }
}
