//! Statement lowering
//!
//! This module lowers every Forge statement into C statements appended to the
//! current emission buffer:
//!
//! - Bindings: `let` declares a C local; a repeated `let` in the same scope
//!   and assignment to an existing name become plain assignments
//! - Control flow: `if`/`else if`/`else`, `while`, three-clause `for`
//! - Jumps: `return`, `break`, `continue`, which also unwind any protected
//!   regions they leave
//! - Protected regions: `attempt { } rescue name { }`
//! - Declarations appearing as statements: structs, externs, `load`
//!
//! # Helper statements
//!
//! Lowering a condition may itself emit statements (temporaries for string
//! concatenation, list literals, `attempt` expressions). Those must run every
//! time the condition is evaluated, so loops whose header needs helpers fall
//! back to `while (1)` with an explicit `break`, and an `else if` whose
//! condition needs helpers nests inside a plain `else` block.

use crate::codegen::emit::indent;
use crate::codegen::engine::{sanitize_name, Generator};
use crate::codegen::errors::{CodegenResult, TranslationError};
use crate::codegen::type_system::coerce;
use crate::codegen::types::Ty;
use crate::parser::ast::*;
use rustc_hash::FxHashSet;

impl Generator {
    /// Lower `stmts` in a new scope and return the produced lines.
    pub(crate) fn lower_block(&mut self, stmts: &[AstNode]) -> CodegenResult<Vec<String>> {
        self.scoped(|g| {
            let (lines, ()) = g.capture(|g| g.lower_statements(stmts))?;
            Ok(lines)
        })
    }

    pub(crate) fn lower_statements(&mut self, stmts: &[AstNode]) -> CodegenResult<()> {
        for stmt in stmts {
            self.lower_statement(stmt)?;
        }
        Ok(())
    }

    pub(crate) fn lower_statement(&mut self, stmt: &AstNode) -> CodegenResult<()> {
        match stmt {
            AstNode::Let {
                name,
                type_hint,
                value,
                location,
            } => self.lower_let(name, type_hint.as_ref(), value, *location),

            AstNode::Assignment {
                target,
                value,
                location,
            } => {
                self.lower_assignment(target, value, *location, true)?;
                Ok(())
            }

            AstNode::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                ..
            } => {
                let (lines, _) =
                    self.lower_if_chain(condition, then_branch, else_ifs, else_branch.as_deref())?;
                self.ctx.emitter.extend(lines);
                Ok(())
            }

            AstNode::While {
                condition, body, ..
            } => self.lower_while(condition, body),

            AstNode::For {
                init,
                condition,
                increment,
                body,
                ..
            } => self.lower_for(init, condition, increment, body),

            AstNode::Block { statements, .. } => {
                let lines = self.lower_block(statements)?;
                self.emit("{");
                self.ctx.emitter.extend_indented(lines);
                self.emit("}");
                Ok(())
            }

            AstNode::Return { expr, location } => self.lower_return(expr.as_deref(), *location),

            AstNode::Break { location } => self.lower_jump("break", *location),
            AstNode::Continue { location } => self.lower_jump("continue", *location),

            AstNode::Load { path, location } => self.lower_load(path, *location),

            AstNode::AttemptRescue {
                try_block,
                error_name,
                rescue_block,
                ..
            } => self.lower_attempt_rescue(try_block, error_name, rescue_block),

            AstNode::StructDef {
                name,
                fields,
                location,
            } => self.register_struct(name, fields, *location),

            AstNode::FunctionDef { name, location, .. } => {
                Err(TranslationError::unsupported_expression(
                    format!("function '{}' must be defined at the top level", name),
                    *location,
                )
                .into())
            }

            AstNode::ExpressionStatement { expr, .. } => {
                let value = self.lower_expr(expr)?;
                if !value.code.is_empty() {
                    self.emit(format!("{};", value.code));
                }
                Ok(())
            }

            // A bare expression used as a statement
            other => {
                let value = self.lower_expr(other)?;
                if !value.code.is_empty() {
                    self.emit(format!("{};", value.code));
                }
                Ok(())
            }
        }
    }

    fn lower_let(
        &mut self,
        name: &str,
        type_hint: Option<&TypeAnnotation>,
        value: &AstNode,
        location: SourceLocation,
    ) -> CodegenResult<()> {
        // Rebinding in the same scope reuses the existing C variable
        if self.ctx.scopes.is_declared_in_current(name) {
            let target = AstNode::Identifier(name.to_string(), location);
            self.lower_assignment(&target, value, location, true)?;
            return Ok(());
        }

        let value = self.lower_expr(value)?;
        if !value.ty.has_value() {
            return Err(TranslationError::ValuelessBinding {
                name: name.to_string(),
                location,
            }
            .into());
        }

        let declared = match type_hint.map(|hint| self.resolve_annotation(hint)) {
            None | Some(Ty::Unknown) => value.ty.clone().or_default(),
            // An array literal stays held by value even under `arr`
            Some(Ty::Array(_)) if matches!(value.ty, Ty::ArrayValue(_)) => value.ty.clone(),
            Some(ty) => ty,
        };

        let init = match (&value.ty, &declared) {
            (Ty::Str, Ty::Int | Ty::Bool) => format!("(int)strtol({}, NULL, 10)", value.code),
            (Ty::Str, Ty::Float) => format!("strtod({}, NULL)", value.code),
            (from, to) => coerce(&value.code, from, to),
        };

        let declarator = self.declarator(name, &declared);
        self.ctx.scopes.declare(name, declared);
        self.emit(format!("{} = {};", declarator, init));
        Ok(())
    }

    /// Lower an `if` chain. The flag reports whether the returned lines
    /// start with helper statements rather than the `if` itself.
    fn lower_if_chain(
        &mut self,
        condition: &AstNode,
        then_branch: &[AstNode],
        else_ifs: &[ElseIf],
        else_branch: Option<&[AstNode]>,
    ) -> CodegenResult<(Vec<String>, bool)> {
        let (mut lines, cond) = self.capture(|g| g.lower_expr(condition))?;
        let has_helpers = !lines.is_empty();
        let then_lines = self.lower_block(then_branch)?;

        lines.push(format!("if ({}) {{", cond.code));
        lines.extend(indent(then_lines));

        match else_ifs.split_first() {
            Some((arm, rest)) => {
                let (nested, nested_helpers) =
                    self.lower_if_chain(&arm.condition, &arm.body, rest, else_branch)?;
                if nested_helpers {
                    lines.push("} else {".to_string());
                    lines.extend(indent(nested));
                    lines.push("}".to_string());
                } else {
                    let mut nested = nested.into_iter();
                    if let Some(head) = nested.next() {
                        lines.push(format!("}} else {}", head));
                    }
                    lines.extend(nested);
                }
            }
            None => {
                if let Some(stmts) = else_branch {
                    let else_lines = self.lower_block(stmts)?;
                    lines.push("} else {".to_string());
                    lines.extend(indent(else_lines));
                }
                lines.push("}".to_string());
            }
        }

        Ok((lines, has_helpers))
    }

    /// Lower a loop body with the loop registered for `break`/`continue`.
    fn lower_loop_body(&mut self, body: &[AstNode]) -> CodegenResult<Vec<String>> {
        let mark = self.ctx.frame.checkpoint_depth;
        self.ctx.frame.loop_marks.push(mark);
        let result = self.lower_block(body);
        self.ctx.frame.loop_marks.pop();
        result
    }

    fn lower_while(&mut self, condition: &AstNode, body: &[AstNode]) -> CodegenResult<()> {
        let (helpers, cond) = self.capture(|g| g.lower_expr(condition))?;
        let body = self.lower_loop_body(body)?;

        if helpers.is_empty() {
            self.emit(format!("while ({}) {{", cond.code));
        } else {
            self.emit("while (1) {");
            self.ctx.emitter.extend_indented(helpers);
            self.emit(format!("    if (!({})) break;", cond.code));
        }
        self.ctx.emitter.extend_indented(body);
        self.emit("}");
        Ok(())
    }

    fn lower_for(
        &mut self,
        init: &AstNode,
        condition: &AstNode,
        increment: &AstNode,
        body: &[AstNode],
    ) -> CodegenResult<()> {
        let lines = self.scoped(|g| {
            let (mut lines, ()) = g.capture(|g| g.lower_statement(init))?;
            let (cond_helpers, cond) = g.capture(|g| g.lower_expr(condition))?;
            let (step_helpers, step) = g.capture(|g| g.lower_expr(increment))?;
            let body = g.lower_loop_body(body)?;

            if cond_helpers.is_empty() && step_helpers.is_empty() {
                lines.push(format!("for (; {}; {}) {{", cond.code, step.code));
                lines.extend(indent(body));
                lines.push("}".to_string());
                return Ok(lines);
            }

            // The step runs at the top of every iteration but the first so
            // that `continue` still advances the loop
            let first = g.temp("first");
            lines.push(format!("int {} = 1;", first));
            lines.push("while (1) {".to_string());
            lines.push(format!("    if (!{}) {{", first));
            lines.extend(indent(indent(step_helpers)));
            if !step.code.is_empty() {
                lines.push(format!("        {};", step.code));
            }
            lines.push("    }".to_string());
            lines.push(format!("    {} = 0;", first));
            lines.extend(indent(cond_helpers));
            lines.push(format!("    if (!({})) break;", cond.code));
            lines.extend(indent(body));
            lines.push("}".to_string());
            Ok(lines)
        })?;

        self.emit("{");
        self.ctx.emitter.extend_indented(lines);
        self.emit("}");
        Ok(())
    }

    /// Emit one `forge_checkpoint_leave` per protected region being exited.
    fn emit_checkpoint_leaves(&mut self, count: usize) {
        for _ in 0..count {
            self.emit("forge_checkpoint_leave();");
        }
    }

    pub(crate) fn lower_return(
        &mut self,
        expr: Option<&AstNode>,
        _location: SourceLocation,
    ) -> CodegenResult<()> {
        let depth = self.ctx.frame.checkpoint_depth;
        let return_type = self.ctx.frame.return_type.clone();

        let Some(expr) = expr else {
            self.ctx.frame.observed_returns.push(Ty::Void);
            self.emit_checkpoint_leaves(depth);
            if self.ctx.frame.is_entry || return_type.is_numeric() {
                self.emit("return 0;");
            } else {
                self.emit("return;");
            }
            return Ok(());
        };

        let value = self.lower_expr(expr)?;
        self.ctx.frame.observed_returns.push(value.ty.clone());

        if !return_type.has_value() {
            if !value.code.is_empty() {
                self.emit(format!("{};", value.code));
            }
            self.emit_checkpoint_leaves(depth);
            self.emit("return;");
            return Ok(());
        }

        let code = coerce(&value.code, &value.ty, &return_type);
        if depth == 0 {
            self.emit(format!("return {};", code));
        } else {
            // Evaluate inside the protected region, then unwind
            let result = self.temp("ret");
            self.emit(format!("{} {} = {};", return_type.c_type(), result, code));
            self.emit_checkpoint_leaves(depth);
            self.emit(format!("return {};", result));
        }
        Ok(())
    }

    fn lower_jump(&mut self, keyword: &str, location: SourceLocation) -> CodegenResult<()> {
        let Some(&mark) = self.ctx.frame.loop_marks.last() else {
            return Err(TranslationError::unsupported_expression(
                format!("'{}' outside of a loop", keyword),
                location,
            )
            .into());
        };
        let depth = self.ctx.frame.checkpoint_depth;
        self.emit_checkpoint_leaves(depth.saturating_sub(mark));
        self.emit(format!("{};", keyword));
        Ok(())
    }

    /// `attempt { try } rescue name { rescue }`
    ///
    /// ```c
    /// {
    ///     ForgeCheckpoint __cp0;
    ///     forge_checkpoint_enter(&__cp0);
    ///     if (!setjmp(__cp0.env)) {
    ///         /* try */
    ///         forge_checkpoint_leave();
    ///     } else {
    ///         char* name = (char*)forge_error_context.error;
    ///         /* rescue */
    ///     }
    /// }
    /// ```
    fn lower_attempt_rescue(
        &mut self,
        try_block: &[AstNode],
        error_name: &str,
        rescue_block: &[AstNode],
    ) -> CodegenResult<()> {
        let checkpoint = self.temp("cp");

        self.ctx.frame.checkpoint_depth += 1;
        let try_lines = self.lower_block(try_block);
        self.ctx.frame.checkpoint_depth -= 1;
        let try_lines = try_lines?;

        let rescue_lines = self.scoped(|g| {
            g.ctx.scopes.declare(error_name, Ty::Str);
            g.lower_block(rescue_block)
        })?;

        self.emit("{");
        self.emit(format!("    ForgeCheckpoint {};", checkpoint));
        self.emit(format!("    forge_checkpoint_enter(&{});", checkpoint));
        self.emit(format!("    if (!setjmp({}.env)) {{", checkpoint));
        self.ctx.emitter.extend_indented(indent(try_lines));
        self.emit("        forge_checkpoint_leave();");
        self.emit("    } else {");
        self.emit(format!(
            "        char* {} = (char*)forge_error_context.error;",
            sanitize_name(error_name)
        ));
        self.ctx.emitter.extend_indented(indent(rescue_lines));
        self.emit("    }");
        self.emit("}");
        Ok(())
    }
}

/// Names assigned or incremented inside any protected region of `stmts`.
pub(crate) fn protected_writes<'a>(stmts: impl IntoIterator<Item = &'a AstNode>) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    for stmt in stmts {
        stmt.walk(&mut |node| match node {
            AstNode::AttemptRescue { try_block, .. } => {
                for inner in try_block {
                    collect_writes(inner, &mut names);
                }
            }
            AstNode::AttemptExpr { try_expr, .. } => collect_writes(try_expr, &mut names),
            _ => {}
        });
    }
    names
}

fn collect_writes(node: &AstNode, names: &mut FxHashSet<String>) {
    node.walk(&mut |node| {
        let written = match node {
            AstNode::Assignment { target, .. } => target.as_identifier(),
            AstNode::Postfix { operand, .. } => operand.as_identifier(),
            _ => None,
        };
        if let Some(name) = written {
            names.insert(name.to_string());
        }
    });
}
