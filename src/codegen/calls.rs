//! Call resolution and lowering
//!
//! A call through a plain name is resolved in this order:
//!
//! 1. builtins
//! 2. structs (positional instantiation)
//! 3. externs declared with `extern(...)`
//! 4. inside a module, the module's own qualified name `stem_name`
//! 5. an exact registered function name (including module aliases)
//! 6. the first registered function whose name ends in `_name`
//!
//! Anything else is an unresolved call. `obj.name(...)` is a container method
//! when `obj` is a variable, and a module-qualified call `obj_name(...)`
//! otherwise.

use crate::codegen::constants::SOCKADDR_EXTERNS;
use crate::codegen::engine::{CExpr, ExternSig, FunctionSig, Generator};
use crate::codegen::errors::{CodegenResult, TranslationError};
use crate::codegen::type_system::coerce;
use crate::codegen::types::Ty;
use crate::parser::ast::*;

/// How a container method reaches its receiver
enum Container {
    List(String),
    StrList(String),
    Array(String, Ty),
}

impl Generator {
    pub(crate) fn lower_call(
        &mut self,
        callee: &AstNode,
        args: &[AstNode],
        expected_type: Option<&TypeAnnotation>,
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        match callee {
            AstNode::Identifier(name, _) => {
                self.lower_named_call(name, args, expected_type, location)
            }

            AstNode::PropertyAccess {
                object, property, ..
            } => match object.as_identifier() {
                Some(receiver) if self.ctx.scopes.is_declared(receiver) => {
                    let receiver = self.lower_expr(object)?;
                    self.lower_method_call(receiver, property, args, location)
                }
                Some(module) => self.lower_qualified_call(module, property, args, location),
                None => {
                    let receiver = self.lower_expr(object)?;
                    self.lower_method_call(receiver, property, args, location)
                }
            },

            AstNode::MemberAccess { object, member, .. } => {
                let receiver = self.lower_expr(object)?;
                self.lower_method_call(receiver, member, args, location)
            }

            _ => Err(TranslationError::unsupported_call(
                "only named functions, module members and container methods can be called",
                location,
            )
            .into()),
        }
    }

    fn lower_named_call(
        &mut self,
        name: &str,
        args: &[AstNode],
        expected_type: Option<&TypeAnnotation>,
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        if Self::is_builtin(name) {
            return self.lower_builtin(name, args, expected_type, location);
        }
        if self.ctx.structs.contains_key(name) {
            return self.lower_struct_instance(name, args, location);
        }
        if let Some(sig) = self.ctx.externs.get(name).cloned() {
            return self.lower_extern_call(name, &sig, args, location);
        }
        let sig = self.resolve_function(name, location)?;
        self.lower_user_call(name, &sig, args, location)
    }

    /// `module.name(...)`: a module function, or a struct from that module.
    fn lower_qualified_call(
        &mut self,
        module: &str,
        name: &str,
        args: &[AstNode],
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        let qualified = format!("{}_{}", module, name);
        if let Some(sig) = self.ctx.functions.get(&qualified).cloned() {
            return self.lower_user_call(&qualified, &sig, args, location);
        }
        if self.ctx.structs.contains_key(name) {
            return self.lower_struct_instance(name, args, location);
        }
        Err(TranslationError::UnresolvedCall {
            name: format!("{}.{}", module, name),
            location,
        }
        .into())
    }

    pub(crate) fn resolve_function(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> CodegenResult<FunctionSig> {
        if let Some(stem) = &self.ctx.module_stem {
            if let Some(sig) = self.ctx.functions.get(&format!("{}_{}", stem, name)) {
                return Ok(sig.clone());
            }
        }

        if let Some(sig) = self.ctx.functions.get(name) {
            return Ok(sig.clone());
        }

        let suffix = format!("_{}", name);
        if let Some(key) = self
            .ctx
            .function_order
            .iter()
            .find(|key| key.ends_with(&suffix))
        {
            log::info!("resolved call '{}' to '{}' by suffix match", name, key);
            if let Some(sig) = self.ctx.functions.get(key) {
                return Ok(sig.clone());
            }
        }

        Err(TranslationError::UnresolvedCall {
            name: name.to_string(),
            location,
        }
        .into())
    }

    fn lower_args(&mut self, args: &[AstNode]) -> CodegenResult<Vec<CExpr>> {
        args.iter().map(|arg| self.lower_expr(arg)).collect()
    }

    pub(crate) fn lower_user_call(
        &mut self,
        name: &str,
        sig: &FunctionSig,
        args: &[AstNode],
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        if args.len() != sig.params.len() {
            return Err(TranslationError::unsupported_call(
                format!(
                    "'{}' takes {} arguments but {} were given",
                    name,
                    sig.params.len(),
                    args.len()
                ),
                location,
            )
            .into());
        }

        let mut codes = Vec::with_capacity(args.len());
        for (value, (_, param_ty)) in self.lower_args(args)?.into_iter().zip(&sig.params) {
            let code = match (&value.ty, param_ty) {
                // Array literals are held by value; array parameters take a pointer
                (Ty::ArrayValue(_), Ty::Array(_)) => format!("&{}", self.spill(value).code),
                (from, to) => coerce(&value.code, from, to),
            };
            codes.push(code);
        }

        Ok(CExpr::new(
            format!("{}({})", sig.c_name, codes.join(", ")),
            sig.ret.clone(),
        ))
    }

    fn lower_extern_call(
        &mut self,
        name: &str,
        sig: &ExternSig,
        args: &[AstNode],
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        if !sig.params.is_empty() && args.len() != sig.params.len() {
            return Err(TranslationError::unsupported_call(
                format!(
                    "extern '{}' takes {} arguments but {} were given",
                    name,
                    sig.params.len(),
                    args.len()
                ),
                location,
            )
            .into());
        }

        let casts_address = SOCKADDR_EXTERNS.contains(&name);
        let codes: Vec<String> = self
            .lower_args(args)?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                if casts_address && i == 1 {
                    format!("(struct sockaddr*){}", value.code)
                } else {
                    value.code
                }
            })
            .collect();

        Ok(CExpr::new(
            format!("{}({})", name, codes.join(", ")),
            sig.ret.clone(),
        ))
    }

    /// Record an `extern(...)` declaration. A declaration with an explicit
    /// return type is never replaced by a later one without.
    pub(crate) fn register_extern(
        &mut self,
        name: &str,
        param_types: &[TypeAnnotation],
        return_type: Option<&TypeAnnotation>,
    ) {
        if self
            .ctx
            .externs
            .get(name)
            .is_some_and(|existing| existing.explicit && return_type.is_none())
        {
            return;
        }

        let sig = ExternSig {
            params: param_types
                .iter()
                .map(|ty| self.resolve_annotation(ty))
                .collect(),
            ret: return_type
                .map(|ty| self.resolve_annotation(ty))
                .unwrap_or(Ty::Int),
            explicit: return_type.is_some(),
        };
        log::debug!("extern {} -> {}", name, sig.ret);
        self.ctx.externs.insert(name.to_string(), sig);
    }

    /// Register every extern declared anywhere in `stmts`, so calls resolve
    /// even before the declaration is reached.
    pub(crate) fn register_externs(&mut self, stmts: &[AstNode]) {
        let mut found = Vec::new();
        for stmt in stmts {
            stmt.walk(&mut |node| {
                if let AstNode::Extern {
                    name,
                    param_types,
                    return_type,
                    ..
                } = node
                {
                    found.push((name, param_types, return_type.as_ref()));
                }
            });
        }
        for (name, param_types, return_type) in found {
            self.register_extern(name, param_types, return_type);
        }
    }

    fn container(&mut self, receiver: CExpr) -> Option<Container> {
        match receiver.ty.clone() {
            Ty::List => Some(Container::List(format!("&{}", self.spill(receiver).code))),
            Ty::StrList => Some(Container::StrList(format!("&{}", self.spill(receiver).code))),
            Ty::Array(elem) => Some(Container::Array(receiver.code, *elem)),
            Ty::ArrayValue(elem) => Some(Container::Array(
                format!("&{}", self.spill(receiver).code),
                *elem,
            )),
            Ty::Ref(inner) => match *inner {
                Ty::List => Some(Container::List(receiver.code)),
                Ty::StrList => Some(Container::StrList(receiver.code)),
                _ => None,
            },
            _ => None,
        }
    }

    /// `.add(x)`, `.remove(x)`, `.index(x)` and `.free()` on containers.
    fn lower_method_call(
        &mut self,
        receiver: CExpr,
        method: &str,
        args: &[AstNode],
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        let receiver_ty = receiver.ty.clone();
        let Some(container) = self.container(receiver) else {
            return Err(TranslationError::unsupported_call(
                format!("a value of type {} has no method '{}'", receiver_ty, method),
                location,
            )
            .into());
        };

        let expected = if method == "free" { 0 } else { 1 };
        if !matches!(method, "add" | "remove" | "index" | "free") || args.len() != expected {
            return Err(TranslationError::unsupported_call(
                format!(
                    "unknown container method '{}' with {} arguments",
                    method,
                    args.len()
                ),
                location,
            )
            .into());
        }

        let arg = match args.first() {
            Some(arg) => Some(self.lower_expr(arg)?),
            None => None,
        };
        let arg_code = |elem: &Ty| {
            arg.as_ref()
                .map(|a| coerce(&a.code, &a.ty, elem))
                .unwrap_or_default()
        };

        let (code, ty) = match &container {
            Container::List(ptr) => {
                let value = format!("(double)({})", arg_code(&Ty::Float));
                match method {
                    "free" => (format!("list_free({})", ptr), Ty::Void),
                    "index" => (format!("list_index({}, {})", ptr, value), Ty::Int),
                    _ => (format!("list_{}({}, {})", method, ptr, value), Ty::Void),
                }
            }
            Container::StrList(ptr) => match method {
                "free" => (format!("string_list_free({})", ptr), Ty::Void),
                "index" => (
                    format!("string_list_index({}, {})", ptr, arg_code(&Ty::Str)),
                    Ty::Int,
                ),
                _ => (
                    format!("string_list_{}({}, {})", method, ptr, arg_code(&Ty::Str)),
                    Ty::Void,
                ),
            },
            Container::Array(ptr, elem) => {
                let value = format!("&({}){{{}}}", elem.c_type(), arg_code(elem));
                match method {
                    "free" => (format!("array_free({})", ptr), Ty::Void),
                    "add" => (format!("array_push({}, {})", ptr, value), Ty::Void),
                    "index" => (format!("array_index({}, {})", ptr, value), Ty::Int),
                    _ => (format!("array_remove({}, {})", ptr, value), Ty::Void),
                }
            }
        };
        Ok(CExpr::new(code, ty))
    }
}
