//! Function and struct registration, and function body emission
//!
//! Signatures are collected for every function of a unit before any body is
//! lowered. Return types come from the annotation when there is one;
//! otherwise a provisional `int` signature is registered first (so recursive
//! and mutually recursive calls resolve) and then replaced by the type of the
//! last `return` in the body, found by lowering the body in a dry run.
//!
//! Inside a module, function names are qualified with the module's file
//! stem (`math.forge`: `sum` becomes `math_sum`) and the bare name is
//! registered as an alias that real functions take precedence over.

use crate::codegen::emit::indent;
use crate::codegen::engine::{sanitize_name, FunctionSig, Generator, StructLayout};
use crate::codegen::errors::{CodegenResult, TranslationError};
use crate::codegen::statements::protected_writes;
use crate::codegen::types::Ty;
use crate::parser::ast::*;
use rustc_hash::FxHashSet;

impl Generator {
    /// Forge-visible name a function is registered under in the current unit.
    fn qualified_name(&self, name: &str) -> String {
        match &self.ctx.module_stem {
            Some(stem) if !name.starts_with(&format!("{}_", stem)) => format!("{}_{}", stem, name),
            _ => name.to_string(),
        }
    }

    pub(crate) fn register_structs(&mut self, stmts: &[AstNode]) -> CodegenResult<()> {
        // Names first, so fields may refer to structs declared later
        for stmt in stmts {
            if let AstNode::StructDef { name, .. } = stmt {
                self.ctx.known_struct_names.insert(name.clone());
            }
        }
        for stmt in stmts {
            if let AstNode::StructDef {
                name,
                fields,
                location,
            } = stmt
            {
                self.register_struct(name, fields, *location)?;
            }
        }
        Ok(())
    }

    /// Record a struct layout and its C typedef. Registering an identical
    /// layout again is a no-op.
    pub(crate) fn register_struct(
        &mut self,
        name: &str,
        fields: &[Field],
        location: SourceLocation,
    ) -> CodegenResult<()> {
        self.ctx.known_struct_names.insert(name.to_string());
        let layout = StructLayout {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|f| (f.name.clone(), self.resolve_annotation(&f.field_type)))
                .collect(),
        };

        if let Some(existing) = self.ctx.structs.get(name) {
            if *existing == layout {
                return Ok(());
            }
            return Err(TranslationError::DuplicateStruct {
                name: name.to_string(),
                location,
            }
            .into());
        }

        log::debug!("struct {} with {} fields", name, layout.fields.len());
        let mut decl = vec![format!("typedef struct {} {{", name)];
        for (field, ty) in &layout.fields {
            decl.push(format!("    {} {};", ty.c_type(), sanitize_name(field)));
        }
        decl.push(format!("}} {};", name));

        self.ctx.struct_decls.push(decl);
        self.ctx.structs.insert(name.to_string(), layout);
        Ok(())
    }

    /// Parameter types: the annotation wins; an unannotated parameter that
    /// the body subscripts is a list; otherwise `float` for functions
    /// annotated `-> float` and `int` for the rest.
    fn parameter_types(
        &self,
        params: &[Param],
        return_type: Option<&TypeAnnotation>,
        body: &FunctionBody,
    ) -> Vec<(String, Ty)> {
        let subscripted = subscripted_names(body);
        let fallback = match return_type.map(|ty| self.resolve_annotation(ty)) {
            Some(Ty::Float) => Ty::Float,
            _ => Ty::Int,
        };

        params
            .iter()
            .map(|param| {
                let ty = match &param.type_hint {
                    Some(hint) => self.resolve_annotation(hint),
                    None if subscripted.contains(param.name.as_str()) => {
                        log::info!("parameter '{}' is subscripted, typing it as a list", param.name);
                        Ty::List
                    }
                    None => fallback.clone(),
                };
                (param.name.clone(), ty)
            })
            .collect()
    }

    pub(crate) fn register_functions(&mut self, stmts: &[AstNode]) -> CodegenResult<()> {
        let mut pending = Vec::new();

        for stmt in stmts {
            let AstNode::FunctionDef {
                name,
                params,
                return_type,
                body,
                ..
            } = stmt
            else {
                continue;
            };

            let key = self.qualified_name(name);
            let sig = FunctionSig {
                c_name: sanitize_name(&key),
                params: self.parameter_types(params, return_type.as_ref(), body),
                ret: return_type
                    .as_ref()
                    .map(|ty| self.resolve_annotation(ty))
                    .unwrap_or(Ty::Int),
                alias: false,
            };
            self.insert_function(&key, sig.clone());

            if let Some(stem) = &self.ctx.module_stem {
                let bare = key
                    .strip_prefix(&format!("{}_", stem))
                    .unwrap_or(&key)
                    .to_string();
                if bare != key && !self.ctx.functions.contains_key(&bare) {
                    log::debug!("alias {} -> {}", bare, key);
                    self.ctx.functions.insert(
                        bare,
                        FunctionSig {
                            alias: true,
                            ..sig
                        },
                    );
                }
            }

            if return_type.is_none() {
                pending.push((key, body));
            }
        }

        // A caller may return the result of a callee defined after it, so
        // repeat until no signature changes. Each round settles one more link
        // of a call chain, so the round count bounds mutual recursion.
        for round in 0..=pending.len() {
            let mut changed = false;
            for (key, body) in &pending {
                let ret = self.infer_return_type(key, body)?;
                let current = self.ctx.functions.get(key.as_str()).map(|sig| &sig.ret);
                if current != Some(&ret) {
                    log::debug!("inferred {} -> {} (round {})", key, ret, round);
                    self.update_return_type(key, ret);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        Ok(())
    }

    fn insert_function(&mut self, key: &str, sig: FunctionSig) {
        log::debug!("function {} -> {}", key, sig.ret);
        if !self.ctx.function_order.iter().any(|k| k == key) {
            self.ctx.function_order.push(key.to_string());
        }
        self.ctx.functions.insert(key.to_string(), sig);
    }

    /// Update a signature and every alias pointing at it.
    fn update_return_type(&mut self, key: &str, ret: Ty) {
        let Some(c_name) = self.ctx.functions.get(key).map(|sig| sig.c_name.clone()) else {
            return;
        };
        for sig in self.ctx.functions.values_mut() {
            if sig.c_name == c_name {
                sig.ret = ret.clone();
            }
        }
    }

    /// Type of the last `return` value in source order; `void` when the
    /// body never returns a value.
    fn infer_return_type(&mut self, key: &str, body: &FunctionBody) -> CodegenResult<Ty> {
        let params = self
            .ctx
            .functions
            .get(key)
            .map(|sig| sig.params.clone())
            .unwrap_or_default();

        let observed = self.dry_run(|g| {
            let (_, observed) = g.in_function(Ty::Int, |g| {
                for (name, ty) in &params {
                    g.ctx.scopes.declare(name, ty.clone());
                }
                g.lower_function_body(body)?;
                Ok(g.ctx.frame.observed_returns.last().cloned())
            })?;
            Ok(observed)
        })?;

        Ok(match observed {
            Some(Ty::Extern) | None => Ty::Void,
            Some(ty) => ty.or_default(),
        })
    }

    fn lower_function_body(&mut self, body: &FunctionBody) -> CodegenResult<()> {
        match body {
            FunctionBody::Block(stmts) => self.lower_statements(stmts),
            FunctionBody::Expr(expr) => self.lower_return(Some(&**expr), *expr.location()),
        }
    }

    pub(crate) fn lower_function_defs(&mut self, stmts: &[AstNode]) -> CodegenResult<()> {
        for stmt in stmts {
            if let AstNode::FunctionDef {
                name,
                body,
                location,
                ..
            } = stmt
            {
                self.lower_function(name, body, *location)?;
            }
        }
        Ok(())
    }

    fn lower_function(
        &mut self,
        name: &str,
        body: &FunctionBody,
        location: SourceLocation,
    ) -> CodegenResult<()> {
        let key = self.qualified_name(name);
        let sig = self
            .ctx
            .functions
            .get(&key)
            .cloned()
            .ok_or_else(|| TranslationError::UnresolvedCall {
                name: key.clone(),
                location,
            })?;

        let volatile = match body {
            FunctionBody::Block(stmts) => protected_writes(stmts),
            FunctionBody::Expr(expr) => protected_writes(std::iter::once(&**expr)),
        };
        let saved = std::mem::replace(&mut self.ctx.volatile_names, volatile);
        let result = self.in_function(sig.ret.clone(), |g| {
            for (param, ty) in &sig.params {
                g.ctx.scopes.declare(param, ty.clone());
            }
            g.lower_function_body(body)
        });
        self.ctx.volatile_names = saved;
        let (lines, ()) = result?;

        let params = if sig.params.is_empty() {
            "void".to_string()
        } else {
            sig.params
                .iter()
                .map(|(param, ty)| format!("{} {}", ty.c_type(), sanitize_name(param)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let header = format!("{} {}({})", sig.ret.c_type(), sig.c_name, params);

        let mut def = vec![format!("{} {{", header)];
        def.extend(indent(lines));
        def.push("}".to_string());

        self.ctx.prototypes.push(format!("{};", header));
        self.ctx.function_defs.push(def);
        Ok(())
    }
}

/// Identifiers used directly as the target of a subscript in `body`.
fn subscripted_names<'a>(body: &'a FunctionBody) -> FxHashSet<&'a str> {
    let mut names = FxHashSet::default();
    let mut visit = |node: &'a AstNode| {
        if let AstNode::Subscript { target, .. } = node {
            if let Some(name) = target.as_identifier() {
                names.insert(name);
            }
        }
    };
    match body {
        FunctionBody::Block(stmts) => {
            for stmt in stmts {
                stmt.walk(&mut visit);
            }
        }
        FunctionBody::Expr(expr) => expr.walk(&mut visit),
    }
    names
}

#[cfg(test)]
mod tests {
    use crate::codegen::config::GeneratorConfig;
    use crate::codegen::engine::Generator;
    use crate::codegen::errors::{ForgeError, TranslationError};
    use crate::codegen::types::Ty;
    use crate::parser::parse_source;

    fn declare(source: &str) -> Generator {
        let program = parse_source(source).unwrap();
        let mut gen = Generator::new(GeneratorConfig::default());
        gen.process_declarations(&program.statements).unwrap();
        gen
    }

    #[test]
    fn test_return_type_from_last_return() {
        let gen = declare("fn half(x) { let y = x / 2.0\nreturn y }");
        assert_eq!(gen.ctx.functions["half"].ret, Ty::Float);

        let gen = declare("fn greet(name: str) { return \"hi \" + name }");
        assert_eq!(gen.ctx.functions["greet"].ret, Ty::Str);

        let gen = declare("fn shout(x) { print(x) }");
        assert_eq!(gen.ctx.functions["shout"].ret, Ty::Void);
    }

    #[test]
    fn test_annotation_wins() {
        let gen = declare("fn f(x) -> float { return 1 }");
        assert_eq!(gen.ctx.functions["f"].ret, Ty::Float);
        assert_eq!(gen.ctx.functions["f"].params[0].1, Ty::Float);
    }

    #[test]
    fn test_recursion_resolves_with_provisional_signature() {
        let gen = declare("fn fact(n) { if n <= 1 { return 1 }\nreturn n * fact(n - 1) }");
        assert_eq!(gen.ctx.functions["fact"].ret, Ty::Int);
        assert!(gen.ctx.function_defs[0][0].starts_with("int fact(int n) {"));
    }

    #[test]
    fn test_forward_callee_return_type_reaches_caller() {
        let gen = declare("fn c() { return d() }\nfn d() { return e() }\nfn e() { return 1.5 }");
        assert_eq!(gen.ctx.functions["e"].ret, Ty::Float);
        assert_eq!(gen.ctx.functions["d"].ret, Ty::Float);
        assert_eq!(gen.ctx.functions["c"].ret, Ty::Float);
        assert_eq!(
            gen.ctx.prototypes,
            vec!["double c(void);", "double d(void);", "double e(void);"]
        );
    }

    #[test]
    fn test_mutual_recursion_without_base_type_stays_int() {
        let gen = declare("fn ping(n) { return pong(n) }\nfn pong(n) { return ping(n) }");
        assert_eq!(gen.ctx.functions["ping"].ret, Ty::Int);
        assert_eq!(gen.ctx.functions["pong"].ret, Ty::Int);
    }

    #[test]
    fn test_subscripted_parameter_is_list() {
        let gen = declare("fn first(xs) => xs[0]");
        assert_eq!(gen.ctx.functions["first"].params[0].1, Ty::List);
        assert_eq!(gen.ctx.functions["first"].ret, Ty::Float);
        assert_eq!(gen.ctx.prototypes, vec!["double first(List xs);"]);
    }

    #[test]
    fn test_struct_typedef_and_duplicate() {
        let gen = declare("struct P { x: int, y: float }\nstruct P { x: int, y: float }");
        assert_eq!(
            gen.ctx.struct_decls,
            vec![vec![
                "typedef struct P {".to_string(),
                "    int x;".to_string(),
                "    double y;".to_string(),
                "} P;".to_string()
            ]]
        );

        let program = parse_source("struct P { x: int }\nstruct P { y: str }").unwrap();
        let err = Generator::new(GeneratorConfig::default())
            .generate(&program)
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Translation(TranslationError::DuplicateStruct { .. })
        ));
    }

    #[test]
    fn test_function_named_main_is_sanitized() {
        let program = parse_source("fn main() { return 0 }\nmain()").unwrap();
        let unit = Generator::new(GeneratorConfig::default())
            .generate(&program)
            .unwrap();
        assert!(unit.contains("int forge_main(void) {"));
        assert!(unit.contains("    forge_main();"));
    }
}
