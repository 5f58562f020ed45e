// Code generation engine for Forge programs

use crate::codegen::config::GeneratorConfig;
use crate::codegen::constants::{RESERVED_NAMES, SANITIZE_PREFIX, TEMP_PREFIX};
use crate::codegen::emit::{assemble_unit, Emitter, UnitParts};
use crate::codegen::errors::CodegenResult;
use crate::codegen::scope::ScopeStack;
use crate::codegen::statements::protected_writes;
use crate::codegen::types::Ty;
use crate::parser::ast::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// A lowered expression: C text plus the type inferred for it
///
/// Value-less expressions (void calls, `print`, extern declarations) carry
/// an empty `code` once their statements have been emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CExpr {
    pub code: String,
    pub ty: Ty,
}

impl CExpr {
    pub fn new(code: impl Into<String>, ty: Ty) -> Self {
        CExpr {
            code: code.into(),
            ty,
        }
    }

    pub fn void() -> Self {
        CExpr::new("", Ty::Void)
    }
}

/// Field layout of a struct, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<(String, Ty)>,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&Ty> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }
}

/// Signature of a user or module function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    /// Name emitted in C (module-qualified, sanitized)
    pub c_name: String,
    pub params: Vec<(String, Ty)>,
    pub ret: Ty,
    /// Bare name registered for a module function; a real function of the
    /// same name replaces it
    pub alias: bool,
}

/// Signature recorded by an `extern(...)` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ExternSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
    /// The declaration named its return type; never overwritten afterwards
    pub explicit: bool,
}

/// Top-level statements of a loaded module, lowered where the `load` appears
#[derive(Debug, Clone)]
pub(crate) struct PendingModule {
    pub unit: usize,
    pub stem: String,
    pub statements: Vec<AstNode>,
}

/// Per-function lowering state
#[derive(Debug, Clone)]
pub(crate) struct FunctionFrame {
    pub return_type: Ty,
    /// The frame lowering top-level statements into `main`
    pub is_entry: bool,
    /// Protected regions currently open around the lowering point
    pub checkpoint_depth: usize,
    /// `checkpoint_depth` at the start of each enclosing loop
    pub loop_marks: Vec<usize>,
    /// Type of every `return` value seen, in source order
    pub observed_returns: Vec<Ty>,
}

impl FunctionFrame {
    pub fn new(return_type: Ty) -> Self {
        FunctionFrame {
            return_type,
            is_entry: false,
            checkpoint_depth: 0,
            loop_marks: Vec::new(),
            observed_returns: Vec::new(),
        }
    }

    pub fn entry() -> Self {
        FunctionFrame {
            is_entry: true,
            ..FunctionFrame::new(Ty::Int)
        }
    }
}

/// All mutable state of one generation run
pub(crate) struct GenContext {
    pub scopes: ScopeStack,
    pub structs: FxHashMap<String, StructLayout>,
    /// Struct names seen in the current declaration pass, before layouts exist
    pub known_struct_names: FxHashSet<String>,
    pub functions: FxHashMap<String, FunctionSig>,
    /// Keys of real (non-alias) functions in registration order
    pub function_order: Vec<String>,
    pub externs: FxHashMap<String, ExternSig>,
    pub loaded_modules: FxHashSet<String>,
    pub pending_modules: FxHashMap<String, PendingModule>,
    /// Lowered `attempt` expressions, keyed by (parse unit, node id)
    pub attempt_memo: FxHashMap<(usize, NodeId), CExpr>,
    /// Parse unit currently being lowered; node ids are unique only within one
    pub unit: usize,
    pub next_unit: usize,
    /// File stem of the module being processed, if any
    pub module_stem: Option<String>,
    pub temp_counter: usize,
    /// Names written inside a protected region of the body being lowered
    pub volatile_names: FxHashSet<String>,
    /// Set while lowering only to infer a return type
    pub dry_run: bool,
    pub emitter: Emitter,
    pub frame: FunctionFrame,
    pub struct_decls: Vec<Vec<String>>,
    pub prototypes: Vec<String>,
    pub function_defs: Vec<Vec<String>>,
}

impl GenContext {
    fn new() -> Self {
        GenContext {
            scopes: ScopeStack::new(),
            structs: FxHashMap::default(),
            known_struct_names: FxHashSet::default(),
            functions: FxHashMap::default(),
            function_order: Vec::new(),
            externs: FxHashMap::default(),
            loaded_modules: FxHashSet::default(),
            pending_modules: FxHashMap::default(),
            attempt_memo: FxHashMap::default(),
            unit: 0,
            next_unit: 0,
            module_stem: None,
            temp_counter: 0,
            volatile_names: FxHashSet::default(),
            dry_run: false,
            emitter: Emitter::new(),
            frame: FunctionFrame::entry(),
            struct_decls: Vec::new(),
            prototypes: Vec::new(),
            function_defs: Vec::new(),
        }
    }
}

/// Translates a parsed Forge program into one C compilation unit
pub struct Generator {
    pub(crate) config: GeneratorConfig,
    pub(crate) ctx: GenContext,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Generator {
            config,
            ctx: GenContext::new(),
        }
    }

    /// Generate the C unit for `program`.
    ///
    /// Loaded modules are processed first, then the program's own structs and
    /// functions, then its top-level statements become the body of `main`.
    pub fn generate(mut self, program: &Program) -> CodegenResult<String> {
        self.process_declarations(&program.statements)?;
        self.ctx.volatile_names = protected_writes(
            program
                .statements
                .iter()
                .filter(|stmt| !matches!(stmt, AstNode::FunctionDef { .. })),
        );

        for stmt in &program.statements {
            if !matches!(stmt, AstNode::FunctionDef { .. }) {
                self.lower_statement(stmt)?;
            }
        }

        let ctx = self.ctx;
        Ok(assemble_unit(UnitParts {
            struct_decls: ctx.struct_decls,
            prototypes: ctx.prototypes,
            function_defs: ctx.function_defs,
            main_body: ctx.emitter.into_lines(),
        }))
    }

    /// Registration runs to completion before any function body is lowered,
    /// so functions may call each other regardless of order.
    pub(crate) fn process_declarations(&mut self, stmts: &[AstNode]) -> CodegenResult<()> {
        self.preload_modules(stmts)?;
        self.register_externs(stmts);
        self.register_structs(stmts)?;
        self.register_functions(stmts)?;
        self.lower_function_defs(stmts)
    }

    pub(crate) fn emit(&mut self, line: impl Into<String>) {
        self.ctx.emitter.line(line);
    }

    /// Fresh temporary name such as `__t3`.
    pub(crate) fn temp(&mut self, prefix: &str) -> String {
        let name = format!("{}{}{}", TEMP_PREFIX, prefix, self.ctx.temp_counter);
        self.ctx.temp_counter += 1;
        name
    }

    /// Run `f` inside a new lexical scope, popped on every exit path.
    pub(crate) fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CodegenResult<T>,
    ) -> CodegenResult<T> {
        self.ctx.scopes.push_scope();
        let result = f(self);
        self.ctx.scopes.pop_scope();
        result
    }

    /// Run `f` with a fresh emission buffer and return the lines it produced.
    pub(crate) fn capture<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CodegenResult<T>,
    ) -> CodegenResult<(Vec<String>, T)> {
        self.ctx.emitter.push_buffer();
        let result = f(self);
        let lines = self.ctx.emitter.pop_buffer();
        result.map(|value| (lines, value))
    }

    /// Run `f` as the body of a C function returning `return_type`. Scopes,
    /// buffers and frame state of the caller are restored afterwards.
    pub(crate) fn in_function<T>(
        &mut self,
        return_type: Ty,
        f: impl FnOnce(&mut Self) -> CodegenResult<T>,
    ) -> CodegenResult<(Vec<String>, T)> {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        let saved_scopes = std::mem::replace(&mut self.ctx.scopes, scopes);
        let saved_emitter = std::mem::take(&mut self.ctx.emitter);
        let saved_frame = std::mem::replace(&mut self.ctx.frame, FunctionFrame::new(return_type));

        let result = f(self);

        let emitter = std::mem::replace(&mut self.ctx.emitter, saved_emitter);
        self.ctx.scopes = saved_scopes;
        self.ctx.frame = saved_frame;
        result.map(|value| (emitter.into_lines(), value))
    }

    /// Lower for inspection only. Memoized `attempt` results and temporary
    /// numbering are rolled back so the real pass emits everything itself.
    pub(crate) fn dry_run<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CodegenResult<T>,
    ) -> CodegenResult<T> {
        let memo = self.ctx.attempt_memo.clone();
        let counter = self.ctx.temp_counter;
        let was_dry = std::mem::replace(&mut self.ctx.dry_run, true);

        let result = f(self);

        self.ctx.attempt_memo = memo;
        self.ctx.temp_counter = counter;
        self.ctx.dry_run = was_dry;
        result
    }

    /// `type name` for a new local. Scalars written inside a protected
    /// region are `volatile`: after the `longjmp` into `rescue`, C leaves
    /// non-volatile locals changed since `setjmp` indeterminate.
    pub(crate) fn declarator(&self, name: &str, ty: &Ty) -> String {
        if ty.is_scalar() && self.ctx.volatile_names.contains(name) {
            format!("{} volatile {}", ty.c_type(), sanitize_name(name))
        } else {
            format!("{} {}", ty.c_type(), sanitize_name(name))
        }
    }

    pub(crate) fn is_struct(&self, name: &str) -> bool {
        self.ctx.structs.contains_key(name) || self.ctx.known_struct_names.contains(name)
    }

    pub(crate) fn resolve_annotation(&self, annotation: &TypeAnnotation) -> Ty {
        Ty::from_annotation(annotation, |name| self.is_struct(name))
    }
}

/// C spelling of a Forge identifier; names that clash with C keywords,
/// runtime symbols or generator temporaries get a `forge_` prefix.
pub(crate) fn sanitize_name(name: &str) -> String {
    if RESERVED_NAMES.contains(&name) || name.starts_with(TEMP_PREFIX) {
        format!("{}{}", SANITIZE_PREFIX, name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn generator() -> Generator {
        Generator::new(GeneratorConfig::default())
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("main"), "forge_main");
        assert_eq!(sanitize_name("double"), "forge_double");
        assert_eq!(sanitize_name("__x"), "forge___x");
        assert_eq!(sanitize_name("total"), "total");
    }

    #[test]
    fn test_in_function_restores_caller_state() {
        let mut gen = generator();
        gen.ctx.scopes.declare("outer", Ty::Str);
        gen.emit("int before = 0;");

        let (lines, ()) = gen
            .in_function(Ty::Float, |g| {
                assert!(!g.ctx.scopes.is_declared("outer"));
                assert_eq!(g.ctx.frame.return_type, Ty::Float);
                g.emit("return 1.5;");
                Ok(())
            })
            .unwrap();

        assert_eq!(lines, vec!["return 1.5;"]);
        assert_eq!(gen.ctx.scopes.get("outer"), Ty::Str);
        assert!(gen.ctx.frame.is_entry);
        assert_eq!(gen.ctx.emitter.clone().into_lines(), vec!["int before = 0;"]);
    }

    #[test]
    fn test_scope_popped_on_error() {
        let mut gen = generator();
        let depth = gen.ctx.scopes.depth();
        let program = parse_source("missing()").unwrap();
        let result = gen.scoped(|g| g.lower_statement(&program.statements[0]));
        assert!(result.is_err());
        assert_eq!(gen.ctx.scopes.depth(), depth);
    }

    #[test]
    fn test_attempt_expression_lowered_once_per_node() {
        let mut gen = generator();
        let program = parse_source("fn risky() -> int { return 1 }\nlet v = attempt risky() rescue 0").unwrap();
        gen.process_declarations(&program.statements).unwrap();

        let expr = match &program.statements[1] {
            AstNode::Let { value, .. } => value.as_ref().clone(),
            other => panic!("Expected let, got {other:?}"),
        };

        let (lines, (first, second)) = gen
            .capture(|g| {
                let first = g.lower_expr(&expr)?;
                let second = g.lower_expr(&expr)?;
                Ok((first, second))
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.ty, Ty::Int);
        assert_eq!(lines.iter().filter(|l| l.contains("setjmp")).count(), 1);
    }

    #[test]
    fn test_dry_run_rolls_back_temporaries() {
        let mut gen = generator();
        let before = gen.ctx.temp_counter;
        gen.dry_run(|g| {
            g.temp("t");
            g.temp("t");
            Ok(())
        })
        .unwrap();
        assert_eq!(gen.ctx.temp_counter, before);
        assert!(!gen.ctx.dry_run);
    }
}
