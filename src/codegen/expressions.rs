//! Expression lowering
//!
//! [`Generator::lower_expr`] turns an expression into a [`CExpr`]: a C
//! expression string plus the type inferred for it. Constructs that cannot be
//! a single C expression (list and array literals, struct instances, string
//! formatting, `attempt` expressions) first emit helper statements into the
//! current buffer and then evaluate to the temporary holding their result.
//!
//! # Type inference
//!
//! Inference runs forward only: literals have their natural type, identifiers
//! carry the type recorded at their declaration, and operators combine their
//! operand types through [`binary_result_type`]. The single exception is an
//! identifier that was never declared: its first subscript records it as an
//! array in the innermost scope.

use crate::codegen::constants::NUMBER_BUFFER_SIZE;
use crate::codegen::emit::{escape_c_string, indent};
use crate::codegen::engine::{sanitize_name, CExpr, Generator};
use crate::codegen::errors::{CodegenResult, TranslationError};
use crate::codegen::type_system::{binary_result_type, coerce, is_lvalue};
use crate::codegen::types::Ty;
use crate::parser::ast::*;

impl Generator {
    pub(crate) fn lower_expr(&mut self, expr: &AstNode) -> CodegenResult<CExpr> {
        match expr {
            AstNode::IntLiteral(value, _) => Ok(CExpr::new(value.to_string(), Ty::Int)),
            AstNode::FloatLiteral(value, _) => Ok(CExpr::new(format!("{:?}", value), Ty::Float)),
            AstNode::StringLiteral(value, _) => Ok(CExpr::new(
                format!("\"{}\"", escape_c_string(value)),
                Ty::Str,
            )),
            AstNode::BoolLiteral(value, _) => {
                Ok(CExpr::new(if *value { "1" } else { "0" }, Ty::Bool))
            }
            AstNode::Null { .. } => Ok(CExpr::new("NULL", Ty::Pointer)),

            AstNode::Identifier(name, _) => {
                Ok(CExpr::new(sanitize_name(name), self.ctx.scopes.get(name)))
            }

            AstNode::Binary {
                op,
                left,
                right,
                location,
            } => self.lower_binary(*op, left, right, *location),

            AstNode::Unary { op, operand, .. } => {
                let value = self.lower_expr(operand)?;
                Ok(match op {
                    UnOp::Neg => CExpr::new(format!("(-{})", value.code), value.ty),
                    UnOp::Not => CExpr::new(format!("(!{})", value.code), Ty::Bool),
                    UnOp::AddrOf => {
                        CExpr::new(format!("(&{})", value.code), Ty::Ref(Box::new(value.ty)))
                    }
                })
            }

            AstNode::Postfix { op, operand, .. } => {
                let value = self.lower_expr(operand)?;
                let suffix = match op {
                    PostfixOp::Inc => "++",
                    PostfixOp::Dec => "--",
                };
                Ok(CExpr::new(format!("{}{}", value.code, suffix), value.ty))
            }

            AstNode::Call {
                callee,
                args,
                expected_type,
                location,
            } => self.lower_call(callee, args, expected_type.as_ref(), *location),

            AstNode::MemberAccess {
                object,
                member,
                location,
            } => self.lower_field_access(object, member, *location),
            AstNode::PropertyAccess {
                object,
                property,
                location,
            } => self.lower_field_access(object, property, *location),

            AstNode::Subscript {
                target,
                index,
                location,
            } => self.lower_subscript(target, index, *location),

            AstNode::ListLiteral {
                elements,
                forced_hint,
                location,
            } => self.lower_list_literal(elements, forced_hint.as_ref(), *location),

            AstNode::ArrayLiteral { elements, .. } => self.lower_array_literal(elements),

            AstNode::StructInstance {
                name,
                args,
                location,
            } => self.lower_struct_instance(name, args, *location),

            AstNode::AttemptExpr {
                id,
                try_expr,
                error_name,
                rescue_expr,
                ..
            } => self.lower_attempt_expr(*id, try_expr, error_name, rescue_expr),

            AstNode::Extern {
                name,
                param_types,
                return_type,
                ..
            } => {
                self.register_extern(name, param_types, return_type.as_ref());
                Ok(CExpr::new("", Ty::Extern))
            }

            AstNode::Assignment {
                target,
                value,
                location,
            } => self.lower_assignment(target, value, *location, false),

            other => Err(TranslationError::unsupported_expression(
                "statement used where a value is expected",
                *other.location(),
            )
            .into()),
        }
    }

    /// Lower `target = value`. As a statement the assignment is emitted and
    /// an empty expression returned; otherwise it becomes `(target = value)`.
    /// Assigning to a name that was never declared declares it.
    pub(crate) fn lower_assignment(
        &mut self,
        target: &AstNode,
        value: &AstNode,
        location: SourceLocation,
        as_statement: bool,
    ) -> CodegenResult<CExpr> {
        let value = self.lower_expr(value)?;

        if let AstNode::Identifier(name, _) = target {
            if !self.ctx.scopes.is_declared(name) {
                if !value.ty.has_value() {
                    return Err(TranslationError::ValuelessBinding {
                        name: name.clone(),
                        location,
                    }
                    .into());
                }
                let ty = value.ty.clone().or_default();
                let declarator = self.declarator(name, &ty);
                self.ctx.scopes.declare(name, ty.clone());
                if as_statement {
                    self.emit(format!("{} = {};", declarator, value.code));
                    return Ok(CExpr::void());
                }
                self.emit(format!("{};", declarator));
                return Ok(CExpr::new(
                    format!("({} = {})", sanitize_name(name), value.code),
                    ty,
                ));
            }
        }

        let target = match target {
            AstNode::Identifier(..) | AstNode::PropertyAccess { .. } | AstNode::MemberAccess { .. } => {
                self.lower_expr(target)?
            }
            other => {
                return Err(TranslationError::unsupported_expression(
                    "invalid assignment target",
                    *other.location(),
                )
                .into())
            }
        };

        let code = coerce(&value.code, &value.ty, &target.ty);
        if as_statement {
            self.emit(format!("{} = {};", target.code, code));
            Ok(CExpr::void())
        } else {
            Ok(CExpr::new(format!("({} = {})", target.code, code), target.ty))
        }
    }

    /// `&&` and `||`. Helper statements of the right operand must only run
    /// when the left operand does not decide the result, so they are
    /// guarded by it:
    ///
    /// ```c
    /// int __b0 = (l) ? 1 : 0;
    /// if (__b0) {          /* `if (!__b0)` for `||` */
    ///     /* helpers */
    ///     __b0 = (r) ? 1 : 0;
    /// }
    /// ```
    fn lower_logical(&mut self, op: BinOp, l: CExpr, right: &AstNode) -> CodegenResult<CExpr> {
        let (helpers, r) = self.capture(|g| g.lower_expr(right))?;
        if helpers.is_empty() {
            return Ok(CExpr::new(
                format!("({} {} {})", l.code, op.c_operator(), r.code),
                Ty::Bool,
            ));
        }

        let result = self.temp("b");
        self.emit(format!("int {} = ({}) ? 1 : 0;", result, l.code));
        if op == BinOp::And {
            self.emit(format!("if ({}) {{", result));
        } else {
            self.emit(format!("if (!{}) {{", result));
        }
        self.ctx.emitter.extend_indented(helpers);
        self.emit(format!("    {} = ({}) ? 1 : 0;", result, r.code));
        self.emit("}");
        Ok(CExpr::new(result, Ty::Bool))
    }

    fn lower_binary(
        &mut self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        let l = self.lower_expr(left)?;
        if op.is_logical() {
            return self.lower_logical(op, l, right);
        }
        let r = self.lower_expr(right)?;
        let ty = binary_result_type(op, &l.ty, &r.ty);

        if ty == Ty::Str {
            let a = self.stringify(l, location)?;
            let b = self.stringify(r, location)?;
            return Ok(CExpr::new(format!("forge_concat({}, {})", a, b), Ty::Str));
        }

        if op.is_comparison() {
            let code = match (&l.ty, &r.ty) {
                (Ty::Str, Ty::Str) => format!(
                    "(strcmp({}, {}) {} 0)",
                    l.code,
                    r.code,
                    op.c_operator()
                ),
                // A character compared with a string literal compares its first character
                (Ty::Char, Ty::Str) => {
                    format!("({} {} ({})[0])", l.code, op.c_operator(), r.code)
                }
                (Ty::Str, Ty::Char) => {
                    format!("(({})[0] {} {})", l.code, op.c_operator(), r.code)
                }
                _ => format!("({} {} {})", l.code, op.c_operator(), r.code),
            };
            return Ok(CExpr::new(code, Ty::Bool));
        }

        // Arithmetic: a float on either side casts the other to double
        let (lc, rc) = if ty.is_float() {
            (coerce(&l.code, &l.ty, &ty), coerce(&r.code, &r.ty, &ty))
        } else {
            (l.code, r.code)
        };

        let code = match op {
            BinOp::Pow if ty.is_float() => format!("pow({}, {})", lc, rc),
            BinOp::Pow => format!("forge_pow_int({}, {})", lc, rc),
            BinOp::Mod if ty.is_float() => format!("fmod({}, {})", lc, rc),
            _ => format!("({} {} {})", lc, op.c_operator(), rc),
        };
        Ok(CExpr::new(code, ty))
    }

    /// Render `value` as a C string for concatenation. Numbers and
    /// characters are formatted into a scratch buffer first.
    pub(crate) fn stringify(
        &mut self,
        value: CExpr,
        location: SourceLocation,
    ) -> CodegenResult<String> {
        let format = match &value.ty {
            Ty::Str => return Ok(value.code),
            Ty::Bool => return Ok(format!("({} ? \"true\" : \"false\")", value.code)),
            Ty::List => {
                let list = self.spill(value);
                return Ok(format!("forge_list_to_string(&{})", list.code));
            }
            Ty::StrList => {
                let list = self.spill(value);
                return Ok(format!("forge_string_list_to_string(&{})", list.code));
            }
            Ty::Int | Ty::Unknown => "%d",
            Ty::Float => "%g",
            Ty::Char => "%c",
            Ty::Handle => "%ld",
            other => {
                return Err(TranslationError::unsupported_expression(
                    format!("cannot convert a value of type {} to a string", other),
                    location,
                )
                .into())
            }
        };

        let buffer = self.temp("n");
        let arg = if value.ty == Ty::Handle {
            format!("(long)({})", value.code)
        } else {
            value.code
        };
        self.emit(format!("char {}[{}];", buffer, NUMBER_BUFFER_SIZE));
        self.emit(format!(
            "snprintf({}, sizeof({}), \"{}\", {});",
            buffer, buffer, format, arg
        ));
        Ok(buffer)
    }

    /// Make sure `value` is addressable, copying it into a temporary if needed.
    pub(crate) fn spill(&mut self, value: CExpr) -> CExpr {
        if is_lvalue(&value.code) {
            return value;
        }
        let name = self.temp("v");
        self.emit(format!("{} {} = {};", value.ty.c_type(), name, value.code));
        CExpr::new(name, value.ty)
    }

    fn lower_field_access(
        &mut self,
        object: &AstNode,
        field: &str,
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        let object = self.lower_expr(object)?;

        if let Some((struct_name, through_pointer)) = object.ty.struct_name() {
            let field_ty = self
                .ctx
                .structs
                .get(struct_name)
                .and_then(|layout| layout.field(field))
                .cloned()
                .ok_or_else(|| TranslationError::UnknownField {
                    struct_name: struct_name.to_string(),
                    field: field.to_string(),
                    location,
                })?;
            let accessor = if through_pointer { "->" } else { "." };
            return Ok(CExpr::new(
                format!("{}{}{}", object.code, accessor, sanitize_name(field)),
                field_ty,
            ));
        }

        let code = match (&object.ty, field) {
            (Ty::List | Ty::StrList, "size" | "length") => format!("{}.size", object.code),
            (Ty::Array(_), "size" | "length") => format!("(int){}->length", object.code),
            (Ty::ArrayValue(_), "size" | "length") => format!("(int){}.length", object.code),
            _ => {
                return Err(TranslationError::FieldOnNonStruct {
                    field: field.to_string(),
                    ty: object.ty.to_string(),
                    location,
                }
                .into())
            }
        };
        Ok(CExpr::new(code, Ty::Int))
    }

    fn lower_subscript(
        &mut self,
        target: &AstNode,
        index: &AstNode,
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        if let AstNode::Identifier(name, _) = target {
            if !self.ctx.scopes.is_declared(name) {
                log::info!("'{}' is first used with a subscript, recording it as an array", name);
                self.ctx.scopes.set(name, Ty::Array(Box::new(Ty::Int)));
            }
        }

        let target = self.lower_expr(target)?;
        let index = self.lower_expr(index)?;

        match target.ty.clone() {
            Ty::List => {
                let list = self.spill(target);
                Ok(CExpr::new(format!("list_get(&{}, {})", list.code, index.code), Ty::Float))
            }
            Ty::StrList => {
                let list = self.spill(target);
                Ok(CExpr::new(
                    format!("string_list_get(&{}, {})", list.code, index.code),
                    Ty::Str,
                ))
            }
            Ty::Ref(inner) if *inner == Ty::List => Ok(CExpr::new(
                format!("list_get({}, {})", target.code, index.code),
                Ty::Float,
            )),
            Ty::Array(elem) => Ok(CExpr::new(
                format!("(*({}*)array_get({}, {}))", elem.c_type(), target.code, index.code),
                *elem,
            )),
            Ty::ArrayValue(elem) => {
                let array = self.spill(target);
                Ok(CExpr::new(
                    format!("(*({}*)array_get(&{}, {}))", elem.c_type(), array.code, index.code),
                    *elem,
                ))
            }
            Ty::Str => Ok(CExpr::new(
                format!("forge_str_at({}, {})", target.code, index.code),
                Ty::Char,
            )),
            other => Err(TranslationError::NotSubscriptable {
                ty: other.to_string(),
                location,
            }
            .into()),
        }
    }

    fn lower_list_literal(
        &mut self,
        elements: &[AstNode],
        forced_hint: Option<&TypeAnnotation>,
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        let values = elements
            .iter()
            .map(|e| self.lower_expr(e))
            .collect::<CodegenResult<Vec<_>>>()?;

        let string_list = match forced_hint.map(|hint| self.resolve_annotation(hint)) {
            Some(ty) => ty == Ty::StrList,
            None => values.first().is_some_and(|v| v.ty.is_string()),
        };

        let list = self.temp("l");
        if string_list {
            self.emit(format!("StringList {} = string_list_create();", list));
            for value in values {
                if !value.ty.is_string() {
                    return Err(TranslationError::unsupported_expression(
                        format!("a StringList cannot hold a value of type {}", value.ty),
                        location,
                    )
                    .into());
                }
                self.emit(format!("string_list_add(&{}, {});", list, value.code));
            }
            return Ok(CExpr::new(list, Ty::StrList));
        }

        self.emit(format!("List {} = list_create();", list));
        for value in values {
            if !value.ty.is_numeric() {
                return Err(TranslationError::unsupported_expression(
                    format!("a numeric list cannot hold a value of type {}", value.ty),
                    location,
                )
                .into());
            }
            self.emit(format!("list_add(&{}, (double)({}));", list, value.code));
        }
        Ok(CExpr::new(list, Ty::List))
    }

    fn lower_array_literal(&mut self, elements: &[AstNode]) -> CodegenResult<CExpr> {
        let values = elements
            .iter()
            .map(|e| self.lower_expr(e))
            .collect::<CodegenResult<Vec<_>>>()?;

        let elem = if values.iter().any(|v| v.ty.is_float()) {
            Ty::Float
        } else {
            values
                .first()
                .map(|v| v.ty.clone().or_default())
                .unwrap_or(Ty::Int)
        };
        let c_elem = elem.c_type();

        let array = self.temp("a");
        self.emit(format!(
            "Array {} = array_create(sizeof({}), {});",
            array,
            c_elem,
            values.len()
        ));
        for (i, value) in values.into_iter().enumerate() {
            let code = coerce(&value.code, &value.ty, &elem);
            self.emit(format!("array_set(&{}, {}, &({}){{{}}});", array, i, c_elem, code));
        }
        Ok(CExpr::new(array, Ty::ArrayValue(Box::new(elem))))
    }

    /// `Name(a, b)`: a temporary plus one field assignment per value, in
    /// declared field order.
    pub(crate) fn lower_struct_instance(
        &mut self,
        name: &str,
        args: &[AstNode],
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        let layout = self.ctx.structs.get(name).cloned().ok_or_else(|| {
            TranslationError::UnresolvedCall {
                name: name.to_string(),
                location,
            }
        })?;

        if args.len() != layout.fields.len() {
            return Err(TranslationError::StructArity {
                name: name.to_string(),
                expected: layout.fields.len(),
                got: args.len(),
                location,
            }
            .into());
        }

        let values = args
            .iter()
            .map(|a| self.lower_expr(a))
            .collect::<CodegenResult<Vec<_>>>()?;

        let instance = self.temp("s");
        self.emit(format!("{} {};", layout.name, instance));
        for ((field, field_ty), value) in layout.fields.iter().zip(values) {
            self.emit(format!(
                "{}.{} = {};",
                instance,
                sanitize_name(field),
                coerce(&value.code, &value.ty, field_ty)
            ));
        }
        Ok(CExpr::new(instance, Ty::Struct(layout.name)))
    }

    /// `attempt expr rescue fallback`
    ///
    /// Lowered once per node: a repeated visit returns the temporary that
    /// already holds the result instead of emitting the region again.
    fn lower_attempt_expr(
        &mut self,
        id: NodeId,
        try_expr: &AstNode,
        error_name: &str,
        rescue_expr: &AstNode,
    ) -> CodegenResult<CExpr> {
        let key = (self.ctx.unit, id);
        if let Some(done) = self.ctx.attempt_memo.get(&key) {
            return Ok(done.clone());
        }

        self.ctx.frame.checkpoint_depth += 1;
        let tried = self.capture(|g| g.lower_expr(try_expr));
        self.ctx.frame.checkpoint_depth -= 1;
        let (try_lines, tried) = tried?;

        let (rescue_lines, rescued) = self.scoped(|g| {
            g.ctx.scopes.declare(error_name, Ty::Str);
            g.capture(|g| g.lower_expr(rescue_expr))
        })?;

        let ty = [&tried.ty, &rescued.ty]
            .into_iter()
            .find(|ty| ty.has_value() && **ty != Ty::Unknown)
            .cloned()
            .unwrap_or(Ty::Int);

        let result = self.temp("r");
        let checkpoint = self.temp("cp");

        self.emit(format!("{} {};", ty.c_type(), result));
        self.emit(format!("ForgeCheckpoint {};", checkpoint));
        self.emit(format!("forge_checkpoint_enter(&{});", checkpoint));
        self.emit(format!("if (!setjmp({}.env)) {{", checkpoint));
        self.ctx.emitter.extend_indented(try_lines);
        self.emit_result_assignment(&result, &tried, &ty);
        self.emit("    forge_checkpoint_leave();");
        self.emit("} else {");
        self.emit(format!(
            "    char* {} = (char*)forge_error_context.error;",
            sanitize_name(error_name)
        ));
        self.ctx.emitter.extend_indented(rescue_lines);
        self.emit_result_assignment(&result, &rescued, &ty);
        self.emit("}");

        let value = CExpr::new(result, ty);
        self.ctx.attempt_memo.insert(key, value.clone());
        Ok(value)
    }

    fn emit_result_assignment(&mut self, result: &str, value: &CExpr, ty: &Ty) {
        let line = if value.ty.has_value() {
            format!("{} = {};", result, coerce(&value.code, &value.ty, ty))
        } else {
            // A value-less branch still runs for its effects
            let mut line = if value.code.is_empty() {
                String::new()
            } else {
                format!("{}; ", value.code)
            };
            line.push_str(&format!("{} = 0;", result));
            line
        };
        self.ctx.emitter.extend(indent([line]));
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::config::GeneratorConfig;
    use crate::codegen::engine::{CExpr, Generator};
    use crate::codegen::errors::{ForgeError, TranslationError};
    use crate::codegen::types::Ty;
    use crate::parser::ast::AstNode;
    use crate::parser::parse_source;

    /// Lower the value of the last `let` in `source` after running the
    /// statements before it.
    fn lower_last(source: &str) -> (Vec<String>, CExpr) {
        let program = parse_source(source).unwrap();
        let mut gen = Generator::new(GeneratorConfig::default());
        gen.process_declarations(&program.statements).unwrap();
        let (last, init) = program.statements.split_last().unwrap();
        for stmt in init {
            if !matches!(stmt, AstNode::FunctionDef { .. }) {
                gen.lower_statement(stmt).unwrap();
            }
        }
        let value = match last {
            AstNode::Let { value, .. } => value.as_ref(),
            AstNode::ExpressionStatement { expr, .. } => expr.as_ref(),
            other => panic!("Expected let or expression, got {other:?}"),
        };
        gen.capture(|g| g.lower_expr(value)).unwrap()
    }

    #[test]
    fn test_literal_types() {
        assert_eq!(lower_last("let x = 5").1, CExpr::new("5", Ty::Int));
        assert_eq!(lower_last("let x = 2.5").1, CExpr::new("2.5", Ty::Float));
        assert_eq!(lower_last("let x = true").1, CExpr::new("1", Ty::Bool));
        assert_eq!(lower_last("let x = \"hi\\n\"").1, CExpr::new("\"hi\\n\"", Ty::Str));
    }

    #[test]
    fn test_float_contaminates_and_casts() {
        let (_, value) = lower_last("let n = 2\nlet x = n * 1.5");
        assert_eq!(value.ty, Ty::Float);
        assert_eq!(value.code, "((double)(n) * 1.5)");
    }

    #[test]
    fn test_string_equality_compares_contents() {
        let (_, value) = lower_last("let a = \"x\"\nlet b = a == \"y\"");
        assert_eq!(value.code, "(strcmp(a, \"y\") == 0)");
        assert_eq!(value.ty, Ty::Bool);
    }

    #[test]
    fn test_concat_formats_numbers_into_buffer() {
        let (lines, value) = lower_last("let n = 3\nlet s = \"n=\" + n");
        assert_eq!(lines[0], "char __n0[64];");
        assert_eq!(lines[1], "snprintf(__n0, sizeof(__n0), \"%d\", n);");
        assert_eq!(value.code, "forge_concat(\"n=\", __n0)");
        assert_eq!(value.ty, Ty::Str);
    }

    #[test]
    fn test_struct_instance_assigns_fields_in_order() {
        let (lines, value) = lower_last("struct P { x: int, y: int }\nlet p = P(1, 2)");
        assert_eq!(lines, vec!["P __s0;", "__s0.x = 1;", "__s0.y = 2;"]);
        assert_eq!(value.ty, Ty::Struct("P".into()));
    }

    #[test]
    fn test_field_through_reference_uses_arrow() {
        let program = parse_source(
            "struct P { x: int }\nfn getx(p: &P) -> int { return p.x }",
        )
        .unwrap();
        let gen = Generator::new(GeneratorConfig::default());
        let unit = gen.generate(&program).unwrap();
        assert!(unit.contains("int getx(struct P* p) {"));
        assert!(unit.contains("return p->x;"));
    }

    #[test]
    fn test_unknown_field_is_error() {
        let program = parse_source("struct P { x: int }\nlet p = P(1)\nprint(p.z)").unwrap();
        let gen = Generator::new(GeneratorConfig::default());
        assert!(matches!(
            gen.generate(&program),
            Err(ForgeError::Translation(TranslationError::UnknownField { .. }))
        ));
    }

    #[test]
    fn test_subscript_accessors() {
        let (lines, value) = lower_last("let xs = @(1, 2)\nlet v = xs[0]");
        assert!(lines.is_empty());
        assert_eq!(value, CExpr::new("list_get(&xs, 0)", Ty::Float));

        let (_, value) = lower_last("let names = @(\"a\")\nlet v = names[0]");
        assert_eq!(value, CExpr::new("string_list_get(&names, 0)", Ty::Str));

        let (_, value) = lower_last("let s = \"abc\"\nlet c = s[1]");
        assert_eq!(value, CExpr::new("forge_str_at(s, 1)", Ty::Char));
    }

    #[test]
    fn test_undeclared_subscript_becomes_array() {
        let (_, value) = lower_last("let v = data[2]");
        assert_eq!(value, CExpr::new("(*(int*)array_get(data, 2))", Ty::Int));
    }

    #[test]
    fn test_subscript_on_scalar_is_error() {
        let program = parse_source("let n = 4\nlet v = n[0]").unwrap();
        let gen = Generator::new(GeneratorConfig::default());
        assert!(matches!(
            gen.generate(&program),
            Err(ForgeError::Translation(TranslationError::NotSubscriptable { .. }))
        ));
    }

    #[test]
    fn test_array_literal() {
        let (lines, value) = lower_last("let a = [1, 2.5]");
        assert_eq!(lines[0], "Array __a0 = array_create(sizeof(double), 2);");
        assert_eq!(lines[1], "array_set(&__a0, 0, &(double){(double)(1)});");
        assert_eq!(value.ty, Ty::ArrayValue(Box::new(Ty::Float)));
    }

    #[test]
    fn test_list_literal_rejects_mixed_elements() {
        let program = parse_source("let xs = @(1, \"two\")").unwrap();
        let gen = Generator::new(GeneratorConfig::default());
        assert!(gen.generate(&program).is_err());
    }
}
