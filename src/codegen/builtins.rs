//! Builtin functions
//!
//! Each builtin has exactly one lowering onto the C runtime:
//!
//! | Builtin | Lowering |
//! |---|---|
//! | `print(a, b, ...)` | one `printf`, a conversion chosen per argument type |
//! | `printp(v[, digits])` | `printf("%.*f\n", digits, v)`, six digits by default |
//! | `input([prompt])` | `forge_input`, then `atoi`/`atof` for an annotated `let` |
//! | `len(x)` | `strlen` for strings, the length field for containers |
//! | `number(x)`, `int(x)` | `forge_to_int` for strings, a cast otherwise |
//! | `float(x)` | `forge_to_float` for strings, a cast otherwise |
//! | `string(x)` | `forge_*_to_string` |
//! | `random_int(lo, hi)`, `ri` | `forge_random_int` |
//! | `random_float([lo, hi])`, `rf` | `forge_random_float` |
//! | `hash(s)` | `forge_hash` |
//! | `read(path)` | `read_file` |
//! | `write(path, text, spacing)`, `addto(...)` | `write_file` with mode `"w"`/`"a"` |
//! | `raise(msg)` | `forge_raise` |

use crate::codegen::emit::escape_c_string;
use crate::codegen::engine::{CExpr, Generator};
use crate::codegen::errors::{CodegenResult, TranslationError};
use crate::codegen::type_system::{array_element_tag, coerce, printf_spec};
use crate::codegen::types::Ty;
use crate::parser::ast::*;

const BUILTINS: &[&str] = &[
    "print",
    "printp",
    "input",
    "len",
    "number",
    "int",
    "float",
    "string",
    "random_int",
    "ri",
    "random_float",
    "rf",
    "hash",
    "read",
    "write",
    "addto",
    "raise",
];

/// Digits printed by `printp` when none are given
const DEFAULT_PRINT_PRECISION: &str = "6";

impl Generator {
    pub(crate) fn is_builtin(name: &str) -> bool {
        BUILTINS.contains(&name)
    }

    pub(crate) fn lower_builtin(
        &mut self,
        name: &str,
        args: &[AstNode],
        expected_type: Option<&TypeAnnotation>,
        location: SourceLocation,
    ) -> CodegenResult<CExpr> {
        match name {
            "print" => self.lower_print(args, location),
            "printp" => {
                check_arity(name, args, &[1, 2], location)?;
                let value = self.lower_expr(&args[0])?;
                let digits = match args.get(1) {
                    Some(arg) => self.lower_expr(arg)?.code,
                    None => DEFAULT_PRINT_PRECISION.to_string(),
                };
                self.emit(format!(
                    "printf(\"%.*f\\n\", (int)({}), (double)({}));",
                    digits, value.code
                ));
                Ok(CExpr::void())
            }
            "input" => {
                check_arity(name, args, &[0, 1], location)?;
                let prompt = match args.first() {
                    Some(arg) => self.lower_expr(arg)?.code,
                    None => "NULL".to_string(),
                };
                let line = format!("forge_input({})", prompt);
                let expected = expected_type.map(|hint| self.resolve_annotation(hint));
                Ok(match expected {
                    Some(Ty::Int | Ty::Bool) => CExpr::new(format!("atoi({})", line), Ty::Int),
                    Some(Ty::Float) => CExpr::new(format!("atof({})", line), Ty::Float),
                    _ => CExpr::new(line, Ty::Str),
                })
            }
            "len" => {
                check_arity(name, args, &[1], location)?;
                let value = self.lower_expr(&args[0])?;
                self.lower_len(value, location)
            }
            "number" | "int" => {
                check_arity(name, args, &[1], location)?;
                let value = self.lower_expr(&args[0])?;
                Ok(match value.ty {
                    Ty::Str => CExpr::new(format!("forge_to_int({})", value.code), Ty::Int),
                    _ => CExpr::new(format!("(int)({})", value.code), Ty::Int),
                })
            }
            "float" => {
                check_arity(name, args, &[1], location)?;
                let value = self.lower_expr(&args[0])?;
                Ok(match value.ty {
                    Ty::Str => CExpr::new(format!("forge_to_float({})", value.code), Ty::Float),
                    _ => CExpr::new(format!("(double)({})", value.code), Ty::Float),
                })
            }
            "string" => {
                check_arity(name, args, &[1], location)?;
                let value = self.lower_expr(&args[0])?;
                self.lower_to_string(value, location)
            }
            "random_int" | "ri" => {
                check_arity(name, args, &[2], location)?;
                let low = self.lower_expr(&args[0])?;
                let high = self.lower_expr(&args[1])?;
                Ok(CExpr::new(
                    format!(
                        "forge_random_int({}, {})",
                        coerce(&low.code, &low.ty, &Ty::Int),
                        coerce(&high.code, &high.ty, &Ty::Int)
                    ),
                    Ty::Int,
                ))
            }
            "random_float" | "rf" => {
                check_arity(name, args, &[0, 2], location)?;
                let (low, high) = if args.is_empty() {
                    ("0.0".to_string(), "1.0".to_string())
                } else {
                    let low = self.lower_expr(&args[0])?;
                    let high = self.lower_expr(&args[1])?;
                    (
                        coerce(&low.code, &low.ty, &Ty::Float),
                        coerce(&high.code, &high.ty, &Ty::Float),
                    )
                };
                Ok(CExpr::new(
                    format!("forge_random_float({}, {})", low, high),
                    Ty::Float,
                ))
            }
            "hash" => {
                check_arity(name, args, &[1], location)?;
                let value = self.lower_expr(&args[0])?;
                let text = self.stringify(value, location)?;
                Ok(CExpr::new(format!("forge_hash({})", text), Ty::Int))
            }
            "read" => {
                check_arity(name, args, &[1], location)?;
                let path = self.lower_expr(&args[0])?;
                Ok(CExpr::new(format!("read_file({})", path.code), Ty::Str))
            }
            "write" | "addto" => {
                check_arity(name, args, &[2, 3], location)?;
                let path = self.lower_expr(&args[0])?;
                let content = self.lower_expr(&args[1])?;
                let content = self.stringify(content, location)?;
                let spacing = match args.get(2) {
                    Some(arg) => self.lower_expr(arg)?.code,
                    None => "0".to_string(),
                };
                let mode = if name == "write" { "w" } else { "a" };
                Ok(CExpr::new(
                    format!(
                        "write_file({}, {}, \"{}\", {})",
                        path.code, content, mode, spacing
                    ),
                    Ty::Int,
                ))
            }
            "raise" => {
                check_arity(name, args, &[1], location)?;
                // Heap-allocated: the raising frame is gone once the rescue runs
                let message = self.lower_expr(&args[0])?;
                let message = self.lower_to_string(message, location)?;
                Ok(CExpr::new(format!("forge_raise({})", message.code), Ty::Void))
            }
            _ => Err(TranslationError::UnresolvedCall {
                name: name.to_string(),
                location,
            }
            .into()),
        }
    }

    /// `print(a, b, ...)`: arguments separated by spaces, then a newline.
    fn lower_print(&mut self, args: &[AstNode], location: SourceLocation) -> CodegenResult<CExpr> {
        let mut formats = Vec::with_capacity(args.len());
        let mut values = Vec::with_capacity(args.len());

        for arg in args {
            let value = self.lower_expr(arg)?;
            let (format, code) = match value.ty.clone() {
                Ty::Bool => ("%s", format!("({} ? \"true\" : \"false\")", value.code)),
                Ty::Handle => ("%ld", format!("(long)({})", value.code)),
                Ty::List => {
                    let list = self.spill(value);
                    ("%s", format!("forge_list_to_string(&{})", list.code))
                }
                Ty::StrList => {
                    let list = self.spill(value);
                    ("%s", format!("forge_string_list_to_string(&{})", list.code))
                }
                Ty::Array(elem) => (
                    "%s",
                    format!(
                        "forge_array_to_string({}, '{}')",
                        value.code,
                        array_element_tag(&elem)
                    ),
                ),
                Ty::ArrayValue(elem) => {
                    let tag = array_element_tag(&elem);
                    let array = self.spill(value);
                    ("%s", format!("forge_array_to_string(&{}, '{}')", array.code, tag))
                }
                Ty::Struct(name) => ("%s", format!("\"<{}>\"", escape_c_string(&name))),
                ty => match printf_spec(&ty) {
                    Some(spec) => (spec, value.code),
                    None => {
                        return Err(TranslationError::unsupported_expression(
                            format!("cannot print a value of type {}", ty),
                            location,
                        )
                        .into())
                    }
                },
            };
            formats.push(format);
            values.push(code);
        }

        let format = format!("{}\\n", formats.join(" "));
        if values.is_empty() {
            self.emit(format!("printf(\"{}\");", format));
        } else {
            self.emit(format!("printf(\"{}\", {});", format, values.join(", ")));
        }
        Ok(CExpr::void())
    }

    fn lower_len(&mut self, value: CExpr, location: SourceLocation) -> CodegenResult<CExpr> {
        let code = match value.ty.clone() {
            Ty::Str => format!("(int)strlen({})", value.code),
            Ty::List | Ty::StrList => format!("{}.size", self.spill(value).code),
            Ty::Array(_) => format!("(int){}->length", value.code),
            Ty::ArrayValue(_) => format!("(int){}.length", self.spill(value).code),
            Ty::Ref(inner) if matches!(*inner, Ty::List | Ty::StrList) => {
                format!("{}->size", value.code)
            }
            other => {
                return Err(TranslationError::unsupported_call(
                    format!("len() of a value of type {}", other),
                    location,
                )
                .into())
            }
        };
        Ok(CExpr::new(code, Ty::Int))
    }

    fn lower_to_string(&mut self, value: CExpr, location: SourceLocation) -> CodegenResult<CExpr> {
        let code = match value.ty.clone() {
            Ty::Str => value.code,
            Ty::Int | Ty::Unknown => format!("forge_int_to_string({})", value.code),
            Ty::Float => format!("forge_float_to_string({})", value.code),
            Ty::Bool => format!("forge_bool_to_string({})", value.code),
            Ty::Char => format!("forge_char_to_string({})", value.code),
            Ty::List => format!("forge_list_to_string(&{})", self.spill(value).code),
            Ty::StrList => format!("forge_string_list_to_string(&{})", self.spill(value).code),
            other => {
                return Err(TranslationError::unsupported_call(
                    format!("string() of a value of type {}", other),
                    location,
                )
                .into())
            }
        };
        Ok(CExpr::new(code, Ty::Str))
    }
}

fn check_arity(
    name: &str,
    args: &[AstNode],
    allowed: &[usize],
    location: SourceLocation,
) -> Result<(), TranslationError> {
    if allowed.contains(&args.len()) {
        return Ok(());
    }
    let expected = allowed
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(TranslationError::BuiltinArity {
        name: name.to_string(),
        expected,
        got: args.len(),
        location,
    })
}
