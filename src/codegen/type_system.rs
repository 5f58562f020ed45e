//! Type rules shared by the lowering passes
//!
//! # Rules
//!
//! - Comparisons and logical operators produce `bool`
//! - `+` with a string operand is concatenation and produces `str`
//! - Arithmetic with a float operand produces `float`; otherwise `int`
//! - Values crossing an int/float boundary (returns, conversions) get an
//!   explicit C cast

use crate::codegen::types::Ty;
use crate::parser::ast::BinOp;

/// Result type of `left op right`.
pub fn binary_result_type(op: BinOp, left: &Ty, right: &Ty) -> Ty {
    if op.is_comparison() || op.is_logical() {
        return Ty::Bool;
    }
    if op == BinOp::Add && (left.is_string() || right.is_string()) {
        return Ty::Str;
    }
    if left.is_float() || right.is_float() {
        return Ty::Float;
    }
    match (left, right) {
        (Ty::Handle, _) | (_, Ty::Handle) => Ty::Handle,
        _ => Ty::Int,
    }
}

/// Cast `code` so it can be used where `to` is expected.
pub fn coerce(code: &str, from: &Ty, to: &Ty) -> String {
    match (from, to) {
        (Ty::Float, Ty::Int | Ty::Bool) => format!("(int)({})", code),
        (Ty::Int | Ty::Bool | Ty::Char | Ty::Unknown, Ty::Float) => format!("(double)({})", code),
        _ => code.to_string(),
    }
}

/// Whether `code` names storage that `&` can be applied to.
pub fn is_lvalue(code: &str) -> bool {
    let mut chars = code.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && code
            .replace("->", ".")
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// `printf` conversion for a scalar of type `ty`.
pub fn printf_spec(ty: &Ty) -> Option<&'static str> {
    match ty {
        Ty::Int | Ty::Bool | Ty::Unknown => Some("%d"),
        Ty::Float => Some("%g"),
        Ty::Char => Some("%c"),
        Ty::Str => Some("%s"),
        Ty::Handle => Some("%ld"),
        Ty::Pointer | Ty::Ref(_) => Some("%p"),
        _ => None,
    }
}

/// Element kind tag understood by `forge_array_to_string`.
pub fn array_element_tag(elem: &Ty) -> char {
    match elem {
        Ty::Float => 'f',
        Ty::Str => 's',
        Ty::Char => 'c',
        _ => 'd',
    }
}
