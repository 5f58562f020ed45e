//! The generator's type model
//!
//! [`Ty`] is what the scope tracker records for every name and what every
//! lowered expression carries. Types are heuristic: they decide C declarations,
//! `printf` formats and which runtime accessor a subscript uses, nothing more.

use crate::parser::ast::TypeAnnotation;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Int,
    /// C `double`
    Float,
    /// Same width as `Int` in emitted code
    Bool,
    Char,
    /// C `char*`
    Str,
    /// Growable list of doubles
    List,
    StrList,
    /// `Array*`: arrays passed around by pointer
    Array(Box<Ty>),
    /// `Array`: an array literal held by value
    ArrayValue(Box<Ty>),
    /// `void*`
    Pointer,
    /// `intptr_t`
    Handle,
    Struct(String),
    /// `&T`, emitted as `T*`
    Ref(Box<Ty>),
    Void,
    /// Marker for an `extern(...)` declaration, which has no value
    Extern,
    /// Never declared; emitted as `int`
    Unknown,
}

impl Ty {
    /// Map a source annotation onto the type model. `is_struct` answers
    /// whether a name refers to a known struct.
    ///
    /// Unrecognized names fall back to `int` with a warning.
    pub fn from_annotation(annotation: &TypeAnnotation, is_struct: impl Fn(&str) -> bool) -> Ty {
        let base = Self::from_name(&annotation.name, is_struct);
        if annotation.by_ref {
            Ty::Ref(Box::new(base))
        } else {
            base
        }
    }

    fn from_name(name: &str, is_struct: impl Fn(&str) -> bool) -> Ty {
        match name {
            "int" | "number" => Ty::Int,
            "float" => Ty::Float,
            "bool" => Ty::Bool,
            "char" => Ty::Char,
            "str" | "string" => Ty::Str,
            "list" => Ty::List,
            "StringList" => Ty::StrList,
            "arr" => Ty::Array(Box::new(Ty::Int)),
            "pointer" => Ty::Pointer,
            "handle" | "address" => Ty::Handle,
            "void" => Ty::Void,
            "any" => Ty::Unknown,
            other if is_struct(other) => Ty::Struct(other.to_string()),
            other => {
                log::warn!("unknown type '{}', treating it as int", other);
                Ty::Int
            }
        }
    }

    /// The C spelling of this type.
    pub fn c_type(&self) -> String {
        match self {
            Ty::Int | Ty::Bool | Ty::Unknown => "int".to_string(),
            Ty::Float => "double".to_string(),
            Ty::Char => "char".to_string(),
            Ty::Str => "char*".to_string(),
            Ty::List => "List".to_string(),
            Ty::StrList => "StringList".to_string(),
            Ty::Array(_) => "Array*".to_string(),
            Ty::ArrayValue(_) => "Array".to_string(),
            Ty::Pointer => "void*".to_string(),
            Ty::Handle => "intptr_t".to_string(),
            Ty::Struct(name) => name.clone(),
            // `struct Name*` stays valid inside the struct's own definition
            Ty::Ref(inner) => match inner.as_ref() {
                Ty::Struct(name) => format!("struct {}*", name),
                other => format!("{}*", other.c_type()),
            },
            Ty::Void | Ty::Extern => "void".to_string(),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Ty::Float)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Ty::Str)
    }

    /// Plain scalars that take part in arithmetic.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Ty::Int | Ty::Float | Ty::Bool | Ty::Char | Ty::Handle | Ty::Unknown
        )
    }

    /// Single-register values: numbers, strings and raw pointers.
    pub fn is_scalar(&self) -> bool {
        self.is_numeric() || matches!(self, Ty::Str | Ty::Pointer)
    }

    /// Whether an expression of this type produces a value.
    pub fn has_value(&self) -> bool {
        !matches!(self, Ty::Void | Ty::Extern)
    }

    /// Struct name behind this type, with whether it is reached through a pointer.
    pub fn struct_name(&self) -> Option<(&str, bool)> {
        match self {
            Ty::Struct(name) => Some((name, false)),
            Ty::Ref(inner) => match inner.as_ref() {
                Ty::Struct(name) => Some((name, true)),
                _ => None,
            },
            _ => None,
        }
    }

    /// `Unknown` collapses to `Int` once a declaration needs a concrete type.
    pub fn or_default(self) -> Ty {
        match self {
            Ty::Unknown => Ty::Int,
            other => other,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Float => write!(f, "float"),
            Ty::Bool => write!(f, "bool"),
            Ty::Char => write!(f, "char"),
            Ty::Str => write!(f, "str"),
            Ty::List => write!(f, "list"),
            Ty::StrList => write!(f, "StringList"),
            Ty::Array(elem) => write!(f, "arr<{}>", elem),
            Ty::ArrayValue(elem) => write!(f, "array<{}>", elem),
            Ty::Pointer => write!(f, "pointer"),
            Ty::Handle => write!(f, "handle"),
            Ty::Struct(name) => write!(f, "{}", name),
            Ty::Ref(inner) => write!(f, "&{}", inner),
            Ty::Void => write!(f, "void"),
            Ty::Extern => write!(f, "extern"),
            Ty::Unknown => write!(f, "unknown"),
        }
    }
}
