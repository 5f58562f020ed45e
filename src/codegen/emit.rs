//! Line buffers and compilation-unit assembly
//!
//! Lowering appends finished C lines to the innermost buffer of an
//! [`Emitter`]. Constructs with nested bodies push a fresh buffer, lower the
//! body into it, pop it, and splice the lines back indented inside braces, so
//! helper statements produced while lowering a sub-expression always land
//! right before the statement that needs them.

use crate::codegen::constants::{RUNTIME_HEADER, SOCKET_INCLUDES, SYSTEM_INCLUDES};

const INDENT: &str = "    ";

#[derive(Debug, Clone)]
pub struct Emitter {
    buffers: Vec<Vec<String>>,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter {
            buffers: vec![Vec::new()],
        }
    }
}

impl Emitter {
    pub fn new() -> Self {
        Emitter::default()
    }

    pub fn line(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::trace!("emit: {}", line);
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.push(line);
        }
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            self.line(line);
        }
    }

    /// Append `lines` one indentation level deeper than the current block.
    pub fn extend_indented(&mut self, lines: impl IntoIterator<Item = String>) {
        self.extend(indent(lines));
    }

    pub fn push_buffer(&mut self) {
        self.buffers.push(Vec::new());
    }

    /// Close the innermost buffer and hand back its lines.
    pub fn pop_buffer(&mut self) -> Vec<String> {
        if self.buffers.len() > 1 {
            self.buffers.pop().unwrap_or_default()
        } else {
            std::mem::take(&mut self.buffers[0])
        }
    }

    pub fn into_lines(mut self) -> Vec<String> {
        let mut lines = Vec::new();
        for buffer in self.buffers.drain(..) {
            lines.extend(buffer);
        }
        lines
    }
}

pub fn indent(lines: impl IntoIterator<Item = String>) -> impl Iterator<Item = String> {
    lines.into_iter().map(|line| {
        if line.is_empty() {
            line
        } else {
            format!("{}{}", INDENT, line)
        }
    })
}

/// Escape a Forge string for use inside a C string literal.
pub fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            // `%` is never escaped here: formats are built separately
            c => out.push(c),
        }
    }
    out
}

/// The pieces of a finished unit, in emission order.
#[derive(Debug, Default)]
pub struct UnitParts {
    pub struct_decls: Vec<Vec<String>>,
    pub prototypes: Vec<String>,
    pub function_defs: Vec<Vec<String>>,
    pub main_body: Vec<String>,
}

/// Render the complete C translation unit.
pub fn assemble_unit(parts: UnitParts) -> String {
    let mut out: Vec<String> = vec![
        "/* Generated by forgec. Do not edit. */".to_string(),
        String::new(),
    ];

    out.extend(SYSTEM_INCLUDES.iter().map(|h| format!("#include <{}>", h)));
    out.push("#ifndef _WIN32".to_string());
    out.extend(SOCKET_INCLUDES.iter().map(|h| format!("#include <{}>", h)));
    out.push("#endif".to_string());
    out.push(format!("#include \"{}\"", RUNTIME_HEADER));
    out.push(String::new());

    for decl in parts.struct_decls {
        out.extend(decl);
        out.push(String::new());
    }

    if !parts.prototypes.is_empty() {
        out.extend(parts.prototypes);
        out.push(String::new());
    }

    for def in parts.function_defs {
        out.extend(def);
        out.push(String::new());
    }

    out.push("int main(void) {".to_string());
    out.push(format!("{}srand((unsigned) time(NULL));", INDENT));
    out.extend(indent(parts.main_body));
    out.push(format!("{}return 0;", INDENT));
    out.push("}".to_string());

    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_buffers() {
        let mut emitter = Emitter::new();
        emitter.line("int a = 1;");
        emitter.push_buffer();
        emitter.line("a++;");
        let inner = emitter.pop_buffer();
        emitter.line("if (a) {");
        emitter.extend_indented(inner);
        emitter.line("}");
        assert_eq!(
            emitter.into_lines(),
            vec!["int a = 1;", "if (a) {", "    a++;", "}"]
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_c_string("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(escape_c_string("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_unit_layout() {
        let unit = assemble_unit(UnitParts {
            struct_decls: vec![vec!["typedef struct P {".into(), "    int x;".into(), "} P;".into()]],
            prototypes: vec!["int f(int a);".into()],
            function_defs: vec![vec!["int f(int a) {".into(), "    return a;".into(), "}".into()]],
            main_body: vec!["int x = f(1);".into()],
        });
        let typedef = unit.find("typedef struct P").unwrap();
        let proto = unit.find("int f(int a);").unwrap();
        let def = unit.find("int f(int a) {").unwrap();
        let main = unit.find("int main(void) {").unwrap();
        assert!(unit.find("#include \"forge_runtime.h\"").unwrap() < typedef);
        assert!(typedef < proto && proto < def && def < main);
        assert!(unit.contains("    int x = f(1);\n    return 0;\n}"));
    }
}
