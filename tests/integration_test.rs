// End-to-end tests: Forge source to a complete C unit

use forgec::codegen::GeneratorConfig;
use forgec::runtime::HEADERS;
use forgec::translate;

fn generate(source: &str) -> String {
    translate(source, GeneratorConfig::default()).expect("Translation failed")
}

#[test]
fn test_unit_layout_order() {
    let unit = generate(
        "struct P { x: int }\nfn getx(p: P) -> int { return p.x }\nlet p = P(3)\nprint(getx(p))",
    );

    let banner = unit.find("/* Generated by forgec").unwrap();
    let include = unit.find("#include \"forge_runtime.h\"").unwrap();
    let typedef = unit.find("typedef struct P {").unwrap();
    let prototype = unit.find("int getx(P p);").unwrap();
    let definition = unit.find("int getx(P p) {").unwrap();
    let main = unit.find("int main(void) {").unwrap();

    assert!(banner < include);
    assert!(include < typedef);
    assert!(typedef < prototype);
    assert!(prototype < definition);
    assert!(definition < main);
    assert!(unit.contains("    srand((unsigned) time(NULL));"));
    assert!(unit.trim_end().ends_with("    return 0;\n}"));
}

#[test]
fn test_failed_translation_produces_no_unit() {
    let source = "let a = 1\nprint(a)\nprint(undefined_fn(a))";
    assert!(translate(source, GeneratorConfig::default()).is_err());
}

#[test]
fn test_program_with_containers_and_builtins() {
    let source = r#"
        let names = @("ann", "bob")
        names.add("cy")
        let nums = @(1, 2.5)
        let grid = [4, 5, 6]
        let who = names[1]
        let n = len(names) + len(grid)
        let h = hash(who)
        let r = ri(1, 6)
        let x = number("12") + int(2.9)
        let f = float(x) / 2
        let s = string(f)
        write("out.txt", s)
        addto("out.txt", n, 1)
        print(names, nums, grid, who, n, h, r, x, f, s)
        printp(f, 2)
    "#;
    let unit = generate(source);

    for expected in [
        "StringList __l0 = string_list_create();",
        "string_list_add(&names, \"cy\");",
        "List __l1 = list_create();",
        "Array __a2 = array_create(sizeof(int), 3);",
        "char* who = string_list_get(&names, 1);",
        "int h = forge_hash(who);",
        "int r = forge_random_int(1, 6);",
        "char* s = forge_float_to_string(f);",
        "write_file(\"out.txt\", s, \"w\", 0);",
        "printf(\"%.*f\\n\", (int)(2), (double)(f));",
    ] {
        assert!(unit.contains(expected), "missing `{expected}` in\n{unit}");
    }
}

/// Every runtime symbol a unit calls is defined by one of the headers.
#[test]
fn test_runtime_calls_are_defined_in_headers() {
    let source = r#"
        let xs = @(1, 2)
        let ys = @("a")
        let arr = [1.5]
        xs.add(3)
        xs.remove(1)
        let i = xs.index(3)
        ys.remove("a")
        let j = ys.index("a")
        arr.add(2.5)
        let k = arr.index(2.5)
        arr.remove(1.5)
        let line = input("name? ")
        let c = line[0]
        let num = number(line)
        let fl = float(line)
        let p = 2 ^ 3
        let q = rf()
        let text = read("in.txt")
        print(xs, ys, arr, c, string(true), string(c), p, q, text)
        attempt { raise("bad") } rescue e { print(e) }
        xs.free()
        ys.free()
        arr.free()
    "#;
    let unit = generate(source);
    let headers: String = HEADERS.iter().map(|(_, contents)| *contents).collect();

    let mut checked = 0;
    let mut pieces = unit.split('(').peekable();
    while let Some(piece) = pieces.next() {
        if pieces.peek().is_none() {
            break;
        }
        let start = piece
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .map_or(0, |i| i + 1);
        let called = &piece[start..];
        let runtime = ["forge_", "list_", "string_list_", "array_"]
            .iter()
            .any(|prefix| called.starts_with(prefix))
            || called == "read_file"
            || called == "write_file";
        if runtime {
            checked += 1;
            assert!(
                headers.contains(&format!(" {}(", called)),
                "runtime function `{called}` is not defined"
            );
        }
    }
    assert!(checked > 20, "only {checked} runtime calls found");
}
