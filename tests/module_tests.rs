// Module loading: search paths, qualification and call resolution

use std::fs;
use std::path::Path;

use forgec::codegen::{ForgeError, GeneratorConfig, ModuleResolutionError};
use forgec::translate;
use tempfile::TempDir;

fn module_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Temp dir creation failed");
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

fn config(dir: &Path) -> GeneratorConfig {
    GeneratorConfig::default().with_search_path(dir)
}

#[test]
fn test_loading_twice_registers_once() {
    let dir = module_dir(&[("math.forge", "fn sum(a, b) => a + b\n")]);
    let unit = translate(
        "load \"math.forge\"\nload \"math.forge\"\nlet s = sum(1, 2)",
        config(dir.path()),
    )
    .unwrap();

    assert_eq!(unit.matches("int math_sum(int a, int b);").count(), 1);
    assert_eq!(unit.matches("int math_sum(int a, int b) {").count(), 1);
    assert!(unit.contains("int s = math_sum(1, 2);"));
}

#[test]
fn test_qualified_bare_and_suffix_calls() {
    let dir = module_dir(&[(
        "shapes.forge",
        "fn circle_area(r) -> float => 3.14 * r * r\nfn shapes_unit() => 1\n",
    )]);
    let source = r#"
        load "shapes.forge"
        let a = shapes.circle_area(2.0)
        let b = circle_area(1.0)
        let c = area(3.0)
        let u = unit()
    "#;
    let unit = translate(source, config(dir.path())).unwrap();

    assert!(unit.contains("double shapes_circle_area(double r) {"));
    assert!(unit.contains("double a = shapes_circle_area(2.0);"));
    assert!(unit.contains("double b = shapes_circle_area(1.0);"));
    assert!(unit.contains("double c = shapes_circle_area(3.0);"));
    // Already-qualified names are not prefixed twice
    assert!(unit.contains("int shapes_unit(void) {"));
    assert!(unit.contains("int u = shapes_unit();"));
}

#[test]
fn test_forward_references_inside_module() {
    let dir = module_dir(&[("chain.forge", "fn first() => second() + 1\nfn second() => 41\n")]);
    let unit = translate("load \"chain.forge\"\nprint(first())", config(dir.path())).unwrap();

    assert!(unit.contains("int chain_first(void) {\n    return (chain_second() + 1);\n}"));
    assert!(unit.contains("printf(\"%d\\n\", chain_first());"));
}

#[test]
fn test_local_function_takes_precedence_over_alias() {
    let dir = module_dir(&[("lib.forge", "fn greet() => \"from lib\"\n")]);
    let source = "load \"lib.forge\"\nfn greet() => \"local\"\nprint(greet())";
    let unit = translate(source, config(dir.path())).unwrap();

    assert!(unit.contains("printf(\"%s\\n\", greet());"));
    assert!(unit.contains("char* lib_greet(void) {"));
}

#[test]
fn test_module_structs_and_top_level_statements() {
    let dir = module_dir(&[(
        "geo.forge",
        "struct Vec2 { x: float, y: float }\nlet origin = Vec2(0.0, 0.0)\nfn norm1(v: Vec2) => v.x + v.y\n",
    )]);
    let source = "load \"geo.forge\"\nlet v = Vec2(1.0, 2.0)\nprint(norm1(v), origin.x)";
    let unit = translate(source, config(dir.path())).unwrap();

    assert!(unit.contains("typedef struct Vec2 {"));
    assert!(unit.contains("double geo_norm1(Vec2 v) {"));
    // Module statements run where the load appears, before the caller's code
    let origin = unit.find("Vec2 origin = ").expect("module statement emitted");
    let v = unit.find("Vec2 v = ").expect("caller statement emitted");
    assert!(origin < v);
    assert!(unit.contains("geo_norm1(v), origin.x);"));
}

#[test]
fn test_nested_loads_resolve_from_search_path() {
    let dir = module_dir(&[
        ("outer.forge", "load \"inner.forge\"\nfn twice(x) => double_it(x)\n"),
        ("lib/inner.forge", "fn double_it(x) => x * 2\n"),
    ]);
    let config = config(dir.path()).with_search_path(dir.path().join("lib"));
    let unit = translate("load \"outer.forge\"\nprint(twice(4))", config).unwrap();

    assert!(unit.contains("int inner_double_it(int x) {"));
    assert!(unit.contains("return inner_double_it(x);"));
    assert!(unit.contains("printf(\"%d\\n\", outer_twice(4));"));
}

#[test]
fn test_source_directory_searched_first() {
    let dir = module_dir(&[("helpers.forge", "fn seven() => 7\n")]);
    let config = GeneratorConfig::default().with_source_file(&dir.path().join("main.forge"));
    let unit = translate("load \"helpers.forge\"\nlet n = seven()", config).unwrap();
    assert!(unit.contains("int n = helpers_seven();"));
}

#[test]
fn test_missing_module_lists_searched_directories() {
    let dir = module_dir(&[]);
    match translate("load \"nowhere.forge\"", config(dir.path())).unwrap_err() {
        ForgeError::ModuleResolution(ModuleResolutionError::NotFound { path, searched }) => {
            assert_eq!(path, "nowhere.forge");
            assert!(searched.iter().any(|d| d == dir.path()));
        }
        other => panic!("Expected module not found, got {other:?}"),
    }
}

#[test]
fn test_module_path_needs_source_extension() {
    let dir = module_dir(&[("notes.txt", "fn f() => 1\n")]);
    assert!(matches!(
        translate("load \"notes.txt\"", config(dir.path())).unwrap_err(),
        ForgeError::ModuleResolution(ModuleResolutionError::InvalidExtension { .. })
    ));
}

#[test]
fn test_syntax_error_in_module_names_module() {
    let dir = module_dir(&[("broken.forge", "fn (a) => a\n")]);
    let err = translate("load \"broken.forge\"", config(dir.path())).unwrap_err();
    match &err {
        ForgeError::Syntax { module, .. } => assert_eq!(module.as_deref(), Some("broken.forge")),
        other => panic!("Expected syntax error, got {other:?}"),
    }
    assert!(err.to_string().starts_with("in module 'broken.forge': "));
}
