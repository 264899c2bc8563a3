//! The host-API surface is data: a package of annotated stubs that
//! translates away into direct host calls.

use once_cell::sync::Lazy;

use jot_compiler::Compiler;
use jot_ir::{JsonLoader, Loader, Program};

static PROGRAM: Lazy<Program> = Lazy::new(|| {
    let path = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/host_surface.json"
    );
    JsonLoader::new(path).load(&[]).unwrap()
});

#[test]
fn host_surface_program_compiles_to_direct_host_calls() {
    let scripts = Compiler::new().compile_program(&PROGRAM).unwrap();
    assert_eq!(scripts.len(), 1);
    let source = &scripts[0].source;

    assert!(source.contains("var el = document.createElement(\"div\");"));
    assert!(source.contains("el.nodeName;"));
    assert!(source.contains("var body = document.body;"));
    assert!(
        !source.contains("pkg[\"dom\"]"),
        "the stub package translates away entirely"
    );
    assert!(
        !source.contains("var dom = "),
        "no import binding for a package that emitted nothing"
    );
    assert!(!source.contains("$mtab"), "omitted types register nothing");
}

#[test]
fn host_surface_output_is_stable() {
    let first = Compiler::new().compile_program(&PROGRAM).unwrap();
    let second = Compiler::new().compile_program(&PROGRAM).unwrap();
    assert_eq!(first[0].source, second[0].source);
}
