//! Build driver: load the indexed program, compile, write scripts.

use std::path::PathBuf;

use anyhow::{Context, Result};

use jot_compiler::{Compiler, Script};
use jot_ir::JsonLoader;

use crate::args::BuildArgs;

/// Run a build. Returns the compiled scripts; the caller decides whether
/// to print or persist them.
pub fn build(args: &BuildArgs) -> Result<Vec<Script>> {
    let loader = JsonLoader::new(&args.program);
    let entries: Vec<&str> = args.entries.iter().map(String::as_str).collect();

    let compiler = Compiler::new();
    let scripts = compiler
        .compile(&loader, &entries)
        .with_context(|| format!("compiling {}", args.program.display()))?;
    Ok(scripts)
}

/// Write one `.js` file per script into the output directory. Returns the
/// written paths.
pub fn write_scripts(args: &BuildArgs, scripts: &[Script]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut written = Vec::with_capacity(scripts.len());
    for script in scripts {
        let path = args.out_dir.join(script_file_name(&script.path));
        std::fs::write(&path, &script.source)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote script");
        written.push(path);
    }
    Ok(written)
}

/// A filesystem-safe file name for an entry package path:
/// `github.com/acme/app` becomes `github.com_acme_app.js`.
fn script_file_name(entry_path: &str) -> String {
    let safe: String = entry_path
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{safe}.js")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::BuildArgs;
    use jot_ir::{Def, DefFlags, DefId, DefMeta, FuncDef, FuncSig, PackageDef, Program};
    use jot_ir::{Callee, Expr, Stmt};

    fn fixture_program() -> Program {
        let mut program = Program::new();

        program.insert(Def::Package(PackageDef {
            meta: DefMeta::new("greet", "greet", "greet"),
        }));

        let mut hello = DefMeta::new("greet.Hello", "Hello", "greet");
        hello.flags |= DefFlags::EXPORTED;
        program.insert(Def::Func(FuncDef {
            meta: hello,
            sig: FuncSig::default(),
            body: Some(vec![Stmt::ret(vec![Expr::str("hi")])]),
        }));

        let mut main = DefMeta::new("app.main", "main", "app");
        main.imports.insert("greet".into(), "greet".into());
        main.deps.push(DefId::new("greet.Hello"));
        program.insert(Def::Func(FuncDef {
            meta: main,
            sig: FuncSig::default(),
            body: Some(vec![Stmt::expr(Expr::Call {
                callee: Callee::Def {
                    id: DefId::new("greet.Hello"),
                },
                args: vec![],
                spread: false,
            })]),
        }));

        program.entries = vec!["app".into()];
        program
    }

    #[test]
    fn build_and_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let program_path = dir.path().join("program.json");
        let json = serde_json::to_string(&fixture_program()).unwrap();
        std::fs::write(&program_path, json).unwrap();

        let args = BuildArgs {
            program: program_path,
            entries: vec![],
            out_dir: dir.path().join("out"),
            print: false,
        };

        let scripts = build(&args).unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].path, "app");
        assert!(scripts[0].source.contains("pkg[\"greet\"]"));
        assert!(scripts[0].source.contains("greet.Hello()"));

        let written = write_scripts(&args, &scripts).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("app.js"));
        let on_disk = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(on_disk, scripts[0].source);
    }

    #[test]
    fn explicit_entry_overrides_program_entries() {
        let dir = tempfile::tempdir().unwrap();
        let program_path = dir.path().join("program.json");
        let json = serde_json::to_string(&fixture_program()).unwrap();
        std::fs::write(&program_path, json).unwrap();

        let args = BuildArgs {
            program: program_path,
            entries: vec!["nope".into()],
            out_dir: dir.path().to_path_buf(),
            print: false,
        };
        let err = build(&args).unwrap_err();
        assert!(format!("{err:#}").contains("nope"));
    }

    #[test]
    fn script_file_names_are_path_safe() {
        assert_eq!(
            script_file_name("github.com/acme/app"),
            "github.com_acme_app.js"
        );
        assert_eq!(script_file_name("app"), "app.js");
    }
}
