//! Driver: wires the lexer, parser, code generator, and virtual machine
//! together behind a CLI, the way §6 of the design describes — "accepts a
//! source path and optional flags to dump the tree, the symbol tables, the
//! disassembly, and/or execute". Reading the source file off disk and the
//! console/host I/O the VM's syscalls write to are this crate's own
//! responsibility (the pipeline itself treats the source as an
//! already-in-memory `&str`); everything between tokenizing and halting
//! belongs to `cvm-lex`/`cvm-par`/`cvm-gen`/`cvm-vm`.

mod config;
mod dump;
mod error;

pub use config::{Cli, Config, DumpFlags};
pub use error::DriverError;

use std::io::Write;

use anyhow::Context;
use cvm_vm::VirtualMachine;

/// Exit code the process should use, mirroring §6: zero on successful
/// compile (+ run, if not `--no-run`), a distinct non-zero code per phase
/// otherwise, so a caller can tell "your program doesn't lex" from "your
/// program doesn't compile" from "your program crashed" by exit code alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    LexError = 1,
    ParseError = 2,
    CodegenError = 3,
    RuntimeError = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Run the full pipeline for one invocation: read the source, lex, parse,
/// generate, optionally execute. `host` receives VM syscall output;
/// `diagnostics` receives dump output and any error message. Returns the
/// process exit code to use.
pub fn run(
    cli: &Cli,
    host: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> anyhow::Result<ExitCode> {
    let config = Config::resolve(cli)?;
    let source = std::fs::read_to_string(&cli.source)
        .with_context(|| format!("reading source file {}", cli.source.display()))?;

    match compile_and_run(&source, &config, host, diagnostics) {
        Ok(()) => Ok(ExitCode::Success),
        Err(e) => {
            let _ = writeln!(diagnostics, "{}", e.diagnostic());
            let code = match &e {
                DriverError::Lex(_) => ExitCode::LexError,
                DriverError::Parse(_) => ExitCode::ParseError,
                DriverError::Codegen(_) => ExitCode::CodegenError,
                DriverError::Runtime(_) => ExitCode::RuntimeError,
            };
            Ok(code)
        }
    }
}

fn compile_and_run(
    source: &str,
    config: &Config,
    host: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> Result<(), DriverError> {
    let tokens = cvm_lex::Lexer::new(source).tokenize()?;
    if config.dump.tokens {
        let _ = write!(diagnostics, "{}", dump::render_tokens(&tokens));
    }

    let parsed = cvm_par::parse(source, tokens)?;
    if config.dump.ast {
        let _ = write!(diagnostics, "{}", dump::render_ast(&parsed.ast, parsed.root));
    }
    if config.dump.scopes {
        let _ = write!(diagnostics, "{}", dump::render_scopes(&parsed.scopes, parsed.root_scope));
    }

    let image = cvm_gen::generate(&parsed)?;
    if config.dump.disasm {
        let _ = write!(diagnostics, "{}", image.dump_words());
    }

    if !config.run {
        return Ok(());
    }

    let mut vm = VirtualMachine::new(config.mem_words);
    vm.load(&image)?;
    vm.run(host)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_for(path: &std::path::Path) -> Cli {
        Cli::parse_from(["cvm", path.to_str().unwrap()])
    }

    fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn factorial_program_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(
            &dir,
            "fact.c",
            "int main(){ int n; n=6; iput(fact(n)); return 0; } \
             int fact(int x){ if (x<=1) return 1; return x*fact(x-1); }",
        );
        let cli = cli_for(&path);
        let mut host = Vec::new();
        let mut diag = Vec::new();
        let code = run(&cli, &mut host, &mut diag).expect("pipeline runs");
        assert_eq!(code, ExitCode::Success);
        assert_eq!(host, b"720\n");
    }

    #[test]
    fn undefined_symbol_is_a_parse_error_with_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "bad.c", "int main(){ y = 1; return 0; }");
        let cli = cli_for(&path);
        let mut host = Vec::new();
        let mut diag = Vec::new();
        let code = run(&cli, &mut host, &mut diag).expect("pipeline returns a code, not an error");
        assert_eq!(code, ExitCode::ParseError);
        assert!(host.is_empty());
        assert!(!diag.is_empty());
    }

    #[test]
    fn missing_entry_point_is_a_codegen_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "noentry.c", "int foo(){ return 0; }");
        let cli = cli_for(&path);
        let mut host = Vec::new();
        let mut diag = Vec::new();
        let code = run(&cli, &mut host, &mut diag).unwrap();
        assert_eq!(code, ExitCode::CodegenError);
        assert!(host.is_empty());
    }

    #[test]
    fn no_run_flag_compiles_without_executing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "fact.c", "int main(){ iput(1); return 0; }");
        let mut cli = cli_for(&path);
        cli.no_run = true;
        let mut host = Vec::new();
        let mut diag = Vec::new();
        let code = run(&cli, &mut host, &mut diag).unwrap();
        assert_eq!(code, ExitCode::Success);
        assert!(host.is_empty());
    }

    #[test]
    fn dump_disasm_prints_the_entry_stub() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(&dir, "fact.c", "int main(){ return 0; }");
        let mut cli = cli_for(&path);
        cli.dump_disasm = true;
        cli.no_run = true;
        let mut host = Vec::new();
        let mut diag = Vec::new();
        run(&cli, &mut host, &mut diag).unwrap();
        let text = String::from_utf8(diag).unwrap();
        assert!(text.contains("0:"));
    }
}
