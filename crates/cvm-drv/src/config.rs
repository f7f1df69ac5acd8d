//! Command-line surface and the config file it can be layered under.
//!
//! CLI flags always win; a `--config` TOML file only supplies defaults for
//! whatever the command line didn't specify. This mirrors how the rest of
//! the toolchain treats configuration: one small, explicit, serde-backed
//! struct, no environment-variable magic beyond `RUST_LOG` (handled by
//! `tracing-subscriber` in `main`).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

/// Compile (and by default run) a source file on the stack machine.
#[derive(Parser, Debug)]
#[command(name = "cvm", version, about = "Compile and run a small C-like language on a 32-bit stack VM")]
pub struct Cli {
    /// Path to the source file.
    pub source: PathBuf,

    /// Print the token stream.
    #[arg(long)]
    pub dump_tokens: bool,

    /// Print the syntax tree.
    #[arg(long = "dump-tree")]
    pub dump_ast: bool,

    /// Print the resolved symbol tables.
    #[arg(long = "dump-symbols")]
    pub dump_scopes: bool,

    /// Print the generated image as a raw word dump.
    #[arg(long)]
    pub dump_disasm: bool,

    /// Compile only; do not execute the image.
    #[arg(long)]
    pub no_run: bool,

    /// Word count of VM memory. Defaults to the config file's value, or
    /// `cvm_vm::DEFAULT_MEM_WORDS` if there is no config file either.
    #[arg(long)]
    pub mem_words: Option<usize>,

    /// TOML file supplying defaults this command line doesn't override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity: `-v` for info, `-vv` for per-instruction trace.
    /// `RUST_LOG` is still honored when set and takes precedence over this.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output below `error`.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// The subset of [`Config`] a TOML file may supply.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct FileConfig {
    mem_words: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            mem_words: cvm_vm::DEFAULT_MEM_WORDS,
        }
    }
}

/// Which dumps the driver prints before running (or instead of running, if
/// `--no-run` was also given).
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpFlags {
    pub tokens: bool,
    pub ast: bool,
    pub scopes: bool,
    pub disasm: bool,
}

/// Fully resolved configuration for one driver invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub mem_words: usize,
    pub dump: DumpFlags,
    pub run: bool,
}

impl Config {
    /// Layer `cli` over an optional `--config` TOML file.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&text)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => FileConfig::default(),
        };

        Ok(Self {
            mem_words: cli.mem_words.unwrap_or(file_config.mem_words),
            dump: DumpFlags {
                tokens: cli.dump_tokens,
                ast: cli.dump_ast,
                scopes: cli.dump_scopes,
                disasm: cli.dump_disasm,
            },
            run: !cli.no_run,
        })
    }
}
