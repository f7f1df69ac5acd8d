use clap::Parser;
use cvm_drv::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut host = stdout.lock();
    let mut diagnostics = stderr.lock();

    match cvm_drv::run(&cli, &mut host, &mut diagnostics) {
        Ok(code) => std::process::exit(code.into()),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
