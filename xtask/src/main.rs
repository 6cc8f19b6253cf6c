use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for framecore")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, deny, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny check
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run the batch sort and state minimizer benchmarks
    Bench,
    /// Run the headless demo scene
    Demo {
        /// Frames to run
        #[arg(short, long, default_value = "300")]
        frames: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_deny()?;
            run_doc()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Deny => run_deny()?,
        Commands::Doc => run_doc()?,
        Commands::Build => cargo("build", "build --workspace")?,
        Commands::Bench => cargo("bench", "bench -p framecore-render")?,
        Commands::Demo { frames } => run_demo(frames)?,
    }

    Ok(())
}

fn cargo(step: &str, args: &str) -> Result<()> {
    println!("==> Running cargo {args}");
    let status = Command::new("cargo")
        .args(args.split_whitespace())
        .status()?;
    if !status.success() {
        anyhow::bail!("cargo {step} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("fmt check", "fmt --all -- --check")
}

fn run_clippy() -> Result<()> {
    cargo("clippy", "clippy --workspace --all-targets -- -D warnings")
}

fn run_tests() -> Result<()> {
    cargo("test", "test --workspace")
}

fn run_deny() -> Result<()> {
    cargo("deny check", "deny check licenses bans sources")
}

fn run_doc() -> Result<()> {
    cargo("doc", "doc --workspace --no-deps")
}

fn run_demo(frames: u64) -> Result<()> {
    let args = format!("run -p framecore-cli -- run --frames {frames}");
    cargo("run", &args)
}
