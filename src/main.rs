//! sbxcg - binding generator for shadowblox classes
//!
//! ```text
//! sbxcg gen list                         # classes with generated artifacts
//! sbxcg gen generate Sound               # generate or refresh one class
//! sbxcg gen update-all                   # refresh every generated class
//! sbxcg gen check                        # exit 1 if anything would change
//! sbxcg gen modify Sound Play --add --virtual
//! sbxcg licenser                         # stamp license headers
//! ```

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sbx_codegen::{
    licenser, ApiDump, DiskTree, GenerationReport, MemberOptions, Settings, Workspace,
};

#[derive(Debug, Parser)]
#[command(name = "sbxcg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to ./sbxcg.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Class binding generation
    #[command(name = "gen", subcommand)]
    Gen(GenCommand),

    /// Stamp the license header onto source files
    #[command(name = "licenser")]
    Licenser(LicenserCommand),
}

#[derive(Debug, Subcommand)]
enum GenCommand {
    /// List classes with a complete artifact pair
    List,

    /// Generate or regenerate one class
    Generate {
        /// Class name as it appears in the API dump
        class: String,
    },

    /// Regenerate every generated class
    #[command(name = "update-all")]
    UpdateAll,

    /// Report artifacts that regeneration would change, without writing
    Check,

    /// Change one member's configuration and regenerate its class
    Modify(ModifyCommand),
}

#[derive(Debug, Args)]
struct ModifyCommand {
    class: String,
    member: String,

    /// Configure a member that has no entry yet
    #[arg(long, conflicts_with = "remove")]
    add: bool,

    /// Remove the member's entry
    #[arg(long)]
    remove: bool,

    /// Reuse another member's implementation
    #[arg(long, value_name = "MEMBER")]
    alias: Option<String>,

    #[arg(long = "virtual")]
    is_virtual: bool,

    /// Pure virtual (implies --virtual)
    #[arg(long)]
    pure: bool,

    #[arg(long = "const")]
    is_const: bool,

    /// Hand-written scripting wrapper
    #[arg(long)]
    custom: bool,

    #[arg(long)]
    virtual_get: bool,

    #[arg(long)]
    virtual_set: bool,
}

impl From<&ModifyCommand> for MemberOptions {
    fn from(cmd: &ModifyCommand) -> Self {
        MemberOptions {
            add: cmd.add,
            remove: cmd.remove,
            alias: cmd.alias.clone(),
            is_virtual: cmd.is_virtual,
            pure: cmd.pure,
            is_const: cmd.is_const,
            custom: cmd.custom,
            virtual_get: cmd.virtual_get,
            virtual_set: cmd.virtual_set,
        }
    }
}

#[derive(Debug, Args)]
struct LicenserCommand {
    /// Root to walk (defaults to the working directory)
    root: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "sbx_codegen=debug,sbxcg=debug"
    } else {
        "sbx_codegen=info,sbxcg=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn print_report(report: &GenerationReport) {
    for path in &report.written {
        println!("{}", path.display());
    }
    for path in &report.unchanged {
        println!("SKIP {}", path.display());
    }
}

fn run_gen(command: GenCommand, settings: &Settings) -> Result<()> {
    let dump = ApiDump::load(&settings.dump_path)
        .with_context(|| format!("loading API dump {}", settings.dump_path.display()))?;
    let tree = DiskTree::new(&settings.include_dir, &settings.source_dir);
    let mut workspace = Workspace::new(tree, &dump, settings);

    match command {
        GenCommand::List => {
            for name in workspace.list()? {
                println!("{}", name);
            }
        }
        GenCommand::Generate { class } => {
            let report = workspace
                .generate(&class)
                .with_context(|| format!("generating {}", class))?;
            print_report(&report);
        }
        GenCommand::UpdateAll => {
            let report = workspace.update_all()?;
            print_report(&report);
            if !report.is_success() {
                let names: Vec<&str> = report.failures.iter().map(|f| f.class.as_str()).collect();
                bail!("{} class(es) failed: {}", names.len(), names.join(", "));
            }
        }
        GenCommand::Check => {
            let report = workspace.check()?;
            for path in &report.drifted {
                println!("{}", path.display());
            }
            if !report.is_clean() {
                bail!(
                    "{} artifact(s) out of date, {} class(es) failed",
                    report.drifted.len(),
                    report.failures.len()
                );
            }
        }
        GenCommand::Modify(cmd) => {
            let options = MemberOptions::from(&cmd);
            let report = workspace
                .modify(&cmd.class, &cmd.member, &options)
                .with_context(|| format!("modifying {}.{}", cmd.class, cmd.member))?;
            print_report(&report);
        }
    }

    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("reading working directory")?;

    match cli.command {
        Command::Gen(command) => {
            let settings = Settings::discover(cli.config.as_deref(), &cwd)?;
            run_gen(command, &settings)
        }
        Command::Licenser(cmd) => {
            let root = cmd.root.unwrap_or(cwd);
            let report = licenser::stamp_tree(&root)
                .with_context(|| format!("stamping {}", root.display()))?;
            for path in &report.stamped {
                println!("{}", path.display());
            }
            println!("Done!");
            Ok(())
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
