use addonpack::{
    builder::{self, pipeline},
    config::BuildOverrides,
    utils::{
        path::resolve_project_root,
        signature::get_signature,
        version::get_version,
    },
};
use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io;

#[derive(Parser)]
#[command(name = "addonpack")]
#[command(author = "CaptionLocal Contributors")]
#[command(about = "Generate manifests and help pages, then package NVDA add-ons")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the add-on bundle and its store descriptor
    Build(BuildArgs),

    /// Only generate addon/manifest.ini and the translated manifests
    Manifest(BuildArgs),

    /// Only convert the readme files to HTML help pages
    Docs(BuildArgs),

    /// Remove generated manifests, help pages, bundle and store descriptor
    Clean(BuildArgs),
}

#[derive(Args, Clone)]
struct BuildArgs {
    /// Add-on project directory (defaults to the nearest parent with buildVars.toml)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Version string of this build, replacing [addon].version
    #[arg(long = "addon-version")]
    addon_version: Option<String>,

    /// Numeric version major.minor.patch (0.0.0 derives it from the version string)
    #[arg(long)]
    version_number: Option<String>,

    /// Development build: date-stamped version on the dev channel
    #[arg(long, default_value_t = false)]
    dev: bool,

    /// Update channel, replacing [addon].update_channel
    #[arg(long)]
    channel: Option<String>,
}

impl BuildArgs {
    fn overrides(&self) -> BuildOverrides {
        BuildOverrides {
            version: self.addon_version.clone(),
            version_number: self.version_number.clone(),
            dev: self.dev,
            channel: self.channel.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let version = get_version();
    let signature = get_signature(&version);

    let version_static: &'static str = Box::leak(format!("v{}", version).into_boxed_str());
    let signature_static: &'static str = Box::leak(signature.into_boxed_str());

    let mut cmd = Cli::command();
    cmd = cmd.version(version_static).before_help(signature_static);

    let raw_args: Vec<String> = std::env::args().collect();
    if raw_args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", signature_static);
        return Ok(());
    }

    let matches = cmd.get_matches();
    let cli = Cli::from_arg_matches(&matches).map_err(|e| io::Error::other(e.to_string()))?;

    let (args, step) = match cli.command {
        Commands::Build(args) => (args, Step::Build),
        Commands::Manifest(args) => (args, Step::Manifest),
        Commands::Docs(args) => (args, Step::Docs),
        Commands::Clean(args) => (args, Step::Clean),
    };

    let project = resolve_project_root(args.project.as_deref()).map_err(io::Error::other)?;
    let overrides = args.overrides();

    let res = tokio::task::spawn_blocking(move || run(step, &project, &overrides))
        .await
        .map_err(|e| io::Error::other(format!("Join error: {}", e)))?;

    if let Err(e) = res {
        return Err(io::Error::other(e));
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum Step {
    Build,
    Manifest,
    Docs,
    Clean,
}

fn run(step: Step, project: &Path, overrides: &BuildOverrides) -> addonpack::Result<()> {
    match step {
        Step::Build => {
            let out = builder::build_addon(project, overrides)?;
            println!("{}", out.bundle.display());
        }
        Step::Manifest => {
            let config = pipeline::load_config(project, overrides)?;
            pipeline::run_manifest_step(project, &config)?;
        }
        Step::Docs => {
            let config = pipeline::load_config(project, overrides)?;
            pipeline::run_docs_step(project, &config)?;
        }
        Step::Clean => {
            builder::clean_addon(project, overrides)?;
        }
    }
    Ok(())
}
