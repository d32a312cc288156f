use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "ymir")]
#[command(about = "Self-hosted module registry")]
#[command(version)]
pub struct Cli {
    #[arg(long, short, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Manage modules
    #[command(subcommand)]
    Module(ModuleCommand),

    /// Manage module versions
    #[command(subcommand)]
    Version(VersionCommand),

    /// Print the service discovery document
    Discovery,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ModuleCommand {
    /// Register a module, from a JSON file or interactively
    Add(FileArgs),

    /// List modules
    List {
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        namespace: Option<String>,
    },

    /// Show a module by id or {provider}/{namespace}/{name}
    Show { id_or_fqn: String },

    /// Delete a module by id or {provider}/{namespace}/{name}
    Delete {
        id_or_fqn: String,

        #[arg(long, help = "Delete the module's versions as well")]
        versions: bool,

        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum VersionCommand {
    /// Register a module version, from a JSON file or interactively
    Add(FileArgs),

    /// List the versions of a module given by id or {provider}/{namespace}/{name}
    List { module: String },

    /// Show a version by id or {provider}/{namespace}/{name}@{version}
    Show { id_or_fqn: String },

    /// Delete a version by id or {provider}/{namespace}/{name}@{version}
    Delete {
        id_or_fqn: String,

        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// Resolve the download location of {provider}/{namespace}/{name}@{version}
    Download { key: String },
}

#[derive(Debug, Clone, Args)]
pub struct FileArgs {
    #[arg(long, short, help = "JSON file holding the request")]
    pub file: Option<String>,
}
