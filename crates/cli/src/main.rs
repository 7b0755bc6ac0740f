// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 P47H Team <https://p47h.com>

use app_utils::EngineSettings;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use warden_gateway::ExitCode;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about = "Manage vs Administer authorization engine", long_about = None)]
struct Cli {
    /// Engine settings file (TOML)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Enable the Overall/Manage permission regardless of settings
    #[arg(long, global = true)]
    manage_permission: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant document validation and decision explanations
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
    /// Plugin administration (requires Overall/Administer)
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },
    /// Filtered access to the global configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Who is acting, and under which grants
#[derive(Args)]
pub struct Acting {
    /// Grant document (TOML, or YAML by extension)
    #[arg(long)]
    pub grants: PathBuf,

    /// Acting user
    #[arg(long)]
    pub user: String,

    /// Group membership (repeatable)
    #[arg(long = "group")]
    pub groups: Vec<String>,
}

#[derive(Subcommand)]
enum PolicyCommands {
    /// Validate a grant document
    Check {
        /// Path to the grant document
        file: PathBuf,
    },
    /// Decide one check and show the grants behind it
    Explain {
        #[command(flatten)]
        acting: Acting,

        /// Permission, as Group/Name
        #[arg(long)]
        permission: String,

        /// Resource path (`/`, `job/<name>`, `computer/<name>`, ...)
        #[arg(long, default_value = "/")]
        resource: String,
    },
}

#[derive(Subcommand)]
enum PluginCommands {
    /// Disable plugins
    Disable {
        #[command(flatten)]
        acting: Acting,

        /// Plugin state file (TOML)
        #[arg(long)]
        plugins: PathBuf,

        /// Plugins to disable
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Enable plugins and their dependencies
    Enable {
        #[command(flatten)]
        acting: Acting,

        /// Plugin state file (TOML)
        #[arg(long)]
        plugins: PathBuf,

        /// Plugins to enable
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the fields visible to the acting user
    Show {
        #[command(flatten)]
        acting: Acting,

        /// Global configuration file (TOML)
        #[arg(long)]
        config: PathBuf,
    },
    /// Apply submitted values, keeping only editable fields
    Apply {
        #[command(flatten)]
        acting: Acting,

        /// Global configuration file (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Submitted values (TOML)
        #[arg(long)]
        submit: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match load_settings(&cli) {
        Ok(settings) => {
            if let Err(e) = app_utils::init_tracing(&settings.log.filter) {
                eprintln!("{} {e}", "warning:".yellow().bold());
            }
            run(cli.command, &settings).unwrap_or_else(|e| {
                eprintln!("{} {e:#}", "error:".red().bold());
                ExitCode::UnknownError
            })
        }
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::IllegalArgument
        }
    };

    std::process::exit(code.code());
}

fn load_settings(cli: &Cli) -> anyhow::Result<EngineSettings> {
    let mut settings = EngineSettings::load(cli.settings.as_deref())?;
    if cli.manage_permission {
        settings.features.manage_permission = true;
    }
    Ok(settings)
}

fn run(command: Commands, settings: &EngineSettings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Policy { command } => match command {
            PolicyCommands::Check { file } => commands::policy::check(&file, settings),
            PolicyCommands::Explain {
                acting,
                permission,
                resource,
            } => commands::policy::explain(&acting, settings, &permission, &resource),
        },
        Commands::Plugin { command } => match command {
            PluginCommands::Disable {
                acting,
                plugins,
                names,
            } => commands::plugin::disable(&acting, settings, &plugins, names),
            PluginCommands::Enable {
                acting,
                plugins,
                names,
            } => commands::plugin::enable(&acting, settings, &plugins, names),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show { acting, config } => {
                commands::config::show(&acting, settings, &config)
            }
            ConfigCommands::Apply {
                acting,
                config,
                submit,
            } => commands::config::apply(&acting, settings, &config, &submit),
        },
    }
}
