mod commands;
mod core;
mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{Config, Overrides};
use kiln::application::ExecMode;

#[derive(Parser)]
#[command(name = "kiln", version)]
#[command(about = "Resolve, cache and run versioned command plugins", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Run plugins from this local directory instead of the cache
    #[arg(short, long, global = true, value_name = "DIR")]
    target_path: Option<PathBuf>,

    /// Run the plugin in a child process
    #[arg(long, global = true, conflicts_with = "in_process")]
    isolated: bool,

    /// Run the plugin linked into this binary
    #[arg(long, global = true)]
    in_process: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project
    Init {
        /// Directory name of the project
        project_name: Option<String>,

        /// Initialize even if the directory is not empty
        #[arg(short, long)]
        force: bool,
    },
    /// Any other command registered under [commands] in config.toml
    #[command(external_subcommand)]
    External(Vec<String>),
}

impl Cli {
    fn exec_mode(&self) -> Option<ExecMode> {
        match (self.isolated, self.in_process) {
            (true, _) => Some(ExecMode::Isolated),
            (_, true) => Some(ExecMode::InProcess),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let debug = cli.debug;

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            crate::core::error::report(&err, debug);
            1
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = Config::load(Overrides {
        debug: cli.debug,
        target_path: cli.target_path.clone(),
        exec_mode: cli.exec_mode(),
    })?;
    crate::core::logging::init(&config.log_level);
    tracing::debug!("kiln home: {}", config.kiln_home.display());

    if config.update_check {
        crate::core::update_check::notify(&config).await;
    }

    let (command, argv) = match cli.command {
        Commands::Init {
            project_name,
            force,
        } => ("init".to_string(), commands::init::argv(project_name, force)),
        Commands::External(args) => commands::dispatch::external_argv(args),
    };

    commands::dispatch::execute(&config, &command, argv).await
}
