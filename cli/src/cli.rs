//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};
use deploy_common::Product;
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;

/// Deploy Consul and Nomad clusters to plain hosts over SSH
#[derive(Parser)]
#[command(
    name = "nomad-deploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage a Consul cluster
    #[command(subcommand)]
    Consul(ProductCommand),

    /// Manage a Nomad cluster
    #[command(subcommand)]
    Nomad(ProductCommand),

    /// Show version
    Version,
}

/// Operations available for each product.
#[derive(Subcommand)]
pub enum ProductCommand {
    /// Install, configure and start the cluster
    Up(commands::up::UpArgs),

    /// Stop the agents and delete their configuration and data
    Remove(commands::remove::RemoveArgs),

    /// Create or show the topology file
    Config(commands::config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            yes,
            command,
            ..
        } = self;
        let app = AppContext::new(
            &AppFlags {
                output: OutputFlags { no_color, quiet },
                behaviour: BehaviourFlags { yes },
            },
            cancel,
        );
        match command {
            Command::Version => {
                commands::version::run();
                Ok(())
            }
            Command::Consul(cmd) => run_product(&app, Product::Consul, cmd).await,
            Command::Nomad(cmd) => run_product(&app, Product::Nomad, cmd).await,
        }
    }
}

async fn run_product(app: &AppContext, product: Product, cmd: ProductCommand) -> Result<()> {
    match cmd {
        ProductCommand::Up(args) => commands::up::run(app, product, &args).await,
        ProductCommand::Remove(args) => commands::remove::run(app, product, &args).await,
        ProductCommand::Config(args) => commands::config::run(app, product, &args),
    }
}
