//! `<product> remove` — stop the agents and delete their files.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use deploy_common::Product;

use crate::app::AppContext;
use crate::application::ports::TopologyStore;
use crate::application::services::fan_out::FanOut;
use crate::application::services::orchestrator::{self, RemoveOptions};
use crate::commands::{ConnectionArgs, TopologyArgs};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::ssh::SshTransport;
use crate::infra::topology_store::expand_home;
use crate::output::TerminalReporter;

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub topology: TopologyArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Run the remove command.
///
/// # Errors
///
/// Returns an error if the topology cannot be loaded or a teardown step fails.
pub async fn run(app: &AppContext, product: Product, args: &RemoveArgs) -> Result<()> {
    let topology = args.topology.store(product).load()?;

    let prompt = format!(
        "Remove {product} from {} host(s) in {}? Configuration and data will be deleted.",
        topology.servers.len() + topology.clients.len(),
        topology.dc_name
    );
    if !app.non_interactive && !app.confirm(&prompt, false)? {
        app.output.info("Cancelled.");
        return Ok(());
    }

    let transport = SshTransport::new(
        TokioCommandRunner::default(),
        expand_home(&topology.ssh_key),
        Duration::from_secs(args.connection.ssh_timeout),
    );
    let reporter = TerminalReporter::new(&app.output);
    orchestrator::remove(
        &transport,
        &topology,
        RemoveOptions {
            reporter: &reporter,
            product,
            fan_out: FanOut::new(args.connection.parallel, &app.cancel),
        },
    )
    .await
}
