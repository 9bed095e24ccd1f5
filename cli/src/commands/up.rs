//! `<product> up` — install, configure and start the cluster.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use deploy_common::{Product, Topology};

use crate::app::AppContext;
use crate::application::ports::{TemplateStore, TopologyStore};
use crate::application::services::fan_out::FanOut;
use crate::application::services::orchestrator::{self, AclRetry, UpOptions, UpReport};
use crate::commands::{ConnectionArgs, TopologyArgs};
use crate::infra::cert_tool::BinaryCertTool;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fetcher::{DEFAULT_RELEASES_URL, HttpArtifactFetcher};
use crate::infra::ssh::SshTransport;
use crate::infra::templates::{DirTemplates, EmbeddedTemplates};
use crate::infra::topology_store::expand_home;
use crate::output::{TerminalReporter, progress};

#[derive(Args, Debug, Clone)]
pub struct UpArgs {
    #[command(flatten)]
    pub topology: TopologyArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Base URL of the release mirror
    #[arg(long, env = "NOMAD_DEPLOY_RELEASES_URL", default_value = DEFAULT_RELEASES_URL)]
    pub releases_url: String,

    /// Read configuration templates from this directory instead of the built-in set
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Do not verify the release archive against its SHA256SUMS file
    #[arg(long)]
    pub skip_checksum: bool,
}

/// Run the up command.
///
/// # Errors
///
/// Returns an error if the topology cannot be loaded or any phase fails.
pub async fn run(app: &AppContext, product: Product, args: &UpArgs) -> Result<()> {
    let topology = args.topology.store(product).load()?;
    match &args.templates {
        Some(dir) => deploy(app, product, args, &topology, &DirTemplates::new(dir)).await,
        None => deploy(app, product, args, &topology, &EmbeddedTemplates::new(product)).await,
    }
}

async fn deploy(
    app: &AppContext,
    product: Product,
    args: &UpArgs,
    topology: &Topology,
    templates: &impl TemplateStore,
) -> Result<()> {
    let transport = SshTransport::new(
        TokioCommandRunner::default(),
        expand_home(&topology.ssh_key),
        Duration::from_secs(args.connection.ssh_timeout),
    );
    let bar = progress::download_bar(
        &app.output,
        &format!("{product} {}", topology.binary_version),
    );
    let mut fetcher = HttpArtifactFetcher::new(&args.releases_url).with_progress(bar.clone());
    if args.skip_checksum {
        fetcher = fetcher.without_checksum();
    }
    let tool = BinaryCertTool::new(TokioCommandRunner::default());
    let reporter = TerminalReporter::new(&app.output);

    app.output.header(&format!("Deploying {product} to {}", topology.dc_name));
    let result = orchestrator::up(
        &fetcher,
        &transport,
        templates,
        &tool,
        topology,
        UpOptions {
            reporter: &reporter,
            product,
            fan_out: FanOut::new(args.connection.parallel, &app.cancel),
            acl_retry: AclRetry::default(),
        },
    )
    .await;
    bar.finish_and_clear();

    let report = result?;
    print_report(app, product, &report);
    Ok(())
}

fn print_report(app: &AppContext, product: Product, report: &UpReport) {
    app.output.success(&format!("{product} cluster is up"));
    if !report.binary.installed.is_empty() {
        app.output
            .kv("binary installed:", &report.binary.installed.join(", "));
    }
    if !report.binary.skipped.is_empty() {
        app.output
            .kv("binary present: ", &report.binary.skipped.join(", "));
    }
    if report.gossip_key_generated {
        app.output.kv("gossip:         ", "encrypted");
    }
    if report.certificates > 0 {
        app.output
            .kv("certificates:   ", &report.certificates.to_string());
    }
    if let Some(token) = &report.acl_bootstrap {
        app.output.header("Your bootstrapped ACL token:");
        // Printed even in quiet mode: it is shown only once.
        println!("{token}");
    }
}
