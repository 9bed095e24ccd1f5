//! `<product> config` — create the topology file interactively, or show it.

use anyhow::{Context, Result};
use clap::Args;
use deploy_common::{Host, Product, Role, Topology};
use dialoguer::{Confirm, Input, Select};

use crate::app::AppContext;
use crate::application::ports::TopologyStore;
use crate::commands::TopologyArgs;
use crate::domain::validate_topology;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub topology: TopologyArgs,

    /// Print the saved topology instead of starting the survey
    #[arg(long)]
    pub show: bool,
}

/// One host as answered in the survey, before numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAnswer {
    pub role: Role,
    pub address: String,
    pub ssh_port: u16,
    pub user: String,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, a prompt fails,
/// or the answers do not form a valid topology.
pub fn run(app: &AppContext, product: Product, args: &ConfigArgs) -> Result<()> {
    let store = args.topology.store(product);
    if args.show {
        return show(app, &store);
    }
    anyhow::ensure!(
        !app.non_interactive,
        "the configuration survey needs an interactive terminal; edit {} directly instead",
        store.path().display()
    );
    if store.path().exists()
        && !app.confirm(
            &format!("{} exists. Overwrite it?", store.path().display()),
            false,
        )?
    {
        app.output.info("Cancelled.");
        return Ok(());
    }

    let topology = survey(product)?;
    validate_topology(&topology)?;
    store.save(&topology)?;
    app.output
        .success(&format!("Saved topology to {}", store.path().display()));
    Ok(())
}

fn show(app: &AppContext, store: &impl TopologyStore) -> Result<()> {
    let topology = store.load()?;
    app.output.header(&store.path().display().to_string());
    app.output.kv("datacenter:", &topology.dc_name);
    app.output.kv("version:   ", &topology.binary_version);
    app.output.kv("gossip:    ", &topology.gossip_enabled.to_string());
    app.output.kv("tls:       ", &topology.tls_enabled.to_string());
    app.output.kv("acl:       ", &topology.acl_enabled.to_string());
    app.output.kv("ssh key:   ", &topology.ssh_key);
    for member in topology.all_hosts() {
        app.output.kv(&format!("{:<10}", member.agent_name()), &member.host.to_string());
    }
    Ok(())
}

fn survey(product: Product) -> Result<Topology> {
    let dc_name: String = Input::new()
        .with_prompt("Datacenter name")
        .default("dc1".to_string())
        .interact_text()
        .context("datacenter name")?;
    let binary_version: String = Input::new()
        .with_prompt(format!("{product} version"))
        .default(product.default_version().to_string())
        .interact_text()
        .context("version")?;
    let count: usize = Input::new()
        .with_prompt("Number of hosts")
        .default(3)
        .interact_text()
        .context("host count")?;

    let mut answers = Vec::with_capacity(count);
    for i in 1..=count {
        let address: String = Input::new()
            .with_prompt(format!("Host {i} address"))
            .interact_text()
            .context("host address")?;
        let ssh_port: u16 = Input::new()
            .with_prompt(format!("Host {i} SSH port"))
            .default(22)
            .interact_text()
            .context("ssh port")?;
        let user: String = Input::new()
            .with_prompt(format!("Host {i} user"))
            .default("root".to_string())
            .interact_text()
            .context("remote user")?;
        let role = Select::new()
            .with_prompt(format!("Host {i} role"))
            .items(&[Role::Server.as_str(), Role::Client.as_str()])
            .default(0)
            .interact()
            .context("host role")?;
        answers.push(HostAnswer {
            role: if role == 0 { Role::Server } else { Role::Client },
            address,
            ssh_port,
            user,
        });
    }

    let gossip_enabled = Confirm::new()
        .with_prompt("Enable gossip encryption?")
        .default(true)
        .interact()
        .context("gossip")?;
    let tls_enabled = Confirm::new()
        .with_prompt("Enable TLS?")
        .default(true)
        .interact()
        .context("tls")?;
    let acl_enabled = Confirm::new()
        .with_prompt("Enable ACL?")
        .default(false)
        .interact()
        .context("acl")?;
    let ssh_key: String = Input::new()
        .with_prompt("SSH private key")
        .default("~/.ssh/id_rsa".to_string())
        .interact_text()
        .context("ssh key")?;

    let (servers, clients) = number_hosts(answers);
    Ok(Topology {
        dc_name,
        binary_version,
        gossip_enabled,
        tls_enabled,
        acl_enabled,
        servers,
        clients,
        ssh_key,
    })
}

/// Split answers by role, numbering each role from 0 in answer order.
#[must_use]
pub fn number_hosts(answers: Vec<HostAnswer>) -> (Vec<Host>, Vec<Host>) {
    let mut servers = Vec::new();
    let mut clients = Vec::new();
    for answer in answers {
        let group = match answer.role {
            Role::Server => &mut servers,
            Role::Client => &mut clients,
        };
        let number = u32::try_from(group.len()).unwrap_or(u32::MAX);
        group.push(Host {
            address: answer.address,
            ssh_port: answer.ssh_port,
            user: answer.user,
            number,
        });
    }
    (servers, clients)
}
