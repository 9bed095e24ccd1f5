//! `remove` workflow against fake adapters.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use anyhow::Result;
use deploy_common::{Product, Topology};
use nomad_deploy::application::services::fan_out::FanOut;
use nomad_deploy::application::services::orchestrator::{self, RemoveOptions};
use nomad_deploy::domain::{Cancelled, PhaseError};
use tokio_util::sync::CancellationToken;

use crate::fakes::{FakeTransport, RecordingReporter, topology};

async fn remove(transport: &FakeTransport, topo: &Topology, cancel: &CancellationToken) -> Result<()> {
    orchestrator::remove(
        transport,
        topo,
        RemoveOptions {
            reporter: &RecordingReporter::default(),
            product: Product::Consul,
            fan_out: FanOut::sequential(cancel),
        },
    )
    .await
}

#[tokio::test]
async fn remove_stops_services_then_deletes_configs_then_data() {
    let transport = FakeTransport::new();
    remove(&transport, &topology(2, 1), &CancellationToken::new())
        .await
        .expect("remove");

    let stop = "bash -c \"systemctl stop consul.service; systemctl disable consul.service; rm -f /etc/systemd/system/consul.service\"";
    let configs = "bash -c \"rm -rf /etc/consul.d/\"";
    let data = "bash -c \"rm -rf /opt/consul/\"";
    let expected: Vec<(String, String)> = [stop, configs, data]
        .into_iter()
        .flat_map(|command| {
            ["10.0.2.0", "10.0.1.0", "10.0.1.1"]
                .into_iter()
                .map(move |host| (host.to_string(), command.to_string()))
        })
        .collect();
    assert_eq!(transport.commands(), expected);
    assert!(transport.copies().is_empty());
}

#[tokio::test]
async fn failed_stop_keeps_configs_and_data() {
    let transport = FakeTransport::failing_on("10.0.2.0", "systemctl stop");
    let err = remove(&transport, &topology(1, 1), &CancellationToken::new())
        .await
        .expect_err("client stop fails");

    let phase_err = err.downcast_ref::<PhaseError>().expect("phase error");
    assert_eq!(phase_err.phase, "stop services");
    assert!(phase_err.completed.is_empty());
    assert_eq!(transport.commands().len(), 1);
}

#[tokio::test]
async fn failed_config_deletion_leaves_data_in_place() {
    let transport = FakeTransport::failing_on("10.0.1.0", "rm -rf /etc/consul.d/");
    remove(&transport, &topology(1, 1), &CancellationToken::new())
        .await
        .expect_err("config deletion fails");

    assert!(
        !transport
            .commands()
            .iter()
            .any(|(_, c)| c.contains("/opt/consul/"))
    );
}

#[tokio::test]
async fn cancelled_remove_touches_nothing() {
    let transport = FakeTransport::new();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = remove(&transport, &topology(1, 1), &cancel)
        .await
        .expect_err("cancelled");

    assert!(err.downcast_ref::<Cancelled>().is_some());
    assert!(transport.events().is_empty());
}
