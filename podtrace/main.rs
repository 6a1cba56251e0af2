use anyhow::Result;
use clap::Parser;
use podtrace_topology::{EventKind, KubeObserver, Observer, TopologyEvent};
use tokio::runtime::Builder;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub mod cli;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    let args = cli::Args::parse();

    podtrace_common::logging::initialize(&args.log_filter)?;
    info!("{APP_NAME} v{APP_VERSION} started");

    if let Err(error) = run_agent(&args) {
        error!("{APP_NAME} v{APP_VERSION} terminated with an error: {error}");
        Err(error)
    } else {
        info!("{APP_NAME} v{APP_VERSION} stopped");
        Ok(())
    }
}

fn run_agent(args: &cli::Args) -> Result<()> {
    let rt = Builder::new_multi_thread().enable_all().build()?;

    let mut observer = KubeObserver::new(rt.handle().clone(), args.observer_config());
    rt.block_on(observer.connect())?;

    let (events_tx, events_rx) = mpsc::channel(args.sink_capacity);
    let cancellation_token = CancellationToken::new();
    observer.run(events_tx, cancellation_token.clone())?;
    let consumer = rt.spawn(consume_events(events_rx));

    rt.block_on(wait_for_shutdown())?;

    cancellation_token.cancel();
    observer.close();
    podtrace_common::tasks::wait_for_task(Some(consumer), "event consumer");

    Ok(())
}

/// Drains observation events. This is where the kernel-side tracer gets driven;
/// until it is wired up the agent publishes the stream as structured log lines.
async fn consume_events(mut events: mpsc::Receiver<TopologyEvent>) {
    while let Some(event) = events.recv().await {
        let verb = match event.kind {
            EventKind::Start => "container started",
            EventKind::Stop => "container stopped",
        };

        info!(
            container = %event.container.id,
            pod = %event.container.pod,
            namespace = %event.container.namespace,
            name = %event.container.name,
            pid = event.container.pid,
            pid_namespace = event.container.pid_namespace,
            "{verb}"
        );
    }
}

/// Waits for SIGTERM (sent by systemd and the kubelet) or SIGINT (CTRL+C).
async fn wait_for_shutdown() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    Ok(())
}
