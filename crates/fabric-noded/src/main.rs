mod config;
mod demo;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fabric_core::prelude::*;
use fabric_exec::{
    EchoGenerator, HandshakeServer, LoggingFulfillment, PooledExecutor, TcpPeerConnector,
};
use fabric_observe::{init_local_offset, init_logger, log_response, log_snapshot};
use fabric_prometheus::PrometheusMetrics;

use crate::config::DaemonConfig;

fn main() -> anyhow::Result<()> {
    // offset detection only works while the process is single-threaded
    init_local_offset();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let mut cfg = DaemonConfig::load(path.as_deref())?;
    demo::apply(&mut cfg);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?
        .block_on(run(cfg))
}

async fn run(cfg: DaemonConfig) -> anyhow::Result<()> {
    // 1) logger
    init_logger(&cfg.logger)?;
    info!(node = %cfg.node.node_id, regions = cfg.cluster.regions.len(), "starting");

    // 2) context: metrics + entropy
    let metrics = PrometheusMetrics::new()?;
    let ctx = ClusterContext::default().with_metrics(Arc::new(metrics.clone()));

    // 3) scheduler + sync loop
    let scheduler = Arc::new(ClusterScheduler::new(cfg.cluster.clone(), ctx.clone())?);
    let cancel = CancellationToken::new();
    let sync = scheduler.spawn_sync_loop(
        Duration::from_millis(cfg.cluster.sync_interval_ms),
        cancel.child_token(),
    );

    // 4) node + collaborators
    let executor = Arc::new(PooledExecutor::from_workers(cfg.node.workers)?);
    let node = Arc::new(
        NodeRuntime::new(
            cfg.node.clone(),
            Arc::new(EchoGenerator::new()),
            Arc::clone(&executor) as Arc<dyn Executor>,
        )
        .with_context(ctx)
        .with_scheduler(Arc::clone(&scheduler))
        .with_resolver(Arc::new(cfg.resolver()))
        .with_fulfillment(Arc::new(LoggingFulfillment))
        .with_connector(Arc::new(TcpPeerConnector::new(Duration::from_millis(
            cfg.node.peer_connect_timeout_ms,
        )))),
    );

    // 5) peer listener
    let hello = node.hello();
    let server = HandshakeServer::bind(&cfg.node.address(), &hello.node_id, &hello.public_key)
        .await
        .with_context(|| format!("binding {}", cfg.node.address()))?
        .with_registry(Arc::clone(node.peers()))
        .with_io_timeout(Duration::from_millis(cfg.node.peer_connect_timeout_ms));
    let listener = server.spawn(cancel.child_token());

    node.start();
    if !cfg.peers.is_empty() {
        let report = node.connect_peers(&cfg.peers).await;
        info!(connected = report.connected, failed = report.failed, "peers");
    }

    // 6) start-up tasks
    let mut set = JoinSet::new();
    for task in cfg.tasks.clone() {
        let node = Arc::clone(&node);
        set.spawn(async move { node.process(task).await });
    }
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(response) => log_response(&response),
            Err(e) => warn!(error = %e, "task worker failed"),
        }
    }

    // 7) run until ctrl-c
    if !cfg.exit_after_tasks {
        info!(address = %cfg.node.address(), "running; ctrl-c to stop");
        tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    }

    // 8) shutdown
    node.stop();
    executor.close();
    cancel.cancel();
    if let Err(e) = sync.await {
        warn!(error = %e, "sync loop ended abnormally");
    }
    match listener.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "peer listener failed"),
        Err(e) => warn!(error = %e, "peer listener ended abnormally"),
    }

    log_snapshot(&scheduler.sync());
    let status = node.status();
    info!(
        completed = status.tasks_completed,
        reputation = status.reputation,
        peers = status.peers,
        "stopped"
    );
    match metrics.encode_text() {
        Ok(text) => debug!(metrics = %text, "final metrics"),
        Err(e) => warn!(error = %e, "encoding metrics failed"),
    }
    Ok(())
}
