/*!
 * Signal Coordinator Host - Main Entry Point
 *
 * Demonstration host that:
 * - Mounts a configurable number of in-process filesystem sessions
 * - Registers each with the process signal coordinator
 * - Runs until SIGHUP, SIGINT or SIGTERM asks every session to stop
 * - Deregisters all sessions and reports whether dispositions were restored
 */

use anyhow::Context;
use std::ops::ControlFlow;
use tracing::{info, warn};

use sigcoord::signals::{global, init_global};
use sigcoord::{init_tracing, remove_signal_handlers, set_signal_handlers, HostConfig, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = HostConfig::from_env();
    if !init_global(config.coordinator) {
        warn!("Signal coordinator was initialised before the host configuration was applied");
    }
    let coordinator = global();

    info!(
        filesystems = config.filesystems,
        poll_ms = config.poll_interval.as_millis() as u64,
        ignore_broken_pipe = config.coordinator.ignore_broken_pipe,
        "Signal coordinator host starting"
    );

    let sessions: Vec<Session> = (0..config.filesystems)
        .map(|i| Session::new(format!("fs{}", i)))
        .collect();

    for session in &sessions {
        set_signal_handlers(coordinator, session)
            .with_context(|| format!("mounting {} failed", session.name()))?;
    }
    info!(
        registered = coordinator.registered_count(),
        pid = std::process::id(),
        "All filesystems mounted; send SIGINT, SIGTERM or SIGHUP to stop"
    );

    let mut tasks = Vec::with_capacity(sessions.len());
    for session in sessions.iter().cloned() {
        let poll_interval = config.poll_interval;
        tasks.push(tokio::spawn(async move {
            let exit = session
                .run(poll_interval, || ControlFlow::Continue(()))
                .await;
            (session, exit)
        }));
    }

    for task in tasks {
        let (session, exit) = task.await.context("session task panicked")?;
        info!(session = %session.name(), exit = ?exit, "Filesystem unmounting");
        if let Err(e) = remove_signal_handlers(coordinator, &session) {
            warn!(session = %session.name(), error = %e, "Failed to remove signal handlers");
        }
    }

    let stats = coordinator.stats();
    info!(
        stats = %serde_json::to_string(&stats).context("serialising coordinator stats")?,
        "Signal coordinator host stopped"
    );
    Ok(())
}
