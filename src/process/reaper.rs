use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

/// Reap every exited child without blocking. Returns how many were collected.
pub fn reap_exited() -> usize {
    let mut reaped = 0;
    loop {
        let mut status: libc::c_int = 0;
        // SAFETY: WNOHANG never blocks and `status` outlives the call.
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
        if pid <= 0 {
            break;
        }
        tracing::trace!(pid, status, "reaped child process");
        reaped += 1;
    }
    reaped
}

/// Spawn a task that reaps exited children on every SIGCHLD.
///
/// Must be called from within a tokio runtime. Intended for processes running
/// as PID 1 in a container, where orphans are re-parented to us.
pub fn spawn_reaper() -> std::io::Result<JoinHandle<()>> {
    let mut sigchld = signal(SignalKind::child())?;
    tracing::info!("process reaper started");

    Ok(tokio::spawn(async move {
        // Children that exited before the handler was installed.
        reap_exited();
        while sigchld.recv().await.is_some() {
            let reaped = reap_exited();
            if reaped > 0 {
                tracing::debug!(reaped, "reaped exited children");
            }
        }
    }))
}
