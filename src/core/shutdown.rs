//! # OS termination signals for the frame pump.
//!
//! [`wait_for_shutdown_signal`] resolves with the name of the first
//! termination signal the process receives, so [`Pump`](crate::Pump) can log
//! why it stopped.
//!
//! | Platform | Signals |
//! |---|---|
//! | Unix | `SIGINT`, `SIGTERM`, `SIGQUIT` |
//! | other | Ctrl-C |

/// Waits for a termination signal and returns its name.
///
/// Listeners are installed on each call. Fails only if the OS refuses to
/// register a handler.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for Ctrl-C and returns its name.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
