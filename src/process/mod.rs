//! Zombie reaping for containerized init processes.
//!
//! Nothing here runs unless the host calls [`spawn_reaper`].

#[cfg(target_os = "linux")]
mod reaper;

#[cfg(target_os = "linux")]
pub use reaper::{reap_exited, spawn_reaper};
