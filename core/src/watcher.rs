//! Game-process liveness polling.
//!
//! A periodic task counts live processes matching the configured name set
//! and flips the shared liveness flag on transitions, invoking the presence
//! synchronizer's enter/leave hooks. Enumeration runs off the async
//! executor; a failed poll counts as "unchanged".

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sysinfo::{ProcessesToUpdate, System};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::presence::{PresenceClient, PresenceSync};

pub struct ProcessWatcher {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    running: Arc<AtomicBool>,
}

impl ProcessWatcher {
    /// Start polling. The watcher owns writes to `running`; the synchronizer
    /// only reads it.
    pub fn spawn<C>(
        sync: Arc<PresenceSync<C>>,
        running: Arc<AtomicBool>,
        process_names: Vec<String>,
        poll_interval: Duration,
    ) -> Self
    where
        C: PresenceClient + Send + 'static,
    {
        let watch_list: Vec<String> = process_names
            .into_iter()
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        let poll_interval = poll_interval.clamp(Duration::from_secs(1), Duration::from_secs(60));
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let flag = Arc::clone(&running);

        let task = tokio::spawn(async move {
            if watch_list.is_empty() {
                warn!("process watcher started with an empty name list; game never detected");
                return;
            }
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_running: Option<bool> = None;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        let names = watch_list.clone();
                        match tokio::task::spawn_blocking(move || count_matching(&names)).await {
                            Ok(count) => {
                                let now_running = count > 0;
                                if last_running != Some(now_running) {
                                    flag.store(now_running, Ordering::Relaxed);
                                    if now_running {
                                        info!("game process detected");
                                        sync.game_started();
                                    } else {
                                        info!("game process gone");
                                        sync.game_stopped();
                                    }
                                    last_running = Some(now_running);
                                }
                            }
                            Err(err) => {
                                warn!(%err, "process enumeration failed; treating as unchanged");
                            }
                        }
                    }
                }
            }
        });

        Self {
            shutdown,
            task,
            running,
        }
    }

    /// Current liveness flag (shared with the synchronizer).
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Signal shutdown and wait for any in-flight poll callback to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            error!(%err, "process watcher task failed");
        }
    }
}

fn count_matching(watch_list: &[String]) -> usize {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    system
        .processes()
        .values()
        .filter(|process| {
            let name = process.name().to_string_lossy().to_ascii_lowercase();
            let exe_name = process
                .exe()
                .and_then(|path| path.file_name())
                .map(|file| file.to_string_lossy().to_ascii_lowercase());
            name_matches(&name, exe_name.as_deref(), watch_list)
        })
        .count()
}

/// Case-insensitive match against the alias set, tolerant of a missing or
/// present `.exe` suffix on either side.
fn name_matches(name: &str, exe_name: Option<&str>, watch_list: &[String]) -> bool {
    watch_list.iter().any(|candidate| {
        let stripped = candidate.strip_suffix(".exe").unwrap_or(candidate);
        let name_stripped = name.strip_suffix(".exe").unwrap_or(name);
        if name_stripped == stripped {
            return true;
        }
        exe_name
            .map(|exe| exe.strip_suffix(".exe").unwrap_or(exe) == stripped)
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn matches_with_and_without_exe_suffix() {
        let watch = list(&["cs2.exe", "csgo"]);
        assert!(name_matches("cs2", None, &watch));
        assert!(name_matches("cs2.exe", None, &watch));
        assert!(name_matches("csgo.exe", None, &watch));
        assert!(!name_matches("cs3", None, &watch));
    }

    #[test]
    fn falls_back_to_the_executable_name() {
        let watch = list(&["cs2"]);
        assert!(name_matches("steam-runtime", Some("cs2.exe"), &watch));
        assert!(!name_matches("steam-runtime", Some("hl2.exe"), &watch));
        assert!(!name_matches("steam-runtime", None, &watch));
    }
}
