//! Background daemon that owns a repository for the lifetime of a process.
//!
//! The store is purely in-memory, so the daemon is what lets separate CLI
//! invocations see the same todos. The daemon provides:
//! - One shared `Repository`, created at start-up and closed on shutdown
//! - A blocking worker per connection, all contending on the repository lock
//! - Caller-side conventions (empty search term lists all, titles required)

use crate::protocol::{Request, Response};
use crate::repository::{Repository, RepositoryError};
use chrono::Utc;
use eyre::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Socket file name within the root directory.
const SOCKET_FILE: &str = "daemon.sock";

/// PID file name within the root directory.
const PID_FILE: &str = "daemon.pid";

/// Default delay between accept attempts when no client is waiting.
const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Default directory for the socket and PID file.
pub fn default_root() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("todex")
}

/// Configuration for the daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Directory holding the socket and PID file
    pub root: PathBuf,

    /// Start with the demo todos
    pub seed: bool,

    /// Accept loop poll interval
    pub poll_interval: Duration,
}

impl DaemonConfig {
    /// Create config with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seed: false,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Seed the repository with demo todos on start-up.
    pub fn with_seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    /// Set the accept loop poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Get the socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.root.join(SOCKET_FILE)
    }

    /// Get the PID file path.
    pub fn pid_path(&self) -> PathBuf {
        self.root.join(PID_FILE)
    }
}

/// The todex daemon.
pub struct Daemon {
    config: DaemonConfig,
    repo: Arc<Repository>,
    shutdown: Arc<AtomicBool>,
}

impl Daemon {
    /// Create a new daemon instance.
    pub fn new(config: DaemonConfig) -> Result<Self> {
        fs::create_dir_all(&config.root).context("Failed to create daemon directory")?;

        let repo = Repository::new()?;
        if config.seed {
            repo.seed_demo(Utc::now()).context("Failed to seed demo todos")?;
        }

        Ok(Self {
            config,
            repo: Arc::new(repo),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared handle to the repository.
    pub fn repository(&self) -> Arc<Repository> {
        Arc::clone(&self.repo)
    }

    /// Get a shutdown handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Serve clients until a `Shutdown` request arrives, then close the
    /// repository.
    pub async fn run(&self) -> Result<()> {
        // Clean up any stale socket
        let socket_path = self.config.socket_path();
        if socket_path.exists() {
            fs::remove_file(&socket_path).ok();
        }

        let pid_path = self.config.pid_path();
        fs::write(&pid_path, std::process::id().to_string()).context("Failed to write PID file")?;

        let listener = UnixListener::bind(&socket_path).context("Failed to bind to Unix socket")?;
        listener
            .set_nonblocking(true)
            .context("Failed to set socket to non-blocking")?;

        log::info!("Daemon listening on {:?} ({} items)", socket_path, self.repo.len());

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, _)) => {
                    let repo = Arc::clone(&self.repo);
                    let shutdown = Arc::clone(&self.shutdown);
                    tokio::task::spawn_blocking(move || {
                        if let Err(e) = handle_connection(stream, &repo, &shutdown) {
                            log::warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }

        log::info!("Daemon shutting down");
        fs::remove_file(&socket_path).ok();
        fs::remove_file(&pid_path).ok();

        self.repo.close().context("Failed to close repository")?;
        Ok(())
    }
}

/// Serve one client connection until it hangs up or asks for shutdown.
fn handle_connection(stream: UnixStream, repo: &Repository, shutdown: &AtomicBool) -> Result<()> {
    stream.set_nonblocking(false)?;

    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    for line in reader.lines() {
        let line = line.context("Failed to read line")?;
        if line.is_empty() {
            continue;
        }

        let (response, is_shutdown) = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let is_shutdown = matches!(request, Request::Shutdown);
                (handle_request(repo, request, shutdown), is_shutdown)
            }
            Err(e) => (Response::error(format!("invalid request: {}", e)), false),
        };

        let response_json = serde_json::to_string(&response)?;
        writeln!(writer, "{}", response_json)?;
        writer.flush()?;

        if is_shutdown {
            break;
        }
    }

    Ok(())
}

/// Map a request onto the repository.
fn handle_request(repo: &Repository, request: Request, shutdown: &AtomicBool) -> Response {
    log::debug!("Request: {:?}", request);

    match request {
        Request::Add { title, done } => {
            if title.trim().is_empty() {
                return Response::error("title is required");
            }
            match repo.add(&title, done, Utc::now()) {
                Ok(id) => Response::Id { id },
                Err(e) => failure("adding todo", e),
            }
        }

        Request::Toggle { id } => match repo.toggle(&id) {
            Ok(item) => Response::Item { item },
            Err(e) => match e.downcast_ref::<RepositoryError>() {
                Some(RepositoryError::NotFound(_)) => Response::NotFound { id },
                _ => failure("toggling todo", e),
            },
        },

        Request::Remove { id } => match repo.remove(&id) {
            Ok(()) => Response::Ok,
            Err(e) => failure("removing todo", e),
        },

        Request::All => match repo.all() {
            Ok(items) => Response::Items { items },
            Err(e) => failure("listing todos", e),
        },

        Request::Find { term } => match repo.fetch(&term) {
            Ok(items) => Response::Items { items },
            Err(e) => failure("searching todos", e),
        },

        Request::Len => Response::Count { count: repo.len() },

        Request::Shutdown => {
            shutdown.store(true, Ordering::Relaxed);
            Response::Ok
        }

        Request::Ping => Response::Pong,
    }
}

fn failure(action: &str, e: eyre::Report) -> Response {
    log::error!("{}: {:?}", action, e);
    Response::error(e.to_string())
}

/// Check if a daemon is running for the given root.
pub fn is_daemon_running(root: &Path) -> bool {
    let config = DaemonConfig::new(root);
    let socket_path = config.socket_path();
    let pid_path = config.pid_path();

    if !socket_path.exists() {
        return false;
    }

    if let Ok(pid_str) = fs::read_to_string(&pid_path)
        && let Ok(pid) = pid_str.trim().parse::<i32>()
    {
        // Signal 0 only checks that the process exists
        unsafe {
            if libc::kill(pid, 0) == 0 {
                return true;
            }
        }
    }

    // Stale socket, clean up
    fs::remove_file(&socket_path).ok();
    fs::remove_file(&pid_path).ok();
    false
}

/// Start the daemon as a background process.
pub fn start_daemon(root: &Path) -> Result<()> {
    use std::process::Command;

    let exe = std::env::current_exe().context("Failed to get current executable")?;

    Command::new(exe)
        .arg("--dir")
        .arg(root)
        .arg("daemon")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .context("Failed to spawn daemon process")?;

    // Wait a bit for daemon to start
    std::thread::sleep(Duration::from_millis(100));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_repo() -> (Repository, AtomicBool) {
        let repo = Repository::new().unwrap();
        repo.add("Buy milk", false, Utc::now()).unwrap();
        repo.add("Wash car", false, Utc::now()).unwrap();
        (repo, AtomicBool::new(false))
    }

    #[test]
    fn test_daemon_config() {
        let config = DaemonConfig::new("/test/path");
        assert_eq!(config.socket_path(), PathBuf::from("/test/path/daemon.sock"));
        assert_eq!(config.pid_path(), PathBuf::from("/test/path/daemon.pid"));
        assert!(!config.seed);
        assert!(config.with_seed(true).seed);
    }

    #[test]
    fn test_daemon_creation_seeds() {
        let temp_dir = TempDir::new().unwrap();
        let config = DaemonConfig::new(temp_dir.path().join("run")).with_seed(true);
        let daemon = Daemon::new(config).unwrap();
        assert_eq!(daemon.repository().len(), 4);
        assert!(temp_dir.path().join("run").is_dir());
    }

    #[test]
    fn test_is_daemon_running_false() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_daemon_running(temp_dir.path()));
    }

    #[test]
    fn test_add_requires_title() {
        let (repo, shutdown) = setup_repo();
        let resp = handle_request(
            &repo,
            Request::Add {
                title: "  ".to_string(),
                done: false,
            },
            &shutdown,
        );
        assert!(matches!(resp, Response::Error { message } if message == "title is required"));
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_toggle_unknown_maps_to_not_found() {
        let (repo, shutdown) = setup_repo();
        let resp = handle_request(&repo, Request::Toggle { id: "99".to_string() }, &shutdown);
        assert!(matches!(resp, Response::NotFound { id } if id == "99"));
    }

    #[test]
    fn test_find_empty_term_lists_all() {
        let (repo, shutdown) = setup_repo();
        let resp = handle_request(&repo, Request::Find { term: String::new() }, &shutdown);
        match resp {
            Response::Items { items } => assert_eq!(items.len(), 2),
            other => panic!("unexpected response: {:?}", other),
        }

        let resp = handle_request(&repo, Request::Find { term: "zebra".to_string() }, &shutdown);
        assert!(matches!(resp, Response::Items { items } if items.is_empty()));
    }

    #[test]
    fn test_shutdown_sets_flag() {
        let (repo, shutdown) = setup_repo();
        let resp = handle_request(&repo, Request::Shutdown, &shutdown);
        assert!(matches!(resp, Response::Ok));
        assert!(shutdown.load(Ordering::Relaxed));
    }

    #[test]
    fn test_errors_after_close_are_reported() {
        let (repo, shutdown) = setup_repo();
        repo.close().unwrap();
        let resp = handle_request(&repo, Request::All, &shutdown);
        assert!(matches!(resp, Response::Error { .. }));
    }
}
