//! Integration tests for the daemon and client.
//!
//! Runs a daemon on a background thread and talks to it over its socket.

use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use todex::{Client, Daemon, DaemonConfig, RepositoryError, is_daemon_running};

/// Start a daemon rooted at `root` and wait for its socket.
fn spawn_daemon(root: &Path, seed: bool) -> thread::JoinHandle<()> {
    let config = DaemonConfig::new(root)
        .with_seed(seed)
        .with_poll_interval(Duration::from_millis(5));
    let socket_path = config.socket_path();
    let daemon = Daemon::new(config).expect("Failed to create daemon");

    let handle = thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
        rt.block_on(daemon.run()).expect("Daemon failed");
        rt.shutdown_timeout(Duration::from_secs(1));
    });

    for _ in 0..200 {
        if socket_path.exists() {
            return handle;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("Daemon socket never appeared");
}

#[test]
fn test_client_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let handle = spawn_daemon(temp_dir.path(), false);
    let mut client = Client::connect(temp_dir.path(), false).unwrap();

    client.ping().unwrap();

    assert_eq!(client.add("Buy milk", false).unwrap(), "1");
    assert_eq!(client.add("Wash car", false).unwrap(), "2");

    let all = client.all().unwrap();
    assert_eq!(all.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["2", "1"]);

    let toggled = client.toggle("1").unwrap();
    assert!(toggled.done);

    let found = client.find("buy").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "1");

    client.remove("2").unwrap();
    assert_eq!(client.len().unwrap(), 1);

    client.shutdown().unwrap();
    handle.join().unwrap();
    assert!(!temp_dir.path().join("daemon.sock").exists());
}

#[test]
fn test_client_errors() {
    let temp_dir = TempDir::new().unwrap();
    let handle = spawn_daemon(temp_dir.path(), false);
    let mut client = Client::connect(temp_dir.path(), false).unwrap();

    let err = client.toggle("9").unwrap_err();
    assert_eq!(
        err.downcast_ref::<RepositoryError>(),
        Some(&RepositoryError::NotFound("9".to_string()))
    );

    let err = client.add("", false).unwrap_err();
    assert_eq!(err.to_string(), "title is required");

    // Removing an unknown id is not an error
    client.remove("9").unwrap();

    client.shutdown().unwrap();
    handle.join().unwrap();
}

#[test]
fn test_seeded_daemon_empty_find_lists_all() {
    let temp_dir = TempDir::new().unwrap();
    let handle = spawn_daemon(temp_dir.path(), true);
    assert!(is_daemon_running(temp_dir.path()));

    let mut client = Client::connect(temp_dir.path(), false).unwrap();
    assert_eq!(client.find("").unwrap().len(), 4);
    assert_eq!(client.find("cat").unwrap().len(), 2);

    client.shutdown().unwrap();
    handle.join().unwrap();
}

#[test]
fn test_concurrent_clients() {
    let temp_dir = TempDir::new().unwrap();
    let handle = spawn_daemon(temp_dir.path(), false);

    let workers: Vec<_> = (0..8)
        .map(|w| {
            let root = temp_dir.path().to_path_buf();
            thread::spawn(move || {
                let mut client = Client::connect(&root, false).unwrap();
                for i in 0..10 {
                    client.add(&format!("Worker {} task {}", w, i), false).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let mut client = Client::connect(temp_dir.path(), false).unwrap();
    assert_eq!(client.len().unwrap(), 80);
    assert_eq!(client.find("worker").unwrap().len(), 80);

    client.shutdown().unwrap();
    handle.join().unwrap();
}

#[test]
fn test_connect_without_daemon_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(Client::connect(temp_dir.path(), false).is_err());
}
