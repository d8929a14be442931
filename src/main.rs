//! Todex CLI - an in-memory todo list served by a local daemon.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use todex::{Client, Daemon, DaemonConfig, Item, Progress, RepositoryError, default_root, is_daemon_running};

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("todex")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("todex.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn get_root_dir(cli: &Cli) -> PathBuf {
    cli.dir.clone().unwrap_or_else(default_root)
}

fn format_done(done: bool) -> ColoredString {
    if done { "[x]".green() } else { "[ ]".dimmed() }
}

fn print_items(items: &[Item], empty: &str) {
    if items.is_empty() {
        println!("{}", empty.dimmed());
        return;
    }

    for item in items {
        println!(
            "{} {} {} {}",
            format_done(item.done),
            item.id.cyan(),
            item.title,
            item.created.format("%Y-%m-%d %H:%M").to_string().dimmed()
        );
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = get_root_dir(&cli);

    match cli.command {
        Command::Add { title, done } => {
            let mut client = Client::connect(&root, true)?;
            let id = client.add(&title, done).context("Failed to add todo")?;
            println!("{} Added: {} {}", "✓".green(), id.cyan(), title);
        }

        Command::Toggle { id } => {
            let mut client = Client::connect(&root, true)?;
            match client.toggle(&id) {
                Ok(item) => println!("{} {} {}", format_done(item.done), item.id.cyan(), item.title),
                Err(e) if matches!(e.downcast_ref::<RepositoryError>(), Some(RepositoryError::NotFound(_))) => {
                    eprintln!("{} Todo not found: {}", "✗".red(), id);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.wrap_err("Failed to toggle todo")),
            }
        }

        Command::Remove { id } => {
            let mut client = Client::connect(&root, true)?;
            client.remove(&id).context("Failed to remove todo")?;
            println!("{} Removed: {}", "✓".green(), id.cyan());
        }

        Command::List => {
            let mut client = Client::connect(&root, true)?;
            let items = client.all().context("Failed to list todos")?;
            print_items(&items, "No todos");

            if !items.is_empty() {
                let progress = Progress::of(&items);
                println!(
                    "{} {}/{} done ({}%)",
                    "→".blue(),
                    progress.done,
                    progress.total,
                    progress.percent()
                );
            }
        }

        Command::Find { term } => {
            let mut client = Client::connect(&root, true)?;
            let items = client.find(&term).context("Failed to search todos")?;
            print_items(&items, "No matching todos");
        }

        Command::Count => {
            let mut client = Client::connect(&root, true)?;
            println!("{}", client.len().context("Failed to count todos")?);
        }

        Command::Daemon { seed } => {
            println!("{} Starting daemon in {}", "→".blue(), root.display());

            let config = DaemonConfig::new(&root).with_seed(seed);
            let daemon = Daemon::new(config).context("Failed to create daemon")?;

            let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
            let result = rt.block_on(daemon.run());
            rt.shutdown_timeout(Duration::from_secs(1));
            result.context("Daemon error")?;
        }

        Command::DaemonStop => {
            if !is_daemon_running(&root) {
                println!("{} Daemon is not running", "✗".red());
                std::process::exit(1);
            }

            let mut client = Client::connect(&root, false).context("Failed to connect to daemon")?;
            client.shutdown().context("Failed to shutdown daemon")?;
            println!("{} Daemon stopped", "✓".green());
        }

        Command::DaemonStatus => {
            if is_daemon_running(&root) {
                println!("{} Daemon is running", "✓".green());

                if let Ok(mut client) = Client::connect(&root, false)
                    && client.ping().is_ok()
                {
                    println!("  {} Responding to requests", "✓".green());
                    if let Ok(count) = client.len() {
                        println!("  {} {} todo(s) in memory", "→".blue(), count);
                    }
                }
            } else {
                println!("{} Daemon is not running", "✗".red());
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
