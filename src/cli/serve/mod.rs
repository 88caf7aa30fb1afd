//! HTTP API server for the performance tracker.
//!
//! `perftrack serve start` runs the server in the foreground or as a daemon;
//! `stop` and `status` manage it through a PID file.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use daemonize::Daemonize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod routes;
mod server;
pub mod types;

pub use server::{ApiServer, HttpRequest, HttpResponse};

use crate::config::ServerConfig;
use crate::db::Database;

#[derive(Args)]
pub struct ServeArgs {
    #[command(subcommand)]
    pub command: ServeCommands,
}

#[derive(Subcommand)]
pub enum ServeCommands {
    /// Start the API server
    Start {
        /// Port to listen on (overrides PERFTRACK_PORT and the server_port setting)
        #[arg(short, long)]
        port: Option<u16>,

        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,
    },
    /// Stop the API server
    Stop,
    /// Show server status
    Status,
}

/// Run the serve command.
pub fn run_serve(db: &Database, db_path: &Path, args: ServeArgs) -> Result<()> {
    match args.command {
        ServeCommands::Start { port, foreground } => {
            let mut config = ServerConfig::load(db)?;
            if let Some(port) = port {
                config.port = port;
            }
            let purged = db.purge_sessions(chrono::Utc::now())?;
            if purged > 0 {
                tracing::info!(purged, "removed expired sessions");
            }
            start_server(db_path, config, foreground)
        }
        ServeCommands::Stop => stop_server(),
        ServeCommands::Status => show_status(db),
    }
}

/// Start the API server.
fn start_server(db_path: &Path, config: ServerConfig, foreground: bool) -> Result<()> {
    if let Some(pid) = read_pid_file()? {
        if is_process_running(pid) {
            return Err(anyhow!("Server already running (PID {})", pid));
        }
        // Stale PID file
        remove_pid_file()?;
    }

    let port = config.port;

    if foreground {
        write_pid_file(std::process::id())?;

        let server = ApiServer::new(db_path.to_path_buf(), config);
        let shutdown = Arc::new(AtomicBool::new(false));
        ctrlc_handler(shutdown.clone());

        println!("Starting API server on port {}...", port);
        println!("Press Ctrl+C to stop");

        let result = server.start(shutdown);
        remove_pid_file()?;
        result?;
        println!("Server stopped");
    } else {
        let pid_path = pid_file_path()?;
        let log_path = log_file_path()?;

        if let Some(parent) = pid_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        // Parent exits after fork
        println!("Starting API daemon on port {}...", port);
        println!("Log file: {}", log_path.display());
        println!("Stop with: perftrack serve stop");

        let daemonize = Daemonize::new()
            .pid_file(&pid_path)
            .chown_pid_file(true)
            .working_directory(".")
            .stdout(log_file.try_clone()?)
            .stderr(log_file);

        match daemonize.start() {
            Ok(_) => {
                append_log(&log_path, &format!("API daemon started on port {}", port));

                let server = ApiServer::new(db_path.to_path_buf(), config);
                let shutdown = Arc::new(AtomicBool::new(false));
                ctrlc_handler(shutdown.clone());

                match server.start(shutdown) {
                    Ok(()) => append_log(&log_path, "API daemon stopped"),
                    Err(e) => append_log(&log_path, &format!("API daemon error: {}", e)),
                }
            }
            Err(e) => {
                return Err(anyhow!("Failed to daemonize: {}", e));
            }
        }
    }

    Ok(())
}

/// Stop the API server.
fn stop_server() -> Result<()> {
    match read_pid_file()? {
        Some(pid) => {
            if is_process_running(pid) {
                #[cfg(unix)]
                unsafe {
                    libc::kill(pid as i32, libc::SIGTERM);
                }
                println!("Sent stop signal to server (PID {})", pid);

                std::thread::sleep(std::time::Duration::from_millis(500));

                if !is_process_running(pid) {
                    remove_pid_file()?;
                    println!("Server stopped");
                } else {
                    println!("Server still running, may take a moment to stop");
                }
            } else {
                remove_pid_file()?;
                println!("Server was not running (stale PID file removed)");
            }
        }
        None => {
            println!("Server is not running");
        }
    }
    Ok(())
}

/// Show server status.
fn show_status(db: &Database) -> Result<()> {
    println!("Server Status");
    println!("─────────────");

    match read_pid_file()? {
        Some(pid) if is_process_running(pid) => {
            println!("Status:       Running (PID {})", pid);
            if let Ok(log_path) = log_file_path() {
                if log_path.exists() {
                    println!("Log file:     {}", log_path.display());
                }
            }
        }
        Some(_) => {
            println!("Status:       Stopped (stale PID file)");
        }
        None => {
            println!("Status:       Stopped");
        }
    }

    let config = ServerConfig::load(db)?;
    println!("Port:         {}", config.port);
    println!("Sessions:     {} day(s)", config.session_days);
    println!("Employees:    {}", db.count_employees()?);

    Ok(())
}

fn append_log(log_path: &Path, message: &str) {
    if let Ok(mut f) = OpenOptions::new().append(true).open(log_path) {
        let _ = writeln!(
            f,
            "[{}] {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
    }
}

fn state_dir() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
    Ok(config_dir.join("perftrack"))
}

fn pid_file_path() -> Result<PathBuf> {
    Ok(state_dir()?.join("perftrack.pid"))
}

fn log_file_path() -> Result<PathBuf> {
    Ok(state_dir()?.join("perftrack.log"))
}

fn write_pid_file(pid: u32) -> Result<()> {
    let path = pid_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, pid.to_string())?;
    Ok(())
}

fn read_pid_file() -> Result<Option<u32>> {
    let path = pid_file_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(content.trim().parse().ok())
}

fn remove_pid_file() -> Result<()> {
    let path = pid_file_path()?;
    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(())
}

fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::kill(pid as i32, 0) == 0 }
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

fn ctrlc_handler(shutdown: Arc<AtomicBool>) {
    let _ = ctrlc::set_handler(move || {
        tracing::info!("received Ctrl+C, shutting down");
        shutdown.store(true, Ordering::SeqCst);
    });
}
