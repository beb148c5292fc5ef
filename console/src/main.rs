//! Fingerdoor - Entry Point
//!
//! Admin console for a fingerprint door terminal: door lock control,
//! fingerprint enrollment, and the attendance dashboard.

use std::collections::HashMap;
use std::env;

use fingerdoor::app::login::{manage_session, SessionCommand};
use fingerdoor::app::options::AppOptions;
use fingerdoor::app::run::run;
use fingerdoor::logs::{init_logging, LogOptions};
use fingerdoor::storage::layout::StorageLayout;
use fingerdoor::storage::settings::Settings;
use fingerdoor::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to print version: {e}"),
        }
        return;
    }

    let layout = match cli_args.get("home") {
        Some(home) => StorageLayout::new(home),
        None => StorageLayout::default(),
    };

    // Retrieve the settings file
    let settings = match Settings::load(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        log_dir: settings.log_to_file.then(|| layout.logs_dir()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = AppOptions::from_settings(&settings, layout);

    // Session management
    let command = if cli_args.contains_key("logout") {
        Some(SessionCommand::Logout)
    } else if cli_args.contains_key("login") {
        Some(SessionCommand::Login {
            username: cli_args.get("username").cloned().unwrap_or_default(),
            password: cli_args.get("password").cloned().unwrap_or_default(),
        })
    } else {
        None
    };
    if let Some(command) = command {
        match manage_session(&options, &command).await {
            Ok(Some(session)) => println!(
                "Logged in as {} ({})",
                session.username.as_deref().unwrap_or("admin"),
                session.role
            ),
            Ok(None) => println!("Logged out"),
            Err(e) => error!("{:#}", e),
        }
        return;
    }

    // Run the console
    info!("Running fingerdoor {} with options: {:?}", version.version, options);
    let result = run(options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the console: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Ctrl+C received, shutting down...");
    }
}
