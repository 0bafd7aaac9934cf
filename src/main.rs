#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::process::ExitCode;

use clap::Parser;
use eframe::egui;
use tracing::{error, info};

use ssh_host_manager::app::{HostManagerApp, PendingConnect};
use ssh_host_manager::cli::Cli;
use ssh_host_manager::{Error, Result, launcher, logging};

const CREDITS: &str = "\
ssh-host-manager
  Desktop browser and editor for ~/.ssh/config.
  Built with egui/eframe, clap, tracing and serde_json.";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.credits {
        println!("{CREDITS}");
        return Ok(ExitCode::SUCCESS);
    }

    logging::init_logger(cli.verbose);

    // Release builds on Windows have no console; open one so a crash is readable
    #[cfg(all(windows, not(debug_assertions)))]
    {
        std::panic::set_hook(Box::new(|panic_info| {
            unsafe {
                winapi::um::consoleapi::AllocConsole();
            }
            eprintln!("Application panicked: {}", panic_info);
            eprintln!("\nPress Enter to exit...");
            let _ = std::io::stdin().read_line(&mut String::new());
        }));
    }

    let settings = cli.settings()?;
    info!(config = %settings.config_path.display(), "starting");

    let pending_connect = PendingConnect::default();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_active(true)
            .with_title("SSH Host Manager"),
        ..Default::default()
    };

    let app_slot = pending_connect.clone();
    eframe::run_native(
        "SSH Host Manager",
        options,
        Box::new(move |cc| Ok(Box::new(HostManagerApp::new(cc, settings, app_slot)))),
    )
    .map_err(|e| Error::Gui(e.to_string()))?;

    let Some(alias) = pending_connect.borrow_mut().take() else {
        return Ok(ExitCode::SUCCESS);
    };

    let status = launcher::connect(&alias)?;
    info!(alias = %alias, %status, "ssh exited");
    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}
