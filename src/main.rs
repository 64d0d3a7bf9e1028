// SPDX-License-Identifier: GPL-3.0-only

use bookscan::backends::camera::default_backend;
use bookscan::session::{NoticeHub, ScanSessionController, SessionNotice};
use bookscan::{Config, Ean13Decoder, SessionError};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookscan")]
#[command(about = "Camera-driven ISBN barcode capture for bulk library import")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Scan book barcodes; Ctrl-C finishes the session and prints the list
    Scan {
        /// Camera device path (e.g. /dev/video0)
        #[arg(short, long)]
        device: Option<String>,

        /// Milliseconds between decode attempts
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Disable the confirmation tone
        #[arg(long)]
        no_tone: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=bookscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => list_cameras(),
        Commands::Scan {
            device,
            interval_ms,
            no_tone,
        } => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(run_scan(device, interval_ms, no_tone)),
    }
}

fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let backend = default_backend();
    let devices = backend.enumerate();
    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }
    for device in devices {
        println!("{}\t{}", device.path, device.name);
    }
    Ok(())
}

async fn run_scan(
    device: Option<String>,
    interval_ms: Option<u64>,
    no_tone: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if device.is_some() {
        config.camera.device_path = device;
    }
    if let Some(ms) = interval_ms {
        config.decode_interval_ms = ms;
    }
    if no_tone {
        config.tone_enabled = false;
    }

    let notices = NoticeHub::new();
    notices.subscribe(|notice| match notice {
        SessionNotice::ItemScanned { isbn } => println!("  + {}", isbn),
        SessionNotice::Duplicate { isbn } => println!("  = {} already scanned", isbn),
        SessionNotice::Rejected { input, reason } => println!("  ! {:?}: {}", input, reason),
        SessionNotice::CameraFailed(e) => println!("  x {}", e),
    });

    let scan_rows = config.scan_rows;
    let mut controller = ScanSessionController::new(
        default_backend(),
        Box::new(move || Box::new(Ean13Decoder::new(scan_rows))),
        notices,
        &config,
    );

    match controller.start() {
        Ok(()) => println!("Scanning. Hold a book barcode in front of the camera."),
        Err(SessionError::Camera(e)) => {
            // The session stays usable for manual entry after a camera error
            println!("Camera unavailable ({}). Manual entry only.", e);
        }
        Err(e) => return Err(e.into()),
    }
    println!("Type an ISBN and press Enter for manual entry; Ctrl-C to finish.");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = rx.recv() => match line {
                Some(line) => {
                    let entry = line.trim();
                    if !entry.is_empty() {
                        // Outcome feedback arrives through the notice hub
                        let _ = controller.submit_manual(entry);
                    }
                }
                None => break,
            },
        }
    }

    let isbns = controller.complete()?;
    println!();
    println!(
        "Session finished at {} with {} ISBN(s):",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        isbns.len()
    );
    for isbn in &isbns {
        println!("{}", isbn);
    }
    Ok(())
}
