mod cli;

use anyhow::{Context, Result};
use camera_mask_editor::config::{self, CameraRecord};
use camera_mask_editor::{snapshot, ui};
use cli::{Args, Command};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn load(path: &Path) -> Result<Vec<CameraRecord>> {
    let loaded = config::load_cameras(path)
        .with_context(|| format!("Failed to load camera config {}", path.display()))?;
    for warning in &loaded.warnings {
        eprintln!("line {}: {}", warning.line, warning.error);
    }
    Ok(loaded.cameras)
}

fn pick_camera(cameras: &[CameraRecord], index: usize) -> Result<&CameraRecord> {
    cameras.get(index).ok_or_else(|| {
        anyhow::anyhow!(
            "Camera index {} out of range ({} camera(s) loaded)",
            index,
            cameras.len()
        )
    })
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse_args();

    match args.command {
        Command::List { json } => {
            let cameras = load(&args.config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cameras)?);
            } else {
                for (idx, cam) in cameras.iter().enumerate() {
                    println!(
                        "{:>3}  {:<28} {:<10} {} polygon(s)",
                        idx,
                        cam.label(),
                        cam.resolution.to_string(),
                        cam.polygons.len()
                    );
                }
            }
        }
        Command::Edit {
            camera,
            image,
            poll_ms,
            window_width,
            window_height,
        } => {
            ui::editor::run(ui::editor::EditorOptions {
                config_path: args.config,
                camera,
                image,
                poll_interval: Duration::from_millis(poll_ms),
                window_width,
                window_height,
            })?;
        }
        Command::Snapshot { out_dir, camera } => {
            let cameras = load(&args.config)?;
            let selected = match camera {
                Some(index) => vec![pick_camera(&cameras, index)?.clone()],
                None => cameras,
            };
            let stats = snapshot::export_snapshots(&selected, &out_dir)?;
            println!(
                "Wrote {} snapshot(s) to {} ({} failed)",
                stats.written.len(),
                out_dir.display(),
                stats.failed
            );
        }
        Command::Pick { image, scale } => {
            ui::picker::run(&image, scale)?;
        }
        Command::StreamUrl {
            camera,
            show_password,
        } => {
            let cameras = load(&args.config)?;
            let cam = pick_camera(&cameras, camera)?;
            let address = if show_password {
                cam.stream_address()?
            } else {
                cam.redacted_stream_address()?
            };
            println!("{}", address);
        }
    }

    Ok(())
}
