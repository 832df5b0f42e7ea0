use crate::config::CameraRecord;
use crate::mask::MaskAnnotator;
use crate::render;
use crate::video::{self, FrameSource};
use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use opencv::{core, imgcodecs, imgproc};
use std::path::{Path, PathBuf};

/// Reads attempted per camera before giving up on getting a frame.
const MAX_READ_ATTEMPTS: usize = 25;

pub struct SnapshotStats {
    pub written: Vec<PathBuf>,
    pub failed: usize,
}

pub fn snapshot_file_name(record: &CameraRecord) -> String {
    format!("mask_{}_ch{}.png", record.ip, record.channel)
}

fn grab_frame(source: &mut dyn FrameSource) -> Result<core::Mat> {
    for _ in 0..MAX_READ_ATTEMPTS {
        if let Some(frame) = source.read_frame()? {
            return Ok(frame);
        }
    }
    Err(anyhow!("No frame after {} reads", MAX_READ_ATTEMPTS))
}

/// Draws a record's masks over `frame`, rescaled to the record's resolution.
pub fn render_masks(frame: &core::Mat, record: &CameraRecord) -> Result<core::Mat> {
    let res = record.resolution;

    let mut resized = core::Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        core::Size::new(res.width as i32, res.height as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let mut annotator = MaskAnnotator::new();
    annotator.set_viewport(res.width, res.height);
    annotator.load(record.polygons.clone(), res);
    render::compose(&resized, &annotator.snapshot())
}

fn export_one(record: &CameraRecord, out_dir: &Path) -> Result<PathBuf> {
    let mut source = video::connect_camera(record)?;
    let frame = grab_frame(source.as_mut())?;
    drop(source);

    let image = render_masks(&frame, record)?;
    let path = out_dir.join(snapshot_file_name(record));
    let params = core::Vector::<i32>::new();
    if !imgcodecs::imwrite(&path.to_string_lossy(), &image, &params)? {
        return Err(anyhow!("Failed to write {}", path.display()));
    }
    Ok(path)
}

/// Grabs one frame per camera, draws its masks and writes
/// `mask_{ip}_ch{channel}.png` into `out_dir`. Cameras that fail are logged
/// and skipped.
pub fn export_snapshots(cameras: &[CameraRecord], out_dir: &Path) -> Result<SnapshotStats> {
    std::fs::create_dir_all(out_dir)?;

    let pb = ProgressBar::new(cameras.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut stats = SnapshotStats {
        written: Vec::new(),
        failed: 0,
    };

    for record in cameras {
        pb.set_message(record.label());
        match export_one(record, out_dir) {
            Ok(path) => {
                tracing::info!("Wrote {}", path.display());
                stats.written.push(path);
            }
            Err(e) => {
                tracing::warn!("Snapshot of {} failed: {}", record.label(), e);
                stats.failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{NativePoint, Polygon, Resolution};
    use opencv::prelude::*;

    #[test]
    fn test_snapshot_file_name() {
        let record = CameraRecord::new("192.168.1.103", "admin", "pass123", "1");
        assert_eq!(snapshot_file_name(&record), "mask_192.168.1.103_ch1.png");
    }

    #[test]
    fn test_render_masks_uses_record_resolution() {
        let frame =
            core::Mat::new_rows_cols_with_default(360, 640, core::CV_8UC3, core::Scalar::all(255.0))
                .unwrap();
        let mut record = CameraRecord::new("10.0.0.1", "admin", "x", "1");
        record.resolution = Resolution::new(1280, 720);
        record.polygons = vec![Polygon::new(vec![
            NativePoint::new(0, 0),
            NativePoint::new(640, 0),
            NativePoint::new(640, 360),
            NativePoint::new(0, 360),
        ])
        .unwrap()];

        let image = render_masks(&frame, &record).unwrap();
        assert_eq!((image.cols(), image.rows()), (1280, 720));

        let inside = image.at_2d::<core::Vec3b>(100, 100).unwrap();
        assert!(inside.0[2] > inside.0[0]);
        let outside = image.at_2d::<core::Vec3b>(600, 1000).unwrap();
        assert_eq!(outside.0, [255, 255, 255]);
    }

    #[test]
    fn test_bad_channel_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let record = CameraRecord::new("10.0.0.1", "admin", "x", "0");
        let stats = export_snapshots(&[record], dir.path()).unwrap();
        assert!(stats.written.is_empty());
        assert_eq!(stats.failed, 1);
    }
}
