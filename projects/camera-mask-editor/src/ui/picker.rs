use crate::mask::{DisplayGeometry, NativePoint};
use crate::render;
use crate::video;
use anyhow::{bail, Result};
use crossbeam::channel;
use opencv::prelude::*;
use opencv::{core, highgui, imgproc};
use std::path::Path;

pub const WINDOW_NAME: &str = "Scaled Image";

/// Native pixel under a click on the image shown at `geometry.scale`. The
/// division truncates, so a click names the pixel it lands in.
pub fn pick(geometry: &DisplayGeometry, x: i32, y: i32) -> NativePoint {
    let axis = |v: i32, native: u32| -> i32 {
        let v = (v as f64 / geometry.scale).floor() as i64;
        v.clamp(0, native as i64) as i32
    };
    NativePoint::new(
        axis(x, geometry.native_width),
        axis(y, geometry.native_height),
    )
}

/// Maps every queued click, oldest first, to its native pixel.
pub fn pick_all(
    geometry: &DisplayGeometry,
    clicks: impl IntoIterator<Item = (i32, i32)>,
) -> Vec<(core::Point, NativePoint)> {
    clicks
        .into_iter()
        .map(|(x, y)| (core::Point::new(x, y), pick(geometry, x, y)))
        .collect()
}

/// Shows `image` scaled by `scale` and prints the native pixel coordinate of
/// every left click until a key is pressed or the window is closed.
pub fn run(image: &Path, scale: f64) -> Result<()> {
    if scale.is_nan() || scale <= 0.0 {
        bail!("Scale must be positive, got {}", scale);
    }

    let frame = video::load_image(image)?;
    let size = frame.size()?;
    let geometry = DisplayGeometry::with_scale(size.width as u32, size.height as u32, scale);

    let mut scaled = core::Mat::default();
    imgproc::resize(
        &frame,
        &mut scaled,
        core::Size::new(geometry.display_width as i32, geometry.display_height as i32),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;

    highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
    let (tx, rx) = channel::unbounded();
    highgui::set_mouse_callback(
        WINDOW_NAME,
        Some(Box::new(move |event: i32, x: i32, y: i32, _flags: i32| {
            if event == highgui::EVENT_LBUTTONDOWN {
                let _ = tx.send((x, y));
            }
        })),
    )?;
    highgui::imshow(WINDOW_NAME, &scaled)?;

    loop {
        if highgui::wait_key(20)? >= 0 {
            break;
        }
        if highgui::get_window_property(WINDOW_NAME, highgui::WND_PROP_VISIBLE)? < 1.0 {
            break;
        }

        let picks = pick_all(&geometry, rx.try_iter());
        for (_, original) in &picks {
            println!("Original coordinates: ({}, {})", original.x, original.y);
        }

        // Only the latest click is labelled on screen
        if let Some((at, original)) = picks.last() {
            let mut annotated = scaled.try_clone()?;
            render::draw_text(
                &mut annotated,
                &format!("({}, {})", original.x, original.y),
                *at,
            )?;
            highgui::imshow(WINDOW_NAME, &annotated)?;
        }
    }

    highgui::destroy_all_windows()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_undoes_display_scale() {
        let g = DisplayGeometry::with_scale(1920, 1080, 0.5);
        assert_eq!(pick(&g, 0, 0), NativePoint::new(0, 0));
        assert_eq!(pick(&g, 480, 270), NativePoint::new(960, 540));
        assert_eq!(pick(&g, 960, 540), NativePoint::new(1920, 1080));

        // Truncates instead of rounding
        let g = DisplayGeometry::with_scale(704, 576, 2.0);
        assert_eq!(pick(&g, 101, 51), NativePoint::new(50, 25));
        assert_eq!(pick(&g, 1, 1), NativePoint::new(0, 0));

        let g = DisplayGeometry::with_scale(1920, 1080, 0.3);
        assert_eq!(pick(&g, 100, 100), NativePoint::new(333, 333));
        assert_eq!(pick(&g, 5000, -3), NativePoint::new(1920, 0));
    }

    #[test]
    fn test_pick_all_keeps_every_queued_click() {
        let g = DisplayGeometry::with_scale(1920, 1080, 0.5);
        let (tx, rx) = channel::unbounded();
        for click in [(10, 10), (20, 30), (400, 200)] {
            tx.send(click).unwrap();
        }

        let picks = pick_all(&g, rx.try_iter());
        let natives: Vec<NativePoint> = picks.iter().map(|(_, p)| *p).collect();
        assert_eq!(
            natives,
            vec![
                NativePoint::new(20, 20),
                NativePoint::new(40, 60),
                NativePoint::new(800, 400)
            ]
        );
        assert_eq!(picks[2].0, core::Point::new(400, 200));
        assert!(rx.try_recv().is_err());
    }
}
