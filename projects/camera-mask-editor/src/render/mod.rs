// Drawing the frame and its masks onto a viewport-sized canvas

use crate::mask::{AnnotationSnapshot, DisplayGeometry, DisplayPoint, Polygon};
use anyhow::Result;
use opencv::prelude::*;
use opencv::{core, imgproc};

/// Opacity of the mask fill.
pub const MASK_ALPHA: f64 = 0.2;
pub const OUTLINE_THICKNESS: i32 = 2;

fn mask_color() -> core::Scalar {
    // BGR
    core::Scalar::new(0.0, 0.0, 255.0, 0.0)
}

fn to_cv(p: DisplayPoint) -> core::Point {
    core::Point::new(p.x, p.y)
}

fn polygons_to_display(
    polygons: &[Polygon],
    g: &DisplayGeometry,
) -> core::Vector<core::Vector<core::Point>> {
    polygons
        .iter()
        .map(|poly| {
            poly.points()
                .iter()
                .map(|p| to_cv(g.to_display(*p)))
                .collect::<core::Vector<core::Point>>()
        })
        .collect()
}

/// Composes the frame scaled into the viewport with the committed masks and
/// the shape currently being drawn.
pub fn compose(frame: &core::Mat, snapshot: &AnnotationSnapshot<'_>) -> Result<core::Mat> {
    let g = snapshot.geometry;
    if g.is_degenerate() {
        let rows = g.viewport_height.max(1) as i32;
        let cols = g.viewport_width.max(1) as i32;
        return Ok(core::Mat::new_rows_cols_with_default(
            rows,
            cols,
            core::CV_8UC3,
            core::Scalar::all(0.0),
        )?);
    }

    let mut scaled = core::Mat::default();
    imgproc::resize(
        frame,
        &mut scaled,
        core::Size::new(g.display_width as i32, g.display_height as i32),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;

    let mut canvas = core::Mat::default();
    core::copy_make_border(
        &scaled,
        &mut canvas,
        g.offset_y,
        g.viewport_height as i32 - g.display_height as i32 - g.offset_y,
        g.offset_x,
        g.viewport_width as i32 - g.display_width as i32 - g.offset_x,
        core::BORDER_CONSTANT,
        core::Scalar::all(0.0),
    )?;

    if !snapshot.polygons.is_empty() {
        let shapes = polygons_to_display(snapshot.polygons, &g);

        let mut overlay = canvas.try_clone()?;
        imgproc::fill_poly(
            &mut overlay,
            &shapes,
            mask_color(),
            imgproc::LINE_AA,
            0,
            core::Point::new(0, 0),
        )?;

        let mut blended = core::Mat::default();
        core::add_weighted(
            &overlay,
            MASK_ALPHA,
            &canvas,
            1.0 - MASK_ALPHA,
            0.0,
            &mut blended,
            -1,
        )?;
        canvas = blended;

        imgproc::polylines(
            &mut canvas,
            &shapes,
            true,
            mask_color(),
            OUTLINE_THICKNESS,
            imgproc::LINE_AA,
            0,
        )?;
    }

    draw_in_progress(&mut canvas, snapshot.in_progress)?;

    Ok(canvas)
}

/// Open polyline through the recorded points, plus the closing edge once
/// there are enough points to form a polygon.
fn draw_in_progress(canvas: &mut core::Mat, points: &[DisplayPoint]) -> Result<()> {
    if points.len() < 2 {
        return Ok(());
    }

    let line: core::Vector<core::Point> = points.iter().map(|p| to_cv(*p)).collect();
    let lines = core::Vector::<core::Vector<core::Point>>::from_iter([line]);
    imgproc::polylines(
        canvas,
        &lines,
        false,
        mask_color(),
        OUTLINE_THICKNESS,
        imgproc::LINE_AA,
        0,
    )?;

    if points.len() > 2 {
        imgproc::line(
            canvas,
            to_cv(points[points.len() - 1]),
            to_cv(points[0]),
            mask_color(),
            OUTLINE_THICKNESS,
            imgproc::LINE_AA,
            0,
        )?;
    }

    Ok(())
}

/// Writes `text` with its baseline starting at `origin`.
pub fn draw_text(canvas: &mut core::Mat, text: &str, origin: core::Point) -> Result<()> {
    // Dark outline under the text
    imgproc::put_text(
        canvas,
        text,
        origin,
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        core::Scalar::all(0.0),
        3,
        imgproc::LINE_AA,
        false,
    )?;
    imgproc::put_text(
        canvas,
        text,
        origin,
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        core::Scalar::new(0.0, 255.0, 255.0, 0.0),
        1,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{MaskAnnotator, NativePoint, Resolution};

    fn frame(width: i32, height: i32) -> core::Mat {
        core::Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, core::Scalar::all(255.0))
            .unwrap()
    }

    #[test]
    fn test_compose_fills_viewport() {
        let mut annotator = MaskAnnotator::new();
        annotator.set_viewport(800, 600);
        annotator.set_native_size(1920, 1080);
        let square = Polygon::new(vec![
            NativePoint::new(0, 0),
            NativePoint::new(960, 0),
            NativePoint::new(960, 540),
            NativePoint::new(0, 540),
        ])
        .unwrap();
        annotator.load(vec![square], Resolution::new(1920, 1080));

        let canvas = compose(&frame(1920, 1080), &annotator.snapshot()).unwrap();
        let size = canvas.size().unwrap();
        assert_eq!((size.width, size.height), (800, 600));

        // Letterbox bar stays black
        let bar = canvas.at_2d::<core::Vec3b>(10, 400).unwrap();
        assert_eq!(bar.0, [0, 0, 0]);

        // Inside the mask the white frame is tinted towards red
        let masked = canvas.at_2d::<core::Vec3b>(200, 200).unwrap();
        assert!(masked.0[2] > masked.0[0]);

        // Outside the mask the frame is untouched
        let clear = canvas.at_2d::<core::Vec3b>(400, 700).unwrap();
        assert_eq!(clear.0, [255, 255, 255]);
    }

    #[test]
    fn test_compose_without_frame_size() {
        let mut annotator = MaskAnnotator::new();
        annotator.set_viewport(320, 240);
        let canvas = compose(&core::Mat::default(), &annotator.snapshot()).unwrap();
        let size = canvas.size().unwrap();
        assert_eq!((size.width, size.height), (320, 240));
    }
}
