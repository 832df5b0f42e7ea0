use crate::mask::mapper::DisplayGeometry;
use crate::mask::types::{DisplayPoint, NativePoint, Polygon, Resolution, MIN_POLYGON_POINTS};

/// Pointer moves closer than this (in display pixels, per axis) to the last
/// recorded point are dropped.
pub const MIN_POINT_SPACING: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum DrawState {
    #[default]
    Idle,
    /// Freehand points in display space, oldest first.
    Drawing(Vec<DisplayPoint>),
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationSnapshot<'a> {
    pub polygons: &'a [Polygon],
    pub in_progress: &'a [DisplayPoint],
    pub geometry: DisplayGeometry,
}

/// Turns pointer input into native-space polygons for a single image context.
///
/// Every operation that changes what should be on screen bumps `revision`
/// exactly once; the host redraws when the revision moves.
#[derive(Debug, Default)]
pub struct MaskAnnotator {
    polygons: Vec<Polygon>,
    state: DrawState,
    geometry: DisplayGeometry,
    revision: u64,
}

fn far_enough(last: DisplayPoint, pos: DisplayPoint) -> bool {
    (last.x - pos.x).abs() > MIN_POINT_SPACING || (last.y - pos.y).abs() > MIN_POINT_SPACING
}

impl MaskAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing(_))
    }

    pub fn in_progress(&self) -> &[DisplayPoint] {
        match &self.state {
            DrawState::Drawing(points) => points,
            DrawState::Idle => &[],
        }
    }

    pub fn snapshot(&self) -> AnnotationSnapshot<'_> {
        AnnotationSnapshot {
            polygons: &self.polygons,
            in_progress: self.in_progress(),
            geometry: self.geometry,
        }
    }

    fn invalidate(&mut self) {
        self.revision += 1;
    }

    /// Native size of the frame currently shown, if any.
    pub fn native_size(&self) -> Option<Resolution> {
        let g = &self.geometry;
        if g.native_width == 0 || g.native_height == 0 {
            None
        } else {
            Some(Resolution::new(g.native_width, g.native_height))
        }
    }

    /// Called on viewport resize.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let g = &self.geometry;
        if g.viewport_width == width && g.viewport_height == height {
            return;
        }
        self.geometry = DisplayGeometry::recompute(g.native_width, g.native_height, width, height);
        self.invalidate();
    }

    /// Called when a frame arrives. A change of native size reprojects the
    /// committed polygons so they keep covering the same image regions.
    /// Zero-sized frames are ignored.
    pub fn set_native_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let old = self.geometry;
        if old.native_width == width && old.native_height == height {
            return;
        }
        self.rescale_polygons(width, height, old.native_width, old.native_height);
        self.set_native_geometry(width, height);
        self.invalidate();
    }

    fn set_native_geometry(&mut self, width: u32, height: u32) {
        let g = &self.geometry;
        self.geometry =
            DisplayGeometry::recompute(width, height, g.viewport_width, g.viewport_height);
    }

    /// Replaces the committed polygons with `polygons` authored against
    /// `resolution` and drops any shape being drawn. With a frame shown the
    /// polygons are reprojected onto its native size; otherwise `resolution`
    /// becomes the native size until a frame arrives.
    pub fn load(&mut self, polygons: Vec<Polygon>, resolution: Resolution) {
        self.polygons = polygons;
        self.state = DrawState::Idle;
        match self.native_size() {
            Some(native) => {
                self.rescale_polygons(
                    native.width,
                    native.height,
                    resolution.width,
                    resolution.height,
                );
            }
            None => self.set_native_geometry(resolution.width, resolution.height),
        }
        self.invalidate();
    }

    /// Committed polygons expressed against `target` instead of the current
    /// native size. With no native size known they are returned as they are.
    pub fn polygons_for(&self, target: Resolution) -> Vec<Polygon> {
        let mut out = self.polygons.clone();
        if let Some(native) = self.native_size() {
            rescale(&mut out, target.width, target.height, native.width, native.height);
        }
        out
    }

    pub fn pointer_down(&mut self, pos: DisplayPoint) {
        if self.geometry.is_degenerate() {
            return;
        }
        let seed = self.geometry.clamp_to_viewport(pos);
        self.state = DrawState::Drawing(vec![seed]);
        self.invalidate();
    }

    pub fn pointer_move(&mut self, pos: DisplayPoint, primary_held: bool) {
        if !primary_held || self.geometry.is_degenerate() {
            return;
        }
        let pos = self.geometry.clamp_to_viewport(pos);
        if self.push_spaced(pos) {
            self.invalidate();
        }
    }

    pub fn pointer_up(&mut self, pos: DisplayPoint) {
        if !self.is_drawing() {
            return;
        }
        let pos = self.geometry.clamp_to_viewport(pos);
        self.push_spaced(pos);

        if let DrawState::Drawing(points) = std::mem::take(&mut self.state) {
            if points.len() >= MIN_POLYGON_POINTS && !self.geometry.is_degenerate() {
                let native: Vec<NativePoint> =
                    points.iter().map(|p| self.geometry.to_native(*p)).collect();
                if let Some(polygon) = Polygon::new(native) {
                    self.polygons.push(polygon);
                }
            }
        }
        self.invalidate();
    }

    /// Appends `pos` to the in-progress sequence if it is far enough from the
    /// last recorded point.
    fn push_spaced(&mut self, pos: DisplayPoint) -> bool {
        let DrawState::Drawing(points) = &mut self.state else {
            return false;
        };
        match points.last() {
            Some(last) if !far_enough(*last, pos) => false,
            _ => {
                points.push(pos);
                true
            }
        }
    }

    pub fn delete_last(&mut self) {
        if self.polygons.pop().is_some() {
            self.invalidate();
        }
    }

    pub fn clear_all(&mut self) {
        self.polygons.clear();
        self.invalidate();
    }

    /// Rescales every committed polygon from `old` to `new` native dimensions,
    /// independently per axis, and makes `new` the native size. Equal or zero
    /// dimensions leave the annotator untouched.
    pub fn reproject_for_resolution(&mut self, new_w: u32, new_h: u32, old_w: u32, old_h: u32) {
        if self.rescale_polygons(new_w, new_h, old_w, old_h) {
            self.set_native_geometry(new_w, new_h);
            self.invalidate();
        }
    }

    fn rescale_polygons(&mut self, new_w: u32, new_h: u32, old_w: u32, old_h: u32) -> bool {
        rescale(&mut self.polygons, new_w, new_h, old_w, old_h)
    }
}

/// Per-axis integer rescale with floor rounding. Returns whether anything was
/// touched.
fn rescale(polygons: &mut [Polygon], new_w: u32, new_h: u32, old_w: u32, old_h: u32) -> bool {
    if (new_w, new_h) == (old_w, old_h) || [new_w, new_h, old_w, old_h].contains(&0) {
        return false;
    }
    let scale_axis = |v: i32, new: u32, old: u32| -> i32 {
        (v as i64 * new as i64).div_euclid(old as i64) as i32
    };
    for polygon in polygons.iter_mut() {
        polygon.map_points(|p| NativePoint {
            x: scale_axis(p.x, new_w, old_w),
            y: scale_axis(p.y, new_h, old_h),
        });
    }
    true
}
