use crate::mask::types::{DisplayPoint, NativePoint};

/// Fit-and-center mapping between a native frame and the viewport showing it.
///
/// The scale is uniform so shapes keep their proportions regardless of the
/// viewport's aspect ratio; the unused margin on the shorter axis is split
/// evenly into letterbox offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    pub native_width: u32,
    pub native_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub scale: f64,
    pub display_width: u32,
    pub display_height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Default for DisplayGeometry {
    fn default() -> Self {
        Self::recompute(0, 0, 0, 0)
    }
}

impl DisplayGeometry {
    /// Builds the geometry for a native frame shown inside a viewport.
    ///
    /// With no frame loaded (or a collapsed viewport) this yields an identity
    /// geometry with zero offsets; check [`is_degenerate`](Self::is_degenerate)
    /// before accepting pointer input.
    pub fn recompute(
        native_width: u32,
        native_height: u32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        if native_width == 0 || native_height == 0 || viewport_width == 0 || viewport_height == 0
        {
            return Self {
                native_width,
                native_height,
                viewport_width,
                viewport_height,
                scale: 1.0,
                display_width: native_width,
                display_height: native_height,
                offset_x: 0,
                offset_y: 0,
            };
        }

        let scale_w = viewport_width as f64 / native_width as f64;
        let scale_h = viewport_height as f64 / native_height as f64;
        let scale = scale_w.min(scale_h);

        let display_width = ((native_width as f64 * scale).round() as u32).min(viewport_width);
        let display_height = ((native_height as f64 * scale).round() as u32).min(viewport_height);

        Self {
            native_width,
            native_height,
            viewport_width,
            viewport_height,
            scale,
            display_width,
            display_height,
            offset_x: ((viewport_width - display_width) / 2) as i32,
            offset_y: ((viewport_height - display_height) / 2) as i32,
        }
    }

    /// Zero-offset geometry for a frame shown at a fixed scale factor, with
    /// the viewport sized exactly to the scaled frame.
    pub fn with_scale(native_width: u32, native_height: u32, scale: f64) -> Self {
        if native_width == 0 || native_height == 0 || scale.is_nan() || scale <= 0.0 {
            return Self::recompute(native_width, native_height, 0, 0);
        }

        let display_width = (native_width as f64 * scale).round() as u32;
        let display_height = (native_height as f64 * scale).round() as u32;

        Self {
            native_width,
            native_height,
            viewport_width: display_width,
            viewport_height: display_height,
            scale,
            display_width,
            display_height,
            offset_x: 0,
            offset_y: 0,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.native_width == 0
            || self.native_height == 0
            || self.viewport_width == 0
            || self.viewport_height == 0
    }

    pub fn to_display(&self, p: NativePoint) -> DisplayPoint {
        DisplayPoint {
            x: (p.x as f64 * self.scale).round() as i32 + self.offset_x,
            y: (p.y as f64 * self.scale).round() as i32 + self.offset_y,
        }
    }

    /// Inverse of [`to_display`](Self::to_display), clamped to the native
    /// frame so off-image input never yields off-image coordinates.
    pub fn to_native(&self, p: DisplayPoint) -> NativePoint {
        let x = ((p.x - self.offset_x) as f64 / self.scale).round() as i32;
        let y = ((p.y - self.offset_y) as f64 / self.scale).round() as i32;
        NativePoint {
            x: x.clamp(0, self.native_width as i32),
            y: y.clamp(0, self.native_height as i32),
        }
    }

    /// Snaps a raw pointer position onto the displayed image area, so clicks
    /// on the letterbox bars land on the nearest image edge.
    pub fn clamp_to_viewport(&self, p: DisplayPoint) -> DisplayPoint {
        DisplayPoint {
            x: p.x.clamp(self.offset_x, self.offset_x + self.display_width as i32),
            y: p.y.clamp(self.offset_y, self.offset_y + self.display_height as i32),
        }
    }
}
