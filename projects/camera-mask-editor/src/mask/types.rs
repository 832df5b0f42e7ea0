// Mask data model
//
// Points come in two flavours: `NativePoint` lives in the pixel space of the
// unscaled frame, `DisplayPoint` in the pixel space of the viewport. The only
// way to move between them is through `mapper`.

use crate::error::MaskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum number of vertices for a committed polygon.
pub const MIN_POLYGON_POINTS: usize = 3;

/// A point in native image pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativePoint {
    pub x: i32,
    pub y: i32,
}

impl NativePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A point in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPoint {
    pub x: i32,
    pub y: i32,
}

impl DisplayPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A closed mask region in native coordinates. The edge from the last vertex
/// back to the first is implied.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Polygon(Vec<NativePoint>);

impl Polygon {
    /// Returns `None` when fewer than three points are given.
    pub fn new(points: Vec<NativePoint>) -> Option<Self> {
        if points.len() < MIN_POLYGON_POINTS {
            return None;
        }
        Some(Self(points))
    }

    pub fn points(&self) -> &[NativePoint] {
        &self.0
    }

    /// Applies `f` to every vertex. The vertex count is preserved.
    pub(crate) fn map_points(&mut self, f: impl Fn(NativePoint) -> NativePoint) {
        for p in self.0.iter_mut() {
            *p = f(*p);
        }
    }
}

/// Width and height of a native frame, written as `W*H` in config files.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Working resolutions offered by the editor, in cycle order.
    pub const PRESETS: [Resolution; 4] = [
        Resolution::new(1920, 1080),
        Resolution::new(1280, 720),
        Resolution::new(704, 576),
        Resolution::new(352, 288),
    ];

    /// The preset following `self`, wrapping around. Non-preset values jump to
    /// the first preset.
    pub fn next_preset(self) -> Self {
        match Self::PRESETS.iter().position(|r| *r == self) {
            Some(i) => Self::PRESETS[(i + 1) % Self::PRESETS.len()],
            None => Self::PRESETS[0],
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = MaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MaskError::ConfigParse {
            reason: format!("invalid resolution {:?}, expected WIDTH*HEIGHT", s),
        };

        let (w, h) = s.split_once('*').ok_or_else(invalid)?;
        let width: u32 = w.parse().map_err(|_| invalid())?;
        let height: u32 = h.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_requires_three_points() {
        let two = vec![NativePoint::new(0, 0), NativePoint::new(1, 1)];
        assert!(Polygon::new(two).is_none());

        let three = vec![
            NativePoint::new(0, 0),
            NativePoint::new(10, 0),
            NativePoint::new(10, 10),
        ];
        let poly = Polygon::new(three).unwrap();
        assert_eq!(poly.points().len(), 3);
    }

    #[test]
    fn test_resolution_parse() {
        let res: Resolution = "1280*720".parse().unwrap();
        assert_eq!(res, Resolution::new(1280, 720));
        assert_eq!(res.to_string(), "1280*720");

        assert!("1280x720".parse::<Resolution>().is_err());
        assert!("0*720".parse::<Resolution>().is_err());
        assert!("1280*".parse::<Resolution>().is_err());
        assert!("-5*10".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_preset_cycle() {
        let mut res = Resolution::default();
        let mut seen = vec![res];
        for _ in 0..3 {
            res = res.next_preset();
            seen.push(res);
        }
        assert_eq!(seen, Resolution::PRESETS.to_vec());
        assert_eq!(res.next_preset(), Resolution::default());
        assert_eq!(
            Resolution::new(640, 480).next_preset(),
            Resolution::PRESETS[0]
        );
    }
}
