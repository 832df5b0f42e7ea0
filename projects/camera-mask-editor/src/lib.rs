//! Polygon mask editor for camera frames.
//!
//! `mask` holds the coordinate mapping and the annotator, `config` the flat
//! camera file, `video` the OpenCV frame sources, and `ui` the HighGUI front
//! ends built on top of them.

pub mod config;
pub mod error;
pub mod mask;
pub mod render;
pub mod snapshot;
pub mod ui;
pub mod video;
