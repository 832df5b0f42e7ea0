use crate::config::{self, CameraRecord};
use crate::mask::{DisplayPoint, MaskAnnotator, Resolution};
use crate::render;
use crate::video::{self, Session};
use anyhow::{Context, Result};
use crossbeam::channel;
use opencv::prelude::*;
use opencv::{core, highgui, imgproc};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const WINDOW_NAME: &str = "Camera Mask Editor";

const HELP: &str =
    "n/p camera  k connect  d delete last  c clear  r resolution  s store  w write  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down(DisplayPoint),
    Move {
        pos: DisplayPoint,
        primary_held: bool,
    },
    Up(DisplayPoint),
}

/// Translates a HighGUI mouse callback into a pointer event. Only the left
/// button draws.
pub fn pointer_event(event: i32, x: i32, y: i32, flags: i32) -> Option<PointerEvent> {
    let pos = DisplayPoint::new(x, y);
    match event {
        highgui::EVENT_LBUTTONDOWN => Some(PointerEvent::Down(pos)),
        highgui::EVENT_MOUSEMOVE => Some(PointerEvent::Move {
            pos,
            primary_held: flags & highgui::EVENT_FLAG_LBUTTON != 0,
        }),
        highgui::EVENT_LBUTTONUP => Some(PointerEvent::Up(pos)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    NextCamera,
    PrevCamera,
    Connect,
    DeleteLast,
    ClearAll,
    CycleResolution,
    StoreCamera,
    WriteConfig,
    Quit,
}

pub fn key_action(key: i32) -> Option<KeyAction> {
    if key < 0 {
        return None;
    }
    match (key & 0xFF) as u8 {
        b'n' => Some(KeyAction::NextCamera),
        b'p' => Some(KeyAction::PrevCamera),
        b'k' => Some(KeyAction::Connect),
        b'd' => Some(KeyAction::DeleteLast),
        b'c' => Some(KeyAction::ClearAll),
        b'r' => Some(KeyAction::CycleResolution),
        b's' => Some(KeyAction::StoreCamera),
        b'w' => Some(KeyAction::WriteConfig),
        b'q' | 27 => Some(KeyAction::Quit),
        _ => None,
    }
}

pub struct EditorOptions {
    pub config_path: PathBuf,
    /// Index into the camera list, in file order.
    pub camera: Option<usize>,
    pub image: Option<PathBuf>,
    pub poll_interval: Duration,
    pub window_width: u32,
    pub window_height: u32,
}

/// Editor state behind the HighGUI window: the camera list, the selected
/// record, the frame on screen and the annotator drawing over it.
pub struct Editor {
    config_path: PathBuf,
    cameras: Vec<CameraRecord>,
    selected: Option<usize>,
    working_resolution: Resolution,
    annotator: MaskAnnotator,
    frame: Option<core::Mat>,
    session: Session,
    status: String,
    revision: u64,
}

impl Editor {
    pub fn new(config_path: PathBuf, cameras: Vec<CameraRecord>, poll_interval: Duration) -> Self {
        Self {
            config_path,
            cameras,
            selected: None,
            working_resolution: Resolution::default(),
            annotator: MaskAnnotator::new(),
            frame: None,
            session: Session::new(poll_interval),
            status: String::new(),
            revision: 0,
        }
    }

    pub fn cameras(&self) -> &[CameraRecord] {
        &self.cameras
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn annotator(&self) -> &MaskAnnotator {
        &self.annotator
    }

    pub fn working_resolution(&self) -> Resolution {
        self.working_resolution
    }

    /// Changes whenever the window contents should be redrawn.
    pub fn redraw_key(&self) -> (u64, u64) {
        (self.revision, self.annotator.revision())
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.revision += 1;
    }

    /// Makes camera `index` current and loads its polygons. Unstored edits
    /// on the previous camera are dropped.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(record) = self.cameras.get(index) else {
            return false;
        };
        self.annotator.load(record.polygons.clone(), record.resolution);
        self.working_resolution = record.resolution;
        self.selected = Some(index);
        let label = record.label();
        tracing::info!("Selected camera {}: {}", index, label);
        self.set_status(format!("selected {}", label));
        true
    }

    fn select_relative(&mut self, step: isize) {
        let count = self.cameras.len();
        if count == 0 {
            return;
        }
        let next = match self.selected {
            Some(i) => (i as isize + step).rem_euclid(count as isize) as usize,
            None => 0,
        };
        self.select(next);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.annotator.set_viewport(width, height);
    }

    /// Puts a frame on screen. The frame's size becomes the native size the
    /// annotator works in.
    pub fn show_frame(&mut self, frame: core::Mat) -> Result<()> {
        let size = frame.size()?;
        self.annotator
            .set_native_size(size.width.max(0) as u32, size.height.max(0) as u32);
        self.frame = Some(frame);
        self.revision += 1;
        Ok(())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.frame.is_none() || self.selected.is_none() {
            return;
        }
        match event {
            PointerEvent::Down(pos) => self.annotator.pointer_down(pos),
            PointerEvent::Move { pos, primary_held } => {
                self.annotator.pointer_move(pos, primary_held)
            }
            PointerEvent::Up(pos) => self.annotator.pointer_up(pos),
        }
    }

    /// Runs a keyboard command. Returns `false` when the editor should close.
    pub fn apply(&mut self, action: KeyAction) -> bool {
        match action {
            KeyAction::NextCamera => self.select_relative(1),
            KeyAction::PrevCamera => self.select_relative(-1),
            KeyAction::Connect => self.connect(),
            KeyAction::DeleteLast => self.annotator.delete_last(),
            KeyAction::ClearAll => self.annotator.clear_all(),
            KeyAction::CycleResolution => {
                self.working_resolution = self.working_resolution.next_preset();
                let msg = format!("working resolution {}", self.working_resolution);
                self.set_status(msg);
            }
            KeyAction::StoreCamera => self.store_current(),
            KeyAction::WriteConfig => self.write_config(),
            KeyAction::Quit => return false,
        }
        true
    }

    fn connect(&mut self) {
        let Some(index) = self.selected else {
            self.set_status("no camera selected");
            return;
        };
        let record = &self.cameras[index];
        let label = record.label();

        match self.session.reconnect(|| video::connect_camera(record)) {
            Ok(()) => self.set_status(format!("connected to {}", label)),
            Err(e) => {
                tracing::warn!("Connection failed: {}", e);
                self.set_status(format!("connection failed: {}", e));
            }
        }
    }

    /// Copies the drawn polygons into the selected record, expressed against
    /// the working resolution.
    pub fn store_current(&mut self) {
        let Some(index) = self.selected else {
            self.set_status("no camera selected");
            return;
        };
        let resolution = self.working_resolution;
        let polygons = self.annotator.polygons_for(resolution);
        let count = polygons.len();

        let record = &mut self.cameras[index];
        record.resolution = resolution;
        record.polygons = polygons;

        let msg = format!("stored {} polygon(s) for {}", count, record.label());
        tracing::info!("{}", msg);
        self.set_status(msg);
    }

    pub fn write_config(&mut self) {
        if self.cameras.is_empty() {
            self.set_status("nothing to save");
            return;
        }
        match config::save_cameras(&self.config_path, &self.cameras) {
            Ok(()) => {
                let msg = format!("saved {}", self.config_path.display());
                self.set_status(msg);
            }
            Err(e) => {
                tracing::error!("Save failed: {}", e);
                self.set_status(format!("save failed: {}", e));
            }
        }
    }

    /// Pulls the next live frame if one is due. Live frames are resized to
    /// the working resolution before display.
    pub fn poll_stream(&mut self, now: Instant) -> Result<()> {
        let frame = match self.session.poll(now) {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!("Frame read failed: {}", e);
                self.session.release();
                self.set_status(format!("stream lost: {}", e));
                return Ok(());
            }
        };

        let mut resized = core::Mat::default();
        imgproc::resize(
            &frame,
            &mut resized,
            core::Size::new(
                self.working_resolution.width as i32,
                self.working_resolution.height as i32,
            ),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;
        self.show_frame(resized)
    }

    fn hud_line(&self) -> String {
        let camera = match self.selected {
            Some(i) => self.cameras[i].label(),
            None => "no camera".to_string(),
        };
        format!(
            "{} | {} | {} polygon(s) | {}",
            camera,
            self.working_resolution,
            self.annotator.polygons().len(),
            self.status
        )
    }

    pub fn render(&self) -> Result<core::Mat> {
        let snapshot = self.annotator.snapshot();
        let g = snapshot.geometry;
        let mut canvas = match &self.frame {
            Some(frame) => render::compose(frame, &snapshot)?,
            None => core::Mat::new_rows_cols_with_default(
                g.viewport_height.max(1) as i32,
                g.viewport_width.max(1) as i32,
                core::CV_8UC3,
                core::Scalar::all(0.0),
            )?,
        };

        render::draw_text(&mut canvas, &self.hud_line(), core::Point::new(10, 20))?;
        let bottom = canvas.rows() - 10;
        render::draw_text(&mut canvas, HELP, core::Point::new(10, bottom))?;
        Ok(canvas)
    }

    pub fn shutdown(&mut self) {
        self.session.release();
    }
}

/// Opens the editor window and runs its event loop until the user quits or
/// closes the window.
pub fn run(opts: EditorOptions) -> Result<()> {
    let loaded = config::load_cameras(&opts.config_path)
        .with_context(|| format!("Failed to load {}", opts.config_path.display()))?;
    let mut editor = Editor::new(opts.config_path.clone(), loaded.cameras, opts.poll_interval);

    if let Some(path) = &opts.image {
        let frame = video::load_image(path)?;
        editor.show_frame(frame)?;
    }

    match opts.camera {
        Some(index) => {
            if !editor.select(index) {
                anyhow::bail!(
                    "Camera index {} out of range ({} camera(s) loaded)",
                    index,
                    editor.cameras().len()
                );
            }
        }
        None => {
            editor.select(0);
        }
    }

    highgui::named_window(WINDOW_NAME, highgui::WINDOW_NORMAL)?;
    highgui::resize_window(
        WINDOW_NAME,
        opts.window_width as i32,
        opts.window_height as i32,
    )?;

    let (tx, rx) = channel::unbounded();
    highgui::set_mouse_callback(
        WINDOW_NAME,
        Some(Box::new(move |event: i32, x: i32, y: i32, flags: i32| {
            if let Some(ev) = pointer_event(event, x, y, flags) {
                let _ = tx.send(ev);
            }
        })),
    )?;

    let mut drawn = None;
    loop {
        let key = highgui::wait_key(10)?;
        if let Some(action) = key_action(key) {
            if !editor.apply(action) {
                break;
            }
        }
        if highgui::get_window_property(WINDOW_NAME, highgui::WND_PROP_VISIBLE)? < 1.0 {
            break;
        }

        let rect = highgui::get_window_image_rect(WINDOW_NAME)?;
        editor.set_viewport(rect.width.max(0) as u32, rect.height.max(0) as u32);

        for event in rx.try_iter() {
            editor.handle_pointer(event);
        }

        editor.poll_stream(Instant::now())?;

        let key = editor.redraw_key();
        if drawn != Some(key) {
            let canvas = editor.render()?;
            highgui::imshow(WINDOW_NAME, &canvas)?;
            drawn = Some(key);
        }
    }

    editor.shutdown();
    highgui::destroy_all_windows()?;
    Ok(())
}
