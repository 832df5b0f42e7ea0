use crate::config::{codec, CameraRecord};
use crate::error::{MaskError, MaskResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A config line that could not be turned into a camera record.
#[derive(Debug)]
pub struct LineWarning {
    /// 1-based line number.
    pub line: usize,
    pub error: MaskError,
}

#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub cameras: Vec<CameraRecord>,
    pub warnings: Vec<LineWarning>,
}

pub fn parse_config(content: &str) -> LoadedConfig {
    let mut loaded = LoadedConfig::default();

    for (idx, line) in content.lines().enumerate() {
        match codec::parse_line(line) {
            Ok(Some(record)) => loaded.cameras.push(record),
            Ok(None) => {}
            Err(error) => {
                tracing::warn!("Skipping config line {}: {}", idx + 1, error);
                loaded.warnings.push(LineWarning {
                    line: idx + 1,
                    error,
                });
            }
        }
    }

    loaded
}

/// Reads a camera config file. Bad lines become warnings; only I/O problems
/// fail the load.
pub fn load_cameras(path: &Path) -> MaskResult<LoadedConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MaskError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            MaskError::file_io(path, e)
        }
    })?;

    let loaded = parse_config(&content);
    tracing::info!(
        "Loaded {} camera(s) from {} ({} warning(s))",
        loaded.cameras.len(),
        path.display(),
        loaded.warnings.len()
    );
    Ok(loaded)
}

/// Writes the camera list next to `path` and atomically moves it into place,
/// so an existing file survives a failed save.
pub fn save_cameras(path: &Path, cameras: &[CameraRecord]) -> MaskResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| MaskError::file_io(dir, e))?;
    for camera in cameras {
        writeln!(tmp, "{}", codec::serialize_record(camera))
            .map_err(|e| MaskError::file_io(tmp.path(), e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| MaskError::file_io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| MaskError::file_io(path, e.error))?;

    tracing::info!("Saved {} camera(s) to {}", cameras.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::{NativePoint, Polygon, Resolution};

    #[test]
    fn test_lenient_load() {
        let content = "# comment\n\nonly two tokens\n192.168.1.103 admin pass123 1 1920*1080 [100,100 200,100 200,200]\n";
        let loaded = parse_config(content);
        assert_eq!(loaded.cameras.len(), 1);
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.cameras[0].ip, "192.168.1.103");
    }

    #[test]
    fn test_bad_lines_become_warnings() {
        let content = "10.0.0.1 a b 1 [1,1 2,x 3,3]\n10.0.0.2 a b 2\n10.0.0.3 a b 3 99*\n";
        let loaded = parse_config(content);
        assert_eq!(loaded.cameras.len(), 1);
        assert_eq!(loaded.cameras[0].ip, "10.0.0.2");
        assert_eq!(loaded.warnings.len(), 2);
        assert_eq!(loaded.warnings[0].line, 1);
        assert!(matches!(
            loaded.warnings[0].error,
            MaskError::PolygonParse { .. }
        ));
        assert_eq!(loaded.warnings[1].line, 3);
        assert!(matches!(
            loaded.warnings[1].error,
            MaskError::ConfigParse { .. }
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cameras(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, MaskError::NotFound { .. }));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cameras.txt");
        fs::write(&path, "stale content\n").unwrap();

        let mut cam = CameraRecord::new("192.168.1.103", "admin", "pass123", "1");
        cam.resolution = Resolution::new(1280, 720);
        cam.polygons = vec![Polygon::new(vec![
            NativePoint::new(1, 2),
            NativePoint::new(30, 2),
            NativePoint::new(30, 40),
        ])
        .unwrap()];
        let cameras = vec![cam, CameraRecord::new("192.168.1.104", "admin", "x", "2")];

        save_cameras(&path, &cameras).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "192.168.1.103 admin pass123 1 1280*720 [1,2 30,2 30,40]\n192.168.1.104 admin x 2 1920*1080\n"
        );

        let loaded = load_cameras(&path).unwrap();
        assert_eq!(loaded.cameras, cameras);
        assert!(loaded.warnings.is_empty());

        // No temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("cameras.txt");
        let err = save_cameras(&path, &[]).unwrap_err();
        assert!(matches!(err, MaskError::FileIo { .. }));
    }
}
