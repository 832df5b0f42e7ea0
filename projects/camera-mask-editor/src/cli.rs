use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera config file
    #[arg(
        long,
        global = true,
        env = "MASK_EDITOR_CONFIG",
        default_value = "cameras.txt"
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the cameras in the config file
    List {
        /// Print the records as JSON (passwords omitted)
        #[arg(long)]
        json: bool,
    },

    /// Draw mask polygons over a camera stream or a still image
    Edit {
        /// Camera to select on start-up (0-based, file order)
        #[arg(long)]
        camera: Option<usize>,

        /// Still image to annotate instead of a live stream
        #[arg(long)]
        image: Option<PathBuf>,

        /// Frame polling interval in milliseconds
        #[arg(long, env = "MASK_EDITOR_POLL_MS", default_value_t = 30)]
        poll_ms: u64,

        #[arg(long, default_value_t = 1280)]
        window_width: u32,

        #[arg(long, default_value_t = 720)]
        window_height: u32,
    },

    /// Grab one frame per camera and write it with its masks drawn
    Snapshot {
        /// Directory for mask_{ip}_ch{channel}.png files
        #[arg(long, env = "MASK_EDITOR_SNAPSHOT_DIR")]
        out_dir: PathBuf,

        /// Only this camera (0-based, file order)
        #[arg(long)]
        camera: Option<usize>,
    },

    /// Click on an image to print native pixel coordinates
    Pick {
        image: PathBuf,

        /// Display scale factor
        #[arg(long, default_value_t = 0.5)]
        scale: f64,
    },

    /// Print the RTSP address of a camera
    StreamUrl {
        /// Camera index (0-based, file order)
        #[arg(long)]
        camera: usize,

        /// Include the password instead of masking it
        #[arg(long)]
        show_password: bool,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit_defaults() {
        let args = Args::try_parse_from(["camera-mask-editor", "edit"]).unwrap();
        assert_eq!(args.config, PathBuf::from("cameras.txt"));
        match args.command {
            Command::Edit {
                camera,
                image,
                poll_ms,
                window_width,
                window_height,
            } => {
                assert_eq!(camera, None);
                assert_eq!(image, None);
                assert_eq!(poll_ms, 30);
                assert_eq!((window_width, window_height), (1280, 720));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = Args::try_parse_from([
            "camera-mask-editor",
            "pick",
            "mask.png",
            "--scale",
            "0.25",
            "--config",
            "site.txt",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("site.txt"));
        match args.command {
            Command::Pick { image, scale } => {
                assert_eq!(image, PathBuf::from("mask.png"));
                assert_eq!(scale, 0.25);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
