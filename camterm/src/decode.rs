use anyhow::Context;
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use log::{debug, info, warn};

use camterm_core::format::{Image, Size};
use camterm_core::source::FrameSource;
use camterm_core::{Error, Result};

use crate::config::SourceSpec;
use crate::resize::FrameResizer;

/// Camera or file frames decoded to RGB24 by an ffmpeg child process.
pub struct FfmpegSource {
    child: FfmpegChild,
    events: Box<dyn Iterator<Item = FfmpegEvent>>,
    resizer: FrameResizer,
}

impl FfmpegSource {
    pub fn spawn(
        spec: &SourceSpec,
        max_rate: u32,
        options: &[(String, String)],
    ) -> anyhow::Result<Self> {
        let args = input_args(spec, max_rate, options)?;
        debug!("ffmpeg input args: {args:?}");

        let mut child = FfmpegCommand::new()
            .args(&args)
            .rawvideo()
            .spawn()
            .context("failed to spawn ffmpeg, is it installed?")?;
        let events = child.iter().context("failed to iterate ffmpeg events")?;
        info!("ffmpeg started for {spec:?}");

        Ok(Self {
            child,
            events: Box::new(events),
            resizer: FrameResizer::new(),
        })
    }
}

impl FrameSource for FfmpegSource {
    fn optimize_for(&mut self, size: Size) {
        self.resizer.set_target(size);
    }

    fn read(&mut self) -> Result<Option<Image>> {
        for event in &mut self.events {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let size = Size::new(frame.width, frame.height);
                    let image = Image::new(frame.data, size)
                        .map_err(|e| Error::SourceUnavailable(format!("bad frame: {e}")))?;
                    return self.resizer.shrink(image).map(Some);
                }
                FfmpegEvent::Error(msg) => warn!("ffmpeg: {msg}"),
                _ => {}
            }
        }
        Ok(None)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // Already exited when the stream ended on its own.
        let _ = self.child.kill();
    }
}

/// Everything that goes before ffmpeg's output options.
fn input_args(
    spec: &SourceSpec,
    max_rate: u32,
    options: &[(String, String)],
) -> anyhow::Result<Vec<String>> {
    let mut args = Vec::new();
    let input = match spec {
        SourceSpec::Camera {
            input_format,
            device,
        } => {
            args.extend(["-f".to_string(), input_format.clone()]);
            camera_input(input_format, device)
        }
        SourceSpec::File(path) => {
            // Pace file playback at its native rate.
            args.push("-re".to_string());
            path.to_str().context("file path is not valid UTF-8")?.to_string()
        }
        SourceSpec::TestPattern => anyhow::bail!("the test pattern does not use ffmpeg"),
    };
    for (key, value) in options {
        args.push(format!("-{key}"));
        args.push(value.clone());
    }
    args.extend(["-i".to_string(), input]);
    if max_rate > 0 {
        args.extend(["-r".to_string(), max_rate.to_string()]);
    }
    Ok(args)
}

/// Bare indices name `/dev/videoN` for v4l2; other backends take them as is.
fn camera_input(input_format: &str, device: &str) -> String {
    match (input_format, device.parse::<u32>()) {
        ("v4l2", Ok(index)) => format!("/dev/video{index}"),
        _ => device.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn camera_args_put_options_before_input() {
        let spec = SourceSpec::Camera {
            input_format: "v4l2".to_string(),
            device: "1".to_string(),
        };
        let options = vec![("video_size".to_string(), "640x480".to_string())];
        let args = input_args(&spec, 20, &options).unwrap();
        assert_eq!(
            args,
            ["-f", "v4l2", "-video_size", "640x480", "-i", "/dev/video1", "-r", "20"]
        );
    }

    #[test]
    fn file_args_pace_in_real_time() {
        let spec = SourceSpec::File(PathBuf::from("clip.mp4"));
        let args = input_args(&spec, 0, &[]).unwrap();
        assert_eq!(args, ["-re", "-i", "clip.mp4"]);
    }

    #[test]
    fn camera_names() {
        assert_eq!(camera_input("avfoundation", "0"), "0");
        assert_eq!(camera_input("v4l2", "/dev/video3"), "/dev/video3");
        assert_eq!(camera_input("dshow", "video=Cam"), "video=Cam");
    }

    #[test]
    fn pattern_is_not_an_ffmpeg_input() {
        assert!(input_args(&SourceSpec::TestPattern, 20, &[]).is_err());
    }
}
