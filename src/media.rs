//! Codec collaborator: still-image decode/encode via the `image` crate and
//! video demux/mux via the system `ffmpeg`/`ffprobe` binaries.
//!
//! We intentionally drive the ffmpeg CLI over pipes rather than linking
//! native FFmpeg libraries, which keeps the crate free of dev header/lib
//! requirements. Frames cross the pipe as raw row-major RGBA8.

use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use anyhow::Context as _;
use image::DynamicImage;

use crate::error::{SeqError, SeqResult};

/// Frame rate used when rendering a sequence without an intrinsic rate
/// (image-derived sources) to a video container.
pub const DEFAULT_VIDEO_FPS: f64 = 24.0;

/// Metadata of a video stream as reported by ffprobe.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    /// Container-reported frame count, when the container carries one.
    pub nb_frames: Option<u64>,
}

impl VideoSourceInfo {
    pub fn fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}

/// Decode one still image from disk.
pub fn decode_image(path: &Path) -> SeqResult<DynamicImage> {
    Ok(image::open(path)
        .with_context(|| format!("failed to decode image '{}'", path.display()))?)
}

/// Encode one frame to a still-image file, format chosen by extension.
///
/// JPEG carries no alpha channel, so RGBA frames are flattened to RGB for
/// it; every other supported format receives the buffer as-is.
pub fn encode_image(path: &Path, frame: &DynamicImage) -> SeqResult<()> {
    let ext = extension_lowercase(path);
    let result = match ext.as_str() {
        "jpg" | "jpeg" => DynamicImage::ImageRgb8(frame.to_rgb8()).save(path),
        _ => frame.save(path),
    };
    Ok(result.with_context(|| format!("failed to encode image '{}'", path.display()))?)
}

pub(crate) fn extension_lowercase(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Probe `source_path` with ffprobe and return its video stream metadata.
pub fn probe_video(source_path: &Path) -> SeqResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        nb_frames: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| SeqError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(SeqError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| SeqError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| SeqError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| SeqError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| SeqError::media("missing video height from ffprobe"))?;
    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| SeqError::media("invalid video r_frame_rate"))?;
    let nb_frames = video_stream
        .nb_frames
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok());

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        nb_frames,
    })
}

/// Decode every frame of `source` as raw RGBA8, in presentation order.
pub fn decode_video_frames_rgba8(source: &VideoSourceInfo) -> SeqResult<Vec<Vec<u8>>> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(&source.source_path)
        .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .output()
        .map_err(|e| SeqError::media(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(SeqError::media(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_len = source.width as usize * source.height as usize * 4;
    if frame_len == 0 {
        return Err(SeqError::media(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if out.stdout.is_empty() || !out.stdout.len().is_multiple_of(frame_len) {
        return Err(SeqError::media(format!(
            "decoded video stream has invalid size: got {} bytes, expected a multiple of {frame_len}",
            out.stdout.len()
        )));
    }

    let count = out.stdout.len() / frame_len;
    let mut frames = Vec::with_capacity(count);
    for idx in 0..count {
        let off = idx * frame_len;
        frames.push(out.stdout[off..off + frame_len].to_vec());
    }
    Ok(frames)
}

/// The encoder ffmpeg should use for a given container extension.
///
/// All choices target `yuv420p` output for maximum player compatibility.
pub fn video_codec_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "mp4" | "mov" | "mkv" => Some("libx264"),
        "webm" => Some("libvpx-vp9"),
        "avi" => Some("mpeg4"),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub out_path: PathBuf,
}

impl EncodeConfig {
    pub fn validate(&self) -> SeqResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SeqError::usage("encode width/height must be non-zero"));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(SeqError::usage("encode fps must be positive"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // We target yuv420p output, which requires even dimensions.
            return Err(SeqError::usage(
                "encode width/height must be even (required for yuv420p output)",
            ));
        }
        Ok(())
    }
}

/// A video sink: frames written as raw RGBA8 are piped into a system
/// `ffmpeg` child process that muxes them into the target container.
pub struct VideoEncoder {
    cfg: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl VideoEncoder {
    /// Open a sink for `cfg.out_path`; the codec is chosen from the path's
    /// extension. Errors if the extension names no known container or the
    /// ffmpeg child cannot be spawned.
    pub fn new(cfg: EncodeConfig) -> SeqResult<Self> {
        cfg.validate()?;

        let ext = extension_lowercase(&cfg.out_path);
        let codec = video_codec_for_extension(&ext).ok_or_else(|| {
            SeqError::usage(format!("no video codec known for extension '{ext}'"))
        })?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}", cfg.fps),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            codec,
            "-pix_fmt",
            "yuv420p",
        ]);
        if matches!(ext.as_str(), "mp4" | "mov") {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            SeqError::media(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SeqError::media("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    /// Write one frame of raw RGBA8 bytes, length `width * height * 4`.
    pub fn write_frame(&mut self, rgba: &[u8]) -> SeqResult<()> {
        let expected = self.cfg.width as usize * self.cfg.height as usize * 4;
        if rgba.len() != expected {
            return Err(SeqError::usage(format!(
                "frame byte size mismatch: got {}, expected {expected}",
                rgba.len()
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SeqError::media("video encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin
            .write_all(rgba)
            .map_err(|e| SeqError::media(format!("failed to write frame to ffmpeg stdin: {e}")))?;

        Ok(())
    }

    /// Close the sink and wait for ffmpeg to finish muxing.
    pub fn finish(mut self) -> SeqResult<()> {
        drop(self.stdin.take());

        let Some(child) = self.child.take() else {
            return Err(SeqError::media("video encoder is already finalized"));
        };
        let output = child
            .wait_with_output()
            .map_err(|e| SeqError::media(format!("failed to wait for ffmpeg to finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SeqError::media(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Drop for VideoEncoder {
    fn drop(&mut self) {
        // Reap the child if the sink is abandoned without finish().
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}
