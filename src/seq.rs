//! The central frame-sequence aggregate.
//!
//! [`ImageSeq`] owns an ordered collection of canonical RGBA8 frames plus
//! provenance metadata. `open` classifies an input path once into a
//! [`SourceKind`] and dispatches to one loader per kind; `render` reverses
//! the process, writing the frames back out as an image sequence or a video
//! container.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::{
    buffer,
    error::{SeqError, SeqResult, SeqStatus},
    media,
    template::SeqPath,
};

/// Still-image formats consulted during input classification and rendering.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] =
    &["bmp", "jpeg", "jpg", "png", "tif", "tiff", "webp"];

/// Video container formats consulted during input classification and
/// rendering.
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &["avi", "mkv", "mov", "mp4", "webm"];

fn is_image_extension(ext: &str) -> bool {
    SUPPORTED_IMAGE_EXTENSIONS.contains(&ext)
}

fn is_video_extension(ext: &str) -> bool {
    SUPPORTED_VIDEO_EXTENSIONS.contains(&ext)
}

/// Input classification, computed once per [`ImageSeq::open`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
enum SourceKind {
    /// A literal single image file.
    StillImage,
    /// A placeholder template with exactly one matching file on disk.
    PaddedStill(PathBuf),
    /// A placeholder template with several matches, ascending index order.
    ImageSequence(Vec<PathBuf>),
    /// A video container.
    Video,
    /// A placeholder template with nothing on disk.
    Missing,
    /// An extension outside both supported sets.
    Unsupported,
}

/// Fold a decoded frame into the canonical buffer format: 8-bit RGBA with
/// a fully opaque alpha plane. Zero-area frames keep their slot untouched.
fn canonicalize(mut frame: DynamicImage) -> SeqResult<DynamicImage> {
    if frame.width() == 0 || frame.height() == 0 {
        return Ok(frame);
    }
    if !matches!(
        frame,
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)
    ) {
        // Decoders hand back 16-bit or grayscale buffers for some sources;
        // fold them into 8-bit RGBA before the alpha pass.
        frame = DynamicImage::ImageRgba8(frame.to_rgba8());
    }
    buffer::give_white_alpha(&mut frame)?;
    Ok(frame)
}

/// An ordered, uniformly sized sequence of frames loaded from a single
/// image, a padded image sequence, or a video container.
///
/// A sequence starts Empty (`frame_count`, `width` and `height` at their
/// `-1` sentinels), becomes Open after a successful [`ImageSeq::open`], and
/// Rendered after [`ImageSeq::render`] records an output path. Frames are
/// exclusively owned: cloning a sequence deep-copies every buffer, and the
/// indexed accessors hand out the owned buffer itself rather than a copy.
#[derive(Clone)]
pub struct ImageSeq {
    input_path: PathBuf,
    output_path: PathBuf,
    frames: Vec<DynamicImage>,
    frame_count: i64,
    width: i64,
    height: i64,
    fps: f64,
}

impl Default for ImageSeq {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: PathBuf::new(),
            frames: Vec::new(),
            frame_count: -1,
            width: -1,
            height: -1,
            fps: -1.0,
        }
    }
}

impl std::fmt::Debug for ImageSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSeq")
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("frame_count", &self.frame_count)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .finish_non_exhaustive()
    }
}

impl ImageSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load frames from `new_input_path`.
    ///
    /// The path is classified in order as: a literal still image, a
    /// placeholder template matching one file, a template matching several
    /// files, or a video container. Expected failures (missing files or
    /// directories, unrecognized extensions) come back as a [`SeqStatus`];
    /// on any non-success status the sequence keeps its pre-call state.
    ///
    /// Every loaded frame is canonicalized to RGBA8 with an opaque alpha
    /// plane; `fps` stays `-1.0` for image-derived sources and carries the
    /// container's reported rate for video.
    pub fn open(&mut self, new_input_path: impl AsRef<Path>) -> SeqResult<SeqStatus> {
        self.open_path(new_input_path.as_ref())
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    fn open_path(&mut self, path: &Path) -> SeqResult<SeqStatus> {
        match Self::classify(path)? {
            SourceKind::Unsupported => Ok(SeqStatus::UnsupportedExtension),
            SourceKind::Missing => Ok(SeqStatus::BadPath),
            SourceKind::StillImage => self.load_image_files(path, &[path.to_path_buf()]),
            SourceKind::PaddedStill(file) => self.load_image_files(path, &[file]),
            SourceKind::ImageSequence(files) => self.load_image_files(path, &files),
            SourceKind::Video => self.load_video(path),
        }
    }

    fn classify(path: &Path) -> SeqResult<SourceKind> {
        let ext = media::extension_lowercase(path);
        if is_image_extension(&ext) {
            if !SeqPath::has_placeholder(path) {
                return Ok(SourceKind::StillImage);
            }
            let template = SeqPath::new(path)?;
            let mut matches = matching_frame_files(&template);
            return Ok(match matches.len() {
                0 => SourceKind::Missing,
                1 => SourceKind::PaddedStill(matches.remove(0)),
                _ => SourceKind::ImageSequence(matches),
            });
        }
        if is_video_extension(&ext) {
            return Ok(SourceKind::Video);
        }
        Ok(SourceKind::Unsupported)
    }

    fn load_image_files(&mut self, input_path: &Path, files: &[PathBuf]) -> SeqResult<SeqStatus> {
        let mut frames = Vec::with_capacity(files.len());
        for file in files {
            match media::decode_image(file) {
                Ok(frame) => frames.push(canonicalize(frame)?),
                Err(_) => return Ok(SeqStatus::BadPath),
            }
        }
        tracing::debug!(frames = frames.len(), "loaded image frames");
        self.commit(input_path, frames, -1.0);
        Ok(SeqStatus::Success)
    }

    fn load_video(&mut self, path: &Path) -> SeqResult<SeqStatus> {
        let Ok(info) = media::probe_video(path) else {
            return Ok(SeqStatus::BadPath);
        };
        let Ok(raw_frames) = media::decode_video_frames_rgba8(&info) else {
            return Ok(SeqStatus::BadPath);
        };

        let mut frames = Vec::with_capacity(raw_frames.len());
        for raw in raw_frames {
            let Some(rgba) = image::RgbaImage::from_raw(info.width, info.height, raw) else {
                return Ok(SeqStatus::BadPath);
            };
            frames.push(canonicalize(DynamicImage::ImageRgba8(rgba))?);
        }
        tracing::debug!(frames = frames.len(), fps = info.fps(), "loaded video frames");
        self.commit(path, frames, info.fps());
        Ok(SeqStatus::Success)
    }

    fn commit(&mut self, input_path: &Path, frames: Vec<DynamicImage>, fps: f64) {
        self.width = frames.first().map_or(-1, |f| i64::from(f.width()));
        self.height = frames.first().map_or(-1, |f| i64::from(f.height()));
        self.frame_count = frames.len() as i64;
        self.input_path = input_path.to_path_buf();
        self.output_path = PathBuf::new();
        self.frames = frames;
        self.fps = fps;
    }

    /// Write every frame to `new_output_path`.
    ///
    /// An image extension with a placeholder writes one file per frame at
    /// consecutive template indices; without a placeholder only a
    /// single-frame sequence fits and anything longer is `BadPath`. A video
    /// extension streams the frames into an ffmpeg sink at the sequence's
    /// `fps` (or [`media::DEFAULT_VIDEO_FPS`] for image-derived sources).
    ///
    /// Calling this before any frames are loaded is a usage error, not a
    /// status: it indicates a programming mistake rather than a runtime
    /// condition. Re-rendering is allowed and overwrites `output_path`.
    pub fn render(&mut self, new_output_path: impl AsRef<Path>) -> SeqResult<SeqStatus> {
        self.render_path(new_output_path.as_ref())
    }

    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    fn render_path(&mut self, path: &Path) -> SeqResult<SeqStatus> {
        if self.frames.is_empty() {
            return Err(SeqError::usage(
                "attempting to render an image sequence before frames have been opened",
            ));
        }

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Ok(SeqStatus::BadPath);
        }

        let ext = media::extension_lowercase(path);
        if is_image_extension(&ext) {
            if SeqPath::has_placeholder(path) {
                let mut template = SeqPath::new(path)?;
                for frame in &self.frames {
                    let frame_path = PathBuf::from(template.output_increment());
                    media::encode_image(&frame_path, frame)?;
                }
            } else if self.frames.len() == 1 {
                media::encode_image(path, &self.frames[0])?;
            } else {
                // Several frames cannot share one literal file name.
                return Ok(SeqStatus::BadPath);
            }
            self.output_path = path.to_path_buf();
            return Ok(SeqStatus::Success);
        }

        if is_video_extension(&ext) {
            let fps = if self.fps > 0.0 {
                self.fps
            } else {
                media::DEFAULT_VIDEO_FPS
            };
            let cfg = media::EncodeConfig {
                width: self.width.max(0) as u32,
                height: self.height.max(0) as u32,
                fps,
                out_path: path.to_path_buf(),
            };
            let mut encoder = media::VideoEncoder::new(cfg)?;
            for frame in &self.frames {
                encoder.write_frame(frame.to_rgba8().as_raw())?;
            }
            encoder.finish()?;
            self.output_path = path.to_path_buf();
            return Ok(SeqStatus::Success);
        }

        Ok(SeqStatus::UnsupportedExtension)
    }

    /// Borrow the frame at `index`. The returned reference is the owned
    /// buffer itself, not a copy; clone it explicitly when independence is
    /// required.
    pub fn frame(&self, index: i64) -> SeqResult<&DynamicImage> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.frames.get(i))
            .ok_or_else(|| self.index_error(index))
    }

    /// Mutably borrow the frame at `index`; mutations are visible through
    /// every subsequent access path.
    pub fn frame_mut(&mut self, index: i64) -> SeqResult<&mut DynamicImage> {
        let err = self.index_error(index);
        usize::try_from(index)
            .ok()
            .and_then(|i| self.frames.get_mut(i))
            .ok_or(err)
    }

    /// Replace the frame at `index`.
    pub fn set_frame(&mut self, index: i64, frame: DynamicImage) -> SeqResult<()> {
        *self.frame_mut(index)? = frame;
        Ok(())
    }

    fn index_error(&self, index: i64) -> SeqError {
        SeqError::usage(format!(
            "frame index {index} out of range for a sequence of {} frames",
            self.frames.len()
        ))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DynamicImage> {
        self.frames.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DynamicImage> {
        self.frames.iter_mut()
    }

    /// Frame-content equality: `frame_count`, `width` and `height` must
    /// match and every corresponding frame pair must satisfy
    /// [`buffer::buffers_equal`]. Input and output paths are excluded.
    ///
    /// Fallible because buffer comparison is typed; this is why the crate
    /// does not implement `PartialEq` for sequences.
    pub fn content_equals(&self, other: &ImageSeq) -> SeqResult<bool> {
        if self.frame_count != other.frame_count {
            return Ok(false);
        }
        if self.width != other.width || self.height != other.height {
            return Ok(false);
        }
        for (a, b) in self.frames.iter().zip(&other.frames) {
            if buffer::buffers_not_equal(a, b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Number of loaded frames, `-1` while Empty.
    pub fn frame_count(&self) -> i64 {
        self.frame_count
    }

    /// Width of `frames[0]` in pixels, `-1` while Empty.
    pub fn width(&self) -> i64 {
        self.width
    }

    /// Height of `frames[0]` in pixels, `-1` while Empty.
    pub fn height(&self) -> i64 {
        self.height
    }

    /// The source's intrinsic frame rate: positive for video sources,
    /// `-1.0` for image-derived sequences.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn from_parts(
        input_path: PathBuf,
        frames: Vec<DynamicImage>,
        frame_count: i64,
        fps: f64,
    ) -> Self {
        let width = frames.first().map_or(-1, |f| i64::from(f.width()));
        let height = frames.first().map_or(-1, |f| i64::from(f.height()));
        Self {
            input_path,
            output_path: PathBuf::new(),
            frames,
            frame_count,
            width,
            height,
            fps,
        }
    }
}

impl std::ops::Index<usize> for ImageSeq {
    type Output = DynamicImage;

    fn index(&self, index: usize) -> &Self::Output {
        &self.frames[index]
    }
}

impl std::ops::IndexMut<usize> for ImageSeq {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.frames[index]
    }
}

impl<'a> IntoIterator for &'a ImageSeq {
    type Item = &'a DynamicImage;
    type IntoIter = std::slice::Iter<'a, DynamicImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut ImageSeq {
    type Item = &'a mut DynamicImage;
    type IntoIter = std::slice::IterMut<'a, DynamicImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Enumerate the files on disk belonging to `template`, ascending by frame
/// index. A missing parent directory yields no matches.
fn matching_frame_files(template: &SeqPath) -> Vec<PathBuf> {
    let first = PathBuf::from(template.output_path());
    let dir = match first.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };

    let mut matches: Vec<(u64, PathBuf)> = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(index) = template.frame_index_of(name) {
            matches.push((index, entry.path()));
        }
    }
    matches.sort_by_key(|(index, _)| *index);
    matches.into_iter().map(|(_, path)| path).collect()
}
