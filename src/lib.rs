//! frameseq manages ordered sequences of image frames sourced from a
//! templated series of still-image files, a single still image, or a video
//! container, and exposes them as one uniform in-memory collection.
//!
//! # Pipeline overview
//!
//! 1. **Open**: a path is classified once (still image / padded still /
//!    image sequence / video) and every frame is decoded into the canonical
//!    buffer format: 8-bit RGBA with a uniform alpha plane.
//! 2. **Mutate / compare / scale**: frames are owned buffers with direct
//!    indexed and iterator access; [`Proxy`] derives a downscaled copy for
//!    fast preview work.
//! 3. **Render**: the collection is written back out as a zero-padded image
//!    sequence or streamed into the system `ffmpeg` binary as a video.
//!
//! Expected runtime conditions (missing files, unrecognized extensions)
//! come back as [`SeqStatus`] codes; misuse (malformed templates, rendering
//! before opening, type-incompatible buffer comparisons) surfaces as
//! [`SeqError`].
#![forbid(unsafe_code)]

pub mod buffer;
pub mod error;
pub mod media;
pub mod proxy;
pub mod seq;
pub mod template;

pub use buffer::{buffers_equal, buffers_not_equal, give_alpha, give_black_alpha, give_white_alpha};
pub use error::{SeqError, SeqResult, SeqStatus};
pub use media::{
    DEFAULT_VIDEO_FPS, EncodeConfig, VideoEncoder, VideoSourceInfo, decode_image,
    decode_video_frames_rgba8, encode_image, is_ffmpeg_on_path, is_ffprobe_on_path, probe_video,
    video_codec_for_extension,
};
pub use proxy::Proxy;
pub use seq::{ImageSeq, SUPPORTED_IMAGE_EXTENSIONS, SUPPORTED_VIDEO_EXTENSIONS};
pub use template::SeqPath;
