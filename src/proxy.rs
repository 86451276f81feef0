//! Downscaled proxy sequences for fast preview rendering.

use crate::{
    error::{SeqError, SeqResult},
    seq::ImageSeq,
};

/// A uniformly downscaled copy of an open [`ImageSeq`].
///
/// Every source frame is resized by `scale` with area-averaged sampling, so
/// a 0.5 proxy of a 1080x1920 sequence holds 540x960 frames. The proxy owns
/// its frames and otherwise behaves exactly like an [`ImageSeq`] (render,
/// equality, indexed access, iteration) via deref.
pub struct Proxy {
    seq: ImageSeq,
    scale: f64,
}

impl Proxy {
    /// Build a proxy of `original` downscaled by `resize_scale`.
    ///
    /// `resize_scale` must lie in `(0, 1]` and `original` must already be
    /// open; both violations are usage errors.
    pub fn new(original: &ImageSeq, resize_scale: f64) -> SeqResult<Self> {
        if !(resize_scale > 0.0 && resize_scale <= 1.0) {
            return Err(SeqError::usage(
                "proxy sequences must have a resize scale between 0 and 1",
            ));
        }
        if original.is_empty() {
            return Err(SeqError::usage(
                "proxy sequences require an opened source sequence",
            ));
        }

        let mut frames = Vec::with_capacity(original.frame_count().max(0) as usize);
        for frame in original {
            if frame.width() == 0 || frame.height() == 0 {
                frames.push(frame.clone());
                continue;
            }
            let w = scaled_dim(frame.width(), resize_scale);
            let h = scaled_dim(frame.height(), resize_scale);
            frames.push(frame.thumbnail_exact(w, h));
        }

        Ok(Self {
            seq: ImageSeq::from_parts(
                original.input_path().to_path_buf(),
                frames,
                original.frame_count(),
                original.fps(),
            ),
            scale: resize_scale,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

fn scaled_dim(dim: u32, scale: f64) -> u32 {
    ((f64::from(dim) * scale).round() as u32).max(1)
}

impl std::ops::Deref for Proxy {
    type Target = ImageSeq;

    fn deref(&self) -> &Self::Target {
        &self.seq
    }
}

impl std::ops::DerefMut for Proxy {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.seq
    }
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("scale", &self.scale)
            .field("seq", &self.seq)
            .finish()
    }
}
