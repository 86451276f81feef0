//! Canonical pixel-buffer format and typed buffer equality.
//!
//! Every frame held by an [`ImageSeq`](crate::ImageSeq) is canonicalized to
//! 8-bit RGBA with a uniform alpha plane. The buffer type is
//! [`image::DynamicImage`]; `ImageRgb8`/`ImageRgba8` are the supported
//! 3- and 4-channel forms, every other variant is an unsupported type.

use image::DynamicImage;

use crate::error::{SeqError, SeqResult};

fn ensure_supported(buffer: &DynamicImage) -> SeqResult<()> {
    match buffer {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Ok(()),
        _ => Err(SeqError::buffer(
            "only 8-bit RGB and RGBA buffers are supported",
        )),
    }
}

/// Convert `image` to 8-bit RGBA (color channels preserved) and overwrite
/// its entire alpha plane with the constant `alpha`.
///
/// Errors on buffer types other than 8-bit RGB/RGBA and on buffers with a
/// zero dimension. Reapplying with the same constant is a no-op on content.
pub fn give_alpha(image: &mut DynamicImage, alpha: u8) -> SeqResult<()> {
    ensure_supported(image)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(SeqError::buffer(
            "buffer dimensions must be greater than 0 x 0",
        ));
    }

    match image {
        DynamicImage::ImageRgba8(rgba) => {
            for px in rgba.pixels_mut() {
                px.0[3] = alpha;
            }
        }
        DynamicImage::ImageRgb8(rgb) => {
            let mut rgba = image::RgbaImage::new(rgb.width(), rgb.height());
            for (dst, src) in rgba.pixels_mut().zip(rgb.pixels()) {
                dst.0 = [src.0[0], src.0[1], src.0[2], alpha];
            }
            *image = DynamicImage::ImageRgba8(rgba);
        }
        _ => unreachable!("type checked above"),
    }
    Ok(())
}

/// [`give_alpha`] with a fully opaque (255) alpha plane.
pub fn give_white_alpha(image: &mut DynamicImage) -> SeqResult<()> {
    give_alpha(image, 255)
}

/// [`give_alpha`] with a fully transparent (0) alpha plane.
pub fn give_black_alpha(image: &mut DynamicImage) -> SeqResult<()> {
    give_alpha(image, 0)
}

/// Exact per-channel equality between two 8-bit RGB/RGBA buffers.
///
/// Both operands are type-checked unconditionally, even when they would
/// compare equal. Comparing an RGB buffer against an RGBA buffer returns
/// `Ok(false)`; any other type mismatch is an error. Buffers of differing
/// dimensions compare unequal.
pub fn buffers_equal(a: &DynamicImage, b: &DynamicImage) -> SeqResult<bool> {
    ensure_supported(a)?;
    ensure_supported(b)?;

    Ok(match (a, b) {
        (DynamicImage::ImageRgb8(a), DynamicImage::ImageRgb8(b)) => {
            a.dimensions() == b.dimensions() && a.as_raw() == b.as_raw()
        }
        (DynamicImage::ImageRgba8(a), DynamicImage::ImageRgba8(b)) => {
            a.dimensions() == b.dimensions() && a.as_raw() == b.as_raw()
        }
        // One buffer carries an alpha channel and the other does not.
        _ => false,
    })
}

/// Logical negation of [`buffers_equal`], with the same error conditions.
pub fn buffers_not_equal(a: &DynamicImage, b: &DynamicImage) -> SeqResult<bool> {
    buffers_equal(a, b).map(|eq| !eq)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_fixture(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([x as u8, y as u8, (x + y) as u8])
        }))
    }

    fn rgba_fixture(w: u32, h: u32, alpha: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(image::RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([x as u8, y as u8, (x + y) as u8, alpha])
        }))
    }

    #[test]
    fn give_white_alpha_converts_rgb_and_fills_alpha() {
        let mut img = rgb_fixture(4, 3);
        give_white_alpha(&mut img).unwrap();

        let DynamicImage::ImageRgba8(rgba) = &img else {
            panic!("expected an RGBA buffer after canonicalization");
        };
        assert_eq!(rgba.dimensions(), (4, 3));
        for (x, y, px) in rgba.enumerate_pixels() {
            assert_eq!(px.0, [x as u8, y as u8, (x + y) as u8, 255]);
        }
    }

    #[test]
    fn give_alpha_overwrites_existing_alpha_plane() {
        let mut img = rgba_fixture(5, 5, 17);
        give_black_alpha(&mut img).unwrap();
        assert!(img.to_rgba8().pixels().all(|px| px.0[3] == 0));
    }

    #[test]
    fn give_alpha_is_idempotent() {
        let mut once = rgb_fixture(6, 2);
        give_white_alpha(&mut once).unwrap();
        let mut twice = once.clone();
        give_white_alpha(&mut twice).unwrap();
        assert!(buffers_equal(&once, &twice).unwrap());
    }

    #[test]
    fn give_alpha_rejects_unsupported_and_degenerate_buffers() {
        let mut float = DynamicImage::ImageRgb32F(image::Rgb32FImage::new(2, 2));
        assert!(give_white_alpha(&mut float).is_err());

        let mut gray = DynamicImage::ImageLuma8(image::GrayImage::new(2, 2));
        assert!(give_white_alpha(&mut gray).is_err());

        let mut empty = DynamicImage::ImageRgba8(image::RgbaImage::new(0, 0));
        assert!(give_white_alpha(&mut empty).is_err());
    }

    #[test]
    fn equal_buffers_compare_equal() {
        let a = rgba_fixture(8, 8, 255);
        let b = rgba_fixture(8, 8, 255);
        assert!(buffers_equal(&a, &b).unwrap());
        assert!(!buffers_not_equal(&a, &b).unwrap());
    }

    #[test]
    fn pixel_and_dimension_mismatches_compare_unequal() {
        let a = rgba_fixture(8, 8, 255);
        let mut b = a.clone();
        if let DynamicImage::ImageRgba8(rgba) = &mut b {
            rgba.get_pixel_mut(3, 4).0[1] ^= 1;
        }
        assert!(!buffers_equal(&a, &b).unwrap());

        // Same raw length, swapped dimensions.
        assert!(!buffers_equal(&rgba_fixture(2, 3, 255), &rgba_fixture(3, 2, 255)).unwrap());
    }

    #[test]
    fn rgb_versus_rgba_is_false_not_an_error() {
        let rgb = rgb_fixture(4, 4);
        let mut rgba = rgb.clone();
        give_white_alpha(&mut rgba).unwrap();
        assert!(!buffers_equal(&rgb, &rgba).unwrap());
    }

    #[test]
    fn type_check_applies_even_to_identical_operands() {
        let float = DynamicImage::ImageRgb32F(image::Rgb32FImage::new(2, 2));
        assert!(buffers_equal(&float, &float).is_err());
        assert!(buffers_not_equal(&float, &float).is_err());
    }
}
