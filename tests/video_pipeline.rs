use std::path::{Path, PathBuf};
use std::process::Command;

use frameseq::{ImageSeq, SeqStatus};

fn ffmpeg_tools_available() -> bool {
    frameseq::is_ffmpeg_on_path() && frameseq::is_ffprobe_on_path()
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "frameseq_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

/// Synthesize a 1 second, 30 fps, 64x64 H.264 clip.
fn synth_clip(root: &Path) -> PathBuf {
    std::fs::create_dir_all(root).unwrap();
    let clip = root.join("clip.mp4");
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x64:rate=30",
            "-t",
            "1",
            "-pix_fmt",
            "yuv420p",
            "-c:v",
            "libx264",
        ])
        .arg(&clip)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg failed creating clip.mp4");
    clip
}

fn write_png_sequence(dir: &Path, count: u32, w: u32, h: u32) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 1..=count {
        image::RgbImage::from_fn(w, h, |x, y| image::Rgb([i as u8, x as u8, y as u8]))
            .save(dir.join(format!("src_{i:04}.png")))
            .unwrap();
    }
}

#[test]
fn open_video_reads_metadata_and_all_frames() {
    if !ffmpeg_tools_available() {
        return;
    }
    let tmp = temp_dir("open_video");
    let clip = synth_clip(&tmp);

    let mut seq = ImageSeq::new();
    assert_eq!(seq.open(&clip).unwrap(), SeqStatus::Success);
    assert_eq!(seq.input_path(), clip.as_path());
    assert_eq!(seq.width(), 64);
    assert_eq!(seq.height(), 64);
    assert_eq!(seq.frame_count(), 30);
    assert!((seq.fps() - 30.0).abs() < 0.01);

    // Video frames land in the canonical format like every other source.
    for frame in &seq {
        let rgba = frame.to_rgba8();
        assert_eq!((rgba.width(), rgba.height()), (64, 64));
        assert!(rgba.pixels().all(|px| px.0[3] == 255));
    }

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn open_missing_video_is_bad_path() {
    if !ffmpeg_tools_available() {
        return;
    }
    let tmp = temp_dir("missing_video");
    std::fs::create_dir_all(&tmp).unwrap();

    let mut seq = ImageSeq::new();
    assert_eq!(seq.open(tmp.join("absent.mp4")).unwrap(), SeqStatus::BadPath);
    assert_eq!(seq.frame_count(), -1);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn render_image_sequence_to_video_uses_default_rate() {
    if !ffmpeg_tools_available() {
        return;
    }
    let tmp = temp_dir("seq_to_video");
    write_png_sequence(&tmp, 4, 64, 64);

    let mut seq = ImageSeq::new();
    assert_eq!(seq.open(tmp.join("src_%04d.png")).unwrap(), SeqStatus::Success);
    assert_eq!(seq.fps(), -1.0);

    let out = tmp.join("out.mp4");
    assert_eq!(seq.render(&out).unwrap(), SeqStatus::Success);
    assert_eq!(seq.output_path(), out.as_path());
    assert!(out.is_file());

    let mut reopened = ImageSeq::new();
    assert_eq!(reopened.open(&out).unwrap(), SeqStatus::Success);
    assert_eq!(reopened.frame_count(), 4);
    assert_eq!(reopened.width(), 64);
    assert_eq!(reopened.height(), 64);
    assert!((reopened.fps() - frameseq::DEFAULT_VIDEO_FPS).abs() < 0.01);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn video_round_trip_preserves_rate_and_shape() {
    if !ffmpeg_tools_available() {
        return;
    }
    let tmp = temp_dir("video_round_trip");
    let clip = synth_clip(&tmp);

    let mut seq = ImageSeq::new();
    assert_eq!(seq.open(&clip).unwrap(), SeqStatus::Success);

    let out = tmp.join("rendered.mov");
    assert_eq!(seq.render(&out).unwrap(), SeqStatus::Success);

    let mut reopened = ImageSeq::new();
    assert_eq!(reopened.open(&out).unwrap(), SeqStatus::Success);
    assert_eq!(reopened.frame_count(), seq.frame_count());
    assert_eq!(reopened.width(), seq.width());
    assert_eq!(reopened.height(), seq.height());
    assert!((reopened.fps() - seq.fps()).abs() < 0.01);

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn render_video_into_missing_directory_is_bad_path() {
    if !ffmpeg_tools_available() {
        return;
    }
    let tmp = temp_dir("video_missing_dir");
    write_png_sequence(&tmp, 2, 64, 64);

    let mut seq = ImageSeq::new();
    assert_eq!(seq.open(tmp.join("src_%04d.png")).unwrap(), SeqStatus::Success);
    assert_eq!(
        seq.render(tmp.join("nope").join("out.mp4")).unwrap(),
        SeqStatus::BadPath
    );

    std::fs::remove_dir_all(&tmp).ok();
}
