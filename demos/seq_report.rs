use frameseq::{ImageSeq, SeqStatus};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: seq_report <image | template_%04d.ext | video>");
        return Ok(());
    };

    let mut seq = ImageSeq::new();
    match seq.open(&path)? {
        SeqStatus::Success => {}
        SeqStatus::BadPath => {
            eprintln!("seq_report: nothing readable at '{path}'");
            return Ok(());
        }
        SeqStatus::UnsupportedExtension => {
            eprintln!("seq_report: unsupported extension in '{path}'");
            return Ok(());
        }
    }

    println!("input:       {}", seq.input_path().display());
    println!("frames:      {}", seq.frame_count());
    println!("size:        {}x{}", seq.width(), seq.height());
    if seq.fps() > 0.0 {
        println!("fps:         {}", seq.fps());
    } else {
        println!("fps:         (none, image-derived)");
    }

    Ok(())
}
