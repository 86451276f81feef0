use frameseq::{ImageSeq, Proxy, SeqStatus};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: proxy_preview <input> <output> [scale]");
        return Ok(());
    };
    let scale: f64 = args.next().as_deref().unwrap_or("0.5").parse()?;

    let mut seq = ImageSeq::new();
    anyhow::ensure!(
        seq.open(&input)? == SeqStatus::Success,
        "could not open '{input}'"
    );
    eprintln!(
        "opened {} frames at {}x{}",
        seq.frame_count(),
        seq.width(),
        seq.height()
    );

    let mut preview = Proxy::new(&seq, scale)?;
    anyhow::ensure!(
        preview.render(&output)? == SeqStatus::Success,
        "could not render preview to '{output}'"
    );
    eprintln!(
        "wrote {}x{} preview to {}",
        preview.width(),
        preview.height(),
        preview.output_path().display()
    );

    Ok(())
}
