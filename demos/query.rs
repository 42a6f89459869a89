use anyhow::Result;
use bintrack::{GenomicInterval, MmapSource, TrackReader};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args.next().expect("Usage: query <track.bw> <chrom> <start> <end> [bp_per_pixel]");
    let chrom = args.next().expect("missing chromosome");
    let start: u32 = args.next().expect("missing start").parse()?;
    let end: u32 = args.next().expect("missing end").parse()?;
    let bp_per_pixel: f64 = match args.next() {
        Some(scale) => scale.parse()?,
        None => 1.0,
    };

    let mut reader = TrackReader::new(MmapSource::open(path)?);
    let info = reader.load_header()?;
    eprintln!(
        "{:?} file, {} chromosomes, {} zoom levels",
        info.kind,
        info.chroms.len(),
        info.zoom_headers.len()
    );

    let features = reader.query(&chrom, start, end, bp_per_pixel)?;
    for feature in &features {
        match feature.value() {
            Some(value) => println!(
                "{}\t{}\t{}\t{value}",
                feature.chrom(),
                feature.start(),
                feature.end()
            ),
            None => println!(
                "{}\t{}\t{}\t{}",
                feature.chrom(),
                feature.start(),
                feature.end(),
                feature.name().unwrap_or(".")
            ),
        }
    }
    eprintln!("{} features", features.len());
    Ok(())
}
