use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tesslook_core::consts::CUTOUT_HDU_INDEX;
use tesslook_core::io::fits::{FitsReader, HduKind};

#[derive(Args)]
pub struct InfoArgs {
    /// Input FITS file
    pub file: PathBuf,

    /// Print every header card of the cutout extension
    #[arg(long)]
    pub cards: bool,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let mut reader = FitsReader::open(&args.file)?;

    println!("File:        {}", args.file.display());
    println!("HDUs:        {}", reader.hdu_count());
    for (i, hdu) in reader.hdus().iter().enumerate() {
        let kind = match &hdu.kind {
            HduKind::Primary => "PRIMARY".to_string(),
            HduKind::Image => "IMAGE".to_string(),
            HduKind::BinTable => "BINTABLE".to_string(),
            HduKind::Other(name) => name.clone(),
        };
        let axes: Vec<String> = hdu.axes().iter().map(|n| n.to_string()).collect();
        let shape = if axes.is_empty() {
            "no data".to_string()
        } else {
            axes.join("x")
        };
        println!("  [{i}] {kind:<10} {shape}");
    }

    let plane = reader.read_stack_plane(CUTOUT_HDU_INDEX, 0)?;
    let (height, width) = plane.data.dim();
    println!("Frame:       {width}x{height}");
    println!("Time steps:  {}", plane.time_steps);

    let primary = reader.hdu(0).map(|h| &h.header);
    let ext = reader.hdu(CUTOUT_HDU_INDEX).map(|h| &h.header);
    let lookup = |key: &str| {
        ext.and_then(|h| h.get(key))
            .or_else(|| primary.and_then(|h| h.get(key)))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    };
    println!("Target:      {}", lookup("OBJECT"));
    println!("RA/Dec:      {}, {}", lookup("RA_TARG"), lookup("DEC_TARG"));
    println!("Sector:      {}", lookup("SECTOR"));
    println!("Exposure:    {} s", lookup("TEXP"));

    if args.cards {
        if let Some(header) = ext {
            println!();
            for card in header.cards() {
                match card.comment {
                    Some(ref comment) => println!("{:<8} = {} / {comment}", card.key, card.value),
                    None => println!("{:<8} = {}", card.key, card.value),
                }
            }
        }
    }

    Ok(())
}
