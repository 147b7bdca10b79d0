//! Byte-level FITS fixtures. Writing the bytes directly lets tests build
//! files cfitsio would refuse to create: truncated data, absurd axis sizes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tesslook_core::frame::HeaderValue;

const BLOCK: usize = 2880;
const CARD: usize = 80;

/// An empty primary HDU followed by cutout stacks in either image-cube or
/// target-pixel-table layout.
pub struct FitsWriter {
    writer: BufWriter<File>,
}

impl FitsWriter {
    /// Create a new FITS file and write an empty primary HDU carrying `cards`.
    pub fn create(path: &Path, cards: &[(&str, HeaderValue)]) -> std::io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        let mut header = vec![
            format_card("SIMPLE", &HeaderValue::Bool(true)),
            format_card("BITPIX", &HeaderValue::Int(8)),
            format_card("NAXIS", &HeaderValue::Int(0)),
            format_card("EXTEND", &HeaderValue::Bool(true)),
        ];
        header.extend(cards.iter().map(|(k, v)| format_card(k, v)));
        write_header(&mut writer, &header)?;
        Ok(Self { writer })
    }

    /// Append an IMAGE extension holding a (time, height, width) f32 cube.
    pub fn write_image_cube(
        &mut self,
        width: usize,
        height: usize,
        frames: &[Vec<f32>],
        cards: &[(&str, HeaderValue)],
    ) -> std::io::Result<()> {
        let axes = [width as i64, height as i64, frames.len() as i64];
        let mut data = Vec::with_capacity(width * height * frames.len() * 4);
        for frame in frames {
            assert_eq!(frame.len(), width * height);
            for v in frame {
                data.extend_from_slice(&v.to_be_bytes());
            }
        }
        self.write_image_extension(-32, &axes, cards, &data)
    }

    /// Append an IMAGE extension with arbitrary axes and raw data bytes.
    /// The data is not checked against the axes.
    pub fn write_image_extension(
        &mut self,
        bitpix: i64,
        axes: &[i64],
        cards: &[(&str, HeaderValue)],
        data: &[u8],
    ) -> std::io::Result<()> {
        let mut header = vec![
            format_card("XTENSION", &HeaderValue::Str("IMAGE".into())),
            format_card("BITPIX", &HeaderValue::Int(bitpix)),
            format_card("NAXIS", &HeaderValue::Int(axes.len() as i64)),
        ];
        for (n, len) in axes.iter().enumerate() {
            header.push(format_card(&format!("NAXIS{}", n + 1), &HeaderValue::Int(*len)));
        }
        header.push(format_card("PCOUNT", &HeaderValue::Int(0)));
        header.push(format_card("GCOUNT", &HeaderValue::Int(1)));
        header.extend(cards.iter().map(|(k, v)| format_card(k, v)));
        write_header(&mut self.writer, &header)?;
        write_data(&mut self.writer, data)
    }

    /// Append a BINTABLE extension in target pixel file layout: a `TIME`
    /// column and a `FLUX` column with TDIM `(width,height)`, one row per frame.
    pub fn write_flux_table(
        &mut self,
        width: usize,
        height: usize,
        frames: &[Vec<f32>],
        cards: &[(&str, HeaderValue)],
    ) -> std::io::Result<()> {
        let pixels = width * height;
        let row_bytes = 8 + pixels * 4;
        let mut header = vec![
            format_card("XTENSION", &HeaderValue::Str("BINTABLE".into())),
            format_card("BITPIX", &HeaderValue::Int(8)),
            format_card("NAXIS", &HeaderValue::Int(2)),
            format_card("NAXIS1", &HeaderValue::Int(row_bytes as i64)),
            format_card("NAXIS2", &HeaderValue::Int(frames.len() as i64)),
            format_card("PCOUNT", &HeaderValue::Int(0)),
            format_card("GCOUNT", &HeaderValue::Int(1)),
            format_card("TFIELDS", &HeaderValue::Int(2)),
            format_card("TTYPE1", &HeaderValue::Str("TIME".into())),
            format_card("TFORM1", &HeaderValue::Str("D".into())),
            format_card("TTYPE2", &HeaderValue::Str("FLUX".into())),
            format_card("TFORM2", &HeaderValue::Str(format!("{pixels}E"))),
            format_card("TDIM2", &HeaderValue::Str(format!("({width},{height})"))),
        ];
        header.extend(cards.iter().map(|(k, v)| format_card(k, v)));
        write_header(&mut self.writer, &header)?;

        let mut data = Vec::with_capacity(row_bytes * frames.len());
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.len(), pixels);
            data.extend_from_slice(&(i as f64).to_be_bytes());
            for v in frame {
                data.extend_from_slice(&v.to_be_bytes());
            }
        }
        write_data(&mut self.writer, &data)
    }

    pub fn finalize(mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Format one 80-byte value card.
pub fn format_card(key: &str, value: &HeaderValue) -> String {
    let value = match value {
        HeaderValue::Str(s) => format!("'{:<8}'", s.replace('\'', "''")),
        HeaderValue::Bool(b) => format!("{:>20}", if *b { "T" } else { "F" }),
        HeaderValue::Int(v) => format!("{v:>20}"),
        HeaderValue::Float(v) => format!("{:>20}", format!("{v:E}")),
        HeaderValue::Raw(s) => format!("{s:>20}"),
    };
    let mut card = format!("{key:<8}= {value}");
    card.truncate(CARD);
    format!("{card:<80}")
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK) * BLOCK
}

fn write_header(w: &mut impl Write, cards: &[String]) -> std::io::Result<()> {
    let mut bytes = Vec::with_capacity(padded_len((cards.len() + 1) * CARD));
    for card in cards {
        bytes.extend_from_slice(card.as_bytes());
    }
    bytes.extend_from_slice(format!("{:<80}", "END").as_bytes());
    bytes.resize(padded_len(bytes.len()), b' ');
    w.write_all(&bytes)
}

fn write_data(w: &mut impl Write, data: &[u8]) -> std::io::Result<()> {
    w.write_all(data)?;
    w.write_all(&vec![0u8; padded_len(data.len()) - data.len()])
}
