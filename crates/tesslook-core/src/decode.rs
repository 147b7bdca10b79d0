use std::path::Path;

use tracing::debug;

use crate::consts::CUTOUT_HDU_INDEX;
use crate::error::{Result, TessError};
use crate::frame::DecodedFrame;
use crate::io::fits::FitsReader;

/// Decode the first time step of the cutout stack in extension 1 of `path`.
///
/// `expected` is the (height, width) the cutout was requested at; a frame
/// of any other shape is rejected. The file is open only for the duration
/// of the call.
pub fn decode(path: &Path, expected: Option<(usize, usize)>) -> Result<DecodedFrame> {
    let mut reader = FitsReader::open(path)?;
    let plane = reader.read_stack_plane(CUTOUT_HDU_INDEX, 0)?;
    let header = reader
        .hdu(CUTOUT_HDU_INDEX)
        .map(|hdu| hdu.header.clone())
        .unwrap_or_default();

    let shape = plane.data.dim();
    if let Some(expected) = expected {
        if shape != expected {
            return Err(TessError::decode(
                path,
                format!(
                    "frame is {}x{} but {}x{} was requested",
                    shape.1, shape.0, expected.1, expected.0
                ),
            ));
        }
    }

    debug!(
        path = %path.display(),
        width = shape.1,
        height = shape.0,
        time_steps = plane.time_steps,
        "Decoded cutout frame"
    );

    Ok(DecodedFrame {
        pixels: plane.data,
        header,
        source: path.to_path_buf(),
        time_steps: plane.time_steps,
    })
}
