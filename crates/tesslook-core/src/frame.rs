use std::fmt;
use std::path::PathBuf;

use ndarray::Array2;

/// A single 2D cutout frame decoded from a FITS product.
///
/// Pixel values are passed through exactly as stored (after BSCALE/BZERO).
/// Row 0 is the bottom row of the image, as in the FITS file.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    /// Pixel data, row-major, shape = (height, width)
    pub pixels: Array2<f64>,
    /// Header of the extension the frame was read from
    pub header: Header,
    pub source: PathBuf,
    /// Number of time steps in the stack the frame was taken from
    pub time_steps: usize,
}

impl DecodedFrame {
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Smallest and largest finite pixel values, or `None` if every pixel is NaN.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.pixels
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Typed value of a FITS header card.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Anything that did not parse as one of the above (e.g. complex values).
    Raw(String),
}

impl HeaderValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Raw(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) | Self::Raw(s) => write!(f, "{s}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
        }
    }
}

/// One keyword record.
#[derive(Clone, Debug, PartialEq)]
pub struct Card {
    pub key: String,
    pub value: HeaderValue,
    pub comment: Option<String>,
}

/// Ordered set of header cards. Commentary cards are not kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a card, replacing an earlier card with the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: HeaderValue) {
        let key = key.into();
        match self.cards.iter_mut().find(|c| c.key == key) {
            Some(card) => card.value = value,
            None => self.cards.push(Card {
                key,
                value,
                comment: None,
            }),
        }
    }

    pub(crate) fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.cards.iter().find(|c| c.key == key).map(|c| &c.value)
    }

    /// Display value of `key`, or `fallback` when the keyword is absent.
    pub fn get_or(&self, key: &str, fallback: &str) -> String {
        self.get(key)
            .map(|v| v.to_string())
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(HeaderValue::as_i64)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(HeaderValue::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_str)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
