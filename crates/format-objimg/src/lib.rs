//! Linked object image parser.
//!
//! The external assembler/linker pipeline emits a JSON document describing
//! the linked program: a symbol table (name to byte address), an ordered
//! list of sections (load address plus hex-encoded bytes), and an optional
//! explicit entry point. The simulator consumes this document; it never
//! sees ELF directly.
//!
//! # Format
//!
//! ```json
//! {
//!   "symbols":  { "_start": 0, "SUM": 4096, "ARR": 4104 },
//!   "sections": [ { "address": 0, "data": "04000014..." } ],
//!   "entry":    0
//! }
//! ```
//!
//! `addr` is accepted as an alias for `address`. `entry` is optional; when
//! absent the entry point falls back to the `_start` symbol. An image with
//! neither still loads - reporting a missing `_start` is the grader's job,
//! not the loader's.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Image load/validation failure.
#[derive(Debug)]
pub enum ImageError {
    /// The document is not valid JSON or does not match the schema.
    Parse(String),
    /// A section's `data` field is not a valid hex string.
    BadHex { address: u32, detail: String },
    /// Two sections occupy overlapping address ranges.
    Overlap { first: u32, second: u32 },
    /// A section extends past the top of the 32-bit address space.
    AddressRange { address: u32, length: usize },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(detail) => write!(f, "bad object image: {detail}"),
            Self::BadHex { address, detail } => {
                write!(f, "bad hex in section at 0x{address:08x}: {detail}")
            }
            Self::Overlap { first, second } => write!(
                f,
                "sections at 0x{first:08x} and 0x{second:08x} overlap"
            ),
            Self::AddressRange { address, length } => write!(
                f,
                "section at 0x{address:08x} ({length} bytes) exceeds the 32-bit address space"
            ),
        }
    }
}

impl std::error::Error for ImageError {}

/// One loadable span of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub address: u32,
    pub bytes: Vec<u8>,
}

/// The linked program: sections, symbol table, entry point.
///
/// Immutable after construction. The simulator lays the sections into
/// memory at reset; graders resolve symbols through it for the lifetime
/// of a grading session.
#[derive(Debug, Clone)]
pub struct ObjectImage {
    sections: Vec<Section>,
    symbols: BTreeMap<String, u32>,
    entry: Option<u32>,
}

/// Raw JSON shape, one-to-one with what the toolchain emits.
#[derive(Deserialize)]
struct RawImage {
    #[serde(default)]
    symbols: BTreeMap<String, u32>,
    #[serde(default)]
    sections: Vec<RawSection>,
    entry: Option<u32>,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(alias = "addr")]
    address: u32,
    data: String,
}

impl ObjectImage {
    /// Parse and validate a toolchain JSON document.
    pub fn from_json(text: &str) -> Result<Self, ImageError> {
        let raw: RawImage =
            serde_json::from_str(text).map_err(|e| ImageError::Parse(e.to_string()))?;

        let mut sections = Vec::with_capacity(raw.sections.len());
        for s in raw.sections {
            let bytes = decode_hex(&s.data).map_err(|detail| ImageError::BadHex {
                address: s.address,
                detail,
            })?;
            sections.push(Section {
                address: s.address,
                bytes,
            });
        }

        Self::validated(sections, raw.symbols, raw.entry)
    }

    /// Shared construction path: checks section ranges, rejects overlap.
    fn validated(
        sections: Vec<Section>,
        symbols: BTreeMap<String, u32>,
        entry: Option<u32>,
    ) -> Result<Self, ImageError> {
        for s in &sections {
            if u64::from(s.address) + s.bytes.len() as u64 > 1 << 32 {
                return Err(ImageError::AddressRange {
                    address: s.address,
                    length: s.bytes.len(),
                });
            }
        }

        // Overlap check over spans sorted by load address. Zero-length
        // sections cannot overlap anything.
        let mut spans: Vec<(u64, u64, u32)> = sections
            .iter()
            .filter(|s| !s.bytes.is_empty())
            .map(|s| {
                let start = u64::from(s.address);
                (start, start + s.bytes.len() as u64, s.address)
            })
            .collect();
        spans.sort_unstable();
        for pair in spans.windows(2) {
            if pair[1].0 < pair[0].1 {
                return Err(ImageError::Overlap {
                    first: pair[0].2,
                    second: pair[1].2,
                });
            }
        }

        Ok(Self {
            sections,
            symbols,
            entry,
        })
    }

    /// The loadable sections, in document order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The symbol table.
    #[must_use]
    pub fn symbols(&self) -> &BTreeMap<String, u32> {
        &self.symbols
    }

    /// Address of a symbol, if the program defines it.
    #[must_use]
    pub fn symbol(&self, name: &str) -> Option<u32> {
        self.symbols.get(name).copied()
    }

    /// The execution entry point: explicit `entry`, else `_start`.
    #[must_use]
    pub fn entry_point(&self) -> Option<u32> {
        self.entry.or_else(|| self.symbol("_start"))
    }
}

/// Programmatic image construction, for tests and tooling.
///
/// Runs the same validation as [`ObjectImage::from_json`].
#[derive(Debug, Default)]
pub struct ImageBuilder {
    sections: Vec<Section>,
    symbols: BTreeMap<String, u32>,
    entry: Option<u32>,
}

impl ImageBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a section from raw bytes.
    #[must_use]
    pub fn section(mut self, address: u32, bytes: Vec<u8>) -> Self {
        self.sections.push(Section { address, bytes });
        self
    }

    /// Add a section from 32-bit words, laid out little-endian.
    #[must_use]
    pub fn words(self, address: u32, words: &[u32]) -> Self {
        let mut bytes = Vec::with_capacity(words.len() * 4);
        for w in words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        self.section(address, bytes)
    }

    #[must_use]
    pub fn symbol(mut self, name: &str, address: u32) -> Self {
        self.symbols.insert(name.to_string(), address);
        self
    }

    #[must_use]
    pub fn entry(mut self, address: u32) -> Self {
        self.entry = Some(address);
        self
    }

    pub fn build(self) -> Result<ObjectImage, ImageError> {
        ObjectImage::validated(self.sections, self.symbols, self.entry)
    }
}

/// Decode a plain hex string (even length, no separators).
fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    if text.len() % 2 != 0 {
        return Err(format!("odd hex length {}", text.len()));
    }
    let digits = text.as_bytes();
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        bytes.push((hi << 4) | lo);
    }
    Ok(bytes)
}

fn hex_digit(d: u8) -> Result<u8, String> {
    match d {
        b'0'..=b'9' => Ok(d - b'0'),
        b'a'..=b'f' => Ok(d - b'a' + 10),
        b'A'..=b'F' => Ok(d - b'A' + 10),
        other => Err(format!("invalid hex digit {:?}", other as char)),
    }
}
