//! [MS-OXRTFCP]: decompression of compressed-RTF payloads.
//!
//! A compressed-RTF payload is a 16-byte header ([`CompressedRtfHeader`])
//! followed by either a raw copy of the RTF text (`COMPTYPE_UNCOMPRESSED`) or an
//! LZ77-style token stream over a dictionary seeded with a fixed 207-byte RTF
//! boilerplate prefix (`COMPTYPE_COMPRESSED`). This crate only decompresses: the
//! containers that embed compressed RTF (`.msg` substg streams, PST property
//! blocks) are read-only in this reader, so there is no encoder here.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};
use thiserror::Error;

mod dictionary;

use dictionary::Dictionary;

pub const COMPRESSED: u32 = 0x75465A4C;
pub const UNCOMPRESSED: u32 = 0x414C454D;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0:?}")]
    Io(#[from] io::Error),
    #[error("compressed RTF header is truncated: {0} bytes")]
    InvalidHeader(usize),
    #[error("unrecognized COMPTYPE: 0x{0:08X}")]
    InvalidMagic(u32),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The fixed 16-byte header in front of every compressed-RTF payload.
#[derive(Clone, Copy, Debug)]
pub struct CompressedRtfHeader {
    pub comp_size: u32,
    pub raw_size: u32,
    pub magic: u32,
    pub crc: u32,
}

impl CompressedRtfHeader {
    pub const SIZE: usize = 16;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::InvalidHeader(data.len()));
        }
        let mut cursor = Cursor::new(data);
        let comp_size = cursor.read_u32::<LittleEndian>()?;
        let raw_size = cursor.read_u32::<LittleEndian>()?;
        let magic = cursor.read_u32::<LittleEndian>()?;
        let crc = cursor.read_u32::<LittleEndian>()?;
        Ok(Self {
            comp_size,
            raw_size,
            magic,
            crc,
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.magic == COMPRESSED
    }
}

/// Decompress a full compressed-RTF payload (header + body) into raw RTF bytes,
/// truncated to the header's advertised `raw_size`.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let header = CompressedRtfHeader::parse(data)?;
    let body = &data[CompressedRtfHeader::SIZE..];

    match header.magic {
        UNCOMPRESSED => {
            let end = (header.raw_size as usize).min(body.len());
            Ok(body[..end].to_vec())
        }
        COMPRESSED => {
            let mut dictionary = Dictionary::default();
            let mut output = Vec::with_capacity(header.raw_size as usize);
            let mut cursor = Cursor::new(body);

            'tokens: while let Ok(control) = cursor.read_u8() {
                for bit in 0..8 {
                    if control & (1 << bit) == 0 {
                        let Ok(byte) = cursor.read_u8() else {
                            break 'tokens;
                        };
                        output.push(byte);
                        dictionary.write_byte(byte);
                    } else {
                        let Ok(reference) = dictionary::DictionaryReference::read(&mut cursor)
                        else {
                            break 'tokens;
                        };
                        let Some(mut bytes) = dictionary.resolve(reference) else {
                            break 'tokens;
                        };
                        output.append(&mut bytes);
                    }
                }
            }

            output.truncate(header.raw_size as usize);
            Ok(output)
        }
        invalid => Err(Error::InvalidMagic(invalid)),
    }
}

/// Build the 16-byte header + body for an uncompressed payload. Test/fixture
/// helper only — this reader never needs to produce compressed-RTF output, only
/// to round-trip the uncompressed form for the determinism property below.
pub fn wrap_uncompressed(raw: &[u8]) -> Vec<u8> {
    use byteorder::WriteBytesExt;

    let mut out = Vec::with_capacity(raw.len() + CompressedRtfHeader::SIZE);
    let comp_size = raw.len() as u32 + 12;
    out.write_u32::<LittleEndian>(comp_size).unwrap();
    out.write_u32::<LittleEndian>(raw.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(UNCOMPRESSED).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.extend_from_slice(raw);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// [Example 1: Simple Compressed RTF](https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxrtfcp/029bff74-8c00-402e-ac2b-0210a5f57371)
    const COMPRESSED_SIMPLE_RTF: &[u8] = &[
        0x2d, 0x00, 0x00, 0x00, 0x2b, 0x00, 0x00, 0x00, 0x4c, 0x5a, 0x46, 0x75, 0xf1, 0xc5, 0xc7,
        0xa7, 0x03, 0x00, 0x0a, 0x00, 0x72, 0x63, 0x70, 0x67, 0x31, 0x32, 0x35, 0x42, 0x32, 0x0a,
        0xf3, 0x20, 0x68, 0x65, 0x6c, 0x09, 0x00, 0x20, 0x62, 0x77, 0x05, 0xb0, 0x6c, 0x64, 0x7d,
        0x0a, 0x80, 0x0f, 0xa0,
    ];
    const UNCOMPRESSED_SIMPLE_RTF: &[u8] = b"{\\rtf1\\ansi\\ansicpg1252\\pard hello world}\r\n";

    #[test]
    fn test_decompress_simple_rtf() {
        let rtf = decompress(COMPRESSED_SIMPLE_RTF).unwrap();
        assert_eq!(rtf, UNCOMPRESSED_SIMPLE_RTF);
    }

    /// [Example 2: Reading a Token from the Dictionary that Crosses WritePosition](https://learn.microsoft.com/en-us/openspecs/exchange_server_protocols/ms-oxrtfcp/421a2da5-7752-4985-8981-0f19f1e5b687)
    const COMPRESSED_CROSSING_WRITE_RTF: &[u8] = &[
        0x1a, 0x00, 0x00, 0x00, 0x1c, 0x00, 0x00, 0x00, 0x4c, 0x5a, 0x46, 0x75, 0xe2, 0xd4, 0x4b,
        0x51, 0x41, 0x00, 0x04, 0x20, 0x57, 0x58, 0x59, 0x5a, 0x0d, 0x6e, 0x7d, 0x01, 0x0e, 0xb0,
    ];
    const UNCOMPRESSED_CROSSING_WRITE_RTF: &[u8] = b"{\\rtf1 WXYZWXYZWXYZWXYZWXYZ}";

    #[test]
    fn test_decompress_crossing_write_rtf() {
        let rtf = decompress(COMPRESSED_CROSSING_WRITE_RTF).unwrap();
        assert_eq!(rtf, UNCOMPRESSED_CROSSING_WRITE_RTF);
    }

    #[test]
    fn uncompressed_round_trip() {
        let raw = b"{\\rtf1 Hello World}";
        let wrapped = wrap_uncompressed(raw);
        let out = decompress(&wrapped).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn decompress_is_deterministic() {
        let a = decompress(COMPRESSED_SIMPLE_RTF).unwrap();
        let b = decompress(COMPRESSED_SIMPLE_RTF).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn header_too_short_is_invalid_header() {
        let err = decompress(&[0u8; 8]).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(8)));
    }

    #[test]
    fn unrecognized_magic_is_rejected() {
        let mut data = COMPRESSED_SIMPLE_RTF.to_vec();
        data[8..12].copy_from_slice(&[0, 0, 0, 0]);
        let err = decompress(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic(0)));
    }

    #[test]
    fn truncated_stream_stops_without_panic() {
        let truncated = &COMPRESSED_SIMPLE_RTF[..COMPRESSED_SIMPLE_RTF.len() - 3];
        let out = decompress(truncated).unwrap();
        assert!(out.len() <= UNCOMPRESSED_SIMPLE_RTF.len());
    }
}
