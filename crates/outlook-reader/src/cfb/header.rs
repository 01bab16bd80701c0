//! CFB header parsing ([MS-CFB] §2.2), component B.
//!
//! Header issues are all hard failures: a container whose header we can't
//! trust gives us no safe way to locate the FAT, so there is nothing
//! recoverable to fall back to.

use crate::byte_window::ByteWindow;
use thiserror::Error;

pub const SECTOR_SIZE_DEFAULT: usize = 512;
pub const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const BYTE_ORDER_MARK: u16 = 0xFFFE;
const DIFAT_ENTRIES_IN_HEADER: usize = 109;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfbError {
    #[error("container is only {0} bytes, too short for a CFB header")]
    TooShort(usize),
    #[error("missing the D0CF11E0 CFB signature")]
    InvalidMagic,
    #[error("byte-order mark is not 0xFFFE")]
    InvalidByteOrder,
    #[error("unsupported CFB major version {0}")]
    UnsupportedVersion(u16),
    #[error("sector shift {0} is out of the supported range")]
    InvalidSectorShift(u16),
    #[error("mini stream cutoff size {0} is not the required 4096")]
    InvalidMiniCutoff(u32),
}

#[derive(Clone, Debug)]
pub struct CfbHeader {
    pub major_version: u16,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    pub num_fat_sectors: u32,
    pub dir_start_sector: u32,
    pub mini_stream_cutoff: u32,
    pub mini_fat_start: u32,
    pub num_mini_fat_sectors: u32,
    pub difat_start: u32,
    pub num_difat_sectors: u32,
    pub difat: Vec<u32>,
}

impl CfbHeader {
    pub fn sector_size(&self) -> usize {
        1usize << self.sector_shift
    }

    pub fn mini_sector_size(&self) -> usize {
        1usize << self.mini_sector_shift
    }

    pub fn parse(data: &[u8]) -> Result<Self, CfbError> {
        if data.len() < SECTOR_SIZE_DEFAULT {
            return Err(CfbError::TooShort(data.len()));
        }
        let window = ByteWindow::new(data);

        if window.slice(0, 8).map_err(|_| CfbError::TooShort(data.len()))? != SIGNATURE {
            return Err(CfbError::InvalidMagic);
        }

        let major_version = window.read_u16le(26).map_err(|_| CfbError::TooShort(data.len()))?;
        let byte_order = window.read_u16le(28).map_err(|_| CfbError::TooShort(data.len()))?;
        if byte_order != BYTE_ORDER_MARK {
            return Err(CfbError::InvalidByteOrder);
        }
        if major_version != 3 && major_version != 4 {
            return Err(CfbError::UnsupportedVersion(major_version));
        }

        let sector_shift = window.read_u16le(30).map_err(|_| CfbError::TooShort(data.len()))?;
        let expected_shift = if major_version == 3 { 9 } else { 12 };
        if sector_shift != expected_shift {
            return Err(CfbError::InvalidSectorShift(sector_shift));
        }
        let mini_sector_shift = window.read_u16le(32).map_err(|_| CfbError::TooShort(data.len()))?;

        let num_fat_sectors = window.read_u32le(44).map_err(|_| CfbError::TooShort(data.len()))?;
        let dir_start_sector = window.read_u32le(48).map_err(|_| CfbError::TooShort(data.len()))?;
        let mini_stream_cutoff = window.read_u32le(56).map_err(|_| CfbError::TooShort(data.len()))?;
        if mini_stream_cutoff != 4096 {
            return Err(CfbError::InvalidMiniCutoff(mini_stream_cutoff));
        }
        let mini_fat_start = window.read_u32le(60).map_err(|_| CfbError::TooShort(data.len()))?;
        let num_mini_fat_sectors = window.read_u32le(64).map_err(|_| CfbError::TooShort(data.len()))?;
        let difat_start = window.read_u32le(68).map_err(|_| CfbError::TooShort(data.len()))?;
        let num_difat_sectors = window.read_u32le(72).map_err(|_| CfbError::TooShort(data.len()))?;

        let mut difat = Vec::with_capacity(DIFAT_ENTRIES_IN_HEADER);
        for i in 0..DIFAT_ENTRIES_IN_HEADER {
            let entry = window
                .read_u32le(76 + i * 4)
                .map_err(|_| CfbError::TooShort(data.len()))?;
            difat.push(entry);
        }

        Ok(Self {
            major_version,
            sector_shift,
            mini_sector_shift,
            num_fat_sectors,
            dir_start_sector,
            mini_stream_cutoff,
            mini_fat_start,
            num_mini_fat_sectors,
            difat_start,
            num_difat_sectors,
            difat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_header_bytes() -> Vec<u8> {
        let mut data = vec![0u8; SECTOR_SIZE_DEFAULT];
        data[0..8].copy_from_slice(&SIGNATURE);
        data[26..28].copy_from_slice(&3u16.to_le_bytes());
        data[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
        data[30..32].copy_from_slice(&9u16.to_le_bytes());
        data[32..34].copy_from_slice(&6u16.to_le_bytes());
        data[48..52].copy_from_slice(&0xFFFF_FFFEu32.to_le_bytes());
        data[56..60].copy_from_slice(&4096u32.to_le_bytes());
        data[60..64].copy_from_slice(&0xFFFF_FFFEu32.to_le_bytes());
        data[68..72].copy_from_slice(&0xFFFF_FFFEu32.to_le_bytes());
        for i in 0..DIFAT_ENTRIES_IN_HEADER {
            data[76 + i * 4..80 + i * 4].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        }
        data
    }

    #[test]
    fn parses_minimal_valid_header() {
        let data = minimal_header_bytes();
        let header = CfbHeader::parse(&data).unwrap();
        assert_eq!(header.major_version, 3);
        assert_eq!(header.sector_size(), 512);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut data = minimal_header_bytes();
        data[0] = 0;
        assert_eq!(CfbHeader::parse(&data).unwrap_err(), CfbError::InvalidMagic);
    }

    #[test]
    fn rejects_bad_byte_order() {
        let mut data = minimal_header_bytes();
        data[28..30].copy_from_slice(&0x0000u16.to_le_bytes());
        assert_eq!(
            CfbHeader::parse(&data).unwrap_err(),
            CfbError::InvalidByteOrder
        );
    }

    #[test]
    fn rejects_short_buffer() {
        let err = CfbHeader::parse(&[0u8; 10]).unwrap_err();
        assert_eq!(err, CfbError::TooShort(10));
    }

    #[test]
    fn rejects_mismatched_sector_shift() {
        let mut data = minimal_header_bytes();
        data[30..32].copy_from_slice(&12u16.to_le_bytes());
        assert_eq!(
            CfbHeader::parse(&data).unwrap_err(),
            CfbError::InvalidSectorShift(12)
        );
    }
}
