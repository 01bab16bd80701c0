//! 16-byte GUIDs in CFB/MAPI's mixed-endian wire layout, plus the well-known
//! property-set identifiers named throughout MS-OXPROPS.

use crate::byte_window::{ByteWindow, OutOfRange};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// Parses a 16-byte mixed-endian GUID: `data1`/`data2`/`data3` little-endian,
    /// `data4` as 8 literal bytes.
    pub fn read(window: &ByteWindow, offset: usize) -> Result<Self, OutOfRange> {
        let data1 = window.read_u32le(offset)?;
        let data2 = window.read_u16le(offset + 4)?;
        let data3 = window.read_u16le(offset + 6)?;
        let tail = window.slice(offset + 8, 8)?;
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(tail);
        Ok(Self {
            data1,
            data2,
            data3,
            data4,
        })
    }

    pub fn from_bytes(bytes: &[u8; 16]) -> Self {
        let window = ByteWindow::new(bytes);
        Self::read(&window, 0).expect("16 bytes is always in range")
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}}}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The root MAPI property set; holds every numeric tag below 0x8000.
pub const PS_MAPI: Guid = Guid::new(0x0002_0328, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);

/// Named properties resolved from a string (rather than an LID).
pub const PS_PUBLIC_STRINGS: Guid =
    Guid::new(0x0002_0329, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);

/// Internet-header named properties (e.g. `content-disposition`, `x-mailer`).
pub const PS_INTERNET_HEADERS: Guid =
    Guid::new(0x0002_0386, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);

pub const PSETID_ADDRESS: Guid =
    Guid::new(0x0006_2004, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);
pub const PSETID_APPOINTMENT: Guid =
    Guid::new(0x0006_2002, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);
pub const PSETID_COMMON: Guid =
    Guid::new(0x0006_2008, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);
pub const PSETID_TASK: Guid = Guid::new(0x0006_2003, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);
pub const PSETID_LOG: Guid = Guid::new(0x0006_200A, 0x0000, 0x0000, [0xC0, 0, 0, 0, 0, 0, 0, 0x46]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ps_mapi_canonical_format() {
        assert_eq!(
            PS_MAPI.to_string(),
            "{00020328-0000-0000-C000-000000000046}"
        );
    }

    #[test]
    fn round_trips_through_bytes() {
        let bytes: [u8; 16] = [
            0x28, 0x03, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x46,
        ];
        assert_eq!(Guid::from_bytes(&bytes), PS_MAPI);
    }
}
