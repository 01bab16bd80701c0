//! `__nameid_version1.0` named-property map parsing (component F).
//!
//! Builds the pseudo-code (`0x8000 + entry index`) to [`MapiKey`] map from the
//! three streams in a `__nameid_version1.0` storage: a GUID stream, an entry
//! stream, and a string stream for string-named properties.

use super::value::{KeyCode, MapiKey};
use crate::byte_window::ByteWindow;
use crate::guid::{Guid, PS_MAPI, PS_PUBLIC_STRINGS};
use std::collections::HashMap;

const ENTRY_SIZE: usize = 8;
const GUID_SIZE: usize = 16;
const STRING_NAMED_BIT: u16 = 0x0001;

#[derive(Clone, Debug, Default)]
pub struct NamedPropertyMap {
    entries: HashMap<u16, MapiKey>,
}

impl NamedPropertyMap {
    pub fn resolve(&self, pseudo_code: u16) -> Option<&MapiKey> {
        self.entries.get(&pseudo_code)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses the GUID/entry/string streams of a `__nameid_version1.0`
    /// storage. Best-effort: any entry that fails to decode is skipped
    /// rather than aborting the whole map.
    pub fn parse(guid_stream: &[u8], entry_stream: &[u8], string_stream: &[u8]) -> Self {
        let guid_window = ByteWindow::new(guid_stream);
        let guid_count = guid_stream.len() / GUID_SIZE;
        let guids: Vec<Guid> = (0..guid_count)
            .filter_map(|i| Guid::read(&guid_window, i * GUID_SIZE).ok())
            .collect();

        let entry_window = ByteWindow::new(entry_stream);
        let entry_count = entry_stream.len() / ENTRY_SIZE;
        let mut entries = HashMap::with_capacity(entry_count);

        for i in 0..entry_count {
            let base = i * ENTRY_SIZE;
            let Ok(identifier) = entry_window.read_u32le(base) else {
                continue;
            };
            let Ok(index_and_kind) = entry_window.read_u16le(base + 4) else {
                continue;
            };
            let guid_index = index_and_kind >> 1;
            let guid = match guid_index {
                0 => PS_MAPI,
                1 => PS_PUBLIC_STRINGS,
                n => match guids.get((n - 2) as usize) {
                    Some(g) => *g,
                    None => continue,
                },
            };

            let pseudo_code = 0x8000u16.wrapping_add(i as u16);
            let key = if index_and_kind & STRING_NAMED_BIT != 0 {
                match read_prefixed_string(string_stream, identifier as usize) {
                    Some(name) => MapiKey::named_string(name, guid),
                    None => continue,
                }
            } else {
                MapiKey::named_numeric(identifier, guid)
            };
            entries.insert(pseudo_code, key);
        }

        Self { entries }
    }
}

/// Reads a length-prefixed (u32 byte count) UTF-16LE string at `offset` in
/// the nameid string stream.
fn read_prefixed_string(string_stream: &[u8], offset: usize) -> Option<String> {
    let window = ByteWindow::new(string_stream);
    let len = window.read_u32le(offset).ok()? as usize;
    window.read_utf16le(offset + 4, len).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_entry(s: &str) -> Vec<u8> {
        let utf16: Vec<u8> = s
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let mut out = (utf16.len() as u32).to_le_bytes().to_vec();
        out.extend(utf16);
        out
    }

    #[test]
    fn resolves_numeric_named_entry() {
        let mut entry_stream = Vec::new();
        entry_stream.extend(0x8501u32.to_le_bytes());
        entry_stream.extend(0u16.to_le_bytes());
        entry_stream.extend(0u16.to_le_bytes());
        let map = NamedPropertyMap::parse(&[], &entry_stream, &[]);
        let key = map.resolve(0x8000).unwrap();
        assert_eq!(key.code, KeyCode::Numeric(0x8501));
        assert_eq!(key.guid, PS_MAPI);
    }

    #[test]
    fn resolves_string_named_entry() {
        let string_stream = string_entry("x-custom-tag");
        let mut entry_stream = Vec::new();
        entry_stream.extend(0u32.to_le_bytes());
        entry_stream.extend((1u16 | (1 << 1)).to_le_bytes());
        entry_stream.extend(0u16.to_le_bytes());
        let map = NamedPropertyMap::parse(&[], &entry_stream, &string_stream);
        let key = map.resolve(0x8000).unwrap();
        assert_eq!(key.code, KeyCode::Named("x-custom-tag".to_string()));
        assert_eq!(key.guid, PS_PUBLIC_STRINGS);
    }

    #[test]
    fn malformed_entry_is_skipped_not_fatal() {
        let entry_stream = vec![0u8; 3];
        let map = NamedPropertyMap::parse(&[], &entry_stream, &[]);
        assert!(map.is_empty());
    }
}
