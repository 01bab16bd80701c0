//! ID2 sub-node entry resolution (component N).

use crate::byte_window::ByteWindow;
use std::collections::HashMap;

/// Maps an ID2 key to the `idx_id` of the index record holding its data.
pub type Id2Map = HashMap<u32, u64>;

/// Parses an ID2 block's entries. Entries are 16 bytes wide
/// (`id2:u32, _:u32, idx_id:u32, _:u32`) when the block divides evenly into
/// 16s and is at least that wide, otherwise 8 bytes (`id2:u32, idx_id:u32`) —
/// the ANSI97 layout. Entries with `id2 == 0` are skipped.
pub fn parse(block: &[u8]) -> Id2Map {
    let mut map = HashMap::new();
    if block.is_empty() {
        return map;
    }
    let window = ByteWindow::new(block);

    let wide = block.len() >= 16 && block.len() % 16 == 0;
    let entry_size = if wide { 16 } else { 8 };
    let count = block.len() / entry_size;

    for i in 0..count {
        let base = i * entry_size;
        let Ok(id2) = window.read_u32le(base) else {
            continue;
        };
        if id2 == 0 {
            continue;
        }
        let idx_id = if wide {
            window.read_u32le(base + 8).map(|v| v as u64)
        } else {
            window.read_u32le(base + 4).map(|v| v as u64)
        };
        if let Ok(idx_id) = idx_id {
            map.insert(id2, idx_id);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wide_entries() {
        let mut block = vec![0u8; 16];
        block[0..4].copy_from_slice(&7u32.to_le_bytes());
        block[8..12].copy_from_slice(&0x1234u32.to_le_bytes());
        let map = parse(&block);
        assert_eq!(map.get(&7), Some(&0x1234));
    }

    #[test]
    fn skips_zero_id2_entries() {
        let block = vec![0u8; 16];
        let map = parse(&block);
        assert!(map.is_empty());
    }

    #[test]
    fn parses_narrow_entries_when_not_divisible_by_sixteen() {
        let mut block = vec![0u8; 8];
        block[0..4].copy_from_slice(&3u32.to_le_bytes());
        block[4..8].copy_from_slice(&99u32.to_le_bytes());
        let map = parse(&block);
        assert_eq!(map.get(&3), Some(&99));
    }
}
