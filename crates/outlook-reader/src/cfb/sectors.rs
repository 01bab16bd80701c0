//! FAT / MiniFAT construction and chain-following (component C).

use super::header::CfbHeader;
use crate::byte_window::ByteWindow;
use std::collections::HashSet;

pub const FREE_SECT: u32 = 0xFFFF_FFFF;
pub const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
pub const FAT_SECT: u32 = 0xFFFF_FFFD;
pub const DIF_SECT: u32 = 0xFFFF_FFFC;

/// Chains longer than this are treated as cyclic/corrupt and truncated.
pub const MAX_CHAIN_LENGTH: usize = 1_000_000;

fn is_sentinel(id: u32) -> bool {
    id == FREE_SECT || id == END_OF_CHAIN || id == FAT_SECT || id == DIF_SECT
}

pub fn sector_offset(sector: u32, sector_size: usize) -> usize {
    (sector as usize + 1) * sector_size
}

/// Walks a FAT-style singly linked chain starting at `start`, stopping at an
/// end-of-chain sentinel, a missing entry, or a revisited sector (cycle).
pub fn chain(fat: &[u32], start: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    let mut current = start;
    while !is_sentinel(current) {
        if !visited.insert(current) || out.len() >= MAX_CHAIN_LENGTH {
            break;
        }
        out.push(current);
        current = match fat.get(current as usize) {
            Some(&next) => next,
            None => break,
        };
    }
    out
}

/// Builds the flat FAT array: the n-th FAT sector (in header/DIFAT order)
/// covers sector ids `[n * entries_per_sector, (n+1) * entries_per_sector)`.
#[tracing::instrument(skip_all)]
pub fn build_fat(blob: &[u8], header: &CfbHeader) -> Vec<u32> {
    let sector_size = header.sector_size();
    let entries_per_sector = sector_size / 4;
    let window = ByteWindow::new(blob);

    let mut fat_sector_ids: Vec<u32> = header
        .difat
        .iter()
        .copied()
        .filter(|&id| !is_sentinel(id))
        .collect();

    if header.num_difat_sectors > 0 {
        let mut visited = HashSet::new();
        let mut current = header.difat_start;
        let mut hops = 0;
        while !is_sentinel(current) && hops < MAX_CHAIN_LENGTH {
            if !visited.insert(current) {
                break;
            }
            hops += 1;
            let offset = sector_offset(current, sector_size);
            let Ok(sector) = window.slice(offset, sector_size) else {
                break;
            };
            let sector_window = ByteWindow::new(sector);
            let pointers_in_sector = entries_per_sector - 1;
            for i in 0..pointers_in_sector {
                if let Ok(id) = sector_window.read_u32le(i * 4) {
                    if !is_sentinel(id) {
                        fat_sector_ids.push(id);
                    }
                }
            }
            current = sector_window
                .read_u32le(pointers_in_sector * 4)
                .unwrap_or(END_OF_CHAIN);
        }
    }

    let mut fat = vec![FREE_SECT; fat_sector_ids.len() * entries_per_sector];
    for (idx, &sector_id) in fat_sector_ids.iter().enumerate() {
        let offset = sector_offset(sector_id, sector_size);
        let Ok(sector) = window.slice(offset, sector_size) else {
            continue;
        };
        let sector_window = ByteWindow::new(sector);
        for j in 0..entries_per_sector {
            if let Ok(value) = sector_window.read_u32le(j * 4) {
                fat[idx * entries_per_sector + j] = value;
            }
        }
    }
    fat
}

/// Builds the flat MiniFAT array by concatenating the u32 entries of every
/// sector in the MiniFAT's own FAT chain, in chain order.
#[tracing::instrument(skip_all)]
pub fn build_mini_fat(blob: &[u8], header: &CfbHeader, fat: &[u32]) -> Vec<u32> {
    if is_sentinel(header.mini_fat_start) {
        return Vec::new();
    }
    let sector_size = header.sector_size();
    let entries_per_sector = sector_size / 4;
    let window = ByteWindow::new(blob);
    let sectors = chain(fat, header.mini_fat_start);

    let mut mini_fat = Vec::with_capacity(sectors.len() * entries_per_sector);
    for sector_id in sectors {
        let offset = sector_offset(sector_id, sector_size);
        let Ok(sector) = window.slice(offset, sector_size) else {
            break;
        };
        let sector_window = ByteWindow::new(sector);
        for j in 0..entries_per_sector {
            mini_fat.push(sector_window.read_u32le(j * 4).unwrap_or(FREE_SECT));
        }
    }
    mini_fat
}

/// Reads and concatenates every sector of `chain(fat, start)`, best-effort:
/// sectors that fall outside the blob are simply omitted from the tail.
pub fn read_stream(blob: &[u8], header: &CfbHeader, fat: &[u32], start: u32) -> Vec<u8> {
    let sector_size = header.sector_size();
    let window = ByteWindow::new(blob);
    let mut out = Vec::new();
    for sector_id in chain(fat, start) {
        let offset = sector_offset(sector_id, sector_size);
        match window.slice(offset, sector_size) {
            Ok(sector) => out.extend_from_slice(sector),
            Err(_) => break,
        }
    }
    out
}

/// Reads a stream living in the mini stream (the root storage's own regular
/// stream, already materialized into `mini_stream_bytes`).
pub fn read_mini_stream(
    header: &CfbHeader,
    mini_fat: &[u32],
    mini_stream_bytes: &[u8],
    start: u32,
    size: u64,
) -> Vec<u8> {
    let mini_sector_size = header.mini_sector_size();
    let window = ByteWindow::new(mini_stream_bytes);
    let mut out = Vec::new();
    for sector_id in chain(mini_fat, start) {
        let offset = sector_id as usize * mini_sector_size;
        match window.slice(offset, mini_sector_size) {
            Ok(sector) => out.extend_from_slice(sector),
            Err(_) => break,
        }
    }
    out.truncate(size as usize);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_stops_at_end_of_chain() {
        let fat = vec![1, 2, END_OF_CHAIN, 99];
        assert_eq!(chain(&fat, 0), vec![0, 1, 2]);
    }

    #[test]
    fn chain_breaks_cycles() {
        let fat = vec![1, 0];
        assert_eq!(chain(&fat, 0), vec![0, 1]);
    }

    #[test]
    fn chain_stops_at_missing_entry() {
        let fat = vec![5];
        assert_eq!(chain(&fat, 0), vec![0]);
    }
}
