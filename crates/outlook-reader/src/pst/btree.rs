//! Index and descriptor B-tree traversal (component L).

use super::header::PstVersion;
use crate::byte_window::ByteWindow;
use crate::warnings::{Severity, Warning, WarningCode, Warnings};
use std::collections::HashSet;

const PAGE_SIZE: usize = 512;
const TRAILER_OFFSET: usize = 496;
pub const MAX_CHAIN_LENGTH: usize = 1_000_000;

#[derive(Clone, Debug)]
pub struct IndexRecord {
    pub id: u64,
    pub offset: u64,
    pub size: u16,
}

#[derive(Clone, Debug)]
pub struct DescriptorRecord {
    pub desc_id: u64,
    pub idx_id: u64,
    pub idx2_id: u64,
    pub parent_desc_id: u32,
}

struct Trailer {
    item_count: u8,
    entry_size: u8,
    level: u8,
}

fn read_trailer(page: &[u8]) -> Option<Trailer> {
    let window = ByteWindow::new(page);
    Some(Trailer {
        item_count: window.slice(TRAILER_OFFSET, 1).ok()?[0],
        entry_size: window.slice(TRAILER_OFFSET + 2, 1).ok()?[0],
        level: window.slice(TRAILER_OFFSET + 3, 1).ok()?[0],
    })
}

fn branch_entries(page: &[u8], version: PstVersion, item_count: u8) -> Vec<(u64, u64)> {
    let width = version.width();
    let entry_size = width * 3;
    let window = ByteWindow::new(page);
    let max_entries = TRAILER_OFFSET / entry_size;
    let count = (item_count as usize).min(max_entries);

    (0..count)
        .filter_map(|i| {
            let base = i * entry_size;
            let id = read_width(&window, base, width)?;
            let child_offset = read_width(&window, base + width, width)?;
            Some((id, child_offset))
        })
        .collect()
}

fn read_width(window: &ByteWindow, offset: usize, width: usize) -> Option<u64> {
    if width == 4 {
        window.read_u32le(offset).ok().map(|v| v as u64)
    } else {
        window.read_u64le(offset).ok()
    }
}

fn page_at(blob: &[u8], offset: u64) -> Option<&[u8]> {
    let window = ByteWindow::new(blob);
    window.slice(offset as usize, PAGE_SIZE).ok()
}

/// Index leaf record width: `(id, offset)` at `width` each, plus a `u16`
/// size and a `u16` flags field, plus (unicode2003 only) a trailing `u32` pad.
fn index_leaf_entry_size(version: PstVersion) -> usize {
    let width = version.width();
    match version {
        PstVersion::Ansi97 => width * 2 + 4,
        PstVersion::Unicode2003 => width * 2 + 8,
    }
}

/// Descriptor leaf record width: `(desc_id, idx_id, idx2_id)` at `width`
/// each, plus a `u32` parent, plus (unicode2003 only) a trailing `u32` pad.
fn descriptor_leaf_entry_size(version: PstVersion) -> usize {
    let width = version.width();
    match version {
        PstVersion::Ansi97 => width * 3 + 4,
        PstVersion::Unicode2003 => width * 3 + 8,
    }
}

#[tracing::instrument(skip_all)]
pub fn traverse_index(
    blob: &[u8],
    version: PstVersion,
    start_offset: u64,
    warnings: &mut Warnings,
) -> Vec<IndexRecord> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    walk(
        blob,
        version,
        start_offset,
        &mut visited,
        warnings,
        &mut |page, item_count| {
            let entry_size = index_leaf_entry_size(version);
            let width = version.width();
            let window = ByteWindow::new(page);
            let max_entries = TRAILER_OFFSET / entry_size;
            let count = (item_count as usize).min(max_entries);
            for i in 0..count {
                let base = i * entry_size;
                let Some(id) = read_width(&window, base, width) else {
                    continue;
                };
                let Some(offset) = read_width(&window, base + width, width) else {
                    continue;
                };
                let Ok(size) = window.read_u16le(base + width * 2) else {
                    continue;
                };
                out.push(IndexRecord { id, offset, size });
            }
        },
    );
    out
}

#[tracing::instrument(skip_all)]
pub fn traverse_descriptor(
    blob: &[u8],
    version: PstVersion,
    start_offset: u64,
    warnings: &mut Warnings,
) -> Vec<DescriptorRecord> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    walk(
        blob,
        version,
        start_offset,
        &mut visited,
        warnings,
        &mut |page, item_count| {
            let entry_size = descriptor_leaf_entry_size(version);
            let width = version.width();
            let window = ByteWindow::new(page);
            let max_entries = TRAILER_OFFSET / entry_size;
            let count = (item_count as usize).min(max_entries);
            for i in 0..count {
                let base = i * entry_size;
                let Some(desc_id) = read_width(&window, base, width) else {
                    continue;
                };
                let Some(idx_id) = read_width(&window, base + width, width) else {
                    continue;
                };
                let Some(idx2_id) = read_width(&window, base + width * 2, width) else {
                    continue;
                };
                let Ok(parent_desc_id) = window.read_u32le(base + width * 3) else {
                    continue;
                };
                out.push(DescriptorRecord {
                    desc_id,
                    idx_id,
                    idx2_id,
                    parent_desc_id,
                });
            }
        },
    );
    out
}

/// Shared branch/leaf descent with a visited-offset cycle guard, bounded by
/// [`MAX_CHAIN_LENGTH`] total pages. On re-entry into an already-visited
/// offset, emits `pst_branch_loop_detected` and stops descending that branch.
fn walk(
    blob: &[u8],
    version: PstVersion,
    offset: u64,
    visited: &mut HashSet<u64>,
    warnings: &mut Warnings,
    on_leaf: &mut dyn FnMut(&[u8], u8),
) {
    if visited.len() >= MAX_CHAIN_LENGTH {
        return;
    }
    if !visited.insert(offset) {
        warnings.push(Warning::new(
            WarningCode::PstBranchLoopDetected,
            Severity::Warn,
            format!("branch page at offset {offset:#x} re-entered during traversal"),
        ));
        return;
    }
    let Some(page) = page_at(blob, offset) else {
        return;
    };
    let Some(trailer) = read_trailer(page) else {
        return;
    };

    if trailer.level == 0 {
        on_leaf(page, trailer.item_count);
        return;
    }

    for (_id, child_offset) in branch_entries(page, version, trailer.item_count) {
        walk(blob, version, child_offset, visited, warnings, on_leaf);
    }
    let _ = trailer.entry_size;
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSI_INDEX_LEAF_SIZE: usize = 12;

    fn leaf_index_page(entries: &[(u32, u32, u16)]) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        for (i, (id, offset, size)) in entries.iter().enumerate() {
            let base = i * ANSI_INDEX_LEAF_SIZE;
            page[base..base + 4].copy_from_slice(&id.to_le_bytes());
            page[base + 4..base + 8].copy_from_slice(&offset.to_le_bytes());
            page[base + 8..base + 10].copy_from_slice(&size.to_le_bytes());
        }
        page[TRAILER_OFFSET] = entries.len() as u8;
        page[TRAILER_OFFSET + 2] = ANSI_INDEX_LEAF_SIZE as u8;
        page[TRAILER_OFFSET + 3] = 0;
        page
    }

    #[test]
    fn traverses_single_leaf_index_page() {
        let page = leaf_index_page(&[(1, 0x1000, 64), (2, 0x2000, 128)]);
        let mut warnings = Warnings::new();
        let records = traverse_index(&page, PstVersion::Ansi97, 0, &mut warnings);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].offset, 0x2000);
        assert!(warnings.is_empty());
    }

    #[test]
    fn second_record_in_a_multi_entry_page_reads_at_the_correct_offset() {
        let page = leaf_index_page(&[(1, 0x1000, 64), (2, 0x2000, 128), (3, 0x3000, 256)]);
        let mut warnings = Warnings::new();
        let records = traverse_index(&page, PstVersion::Ansi97, 0, &mut warnings);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].offset, 0x2000);
        assert_eq!(records[1].size, 128);
        assert_eq!(records[2].id, 3);
        assert_eq!(records[2].offset, 0x3000);
        assert_eq!(records[2].size, 256);
    }

    #[test]
    fn oversized_item_count_is_clamped_not_panicking() {
        let mut page = leaf_index_page(&[(1, 0x1000, 64)]);
        page[TRAILER_OFFSET] = 0xFF;
        let mut warnings = Warnings::new();
        let records = traverse_index(&page, PstVersion::Ansi97, 0, &mut warnings);
        assert!(records.len() <= PAGE_SIZE / ANSI_INDEX_LEAF_SIZE);
    }

    /// End-to-end scenario 8: a single branch page at offset 512 whose only
    /// entry points to offset 512 (itself).
    #[test]
    fn scenario_8_self_referential_branch_emits_loop_warning() {
        let mut blob = vec![0u8; PAGE_SIZE * 2];
        let page = &mut blob[PAGE_SIZE..PAGE_SIZE * 2];
        // one branch entry pointing back at its own page offset
        page[0..4].copy_from_slice(&1u32.to_le_bytes());
        page[4..8].copy_from_slice(&(PAGE_SIZE as u32).to_le_bytes());
        page[TRAILER_OFFSET] = 1;
        page[TRAILER_OFFSET + 3] = 1;
        let mut warnings = Warnings::new();
        let records = traverse_index(&blob, PstVersion::Ansi97, PAGE_SIZE as u64, &mut warnings);
        assert!(records.is_empty());
        assert!(warnings.contains_code(WarningCode::PstBranchLoopDetected));
    }
}
