//! Directory entries and the red-black directory tree (component D).

use crate::byte_window::ByteWindow;
use crate::guid::Guid;
use std::collections::HashSet;

pub const ENTRY_SIZE: usize = 128;
pub const NO_STREAM: u32 = 0xFFFF_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirentType {
    Empty,
    Storage,
    Stream,
    Root,
}

#[derive(Clone, Debug)]
pub struct Dirent {
    pub sid: usize,
    pub name: String,
    pub dirent_type: DirentType,
    pub left_sid: u32,
    pub right_sid: u32,
    pub child_sid: u32,
    pub clsid: Guid,
    pub ctime: u64,
    pub mtime: u64,
    pub start_sector: u32,
    pub size: u64,
}

impl Dirent {
    fn parse_one(window: &ByteWindow, sid: usize) -> Option<Self> {
        let base = sid * ENTRY_SIZE;
        let name_size = window.read_u16le(base + 64).ok()? as usize;
        let name_bytes = name_size.saturating_sub(2).min(62);
        let name = window.read_utf16le(base, name_bytes.min(64)).unwrap_or_default();
        let type_byte = window.slice(base + 66, 1).ok()?[0];
        let dirent_type = match type_byte {
            1 => DirentType::Storage,
            2 => DirentType::Stream,
            5 => DirentType::Root,
            _ => DirentType::Empty,
        };
        let left_sid = window.read_u32le(base + 68).ok()?;
        let right_sid = window.read_u32le(base + 72).ok()?;
        let child_sid = window.read_u32le(base + 76).ok()?;
        let clsid = Guid::read(window, base + 80).unwrap_or(crate::guid::PS_MAPI);
        let ctime = window.read_filetime(base + 100).unwrap_or(0);
        let mtime = window.read_filetime(base + 108).unwrap_or(0);
        let start_sector = window.read_u32le(base + 116).ok()?;
        let size = window.read_u64le(base + 120).unwrap_or(0);

        Some(Self {
            sid,
            name,
            dirent_type,
            left_sid,
            right_sid,
            child_sid,
            clsid,
            ctime,
            mtime,
            start_sector,
            size,
        })
    }
}

/// Parses every 128-byte record in the directory stream; malformed or
/// short trailing records become `DirentType::Empty` placeholders so sibling
/// indices stay valid.
pub fn parse_dirents(dir_stream: &[u8]) -> Vec<Dirent> {
    let window = ByteWindow::new(dir_stream);
    let count = dir_stream.len() / ENTRY_SIZE;
    (0..count)
        .map(|sid| {
            Dirent::parse_one(&window, sid).unwrap_or(Dirent {
                sid,
                name: String::new(),
                dirent_type: DirentType::Empty,
                left_sid: NO_STREAM,
                right_sid: NO_STREAM,
                child_sid: NO_STREAM,
                clsid: crate::guid::PS_MAPI,
                ctime: 0,
                mtime: 0,
                start_sector: 0,
                size: 0,
            })
        })
        .collect()
}

/// In-order traversal of the red-black sibling tree rooted at
/// `dirents[parent].child_sid`, cycle-guarded against malformed links.
#[tracing::instrument(skip_all)]
pub fn children_in_order(dirents: &[Dirent], parent_sid: usize) -> Vec<usize> {
    let Some(parent) = dirents.get(parent_sid) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    in_order(dirents, parent.child_sid, &mut visited, &mut out);
    out
}

fn in_order(dirents: &[Dirent], sid: u32, visited: &mut HashSet<u32>, out: &mut Vec<usize>) {
    if sid == NO_STREAM || !visited.insert(sid) {
        return;
    }
    let Some(node) = dirents.get(sid as usize) else {
        return;
    };
    in_order(dirents, node.left_sid, visited, out);
    if node.dirent_type != DirentType::Empty {
        out.push(sid as usize);
    }
    in_order(dirents, node.right_sid, visited, out);
}

pub fn find_child(dirents: &[Dirent], parent_sid: usize, name: &str) -> Option<usize> {
    children_in_order(dirents, parent_sid)
        .into_iter()
        .find(|&sid| dirents[sid].name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, dtype: u8, left: u32, right: u32, child: u32) -> Vec<u8> {
        let mut buf = vec![0u8; ENTRY_SIZE];
        let utf16: Vec<u16> = name.encode_utf16().collect();
        for (i, unit) in utf16.iter().enumerate() {
            buf[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        buf[64..66].copy_from_slice(&(((utf16.len() as u16) + 1) * 2).to_le_bytes());
        buf[66] = dtype;
        buf[68..72].copy_from_slice(&left.to_le_bytes());
        buf[72..76].copy_from_slice(&right.to_le_bytes());
        buf[76..80].copy_from_slice(&child.to_le_bytes());
        buf
    }

    #[test]
    fn in_order_traversal_is_alphabetical() {
        let mut stream = Vec::new();
        stream.extend(entry("Root Entry", 5, NO_STREAM, NO_STREAM, 1));
        stream.extend(entry("b", 2, NO_STREAM, 2, NO_STREAM));
        stream.extend(entry("a", 2, NO_STREAM, NO_STREAM, NO_STREAM));
        let dirents = parse_dirents(&stream);
        let children = children_in_order(&dirents, 0);
        let names: Vec<&str> = children.iter().map(|&s| dirents[s].name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn cyclic_sibling_links_do_not_loop_forever() {
        let mut stream = Vec::new();
        stream.extend(entry("Root Entry", 5, NO_STREAM, NO_STREAM, 1));
        stream.extend(entry("x", 2, 1, NO_STREAM, NO_STREAM));
        let dirents = parse_dirents(&stream);
        let children = children_in_order(&dirents, 0);
        assert_eq!(children.len(), 1);
    }
}
