//! A best-effort reader for Outlook `.msg` files and `.pst` mailbox archives.
//!
//! This crate never writes or mutates a container: it parses an
//! already-materialized byte blob (a loaded file, a memory-mapped region, a
//! downloaded attachment) and hands back a best-effort structure plus a list
//! of [`Warning`]s for anything it had to recover from along the way. Only
//! container-identification failures — a bad magic number, an unsupported
//! header version, a buffer too short to hold one — are hard errors; every
//! other malformed detail downgrades to a warning and an empty/default value.

pub mod byte_window;
pub mod cfb;
pub mod guid;
pub mod mapi;
pub mod msg;
pub mod pst;
pub mod warnings;

pub use cfb::CfbError;
pub use guid::Guid;
pub use mapi::{KeyCode, MapiKey, MapiType, MapiValue, PropertySet};
pub use msg::{Attachment, Msg, MsgError, Recipient, RecipientType};
pub use pst::{Item, ItemKind, PstError, PstStore};
pub use warnings::{Severity, Warning, WarningCode, Warnings};

use std::borrow::Cow;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutlookError {
    #[error("malformed CFB container: {0}")]
    Cfb(#[from] CfbError),
    #[error("malformed MSG container: {0}")]
    Msg(#[from] MsgError),
    #[error("malformed PST container: {0}")]
    Pst(#[from] PstError),
}

/// Parses a `.msg` byte blob into its root properties, recipients, and
/// attachments (embedded messages are resolved recursively).
pub fn open_msg(data: &[u8]) -> Result<msg::MsgOpenResult, OutlookError> {
    Ok(msg::open(data)?)
}

/// Opens a `.pst` byte blob: parses the header and both B-trees eagerly,
/// then exposes lazy, depth-first item traversal over the descriptor
/// hierarchy.
pub fn open_pst(data: &[u8]) -> Result<PstStore, OutlookError> {
    Ok(pst::open(data)?)
}

/// Applies the §6 input-dispatch rule: if `input` already begins with
/// `magic`, it's raw container bytes. Otherwise, if it decodes as UTF-8 and
/// names an existing regular file, that file's bytes are read. Otherwise
/// `input` is still treated as raw bytes, so a corrupted payload that merely
/// fails to look like a path never routes through a filesystem-error path.
fn resolve_input<'a>(input: &'a [u8], magic: &[u8]) -> Cow<'a, [u8]> {
    if input.starts_with(magic) {
        return Cow::Borrowed(input);
    }
    if let Ok(text) = std::str::from_utf8(input) {
        let path = Path::new(text);
        if path.is_file() {
            if let Ok(bytes) = std::fs::read(path) {
                return Cow::Owned(bytes);
            }
        }
    }
    Cow::Borrowed(input)
}

/// Opens a `.msg` container from either a filesystem path or a raw byte
/// sequence, per the §6 dispatch rule: `input` can be the file's bytes, or
/// the UTF-8 encoded path to it.
pub fn open_msg_path_or_bytes(input: &[u8]) -> Result<msg::MsgOpenResult, OutlookError> {
    open_msg(&resolve_input(input, &cfb::header::SIGNATURE))
}

/// Opens a `.pst` container from either a filesystem path or a raw byte
/// sequence, per the §6 dispatch rule: `input` can be the file's bytes, or
/// the UTF-8 encoded path to it.
pub fn open_pst_path_or_bytes(input: &[u8]) -> Result<PstStore, OutlookError> {
    open_pst(&resolve_input(input, &pst::header::MAGIC))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_msg_rejects_non_cfb_input() {
        let err = open_msg(b"not a compound file").unwrap_err();
        assert!(matches!(err, OutlookError::Cfb(_)));
    }

    #[test]
    fn open_pst_rejects_non_pst_input() {
        let err = open_pst(b"not a pst file at all").unwrap_err();
        assert!(matches!(err, OutlookError::Pst(_)));
    }

    #[test]
    fn path_or_bytes_treats_non_path_non_magic_input_as_raw_bytes() {
        let err = open_pst_path_or_bytes(b"not a pst file and not a path either").unwrap_err();
        assert!(matches!(err, OutlookError::Pst(_)));
    }

    #[test]
    fn path_or_bytes_reads_an_existing_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("outlook_reader_lib_test_not_a_pst.bin");
        std::fs::write(&path, b"still not a pst file").unwrap();
        let err = open_pst_path_or_bytes(path.to_str().unwrap().as_bytes()).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, OutlookError::Pst(_)));
    }
}
