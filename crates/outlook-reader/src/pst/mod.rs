//! PST mailbox archive reading: NDB header, B-trees, blocks, and the
//! descriptor/item hierarchy built on top of them (components J-N).

pub mod block;
pub mod btree;
pub mod crypt;
pub mod header;
pub mod id2;
pub mod item;

pub use header::{PstError, PstHeader, PstVersion};
pub use item::{Item, ItemKind, PstStore};

use crate::warnings::Warnings;

#[tracing::instrument(skip_all)]
pub fn open(blob: &[u8]) -> Result<PstStore, PstError> {
    let header = PstHeader::parse(blob)?;
    let mut warnings = Warnings::new();
    let index_records =
        btree::traverse_index(blob, header.version, header.index1_offset, &mut warnings);
    let descriptor_records = btree::traverse_descriptor(
        blob,
        header.version,
        header.index2_offset,
        &mut warnings,
    );
    Ok(PstStore::new(
        header,
        index_records,
        descriptor_records,
        blob.to_vec(),
        warnings,
    ))
}
