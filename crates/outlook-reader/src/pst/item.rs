//! Descriptor hierarchy, item classification, and lazy traversal (component N).

use super::block::{self, ParsedBlock};
use super::btree::{DescriptorRecord, IndexRecord};
use super::crypt;
use super::header::PstHeader;
use super::id2;
use crate::mapi::{tags, MapiValue, NamedPropertyMap, PropertySet};
use crate::warnings::{Severity, Warning, WarningCode, Warnings};
use std::collections::HashMap;

pub const ROOT_DESC_ID: u64 = 0x21;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Message,
    Appointment,
    Contact,
    Task,
    Note,
    Journal,
    Folder,
}

#[derive(Clone, Debug)]
pub struct Item {
    pub desc_id: u64,
    pub kind: ItemKind,
    pub properties: PropertySet,
}

impl Item {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder)
    }

    pub fn is_message(&self) -> bool {
        !self.is_folder()
    }
}

fn classify(properties: &PropertySet) -> ItemKind {
    if let Some(class) = properties
        .get_numeric(tags::PR_MESSAGE_CLASS)
        .and_then(MapiValue::as_str)
    {
        let lower = class.to_ascii_lowercase();
        return if lower.starts_with("ipm.note") || lower.starts_with("ipm.post") {
            ItemKind::Message
        } else if lower.starts_with("ipm.appointment") {
            ItemKind::Appointment
        } else if lower.starts_with("ipm.contact") {
            ItemKind::Contact
        } else if lower.starts_with("ipm.task") {
            ItemKind::Task
        } else if lower.starts_with("ipm.stickynote") {
            ItemKind::Note
        } else if lower.starts_with("ipm.activity") {
            ItemKind::Journal
        } else {
            ItemKind::Message
        };
    }
    let has_content_count = properties.get_numeric(tags::PR_CONTENT_COUNT).is_some();
    let has_subfolders = properties.get_numeric(tags::PR_SUBFOLDERS).is_some();
    if has_content_count || has_subfolders {
        ItemKind::Folder
    } else {
        ItemKind::Message
    }
}

#[derive(Clone, Debug)]
pub struct DescriptorNode {
    pub record: DescriptorRecord,
    pub children: Vec<u64>,
}

#[derive(Debug)]
pub struct PstStore {
    pub header: PstHeader,
    pub warnings: Warnings,
    index: HashMap<u64, IndexRecord>,
    descriptors: HashMap<u64, DescriptorNode>,
    blob: Vec<u8>,
    named_map: NamedPropertyMap,
}

impl PstStore {
    pub(crate) fn new(
        header: PstHeader,
        index_records: Vec<IndexRecord>,
        descriptor_records: Vec<DescriptorRecord>,
        blob: Vec<u8>,
        mut warnings: Warnings,
    ) -> Self {
        let index: HashMap<u64, IndexRecord> =
            index_records.into_iter().map(|r| (r.id, r)).collect();

        let mut descriptors: HashMap<u64, DescriptorNode> = descriptor_records
            .into_iter()
            .map(|r| {
                (
                    r.desc_id,
                    DescriptorNode {
                        record: r,
                        children: Vec::new(),
                    },
                )
            })
            .collect();

        if descriptors.is_empty() {
            warnings.push(Warning::new(
                WarningCode::PstDescriptorParseFailed,
                Severity::Warn,
                "descriptor B-tree produced no records",
            ));
        }
        if index.is_empty() {
            warnings.push(Warning::new(
                WarningCode::PstIndexParseFailed,
                Severity::Warn,
                "index B-tree produced no records",
            ));
        }

        let child_links: Vec<(u32, u64)> = descriptors
            .values()
            .map(|n| (n.record.parent_desc_id, n.record.desc_id))
            .collect();
        for (parent, child) in child_links {
            if let Some(parent_node) = descriptors.get_mut(&(parent as u64)) {
                parent_node.children.push(child);
            }
        }

        let mut store = Self {
            header,
            warnings,
            index,
            descriptors,
            blob,
            named_map: NamedPropertyMap::default(),
        };
        store.named_map = store.load_named_map();
        store
    }

    fn load_named_map(&self) -> NamedPropertyMap {
        // The PST name-to-id map lives under a well-known descriptor
        // (0x61) with its GUID/entry/string streams addressed through the
        // same ID2 machinery as any other sub-node; best-effort only, an
        // absent or malformed map just yields no named properties.
        const NAME_TO_ID_MAP_DESC: u64 = 0x61;
        const GUID_STREAM_ID2: u32 = 0x0002;
        const ENTRY_STREAM_ID2: u32 = 0x0003;
        const STRING_STREAM_ID2: u32 = 0x0004;

        let Some(id2_map) = self.id2_map_for(NAME_TO_ID_MAP_DESC) else {
            return NamedPropertyMap::default();
        };
        let guid_stream = self.resolve_id2_bytes(&id2_map, GUID_STREAM_ID2).unwrap_or_default();
        let entry_stream = self
            .resolve_id2_bytes(&id2_map, ENTRY_STREAM_ID2)
            .unwrap_or_default();
        let string_stream = self
            .resolve_id2_bytes(&id2_map, STRING_STREAM_ID2)
            .unwrap_or_default();
        NamedPropertyMap::parse(&guid_stream, &entry_stream, &string_stream)
    }

    fn read_index_bytes(&self, idx_id: u64) -> Option<Vec<u8>> {
        let record = self.index.get(&idx_id)?;
        let mut bytes = self
            .blob
            .get(record.offset as usize..(record.offset as usize + record.size as usize))?
            .to_vec();
        crypt::decrypt_block(&mut bytes, self.header.encryption_type);
        Some(bytes)
    }

    fn id2_map_for(&self, desc_id: u64) -> Option<id2::Id2Map> {
        let node = self.descriptors.get(&desc_id)?;
        if node.record.idx2_id == 0 {
            return Some(id2::Id2Map::new());
        }
        let bytes = self.read_index_bytes(node.record.idx2_id)?;
        Some(id2::parse(&bytes))
    }

    fn resolve_id2_bytes(&self, id2_map: &id2::Id2Map, key: u32) -> Option<Vec<u8>> {
        let idx_id = *id2_map.get(&key)?;
        self.read_index_bytes(idx_id)
    }

    /// Materializes a descriptor's own properties: reads its primary block
    /// via `idx_id`, dispatches by signature, and resolves any references
    /// against the descriptor's own ID2 map.
    #[tracing::instrument(skip(self))]
    pub fn load_item(&self, desc_id: u64) -> Option<Item> {
        let node = self.descriptors.get(&desc_id)?;
        let bytes = self.read_index_bytes(node.record.idx_id)?;
        let id2_map = if node.record.idx2_id != 0 {
            self.id2_map_for(desc_id).unwrap_or_default()
        } else {
            id2::Id2Map::new()
        };
        let resolve = |key: u32| -> Option<Vec<u8>> {
            let idx_id = *id2_map.get(&key)?;
            self.read_index_bytes(idx_id)
        };

        let properties = match block::parse_block(&bytes, &self.named_map, &resolve) {
            Some(ParsedBlock::PropertyStore(props)) => props,
            Some(ParsedBlock::PropertyTable(mut rows)) => rows.pop().unwrap_or_default(),
            None => PropertySet::new(),
        };

        let kind = classify(&properties);
        Some(Item {
            desc_id,
            kind,
            properties,
        })
    }

    pub fn items(&self) -> ItemIter<'_> {
        ItemIter {
            store: self,
            stack: vec![(ROOT_DESC_ID, 0)],
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = Item> + '_ {
        self.items()
            .filter_map(|(_depth, item)| item)
            .filter(|item| item.is_message())
    }

    pub fn folders(&self) -> impl Iterator<Item = Item> + '_ {
        self.items()
            .filter_map(|(_depth, item)| item)
            .filter(|item| item.is_folder())
    }

    pub fn walk(&self, mut f: impl FnMut(usize, &Item)) {
        for (depth, item) in self.items() {
            if let Some(item) = item {
                f(depth, &item);
            }
        }
    }
}

/// Depth-first traversal of the descriptor hierarchy, materializing each
/// [`Item`] lazily as it's visited.
pub struct ItemIter<'a> {
    store: &'a PstStore,
    stack: Vec<(u64, usize)>,
}

impl<'a> Iterator for ItemIter<'a> {
    type Item = (usize, Option<Item>);

    fn next(&mut self) -> Option<Self::Item> {
        let (desc_id, depth) = self.stack.pop()?;
        if let Some(node) = self.store.descriptors.get(&desc_id) {
            for &child in node.children.iter().rev() {
                self.stack.push((child, depth + 1));
            }
        }
        Some((depth, self.store.load_item(desc_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_folder_from_content_count() {
        let mut props = PropertySet::new();
        props.insert(
            crate::mapi::MapiKey::numeric(tags::PR_CONTENT_COUNT),
            MapiValue::Long(3),
        );
        assert_eq!(classify(&props), ItemKind::Folder);
    }

    #[test]
    fn classifies_by_message_class() {
        let mut props = PropertySet::new();
        props.insert(
            crate::mapi::MapiKey::numeric(tags::PR_MESSAGE_CLASS),
            MapiValue::Unicode("IPM.Contact".to_string()),
        );
        assert_eq!(classify(&props), ItemKind::Contact);
    }

    #[test]
    fn defaults_to_message_with_no_signal() {
        let props = PropertySet::new();
        assert_eq!(classify(&props), ItemKind::Message);
    }
}
