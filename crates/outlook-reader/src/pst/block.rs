//! Raw block dispatch and property decode (component M).
//!
//! Every block is either a property store (signature `0xBC`, one row) or a
//! property table (signature `0x7C`). Table blocks are parsed into a single
//! collapsed row rather than the full per-column schema — the documented
//! simplification recorded alongside this crate's other Open Question
//! decisions.

use crate::byte_window::ByteWindow;
use crate::mapi::{self, MapiKey, MapiType, MapiValue, NamedPropertyMap, PropertySet};

const PROPERTY_STORE_SIG: u8 = 0xBC;
const PROPERTY_TABLE_SIG: u8 = 0x7C;
const RECORD_SIZE: usize = 8;

#[derive(Clone, Debug)]
pub enum ParsedBlock {
    PropertyStore(PropertySet),
    PropertyTable(Vec<PropertySet>),
}

/// Resolves a reference value from a PST property record: `0` is null, a
/// value landing past the record table and inside the block is read as an
/// in-block length-prefixed run, anything else is looked up as an ID2 key.
fn resolve_reference(
    block: &[u8],
    offset_table_start: u16,
    reference: u32,
    resolve_id2: &dyn Fn(u32) -> Option<Vec<u8>>,
) -> Option<Vec<u8>> {
    if reference == 0 {
        return None;
    }
    let r = reference as usize;
    let window = ByteWindow::new(block);
    if r >= offset_table_start as usize && r < block.len() {
        let len = window.read_u32le(r).ok()? as usize;
        return window.slice(r + 4, len).ok().map(|b| b.to_vec());
    }
    resolve_id2(reference)
}

fn decode_multi_value(
    base: mapi::BaseType,
    bytes: &[u8],
) -> Vec<MapiValue> {
    use crate::mapi::BaseType;
    let window = ByteWindow::new(bytes);
    let Ok(count) = window.read_u32le(0) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(count as usize);
    let mut offset = 4usize;

    let fixed_width = match base {
        BaseType::Short | BaseType::Boolean => Some(2),
        BaseType::Long | BaseType::Float32 | BaseType::ErrorCode => Some(4),
        BaseType::Float64
        | BaseType::Currency
        | BaseType::AppTime
        | BaseType::Int64
        | BaseType::SysTime => Some(8),
        BaseType::Clsid => Some(16),
        _ => None,
    };

    for _ in 0..count {
        let value = match fixed_width {
            Some(width) => {
                let Ok(slice) = window.slice(offset, width) else {
                    break;
                };
                offset += width;
                mapi::decode_value(base, slice)
            }
            None => {
                let Ok(len) = window.read_u32le(offset) else {
                    break;
                };
                offset += 4;
                let Ok(slice) = window.slice(offset, len as usize) else {
                    break;
                };
                offset += len as usize;
                mapi::decode_value(base, slice)
            }
        };
        if let Some(v) = value {
            out.push(v);
        }
    }
    out
}

fn decode_row(
    page: &[u8],
    record_region_end: usize,
    offset_table_start: u16,
    named_map: &NamedPropertyMap,
    resolve_id2: &dyn Fn(u32) -> Option<Vec<u8>>,
) -> PropertySet {
    let mut props = PropertySet::new();
    let window = ByteWindow::new(page);
    let count = record_region_end / RECORD_SIZE;

    for i in 0..count {
        let base = 4 + i * RECORD_SIZE;
        let Ok(type_code) = window.read_u16le(base) else {
            continue;
        };
        let Ok(code) = window.read_u16le(base + 2) else {
            continue;
        };
        let Ok(reference) = window.read_u32le(base + 4) else {
            continue;
        };
        let mapi_type = MapiType(type_code);
        let Some(base_type) = mapi_type.base() else {
            continue;
        };
        let key: MapiKey = mapi::resolve_key(code, named_map);

        if mapi_type.is_multi_value() {
            if let Some(bytes) = resolve_reference(page, offset_table_start, reference, resolve_id2)
            {
                let values = decode_multi_value(base_type, &bytes);
                props.insert(key, MapiValue::MultiValue(values));
            }
            continue;
        }

        if base_type.is_fixed_in_four_bytes() {
            let Ok(value_bytes) = window.slice(base + 4, 4) else {
                continue;
            };
            if let Some(value) = mapi::decode_value(base_type, value_bytes) {
                props.insert(key, value);
            }
        } else if let Some(bytes) =
            resolve_reference(page, offset_table_start, reference, resolve_id2)
        {
            if let Some(value) = mapi::decode_value(base_type, &bytes) {
                props.insert(key, value);
            }
        }
    }
    props
}

pub fn parse_block(
    raw: &[u8],
    named_map: &NamedPropertyMap,
    resolve_id2: &dyn Fn(u32) -> Option<Vec<u8>>,
) -> Option<ParsedBlock> {
    if raw.len() < 4 {
        return None;
    }
    let window = ByteWindow::new(raw);
    let sig = window.slice(0, 1).ok()?[0];
    let offset_table_start = window.read_u16le(2).ok()?;
    let record_region_end = (offset_table_start as usize).saturating_sub(4).min(raw.len());

    match sig {
        PROPERTY_STORE_SIG => Some(ParsedBlock::PropertyStore(decode_row(
            raw,
            record_region_end,
            offset_table_start,
            named_map,
            resolve_id2,
        ))),
        PROPERTY_TABLE_SIG => Some(ParsedBlock::PropertyTable(vec![decode_row(
            raw,
            record_region_end,
            offset_table_start,
            named_map,
            resolve_id2,
        )])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(type_code: u16, code: u16, value: u32) -> [u8; 8] {
        let mut r = [0u8; 8];
        r[0..2].copy_from_slice(&type_code.to_le_bytes());
        r[2..4].copy_from_slice(&code.to_le_bytes());
        r[4..8].copy_from_slice(&value.to_le_bytes());
        r
    }

    #[test]
    fn decodes_a_long_inline() {
        let mut block = vec![0u8; 16];
        block[0] = PROPERTY_STORE_SIG;
        block[2..4].copy_from_slice(&12u16.to_le_bytes());
        block[4..12].copy_from_slice(&record(0x0003, 0x3602, 42));
        let named_map = NamedPropertyMap::default();
        let resolve_id2 = |_: u32| -> Option<Vec<u8>> { None };
        let parsed = parse_block(&block, &named_map, &resolve_id2).unwrap();
        match parsed {
            ParsedBlock::PropertyStore(props) => {
                assert_eq!(props.get_numeric(0x3602), Some(&MapiValue::Long(42)));
            }
            _ => panic!("expected a property store"),
        }
    }

    #[test]
    fn table_block_collapses_to_single_row() {
        let mut block = vec![0u8; 16];
        block[0] = PROPERTY_TABLE_SIG;
        block[2..4].copy_from_slice(&12u16.to_le_bytes());
        block[4..12].copy_from_slice(&record(0x0003, 0x3602, 7));
        let named_map = NamedPropertyMap::default();
        let resolve_id2 = |_: u32| -> Option<Vec<u8>> { None };
        let parsed = parse_block(&block, &named_map, &resolve_id2).unwrap();
        match parsed {
            ParsedBlock::PropertyTable(rows) => assert_eq!(rows.len(), 1),
            _ => panic!("expected a property table"),
        }
    }

    #[test]
    fn unknown_signature_is_rejected_gracefully() {
        let block = vec![0u8; 16];
        let named_map = NamedPropertyMap::default();
        let resolve_id2 = |_: u32| -> Option<Vec<u8>> { None };
        assert!(parse_block(&block, &named_map, &resolve_id2).is_none());
    }
}
