//! `__properties_version1.0` + `__substg1.0_*` property assembly (component G).

use crate::byte_window::ByteWindow;
use crate::cfb::CfbImage;
use crate::mapi::{self, BaseType, MapiType, MapiValue, NamedPropertyMap, PropertySet};
use crate::warnings::{Severity, Warning, WarningCode, Warnings};
use std::collections::BTreeMap;

const INLINE_RECORD_SIZE: usize = 16;

/// Root storages (which own a `__nameid_version1.0` child) and embedded
/// message storages use a 32-byte properties-stream prefix; attachment and
/// recipient sub-storages use 8 bytes.
pub const ROOT_PREFIX: usize = 32;
pub const SUBSTORAGE_PREFIX: usize = 8;

struct SubstgName {
    code: u16,
    type_code: u16,
    index: Option<u32>,
}

fn parse_substg_name(name: &str) -> Option<SubstgName> {
    let rest = name
        .to_ascii_uppercase()
        .strip_prefix("__SUBSTG1.0_")?
        .to_string();
    let (hex, index_hex) = match rest.split_once('-') {
        Some((h, i)) => (h, Some(i)),
        None => (rest.as_str(), None),
    };
    if hex.len() != 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let code = u16::from_str_radix(&hex[0..4], 16).ok()?;
    let type_code = u16::from_str_radix(&hex[4..8], 16).ok()?;
    let index = match index_hex {
        Some(h) if h.len() == 8 && h.chars().all(|c| c.is_ascii_hexdigit()) => {
            Some(u32::from_str_radix(h, 16).ok()?)
        }
        Some(_) => return None,
        None => None,
    };
    Some(SubstgName {
        code,
        type_code,
        index,
    })
}

/// Builds the [`PropertySet`] for a single dirent: the inline fixed-size
/// values from its `__properties_version1.0` stream, overridden by any
/// `__substg1.0_*` child streams (variable-size values and multi-value
/// groups always win over the inline slot for the same key).
pub fn build(
    cfb: &CfbImage,
    dirent_sid: usize,
    prefix: usize,
    named_map: &NamedPropertyMap,
    warnings: &mut Warnings,
) -> PropertySet {
    let mut props = PropertySet::new();

    if let Some(props_sid) = cfb.find_child(dirent_sid, "__properties_version1.0") {
        let stream = cfb.read_stream(props_sid);
        decode_inline_table(&stream, prefix, named_map, &mut props);
    }

    decode_substg_children(cfb, dirent_sid, named_map, &mut props, warnings);
    props
}

fn decode_inline_table(
    stream: &[u8],
    prefix: usize,
    named_map: &NamedPropertyMap,
    props: &mut PropertySet,
) {
    if stream.len() <= prefix {
        return;
    }
    let body = &stream[prefix..];
    let window = ByteWindow::new(body);
    let record_count = body.len() / INLINE_RECORD_SIZE;

    for i in 0..record_count {
        let base = i * INLINE_RECORD_SIZE;
        let Ok(type_code) = window.read_u16le(base) else {
            continue;
        };
        let Ok(code) = window.read_u16le(base + 2) else {
            continue;
        };
        let mapi_type = MapiType(type_code);
        if mapi_type.is_multi_value() {
            continue;
        }
        let Some(base_type) = mapi_type.base() else {
            continue;
        };
        if !base_type.is_fixed_inline() {
            continue;
        }
        let Ok(value_bytes) = window.slice(base + 8, 8) else {
            continue;
        };
        if let Some(value) = mapi::decode_value(base_type, value_bytes) {
            let key = mapi::resolve_key(code, named_map);
            props.insert(key, value);
        }
    }
}

fn decode_substg_children(
    cfb: &CfbImage,
    dirent_sid: usize,
    named_map: &NamedPropertyMap,
    props: &mut PropertySet,
    warnings: &mut Warnings,
) {
    // Group multi-value streams by (code, type) so their indexed fragments
    // can be assembled in order before being inserted as one MultiValue.
    let mut groups: BTreeMap<(u16, u16), BTreeMap<u32, MapiValue>> = BTreeMap::new();

    for child_sid in cfb.children_of(dirent_sid) {
        let name = cfb.dirents[child_sid].name.clone();
        let Some(parsed) = parse_substg_name(&name) else {
            continue;
        };
        let mapi_type = MapiType(parsed.type_code);
        let Some(base_type) = mapi_type.base() else {
            continue;
        };
        let bytes = cfb.read_stream(child_sid);
        let Some(value) = mapi::decode_value(base_type, &bytes) else {
            warnings.push(
                Warning::new(
                    WarningCode::PropertyParseFailed,
                    Severity::Warn,
                    format!("failed to decode substg stream {name}"),
                )
                .with_context(name.clone()),
            );
            continue;
        };

        match parsed.index {
            Some(idx) => {
                groups
                    .entry((parsed.code, parsed.type_code))
                    .or_default()
                    .insert(idx, value);
            }
            None => {
                let key = mapi::resolve_key(parsed.code, named_map);
                props.insert(key, value);
            }
        }
    }

    for ((code, _type_code), values) in groups {
        let key = mapi::resolve_key(code, named_map);
        props.insert(key, MapiValue::MultiValue(values.into_values().collect()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_substg_name() {
        let parsed = parse_substg_name("__substg1.0_0037001E").unwrap();
        assert_eq!(parsed.code, 0x0037);
        assert_eq!(parsed.type_code, 0x001E);
        assert!(parsed.index.is_none());
    }

    #[test]
    fn parses_multi_value_substg_name() {
        let parsed = parse_substg_name("__substg1.0_1009101E-00000002").unwrap();
        assert_eq!(parsed.code, 0x1009);
        assert_eq!(parsed.index, Some(2));
    }

    #[test]
    fn rejects_unrelated_names() {
        assert!(parse_substg_name("__attach_version1.0_#0").is_none());
    }
}
