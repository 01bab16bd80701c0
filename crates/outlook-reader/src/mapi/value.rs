//! Decoded MAPI property values and the property bag that holds them.

use super::prop_type::BaseType;
use crate::byte_window::ByteWindow;
use crate::guid::{Guid, PS_MAPI};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Numeric(u32),
    Named(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MapiKey {
    pub code: KeyCode,
    pub guid: Guid,
}

impl MapiKey {
    pub fn numeric(code: u32) -> Self {
        Self {
            code: KeyCode::Numeric(code),
            guid: PS_MAPI,
        }
    }

    pub fn named_numeric(code: u32, guid: Guid) -> Self {
        Self {
            code: KeyCode::Numeric(code),
            guid,
        }
    }

    pub fn named_string(name: impl Into<String>, guid: Guid) -> Self {
        Self {
            code: KeyCode::Named(name.into()),
            guid,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapiValue {
    Short(i16),
    Long(i32),
    Float32(f32),
    Float64(f64),
    Currency(i64),
    AppTime(f64),
    ErrorCode(u32),
    Boolean(bool),
    Int64(i64),
    /// `None` represents the MAPI "unset" FILETIME of all-zero ticks.
    SysTime(Option<u64>),
    Clsid(Guid),
    String8(Vec<u8>),
    Unicode(String),
    Binary(Vec<u8>),
    Object(Vec<u8>),
    MultiValue(Vec<MapiValue>),
}

impl MapiValue {
    pub fn as_str(&self) -> Option<String> {
        match self {
            Self::Unicode(s) => Some(s.clone()),
            Self::String8(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Short(v) => Some(*v as i64),
            Self::Long(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::Boolean(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) | Self::Object(b) | Self::String8(b) => Some(b),
            _ => None,
        }
    }
}

fn trim_trailing_nul(mut bytes: Vec<u8>) -> Vec<u8> {
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    bytes
}

/// Decodes the full UTF-16LE buffer (embedded NULs included) then strips
/// only *trailing* NUL code units, matching the PT_STRING8 trimming rule
/// instead of truncating at the first embedded NUL.
fn decode_unicode(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    while units.last() == Some(&0) {
        units.pop();
    }
    String::from_utf16_lossy(&units)
}

/// Decodes a byte buffer of at least the base type's natural width into a
/// [`MapiValue`]; used for both the 8-byte MSG inline slot and any
/// resolved-reference byte run from a PST property record.
pub fn decode_value(base: BaseType, bytes: &[u8]) -> Option<MapiValue> {
    let window = ByteWindow::new(bytes);
    Some(match base {
        BaseType::Short => MapiValue::Short(window.read_u16le(0).ok()? as i16),
        BaseType::Long => MapiValue::Long(window.read_i32le(0).ok()?),
        BaseType::Float32 => MapiValue::Float32(window.read_f32le(0).ok()?),
        BaseType::Float64 => MapiValue::Float64(window.read_f64le(0).ok()?),
        BaseType::Currency => MapiValue::Currency(window.read_i64le(0).ok()?),
        BaseType::AppTime => MapiValue::AppTime(window.read_f64le(0).ok()?),
        BaseType::ErrorCode => MapiValue::ErrorCode(window.read_u32le(0).ok()?),
        BaseType::Boolean => MapiValue::Boolean(window.read_u16le(0).ok()? != 0),
        BaseType::Int64 => MapiValue::Int64(window.read_i64le(0).ok()?),
        BaseType::SysTime => {
            let ticks = window.read_filetime(0).ok()?;
            MapiValue::SysTime(if ticks == 0 { None } else { Some(ticks) })
        }
        BaseType::Clsid => MapiValue::Clsid(Guid::read(&window, 0).ok()?),
        BaseType::String8 => MapiValue::String8(trim_trailing_nul(bytes.to_vec())),
        BaseType::Unicode => MapiValue::Unicode(decode_unicode(bytes)),
        BaseType::Binary => MapiValue::Binary(bytes.to_vec()),
        BaseType::Object => MapiValue::Object(bytes.to_vec()),
    })
}

#[derive(Clone, Debug, Default)]
pub struct PropertySet {
    values: HashMap<MapiKey, MapiValue>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: MapiKey, value: MapiValue) {
        self.values.insert(key, value);
    }

    pub fn get(&self, key: &MapiKey) -> Option<&MapiValue> {
        self.values.get(key)
    }

    /// Matches on the numeric code alone, ignoring the property set GUID.
    pub fn get_numeric(&self, code: u32) -> Option<&MapiValue> {
        self.values.iter().find_map(|(k, v)| match &k.code {
            KeyCode::Numeric(c) if *c == code => Some(v),
            _ => None,
        })
    }

    pub fn get_named_string(&self, name: &str) -> Option<&MapiValue> {
        self.values.iter().find_map(|(k, v)| match &k.code {
            KeyCode::Named(n) if n.eq_ignore_ascii_case(name) => Some(v),
            _ => None,
        })
    }

    pub fn get_first_numeric<'a>(&'a self, codes: &[u32]) -> Option<&'a MapiValue> {
        codes.iter().find_map(|&c| self.get_numeric(c))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapiKey, &MapiValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_long_and_boolean() {
        assert_eq!(
            decode_value(BaseType::Long, &42i32.to_le_bytes()),
            Some(MapiValue::Long(42))
        );
        assert_eq!(
            decode_value(BaseType::Boolean, &[1, 0]),
            Some(MapiValue::Boolean(true))
        );
    }

    #[test]
    fn systime_zero_is_unset() {
        assert_eq!(
            decode_value(BaseType::SysTime, &0u64.to_le_bytes()),
            Some(MapiValue::SysTime(None))
        );
    }

    #[test]
    fn string8_trims_trailing_nuls() {
        let v = decode_value(BaseType::String8, b"hello\0\0").unwrap();
        assert_eq!(v.as_str().unwrap(), "hello");
    }

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn unicode_trims_only_trailing_nuls() {
        let mut bytes = utf16le("hi\0there");
        bytes.extend_from_slice(&[0, 0]);
        let v = decode_value(BaseType::Unicode, &bytes).unwrap();
        assert_eq!(v.as_str().unwrap(), "hi\0there");
    }

    #[test]
    fn get_numeric_ignores_guid() {
        let mut props = PropertySet::new();
        props.insert(
            MapiKey::named_numeric(0x37, crate::guid::PSETID_COMMON),
            MapiValue::Long(7),
        );
        assert_eq!(props.get_numeric(0x37), Some(&MapiValue::Long(7)));
    }
}
