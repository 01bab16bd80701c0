//! The MAPI property model shared by the MSG and PST readers (components E, F).

pub mod named;
pub mod prop_type;
pub mod tags;
pub mod value;

pub use named::NamedPropertyMap;
pub use prop_type::{BaseType, MapiType};
pub use value::{decode_value, KeyCode, MapiKey, MapiValue, PropertySet};

/// Resolves a raw 16-bit property code against a named-property map: codes
/// below 0x8000 are always PS_MAPI numeric tags; codes at or above 0x8000 are
/// pseudo-codes that must be looked up, falling back to a bare PS_MAPI
/// numeric key if the nameid map has nothing for them (the override law's
/// last resort, never a hard failure).
pub fn resolve_key(code: u16, named_map: &NamedPropertyMap) -> MapiKey {
    if code < 0x8000 {
        return MapiKey::numeric(code as u32);
    }
    named_map
        .resolve(code)
        .cloned()
        .unwrap_or_else(|| MapiKey::numeric(code as u32))
}
