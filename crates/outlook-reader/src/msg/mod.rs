//! `.msg` container reading (components G, H).

pub mod assembly;
pub mod property_store;

pub use assembly::{open, Attachment, Msg, MsgError, MsgOpenResult, Recipient, RecipientType};
