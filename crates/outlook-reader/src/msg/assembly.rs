//! `.msg` container assembly: root message, attachments, recipients, and
//! recursive embedded messages (component H).

use super::property_store::{self, ROOT_PREFIX, SUBSTORAGE_PREFIX};
use crate::cfb::{CfbError, CfbImage};
use crate::mapi::{tags, MapiValue, NamedPropertyMap, PropertySet};
use crate::warnings::{Severity, Warning, WarningCode, Warnings};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MsgError {
    #[error(transparent)]
    Cfb(#[from] CfbError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipientType {
    Originator,
    To,
    Cc,
    Bcc,
}

impl RecipientType {
    fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Originator,
            2 => Self::Cc,
            3 => Self::Bcc,
            _ => Self::To,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Recipient {
    pub name: String,
    pub email: String,
    pub kind: RecipientType,
    pub properties: PropertySet,
}

#[derive(Clone, Debug)]
pub struct Attachment {
    pub filename: String,
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
    pub embedded_msg: Option<Box<Msg>>,
    pub properties: PropertySet,
}

#[derive(Clone, Debug)]
pub struct Msg {
    pub properties: PropertySet,
    pub recipients: Vec<Recipient>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug)]
pub struct MsgOpenResult {
    pub msg: Msg,
    pub warnings: Warnings,
}

#[tracing::instrument(skip_all)]
pub fn open(blob: &[u8]) -> Result<MsgOpenResult, MsgError> {
    let cfb = CfbImage::open(blob)?;
    let mut warnings = Warnings::new();
    let msg = assemble(&cfb, crate::cfb::ROOT_SID, ROOT_PREFIX, &mut warnings);
    Ok(MsgOpenResult { msg, warnings })
}

fn load_named_map(cfb: &CfbImage, storage_sid: usize, warnings: &mut Warnings) -> NamedPropertyMap {
    let Some(nameid_sid) = cfb.find_child(storage_sid, "__nameid_version1.0") else {
        return NamedPropertyMap::default();
    };
    let guid_stream = cfb
        .find_child(nameid_sid, "__substg1.0_00020102")
        .map(|sid| cfb.read_stream(sid))
        .unwrap_or_default();
    let entry_stream = cfb
        .find_child(nameid_sid, "__substg1.0_00030102")
        .map(|sid| cfb.read_stream(sid))
        .unwrap_or_default();
    let string_stream = cfb
        .find_child(nameid_sid, "__substg1.0_00040102")
        .map(|sid| cfb.read_stream(sid))
        .unwrap_or_default();

    if entry_stream.is_empty() {
        warnings.push(Warning::new(
            WarningCode::NameIdParseFailed,
            Severity::Info,
            "no named property entries found",
        ));
        return NamedPropertyMap::default();
    }
    NamedPropertyMap::parse(&guid_stream, &entry_stream, &string_stream)
}

fn assemble(cfb: &CfbImage, storage_sid: usize, prefix: usize, warnings: &mut Warnings) -> Msg {
    let named_map = load_named_map(cfb, storage_sid, warnings);
    let properties = property_store::build(cfb, storage_sid, prefix, &named_map, warnings);

    let mut attachments = Vec::new();
    let mut recipients = Vec::new();

    for child_sid in cfb.children_of(storage_sid) {
        let name = cfb.dirents[child_sid].name.to_ascii_lowercase();
        if name.starts_with("__attach_version1.0_") {
            attachments.push(build_attachment(cfb, child_sid, &named_map, warnings));
        } else if name.starts_with("__recip_version1.0_") {
            recipients.push(build_recipient(cfb, child_sid, &named_map, warnings));
        }
    }

    Msg {
        properties,
        recipients,
        attachments,
    }
}

fn build_attachment(
    cfb: &CfbImage,
    attach_sid: usize,
    named_map: &NamedPropertyMap,
    warnings: &mut Warnings,
) -> Attachment {
    let properties = property_store::build(cfb, attach_sid, SUBSTORAGE_PREFIX, named_map, warnings);

    let filename = properties
        .get_first_numeric(&[tags::PR_ATTACH_LONG_FILENAME, tags::PR_ATTACH_FILENAME])
        .and_then(MapiValue::as_str)
        .unwrap_or_default();
    let mime_type = properties
        .get_numeric(tags::PR_ATTACH_MIME_TAG)
        .and_then(MapiValue::as_str);
    let method = properties
        .get_numeric(tags::PR_ATTACH_METHOD)
        .and_then(MapiValue::as_i64)
        .unwrap_or(0);

    let embedded_msg = if method == tags::ATTACH_METHOD_EMBEDDED_MSG {
        cfb.find_child(attach_sid, "__substg1.0_3701000D").map(|sid| {
            Box::new(assemble(cfb, sid, ROOT_PREFIX, warnings))
        })
    } else {
        None
    };

    let data = if embedded_msg.is_some() {
        Vec::new()
    } else {
        match properties.get_numeric(tags::PR_ATTACH_DATA_BIN) {
            Some(v) => v.as_bytes().map(|b| b.to_vec()).unwrap_or_default(),
            None => {
                warnings.push(Warning::new(
                    WarningCode::AttachmentSkipped,
                    Severity::Warn,
                    "attachment has no data stream and is not an embedded message",
                ));
                Vec::new()
            }
        }
    };

    Attachment {
        filename,
        data,
        mime_type,
        embedded_msg,
        properties,
    }
}

fn build_recipient(
    cfb: &CfbImage,
    recip_sid: usize,
    named_map: &NamedPropertyMap,
    warnings: &mut Warnings,
) -> Recipient {
    let properties = property_store::build(cfb, recip_sid, SUBSTORAGE_PREFIX, named_map, warnings);

    let name = properties
        .get_first_numeric(&[
            tags::PR_TRANSMITTABLE_DISPLAY_NAME,
            tags::PR_DISPLAY_NAME,
            tags::PR_RECIPIENT_DISPLAY_NAME,
        ])
        .and_then(MapiValue::as_str)
        .unwrap_or_default();
    let email = properties
        .get_first_numeric(&[
            tags::PR_SMTP_ADDRESS,
            tags::PR_ORG_EMAIL_ADDR,
            tags::PR_EMAIL_ADDRESS,
        ])
        .and_then(MapiValue::as_str)
        .unwrap_or_default();
    let kind = properties
        .get_numeric(tags::PR_RECIPIENT_TYPE)
        .and_then(MapiValue::as_i64)
        .map(RecipientType::from_code)
        .unwrap_or(RecipientType::To);

    Recipient {
        name,
        email,
        kind,
        properties,
    }
}
