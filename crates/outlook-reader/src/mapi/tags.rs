//! A curated subset of the MS-OXPROPS numeric tag registry: everything the
//! message/attachment/recipient assembly in `msg::assembly` and
//! `pst::item` look up by symbolic name.

pub const PR_IMPORTANCE: u32 = 0x0017;
pub const PR_MESSAGE_CLASS: u32 = 0x001A;
pub const PR_SENSITIVITY: u32 = 0x0036;
pub const PR_SUBJECT: u32 = 0x0037;
pub const PR_CLIENT_SUBMIT_TIME: u32 = 0x0039;
pub const PR_SENDER_NAME: u32 = 0x0C1A;
pub const PR_SENDER_ADDRTYPE: u32 = 0x0C1E;
pub const PR_SENDER_EMAIL_ADDRESS: u32 = 0x0C1F;
pub const PR_RECIPIENT_TYPE: u32 = 0x0C15;
pub const PR_DISPLAY_BCC: u32 = 0x0E02;
pub const PR_DISPLAY_CC: u32 = 0x0E03;
pub const PR_DISPLAY_TO: u32 = 0x0E04;
pub const PR_MESSAGE_DELIVERY_TIME: u32 = 0x0E06;
pub const PR_MESSAGE_FLAGS: u32 = 0x0E07;
pub const PR_BODY: u32 = 0x1000;
pub const PR_RTF_COMPRESSED: u32 = 0x1009;
pub const PR_BODY_HTML: u32 = 0x1013;
pub const PR_INTERNET_MESSAGE_ID: u32 = 0x1035;
pub const PR_INTERNET_REFERENCES: u32 = 0x1039;
pub const PR_IN_REPLY_TO_ID: u32 = 0x1042;
pub const PR_CONTENT_COUNT: u32 = 0x3602;
pub const PR_SUBFOLDERS: u32 = 0x360A;
pub const PR_DISPLAY_NAME: u32 = 0x3001;
pub const PR_EMAIL_ADDRESS: u32 = 0x3003;
pub const PR_CREATION_TIME: u32 = 0x3007;
pub const PR_LAST_MODIFICATION_TIME: u32 = 0x3008;
pub const PR_ATTACH_DATA_BIN: u32 = 0x3701;
pub const PR_ATTACH_EXTENSION: u32 = 0x3703;
pub const PR_ATTACH_FILENAME: u32 = 0x3704;
pub const PR_ATTACH_METHOD: u32 = 0x3705;
pub const PR_ATTACH_LONG_FILENAME: u32 = 0x3707;
pub const PR_ATTACH_RENDERING_POSITION: u32 = 0x370B;
pub const PR_ATTACH_MIME_TAG: u32 = 0x370E;
pub const PR_ATTACH_CONTENT_ID: u32 = 0x3712;
pub const PR_ATTACH_CONTENT_LOCATION: u32 = 0x3713;
pub const PR_ATTACH_CONTENT_DISPOSITION: u32 = 0x7FFE;
pub const PR_SENDER_SMTP_ADDRESS: u32 = 0x5D01;
pub const PR_SMTP_ADDRESS: u32 = 0x39FE;
pub const PR_TRANSMITTABLE_DISPLAY_NAME: u32 = 0x3A20;
pub const PR_RECIPIENT_DISPLAY_NAME: u32 = 0x5FF6;

/// Vendor-extension style fallback slot with no canonical MS-OXPROPS code;
/// kept only as the third link in the recipient-email fallback chain.
pub const PR_ORG_EMAIL_ADDR: u32 = 0x8CAA;

/// `PR_ATTACH_METHOD` value identifying an embedded `.msg` storage.
pub const ATTACH_METHOD_EMBEDDED_MSG: i64 = 5;
