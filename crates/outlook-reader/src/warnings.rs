//! Structured, recoverable-diagnostic surface (component O).
//!
//! Every site in this crate that recovers from malformed input instead of
//! failing the whole parse emits a [`Warning`] with one of these stable codes
//! and keeps going with an empty/default value for the affected sub-structure.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Stable warning codes produced by this crate. MIME-layer codes
/// (`multipart_missing_boundary`, `nested_part_warning`, `malformed_header_line`)
/// are reserved for the external MIME-assembly collaborator and are never
/// emitted here, but are kept in the enum so callers can match exhaustively
/// across the whole pipeline's warnings without a second type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WarningCode {
    NameIdParseFailed,
    PropertyParseFailed,
    AttachmentSkipped,
    PstIndexParseFailed,
    PstDescriptorParseFailed,
    PstBranchLoopDetected,
    MalformedHeaderLine,
    MultipartMissingBoundary,
    NestedPartWarning,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameIdParseFailed => "nameid_parse_failed",
            Self::PropertyParseFailed => "property_parse_failed",
            Self::AttachmentSkipped => "attachment_skipped",
            Self::PstIndexParseFailed => "pst_index_parse_failed",
            Self::PstDescriptorParseFailed => "pst_descriptor_parse_failed",
            Self::PstBranchLoopDetected => "pst_branch_loop_detected",
            Self::MalformedHeaderLine => "malformed_header_line",
            Self::MultipartMissingBoundary => "multipart_missing_boundary",
            Self::NestedPartWarning => "nested_part_warning",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct Warning {
    pub code: WarningCode,
    pub severity: Severity,
    pub message: String,
    pub context: String,
    pub recoverable: bool,
}

impl Warning {
    pub fn new(code: WarningCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            context: String::new(),
            recoverable: true,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Accumulated warnings threaded through `(value, warnings)` parses, the same
/// propagation idiom the teacher crate uses end to end.
#[derive(Clone, Debug, Default)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        if matches!(warning.severity, Severity::Warn) {
            tracing::warn!(code = warning.code.as_str(), "{}", warning.message);
        } else if matches!(warning.severity, Severity::Error) {
            tracing::error!(code = warning.code.as_str(), "{}", warning.message);
        } else {
            tracing::debug!(code = warning.code.as_str(), "{}", warning.message);
        }
        self.0.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        for warning in other.0 {
            self.push(warning);
        }
    }

    pub fn contains_code(&self, code: WarningCode) -> bool {
        self.0.iter().any(|w| w.code == code)
    }

    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Warning> {
        self.0.iter().filter(move |w| w.severity == severity)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.0
    }
}

impl IntoIterator for Warnings {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
