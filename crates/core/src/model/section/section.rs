use serde::Serialize;

use super::data::{SectionData, SectionKind};
use super::raw::RawSection;
use crate::model::ids::SectionId;

/// Single interactive unit within a module.
///
/// Sections are immutable snapshots: edits return a new value and never move
/// the section, since its position is owned by the parent module's ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    id: SectionId,
    title: String,
    order_id: u32,
    #[serde(rename = "type")]
    kind: SectionKind,
    data: SectionData,
}

impl Section {
    /// Creates an unplaced section; the ordering engine assigns `order_id`.
    pub fn new(id: SectionId, title: impl Into<String>, data: SectionData) -> Self {
        Self::from_parts(id, title, 0, data)
    }

    /// Creates a fresh section of `kind` with its default title and payload.
    #[must_use]
    pub fn draft(kind: SectionKind) -> Self {
        Self::new(
            SectionId::generate(),
            kind.default_title(),
            SectionData::placeholder(kind),
        )
    }

    pub(crate) fn from_parts(
        id: SectionId,
        title: impl Into<String>,
        order_id: u32,
        data: SectionData,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            order_id,
            kind: data.kind(),
            data,
        }
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn order_id(&self) -> u32 {
        self.order_id
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    #[must_use]
    pub fn data(&self) -> &SectionData {
        &self.data
    }

    #[must_use]
    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Replaces the payload. The payload may switch variant; `kind` follows it.
    #[must_use]
    pub fn with_data(&self, data: SectionData) -> Self {
        Self {
            kind: data.kind(),
            data,
            ..self.clone()
        }
    }

    pub(crate) fn set_order_id(&mut self, order_id: u32) {
        self.order_id = order_id;
    }

    /// Converts to the persisted shape.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the payload cannot be encoded.
    pub fn to_raw(&self) -> Result<RawSection, serde_json::Error> {
        Ok(RawSection {
            id: self.id.to_string(),
            title: self.title.clone(),
            order_id: i64::from(self.order_id),
            kind: self.kind.as_str().to_owned(),
            data: serde_json::to_value(&self.data)?,
        })
    }
}
