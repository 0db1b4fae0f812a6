//! Column mapping configuration.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Name of the implicit column carrying each row's element reference.
pub const ELEMENT_ID_COLUMN: &str = "ElementId";

fn default_editable() -> bool {
    true
}

/// Maps one sheet column onto one document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column label in the remote table.
    pub sheet_column: String,
    /// Field name on the document element.
    pub document_field: String,
    /// Whether incoming differences on this column may be applied.
    #[serde(default = "default_editable")]
    pub editable: bool,
}

impl ColumnMapping {
    /// Creates an editable mapping.
    pub fn new(sheet_column: impl Into<String>, document_field: impl Into<String>) -> Self {
        Self {
            sheet_column: sheet_column.into(),
            document_field: document_field.into(),
            editable: true,
        }
    }

    /// Creates a read-only mapping.
    pub fn read_only(sheet_column: impl Into<String>, document_field: impl Into<String>) -> Self {
        Self {
            editable: false,
            ..Self::new(sheet_column, document_field)
        }
    }
}

/// Everything one sync invocation needs to know about the remote side and
/// the column mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProfile {
    /// Identifier of the remote table.
    pub remote_table_id: String,
    /// Tab within the remote table.
    pub remote_tab_name: String,
    /// Column carrying the row anchor.
    pub anchor_column: String,
    /// Column mappings.
    #[serde(default)]
    pub mappings: Vec<ColumnMapping>,
    /// Columns that are never editable.
    #[serde(default)]
    pub protected_columns: Vec<String>,
}

impl SyncProfile {
    /// Creates a profile with no mappings.
    pub fn new(
        remote_table_id: impl Into<String>,
        remote_tab_name: impl Into<String>,
        anchor_column: impl Into<String>,
    ) -> Self {
        Self {
            remote_table_id: remote_table_id.into(),
            remote_tab_name: remote_tab_name.into(),
            anchor_column: anchor_column.into(),
            mappings: Vec::new(),
            protected_columns: Vec::new(),
        }
    }

    /// Adds a mapping.
    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Adds a protected column.
    pub fn with_protected_column(mut self, column: impl Into<String>) -> Self {
        self.protected_columns.push(column.into());
        self
    }

    /// Checks that the profile names a destination.
    pub fn validate(&self) -> CoreResult<()> {
        if self.remote_table_id.trim().is_empty() {
            return Err(CoreError::invalid_profile("no remote table id"));
        }
        if self.remote_tab_name.trim().is_empty() {
            return Err(CoreError::invalid_profile("no remote tab name"));
        }
        if self.anchor_column.trim().is_empty() {
            return Err(CoreError::invalid_profile("no anchor column"));
        }
        Ok(())
    }

    /// Returns true if `column` can never be edited: the anchor column, the
    /// element id column, or any listed protected column.
    pub fn is_protected(&self, column: &str) -> bool {
        column.eq_ignore_ascii_case(&self.anchor_column)
            || column.eq_ignore_ascii_case(ELEMENT_ID_COLUMN)
            || self
                .protected_columns
                .iter()
                .any(|p| p.eq_ignore_ascii_case(column))
    }

    /// Forces every protected mapping to non-editable, overriding whatever
    /// the caller configured. Returns how many mappings were changed.
    pub fn enforce_protected_columns(&mut self) -> usize {
        let mut overridden = 0;
        for i in 0..self.mappings.len() {
            if self.mappings[i].editable && self.is_protected(&self.mappings[i].sheet_column) {
                self.mappings[i].editable = false;
                overridden += 1;
            }
        }
        if overridden > 0 {
            tracing::debug!(overridden, "protected columns forced read-only");
        }
        overridden
    }

    /// Mappings that may carry changes into the document.
    pub fn editable_mappings(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.mappings
            .iter()
            .filter(move |m| m.editable && !self.is_protected(&m.sheet_column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> SyncProfile {
        SyncProfile::new("sheet-1", "Doors", "SyncId")
            .with_mapping(ColumnMapping::new("SyncId", "SyncId"))
            .with_mapping(ColumnMapping::new("elementid", "Id"))
            .with_mapping(ColumnMapping::new("Mark", "Mark"))
            .with_mapping(ColumnMapping::new("Length", "Length"))
            .with_protected_column("mark")
    }

    #[test]
    fn protected_columns_are_forced_read_only() {
        let mut profile = profile();
        assert_eq!(profile.enforce_protected_columns(), 3);

        let editable: Vec<_> = profile
            .mappings
            .iter()
            .filter(|m| m.editable)
            .map(|m| m.sheet_column.as_str())
            .collect();
        assert_eq!(editable, vec!["Length"]);

        // Idempotent.
        assert_eq!(profile.enforce_protected_columns(), 0);
    }

    #[test]
    fn editable_mappings_ignore_protected_even_without_enforcement() {
        let profile = profile();
        let editable: Vec<_> = profile
            .editable_mappings()
            .map(|m| m.sheet_column.as_str())
            .collect();
        assert_eq!(editable, vec!["Length"]);
    }

    #[test]
    fn validate_rejects_missing_destination() {
        assert!(profile().validate().is_ok());

        let mut p = profile();
        p.remote_table_id = " ".into();
        assert!(matches!(p.validate(), Err(CoreError::InvalidProfile { .. })));

        let mut p = profile();
        p.remote_tab_name.clear();
        assert!(p.validate().is_err());

        let mut p = profile();
        p.anchor_column.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "remote_table_id": "abc",
            "remote_tab_name": "Rooms",
            "anchor_column": "SyncId",
            "mappings": [{"sheet_column": "Area", "document_field": "Area"}]
        }"#;
        let profile: SyncProfile = serde_json::from_str(json).unwrap();
        assert!(profile.mappings[0].editable);
        assert!(profile.protected_columns.is_empty());
    }
}
