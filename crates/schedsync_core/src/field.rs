//! Type-aware access to a single field on a document element.
//!
//! Reads prefer the instance field and fall back to the type field. Writes
//! and validation do the same, but also skip a read-only instance field in
//! favour of a writable type field.

use crate::document::{Document, ElementRef, FieldScope, FieldSlot};
use crate::error::{RowError, RowErrorCode};
use crate::value::FieldValue;

/// Reads, validates and writes element fields through a [`Document`].
pub struct FieldAccessor;

impl FieldAccessor {
    /// Reads the field's canonical text. `None` if the field does not exist
    /// at either scope.
    pub fn read<D: Document + ?Sized>(doc: &D, element: ElementRef, name: &str) -> Option<String> {
        doc.field(element, FieldScope::Instance, name)
            .or_else(|| doc.field(element, FieldScope::Type, name))
            .map(|slot| slot.value.to_text())
    }

    /// Checks whether `candidate` could be written, without mutating.
    pub fn validate<D: Document + ?Sized>(
        doc: &D,
        element: ElementRef,
        name: &str,
        candidate: &str,
    ) -> Result<(), RowError> {
        Self::prepare(doc, element, name, candidate).map(|_| ())
    }

    /// Validates and writes `text`. Document failures come back as
    /// `apply_failed`; nothing is propagated as a fatal error.
    pub fn write<D: Document + ?Sized>(
        doc: &mut D,
        element: ElementRef,
        name: &str,
        text: &str,
    ) -> Result<(), RowError> {
        let (scope, value) = Self::prepare(doc, element, name, text)?;
        doc.set_field(element, scope, name, value).map_err(|e| {
            RowError::new(
                RowErrorCode::ApplyFailed,
                format!("{}: {}", name, e),
            )
        })
    }

    /// Resolves the writable slot and converts the text for it.
    fn prepare<D: Document + ?Sized>(
        doc: &D,
        element: ElementRef,
        name: &str,
        text: &str,
    ) -> Result<(FieldScope, FieldValue), RowError> {
        let (scope, slot) = Self::resolve_writable(doc, element, name).ok_or_else(|| {
            RowError::new(
                RowErrorCode::ParameterReadOnly,
                format!("{} is not a writable field on element {}", name, element),
            )
        })?;

        let value = slot.kind.parse(text).map_err(|reason| {
            RowError::new(RowErrorCode::TypeMismatch, format!("{}: {}", name, reason))
        })?;

        Ok((scope, value))
    }

    fn resolve_writable<D: Document + ?Sized>(
        doc: &D,
        element: ElementRef,
        name: &str,
    ) -> Option<(FieldScope, FieldSlot)> {
        [FieldScope::Instance, FieldScope::Type]
            .into_iter()
            .filter_map(|scope| doc.field(element, scope, name).map(|slot| (scope, slot)))
            .find(|(_, slot)| !slot.read_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;
    use crate::value::StorageKind;

    fn document() -> (MemoryDocument, ElementRef) {
        let mut doc = MemoryDocument::new();
        let door_type = doc.add_element("type-1");
        doc.set_initial(door_type, "Width", StorageKind::Real, FieldValue::Real(0.9));
        doc.set_initial(door_type, "Mark", StorageKind::Text, FieldValue::Text("T".into()));

        let door = doc.add_element("uid-1");
        doc.set_type(door, door_type);
        doc.set_initial(door, "Length", StorageKind::Real, FieldValue::Real(10.0));
        doc.set_initial(door, "Count", StorageKind::Integer, FieldValue::Integer(2));
        doc.set_initial(door, "Mark", StorageKind::Text, FieldValue::Text("D1".into()));
        doc.set_initial_read_only(door, "Area", StorageKind::Real, FieldValue::Real(4.0));
        doc.set_initial_read_only(door, "Host", StorageKind::ElementId, FieldValue::ElementId(7));
        (doc, door)
    }

    #[test]
    fn read_prefers_instance_then_type() {
        let (doc, door) = document();
        assert_eq!(FieldAccessor::read(&doc, door, "Length").as_deref(), Some("10.0"));
        assert_eq!(FieldAccessor::read(&doc, door, "Mark").as_deref(), Some("D1"));
        assert_eq!(FieldAccessor::read(&doc, door, "Width").as_deref(), Some("0.9"));
        assert_eq!(FieldAccessor::read(&doc, door, "Missing"), None);
    }

    #[test]
    fn validate_checks_storage_kind() {
        let (doc, door) = document();
        assert!(FieldAccessor::validate(&doc, door, "Length", "12.5").is_ok());
        assert!(FieldAccessor::validate(&doc, door, "Count", "true").is_ok());

        let err = FieldAccessor::validate(&doc, door, "Length", "long").unwrap_err();
        assert_eq!(err.code, RowErrorCode::TypeMismatch);

        let err = FieldAccessor::validate(&doc, door, "Count", "").unwrap_err();
        assert_eq!(err.code, RowErrorCode::TypeMismatch);
    }

    #[test]
    fn read_only_without_type_fallback_is_rejected() {
        let (doc, door) = document();
        let err = FieldAccessor::validate(&doc, door, "Area", "5.0").unwrap_err();
        assert_eq!(err.code, RowErrorCode::ParameterReadOnly);

        let err = FieldAccessor::validate(&doc, door, "Missing", "x").unwrap_err();
        assert_eq!(err.code, RowErrorCode::ParameterReadOnly);
    }

    #[test]
    fn write_falls_back_to_type_field() {
        let (mut doc, door) = document();
        doc.begin_transaction("test").unwrap();
        FieldAccessor::write(&mut doc, door, "Width", "1.2").unwrap();
        doc.commit_transaction().unwrap();
        assert_eq!(FieldAccessor::read(&doc, door, "Width").as_deref(), Some("1.2"));
    }

    #[test]
    fn write_converts_and_stores() {
        let (mut doc, door) = document();
        doc.begin_transaction("test").unwrap();
        FieldAccessor::write(&mut doc, door, "Count", "false").unwrap();
        FieldAccessor::write(&mut doc, door, "Length", " 12.5 ").unwrap();
        doc.commit_transaction().unwrap();
        assert_eq!(FieldAccessor::read(&doc, door, "Count").as_deref(), Some("0"));
        assert_eq!(FieldAccessor::read(&doc, door, "Length").as_deref(), Some("12.5"));
    }

    #[test]
    fn write_surfaces_document_failure_as_apply_failed() {
        let (mut doc, door) = document();
        doc.fail_writes_to("Length");
        doc.begin_transaction("test").unwrap();
        let err = FieldAccessor::write(&mut doc, door, "Length", "12.5").unwrap_err();
        assert_eq!(err.code, RowErrorCode::ApplyFailed);
        assert!(err.message.contains("Length"));
    }

    #[test]
    fn write_outside_transaction_is_apply_failed() {
        let (mut doc, door) = document();
        let err = FieldAccessor::write(&mut doc, door, "Mark", "D2").unwrap_err();
        assert_eq!(err.code, RowErrorCode::ApplyFailed);
        assert_eq!(FieldAccessor::read(&doc, door, "Mark").as_deref(), Some("D1"));
    }
}
