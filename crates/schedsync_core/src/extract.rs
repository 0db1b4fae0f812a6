//! Schedule grid extraction (export path).

use crate::document::{Document, ElementRef, GridSection};
use crate::error::{CoreError, CoreResult, RowErrorCode};
use crate::field::FieldAccessor;
use crate::profile::{SyncProfile, ELEMENT_ID_COLUMN};
use crate::row::{CellMap, SyncRow};
use std::collections::HashSet;

/// Rows read from one schedule grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedGrid {
    /// Schedule the rows came from.
    pub schedule: String,
    /// Unique column keys, in grid order.
    pub headers: Vec<String>,
    /// One row per body row, including rows in Error state.
    pub rows: Vec<SyncRow>,
}

impl ExtractedGrid {
    /// Rows that resolved an anchor.
    pub fn valid_rows(&self) -> impl Iterator<Item = &SyncRow> {
        self.rows.iter().filter(|r| r.errors().is_empty())
    }
}

/// Makes every header label a unique, non-empty key.
///
/// Blank labels become `COL_<n>` (1-based position). Repeats, compared
/// case-insensitively, get `_2`, `_3`, ... in order of appearance.
pub fn dedup_headers<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(labels.len());
    let mut out = Vec::with_capacity(labels.len());

    for (i, label) in labels.iter().enumerate() {
        let trimmed = label.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("COL_{}", i + 1)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while used.contains(&candidate.to_lowercase()) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        used.insert(candidate.to_lowercase());
        out.push(candidate);
    }
    out
}

/// Picks a row's anchor: an explicit non-blank value in the anchor column
/// first, then the traced element's own identity.
pub fn resolve_anchor(
    cells: &CellMap,
    anchor_column: &str,
    element_anchor: Option<&str>,
) -> Option<String> {
    cells
        .get(anchor_column)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .or_else(|| element_anchor.map(str::trim).filter(|a| !a.is_empty()))
        .map(str::to_string)
}

/// Walks a schedule grid into [`SyncRow`]s.
pub struct GridExtractor;

impl GridExtractor {
    /// Picks the named schedule, or the first one when `name` is `None`.
    pub fn resolve_schedule<D: Document + ?Sized>(doc: &D, name: Option<&str>) -> CoreResult<String> {
        let names = doc.schedule_names();
        match name {
            Some(name) => names
                .into_iter()
                .find(|n| n == name)
                .ok_or_else(|| CoreError::schedule_not_found(name)),
            None => names.into_iter().next().ok_or(CoreError::NoSchedule),
        }
    }

    /// Reads the grid's header labels and body rows.
    pub fn extract<D: Document + ?Sized>(
        doc: &D,
        schedule: Option<&str>,
        profile: &SyncProfile,
    ) -> CoreResult<ExtractedGrid> {
        let schedule = Self::resolve_schedule(doc, schedule)?;
        let shape = doc.grid_shape(&schedule)?;

        let labels = match shape.header_rows {
            0 => vec![String::new(); shape.columns],
            n => (0..shape.columns)
                .map(|col| doc.cell_text(&schedule, GridSection::Header, n - 1, col))
                .collect::<CoreResult<Vec<_>>>()?,
        };
        let headers = dedup_headers(&labels);

        let mut rows = Vec::with_capacity(shape.body_rows);
        for body_row in 0..shape.body_rows {
            let mut cells = CellMap::new();
            for (col, header) in headers.iter().enumerate() {
                let text = doc.cell_text(&schedule, GridSection::Body, body_row, col)?;
                cells.insert(header.clone(), text);
            }

            let element = doc.row_element(&schedule, body_row);
            let row = Self::build_row(doc, cells, element, profile);
            if !row.errors().is_empty() {
                tracing::warn!(schedule = %schedule, body_row, "row has no anchor");
            }
            rows.push(row);
        }

        tracing::info!(
            schedule = %schedule,
            columns = headers.len(),
            rows = rows.len(),
            "extracted schedule grid"
        );

        Ok(ExtractedGrid {
            schedule,
            headers,
            rows,
        })
    }

    fn build_row<D: Document + ?Sized>(
        doc: &D,
        mut cells: CellMap,
        element: Option<ElementRef>,
        profile: &SyncProfile,
    ) -> SyncRow {
        let element_anchor = element.and_then(|e| doc.element_anchor(e));
        let anchor = resolve_anchor(&cells, &profile.anchor_column, element_anchor.as_deref());

        if let Some(anchor) = &anchor {
            cells.insert(profile.anchor_column.clone(), anchor.clone());
        }
        if let Some(element) = element {
            cells.insert(ELEMENT_ID_COLUMN, element.to_string());
            // Mapped fields the grid does not show still travel with the row.
            for mapping in &profile.mappings {
                if cells.contains_key(&mapping.sheet_column) {
                    continue;
                }
                if let Some(text) = FieldAccessor::read(doc, element, &mapping.document_field) {
                    cells.insert(mapping.sheet_column.clone(), text);
                }
            }
        }

        let mut row = SyncRow::new(anchor.clone().unwrap_or_default());
        row.element_ref = element;
        row.cells = cells;
        if anchor.is_none() {
            row.push_error(
                RowErrorCode::AnchorMissing,
                "row has no anchor value and cannot be traced to an element",
            );
        }
        row
    }
}
