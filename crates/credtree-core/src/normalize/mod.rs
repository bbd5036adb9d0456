//! Field binding and value normalization
//!
//! A fixed set of logical fields (title, username, password, last modified)
//! is bound to whatever headers an export happens to use, then each selected
//! cell is rewritten into a canonical string so cosmetic differences between
//! exports do not change the hash.

mod date;
mod text;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::csv::RawRow;

pub use date::{normalize_date, parse_flexible, render_utc};
pub use text::normalize_text;

/// Canonical field names, declared in the fixed global hashing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Title,
    Username,
    Password,
    LastModified,
}

impl FieldName {
    /// All fields in hashing order
    pub const ALL: [FieldName; 4] = [
        FieldName::Title,
        FieldName::Username,
        FieldName::Password,
        FieldName::LastModified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Username => "username",
            Self::Password => "password",
            Self::LastModified => "last_modified",
        }
    }

    /// Default human label, which doubles as the header text it matches
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Username => "Username",
            Self::Password => "Password",
            Self::LastModified => "Last Modified",
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Self::LastModified)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized field names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for FieldName {
    type Err = UnknownField;

    /// Accepts canonical names and header spellings (`last modified`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        FieldName::ALL
            .into_iter()
            .find(|f| f.as_str() == key)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A configured logical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub label: String,
    pub field: FieldName,
}

impl FieldSpec {
    pub fn new(label: impl Into<String>, field: FieldName) -> Self {
        Self {
            label: label.into(),
            field,
        }
    }

    /// The four recognized fields with their default labels
    pub fn defaults() -> Vec<FieldSpec> {
        FieldName::ALL
            .into_iter()
            .map(|f| FieldSpec::new(f.default_label(), f))
            .collect()
    }

    /// Case-insensitive, trim-insensitive header match
    pub fn matches_header(&self, header: &str) -> bool {
        header.trim().to_lowercase() == self.label.trim().to_lowercase()
    }
}

/// A field together with the header it was bound to in the loaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderBinding {
    pub spec: FieldSpec,
    /// Raw header text as it appeared in the file, if present
    pub header: Option<String>,
}

impl HeaderBinding {
    pub fn is_bound(&self) -> bool {
        self.header.is_some()
    }
}

/// Bind each configured field to the first matching header.
///
/// Fields with no matching header stay unbound and can never be selected.
pub fn bind_headers(specs: &[FieldSpec], headers: &[String]) -> Vec<HeaderBinding> {
    specs
        .iter()
        .map(|spec| HeaderBinding {
            spec: spec.clone(),
            header: headers.iter().find(|h| spec.matches_header(h)).cloned(),
        })
        .collect()
}

/// Header bound to `field`, if any
pub fn bound_header(bindings: &[HeaderBinding], field: FieldName) -> Option<&str> {
    bindings
        .iter()
        .find(|b| b.spec.field == field)
        .and_then(|b| b.header.as_deref())
}

/// The fields chosen for one run.
///
/// Iteration always follows [`FieldName::ALL`] order, whatever order the
/// caller selected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(BTreeSet<FieldName>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: impl IntoIterator<Item = FieldName>) -> Self {
        Self(fields.into_iter().collect())
    }

    /// Every field that has a header in the loaded file
    pub fn all_bound(bindings: &[HeaderBinding]) -> Self {
        Self(
            bindings
                .iter()
                .filter(|b| b.is_bound())
                .map(|b| b.spec.field)
                .collect(),
        )
    }

    pub fn insert(&mut self, field: FieldName) -> bool {
        self.0.insert(field)
    }

    pub fn remove(&mut self, field: FieldName) -> bool {
        self.0.remove(&field)
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.iter().copied()
    }

    /// Drop fields with no bound header. Returns the fields removed.
    pub fn restrict_to(&mut self, bindings: &[HeaderBinding]) -> Vec<FieldName> {
        let unbound: Vec<FieldName> = self
            .iter()
            .filter(|f| bound_header(bindings, *f).is_none())
            .collect();
        for field in &unbound {
            self.0.remove(field);
        }
        unbound
    }
}

impl FromIterator<FieldName> for Selection {
    fn from_iter<I: IntoIterator<Item = FieldName>>(iter: I) -> Self {
        Self::from_fields(iter)
    }
}

/// Normalize one raw cell according to its field kind.
pub fn normalize_field(field: FieldName, raw: &str) -> String {
    if field.is_date() {
        normalize_date(raw)
    } else {
        normalize_text(raw)
    }
}

/// Selected fields of one row, normalized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    values: BTreeMap<FieldName, String>,
    title: Option<String>,
}

impl NormalizedRow {
    /// Build from explicit values. Intended for callers that bypass CSV.
    pub fn from_values(values: impl IntoIterator<Item = (FieldName, String)>) -> Self {
        let values: BTreeMap<FieldName, String> = values.into_iter().collect();
        let title = values
            .get(&FieldName::Title)
            .filter(|t| !t.is_empty())
            .cloned();
        Self { values, title }
    }

    /// Normalize the selected, bound cells of a raw row.
    ///
    /// A bound title column supplies the display title even when title is
    /// not part of the selection.
    pub fn from_raw(row: &RawRow, bindings: &[HeaderBinding], selection: &Selection) -> Self {
        let cell = |field: FieldName| {
            bound_header(bindings, field).map(|h| normalize_field(field, row.get(h).unwrap_or("")))
        };

        let values = selection
            .iter()
            .filter_map(|field| cell(field).map(|v| (field, v)))
            .collect();
        let title = cell(FieldName::Title).filter(|t| !t.is_empty());

        Self { values, title }
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Values in fixed field order
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn binds_case_and_whitespace_insensitively() {
        let bindings = bind_headers(
            &FieldSpec::defaults(),
            &headers(&["  TITLE ", "UserName", "url", "last  modified", "LAST MODIFIED"]),
        );
        assert_eq!(bound_header(&bindings, FieldName::Title), Some("  TITLE "));
        assert_eq!(bound_header(&bindings, FieldName::Username), Some("UserName"));
        assert_eq!(bound_header(&bindings, FieldName::Password), None);
        assert_eq!(
            bound_header(&bindings, FieldName::LastModified),
            Some("LAST MODIFIED")
        );
    }

    #[test]
    fn custom_labels() {
        let specs = vec![FieldSpec::new("Login", FieldName::Username)];
        let bindings = bind_headers(&specs, &headers(&["name", "login"]));
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].header.as_deref(), Some("login"));
    }

    #[test]
    fn field_name_parsing() {
        assert_eq!("Last Modified".parse::<FieldName>(), Ok(FieldName::LastModified));
        assert_eq!("last_modified".parse::<FieldName>(), Ok(FieldName::LastModified));
        assert_eq!(" Password ".parse::<FieldName>(), Ok(FieldName::Password));
        assert!("url".parse::<FieldName>().is_err());
    }

    #[test]
    fn selection_iterates_in_fixed_order() {
        let sel = Selection::from_fields([FieldName::Password, FieldName::Title]);
        let order: Vec<_> = sel.iter().collect();
        assert_eq!(order, vec![FieldName::Title, FieldName::Password]);
    }

    #[test]
    fn restrict_drops_unbound() {
        let bindings = bind_headers(&FieldSpec::defaults(), &headers(&["title"]));
        let mut sel = Selection::from_fields([FieldName::Title, FieldName::Password]);
        let dropped = sel.restrict_to(&bindings);
        assert_eq!(dropped, vec![FieldName::Password]);
        assert_eq!(sel, Selection::from_fields([FieldName::Title]));
        assert_eq!(Selection::all_bound(&bindings), sel);
    }

    #[test]
    fn normalizes_selected_cells() {
        let table = csv::parse("Title,Password,Last Modified\n  My   Mail ,  pw ,2024-01-02T03:04:05Z\n");
        let bindings = bind_headers(&FieldSpec::defaults(), &table.headers);
        let sel = Selection::from_fields([FieldName::Password, FieldName::LastModified]);

        let row = NormalizedRow::from_raw(&table.rows[0], &bindings, &sel);
        assert_eq!(row.get(FieldName::Password), Some("pw"));
        assert_eq!(row.get(FieldName::LastModified), Some("2024-01-02T03:04:05Z"));
        assert_eq!(row.get(FieldName::Title), None);
        assert_eq!(row.title(), Some("My Mail"));
    }

    #[test]
    fn unbound_selected_field_is_skipped() {
        let table = csv::parse("Title\nmail\n");
        let bindings = bind_headers(&FieldSpec::defaults(), &table.headers);
        let sel = Selection::from_fields([FieldName::Title, FieldName::Username]);

        let row = NormalizedRow::from_raw(&table.rows[0], &bindings, &sel);
        let fields: Vec<_> = row.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![FieldName::Title]);
    }

    #[test]
    fn empty_title_is_absent() {
        let table = csv::parse("Title,Password\n ,pw\n");
        let bindings = bind_headers(&FieldSpec::defaults(), &table.headers);
        let row = NormalizedRow::from_raw(
            &table.rows[0],
            &bindings,
            &Selection::from_fields([FieldName::Password]),
        );
        assert_eq!(row.title(), None);
    }

    #[test]
    fn normalize_field_dispatches_on_kind() {
        assert_eq!(normalize_field(FieldName::Title, " a  b "), "a b");
        assert_eq!(normalize_field(FieldName::LastModified, "nope"), "");
        assert_eq!(
            normalize_field(FieldName::LastModified, "2024-01-02T03:04:05.000Z"),
            "2024-01-02T03:04:05Z"
        );
    }
}
