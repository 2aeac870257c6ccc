//! Occupancy export.
//!
//! One row per container, ready for a CSV download. Names come from a lookup
//! closure so the caller decides where guest records are read from.

use crate::capacity::{OccupancyStatus, occupancy_status};
use crate::ids::GuestId;
use crate::ledger::LedgerState;
use crate::types::ResourceCategory;
use serde::{Deserialize, Serialize};

/// Separator between occupant names in a row.
pub const NAME_DELIMITER: &str = "; ";

/// Column headers, in row order.
pub const HEADERS: [&str; 7] = [
    "Parent",
    "Container",
    "Type",
    "Capacity",
    "Occupants",
    "Guests",
    "Status",
];

/// One exported container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRow {
    /// Hotel, route or event name
    pub parent_name: String,
    /// Container category
    pub category: ResourceCategory,
    /// Container label
    pub label: String,
    /// Free-form type
    pub kind: String,
    /// Effective capacity
    pub capacity: u32,
    /// Number of occupants
    pub occupant_count: usize,
    /// Occupant full names joined by [`NAME_DELIMITER`]
    pub occupant_names: String,
    /// Occupancy state
    pub status: OccupancyStatus,
}

impl OccupancyRow {
    fn fields(&self) -> [String; 7] {
        [
            self.parent_name.clone(),
            self.label.clone(),
            self.kind.clone(),
            self.capacity.to_string(),
            self.occupant_count.to_string(),
            self.occupant_names.clone(),
            self.status.label().to_string(),
        ]
    }
}

/// Builds one row per container, grouped by parent in creation order.
///
/// Occupants the lookup cannot name are listed by id so the count and the name
/// list never disagree.
#[must_use]
pub fn occupancy_rows<F>(state: &LedgerState, name_of: F) -> Vec<OccupancyRow>
where
    F: Fn(GuestId) -> Option<String>,
{
    let mut rows = Vec::new();
    for parent in state.parents() {
        for container in state.containers_of(parent.id) {
            let names: Vec<String> = container
                .occupants
                .iter()
                .map(|id| name_of(*id).unwrap_or_else(|| id.to_string()))
                .collect();

            rows.push(OccupancyRow {
                parent_name: parent.name.clone(),
                category: container.category,
                label: container.label.clone(),
                kind: container.kind.clone(),
                capacity: container.effective_capacity().value(),
                occupant_count: container.occupancy(),
                occupant_names: names.join(NAME_DELIMITER),
                status: occupancy_status(container),
            });
        }
    }
    rows
}

/// Renders rows as CSV with a header line.
///
/// Fields containing a comma, quote or line break are quoted and inner quotes
/// doubled. Lines end with `\r\n`.
#[must_use]
pub fn to_csv(rows: &[OccupancyRow]) -> String {
    let mut out = String::new();
    write_record(&mut out, HEADERS.iter().copied());
    for row in rows {
        let fields = row.fields();
        write_record(&mut out, fields.iter().map(String::as_str));
    }
    out
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (index, field) in fields.enumerate() {
        if index > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(names: &str) -> OccupancyRow {
        OccupancyRow {
            parent_name: "Grand Hotel".to_string(),
            category: ResourceCategory::Room,
            label: "101".to_string(),
            kind: "Double".to_string(),
            capacity: 2,
            occupant_count: 2,
            occupant_names: names.to_string(),
            status: OccupancyStatus::Full,
        }
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let csv = to_csv(&[row("Jane Doe; John Smith")]);
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();

        assert_eq!(lines[0], "Parent,Container,Type,Capacity,Occupants,Guests,Status");
        assert_eq!(lines[1], "Grand Hotel,101,Double,2,2,Jane Doe; John Smith,full");
    }

    #[test]
    fn csv_quotes_commas_and_quotes() {
        let csv = to_csv(&[row("Doe, Jane; \"Johnny\" Smith")]);
        assert!(csv.contains("\"Doe, Jane; \"\"Johnny\"\" Smith\""));
    }

    #[test]
    fn empty_state_exports_header_only() {
        let rows = occupancy_rows(&LedgerState::new(), |_| None);
        assert!(rows.is_empty());
        assert_eq!(to_csv(&rows).lines().count(), 1);
    }
}
