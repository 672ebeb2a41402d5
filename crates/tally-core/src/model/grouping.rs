use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::GroupField;

/// Ordered set of grouping dimensions.
///
/// Insertion order drives display-column order and the `groupBy` query
/// parameter. Cache keys ignore it (see [`GroupingSelection::cache_key`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupingSelection {
    fields: IndexSet<GroupField>,
}

impl GroupingSelection {
    /// Key used for the empty selection.
    pub const ALL_KEY: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `field` if present, append it otherwise.
    /// Returns `true` when the field is selected afterwards.
    pub fn toggle(&mut self, field: GroupField) -> bool {
        if self.fields.shift_remove(&field) {
            false
        } else {
            self.fields.insert(field);
            true
        }
    }

    pub fn contains(&self, field: GroupField) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Fields in selection order.
    pub fn iter(&self) -> impl Iterator<Item = GroupField> + '_ {
        self.fields.iter().copied()
    }

    /// Order-independent key: field names sorted ascending, comma-joined.
    pub fn cache_key(&self) -> String {
        if self.fields.is_empty() {
            return Self::ALL_KEY.to_owned();
        }
        let mut names: Vec<&str> = self.fields.iter().map(|f| f.as_ref()).collect();
        names.sort_unstable();
        names.join(",")
    }

    /// Field names in selection order, for the `groupBy` parameter.
    pub fn query_values(&self) -> Vec<String> {
        self.fields.iter().map(ToString::to_string).collect()
    }
}

impl FromIterator<GroupField> for GroupingSelection {
    fn from_iter<I: IntoIterator<Item = GroupField>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
