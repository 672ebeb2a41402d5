use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A dimension records can be grouped by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GroupField {
    Project,
    Employee,
    Date,
}

/// A display column of the aggregate table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Column {
    Project,
    Employee,
    Date,
    Hours,
}

/// Columns shown when nothing is grouped, in fixed order.
pub const DEFAULT_COLUMNS: [Column; 4] = [
    Column::Project,
    Column::Employee,
    Column::Date,
    Column::Hours,
];

impl Column {
    /// Header label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Employee => "Employee",
            Self::Date => "Date",
            Self::Hours => "Hours",
        }
    }
}

impl From<GroupField> for Column {
    fn from(field: GroupField) -> Self {
        match field {
            GroupField::Project => Self::Project,
            GroupField::Employee => Self::Employee,
            GroupField::Date => Self::Date,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Server-side sort, rendered as `<column>,<direction>` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(column: Column, direction: SortDirection) -> Self {
        Self { column, direction }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.column, self.direction)
    }
}

impl std::str::FromStr for SortOrder {
    type Err = strum::ParseError;

    /// Accepts `hours`, `hours,desc` or `hours,asc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, direction) = match s.split_once(',') {
            Some((c, d)) => (c.trim().parse()?, d.trim().parse()?),
            None => (s.trim().parse()?, SortDirection::default()),
        };
        Ok(Self { column, direction })
    }
}
