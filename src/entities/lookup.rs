//! Lookup (reference) entities - employees, workcenters, part numbers,
//! customers and inspection items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five reference tables that DMT records point into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Employee,
    Workcenter,
    PartNumber,
    Customer,
    InspectionItem,
}

impl LookupKind {
    pub fn all() -> &'static [LookupKind] {
        &[
            LookupKind::Employee,
            LookupKind::Workcenter,
            LookupKind::PartNumber,
            LookupKind::Customer,
            LookupKind::InspectionItem,
        ]
    }

    /// Storage table name
    pub fn table(&self) -> &'static str {
        match self {
            LookupKind::Employee => "employees",
            LookupKind::Workcenter => "workcenters",
            LookupKind::PartNumber => "part_numbers",
            LookupKind::Customer => "customers",
            LookupKind::InspectionItem => "inspection_items",
        }
    }

    /// Primary label column; lists are ordered by it
    pub fn label_column(&self) -> &'static str {
        match self {
            LookupKind::PartNumber => "part_number",
            _ => "name",
        }
    }

    /// Secondary unique column, if the kind has one
    pub fn secondary_column(&self) -> Option<&'static str> {
        match self {
            LookupKind::Employee => Some("email"),
            LookupKind::Workcenter | LookupKind::Customer => Some("code"),
            LookupKind::PartNumber | LookupKind::InspectionItem => None,
        }
    }

    /// Whether the secondary column is NOT NULL
    pub fn secondary_required(&self) -> bool {
        matches!(self, LookupKind::Workcenter | LookupKind::Customer)
    }

    pub fn has_description(&self) -> bool {
        matches!(self, LookupKind::PartNumber | LookupKind::InspectionItem)
    }

    /// Singular display name
    pub fn label(&self) -> &'static str {
        match self {
            LookupKind::Employee => "employee",
            LookupKind::Workcenter => "workcenter",
            LookupKind::PartNumber => "part number",
            LookupKind::Customer => "customer",
            LookupKind::InspectionItem => "inspection item",
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

impl std::str::FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" | "employees" => Ok(LookupKind::Employee),
            "workcenter" | "workcenters" => Ok(LookupKind::Workcenter),
            "part" | "part_number" | "part_numbers" => Ok(LookupKind::PartNumber),
            "customer" | "customers" => Ok(LookupKind::Customer),
            "inspection" | "inspection_item" | "inspection_items" => {
                Ok(LookupKind::InspectionItem)
            }
            _ => Err(format!("Unknown lookup kind: {}", s)),
        }
    }
}

/// A stored lookup row in its kind-independent form.
///
/// `label` maps to `name` (or `part_number`), `secondary` to `email`/`code`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRecord {
    #[serde(skip)]
    pub kind: LookupKind,
    pub id: String,
    pub label: String,
    pub secondary: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for creating a lookup row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLookup {
    pub label: String,
    pub secondary: Option<String>,
    pub description: Option<String>,
}

impl NewLookup {
    pub fn employee(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            label: name.into(),
            secondary: email,
            description: None,
        }
    }

    pub fn workcenter(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: name.into(),
            secondary: Some(code.into()),
            description: None,
        }
    }

    pub fn part_number(part_number: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: part_number.into(),
            secondary: None,
            description: Some(description.into()),
        }
    }

    pub fn customer(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: name.into(),
            secondary: Some(code.into()),
            description: None,
        }
    }

    pub fn inspection_item(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: name.into(),
            secondary: None,
            description: Some(description.into()),
        }
    }
}

/// Partial update for a lookup row. `None` leaves a field untouched;
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupPatch {
    pub label: Option<String>,
    pub secondary: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl LookupPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.secondary.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
    }
}

/// Typed view over a [`LookupRecord`] of one specific kind
pub trait LookupEntity: Sized + Serialize {
    const KIND: LookupKind;

    fn from_record(record: LookupRecord) -> Self;

    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LookupEntity for Employee {
    const KIND: LookupKind = LookupKind::Employee;

    fn from_record(r: LookupRecord) -> Self {
        Self {
            id: r.id,
            name: r.label,
            email: r.secondary,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workcenter {
    pub id: String,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LookupEntity for Workcenter {
    const KIND: LookupKind = LookupKind::Workcenter;

    fn from_record(r: LookupRecord) -> Self {
        Self {
            id: r.id,
            name: r.label,
            code: r.secondary.unwrap_or_default(),
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartNumber {
    pub id: String,
    pub part_number: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LookupEntity for PartNumber {
    const KIND: LookupKind = LookupKind::PartNumber;

    fn from_record(r: LookupRecord) -> Self {
        Self {
            id: r.id,
            part_number: r.label,
            description: r.description.unwrap_or_default(),
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LookupEntity for Customer {
    const KIND: LookupKind = LookupKind::Customer;

    fn from_record(r: LookupRecord) -> Self {
        Self {
            id: r.id,
            name: r.label,
            code: r.secondary.unwrap_or_default(),
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LookupEntity for InspectionItem {
    const KIND: LookupKind = LookupKind::InspectionItem;

    fn from_record(r: LookupRecord) -> Self {
        Self {
            id: r.id,
            name: r.label,
            description: r.description.unwrap_or_default(),
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: LookupKind) -> LookupRecord {
        let now = Utc::now();
        LookupRecord {
            kind,
            id: "abc".to_string(),
            label: "Label".to_string(),
            secondary: Some("SEC".to_string()),
            description: Some("desc".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_kind_columns() {
        assert_eq!(LookupKind::PartNumber.label_column(), "part_number");
        assert_eq!(LookupKind::Employee.secondary_column(), Some("email"));
        assert_eq!(LookupKind::Customer.secondary_column(), Some("code"));
        assert_eq!(LookupKind::InspectionItem.secondary_column(), None);
        assert!(LookupKind::Workcenter.secondary_required());
        assert!(!LookupKind::Employee.secondary_required());
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("part".parse::<LookupKind>().unwrap(), LookupKind::PartNumber);
        assert_eq!(
            "Inspection_Items".parse::<LookupKind>().unwrap(),
            LookupKind::InspectionItem
        );
        assert!("levels".parse::<LookupKind>().is_err());
    }

    #[test]
    fn test_typed_views_rename_fields() {
        let emp = Employee::from_record(record(LookupKind::Employee));
        assert_eq!(emp.name, "Label");
        assert_eq!(emp.email.as_deref(), Some("SEC"));

        let part = PartNumber::from_record(record(LookupKind::PartNumber));
        assert_eq!(part.part_number, "Label");
        assert_eq!(part.description, "desc");

        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["part_number"], "Label");
        assert_eq!(json["is_active"], true);
    }

    #[test]
    fn test_empty_patch() {
        assert!(LookupPatch::default().is_empty());
        let patch = LookupPatch {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
