//! DMT record entity - defect / corrective action tracking cases

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Corrective action request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarType {
    #[default]
    Dmt,
    Ndmt,
}

impl CarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Dmt => "dmt",
            CarType::Ndmt => "ndmt",
        }
    }
}

impl std::fmt::Display for CarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dmt" => Ok(CarType::Dmt),
            "ndmt" => Ok(CarType::Ndmt),
            _ => Err(format!("Invalid CAR type: {}. Use dmt or ndmt", s)),
        }
    }
}

/// A stored DMT row exactly as persisted (foreign keys as raw ids)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmtRecord {
    pub id: String,

    // General information
    pub workcenter_id: Option<String>,
    pub part_number_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operation: String,
    pub employee_id: Option<String>,
    #[serde(default)]
    pub qty: i64,
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shop_order: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub serial_number: String,
    pub inspection_item_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub prepared_by_id: Option<String>,

    // Defect description
    #[serde(default, deserialize_with = "null_as_default")]
    pub defect_description: String,
    #[serde(default)]
    pub car_type: CarType,
    #[serde(default = "default_car_cycle")]
    pub car_cycle: i64,
    pub car_second_cycle_date: Option<NaiveDate>,

    // Quality closure
    pub disposition_approved_date: Option<NaiveDate>,
    pub disposition_approved_by_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sdr_number: String,
    pub sdr_approve_date: Option<NaiveDate>,
    #[serde(default)]
    pub dmt_closed: bool,
    pub car_closed_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_return: bool,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_car_cycle() -> i64 {
    1
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Caller-supplied field set for a new DMT record.
///
/// `id` and `defect_description` are mandatory; every `None` field takes the
/// storage default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDmtRecord {
    pub id: String,
    pub defect_description: String,
    pub workcenter_id: Option<String>,
    pub part_number_id: Option<String>,
    pub operation: Option<String>,
    pub employee_id: Option<String>,
    pub qty: Option<i64>,
    pub customer_id: Option<String>,
    pub shop_order: Option<String>,
    pub serial_number: Option<String>,
    pub inspection_item_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub prepared_by_id: Option<String>,
    pub car_type: Option<CarType>,
    pub car_cycle: Option<i64>,
    pub car_second_cycle_date: Option<NaiveDate>,
    pub disposition_approved_date: Option<NaiveDate>,
    pub disposition_approved_by_id: Option<String>,
    pub sdr_number: Option<String>,
    pub sdr_approve_date: Option<NaiveDate>,
    pub dmt_closed: Option<bool>,
    pub car_closed_date: Option<NaiveDate>,
    pub is_return: Option<bool>,
    pub is_active: Option<bool>,
}

impl NewDmtRecord {
    pub fn new(id: impl Into<String>, defect_description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            defect_description: defect_description.into(),
            ..Default::default()
        }
    }
}

/// Partial update for a DMT record. Outer `None` leaves a field untouched;
/// `Some(None)` stores NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DmtPatch {
    pub workcenter_id: Option<Option<String>>,
    pub part_number_id: Option<Option<String>>,
    pub operation: Option<String>,
    pub employee_id: Option<Option<String>>,
    pub qty: Option<i64>,
    pub customer_id: Option<Option<String>>,
    pub shop_order: Option<String>,
    pub serial_number: Option<String>,
    pub inspection_item_id: Option<Option<String>>,
    pub date: Option<Option<NaiveDate>>,
    pub prepared_by_id: Option<Option<String>>,
    pub defect_description: Option<String>,
    pub car_type: Option<CarType>,
    pub car_cycle: Option<i64>,
    pub car_second_cycle_date: Option<Option<NaiveDate>>,
    pub disposition_approved_date: Option<Option<NaiveDate>>,
    pub disposition_approved_by_id: Option<Option<String>>,
    pub sdr_number: Option<String>,
    pub sdr_approve_date: Option<Option<NaiveDate>>,
    pub dmt_closed: Option<bool>,
    pub car_closed_date: Option<Option<NaiveDate>>,
    pub is_return: Option<bool>,
    pub is_active: Option<bool>,
}

/// `{ "name": ... }` sub-object of an enriched record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

/// `{ "part_number": ... }` sub-object of an enriched record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartNumberRef {
    pub part_number: String,
}

/// Display names resolved from a DMT record's foreign keys, one per key.
/// `None` means the key was null or did not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinedNames {
    pub workcenter: Option<String>,
    pub part_number: Option<String>,
    pub employee: Option<String>,
    pub customer: Option<String>,
    pub inspection_item: Option<String>,
    pub prepared_by: Option<String>,
    pub disposition_approved_by: Option<String>,
}

/// A DMT record enriched with the names behind its foreign keys.
///
/// Every sub-object is always present in serialized output, as `null` when
/// the key is unset or dangling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDmtRecord {
    #[serde(flatten)]
    pub record: DmtRecord,
    #[serde(default)]
    pub workcenter: Option<NameRef>,
    #[serde(default)]
    pub part_number: Option<PartNumberRef>,
    #[serde(default)]
    pub employee: Option<NameRef>,
    #[serde(default)]
    pub customer: Option<NameRef>,
    #[serde(default)]
    pub inspection_item: Option<NameRef>,
    #[serde(default)]
    pub prepared_by: Option<NameRef>,
    #[serde(default)]
    pub disposition_approved_by: Option<NameRef>,
}

impl EnrichedDmtRecord {
    /// Reshape flat joined name columns into nested sub-objects.
    /// Empty names are treated like missing ones.
    pub fn from_parts(record: DmtRecord, names: JoinedNames) -> Self {
        fn name_ref(value: Option<String>) -> Option<NameRef> {
            value.filter(|v| !v.is_empty()).map(|name| NameRef { name })
        }

        Self {
            record,
            workcenter: name_ref(names.workcenter),
            part_number: names
                .part_number
                .filter(|v| !v.is_empty())
                .map(|part_number| PartNumberRef { part_number }),
            employee: name_ref(names.employee),
            customer: name_ref(names.customer),
            inspection_item: name_ref(names.inspection_item),
            prepared_by: name_ref(names.prepared_by),
            disposition_approved_by: name_ref(names.disposition_approved_by),
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// "Open" or "Closed" by the `dmt_closed` flag
    pub fn status_label(&self) -> &'static str {
        if self.record.dmt_closed {
            "Closed"
        } else {
            "Open"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DmtRecord {
        let now = Utc::now();
        DmtRecord {
            id: "DMT-LR3K9F2-A8X3Q".to_string(),
            workcenter_id: Some("wc1".to_string()),
            part_number_id: None,
            operation: String::new(),
            employee_id: Some("e1".to_string()),
            qty: 0,
            customer_id: None,
            shop_order: String::new(),
            serial_number: String::new(),
            inspection_item_id: None,
            date: Some(now.date_naive()),
            prepared_by_id: None,
            defect_description: "Burr on edge".to_string(),
            car_type: CarType::Dmt,
            car_cycle: 1,
            car_second_cycle_date: None,
            disposition_approved_date: None,
            disposition_approved_by_id: None,
            sdr_number: String::new(),
            sdr_approve_date: None,
            dmt_closed: false,
            car_closed_date: None,
            is_return: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_car_type_parse() {
        assert_eq!("DMT".parse::<CarType>().unwrap(), CarType::Dmt);
        assert_eq!("ndmt".parse::<CarType>().unwrap(), CarType::Ndmt);
        assert!("car".parse::<CarType>().is_err());
        assert_eq!(CarType::default(), CarType::Dmt);
    }

    #[test]
    fn test_enrichment_resolves_present_names() {
        let names = JoinedNames {
            workcenter: Some("Lathe".to_string()),
            employee: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        let view = EnrichedDmtRecord::from_parts(sample_record(), names);

        assert_eq!(view.employee.as_ref().map(|e| e.name.as_str()), Some("Jane Doe"));
        assert_eq!(view.workcenter.as_ref().map(|w| w.name.as_str()), Some("Lathe"));
        assert!(view.customer.is_none());
        assert!(view.part_number.is_none());
    }

    #[test]
    fn test_enrichment_empty_name_is_null() {
        let names = JoinedNames {
            customer: Some(String::new()),
            ..Default::default()
        };
        let view = EnrichedDmtRecord::from_parts(sample_record(), names);
        assert!(view.customer.is_none());
    }

    #[test]
    fn test_enriched_json_has_every_sub_object_key() {
        let view = EnrichedDmtRecord::from_parts(sample_record(), JoinedNames::default());
        let json = serde_json::to_value(&view).unwrap();
        let obj = json.as_object().unwrap();

        for key in [
            "workcenter",
            "part_number",
            "employee",
            "customer",
            "inspection_item",
            "prepared_by",
            "disposition_approved_by",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
            assert!(obj[key].is_null());
        }
        assert_eq!(obj["id"], "DMT-LR3K9F2-A8X3Q");
        assert_eq!(obj["dmt_closed"], false);
    }

    #[test]
    fn test_enriched_deserializes_embedded_objects() {
        let json = serde_json::json!({
            "id": "DMT-1-ABCDE",
            "workcenter_id": null,
            "part_number_id": "p1",
            "operation": null,
            "employee_id": "e1",
            "qty": 3,
            "customer_id": null,
            "shop_order": "SO-1",
            "serial_number": "",
            "inspection_item_id": null,
            "date": "2024-05-01",
            "prepared_by_id": null,
            "defect_description": "Scratch",
            "car_type": "ndmt",
            "car_cycle": 2,
            "car_second_cycle_date": null,
            "disposition_approved_date": null,
            "disposition_approved_by_id": null,
            "sdr_number": "",
            "sdr_approve_date": null,
            "dmt_closed": true,
            "car_closed_date": null,
            "is_return": false,
            "is_active": true,
            "created_at": "2024-05-01T10:00:00+00:00",
            "updated_at": "2024-05-01T10:00:00+00:00",
            "workcenter": null,
            "part_number": { "part_number": "PN-100" },
            "employee": { "name": "Jane Doe" },
            "customer": null,
            "inspection_item": null,
            "prepared_by": null,
            "disposition_approved_by": null
        });

        let view: EnrichedDmtRecord = serde_json::from_value(json).unwrap();
        assert_eq!(view.record.operation, "");
        assert_eq!(view.record.car_type, CarType::Ndmt);
        assert!(view.record.dmt_closed);
        assert_eq!(view.part_number.unwrap().part_number, "PN-100");
        assert_eq!(view.employee.unwrap().name, "Jane Doe");
        assert!(view.workcenter.is_none());
    }

    #[test]
    fn test_status_label() {
        let mut record = sample_record();
        let open = EnrichedDmtRecord::from_parts(record.clone(), JoinedNames::default());
        assert_eq!(open.status_label(), "Open");
        record.dmt_closed = true;
        let closed = EnrichedDmtRecord::from_parts(record, JoinedNames::default());
        assert_eq!(closed.status_label(), "Closed");
    }
}
