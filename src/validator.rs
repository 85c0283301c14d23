//! Status schema validation
//!
//! Validates raw status payloads against the turtle status contract before
//! anything touches entity state. Validation is a pure function over the
//! payload: no side effects, and a failed validation carries a structured
//! fault list (field path, stable code, message) for logging and for API
//! error detail.
//!
//! The contract:
//! - `online` is required and must be a boolean.
//! - When `online` is true the full online facet is required: `fuel`
//!   (non-negative integer), `position` (integer `x`/`y`/`z`),
//!   `orientation` (`north`/`east`/`south`/`west`), `whitelist` (array of
//!   strings) and `inventory` (array of slot objects).
//! - When `online` is false no facet field is required, but any facet
//!   field that is present must still validate.
//! - Unknown top-level fields are tolerated for forward compatibility.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::Orientation;

/// A single validation fault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFault {
    /// Path to the offending value (e.g. `inventory[2].count`)
    pub path: String,
    /// Stable code for programmatic handling
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// What the contract expected at this path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// What the payload actually carried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl ValidationFault {
    /// A required field is absent
    pub fn missing(path: impl Into<String>, expected: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("required field '{}' is missing", path),
            code: "REQUIRED_FIELD_MISSING".to_string(),
            expected: Some(expected.into()),
            actual: None,
            path,
        }
    }

    /// A field is present with the wrong type
    pub fn mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            message: format!("field '{}' has the wrong type", path),
            code: "TYPE_MISMATCH".to_string(),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
            path,
        }
    }

    /// A numeric field is outside its permitted range
    pub fn out_of_range(path: impl Into<String>, actual: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("field '{}' is out of range", path),
            code: "VALUE_OUT_OF_RANGE".to_string(),
            expected: Some("integer >= 0".to_string()),
            actual: Some(actual.into()),
            path,
        }
    }

    /// A string field carries a value outside its enumeration
    pub fn not_in_enum(path: impl Into<String>, actual: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("field '{}' is not one of the permitted values", path),
            code: "ENUM_MISMATCH".to_string(),
            expected: Some(Orientation::VALUES.join("|")),
            actual: Some(actual.into()),
            path,
        }
    }
}

/// Verdict of validating one status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the payload satisfies the contract
    pub valid: bool,
    /// All faults found (empty when valid)
    pub faults: Vec<ValidationFault>,
}

impl ValidationReport {
    /// Report for a payload with no faults
    pub fn valid() -> Self {
        Self {
            valid: true,
            faults: Vec::new(),
        }
    }

    /// Report built from a fault list; valid iff the list is empty
    pub fn with_faults(faults: Vec<ValidationFault>) -> Self {
        Self {
            valid: faults.is_empty(),
            faults,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Consume the report, yielding the fault list
    pub fn into_faults(self) -> Vec<ValidationFault> {
        self.faults
    }
}

/// Validator for turtle status payloads.
///
/// Stateless; constructed once at process start and passed by reference to
/// every collaborator that needs to admit payloads.
#[derive(Debug, Clone, Default)]
pub struct StatusValidator;

impl StatusValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a candidate status payload against the contract.
    pub fn validate(&self, payload: &Value) -> ValidationReport {
        let Some(object) = payload.as_object() else {
            return ValidationReport::with_faults(vec![ValidationFault::mismatch(
                "",
                "object",
                json_type_name(payload),
            )]);
        };

        let mut faults = Vec::new();

        let online = match object.get("online") {
            Some(Value::Bool(online)) => Some(*online),
            Some(other) => {
                faults.push(ValidationFault::mismatch(
                    "online",
                    "boolean",
                    json_type_name(other),
                ));
                None
            }
            None => {
                faults.push(ValidationFault::missing("online", "boolean"));
                None
            }
        };

        // The online facet is required as a whole when online, and
        // validated individually whenever present.
        let required = online == Some(true);
        check_field(object, "fuel", required, &mut faults, check_fuel);
        check_field(object, "position", required, &mut faults, check_position);
        check_field(object, "orientation", required, &mut faults, check_orientation);
        check_field(object, "whitelist", required, &mut faults, check_whitelist);
        check_field(object, "inventory", required, &mut faults, check_inventory);

        ValidationReport::with_faults(faults)
    }
}

fn check_field(
    object: &serde_json::Map<String, Value>,
    field: &str,
    required: bool,
    faults: &mut Vec<ValidationFault>,
    check: fn(&Value, &str, &mut Vec<ValidationFault>),
) {
    match object.get(field) {
        Some(value) => check(value, field, faults),
        None if required => faults.push(ValidationFault::missing(field, expected_shape(field))),
        None => {}
    }
}

fn expected_shape(field: &str) -> &'static str {
    match field {
        "fuel" => "integer >= 0",
        "position" => "object { x, y, z }",
        "orientation" => "string",
        "whitelist" => "array of strings",
        "inventory" => "array of slot objects",
        _ => "value",
    }
}

fn check_fuel(value: &Value, path: &str, faults: &mut Vec<ValidationFault>) {
    if value.as_u64().is_some() {
        return;
    }
    match value.as_i64() {
        // as_u64 failed but as_i64 succeeded: a negative integer
        Some(n) => faults.push(ValidationFault::out_of_range(path, n.to_string())),
        None => faults.push(ValidationFault::mismatch(path, "integer", json_type_name(value))),
    }
}

fn check_position(value: &Value, path: &str, faults: &mut Vec<ValidationFault>) {
    let Some(object) = value.as_object() else {
        faults.push(ValidationFault::mismatch(path, "object", json_type_name(value)));
        return;
    };
    for axis in ["x", "y", "z"] {
        let axis_path = format!("{}.{}", path, axis);
        match object.get(axis) {
            Some(coordinate) if coordinate.as_i64().is_some() => {}
            Some(coordinate) => faults.push(ValidationFault::mismatch(
                axis_path,
                "integer",
                json_type_name(coordinate),
            )),
            None => faults.push(ValidationFault::missing(axis_path, "integer")),
        }
    }
}

fn check_orientation(value: &Value, path: &str, faults: &mut Vec<ValidationFault>) {
    match value.as_str() {
        Some(s) if Orientation::VALUES.contains(&s) => {}
        Some(s) => faults.push(ValidationFault::not_in_enum(path, s)),
        None => faults.push(ValidationFault::mismatch(path, "string", json_type_name(value))),
    }
}

fn check_whitelist(value: &Value, path: &str, faults: &mut Vec<ValidationFault>) {
    let Some(entries) = value.as_array() else {
        faults.push(ValidationFault::mismatch(path, "array", json_type_name(value)));
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_string() {
            faults.push(ValidationFault::mismatch(
                format!("{}[{}]", path, index),
                "string",
                json_type_name(entry),
            ));
        }
    }
}

fn check_inventory(value: &Value, path: &str, faults: &mut Vec<ValidationFault>) {
    let Some(slots) = value.as_array() else {
        faults.push(ValidationFault::mismatch(path, "array", json_type_name(value)));
        return;
    };
    for (index, slot) in slots.iter().enumerate() {
        let slot_path = format!("{}[{}]", path, index);
        let Some(object) = slot.as_object() else {
            faults.push(ValidationFault::mismatch(slot_path, "object", json_type_name(slot)));
            continue;
        };
        for (field, is_valid, expected) in [
            ("name", Value::is_string as fn(&Value) -> bool, "string"),
            ("damage", |v: &Value| v.as_i64().is_some(), "integer"),
            ("count", |v: &Value| v.as_i64().is_some(), "integer"),
        ] {
            let field_path = format!("{}.{}", slot_path, field);
            match object.get(field) {
                Some(v) if is_valid(v) => {}
                Some(v) => faults.push(ValidationFault::mismatch(
                    field_path,
                    expected,
                    json_type_name(v),
                )),
                None => faults.push(ValidationFault::missing(field_path, expected)),
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_online_payload() -> Value {
        json!({
            "online": true,
            "fuel": 512,
            "position": { "x": 10, "y": 64, "z": -4 },
            "orientation": "north",
            "whitelist": ["minecraft:stone", "minecraft:dirt"],
            "inventory": [
                { "name": "minecraft:coal", "damage": 0, "count": 16 },
                { "name": "minecraft:torch", "damage": 0, "count": 3 },
            ],
        })
    }

    fn codes_at<'a>(report: &'a ValidationReport, path: &str) -> Vec<&'a str> {
        report
            .faults
            .iter()
            .filter(|f| f.path == path)
            .map(|f| f.code.as_str())
            .collect()
    }

    #[test]
    fn test_full_online_payload_is_valid() {
        let report = StatusValidator::new().validate(&full_online_payload());
        assert!(report.is_valid(), "faults: {:?}", report.faults);
    }

    #[test]
    fn test_minimal_offline_payload_is_valid() {
        let report = StatusValidator::new().validate(&json!({ "online": false }));
        assert!(report.is_valid());
    }

    #[test]
    fn test_online_flag_is_required() {
        let report = StatusValidator::new().validate(&json!({ "fuel": 10 }));
        assert!(!report.is_valid());
        assert_eq!(codes_at(&report, "online"), ["REQUIRED_FIELD_MISSING"]);
    }

    #[test]
    fn test_online_flag_must_be_boolean() {
        let report = StatusValidator::new().validate(&json!({ "online": "yes" }));
        assert!(!report.is_valid());
        assert_eq!(codes_at(&report, "online"), ["TYPE_MISMATCH"]);
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let report = StatusValidator::new().validate(&json!([1, 2, 3]));
        assert!(!report.is_valid());
        assert_eq!(report.faults[0].actual.as_deref(), Some("array"));
    }

    #[test]
    fn test_online_requires_the_full_facet() {
        let report = StatusValidator::new().validate(&json!({ "online": true }));
        assert!(!report.is_valid());
        for field in ["fuel", "position", "orientation", "whitelist", "inventory"] {
            assert_eq!(codes_at(&report, field), ["REQUIRED_FIELD_MISSING"], "{}", field);
        }
    }

    #[test]
    fn test_online_with_missing_fuel_only_faults_fuel() {
        let mut payload = full_online_payload();
        payload.as_object_mut().unwrap().remove("fuel");
        let report = StatusValidator::new().validate(&payload);
        assert!(!report.is_valid());
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].path, "fuel");
    }

    #[test]
    fn test_negative_fuel_is_out_of_range() {
        let mut payload = full_online_payload();
        payload["fuel"] = json!(-5);
        let report = StatusValidator::new().validate(&payload);
        assert_eq!(codes_at(&report, "fuel"), ["VALUE_OUT_OF_RANGE"]);
    }

    #[test]
    fn test_fractional_fuel_is_a_type_mismatch() {
        let mut payload = full_online_payload();
        payload["fuel"] = json!(1.5);
        let report = StatusValidator::new().validate(&payload);
        assert_eq!(codes_at(&report, "fuel"), ["TYPE_MISMATCH"]);
    }

    #[test]
    fn test_position_requires_all_three_axes() {
        let mut payload = full_online_payload();
        payload["position"] = json!({ "x": 1, "y": 2 });
        let report = StatusValidator::new().validate(&payload);
        assert_eq!(codes_at(&report, "position.z"), ["REQUIRED_FIELD_MISSING"]);
    }

    #[test]
    fn test_orientation_enum_is_closed() {
        let mut payload = full_online_payload();
        payload["orientation"] = json!("up");
        let report = StatusValidator::new().validate(&payload);
        assert_eq!(codes_at(&report, "orientation"), ["ENUM_MISMATCH"]);
        let fault = &report.faults[0];
        assert_eq!(fault.expected.as_deref(), Some("north|east|south|west"));
        assert_eq!(fault.actual.as_deref(), Some("up"));
    }

    #[test]
    fn test_whitelist_entries_must_be_strings() {
        let mut payload = full_online_payload();
        payload["whitelist"] = json!(["minecraft:stone", 7]);
        let report = StatusValidator::new().validate(&payload);
        assert_eq!(codes_at(&report, "whitelist[1]"), ["TYPE_MISMATCH"]);
    }

    #[test]
    fn test_inventory_slot_faults_carry_indexed_paths() {
        let mut payload = full_online_payload();
        payload["inventory"] = json!([
            { "name": "minecraft:coal", "damage": 0, "count": 16 },
            { "name": "minecraft:coal", "damage": 0 },
            { "name": 3, "damage": 0, "count": "many" },
        ]);
        let report = StatusValidator::new().validate(&payload);
        assert_eq!(codes_at(&report, "inventory[1].count"), ["REQUIRED_FIELD_MISSING"]);
        assert_eq!(codes_at(&report, "inventory[2].name"), ["TYPE_MISMATCH"]);
        assert_eq!(codes_at(&report, "inventory[2].count"), ["TYPE_MISMATCH"]);
    }

    #[test]
    fn test_unknown_top_level_fields_are_tolerated() {
        let mut payload = full_online_payload();
        payload["firmware"] = json!("2.3.1");
        let report = StatusValidator::new().validate(&payload);
        assert!(report.is_valid());
    }

    // Documented tightening: facet fields stay optional while offline, but
    // a facet field that is present must still validate.
    #[test]
    fn test_offline_payload_with_invalid_present_field_is_rejected() {
        let report = StatusValidator::new()
            .validate(&json!({ "online": false, "fuel": "plenty" }));
        assert!(!report.is_valid());
        assert_eq!(codes_at(&report, "fuel"), ["TYPE_MISMATCH"]);
    }

    #[test]
    fn test_offline_payload_with_valid_facet_fields_is_accepted() {
        let report = StatusValidator::new().validate(&json!({
            "online": false,
            "fuel": 3,
            "position": { "x": 0, "y": 0, "z": 0 },
        }));
        assert!(report.is_valid());
    }

    #[test]
    fn test_report_serializes_fault_detail() {
        let report = StatusValidator::new().validate(&json!({ "online": true }));
        let serialized = serde_json::to_value(&report).unwrap();
        assert_eq!(serialized["valid"], json!(false));
        assert!(serialized["faults"].as_array().unwrap().len() >= 5);
    }
}
