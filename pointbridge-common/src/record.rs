//! Published record shape and the transformation into it.

use serde::{Deserialize, Serialize};

use crate::point::PointDefinition;

/// A normalized point value as it travels on the bus.
///
/// Field names are serialized verbatim as `Id`, `Name`, `Address`, `Value`
/// and `Type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublishedRecord {
    /// Point identifier.
    pub id: String,

    /// Point display name.
    pub name: String,

    /// Display address, `<address>.<sub_address>`.
    pub address: String,

    /// Device value, `0` when the device returned none.
    pub value: f64,

    /// Native type name (e.g. "Byte").
    #[serde(rename = "Type")]
    pub kind: String,
}

/// Map one point and its raw device value to a published record.
///
/// Pure and deterministic: the same inputs always give the same record.
///
/// # Example
/// ```
/// use pointbridge_common::point::{NativeType, PointDefinition};
/// use pointbridge_common::record::transform;
///
/// let point = PointDefinition {
///     id: "D1".into(),
///     name: "Variable 1".into(),
///     area: "1X".into(),
///     address: 2,
///     sub_address: 0,
///     communication_tag: "D1".into(),
///     native_type: NativeType::Byte,
/// };
///
/// let record = transform(&point, Some(7.0));
/// assert_eq!(record.address, "2.0");
/// assert_eq!(record.value, 7.0);
/// assert_eq!(record.kind, "Byte");
///
/// assert_eq!(transform(&point, None).value, 0.0);
/// ```
pub fn transform(point: &PointDefinition, raw: Option<f64>) -> PublishedRecord {
    PublishedRecord {
        id: point.id.clone(),
        name: point.name.clone(),
        address: point.display_address(),
        value: raw.unwrap_or(0.0),
        kind: point.native_type.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::NativeType;

    fn point() -> PointDefinition {
        PointDefinition {
            id: "T1".to_string(),
            name: "Tank level".to_string(),
            area: "holding".to_string(),
            address: 40,
            sub_address: 3,
            communication_tag: "tank".to_string(),
            native_type: NativeType::Single,
        }
    }

    #[test]
    fn test_fields_copied_from_definition() {
        let record = transform(&point(), Some(12.5));

        assert_eq!(record.id, "T1");
        assert_eq!(record.name, "Tank level");
        assert_eq!(record.address, "40.3");
        assert_eq!(record.value, 12.5);
        assert_eq!(record.kind, "Single");
    }

    #[test]
    fn test_absent_value_defaults_to_zero() {
        assert_eq!(transform(&point(), None).value, 0.0);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let p = point();
        assert_eq!(transform(&p, Some(-1.0)), transform(&p, Some(-1.0)));
        assert_eq!(transform(&p, None), transform(&p, None));
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(transform(&point(), Some(7.0))).unwrap();
        let obj = json.as_object().unwrap();

        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["Address", "Id", "Name", "Type", "Value"]);
        assert_eq!(json["Type"], "Single");
        assert_eq!(json["Address"], "40.3");
    }
}
