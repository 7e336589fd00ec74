//! Static description of device data points.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// On-wire data type of a point.
///
/// The [`name`](NativeType::name) of the type is published verbatim as the
/// record's `Type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeType {
    #[serde(alias = "bool", alias = "boolean")]
    Boolean,
    #[serde(alias = "byte", alias = "u8")]
    Byte,
    #[serde(alias = "i16", alias = "int16")]
    Int16,
    #[serde(alias = "u16", alias = "uint16")]
    UInt16,
    #[serde(alias = "i32", alias = "int32")]
    Int32,
    #[serde(alias = "u32", alias = "uint32")]
    UInt32,
    #[serde(alias = "f32", alias = "float", alias = "single")]
    Single,
}

impl NativeType {
    /// Published type name.
    pub fn name(&self) -> &'static str {
        match self {
            NativeType::Boolean => "Boolean",
            NativeType::Byte => "Byte",
            NativeType::Int16 => "Int16",
            NativeType::UInt16 => "UInt16",
            NativeType::Int32 => "Int32",
            NativeType::UInt32 => "UInt32",
            NativeType::Single => "Single",
        }
    }

    /// Number of bits the value occupies on the wire.
    pub fn bit_width(&self) -> u16 {
        match self {
            NativeType::Boolean => 1,
            NativeType::Byte => 8,
            NativeType::Int16 | NativeType::UInt16 => 16,
            NativeType::Int32 | NativeType::UInt32 | NativeType::Single => 32,
        }
    }
}

impl std::fmt::Display for NativeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One addressable value on the field device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDefinition {
    /// Unique point identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Protocol-specific zone tag (e.g. "holding" or "4X" for Modbus).
    pub area: String,

    /// Protocol address.
    pub address: u32,

    /// Bit or byte offset inside the addressed unit.
    #[serde(default)]
    pub sub_address: u32,

    /// Key used to join raw readings back to this definition.
    pub communication_tag: String,

    /// On-wire data type.
    pub native_type: NativeType,
}

impl PointDefinition {
    /// Display address in `<address>.<sub_address>` form.
    pub fn display_address(&self) -> String {
        format!("{}.{}", self.address, self.sub_address)
    }
}

/// Immutable, ordered point list indexed by communication tag.
///
/// Guarantees that ids and communication tags are non-empty and unique.
#[derive(Debug, Clone)]
pub struct PointTable {
    points: Vec<PointDefinition>,
    by_tag: HashMap<String, usize>,
}

impl PointTable {
    /// Build the table, rejecting empty lists and duplicate ids or tags.
    pub fn new(points: Vec<PointDefinition>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::PointTable(
                "at least one point must be defined".to_string(),
            ));
        }

        let mut by_tag = HashMap::with_capacity(points.len());
        let mut ids = HashMap::with_capacity(points.len());

        for (index, point) in points.iter().enumerate() {
            if point.id.is_empty() {
                return Err(Error::PointTable(format!("point #{} has an empty id", index)));
            }
            if point.communication_tag.is_empty() {
                return Err(Error::PointTable(format!(
                    "point '{}' has an empty communication_tag",
                    point.id
                )));
            }
            if ids.insert(point.id.as_str(), index).is_some() {
                return Err(Error::PointTable(format!("duplicate point id '{}'", point.id)));
            }
            if by_tag
                .insert(point.communication_tag.clone(), index)
                .is_some()
            {
                return Err(Error::PointTable(format!(
                    "duplicate communication_tag '{}'",
                    point.communication_tag
                )));
            }
        }

        Ok(Self { points, by_tag })
    }

    /// Look up a point by its communication tag.
    pub fn by_tag(&self, tag: &str) -> Option<&PointDefinition> {
        self.by_tag.get(tag).map(|&i| &self.points[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointDefinition> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<'a> IntoIterator for &'a PointTable {
    type Item = &'a PointDefinition;
    type IntoIter = std::slice::Iter<'a, PointDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
