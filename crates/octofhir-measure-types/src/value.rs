//! Result values - runtime representation of evaluated expression results
//!
//! The external expression evaluator hands the scoring engine one
//! [`ResultValue`] per expression per subject. Values are hashable so they can
//! serve as population members and stratum keys.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A typed expression result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ResultValue {
    // === Primitive Types ===
    /// Null value (no result)
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Arbitrary precision decimal
    Decimal(Decimal),
    /// String value
    String(String),

    // === Clinical Types ===
    /// Code from a code system
    Code(MeasureCode),
    /// Concept (collection of codes)
    Concept(MeasureConcept),
    /// Quantity with optional unit
    Quantity(MeasureQuantity),
    /// Reference to a resource instance
    Resource(ResourceRef),

    // === Structured Types ===
    /// Interval between two points
    Interval(ValueInterval),
    /// Tuple with named elements
    Tuple(BTreeMap<String, ResultValue>),
    /// Ordered list of values
    List(Vec<ResultValue>),
    /// Function results keyed by the input they were computed for
    Map(Vec<MapEntry>),
}

impl ResultValue {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value is an empty list or map
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Check if this value is `true`
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Boolean(true))
    }

    /// Runtime type name used for basis classification.
    ///
    /// Resources report their resource type, everything else its variant name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Decimal(_) => "Decimal",
            Self::String(_) => "String",
            Self::Code(_) => "Code",
            Self::Concept(_) => "Concept",
            Self::Quantity(_) => "Quantity",
            Self::Resource(r) => &r.resource_type,
            Self::Interval(_) => "Interval",
            Self::Tuple(_) => "Tuple",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
        }
    }

    /// Flatten into elements: lists yield their items, null yields nothing,
    /// anything else yields itself.
    pub fn elements(&self) -> Vec<&ResultValue> {
        match self {
            Self::Null => Vec::new(),
            Self::List(items) => items.iter().filter(|v| !v.is_null()).collect(),
            other => vec![other],
        }
    }

    /// Try to get as Boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as a resource reference
    pub fn as_resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Resource(r) => Some(r),
            _ => None,
        }
    }

    /// Try to get as keyed entries
    pub fn as_map(&self) -> Option<&[MapEntry]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Numeric value of an observation result.
    ///
    /// Integers, decimals, numeric strings and quantities are accepted.
    pub fn as_observation_number(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Decimal(d) => Some(*d),
            Self::String(s) => Decimal::from_str(s.trim()).ok(),
            Self::Quantity(q) => Some(q.value),
            _ => None,
        }
    }

    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    /// Create an integer value
    pub fn integer(value: i64) -> Self {
        Self::Integer(value)
    }

    /// Create a decimal value
    pub fn decimal(value: Decimal) -> Self {
        Self::Decimal(value)
    }

    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Create a resource reference value
    pub fn resource(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Resource(ResourceRef::new(resource_type, id))
    }

    /// Create a list value
    pub fn list(items: impl IntoIterator<Item = ResultValue>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Create a keyed function result
    pub fn map(entries: impl IntoIterator<Item = (ResultValue, ResultValue)>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| MapEntry { key, value })
                .collect(),
        )
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Decimal(d) => write!(f, "{}", d),
            Self::String(s) => write!(f, "{}", s),
            Self::Code(c) => write!(f, "{}", c),
            Self::Concept(c) => write!(f, "{}", c),
            Self::Quantity(q) => write!(f, "{}", q),
            Self::Resource(r) => write!(f, "{}", r),
            Self::Interval(i) => write!(f, "{}", i),
            Self::Tuple(elements) => {
                write!(f, "Tuple {{ ")?;
                for (i, (name, value)) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, " }}")
            }
            Self::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} -> {}", entry.key, entry.value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for ResultValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for ResultValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<ResourceRef> for ResultValue {
    fn from(value: ResourceRef) -> Self {
        Self::Resource(value)
    }
}

// ============================================================================
// Clinical Types
// ============================================================================

/// Reference to a resource instance, `<type>/<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    /// Resource type name, e.g. `Encounter`
    pub resource_type: String,
    /// Logical id
    pub id: String,
}

impl ResourceRef {
    /// Create a new reference
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Parse a relative reference such as `Patient/123`
    pub fn parse(reference: &str) -> Option<Self> {
        let (resource_type, id) = reference.split_once('/')?;
        if resource_type.is_empty() || id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self::new(resource_type, id))
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// A code from a code system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureCode {
    /// Code value
    pub code: String,
    /// Code system URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Display string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl MeasureCode {
    /// Create a new code
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            system: Some(system.into()),
            display: None,
        }
    }
}

impl fmt::Display for MeasureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.system {
            Some(system) => write!(f, "{}|{}", system, self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// A concept (collection of codes with optional text)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureConcept {
    /// Codes
    #[serde(default)]
    pub codes: Vec<MeasureCode>,
    /// Display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl fmt::Display for MeasureConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.text {
            return write!(f, "{}", text);
        }
        let codes: Vec<String> = self.codes.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", codes.join(","))
    }
}

/// A quantity with optional unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureQuantity {
    /// Numeric value
    pub value: Decimal,
    /// Unit string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl fmt::Display for MeasureQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(unit) = &self.unit {
            write!(f, " '{}'", unit)?;
        }
        Ok(())
    }
}

// ============================================================================
// Structured Types
// ============================================================================

/// An interval between two optional bounds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueInterval {
    /// Lower bound
    #[serde(default)]
    pub low: Option<Box<ResultValue>>,
    /// Upper bound
    #[serde(default)]
    pub high: Option<Box<ResultValue>>,
    /// Whether the lower bound is inclusive
    #[serde(default = "default_closed")]
    pub low_closed: bool,
    /// Whether the upper bound is inclusive
    #[serde(default = "default_closed")]
    pub high_closed: bool,
}

fn default_closed() -> bool {
    true
}

impl fmt::Display for ValueInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interval{}", if self.low_closed { "[" } else { "(" })?;
        match &self.low {
            Some(low) => write!(f, "{}", low)?,
            None => write!(f, "null")?,
        }
        write!(f, ", ")?;
        match &self.high {
            Some(high) => write!(f, "{}", high)?,
            None => write!(f, "null")?,
        }
        write!(f, "{}", if self.high_closed { "]" } else { ")" })
    }
}

/// One entry of a keyed function result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapEntry {
    /// Input the function was evaluated for
    pub key: ResultValue,
    /// Function output
    pub value: ResultValue,
}
