use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use strum::{Display, EnumString};

/// Prefix marking a reference to an input variable
const VARIABLE_PREFIX: &str = "var.";

/// One entry of an attribute's `references` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `var.<name>`
    Variable(String),
    /// Dotted path into another resource, at least three segments
    Resource(ResourcePath),
    /// Anything else (locals, bare resource addresses)
    Other(String),
}

impl Reference {
    pub fn parse(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix(VARIABLE_PREFIX) {
            return Reference::Variable(name.to_string());
        }

        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.len() >= 3 {
            Reference::Resource(ResourcePath { segments })
        } else {
            Reference::Other(raw.to_string())
        }
    }
}

/// `type.name.<segment>[.<field>...]` reference path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// First three segments as the address, fourth segment (if any) as the field
    pub fn indexed_target(&self) -> (String, Option<&str>) {
        (
            self.segments[..3].join("."),
            self.segments.get(3).map(String::as_str),
        )
    }

    /// First two segments as the address, third segment as the field
    pub fn bare_target(&self) -> (String, &str) {
        (self.segments[..2].join("."), self.segments[2].as_str())
    }
}

/// A planned attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Known scalar value, stored in its string form
    Literal(String),
    /// Value computed from references and/or a constant
    Expression {
        references: Vec<Reference>,
        constant_value: Option<String>,
    },
    /// Present but not resolvable to a scalar (lists, nested blocks)
    Unknown,
}

impl AttributeValue {
    /// Classify a raw plan value. Returns `None` for JSON null.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(AttributeValue::Literal(s.clone())),
            Value::Number(n) => Some(AttributeValue::Literal(n.to_string())),
            Value::Bool(b) => Some(AttributeValue::Literal(b.to_string())),
            Value::Object(map) => {
                let references: Vec<Reference> = map
                    .get("references")
                    .and_then(Value::as_array)
                    .map(|refs| {
                        refs.iter()
                            .filter_map(Value::as_str)
                            .map(Reference::parse)
                            .collect()
                    })
                    .unwrap_or_default();
                let constant_value = map.get("constant_value").and_then(scalar_to_string);

                if references.is_empty() && constant_value.is_none() {
                    Some(AttributeValue::Unknown)
                } else {
                    Some(AttributeValue::Expression {
                        references,
                        constant_value,
                    })
                }
            }
            Value::Array(_) => Some(AttributeValue::Unknown),
        }
    }
}

/// String form of a JSON value the way it is printed in reports
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A planned resource, flattened out of the module tree
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub resource_type: String,
    pub name: String,
    pub address: String,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Resource {
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// Flat variable name -> value mapping built from the plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    values: HashMap<String, String>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = VariableTable::new();
        for (name, value) in iter {
            table.insert(name, value);
        }
        table
    }
}

/// Item of the Azure Retail Prices API. Missing and `null` fields read as empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceCatalogEntry {
    #[serde(rename = "retailPrice", default, deserialize_with = "null_as_default")]
    pub retail_price: f64,
    #[serde(rename = "unitOfMeasure", default, deserialize_with = "null_as_default")]
    pub unit_of_measure: String,
    #[serde(rename = "meterName", default, deserialize_with = "null_as_default")]
    pub meter_name: String,
    #[serde(rename = "skuName", default, deserialize_with = "null_as_default")]
    pub sku_name: String,
    #[serde(rename = "armSkuName", default)]
    pub arm_sku_name: Option<String>,
    #[serde(rename = "armRegionName", default, deserialize_with = "null_as_default")]
    pub arm_region_name: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unit price picked from the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub unit_price: f64,
    pub unit_of_measure: String,
}

impl PriceQuote {
    pub fn new(unit_price: f64, unit_of_measure: impl Into<String>) -> Self {
        Self {
            unit_price,
            unit_of_measure: unit_of_measure.into(),
        }
    }
}

impl From<&PriceCatalogEntry> for PriceQuote {
    fn from(entry: &PriceCatalogEntry) -> Self {
        PriceQuote::new(entry.retail_price, entry.unit_of_measure.clone())
    }
}

/// How the unit price of a resource was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PriceStatus {
    /// Catalog entry matched
    Matched,
    /// Catalog lookup failed, built-in fallback price used
    Fallback,
    /// No catalog entry matched
    NotFound,
}

impl PriceStatus {
    pub fn is_priced(&self) -> bool {
        !matches!(self, PriceStatus::NotFound)
    }
}

/// Estimate for one planned resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedResource {
    pub resource_type: String,
    pub name: String,
    pub address: String,
    pub region: String,
    pub sku: String,
    pub unit_cost: f64,
    pub unit_of_measure: String,
    pub quantity: f64,
    pub usage_description: String,
    pub monthly_cost: f64,
    pub status: PriceStatus,
}

/// Ordered estimates plus their running total
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostReport {
    pub items: Vec<PricedResource>,
    pub total_monthly_cost: f64,
}

impl CostReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; only priced records count towards the total
    pub fn push(&mut self, item: PricedResource) {
        if item.status.is_priced() {
            self.total_monthly_cost += item.monthly_cost;
        }
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
