//! Plan document parsing and module tree flattening.
//!
//! A plan JSON export carries its resources in a tree of modules under
//! `planned_values.root_module`. [`PlanGraph`] flattens that tree into an
//! ordered resource list (parents before children, children in plan order)
//! plus an address index used for cross-resource references.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{EstimationError, EstimationResult};
use crate::models::{AttributeValue, Resource, VariableTable, scalar_to_string};

/// Top-level plan document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
    #[serde(default)]
    pub variable_values: Option<Map<String, Value>>,
    #[serde(default)]
    pub planned_values: Option<PlannedValues>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannedValues {
    #[serde(default)]
    pub root_module: Option<ModuleNode>,
}

/// One node of the module tree. Resources and children stay untyped so a
/// single malformed entry can be skipped without rejecting the plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleNode {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub resources: Option<Vec<Value>>,
    #[serde(default)]
    pub child_modules: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(rename = "type", default)]
    resource_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    values: Option<Map<String, Value>>,
}

/// Build the variable table from declared variables and resolved variable values.
///
/// `variables.<name>.value` is read first; `variable_values.<name>` overrides it.
pub fn build_variable_table(document: &PlanDocument) -> VariableTable {
    let mut table = VariableTable::new();

    if let Some(declared) = &document.variables {
        for (name, declaration) in declared {
            if let Some(value) = declaration.get("value").and_then(scalar_to_string) {
                table.insert(name.clone(), value);
            }
        }
    }

    if let Some(values) = &document.variable_values {
        for (name, value) in values {
            if let Some(value) = scalar_to_string(value) {
                table.insert(name.clone(), value);
            }
        }
    }

    table
}

/// Flattened resources and their address index
#[derive(Debug, Clone, Default)]
pub struct PlanGraph {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl PlanGraph {
    /// Walk a module tree depth-first. Malformed resources are logged and skipped.
    pub fn from_root(root: &ModuleNode) -> Self {
        let mut graph = PlanGraph::default();
        let mut position = 0;
        graph.walk(root, &mut position);
        debug!(
            resources = graph.resources.len(),
            addresses = graph.index.len(),
            "Flattened plan module tree"
        );
        graph
    }

    fn walk(&mut self, module: &ModuleNode, position: &mut usize) {
        for raw in module.resources.iter().flatten() {
            let index = *position;
            *position += 1;

            match parse_resource(raw, index) {
                Ok(resource) => self.push(resource),
                Err(e) => {
                    warn!(
                        module = module.address.as_deref().unwrap_or("root"),
                        error = %e,
                        "Skipping malformed resource"
                    );
                }
            }
        }

        for child in module.child_modules.iter().flatten() {
            match ModuleNode::deserialize(child) {
                Ok(child) => self.walk(&child, position),
                Err(e) => {
                    warn!(
                        module = module.address.as_deref().unwrap_or("root"),
                        error = %e,
                        "Skipping malformed child module"
                    );
                }
            }
        }
    }

    /// Append a resource; a duplicate address re-points the index to the newest entry
    pub fn push(&mut self, resource: Resource) {
        self.index
            .insert(resource.address.clone(), self.resources.len());
        self.resources.push(resource);
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn get(&self, address: &str) -> Option<&Resource> {
        self.index.get(address).map(|&i| &self.resources[i])
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<Resource> for PlanGraph {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut graph = PlanGraph::default();
        for resource in iter {
            graph.push(resource);
        }
        graph
    }
}

fn parse_resource(raw: &Value, index: usize) -> EstimationResult<Resource> {
    if !raw.is_object() {
        return Err(EstimationError::MalformedResource {
            index,
            reason: "entry is not an object".to_string(),
        });
    }

    let raw: RawResource =
        serde_json::from_value(raw.clone()).map_err(|e| EstimationError::MalformedResource {
            index,
            reason: e.to_string(),
        })?;

    let values = raw.values.ok_or_else(|| EstimationError::MalformedResource {
        index,
        reason: format!("resource '{}' has no values object", raw.address),
    })?;

    let attributes = values
        .iter()
        .filter_map(|(key, value)| AttributeValue::from_json(value).map(|v| (key.clone(), v)))
        .collect();

    Ok(Resource {
        resource_type: raw.resource_type,
        name: raw.name,
        address: raw.address,
        attributes,
    })
}

/// A parsed plan: variables plus the flattened resource graph
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub variables: VariableTable,
    pub graph: PlanGraph,
}

impl Plan {
    /// Build from a parsed document; a missing `planned_values.root_module` is fatal
    pub fn from_document(document: PlanDocument) -> EstimationResult<Self> {
        let variables = build_variable_table(&document);
        let root = document
            .planned_values
            .as_ref()
            .and_then(|pv| pv.root_module.as_ref())
            .ok_or_else(|| {
                EstimationError::InvalidPlan("missing planned_values.root_module".to_string())
            })?;

        Ok(Self {
            graph: PlanGraph::from_root(root),
            variables,
        })
    }

    pub fn parse(json: &str) -> EstimationResult<Self> {
        let document: PlanDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn load(path: impl AsRef<Path>) -> EstimationResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&contents)
    }
}
