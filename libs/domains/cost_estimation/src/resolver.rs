//! Attribute reference resolution.
//!
//! An attribute is either a literal, or an expression whose `references`
//! point at input variables or at attributes of other resources, which may
//! themselves be expressions. Resolution follows those chains until a
//! literal, a variable value, or a constant is found.

use std::collections::HashSet;
use tracing::warn;

use crate::error::{EstimationError, EstimationResult};
use crate::models::{AttributeValue, Reference, Resource, ResourcePath, VariableTable};
use crate::plan::PlanGraph;

/// Longest reference chain followed before giving up
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 32;

/// Resolves attribute values against a plan's variables and address index
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    variables: &'a VariableTable,
    graph: &'a PlanGraph,
    max_depth: usize,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(variables: &'a VariableTable, graph: &'a PlanGraph) -> Self {
        Self {
            variables,
            graph,
            max_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Concrete string value of `key` on `resource`, or an empty string when
    /// the value cannot be determined.
    ///
    /// Fails with [`EstimationError::CyclicReference`] when a chain revisits an
    /// (address, attribute) pair or grows beyond the configured depth.
    pub fn resolve(&self, resource: &Resource, key: &str) -> EstimationResult<String> {
        let mut visited = HashSet::new();
        self.resolve_visiting(resource, key, &mut visited)
    }

    /// Like [`resolve`](Self::resolve), but a cyclic reference is logged and
    /// treated as unresolved.
    pub fn resolve_or_empty(&self, resource: &Resource, key: &str) -> String {
        match self.resolve(resource, key) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    address = %resource.address,
                    attribute = key,
                    error = %e,
                    "Treating attribute as unresolved"
                );
                String::new()
            }
        }
    }

    fn resolve_visiting(
        &self,
        resource: &Resource,
        key: &str,
        visited: &mut HashSet<(String, String)>,
    ) -> EstimationResult<String> {
        let first_visit = visited.insert((resource.address.clone(), key.to_string()));
        if !first_visit || visited.len() > self.max_depth {
            return Err(EstimationError::CyclicReference {
                address: resource.address.clone(),
                field: key.to_string(),
            });
        }

        let Some(value) = resource.attribute(key) else {
            return Ok(String::new());
        };

        match value {
            AttributeValue::Literal(literal) => Ok(literal.clone()),
            AttributeValue::Unknown => Ok(String::new()),
            AttributeValue::Expression {
                references,
                constant_value,
            } => {
                for reference in references {
                    match reference {
                        Reference::Variable(name) => {
                            if let Some(value) = self.variables.get(name) {
                                return Ok(value.to_string());
                            }
                        }
                        Reference::Resource(path) => {
                            if let Some(value) = self.follow_indexed(path, key, visited)? {
                                return Ok(value);
                            }
                        }
                        Reference::Other(_) => {}
                    }
                }

                // Short `type.name.attribute` paths only once every strict candidate missed
                for reference in references {
                    let Reference::Resource(path) = reference else {
                        continue;
                    };
                    if let Some(value) = self.follow_bare(path, visited)? {
                        return Ok(value);
                    }
                }

                Ok(constant_value.clone().unwrap_or_default())
            }
        }
    }

    /// Follow `type.name.index[.field]`. `None` means the reference did not
    /// lead anywhere and the next one should be tried.
    fn follow_indexed(
        &self,
        path: &ResourcePath,
        key: &str,
        visited: &mut HashSet<(String, String)>,
    ) -> EstimationResult<Option<String>> {
        let (address, field) = path.indexed_target();
        let Some(target) = self.graph.get(&address) else {
            return Ok(None);
        };

        // No fourth segment means "the same attribute on the target"
        let field = field.unwrap_or(key);
        if target.attribute(field).is_none() {
            return Ok(None);
        }
        self.resolve_visiting(target, field, visited).map(Some)
    }

    /// Follow `type.name.field` against an unindexed resource address
    fn follow_bare(
        &self,
        path: &ResourcePath,
        visited: &mut HashSet<(String, String)>,
    ) -> EstimationResult<Option<String>> {
        let (indexed, _) = path.indexed_target();
        if self.graph.get(&indexed).is_some() {
            return Ok(None);
        }

        let (address, field) = path.bare_target();
        match self.graph.get(&address) {
            Some(target) if target.attribute(field).is_some() => {
                self.resolve_visiting(target, field, visited).map(Some)
            }
            _ => Ok(None),
        }
    }
}
