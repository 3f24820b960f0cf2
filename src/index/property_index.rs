//! Property index — (property, value) lookups plus per-property sorted
//! structures for range queries.

use std::collections::HashMap;

use regex::Regex;

use crate::types::{GraphError, GraphResult, PropertyValue};

/// Supported property query operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyOp {
    /// Exact equality (strings compare by exact string equality).
    Eq,
    /// Inequality.
    Ne,
    /// Numeric less-than.
    Lt,
    /// Numeric greater-than.
    Gt,
    /// Numeric greater-or-equal.
    Gte,
    /// Numeric less-or-equal.
    Lte,
    /// Substring containment on string values.
    Contains,
    /// Regex match on string values.
    Matches,
}

impl PropertyOp {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::Matches => "matches",
        }
    }

    /// Parse an operator from a string name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "lt" => Some(Self::Lt),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "contains" => Some(Self::Contains),
            "matches" => Some(Self::Matches),
            _ => None,
        }
    }
}

/// Index over node properties.
///
/// Three views of the same data: a canonical-key map for equality hits, a
/// per-property sorted numeric list for range operators, and a plain value
/// table for scan operators (`ne`, `contains`, `matches`).
pub struct PropertyIndex {
    exact: HashMap<String, HashMap<String, Vec<String>>>,
    numeric: HashMap<String, Vec<(f64, String)>>,
    values: HashMap<String, HashMap<String, PropertyValue>>,
}

impl PropertyIndex {
    /// Create a new, empty property index.
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            numeric: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Index one property of a node.
    pub fn add(&mut self, id: &str, property: &str, value: &PropertyValue) {
        let by_value = self.exact.entry(property.to_string()).or_default();
        let list = by_value.entry(value.index_key()).or_default();
        if let Err(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
            list.insert(pos, id.to_string());
        }

        if let Some(n) = value.as_f64() {
            if n.is_finite() {
                let sorted = self.numeric.entry(property.to_string()).or_default();
                let entry = (n, id.to_string());
                let pos = sorted.partition_point(|e| {
                    e.0 < entry.0 || (e.0 == entry.0 && e.1 < entry.1)
                });
                sorted.insert(pos, entry);
            }
        }

        self.values
            .entry(property.to_string())
            .or_default()
            .insert(id.to_string(), value.clone());
    }

    /// Remove one property of a node.
    pub fn remove(&mut self, id: &str, property: &str, value: &PropertyValue) {
        if let Some(by_value) = self.exact.get_mut(property) {
            if let Some(list) = by_value.get_mut(&value.index_key()) {
                if let Ok(pos) = list.binary_search_by(|probe| probe.as_str().cmp(id)) {
                    list.remove(pos);
                }
                if list.is_empty() {
                    by_value.remove(&value.index_key());
                }
            }
            if by_value.is_empty() {
                self.exact.remove(property);
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(sorted) = self.numeric.get_mut(property) {
                sorted.retain(|(v, i)| !(*v == n && i == id));
                if sorted.is_empty() {
                    self.numeric.remove(property);
                }
            }
        }

        if let Some(table) = self.values.get_mut(property) {
            table.remove(id);
            if table.is_empty() {
                self.values.remove(property);
            }
        }
    }

    /// Query node IDs where `property <op> operand`. Results are sorted by id.
    pub fn query(
        &self,
        property: &str,
        op: PropertyOp,
        operand: &PropertyValue,
    ) -> GraphResult<Vec<String>> {
        match op {
            PropertyOp::Eq => Ok(self
                .exact
                .get(property)
                .and_then(|by_value| by_value.get(&operand.index_key()))
                .cloned()
                .unwrap_or_default()),
            PropertyOp::Ne => Ok(self.scan(property, |v| v != operand)),
            PropertyOp::Lt | PropertyOp::Gt | PropertyOp::Gte | PropertyOp::Lte => {
                let bound = operand.as_f64().ok_or_else(|| GraphError::UnsupportedOperator {
                    op: op.name().to_string(),
                    value_type: operand.type_name().to_string(),
                })?;
                Ok(self.range(property, op, bound))
            }
            PropertyOp::Contains => {
                let needle = operand.as_str().ok_or_else(|| GraphError::UnsupportedOperator {
                    op: op.name().to_string(),
                    value_type: operand.type_name().to_string(),
                })?;
                Ok(self.scan(property, |v| {
                    v.as_str().map(|s| s.contains(needle)).unwrap_or(false)
                }))
            }
            PropertyOp::Matches => {
                let pattern = operand.as_str().ok_or_else(|| GraphError::UnsupportedOperator {
                    op: op.name().to_string(),
                    value_type: operand.type_name().to_string(),
                })?;
                let re = Regex::new(pattern)?;
                Ok(self.scan(property, |v| {
                    v.as_str().map(|s| re.is_match(s)).unwrap_or(false)
                }))
            }
        }
    }

    fn scan(&self, property: &str, pred: impl Fn(&PropertyValue) -> bool) -> Vec<String> {
        let mut ids: Vec<String> = self
            .values
            .get(property)
            .map(|table| {
                table
                    .iter()
                    .filter(|(_, v)| pred(v))
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    fn range(&self, property: &str, op: PropertyOp, bound: f64) -> Vec<String> {
        let Some(sorted) = self.numeric.get(property) else {
            return Vec::new();
        };
        let slice: &[(f64, String)] = match op {
            PropertyOp::Lt => &sorted[..sorted.partition_point(|(v, _)| *v < bound)],
            PropertyOp::Lte => &sorted[..sorted.partition_point(|(v, _)| *v <= bound)],
            PropertyOp::Gt => &sorted[sorted.partition_point(|(v, _)| *v <= bound)..],
            PropertyOp::Gte => &sorted[sorted.partition_point(|(v, _)| *v < bound)..],
            _ => unreachable!("range called with non-range op"),
        };
        let mut ids: Vec<String> = slice.iter().map(|(_, id)| id.clone()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Number of indexed properties.
    pub fn property_count(&self) -> usize {
        self.values.len()
    }

    /// Number of (node, property) entries.
    pub fn len(&self) -> usize {
        self.values.values().map(|table| table.len()).sum()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.exact.clear();
        self.numeric.clear();
        self.values.clear();
    }
}

impl Default for PropertyIndex {
    fn default() -> Self {
        Self::new()
    }
}
