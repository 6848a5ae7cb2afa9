//! Resource filters for telemetry queries.
//!
//! A [`ResourceFilter`] is a conjunction of `field op value` terms. The
//! checks never interpret it; it is handed to the telemetry collaborator,
//! which renders it in the `q.field` / `q.op` / `q.value` query form.

use crate::types::ResourceId;
use serde::{Deserialize, Serialize};

/// Comparison operator of a filter term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl QueryOp {
    /// Wire name of the operator
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QueryOp::Eq => "eq",
            QueryOp::Ne => "ne",
            QueryOp::Lt => "lt",
            QueryOp::Le => "le",
            QueryOp::Gt => "gt",
            QueryOp::Ge => "ge",
        }
    }
}

/// A single `field op value` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTerm {
    pub field: String,
    pub op: QueryOp,
    pub value: String,
}

/// Conjunction of query terms scoping a telemetry query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceFilter {
    terms: Vec<QueryTerm>,
}

impl ResourceFilter {
    /// An empty filter matching everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on `resource == id`
    #[must_use]
    pub fn resource(id: &ResourceId) -> Self {
        Self::new().and("resource", QueryOp::Eq, id.as_str())
    }

    /// Append a term
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, op: QueryOp, value: impl Into<String>) -> Self {
        self.terms.push(QueryTerm {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Terms in insertion order
    #[must_use]
    pub fn terms(&self) -> &[QueryTerm] {
        &self.terms
    }

    /// Value of the first `field == value` term, if any
    #[must_use]
    pub fn equals(&self, field: &str) -> Option<&str> {
        self.terms
            .iter()
            .find(|t| t.field == field && t.op == QueryOp::Eq)
            .map(|t| t.value.as_str())
    }

    /// Render the filter as repeated `q.field`, `q.op`, `q.value` pairs.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        self.terms
            .iter()
            .flat_map(|t| {
                [
                    ("q.field", t.field.clone()),
                    ("q.op", t.op.as_str().to_string()),
                    ("q.value", t.value.clone()),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_filter_has_single_eq_term() {
        let filter = ResourceFilter::resource(&ResourceId::new("inst-1"));
        assert_eq!(filter.terms().len(), 1);
        assert_eq!(filter.equals("resource"), Some("inst-1"));
        assert_eq!(filter.equals("project"), None);
    }

    #[test]
    fn test_query_pairs_keep_term_order() {
        let filter = ResourceFilter::resource(&ResourceId::new("inst-1")).and(
            "timestamp",
            QueryOp::Gt,
            "2014-01-01T00:00:00",
        );

        let pairs = filter.to_query_pairs();
        let expected = vec![
            ("q.field", "resource".to_string()),
            ("q.op", "eq".to_string()),
            ("q.value", "inst-1".to_string()),
            ("q.field", "timestamp".to_string()),
            ("q.op", "gt".to_string()),
            ("q.value", "2014-01-01T00:00:00".to_string()),
        ];
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_equals_ignores_other_operators() {
        let filter = ResourceFilter::new().and("resource", QueryOp::Ne, "inst-1");
        assert_eq!(filter.equals("resource"), None);
    }
}
