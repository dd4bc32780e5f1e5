// restbase-core/src/plan.rs
//! Pipeline planner: the full query-parameter set -> one `QueryPlan`.

use crate::predicate::{split_key, FilterOp, Predicate};

/// Sort direction for one sort pass. Anything other than the literal
/// token `desc` is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// The derived, request-scoped transformation plan.
///
/// Immutable once built. Predicates apply in first-seen order; the sort
/// order list pairs positionally with the sort field list and may be
/// shorter (missing entries default to ascending); `start`/`end` are the
/// half-open pagination window.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    pub filters: Vec<Predicate>,
    pub sort_fields: Vec<String>,
    pub sort_order: Vec<SortOrder>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub embed: Vec<String>,
    pub refs: Vec<String>,
}

impl QueryPlan {
    /// Build a plan from the ordered query-parameter pairs of one request.
    ///
    /// Each parameter is classified exactly once: a recognized filter
    /// suffix accumulates a predicate, an empty field name carries a
    /// plan directive (last occurrence wins), anything else is ignored.
    pub fn from_params(params: &[(String, String)]) -> Self {
        let mut plan = QueryPlan::default();

        for (key, value) in params {
            let (field, operator) = split_key(key);

            if let Some(op) = FilterOp::from_suffix(operator) {
                plan.filters.push(Predicate::new(field, op, value.as_str()));
            }

            if field.is_empty() {
                match operator {
                    "sort" => plan.sort_fields = split_list(value),
                    "order" => {
                        plan.sort_order = value
                            .split(',')
                            .map(|token| {
                                if token == "desc" {
                                    SortOrder::Desc
                                } else {
                                    SortOrder::Asc
                                }
                            })
                            .collect();
                    }
                    "start" => plan.start = value.parse().ok(),
                    "end" => plan.end = value.parse().ok(),
                    "embed" => plan.embed = split_list(value),
                    "refs" => plan.refs = split_list(value),
                    _ => {}
                }
            }
        }

        plan
    }

    /// Sort direction for pass `index`, defaulting to ascending when the
    /// order list is shorter than the field list.
    pub fn order_for(&self, index: usize) -> SortOrder {
        self.sort_order.get(index).copied().unwrap_or_default()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}
