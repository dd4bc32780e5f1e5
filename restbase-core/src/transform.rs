// restbase-core/src/transform.rs
//! Collection transformer: executes a `QueryPlan` against a snapshot of
//! one collection, in fixed order: filter -> sort -> paginate -> clone ->
//! embed -> reverse-references.
//!
//! Reads never mutate the store. The first three stages work over
//! borrowed records; survivors are deep-cloned before any embedding so
//! the store's canonical copies stay untouched.

use crate::inflect::{pluralize, singularize};
use crate::plan::{QueryPlan, SortOrder};
use crate::value_utils::{compare_values_with_none, get_path, loose_eq, loose_eq_values};
use serde_json::{Map, Value};

/// A fully materialized, request-scoped page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub records: Vec<Value>,
    /// Post-slice length, present only when pagination was requested.
    /// Surfaced as the `X-Total-Count` response header.
    pub total: Option<usize>,
}

/// Run a plan against the named collection of `data`.
///
/// A name that is absent or not a collection yields an empty page; the
/// routing layer rejects those before planning, so this is a belt for
/// direct library callers.
pub fn run(data: &Map<String, Value>, name: &str, plan: &QueryPlan) -> ListPage {
    let empty = Vec::new();
    let collection = data.get(name).and_then(Value::as_array).unwrap_or(&empty);

    // 1. Filter: a record failing any predicate is dropped, remaining
    // predicates are skipped for it.
    let mut survivors: Vec<&Value> = collection
        .iter()
        .filter(|record| plan.filters.iter().all(|p| p.matches(record)))
        .collect();

    // 2. Sort: one stable pass per (field, order) pair, in plan order.
    // Each later pass re-sorts the whole list; records its comparator
    // considers equal keep the previous pass's order. This iterative
    // semantics is not a single multi-key comparator.
    for (index, field) in plan.sort_fields.iter().enumerate() {
        let order = plan.order_for(index);
        survivors.sort_by(|a, b| {
            let ord = compare_values_with_none(get_path(a, field), get_path(b, field));
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
    }

    // 3. Paginate: half-open [start, end), clamped to the filtered list.
    let mut total = None;
    if let Some(start) = plan.start {
        let len = survivors.len();
        let start = start.min(len);
        let end = plan.end.unwrap_or(len).min(len).max(start);
        survivors = survivors[start..end].to_vec();
        total = Some(survivors.len());
    }

    // 4. Clone survivors before embedding mutates them.
    let mut records: Vec<Value> = survivors.into_iter().cloned().collect();

    // 5. Embed relations along each dot path.
    for path in &plan.embed {
        let segments: Vec<&str> = path.split('.').collect();
        for record in &mut records {
            if let Value::Object(obj) = record {
                embed_segments(data, obj, &segments);
            }
        }
    }

    // 6. Attach reverse references.
    for ref_name in &plan.refs {
        for record in &mut records {
            attach_refs(data, name, record, ref_name);
        }
    }

    ListPage { records, total }
}

/// Find a record by id in the named collection. Ids compare loosely, so
/// numeric ids match their string form.
pub fn find_by_id<'a>(data: &'a Map<String, Value>, name: &str, id: &Value) -> Option<&'a Value> {
    data.get(name)?.as_array()?.iter().find(|record| {
        record
            .get("id")
            .is_some_and(|record_id| loose_eq_values(record_id, id))
    })
}

/// Find a record by the textual id taken from a request path.
pub fn find_by_id_param<'a>(
    data: &'a Map<String, Value>,
    name: &str,
    id: &str,
) -> Option<&'a Value> {
    data.get(name)?.as_array()?.iter().find(|record| {
        record
            .get("id")
            .is_some_and(|record_id| loose_eq(record_id, id))
    })
}

/// Single-level embedding for one record (the `GET /:id` path). Each
/// field name is treated as one segment; dotted names are simply absent
/// properties and are skipped.
pub fn embed_record(data: &Map<String, Value>, record: &mut Value, fields: &[String]) {
    for field in fields {
        if let Value::Object(obj) = record {
            embed_segments(data, obj, &[field.as_str()]);
        }
    }
}

/// Walk embed-path segments through one object.
///
/// At each segment: a property holding a scalar id is replaced with the
/// deep-cloned record of that id from the `pluralize(segment)`
/// collection and the walk descends into it; a property already holding
/// an object is descended into as-is; a missing property is skipped; a
/// dangling id ends the walk with the property untouched.
fn embed_segments(data: &Map<String, Value>, obj: &mut Map<String, Value>, segments: &[&str]) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };

    match obj.get_mut(*segment) {
        None => embed_segments(data, obj, rest),
        Some(slot) => {
            if matches!(slot, Value::String(_) | Value::Number(_)) {
                match find_by_id(data, &pluralize(segment), slot) {
                    Some(found) => *slot = found.clone(),
                    None => return,
                }
            }
            if let Value::Object(inner) = slot {
                embed_segments(data, inner, rest);
            }
        }
    }
}

/// Attach the reverse-reference field for one record: every record of
/// collection `pluralize(ref_name)` whose `singularize(resource)` field
/// equals this record's id, sorted ascending by `weight` when any child
/// carries one. The field is attached even when empty.
fn attach_refs(data: &Map<String, Value>, resource: &str, record: &mut Value, ref_name: &str) {
    let Value::Object(obj) = record else {
        return;
    };
    let parent_field = singularize(resource);
    let target = pluralize(ref_name);

    let id = obj.get("id").cloned().unwrap_or(Value::Null);
    let mut children: Vec<Value> = data
        .get(&target)
        .and_then(Value::as_array)
        .map(|candidates| {
            candidates
                .iter()
                .filter(|child| {
                    child
                        .get(&parent_field)
                        .is_some_and(|parent_id| loose_eq_values(parent_id, &id))
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if children.iter().any(|child| child.get("weight").is_some()) {
        children.sort_by(|a, b| compare_values_with_none(a.get("weight"), b.get("weight")));
    }

    obj.insert(target, Value::Array(children));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Map<String, Value> {
        json!({
            "products": [
                {"id": 1, "name": "Wooden Train", "price": 25, "subcategory": "trains"},
                {"id": 2, "name": "Steel Train", "price": 75, "subcategory": "trains"},
                {"id": 3, "name": "Doll House", "price": 120, "subcategory": "dolls"},
                {"id": 4, "name": "Paper Plane", "price": 3, "subcategory": "planes"},
                {"id": 5, "name": "Toy Robot", "price": 75, "subcategory": "dolls"}
            ],
            "subcategories": [
                {"id": "trains", "name": "Trains", "category": "kids"},
                {"id": "dolls", "name": "Dolls", "category": "kids"},
                {"id": "planes", "name": "Planes", "category": "hobby"}
            ],
            "categories": [
                {"id": "kids", "name": "Kids"},
                {"id": "hobby", "name": "Hobby"}
            ]
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn plan_of(pairs: &[(&str, &str)]) -> QueryPlan {
        let params: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QueryPlan::from_params(&params)
    }

    fn ids(page: &ListPage) -> Vec<Value> {
        page.records
            .iter()
            .map(|r| r.get("id").unwrap().clone())
            .collect()
    }

    // ========== filter ==========

    #[test]
    fn test_no_plan_returns_all_in_insertion_order() {
        let data = fixture();
        let page = run(&data, "products", &QueryPlan::default());
        assert_eq!(ids(&page), vec![json!(1), json!(2), json!(3), json!(4), json!(5)]);
        assert_eq!(page.total, None);
    }

    #[test]
    fn test_filters_and_compose() {
        let data = fixture();
        let page = run(
            &data,
            "products",
            &plan_of(&[("price_gte", "20"), ("price_lte", "100"), ("name_like", "train")]),
        );
        assert_eq!(ids(&page), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_filter_preserves_relative_order() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("price", "75")]));
        assert_eq!(ids(&page), vec![json!(2), json!(5)]);
    }

    // ========== sort ==========

    #[test]
    fn test_sort_single_field_asc() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("_sort", "price")]));
        assert_eq!(ids(&page), vec![json!(4), json!(1), json!(2), json!(5), json!(3)]);
    }

    #[test]
    fn test_sort_desc_token() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("_sort", "price"), ("_order", "desc")]));
        assert_eq!(ids(&page), vec![json!(3), json!(2), json!(5), json!(1), json!(4)]);
    }

    #[test]
    fn test_sort_is_sequence_of_stable_passes() {
        let data = json!({
            "rows": [
                {"id": 1, "a": 1, "b": 2},
                {"id": 2, "a": 1, "b": 1}
            ]
        })
        .as_object()
        .unwrap()
        .clone();
        let page = run(&data, "rows", &plan_of(&[("_sort", "a,b"), ("_order", "asc,asc")]));
        assert_eq!(ids(&page), vec![json!(2), json!(1)]);
    }

    #[test]
    fn test_sort_ties_keep_previous_pass_order() {
        let data = fixture();
        // price pass orders [4,1,2,5,3]; the subcategory pass then groups
        // dolls < planes < trains, keeping price order inside each group
        let page = run(&data, "products", &plan_of(&[("_sort", "price,subcategory")]));
        assert_eq!(ids(&page), vec![json!(5), json!(3), json!(4), json!(1), json!(2)]);
    }

    #[test]
    fn test_sort_missing_values_first() {
        let data = json!({
            "rows": [
                {"id": 1, "rank": 2},
                {"id": 2},
                {"id": 3, "rank": 1}
            ]
        })
        .as_object()
        .unwrap()
        .clone();
        let page = run(&data, "rows", &plan_of(&[("_sort", "rank")]));
        assert_eq!(ids(&page), vec![json!(2), json!(3), json!(1)]);
    }

    // ========== paginate ==========

    #[test]
    fn test_paginate_half_open_window() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("_start", "1"), ("_end", "3")]));
        assert_eq!(ids(&page), vec![json!(2), json!(3)]);
        assert_eq!(page.total, Some(2));
    }

    #[test]
    fn test_paginate_end_defaults_to_len() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("_start", "3")]));
        assert_eq!(ids(&page), vec![json!(4), json!(5)]);
        assert_eq!(page.total, Some(2));
    }

    #[test]
    fn test_paginate_out_of_range_clamps() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("_start", "10"), ("_end", "20")]));
        assert!(page.records.is_empty());
        assert_eq!(page.total, Some(0));
    }

    #[test]
    fn test_end_without_start_is_not_pagination() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("_end", "2")]));
        assert_eq!(page.records.len(), 5);
        assert_eq!(page.total, None);
    }

    // ========== embed ==========

    #[test]
    fn test_embed_single_level() {
        let data = fixture();
        let page = run(&data, "products", &plan_of(&[("id", "1"), ("_embed", "subcategory")]));
        assert_eq!(
            page.records[0]["subcategory"],
            json!({"id": "trains", "name": "Trains", "category": "kids"})
        );
    }

    #[test]
    fn test_embed_nested_path() {
        let data = fixture();
        let page = run(
            &data,
            "products",
            &plan_of(&[("id", "1"), ("_embed", "subcategory.category")]),
        );
        assert_eq!(
            page.records[0]["subcategory"]["category"],
            json!({"id": "kids", "name": "Kids"})
        );
    }

    #[test]
    fn test_embed_never_mutates_store() {
        let data = fixture();
        let plan = plan_of(&[("_embed", "subcategory.category")]);
        let first = run(&data, "products", &plan);
        let second = run(&data, "products", &plan);
        assert_eq!(first, second);
        // canonical copy still holds the raw id
        assert_eq!(data["products"][0]["subcategory"], json!("trains"));
    }

    #[test]
    fn test_embed_missing_property_skipped() {
        let data = json!({
            "orders": [{"id": 1, "total": 10}],
        })
        .as_object()
        .unwrap()
        .clone();
        let page = run(&data, "orders", &plan_of(&[("_embed", "customer")]));
        assert_eq!(page.records[0], json!({"id": 1, "total": 10}));
    }

    #[test]
    fn test_embed_dangling_id_left_in_place() {
        let data = json!({
            "orders": [{"id": 1, "customer": 99}],
            "customers": [{"id": 2, "name": "Ada"}]
        })
        .as_object()
        .unwrap()
        .clone();
        let page = run(&data, "orders", &plan_of(&[("_embed", "customer.company")]));
        assert_eq!(page.records[0]["customer"], json!(99));
    }

    // ========== reverse references ==========

    #[test]
    fn test_refs_attach_children() {
        let data = fixture();
        let page = run(
            &data,
            "subcategories",
            &plan_of(&[("id", "trains"), ("_refs", "product")]),
        );
        let attached = page.records[0]["products"].as_array().unwrap();
        let names: Vec<&str> = attached.iter().map(|p| p["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Wooden Train", "Steel Train"]);
    }

    #[test]
    fn test_refs_sorted_by_weight() {
        let data = json!({
            "categories": [{"id": "kids", "name": "Kids"}],
            "subcategories": [
                {"id": "a", "category": "kids", "weight": 2},
                {"id": "b", "category": "kids", "weight": 1}
            ]
        })
        .as_object()
        .unwrap()
        .clone();
        let page = run(&data, "categories", &plan_of(&[("_refs", "subcategory")]));
        let attached = page.records[0]["subcategories"].as_array().unwrap();
        assert_eq!(attached[0]["weight"], json!(1));
        assert_eq!(attached[1]["weight"], json!(2));
    }

    #[test]
    fn test_refs_attach_empty_when_no_children_match() {
        let data = fixture();
        let page = run(&data, "categories", &plan_of(&[("id", "hobby"), ("_refs", "product")]));
        assert_eq!(page.records[0]["products"], json!([]));
    }

    #[test]
    fn test_refs_attach_empty_for_missing_collection() {
        let data = fixture();
        let page = run(&data, "categories", &plan_of(&[("_refs", "vendor")]));
        assert_eq!(page.records[0]["vendors"], json!([]));
    }

    // ========== lookups ==========

    #[test]
    fn test_find_by_id_loose() {
        let data = fixture();
        assert!(find_by_id(&data, "products", &json!("2")).is_some());
        assert!(find_by_id(&data, "products", &json!(2)).is_some());
        assert!(find_by_id(&data, "products", &json!(99)).is_none());
    }

    #[test]
    fn test_find_by_id_param() {
        let data = fixture();
        let record = find_by_id_param(&data, "products", "3").unwrap();
        assert_eq!(record["name"], json!("Doll House"));
        assert!(find_by_id_param(&data, "products", "99").is_none());
    }

    #[test]
    fn test_embed_record_single_level_only() {
        let data = fixture();
        let mut record = data["products"][0].clone();
        embed_record(&data, &mut record, &["subcategory.category".to_string()]);
        // dotted name is not a property; nothing changes
        assert_eq!(record["subcategory"], json!("trains"));

        embed_record(&data, &mut record, &["subcategory".to_string()]);
        assert_eq!(record["subcategory"]["name"], json!("Trains"));
    }
}
