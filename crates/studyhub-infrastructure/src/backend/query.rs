//! Translation of [`Query`] into table API query parameters.

use studyhub_core::repository::Query;

/// Builds the query string pairs for a list request.
///
/// Filters become `column=op.value`, ordering is folded into a single
/// `order=col.desc,col2.asc` pair, and `select` is always first.
pub fn query_pairs(select: &str, query: &Query) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), select.to_string())];

    for filter in &query.filters {
        pairs.push((
            filter.column.clone(),
            format!("{}.{}", filter.op.as_str(), filter.value),
        ));
    }

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }

    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}
