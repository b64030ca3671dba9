use crate::query::QueryExpression;
use crate::types::NormalizedRecord;

/// Text a query is evaluated against: title and summary joined by one space.
/// Link, source and timestamp are never searched.
pub fn searchable_text(record: &NormalizedRecord) -> String {
    format!("{} {}", record.title, record.summary)
}

pub fn matches(expr: &QueryExpression, record: &NormalizedRecord) -> bool {
    expr.matches_lowercase(&searchable_text(record).to_lowercase())
}

/// Returns the accepted record stamped with the query that matched it.
pub fn accept(expr: &QueryExpression, record: NormalizedRecord) -> Option<NormalizedRecord> {
    if matches(expr, &record) {
        Some(NormalizedRecord {
            matched_query: expr.source().to_string(),
            ..record
        })
    } else {
        None
    }
}
