//! Work queue view — filters processed claims to the actionable subset and
//! sorts them for display.

use std::cmp::Ordering;

use crate::analyze::ProcessedClaim;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A claim column projected for comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
}

/// Project a claim column for sorting. Unknown columns and absent values
/// compare as zero — inherited behavior, see DESIGN.md.
pub fn sort_value(claim: &ProcessedClaim, column: &str) -> SortValue {
    match column {
        "priorityScore" => SortValue::Number(claim.priority_score as f64),
        "age" => SortValue::Number(claim.age as f64),
        "netPayment" => SortValue::Number(claim.net_payment),
        "claimId" => SortValue::Text(claim.claim_id.clone()),
        "category" => SortValue::Text(claim.category.clone()),
        "providerName" => SortValue::Text(claim.provider_name.clone()),
        "state" => SortValue::Text(claim.state.clone()),
        "status" => SortValue::Text(claim.status.clone()),
        "source" => match claim.source {
            Some(s) => SortValue::Text(s.to_string()),
            None => SortValue::Number(0.0),
        },
        "teamName" => match &claim.team_name {
            Some(t) => SortValue::Text(t.clone()),
            None => SortValue::Number(0.0),
        },
        _ => SortValue::Number(0.0),
    }
}

fn compare(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Text(x), SortValue::Text(y)) => x.cmp(y),
        (SortValue::Number(x), SortValue::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        // A string on the left coerces the right side to text.
        (SortValue::Text(x), SortValue::Number(y)) => x.as_str().cmp(y.to_string().as_str()),
        (SortValue::Number(_), SortValue::Text(_)) => Ordering::Equal,
    }
}

/// Keep actionable claims (optionally a single category), sorted by the
/// given column. The sort is stable: equal keys keep input order, and the
/// same ties stay put when the direction flips.
pub fn filter_and_sort(
    claims: &[ProcessedClaim],
    category: Option<&str>,
    column: &str,
    direction: SortDirection,
) -> Vec<ProcessedClaim> {
    let mut queue: Vec<ProcessedClaim> = claims
        .iter()
        .filter(|c| c.is_actionable)
        .filter(|c| category.map_or(true, |wanted| c.category == wanted))
        .cloned()
        .collect();

    queue.sort_by(|a, b| {
        let ord = compare(&sort_value(a, column), &sort_value(b, column));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    queue
}

/// Distinct categories present on actionable claims, sorted. Drives the
/// category filter choices.
pub fn actionable_categories(claims: &[ProcessedClaim]) -> Vec<String> {
    let mut categories: Vec<String> = claims
        .iter()
        .filter(|c| c.is_actionable)
        .map(|c| c.category.clone())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}
