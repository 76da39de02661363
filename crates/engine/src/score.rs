//! Priority scoring — ranks actionable claims in the work queue.

use crate::config::ColumnMapping;
use crate::record::{float_or_zero, resolve, RawRecord};

/// Sentinel for claims that never enter the work queue.
pub const NOT_SCORED: i64 = -1;

/// Urgency score from billed amount and age, with a flat bump for denials.
/// Unparsable numerics count as zero; the result is rounded half away from
/// zero.
pub fn priority_score(original: &RawRecord, mapping: &ColumnMapping, status: &str, age: i64) -> i64 {
    let total_charges = float_or_zero(resolve(original, mapping, "totalCharges"));
    let mut score = total_charges / 500.0 + age as f64 * 1.5;
    if status == "DENY" {
        score += 100.0;
    }
    score.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;

    fn mapping() -> ColumnMapping {
        [("totalCharges".to_string(), "Billed".to_string())].into_iter().collect()
    }

    fn record(billed: &str) -> RawRecord {
        let mut rec = RawRecord::new();
        rec.insert("Billed".into(), CellValue::Text(billed.into()));
        rec
    }

    #[test]
    fn pend_claim_scores_from_charges_and_age() {
        // 1000/500 + 10*1.5 = 17
        assert_eq!(priority_score(&record("1000"), &mapping(), "PEND", 10), 17);
    }

    #[test]
    fn denied_claim_gets_flat_bump() {
        assert_eq!(priority_score(&record("1000"), &mapping(), "DENY", 10), 117);
    }

    #[test]
    fn unparsable_charges_count_as_zero() {
        assert_eq!(priority_score(&record("pending"), &mapping(), "PEND", 10), 15);
        assert_eq!(priority_score(&RawRecord::new(), &mapping(), "PEND", 0), 0);
    }

    #[test]
    fn rounds_to_nearest_integer() {
        // 125/500 + 1*1.5 = 1.75 -> 2
        assert_eq!(priority_score(&record("125"), &mapping(), "PEND", 1), 2);
        // 100/500 + 0 = 0.2 -> 0
        assert_eq!(priority_score(&record("100"), &mapping(), "PEND", 0), 0);
    }
}
