use crate::dataset::RateCardRow;
use crate::types::FilterCriteria;

/// Rows split by whether the filter criteria select them. Every input row
/// lands in exactly one side, in input order.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    pub affected: Vec<&'a RateCardRow>,
    pub unaffected: Vec<&'a RateCardRow>,
}

pub fn partition<'a>(rows: &'a [RateCardRow], criteria: &FilterCriteria) -> Partition<'a> {
    let (affected, unaffected): (Vec<_>, Vec<_>) =
        rows.iter().partition(|r| criteria.matches(&r.identity));
    Partition {
        affected,
        unaffected,
    }
}
