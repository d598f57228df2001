//! Value screen and the derived-ratio batch pass.

use tracing::warn;

use crate::Fundamentals;

/// Threshold predicates for shortlisting undervalued candidates.
///
/// Upper bounds are exclusive and paired with a `> 0` check so the `0.0`
/// metric sentinel never passes as a bargain.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCriteria {
    pub max_pb_ratio: f64,
    pub max_pe_ratio: f64,
    pub max_debt_to_equity: f64,
    pub min_roe: f64,
    pub min_profit_margin: f64,
}

impl Default for ValueCriteria {
    fn default() -> Self {
        Self {
            max_pb_ratio: 1.5,
            max_pe_ratio: 15.0,
            max_debt_to_equity: 1.0,
            min_roe: 15.0,
            min_profit_margin: 20.0,
        }
    }
}

impl ValueCriteria {
    pub fn matches(&self, record: &Fundamentals) -> bool {
        record.pb_ratio > 0.0
            && record.pb_ratio < self.max_pb_ratio
            && record.pe_ratio > 0.0
            && record.pe_ratio < self.max_pe_ratio
            && record.debt_to_equity < self.max_debt_to_equity
            && record.roe > self.min_roe
            && record.profit_margin > self.min_profit_margin
            && record.current_price > 0.0
    }
}

/// Filter a fundamentals batch down to the records passing `criteria`,
/// preserving input order.
pub fn screen_records(records: &[Fundamentals], criteria: &ValueCriteria) -> Vec<Fundamentals> {
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

/// Recompute the price-to-book ratio for every record across a fixed pool
/// of tasks.
///
/// Each task owns a disjoint contiguous chunk of the input, so there is no
/// shared mutable state and no backpressure concern; output order matches
/// input order.
pub async fn recompute_pb_ratios(records: Vec<Fundamentals>, workers: usize) -> Vec<Fundamentals> {
    let total = records.len();
    if total == 0 {
        return records;
    }

    let workers = workers.max(1);
    let chunk_size = total.div_ceil(workers);

    let mut remaining = records;
    let mut handles = Vec::with_capacity(workers);
    while !remaining.is_empty() {
        let tail = remaining.split_off(chunk_size.min(remaining.len()));
        let chunk = std::mem::replace(&mut remaining, tail);
        handles.push(tokio::spawn(async move {
            chunk
                .into_iter()
                .map(|mut record| {
                    record.pb_ratio = record.derived_pb_ratio();
                    record
                })
                .collect::<Vec<_>>()
        }));
    }

    let mut out = Vec::with_capacity(total);
    for handle in handles {
        match handle.await {
            Ok(part) => out.extend(part),
            Err(error) => warn!(%error, "ratio worker task failed"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Symbol, UtcDateTime};

    fn record(symbol: &str) -> Fundamentals {
        Fundamentals {
            symbol: Symbol::parse(symbol).expect("valid"),
            company_name: String::from("Test Corp"),
            as_of: UtcDateTime::parse("2025-01-01T00:00:00Z").expect("valid"),
            market_cap: 1_000.0,
            current_price: 50.0,
            pe_ratio: 10.0,
            pb_ratio: 1.0,
            eps: 5.0,
            revenue_per_share: 20.0,
            profit_margin: 25.0,
            roe: 20.0,
            roa: 10.0,
            debt_to_equity: 0.5,
            dividend_yield: 2.0,
            beta: 1.0,
            book_value_per_share: 50.0,
        }
    }

    #[test]
    fn baseline_record_passes_default_criteria() {
        assert!(ValueCriteria::default().matches(&record("PASS")));
    }

    #[test]
    fn roe_below_threshold_excludes() {
        let mut failing = record("FAIL");
        failing.roe = 14.9;
        assert!(!ValueCriteria::default().matches(&failing));
    }

    #[test]
    fn zero_sentinel_ratios_never_pass() {
        let mut sentinel = record("ZERO");
        sentinel.pb_ratio = 0.0;
        assert!(!ValueCriteria::default().matches(&sentinel));

        let mut sentinel = record("ZERO");
        sentinel.pe_ratio = 0.0;
        assert!(!ValueCriteria::default().matches(&sentinel));
    }

    #[test]
    fn screening_preserves_input_order() {
        let mut excluded = record("BAD");
        excluded.current_price = 0.0;
        let batch = vec![record("AAA"), excluded, record("BBB")];

        let passed = screen_records(&batch, &ValueCriteria::default());
        let symbols: Vec<&str> = passed.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, ["AAA", "BBB"]);
    }

    #[tokio::test]
    async fn ratio_pass_recomputes_every_slot_in_order() {
        let mut batch = Vec::new();
        for index in 0..10 {
            let mut entry = record(&format!("S{index}"));
            entry.current_price = 25.0;
            entry.book_value_per_share = if index % 2 == 0 { 10.0 } else { 0.0 };
            entry.pb_ratio = 99.0;
            batch.push(entry);
        }

        let out = recompute_pb_ratios(batch, 4).await;
        assert_eq!(out.len(), 10);
        for (index, entry) in out.iter().enumerate() {
            assert_eq!(entry.symbol.as_str(), format!("S{index}"));
            let expected = if index % 2 == 0 { 2.5 } else { 0.0 };
            assert_eq!(entry.pb_ratio, expected);
        }
    }

    #[tokio::test]
    async fn ratio_pass_handles_more_workers_than_records() {
        let out = recompute_pb_ratios(vec![record("ONLY")], 8).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pb_ratio, 1.0);
    }
}
