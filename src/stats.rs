use statrs::statistics::Statistics;
use crate::model::{RollingPoint, Transaction};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

/// Trailing window for the units-sold mean, counted in records rather than days.
pub const ROLLING_WINDOW: usize = 7;

/// Sums units per (date, item). The price of a group is the mean of its prices.
pub fn aggregate_daily(data: &[Transaction]) -> Vec<Transaction> {
    let mut map: BTreeMap<(NaiveDate, &str), Vec<&Transaction>> = BTreeMap::new();

    for t in data {
        map.entry((t.date, t.description.as_str())).or_default().push(t);
    }

    map.into_iter()
        .map(|((date, description), records)| Transaction {
            date,
            description: description.to_string(),
            unit_price: records.iter().map(|r| r.unit_price).mean(),
            units_sold: records.iter().map(|r| r.units_sold).sum(),
        })
        .collect()
}

/// Distinct item names, first occurrence first.
pub fn unique_items(data: &[Transaction]) -> Vec<String> {
    let mut seen = HashSet::new();
    data.iter()
        .filter(|t| seen.insert(t.description.as_str()))
        .map(|t| t.description.clone())
        .collect()
}

pub fn item_series(data: &[Transaction], item: &str) -> Vec<Transaction> {
    data.iter().filter(|t| t.description == item).cloned().collect()
}

/// Inclusive on both ends; a missing bound is open.
pub fn within_dates(
    data: &[Transaction],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<Transaction> {
    data.iter()
        .filter(|t| from.map_or(true, |f| t.date >= f) && to.map_or(true, |e| t.date <= e))
        .cloned()
        .collect()
}

/// Date-sorted (stable) series with a trailing units mean and the price delta
/// from the previous record.
pub fn rolling_metrics(series: &[Transaction]) -> Vec<RollingPoint> {
    let mut sorted = series.to_vec();
    sorted.sort_by_key(|t| t.date);

    let units: Vec<f64> = sorted.iter().map(|t| t.units_sold).collect();

    sorted
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let rolling_units = if i + 1 >= ROLLING_WINDOW {
                Some(units[i + 1 - ROLLING_WINDOW..=i].iter().mean())
            } else {
                None
            };
            let price_change = if i > 0 {
                Some(t.unit_price - sorted[i - 1].unit_price)
            } else {
                None
            };

            RollingPoint {
                record: t.clone(),
                rolling_units,
                price_change,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(day: u32, item: &str, price: f64, units: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description: item.to_string(),
            unit_price: price,
            units_sold: units,
        }
    }

    #[test]
    fn test_aggregate_sums_units_per_day() {
        let data = vec![
            tx(2, "B", 1.0, 1.0),
            tx(1, "A", 2.0, 3.0),
            tx(1, "A", 4.0, 5.0),
            tx(1, "B", 1.0, 2.0),
        ];
        let agg = aggregate_daily(&data);

        assert_eq!(agg.len(), 3);
        assert_eq!(agg[0], tx(1, "A", 3.0, 8.0));
        assert_eq!(agg[1], tx(1, "B", 1.0, 2.0));
        assert_eq!(agg[2], tx(2, "B", 1.0, 1.0));
    }

    #[test]
    fn test_unique_items_first_seen_order() {
        let data = vec![tx(1, "B", 1.0, 1.0), tx(1, "A", 1.0, 1.0), tx(2, "B", 1.0, 1.0)];
        assert_eq!(unique_items(&data), vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn test_item_series_and_date_range() {
        let data: Vec<Transaction> = (1..=10)
            .flat_map(|d| vec![tx(d, "A", 1.0, 1.0), tx(d, "B", 1.0, 1.0)])
            .collect();
        let a = item_series(&data, "A");
        assert_eq!(a.len(), 10);

        let from = NaiveDate::from_ymd_opt(2024, 1, 3);
        let to = NaiveDate::from_ymd_opt(2024, 1, 5);
        assert_eq!(within_dates(&a, from, to).len(), 3);
        assert_eq!(within_dates(&a, None, to).len(), 5);
        assert_eq!(within_dates(&a, from, None).len(), 8);
    }

    #[test]
    fn test_rolling_first_six_undefined() {
        let series: Vec<Transaction> = (1..=10).map(|d| tx(d, "A", 1.0, d as f64)).collect();
        let out = rolling_metrics(&series);

        assert_eq!(out.len(), series.len());
        assert!(out[..6].iter().all(|p| p.rolling_units.is_none()));
        // mean of 1..=7
        assert_eq!(out[6].rolling_units, Some(4.0));
        assert_eq!(out[9].rolling_units, Some(7.0));
    }

    #[test]
    fn test_rolling_empty_series() {
        assert!(rolling_metrics(&[]).is_empty());
    }

    #[test]
    fn test_rolling_counts_rows_not_days() {
        let mut series: Vec<Transaction> = (0..7).map(|_| tx(1, "A", 1.0, 2.0)).collect();
        series.push(tx(20, "A", 1.0, 9.0));
        let out = rolling_metrics(&series);

        assert_eq!(out[6].rolling_units, Some(2.0));
        assert_eq!(out[7].rolling_units, Some(3.0));
    }

    #[test]
    fn test_price_change_and_stable_sort() {
        let series = vec![
            tx(3, "A", 5.0, 1.0),
            tx(1, "A", 2.0, 1.0),
            tx(1, "A", 3.0, 2.0),
        ];
        let out = rolling_metrics(&series);

        assert_eq!(out[0].record.unit_price, 2.0);
        assert_eq!(out[1].record.unit_price, 3.0);
        assert_eq!(out[0].price_change, None);
        assert_eq!(out[1].price_change, Some(1.0));
        assert_eq!(out[2].price_change, Some(2.0));
    }

    #[test]
    fn test_rolling_idempotent_on_sorted_input() {
        let series: Vec<Transaction> = (1..=12)
            .map(|d| tx(d, "A", (d % 3) as f64, (d * 2) as f64))
            .collect();
        let first = rolling_metrics(&series);
        let resorted: Vec<Transaction> = first.iter().map(|p| p.record.clone()).collect();

        assert_eq!(rolling_metrics(&resorted), first);
    }
}
