use crate::model::{ElasticityResult, PriceChangeEvent, Transaction};
use chrono::Duration;
use tracing::debug;

/// Calendar days on each side of a price change.
pub const WINDOW_DAYS: i64 = 30;

/// Positions (after a stable date sort) where the price differs from the previous record.
pub fn price_change_events(series: &[Transaction]) -> Vec<PriceChangeEvent> {
    let sorted = sorted_by_date(series);

    sorted
        .windows(2)
        .filter(|pair| pair[1].unit_price != pair[0].unit_price)
        .map(|pair| PriceChangeEvent {
            change_date: pair[1].date,
            old_price: pair[0].unit_price,
            new_price: pair[1].unit_price,
        })
        .collect()
}

/// Compares total units sold in the 30 days before each price change with the
/// 30 days after it. Events without data on both sides are left out.
pub fn estimate_elasticity(series: &[Transaction]) -> Vec<ElasticityResult> {
    let sorted = sorted_by_date(series);
    let window = Duration::days(WINDOW_DAYS);
    let mut results = Vec::new();

    for event in price_change_events(&sorted) {
        if event.old_price == event.new_price {
            continue;
        }

        let start = event.change_date - window;
        let end = event.change_date + window;

        // The change date itself belongs to neither side.
        let before: Vec<f64> = sorted
            .iter()
            .filter(|t| t.date >= start && t.date < event.change_date)
            .map(|t| t.units_sold)
            .collect();
        let after: Vec<f64> = sorted
            .iter()
            .filter(|t| t.date > event.change_date && t.date <= end)
            .map(|t| t.units_sold)
            .collect();

        if before.is_empty() || after.is_empty() {
            debug!(date = %event.change_date, "price change skipped: empty window");
            continue;
        }

        results.push(ElasticityResult::from_event(
            &event,
            before.iter().sum(),
            after.iter().sum(),
        ));
    }

    results
}

fn sorted_by_date(series: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = series.to_vec();
    sorted.sort_by_key(|t| t.date);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(n - 1)
    }

    fn tx(n: i64, price: f64, units: f64) -> Transaction {
        Transaction {
            date: day(n),
            description: "Widget".to_string(),
            unit_price: price,
            units_sold: units,
        }
    }

    fn ninety_day_series() -> Vec<Transaction> {
        (1..=90)
            .map(|n| if n <= 40 { tx(n, 10.0, 5.0) } else { tx(n, 12.0, 4.0) })
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_price_increase() {
        let results = estimate_elasticity(&ninety_day_series());
        assert_eq!(results.len(), 1);

        let r = &results[0];
        assert_eq!(r.change_date, day(41));
        assert_eq!(r.old_price, 10.0);
        assert_eq!(r.new_price, 12.0);
        assert_eq!(r.before_sales, 150.0);
        assert_eq!(r.after_sales, 120.0);
        assert!(close(r.quantity_change_pct.unwrap(), -0.2));
        assert!(close(r.price_change_pct.unwrap(), 0.2));
        assert!(close(r.elasticity.unwrap(), -1.0));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut series = ninety_day_series();
        series.reverse();
        let results = estimate_elasticity(&series);
        assert_eq!(results, estimate_elasticity(&ninety_day_series()));
    }

    #[test]
    fn test_constant_price_has_no_events() {
        let series: Vec<Transaction> = (1..=60).map(|n| tx(n, 3.0, 1.0)).collect();
        assert!(price_change_events(&series).is_empty());
        assert!(estimate_elasticity(&series).is_empty());
    }

    #[test]
    fn test_zero_before_sales_is_undefined() {
        let series = vec![tx(1, 10.0, 0.0), tx(2, 10.0, 0.0), tx(3, 8.0, 5.0), tx(4, 8.0, 6.0)];
        let results = estimate_elasticity(&series);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].before_sales, 0.0);
        assert_eq!(results[0].quantity_change_pct, None);
        assert_eq!(results[0].elasticity, None);
        assert!(close(results[0].price_change_pct.unwrap(), -0.2));
    }

    #[test]
    fn test_zero_old_price_is_undefined() {
        let series = vec![tx(1, 0.0, 2.0), tx(2, 5.0, 1.0), tx(3, 5.0, 1.0)];
        let results = estimate_elasticity(&series);

        assert_eq!(results[0].price_change_pct, None);
        assert_eq!(results[0].elasticity, None);
        assert!(close(results[0].quantity_change_pct.unwrap(), -0.5));
    }

    #[test]
    fn test_empty_window_skips_event() {
        // last record carries the change, so nothing comes after it
        let series = vec![tx(1, 10.0, 1.0), tx(2, 10.0, 1.0), tx(3, 11.0, 1.0)];
        assert_eq!(price_change_events(&series).len(), 1);
        assert!(estimate_elasticity(&series).is_empty());
    }

    #[test]
    fn test_same_date_rows_excluded_from_both_windows() {
        // two rows on day 2; the price changes between them
        let series = vec![
            tx(3, 12.0, 7.0),
            tx(1, 10.0, 5.0),
            tx(2, 10.0, 100.0),
            tx(2, 12.0, 200.0),
        ];
        let events = price_change_events(&series);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].change_date, day(2));

        let results = estimate_elasticity(&series);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].change_date, day(2));
        assert_eq!(results[0].before_sales, 5.0);
        assert_eq!(results[0].after_sales, 7.0);
    }

    #[test]
    fn test_empty_series() {
        assert!(price_change_events(&[]).is_empty());
        assert!(estimate_elasticity(&[]).is_empty());
    }

    #[test]
    fn test_window_boundaries() {
        // day 11 is exactly 30 days before day 41 and counts; day 10 does not.
        // day 71 is exactly 30 days after and counts; day 72 does not.
        let series = vec![
            tx(10, 10.0, 1000.0),
            tx(11, 10.0, 7.0),
            tx(41, 12.0, 500.0),
            tx(71, 12.0, 3.0),
            tx(72, 12.0, 1000.0),
        ];
        let results = estimate_elasticity(&series);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].before_sales, 7.0);
        assert_eq!(results[0].after_sales, 3.0);
    }

    #[test]
    fn test_results_in_chronological_order() {
        let series: Vec<Transaction> = (1..=30)
            .map(|n| match n {
                1..=10 => tx(n, 4.0, 2.0),
                11..=20 => tx(n, 5.0, 2.0),
                _ => tx(n, 4.5, 2.0),
            })
            .collect();
        let results = estimate_elasticity(&series);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].change_date, day(11));
        assert_eq!(results[1].change_date, day(21));
        // 10 days at 2 before, 19 days at 2 after
        assert!(close(results[0].quantity_change_pct.unwrap(), 0.9));
    }
}
