use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub unit_price: f64,
    pub units_sold: f64,
}

/// One row of an item's series with the trailing metrics attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingPoint {
    pub record: Transaction,
    pub rolling_units: Option<f64>,  // None until a full window exists
    pub price_change: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChangeEvent {
    pub change_date: NaiveDate,
    pub old_price: f64,
    pub new_price: f64,
}

/// Demand before/after a price change. Undefined ratios are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticityResult {
    pub change_date: NaiveDate,
    pub old_price: f64,
    pub new_price: f64,

    pub before_sales: f64,
    pub after_sales: f64,

    pub quantity_change_pct: Option<f64>,
    pub price_change_pct: Option<f64>,
    pub elasticity: Option<f64>,
}

impl ElasticityResult {
    pub fn from_event(event: &PriceChangeEvent, before_sales: f64, after_sales: f64) -> Self {
        let quantity_change_pct = ratio(after_sales - before_sales, before_sales);
        let price_change_pct = ratio(event.new_price - event.old_price, event.old_price);

        let elasticity = match (quantity_change_pct, price_change_pct) {
            (Some(q), Some(p)) => ratio(q, p),
            _ => None,
        };

        ElasticityResult {
            change_date: event.change_date,
            old_price: event.old_price,
            new_price: event.new_price,
            before_sales,
            after_sales,
            quantity_change_pct,
            price_change_pct,
            elasticity,
        }
    }
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}
