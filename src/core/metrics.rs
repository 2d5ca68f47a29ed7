// SuburbExplorer - core/metrics.rs
//
// Headline metrics and descriptive statistics over a filtered view.
// Null cells are ignored; a column with no values yields None, never a
// zero or a NaN, so the caller can show "N/A".

use crate::core::filter::FilteredView;
use crate::core::model::{Metric, Record};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics of one metric over a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub metric: Metric,
    /// Rows with a value.
    pub count: usize,
    /// Rows without a value.
    pub missing: usize,
    pub mean: f64,
    /// Sample standard deviation; None with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

/// Headline cards shown above the charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub rows: usize,
    pub median_price: Option<f64>,
    pub mean_yield: Option<f64>,
    pub median_price_change: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Non-null values of `metric`, in view order.
pub fn values<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Vec<f64> {
    view.rows().filter_map(|row| row.metric(metric)).collect()
}

/// Rows in the view, whether or not their metrics are populated.
pub fn count<R: Record>(view: &FilteredView<'_, R>) -> usize {
    view.len()
}

pub fn median<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Option<f64> {
    let sorted = sorted_values(view, metric);
    percentile(&sorted, 50.0)
}

pub fn mean<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Option<f64> {
    let vals = values(view, metric);
    if vals.is_empty() {
        return None;
    }
    Some(vals.iter().mean())
}

pub fn min<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Option<f64> {
    view.rows()
        .filter_map(|row| row.metric(metric))
        .reduce(f64::min)
}

pub fn max<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Option<f64> {
    view.rows()
        .filter_map(|row| row.metric(metric))
        .reduce(f64::max)
}

/// Count, mean, std, min, quartiles and max of `metric`.
/// None when the view holds no value for it.
pub fn describe<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Option<Summary> {
    let sorted = sorted_values(view, metric);
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let n = sorted.len();

    Some(Summary {
        metric,
        count: n,
        missing: view.len() - n,
        mean: sorted.iter().mean(),
        std: (n > 1).then(|| sorted.iter().std_dev()),
        min,
        p25: percentile(&sorted, 25.0)?,
        median: percentile(&sorted, 50.0)?,
        p75: percentile(&sorted, 75.0)?,
        max,
    })
}

/// Headline metrics for the dashboard cards.
pub fn headline<R: Record>(view: &FilteredView<'_, R>) -> Headline {
    Headline {
        rows: count(view),
        median_price: median(view, Metric::Median),
        mean_yield: mean(view, Metric::Yield),
        median_price_change: median(view, Metric::PriceChange12m),
        min_price: min(view, Metric::Median),
        max_price: max(view, Metric::Median),
    }
}

fn sorted_values<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Vec<f64> {
    let mut vals = values(view, metric);
    vals.sort_by(f64::total_cmp);
    vals
}

/// Percentile of sorted values with linear interpolation between closest
/// ranks (the same convention as NumPy and pandas).
fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        1 => Some(sorted[0]),
        _ => {
            let rank = (p / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (rank.ceil() as usize).min(n - 1);
            let frac = rank - lower as f64;
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
        }
    }
}
