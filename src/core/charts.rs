// SuburbExplorer - core/charts.rs
//
// Chart data preparers. Each function shapes a filtered view into the
// series one chart needs. All are pure: the view is only read.

use crate::core::filter::FilteredView;
use crate::core::model::{Metric, Record, PRICE_HISTORY_METRICS, RADAR_METRICS};
use crate::util::constants;
use crate::util::error::LookupError;
use serde::Serialize;
use std::cmp::Ordering;

// =============================================================================
// Series types
// =============================================================================

/// One bar of a bar chart. A missing value draws no bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub label: String,
    pub value: Option<f64>,
}

/// A ranked bar with a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBar {
    pub label: String,
    pub value: f64,
}

/// Result of a top-N ranking.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TopN {
    pub metric: Option<Metric>,
    /// Rows with a value, highest first. Length is min(N, rows with a value).
    pub bars: Vec<RankedBar>,
    /// Rows without a value that fill the remaining slots up to N, in view
    /// order. They always come after every ranked bar.
    pub unranked: Vec<String>,
}

/// One point of a scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// One node of a two-level treemap. Parents have `parent = None` and carry
/// the sum of their children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapNode {
    pub id: String,
    pub label: String,
    pub parent: Option<String>,
    pub value: f64,
}

/// One spoke of the radar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxis {
    pub metric: Metric,
    pub label: &'static str,
    pub value: Option<f64>,
}

/// Radar chart for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarVector {
    pub identifier: String,
    pub axes: Vec<RadarAxis>,
}

/// One point of a line series. A missing value breaks the line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period: &'static str,
    pub value: Option<f64>,
}

/// Price history line for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

/// One histogram bin. `upper` is exclusive except on the last bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

// =============================================================================
// Preparers
// =============================================================================

/// Value of `metric` for every row, in view order.
pub fn bar_series<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Vec<BarPoint> {
    view.rows()
        .map(|row| BarPoint {
            label: row.name().to_string(),
            value: row.metric(metric),
        })
        .collect()
}

/// The `n` rows with the highest `metric`.
///
/// The sort is stable, so ties keep view order. Rows without a value rank
/// below every row with one.
pub fn top_n<R: Record>(view: &FilteredView<'_, R>, metric: Metric, n: usize) -> TopN {
    let mut ranked: Vec<(&R, Option<f64>)> = view.rows().map(|r| (r, r.metric(metric))).collect();
    ranked.sort_by(|(_, a), (_, b)| descending_nulls_last(*a, *b));

    let mut top = TopN {
        metric: Some(metric),
        ..Default::default()
    };
    for (row, value) in ranked.into_iter().take(n) {
        match value {
            Some(value) => top.bars.push(RankedBar {
                label: row.name().to_string(),
                value,
            }),
            None => top.unranked.push(row.name().to_string()),
        }
    }
    top
}

fn descending_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `(x, y)` pairs for rows carrying both metrics.
pub fn scatter<R: Record>(view: &FilteredView<'_, R>, x: Metric, y: Metric) -> Vec<ScatterPoint> {
    view.rows()
        .filter_map(|row| {
            Some(ScatterPoint {
                label: row.name().to_string(),
                x: row.metric(x)?,
                y: row.metric(y)?,
            })
        })
        .collect()
}

/// Two-level treemap: parent region, then rows sized by `metric`.
///
/// Rows with a missing or non-positive size cannot be drawn and are left
/// out. Parents appear in first-seen order, followed by all children in
/// view order.
pub fn treemap<R: Record>(view: &FilteredView<'_, R>, metric: Metric) -> Vec<TreemapNode> {
    let mut parents: Vec<TreemapNode> = Vec::new();
    let mut children: Vec<TreemapNode> = Vec::new();

    for row in view.rows() {
        let Some(size) = row.metric(metric).filter(|v| *v > 0.0) else {
            continue;
        };
        let group = row.group().unwrap_or(constants::UNASSIGNED_GROUP);

        match parents.iter_mut().find(|p| p.id == group) {
            Some(parent) => parent.value += size,
            None => parents.push(TreemapNode {
                id: group.to_string(),
                label: group.to_string(),
                parent: None,
                value: size,
            }),
        }

        children.push(TreemapNode {
            id: format!("{group}/{}", row.name()),
            label: row.name().to_string(),
            parent: Some(group.to_string()),
            value: size,
        });
    }

    parents.extend(children);
    parents
}

/// Radar axes for the row named `identifier`.
///
/// When several rows share the name, the first one in view order is used.
pub fn radar_vector<R: Record>(
    view: &FilteredView<'_, R>,
    identifier: &str,
) -> Result<RadarVector, LookupError> {
    let mut matches = view.rows().filter(|row| row.name() == identifier);
    let row = matches.next().ok_or_else(|| LookupError::EntityNotFound {
        identifier: identifier.to_string(),
    })?;

    let duplicates = matches.count();
    if duplicates > 0 {
        tracing::debug!(
            identifier,
            duplicates,
            "Several rows share this name; using the first"
        );
    }

    Ok(RadarVector {
        identifier: identifier.to_string(),
        axes: RADAR_METRICS
            .iter()
            .map(|&metric| RadarAxis {
                metric,
                label: metric.header(),
                value: row.metric(metric),
            })
            .collect(),
    })
}

/// Price history for the first `limit` rows, in view order.
pub fn time_series<R: Record>(view: &FilteredView<'_, R>, limit: usize) -> Vec<TimeSeries> {
    view.rows()
        .take(limit)
        .map(|row| TimeSeries {
            label: row.name().to_string(),
            points: PRICE_HISTORY_METRICS
                .iter()
                .zip(constants::PRICE_HISTORY_PERIODS)
                .map(|(&metric, period)| SeriesPoint {
                    period,
                    value: row.metric(metric),
                })
                .collect(),
        })
        .collect()
}

/// Equal-width histogram of `metric` over the view's own min..max.
///
/// Bin edges follow the current view, so histograms of different filters
/// are not aligned with each other. All values equal gives one bin; no
/// values gives no bins. `bins` of zero is treated as one.
pub fn histogram<R: Record>(
    view: &FilteredView<'_, R>,
    metric: Metric,
    bins: usize,
) -> Vec<HistogramBin> {
    let vals: Vec<f64> = view.rows().filter_map(|row| row.metric(metric)).collect();
    let Some((lo, hi)) = vals
        .iter()
        .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    else {
        return Vec::new();
    };

    if lo == hi {
        return vec![HistogramBin {
            lower: lo,
            upper: hi,
            count: vals.len(),
        }];
    }

    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &vals {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}
