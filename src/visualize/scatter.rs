use std::collections::BTreeSet;
use log::debug;
use plotters::prelude::*;

use crate::dataset::LabeledRow;
use crate::error::{Error, Result};
use super::{palette_color, render_png, FONT_FAMILY};

const SIZE : (u32, u32) = (1000, 800);

/// A point to plot and the cluster it belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ScatterPoint {
    pub x : f64,
    pub y : f64,
    pub label : usize
}

/// Read both features from every row, skipping rows where either one is not a number.
pub(crate) fn plottable_points(rows : &[LabeledRow], feature_x : &str, feature_y : &str) -> Vec<ScatterPoint> {
    rows.iter()
        .filter_map(|row| {
            let x = row.payload.get(feature_x).and_then(|v| v.as_number())?;
            let y = row.payload.get(feature_y).and_then(|v| v.as_number())?;
            Some(ScatterPoint { x, y, label : row.cluster_label })
        })
        .collect()
}

/// Range covering all values, padded by 5% on each side. A single value gets a unit-wide range.
fn padded_range<I : Iterator<Item = f64>>(values : I) -> std::ops::Range<f64> {
    let (low, high) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = if high > low { (high - low) * 0.05 } else { 0.5 };
    (low - pad)..(high + pad)
}

/// Plot two raw features against each other, one color per cluster.
///
/// Values may be numbers or text that parses as a number; rows where either feature is anything
/// else are silently skipped.
///
///   - `rows` - Labeled rows with their raw values keyed by original column name.
///   - `feature_x`, `feature_y` - Column names for the two axes.
///   - returns - `NoPlottableData` if no row has both features as numbers.
pub fn render_scatter(rows : &[LabeledRow], feature_x : &str, feature_y : &str) -> Result<Vec<u8>> {
    let points = plottable_points(rows, feature_x, feature_y);
    if points.is_empty() {
        return Err(Error::NoPlottableData { x : feature_x.to_string(), y : feature_y.to_string() });
    }
    debug!("Scatter of {} against {}: {} of {} rows plottable", feature_y, feature_x, points.len(), rows.len());

    let labels : Vec<usize> = points.iter().map(|p| p.label).collect::<BTreeSet<_>>().into_iter().collect();
    let x_range = padded_range(points.iter().map(|p| p.x));
    let y_range = padded_range(points.iter().map(|p| p.y));

    render_png(SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption(format!("Cluster Assignments: {} vs {}", feature_x, feature_y), (FONT_FAMILY, 24))
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)?;
        chart.configure_mesh()
            .x_desc(feature_x)
            .y_desc(feature_y)
            .draw()?;

        // One series per cluster, in sorted label order, so the palette position matches the label's rank.
        for (position, label) in labels.iter().enumerate() {
            let color = palette_color(position);
            chart.draw_series(points.iter()
                    .filter(|p| p.label == *label)
                    .map(|p| Circle::new((p.x, p.y), 5, color.mix(0.7).filled())))?
                .label(format!("Cluster {}", label))
                .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
        }
        chart.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    })
}
