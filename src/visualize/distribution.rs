use std::collections::BTreeMap;
use std::f64::consts::PI;
use log::debug;
use plotters::prelude::*;

use crate::error::{Error, Result};
use super::{palette_color, render_png, FONT_FAMILY};

const SIZE : (u32, u32) = (1400, 600);

/// Corners of one pie slice in pixel coordinates: the center, then the arc from `start` to `end` (radians,
/// counter-clockwise, zero pointing right).
fn slice_polygon(center : (i32, i32), radius : f64, start : f64, end : f64) -> Vec<(i32, i32)> {
    let steps = (((end - start).to_degrees()).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for step in 0..=steps {
        let angle = start + (end - start) * step as f64 / steps as f64;
        points.push(arc_point(center, radius, angle));
    }
    points
}

fn arc_point(center : (i32, i32), radius : f64, angle : f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 - (radius * angle.sin()).round() as i32
    )
}

/// Pie chart of cluster shares on the left, horizontal bar chart of cluster sizes on the right.
///
/// Slices start at twelve o'clock and run counter-clockwise in label order. Each bar is annotated
/// with its raw count. Colors follow the position of each label in sorted order, matching the scatter plot.
///
///   - `sizes` - Sample count per cluster label.
///   - returns - `NothingToRender` if there are no clusters or no samples.
pub fn render_distribution(sizes : &BTreeMap<usize, usize>) -> Result<Vec<u8>> {
    let total : usize = sizes.values().sum();
    if sizes.is_empty() || total == 0 {
        return Err(Error::NothingToRender);
    }
    debug!("Distribution chart for {} clusters, {} samples", sizes.len(), total);
    let entries : Vec<(usize, usize)> = sizes.iter().map(|(label, count)| (*label, *count)).collect();
    let largest = entries.iter().map(|(_, count)| *count).max().unwrap_or(1) as f64;

    render_png(SIZE, |root| {
        let (pie_area, bar_area) = root.split_horizontally((SIZE.0 / 2) as i32);

        // ........ pie ........
        let (width, height) = pie_area.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2 + 15);
        let radius = (width.min(height) as f64) * 0.36;
        let mut start = PI / 2.0;
        for (position, (label, count)) in entries.iter().enumerate() {
            let sweep = 2.0 * PI * *count as f64 / total as f64;
            let color = palette_color(position);
            let outline = slice_polygon(center, radius, start, start + sweep);
            pie_area.draw(&Polygon::new(outline.clone(), color.filled()))?;
            pie_area.draw(&PathElement::new(outline, WHITE.stroke_width(2)))?;
            let middle = start + sweep / 2.0;
            let percent = 100.0 * *count as f64 / total as f64;
            let (x, y) = arc_point(center, radius * 0.6, middle);
            pie_area.draw(&Text::new(format!("{:.1}%", percent), (x - 18, y - 7), (FONT_FAMILY, 15).into_font()))?;
            let (x, y) = arc_point(center, radius * 1.12, middle);
            pie_area.draw(&Text::new(format!("Cluster {}", label), (x - 30, y - 7), (FONT_FAMILY, 15).into_font()))?;
            start += sweep;
        }
        pie_area.draw(&Text::new("Cluster Size Distribution", (20, 15), (FONT_FAMILY, 24).into_font()))?;

        // ........ bars ........
        let n = entries.len() as f64;
        let mut chart = ChartBuilder::on(&bar_area)
            .margin(20)
            .caption("Samples per Cluster", (FONT_FAMILY, 24))
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d(0.0..largest * 1.15, -0.5..(n - 0.5))?;
        let name_of = |y : &f64| {
            let index = y.round();
            if (y - index).abs() < 1e-6 && index >= 0.0 && (index as usize) < entries.len() {
                format!("Cluster {}", entries[index as usize].0)
            }
            else {
                String::new()
            }
        };
        chart.configure_mesh()
            .disable_y_mesh()
            .y_labels(2 * entries.len() + 2)
            .y_label_formatter(&name_of)
            .x_desc("Number of Samples")
            .draw()?;

        chart.draw_series(entries.iter().enumerate().map(|(position, (_, count))| {
            let y = position as f64;
            Rectangle::new([(0.0, y - 0.35), (*count as f64, y + 0.35)], palette_color(position).filled())
        }))?;
        chart.draw_series(entries.iter().enumerate().map(|(position, (_, count))| {
            Text::new(count.to_string(), (*count as f64 + largest * 0.01, position as f64 + 0.1), (FONT_FAMILY, 15).into_font())
        }))?;
        Ok(())
    })
}
