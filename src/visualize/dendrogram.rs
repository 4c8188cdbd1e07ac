use log::debug;
use plotters::prelude::*;

use crate::clustering::LinkageStructure;
use crate::config::{COLOR_THRESHOLD_RATIO, DENDROGRAM_DISPLAY_CAP};
use crate::error::{Error, Result};
use super::{palette_color, render_png, FONT_FAMILY, NEUTRAL};

const SIZE : (u32, u32) = (1200, 800);

/// Horizontal distance between neighbouring leaves.
const LEAF_SPACING : f64 = 10.0;

/// Optional decoration for a dendrogram.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DendrogramContext {
    /// Name of the dataset, shown in the title.
    pub dataset_label : Option<String>
}

impl DendrogramContext {
    pub fn with_dataset_label<S : Into<String>>(mut self, label : S) -> Self {
        self.dataset_label = Some(label.into());
        self
    }
}

// ........................... Layout ..........................................

/// One bracket joining two children: left foot, left shoulder, right shoulder, right foot.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Link {
    pub points : [(f64, f64); 4],
    /// Color group, or `None` for links at or above the color threshold.
    pub group : Option<usize>
}

/// A displayed leaf: either a sample, labelled with its index, or a contracted cluster, labelled `(size)`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Leaf {
    pub x : f64,
    pub label : String
}

/// Coordinates of everything a dendrogram draws.
///
/// Leaves sit at `x = 5, 15, 25, ...` in traversal order (lower child id first) and every internal
/// node sits midway between its children, at the height of its merge distance.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DendrogramLayout {
    pub links : Vec<Link>,
    pub leaves : Vec<Leaf>,
    pub threshold : f64,
    pub max_height : f64
}

struct LayoutBuilder<'a> {
    linkage : &'a LinkageStructure,
    /// Merges before this index are contracted into leaves.
    first_shown_merge : usize,
    threshold : f64,
    next_group : usize,
    links : Vec<Link>,
    leaves : Vec<Leaf>
}

impl<'a> LayoutBuilder<'a> {
    fn is_internal(&self, id : usize) -> bool {
        let n = self.linkage.n_samples();
        id >= n && id - n >= self.first_shown_merge
    }

    /// Place the subtree rooted at `id` and return the position of its root.
    fn place(&mut self, id : usize, inherited : Option<usize>) -> (f64, f64) {
        let n = self.linkage.n_samples();
        if !self.is_internal(id) {
            let x = LEAF_SPACING * self.leaves.len() as f64 + LEAF_SPACING / 2.0;
            let label = if id < n { id.to_string() } else { format!("({})", self.linkage.merges()[id - n].size) };
            self.leaves.push(Leaf { x, label });
            return (x, 0.0);
        }
        let merge = self.linkage.merges()[id - n];
        let group = match inherited {
            Some(group) => Some(group),
            None if merge.distance < self.threshold => {
                self.next_group += 1;
                Some(self.next_group - 1)
            },
            None => None
        };
        let (left_x, left_y) = self.place(merge.left, group);
        let (right_x, right_y) = self.place(merge.right, group);
        self.links.push(Link {
            points : [(left_x, left_y), (left_x, merge.distance), (right_x, merge.distance), (right_x, right_y)],
            group
        });
        ((left_x + right_x) / 2.0, merge.distance)
    }
}

/// Lay out the merge tree, truncated to the last `display_cap` clusters when there are more samples than that.
///
///   - returns - `NothingToRender` if the tree has no merges.
pub(crate) fn layout_dendrogram(linkage : &LinkageStructure, display_cap : usize) -> Result<DendrogramLayout> {
    if linkage.is_empty() {
        return Err(Error::NothingToRender);
    }
    let n = linkage.n_samples();
    let first_shown_merge = if n > display_cap { n - display_cap.max(2) } else { 0 };
    let max_height = linkage.max_distance();
    let mut builder = LayoutBuilder {
        linkage,
        first_shown_merge,
        threshold : COLOR_THRESHOLD_RATIO * max_height,
        next_group : 0,
        links : Vec::new(),
        leaves : Vec::new()
    };
    let root = linkage.cluster_id(linkage.len() - 1);
    builder.place(root, None);
    Ok(DendrogramLayout { links : builder.links, leaves : builder.leaves, threshold : builder.threshold, max_height })
}

// ........................... Rendering ..........................................

/// Draw the merge tree as a PNG image.
///
/// Trees over more than fifty samples are truncated to their last fifty clusters; a contracted
/// leaf is labelled with its size in parentheses. Each maximal subtree below 70% of the largest
/// merge distance gets its own color.
///
///   - `linkage` - The tree to draw.
///   - `context` - Title decoration.
///   - returns - `NothingToRender` if the tree has no merges, `Render` if drawing or encoding fails.
pub fn render_dendrogram(linkage : &LinkageStructure, context : &DendrogramContext) -> Result<Vec<u8>> {
    let layout = layout_dendrogram(linkage, DENDROGRAM_DISPLAY_CAP)?;
    debug!("Dendrogram with {} leaves and {} links", layout.leaves.len(), layout.links.len());

    let title = match &context.dataset_label {
        Some(label) => format!("Hierarchical Clustering Dendrogram ({} linkage) - {}", linkage.method(), label),
        None => format!("Hierarchical Clustering Dendrogram ({} linkage)", linkage.method())
    };
    let x_extent = LEAF_SPACING * layout.leaves.len() as f64;
    let y_top = if layout.max_height > 0.0 { layout.max_height * 1.05 } else { 1.0 };
    // Room under the axis for the leaf labels.
    let y_floor = -0.06 * y_top;

    render_png(SIZE, |root| {
        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption(&title, (FONT_FAMILY, 24))
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_extent, y_floor..y_top)?;
        chart.configure_mesh()
            .disable_mesh()
            .x_labels(0)
            .y_desc("Distance")
            .draw()?;

        chart.draw_series(layout.links.iter().map(|link| {
            let color = link.group.map(palette_color).unwrap_or(NEUTRAL);
            PathElement::new(link.points.to_vec(), color.stroke_width(2))
        }))?;

        if layout.threshold > 0.0 {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(0.0, layout.threshold), (x_extent, layout.threshold)],
                NEUTRAL.mix(0.4).stroke_width(1)
            )))?;
        }

        let label_y = y_floor * 0.25;
        chart.draw_series(layout.leaves.iter().map(|leaf| {
            Text::new(leaf.label.clone(), (leaf.x - LEAF_SPACING * 0.3, label_y), (FONT_FAMILY, 11).into_font())
        }))?;
        Ok(())
    })
}
