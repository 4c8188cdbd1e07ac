//! Static chart rendering for a finished clustering run.
//!
//! Every renderer is a pure function from data to PNG bytes. Drawing happens into an in-memory
//! RGB buffer, so nothing touches the file system and concurrent renders share no state.
use std::io::Cursor;
use std::sync::OnceLock;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use crate::error::{Error, Result};

pub mod dendrogram;
pub mod distribution;
pub mod scatter;

pub use self::dendrogram::{render_dendrogram, DendrogramContext};
pub use self::distribution::render_distribution;
pub use self::scatter::render_scatter;

/// Font family used for all chart text.
pub(crate) const FONT_FAMILY : &str = "sans-serif";

/// DejaVu Sans, embedded so chart text needs no system fonts.
static FONT_BYTES : &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static FONT_REGISTERED : OnceLock<bool> = OnceLock::new();

/// Register the embedded font under `FONT_FAMILY` the first time any chart is drawn.
fn ensure_font() -> Result<()> {
    let registered = *FONT_REGISTERED.get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok());
    if registered { Ok(()) } else { Err(Error::Render("embedded font could not be loaded".to_string())) }
}

/// Color for dendrogram links above the color threshold and for chart frames.
pub(crate) const NEUTRAL : RGBColor = RGBColor(128, 128, 128);

/// Ten well separated colors, cycled when there are more groups.
const PALETTE : [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207)
];

/// Color for the group at the given position (for cluster labels, the position in sorted label order).
pub fn palette_color(position : usize) -> RGBColor {
    PALETTE[position % PALETTE.len()]
}

/// Allocate an RGB pixel buffer, let `draw` paint it, then encode it as PNG.
///
///   - `size` - Width and height in pixels.
///   - `draw` - Paints onto the root drawing area. The area is filled white beforehand.
pub(crate) fn render_png<F>(size : (u32, u32), draw : F) -> Result<Vec<u8>>
where F : FnOnce(&DrawingArea<BitMapBackend, plotters::coord::Shift>) -> Result<()>
{
    ensure_font()?;
    let (width, height) = size;
    let mut pixels = vec![0_u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    encode_png(width, height, pixels)
}

fn encode_png(width : u32, height : u32, pixels : Vec<u8>) -> Result<Vec<u8>> {
    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::Render(format!("pixel buffer does not match a {}x{} image", width, height)))?;
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}
