//! Static choropleth rendering to **SVG**, **PNG**, or an in-memory RGB buffer.
//!
//! - Fill and stroke come from [`style_for`], so exported maps and the viewer
//!   draw identical colors for the same state
//! - Hovered regions are drawn last so their wider stroke is not covered
//! - A hue ramp along the bottom edge shows the scale (no text, so no font is needed)

use crate::color::{self, NO_DATA, Rgb8};
use crate::geometry::{self, Viewport};
use crate::interaction::{InteractionStates, Style, VisualState, style_for};
use crate::models::JoinedRegion;
use anyhow::{Result, anyhow};
use geo::MultiPolygon;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;

/// Blank border around the map, in pixels.
pub const MARGIN: u32 = 16;
/// Height of the scale ramp below the map.
pub const LEGEND_HEIGHT: u32 = 14;
const LEGEND_STEPS: u32 = 24;

fn rgb(c: Rgb8) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Plotters fill for a style (base color at the style's opacity).
pub fn fill_style(style: &Style) -> ShapeStyle {
    rgb(style.fill_color).mix(style.fill_opacity).filled()
}

/// Plotters stroke for a style.
pub fn stroke_style(style: &Style) -> ShapeStyle {
    rgb(style.stroke_color).stroke_width(style.stroke_width)
}

/// Precomputed shapes and viewport for one canvas size.
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub shapes: Vec<MultiPolygon<f64>>,
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
}

impl MapLayout {
    pub fn new(regions: &[JoinedRegion], width: u32, height: u32) -> Result<Self> {
        let shapes = geometry::region_shapes(regions);
        Self::from_shapes(shapes, width, height)
    }

    pub fn from_shapes(shapes: Vec<MultiPolygon<f64>>, width: u32, height: u32) -> Result<Self> {
        let bounds = geometry::bounds(&shapes).ok_or_else(|| anyhow!("no polygon geometry to draw"))?;
        let viewport = Viewport::fit(bounds, width, height.saturating_sub(LEGEND_HEIGHT), MARGIN);
        Ok(Self {
            shapes,
            viewport,
            width,
            height,
        })
    }
}

/// Render every region in its default state to a file; `.svg` selects the SVG
/// backend, anything else the bitmap backend.
pub fn plot_choropleth<P: AsRef<Path>>(
    regions: &[JoinedRegion],
    out_path: P,
    width: u32,
    height: u32,
) -> Result<()> {
    if regions.is_empty() {
        return Err(anyhow!("no regions to plot"));
    }
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let layout = MapLayout::new(regions, width, height)?;
    let states = InteractionStates::new(regions.len());

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_map(&root, regions, &layout, &states)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_map(&root, regions, &layout, &states)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

/// Render into a caller-owned RGB buffer (`width * height * 3` bytes), honouring
/// the current hover states. Used by the viewer to refresh its texture.
pub fn render_rgb(
    regions: &[JoinedRegion],
    layout: &MapLayout,
    states: &InteractionStates,
    buf: &mut [u8],
) -> Result<()> {
    let expected = (layout.width * layout.height * 3) as usize;
    if buf.len() != expected {
        return Err(anyhow!(
            "buffer holds {} bytes, canvas needs {}",
            buf.len(),
            expected
        ));
    }
    let root = BitMapBackend::with_buffer(buf, (layout.width, layout.height)).into_drawing_area();
    draw_map(&root, regions, layout, states)?;
    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

/// Draw background, regions, and legend ramp onto any plotters backend.
pub fn draw_map<DB>(
    root: &DrawingArea<DB, Shift>,
    regions: &[JoinedRegion],
    layout: &MapLayout,
    states: &InteractionStates,
) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let (hovered, resting): (Vec<usize>, Vec<usize>) = (0..regions.len())
        .partition(|i| states.state(*i) == VisualState::Hovered);

    for idx in resting.into_iter().chain(hovered) {
        let style = style_for(&regions[idx], states.state(idx));
        let Some(shape) = layout.shapes.get(idx) else {
            continue;
        };
        for ring in geometry::exterior_rings(shape, &layout.viewport) {
            if ring.len() < 3 {
                continue;
            }
            root.draw(&Polygon::new(ring.clone(), fill_style(&style)))
                .map_err(|e| anyhow!("{:?}", e))?;
            root.draw(&PathElement::new(ring, stroke_style(&style)))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    draw_legend_ramp(root, layout)
}

/// Hue ramp from loss (left) to gain (right), plus a no-data swatch.
fn draw_legend_ramp<DB>(root: &DrawingArea<DB, Shift>, layout: &MapLayout) -> Result<()>
where
    DB: DrawingBackend,
{
    // Too small for a ramp plus swatch: draw the map only.
    let Some(ramp_w) = layout
        .width
        .checked_sub(2 * MARGIN + 2 * LEGEND_HEIGHT)
        .filter(|w| *w > 0)
    else {
        return Ok(());
    };
    if layout.height <= LEGEND_HEIGHT + MARGIN {
        return Ok(());
    }
    let top = (layout.height - LEGEND_HEIGHT - MARGIN / 2) as i32;
    let bottom = top + LEGEND_HEIGHT as i32 - 4;
    let step_w = (ramp_w / LEGEND_STEPS).max(1) as i32;

    for i in 0..LEGEND_STEPS {
        let hue = color::HUE_MAX * i as f64 / (LEGEND_STEPS - 1) as f64;
        let x0 = MARGIN as i32 + i as i32 * step_w;
        root.draw(&Rectangle::new(
            [(x0, top), (x0 + step_w, bottom)],
            rgb(color::hue_to_color(hue)).filled(),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
    }

    let swatch_x = (layout.width - MARGIN - LEGEND_HEIGHT) as i32;
    root.draw(&Rectangle::new(
        [(swatch_x, top), (swatch_x + LEGEND_HEIGHT as i32 - 4, bottom)],
        rgb(NO_DATA).filled(),
    ))
    .map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}
