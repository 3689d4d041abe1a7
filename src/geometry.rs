//! Geometry helpers shared by the static renderer and the viewer: conversion
//! to `geo` types, a plain lon/lat viewport fit, and pointer hit-testing.
//!
//! No projection beyond a cosine-of-latitude aspect correction is attempted.

use crate::models::JoinedRegion;
use geo::{BoundingRect, Contains, Coord, MultiPolygon, Point, Polygon, Rect};

/// Polygonal shape of a GeoJSON geometry; points and lines yield `None`.
pub fn to_multipolygon(geometry: &geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.value.clone().try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        _ => None,
    }
}

/// Shapes of all regions, index-aligned with the input. Regions without a
/// polygonal geometry get an empty shape.
pub fn region_shapes(regions: &[JoinedRegion]) -> Vec<MultiPolygon<f64>> {
    regions
        .iter()
        .map(|r| {
            r.feature
                .geometry
                .as_ref()
                .and_then(to_multipolygon)
                .unwrap_or_else(|| MultiPolygon::new(vec![]))
        })
        .collect()
}

/// Bounding box over all shapes.
pub fn bounds(shapes: &[MultiPolygon<f64>]) -> Option<Rect<f64>> {
    shapes
        .iter()
        .filter_map(|s| s.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })
}

/// Maps lon/lat into a pixel canvas, preserving aspect and centring the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    min_x: f64,
    max_y: f64,
    x_scale: f64,
    /// Pixels per degree of latitude.
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    /// Fit `bounds` into a `width` x `height` canvas with `margin` pixels on each side.
    pub fn fit(bounds: Rect<f64>, width: u32, height: u32, margin: u32) -> Self {
        let mid_lat = (bounds.min().y + bounds.max().y) / 2.0;
        // Shrink longitude so shapes at high latitudes are not stretched.
        let x_scale = mid_lat.to_radians().cos().abs().max(0.01);

        let data_w = (bounds.width() * x_scale).max(f64::EPSILON);
        let data_h = bounds.height().max(f64::EPSILON);
        let avail_w = (width.saturating_sub(2 * margin)).max(1) as f64;
        let avail_h = (height.saturating_sub(2 * margin)).max(1) as f64;
        let scale = (avail_w / data_w).min(avail_h / data_h);

        Self {
            min_x: bounds.min().x,
            max_y: bounds.max().y,
            x_scale,
            scale,
            offset_x: margin as f64 + (avail_w - data_w * scale) / 2.0,
            offset_y: margin as f64 + (avail_h - data_h * scale) / 2.0,
        }
    }

    pub fn to_screen(&self, c: Coord<f64>) -> (f64, f64) {
        (
            self.offset_x + (c.x - self.min_x) * self.x_scale * self.scale,
            self.offset_y + (self.max_y - c.y) * self.scale,
        )
    }

    pub fn to_pixel(&self, c: Coord<f64>) -> (i32, i32) {
        let (x, y) = self.to_screen(c);
        (x.round() as i32, y.round() as i32)
    }

    pub fn to_geo(&self, x: f64, y: f64) -> Coord<f64> {
        Coord {
            x: self.min_x + (x - self.offset_x) / (self.x_scale * self.scale),
            y: self.max_y - (y - self.offset_y) / self.scale,
        }
    }
}

/// Exterior rings of a shape in pixel space, one closed ring per polygon.
pub fn exterior_rings(shape: &MultiPolygon<f64>, vp: &Viewport) -> Vec<Vec<(i32, i32)>> {
    shape
        .0
        .iter()
        .map(|p: &Polygon<f64>| p.exterior().coords().map(|c| vp.to_pixel(*c)).collect())
        .collect()
}

/// Index of the first shape containing `coord`, if any.
pub fn hit_test(shapes: &[MultiPolygon<f64>], coord: Coord<f64>) -> Option<usize> {
    let point = Point::from(coord);
    shapes.iter().position(|s| s.contains(&point))
}
