//! Polygon features supplied by the caller.

use geo::{Area, BoundingRect, Centroid, MultiPolygon, Polygon, Rect};

/// One polygon feature to compute statistics for.
///
/// The geometry must be planar, two-dimensional (Z and M ordinates dropped
/// at ingestion) and expressed in the dataset's coordinate reference system;
/// see [`TileSpec::epsg`](gpsinfo_tiles::TileSpec::epsg). The identifying
/// attribute is carried as text: `field` names the attribute column,
/// `value` is this feature's value in it, and warnings and result rows
/// label the feature with it.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Name of the identifying attribute column.
    pub field: String,
    /// This feature's value of the identifying attribute.
    pub value: String,
    /// Polygon geometry, possibly multi-ring.
    pub geometry: MultiPolygon<f64>,
    /// Whether the feature is part of the caller's current selection.
    pub selected: bool,
}

impl Feature {
    /// Create a feature from a multi-polygon.
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        Feature {
            field: field.into(),
            value: value.into(),
            geometry,
            selected: false,
        }
    }

    /// Create a feature from a single polygon.
    pub fn from_polygon(
        field: impl Into<String>,
        value: impl Into<String>,
        polygon: Polygon<f64>,
    ) -> Self {
        Self::new(field, value, MultiPolygon::new(vec![polygon]))
    }

    /// Mark the feature as selected.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Planar area in the CRS's square units.
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// Centroid as (x, y), or `None` for an empty geometry.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.geometry.centroid().map(|p| (p.x(), p.y()))
    }

    /// Bounding rectangle, or `None` for an empty geometry.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }
}
