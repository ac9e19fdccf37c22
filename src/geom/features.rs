use geo::{BoundingRect, Coord, MultiPolygon, Rect};
use rstar::{primitives::{GeomWithData, Rectangle}, RTree, AABB};
use serde_json::{Map, Value};

use crate::crs::Crs;
use crate::error::{Error, Result};

/// Bounding rectangle of a feature, tagged with the feature's index.
type Envelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Per-feature attribute map (GeoJSON `properties`).
pub type Attributes = Map<String, Value>;

/// An ordered collection of polygons with attributes, all in one CRS.
/// The position of a feature is its identifier for every later join.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    shapes: Vec<MultiPolygon<f64>>,
    attributes: Vec<Attributes>,
    crs: Option<Crs>, // None if the source carried no (resolvable) CRS
    rtree: RTree<Envelope>,
}

impl FeatureCollection {
    /// Construct a collection from shapes with empty attribute maps.
    pub fn new(shapes: Vec<MultiPolygon<f64>>, crs: Option<Crs>) -> Self {
        let attributes = vec![Attributes::new(); shapes.len()];
        Self::build(shapes, attributes, crs)
    }

    /// Construct a collection from shapes and one attribute map per shape.
    pub fn with_attributes(shapes: Vec<MultiPolygon<f64>>, attributes: Vec<Attributes>, crs: Option<Crs>) -> Result<Self> {
        if shapes.len() != attributes.len() {
            return Err(Error::invalid(format!(
                "{} shapes but {} attribute maps", shapes.len(), attributes.len()
            )));
        }
        Ok(Self::build(shapes, attributes, crs))
    }

    fn build(shapes: Vec<MultiPolygon<f64>>, attributes: Vec<Attributes>, crs: Option<Crs>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect()
                        .map(|rect| Envelope::new(Rectangle::from_corners(rect.min().into(), rect.max().into()), i)))
                    .collect()
            ),
            shapes,
            attributes,
            crs,
        }
    }

    /// Get the number of features.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no features.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get a reference to the list of shapes.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    #[inline] pub fn attributes(&self) -> &[Attributes] { &self.attributes }

    /// Get the CRS, if known.
    #[inline] pub fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    /// Get the CRS, or fail if the collection has none.
    pub fn require_crs(&self) -> Result<&Crs> {
        self.crs.as_ref()
            .ok_or_else(|| Error::UnknownCrs("feature collection has no CRS".into()))
    }

    /// Indices of features whose bounding boxes meet the given rectangle (boundary contact included),
    /// in ascending order.
    pub fn query(&self, rect: &Rect<f64>) -> Vec<usize> {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut hits = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|envelope| envelope.data)
            .collect::<Vec<_>>();
        hits.sort_unstable();
        hits
    }

    /// Compute the bounding rectangle of all features (the collection's total bounds).
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|shape| shape.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Read a numeric column. Missing or non-numeric entries are `None`.
    pub fn column(&self, name: &str) -> Vec<Option<f64>> {
        self.attributes.iter()
            .map(|attrs| attrs.get(name).and_then(Value::as_f64))
            .collect()
    }

    /// Return a copy of this collection with a numeric column added (or replaced).
    pub fn with_column(&self, name: &str, values: &[f64]) -> Result<Self> {
        if values.len() != self.len() {
            return Err(Error::invalid(format!(
                "column {name:?} has {} values for {} features", values.len(), self.len()
            )));
        }

        let mut out = self.clone();
        for (attrs, &value) in out.attributes.iter_mut().zip(values) {
            attrs.insert(name.to_string(), Value::from(value));
        }
        Ok(out)
    }

    /// Return a copy with the same attributes but new shapes in a new CRS.
    pub(crate) fn with_shapes(&self, shapes: Vec<MultiPolygon<f64>>, crs: Crs) -> Self {
        debug_assert_eq!(shapes.len(), self.len());
        Self::build(shapes, self.attributes.clone(), Some(crs))
    }

    /// Iterate over (shape, attributes) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&MultiPolygon<f64>, &Attributes)> {
        self.shapes.iter().zip(self.attributes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Rect};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Rect::new(Coord { x, y }, Coord { x: x + size, y: y + size }).to_polygon()])
    }

    fn collection() -> FeatureCollection {
        FeatureCollection::new(vec![square(0.0, 0.0, 1.0), square(2.0, 0.0, 1.0), square(0.0, 2.0, 1.0)], Some(Crs::wgs84()))
    }

    #[test]
    fn query_is_touch_inclusive_and_sorted() {
        let features = collection();
        let probe = Rect::new(Coord { x: 1.0, y: 0.5 }, Coord { x: 2.0, y: 2.0 });
        assert_eq!(features.query(&probe), vec![0, 1, 2]);

        let probe = Rect::new(Coord { x: 1.5, y: 1.5 }, Coord { x: 1.8, y: 1.8 });
        assert!(features.query(&probe).is_empty());
    }

    #[test]
    fn bounds_cover_all_features() {
        let bounds = collection().bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 3.0, y: 3.0 });
        assert!(FeatureCollection::new(vec![], None).bounds().is_none());
    }

    #[test]
    fn with_column_appends_without_mutating_input() {
        let features = collection();
        let annotated = features.with_column("area", &[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(annotated.column("area"), vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(features.column("area"), vec![None, None, None]);
        assert!(matches!(features.with_column("area", &[1.0]), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn attribute_count_must_match_shapes() {
        let shape = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)]]);
        let result = FeatureCollection::with_attributes(vec![shape], vec![], None);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn missing_crs_is_reported() {
        let features = FeatureCollection::new(vec![square(0.0, 0.0, 1.0)], None);
        assert!(matches!(features.require_crs(), Err(Error::UnknownCrs(_))));
    }
}
