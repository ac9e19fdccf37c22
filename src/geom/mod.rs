mod bounds;
mod features;

pub use bounds::{bbox, format_bbox, parse_bbox};
pub use features::{Attributes, FeatureCollection};
