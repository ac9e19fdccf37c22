use geo::{Coord, Rect};

use crate::error::{Error, Result};

/// Build a validated bounding box. Coordinates must be finite and the box must
/// have a strictly positive width and height.
pub fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Rect<f64>> {
    if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
        return Err(Error::invalid(format!("bounding box has non-finite coordinates: {min_x},{min_y},{max_x},{max_y}")));
    }
    if min_x >= max_x || min_y >= max_y {
        return Err(Error::invalid(format!("bounding box is empty or inverted: {min_x},{min_y},{max_x},{max_y}")));
    }
    Ok(Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }))
}

/// Parse "minx,miny,maxx,maxy" (the form the Overture CLI takes).
pub fn parse_bbox(text: &str) -> Result<Rect<f64>> {
    let parts = text.split(',')
        .map(|part| part.trim().parse::<f64>()
            .map_err(|_| Error::invalid(format!("bounding box component is not a number: {part:?}"))))
        .collect::<Result<Vec<_>>>()?;

    let [min_x, min_y, max_x, max_y] = parts[..] else {
        return Err(Error::invalid(format!("bounding box needs 4 comma-separated values, got {}", parts.len())));
    };

    bbox(min_x, min_y, max_x, max_y)
}

/// Format a bounding box as "minx,miny,maxx,maxy".
pub fn format_bbox(rect: &Rect<f64>) -> String {
    format!("{},{},{},{}", rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}
