//! Coordinate transformation between reference systems.
//!
//! The projector is the geodetic heart of the pipeline. For every row it
//! builds a point geometry from `(x, y)` interpreted as
//! `(longitude, latitude)`, hands the point set to the PROJ engine tagged
//! with the source CRS, and appends the projected result as `Easting` and
//! `Northing` columns.
//!
//! Axis order is a hard contract: the first value is always the
//! horizontal/longitude axis regardless of the target CRS's own axis
//! convention. [`Proj::new_known_crs`] normalizes both ends accordingly
//! (longitude/latitude in, easting/northing out).
//!
//! The projection mathematics (datum shift, map projection equations) is
//! entirely delegated to PROJ; this module owns correct invocation and
//! faithful error propagation. Values pass through at full double
//! precision, in whatever linear unit the target CRS defines.

use geo::Point;
use proj::Proj;
use serde_json::Value;

use crate::error::{ProjectionError, ProjectionResult};
use crate::models::{CrsId, RecordTable};

/// Column name for the projected horizontal coordinate.
pub const EASTING_FIELD: &str = "Easting";

/// Column name for the projected vertical coordinate.
pub const NORTHING_FIELD: &str = "Northing";

/// A compiled source → target CRS transformation.
///
/// Stateless and side-effect free once constructed; one instance per
/// conversion call.
#[derive(Debug)]
pub struct Projector {
    transform: Proj,
    source: CrsId,
    target: CrsId,
}

impl Projector {
    /// Compile the transformation for a CRS pair.
    ///
    /// Fails with [`ProjectionError::InvalidCrsIdentifier`] when either
    /// code is unknown to the engine.
    pub fn new(source: &CrsId, target: &CrsId) -> ProjectionResult<Self> {
        let transform =
            Proj::new_known_crs(source.as_str(), target.as_str(), None).map_err(|e| {
                ProjectionError::InvalidCrsIdentifier {
                    crs: format!("{source} -> {target}"),
                    message: e.to_string(),
                }
            })?;

        Ok(Self {
            transform,
            source: source.clone(),
            target: target.clone(),
        })
    }

    /// Source CRS of this transformation.
    pub fn source(&self) -> &CrsId {
        &self.source
    }

    /// Target CRS of this transformation.
    pub fn target(&self) -> &CrsId {
        &self.target
    }

    /// Project every row's `(x_field, y_field)` pair and return the table
    /// with `Easting` and `Northing` columns appended.
    ///
    /// Row order and all original columns are preserved. The operation is
    /// atomic: if any row fails — malformed value, out-of-domain point —
    /// the error propagates and no augmented table exists. A failed row is
    /// never emitted as null or NaN, which would read as plausible data
    /// downstream.
    pub fn project_table(
        &self,
        table: RecordTable,
        x_field: &str,
        y_field: &str,
    ) -> ProjectionResult<RecordTable> {
        let mut points = Vec::with_capacity(table.len());
        for (row_idx, row) in table.rows().iter().enumerate() {
            points.push(point_from_row(row, row_idx, x_field, y_field)?);
        }

        let mut eastings = Vec::with_capacity(points.len());
        let mut northings = Vec::with_capacity(points.len());

        for (row_idx, point) in points.into_iter().enumerate() {
            let (x, y) = (point.x(), point.y());
            let projected: Point<f64> =
                self.transform
                    .convert(point)
                    .map_err(|e| ProjectionError::ProjectionFailure {
                        row: row_idx,
                        x,
                        y,
                        message: e.to_string(),
                    })?;

            eastings.push(finite_number(projected.x(), row_idx, x, y)?);
            northings.push(finite_number(projected.y(), row_idx, x, y)?);
        }

        let mut table = table;
        table.push_column(EASTING_FIELD, eastings);
        table.push_column(NORTHING_FIELD, northings);
        Ok(table)
    }
}

/// Build the point geometry for one row.
///
/// `x` is longitude, `y` is latitude; both must parse as finite numbers
/// within the geographic range of the declared source interpretation.
fn point_from_row(
    row: &serde_json::Map<String, Value>,
    row_idx: usize,
    x_field: &str,
    y_field: &str,
) -> ProjectionResult<Point<f64>> {
    let x = coordinate_value(row, x_field, row_idx)?;
    let y = coordinate_value(row, y_field, row_idx)?;

    if !(-180.0..=180.0).contains(&x) {
        return Err(malformed(row_idx, x_field, &x.to_string(), "longitude out of range [-180, 180]"));
    }
    if !(-90.0..=90.0).contains(&y) {
        return Err(malformed(row_idx, y_field, &y.to_string(), "latitude out of range [-90, 90]"));
    }

    Ok(Point::new(x, y))
}

/// Read one coordinate cell as a finite f64.
fn coordinate_value(
    row: &serde_json::Map<String, Value>,
    field: &str,
    row_idx: usize,
) -> ProjectionResult<f64> {
    let value = row.get(field).unwrap_or(&Value::Null);

    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(malformed(row_idx, field, &render(value), "not a finite number")),
        None => Err(malformed(row_idx, field, &render(value), "not a number")),
    }
}

fn malformed(row: usize, column: &str, value: &str, message: &str) -> ProjectionError {
    ProjectionError::MalformedCoordinate {
        row,
        column: column.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Wrap a projected coordinate as a JSON number, rejecting non-finite
/// results the engine failed to flag itself.
fn finite_number(v: f64, row: usize, x: f64, y: f64) -> ProjectionResult<Value> {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| ProjectionError::ProjectionFailure {
            row,
            x,
            y,
            message: "transform produced a non-finite coordinate".to_string(),
        })
}
