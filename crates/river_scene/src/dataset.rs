//! Dataset loading
//!
//! The raw dataset is a comma separated grid. The first line holds the
//! x-axis values (its first field is a row label and is ignored). Every
//! following line starts with the z value of the row, followed by one y sample
//! per x-axis value:
//!
//! ```text
//! z\x, 0.0, 1.0, 2.0
//! 0.0, 0.4, 0.9, 0.2
//! 1.0, 0.5, 0.7, 0.1
//! ```
//!
//! Parsed points are centered on the origin.

use crate::error::DatasetError;
use river_core::{BoundingBox, Vec3};
use std::path::{Path, PathBuf};

/// Points of one dataset tile, centered on the origin
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    points: Vec<Vec3>,
    bounds: BoundingBox,
}

impl PointCloud {
    /// Build a cloud from raw points, translating it so its bounds are centered
    pub fn centered(points: Vec<Vec3>) -> Result<Self, DatasetError> {
        if points.is_empty() {
            return Err(DatasetError::Empty);
        }

        let center = BoundingBox::from_points(&points).center();
        let points: Vec<Vec3> = points.into_iter().map(|p| p - center).collect();
        let bounds = BoundingBox::from_points(&points);

        Ok(Self { points, bounds })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Source of the dataset rendered by every segment
pub trait DatasetProvider {
    /// Fetch and parse the dataset
    fn load(&self) -> Result<PointCloud, DatasetError>;
}

/// Dataset read from a text file
#[derive(Clone, Debug)]
pub struct FileDataset {
    path: PathBuf,
}

impl FileDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetProvider for FileDataset {
    fn load(&self) -> Result<PointCloud, DatasetError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| DatasetError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(
            "Loaded dataset {} ({} bytes)",
            self.path.display(),
            text.len()
        );
        parse_grid(&text)
    }
}

/// Dataset held in memory
#[derive(Clone, Debug)]
pub struct InlineDataset {
    text: String,
}

impl InlineDataset {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl DatasetProvider for InlineDataset {
    fn load(&self) -> Result<PointCloud, DatasetError> {
        parse_grid(&self.text)
    }
}

/// Parse the grid text format into a centered point cloud
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn parse_grid(text: &str) -> Result<PointCloud, DatasetError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let Some((header_line, header)) = lines.next() else {
        return Err(DatasetError::Empty);
    };

    let x_axis: Vec<f32> = header
        .split(',')
        .enumerate()
        .skip(1)
        .map(|(column, field)| parse_field(field, header_line, column + 1))
        .collect::<Result<_, _>>()?;

    let mut points = Vec::new();
    for (line_number, line) in lines {
        let mut fields = line.split(',').enumerate();
        let Some((_, z_field)) = fields.next() else {
            continue;
        };
        let z = parse_field(z_field, line_number, 1)?;

        for (column, field) in fields {
            let Some(&x) = x_axis.get(column - 1) else {
                return Err(DatasetError::RowTooLong {
                    line: line_number,
                    expected: x_axis.len(),
                    found: line.split(',').count() - 1,
                });
            };
            let y = parse_field(field, line_number, column + 1)?;
            let point = Vec3::new(x, y, z);
            if !point.is_finite() {
                return Err(DatasetError::NonFinite { line: line_number });
            }
            points.push(point);
        }
    }

    PointCloud::centered(points)
}

fn parse_field(field: &str, line: usize, column: usize) -> Result<f32, DatasetError> {
    let field = field.trim();
    let value: f32 = field.parse().map_err(|_| DatasetError::Parse {
        line,
        column,
        value: field.to_owned(),
    })?;
    if !value.is_finite() {
        return Err(DatasetError::NonFinite { line });
    }
    Ok(value)
}
