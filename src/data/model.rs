use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// AttrValue – a single attribute of an array or coordinate
// ---------------------------------------------------------------------------

/// A dynamically-typed attribute value, mirroring what netCDF and JSON
/// attribute mappings can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    IntegerList(Vec<i64>),
    FloatList(Vec<f64>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{s}"),
            AttrValue::Integer(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{}", format_float(*v)),
            AttrValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            AttrValue::IntegerList(vs) => {
                let items: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(" "))
            }
            AttrValue::FloatList(vs) => {
                let items: Vec<String> = vs.iter().map(|v| format_float(*v)).collect();
                write!(f, "[{}]", items.join(" "))
            }
        }
    }
}

impl AttrValue {
    /// Interpret a scalar attribute as `f64` (used for CF decoding).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Integer(i) => Some(*i as f64),
            AttrValue::FloatList(vs) if vs.len() == 1 => Some(vs[0]),
            AttrValue::IntegerList(vs) if vs.len() == 1 => Some(vs[0] as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Floats print the way the data ecosystem prints them: `1.0`, not `1`.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Ordered attribute list; file order is preserved for display.
pub type Attributes = Vec<(String, AttrValue)>;

// ---------------------------------------------------------------------------
// DType
// ---------------------------------------------------------------------------

/// Storage type of the samples before they were widened to `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    pub fn is_integer(self) -> bool {
        matches!(self, DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Extent
// ---------------------------------------------------------------------------

/// Closed (min, max) interval of a sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    /// Fallback for sequences without a single finite value.
    pub const UNIT: Extent = Extent { min: 0.0, max: 1.0 };

    /// Min/max over the finite values, `None` if there are none.
    pub fn of(values: &[f64]) -> Option<Self> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Extent { min: v, max: v }),
                Some(e) => Some(Extent {
                    min: e.min.min(v),
                    max: e.max.max(v),
                }),
            })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// A named axis of values aligned with the samples of a [`LabeledArray`].
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub values: Vec<f64>,
    pub dtype: DType,
    pub attrs: Attributes,
}

impl Coordinate {
    pub fn new(values: Vec<f64>, dtype: DType) -> Self {
        Self {
            values,
            dtype,
            attrs: Vec::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn extent(&self) -> Extent {
        Extent::of(&self.values).unwrap_or(Extent::UNIT)
    }

    pub fn units(&self) -> Option<&str> {
        find_attr(&self.attrs, "units").and_then(AttrValue::as_str)
    }
}

// ---------------------------------------------------------------------------
// LabeledArray – the complete loaded array
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ArrayError {
    #[error("array has no samples")]
    Empty,
    #[error("coordinate '{name}' has {found} values but the array has {expected}")]
    CoordinateLength {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// A one-dimensional array of samples with its coordinates and attributes.
///
/// Built once by the loader and never mutated afterwards; the viewer only
/// changes which coordinate it plots against.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    name: Option<String>,
    dim: String,
    data: Vec<f64>,
    dtype: DType,
    /// `BTreeMap` so iteration (and the default selection) is lexicographic.
    coords: BTreeMap<String, Coordinate>,
    attrs: Attributes,
    extent: Extent,
}

impl LabeledArray {
    /// Validate and assemble an array.
    ///
    /// Every coordinate must have exactly one value per sample. An array
    /// without coordinates gets an integer index coordinate named after
    /// its dimension.
    pub fn new(
        dim: impl Into<String>,
        data: Vec<f64>,
        dtype: DType,
        mut coords: BTreeMap<String, Coordinate>,
    ) -> Result<Self, ArrayError> {
        let dim = dim.into();
        if data.is_empty() {
            return Err(ArrayError::Empty);
        }
        for (name, coord) in &coords {
            if coord.values.len() != data.len() {
                return Err(ArrayError::CoordinateLength {
                    name: name.clone(),
                    expected: data.len(),
                    found: coord.values.len(),
                });
            }
        }
        if coords.is_empty() {
            let index = (0..data.len()).map(|i| i as f64).collect();
            coords.insert(dim.clone(), Coordinate::new(index, DType::Int64));
        }
        let extent = Extent::of(&data).unwrap_or(Extent::UNIT);
        Ok(Self {
            name: None,
            dim,
            data,
            dtype,
            coords,
            attrs: Vec::new(),
            extent,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dim(&self) -> &str {
        &self.dim
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn shape(&self) -> [usize; 1] {
        [self.data.len()]
    }

    pub fn coords(&self) -> &BTreeMap<String, Coordinate> {
        &self.coords
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.get(name)
    }

    pub fn coord_names(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().map(String::as_str)
    }

    /// Lexicographically first coordinate name.
    pub fn default_coord(&self) -> &str {
        // `new` guarantees at least one coordinate.
        self.coords.keys().next().map(String::as_str).unwrap_or(&self.dim)
    }

    pub fn attrs(&self) -> &[(String, AttrValue)] {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        find_attr(&self.attrs, key)
    }

    pub fn units(&self) -> Option<&str> {
        self.attr("units").and_then(AttrValue::as_str)
    }

    /// Global min/max of the samples.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Text shown in the metadata panel.
    pub fn metadata_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("dtype: {}", self.dtype),
            format!("shape: ({},)", self.len()),
            String::new(),
            "Attributes:".to_string(),
            "-----------".to_string(),
        ];
        lines.extend(self.attrs.iter().map(|(k, v)| format!("{k}: {v}")));
        lines
    }
}

fn find_attr<'a>(attrs: &'a [(String, AttrValue)], key: &str) -> Option<&'a AttrValue> {
    attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(values: &[f64]) -> Coordinate {
        Coordinate::new(values.to_vec(), DType::Float64)
    }

    #[test]
    fn rejects_mismatched_coordinate() {
        let mut coords = BTreeMap::new();
        coords.insert("time".to_string(), coord(&[0.0, 1.0]));
        let err = LabeledArray::new("t", vec![1.0, 2.0, 3.0], DType::Float64, coords).unwrap_err();
        assert_eq!(
            err,
            ArrayError::CoordinateLength {
                name: "time".into(),
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn rejects_empty_data() {
        let err = LabeledArray::new("t", vec![], DType::Float64, BTreeMap::new()).unwrap_err();
        assert_eq!(err, ArrayError::Empty);
    }

    #[test]
    fn synthesizes_index_coordinate() {
        let da = LabeledArray::new("x", vec![5.0, 6.0, 7.0], DType::Int32, BTreeMap::new()).unwrap();
        assert_eq!(da.default_coord(), "x");
        assert_eq!(da.coord("x").unwrap().values, vec![0.0, 1.0, 2.0]);
        assert!(!da.is_empty());
        assert_eq!(da.len(), 3);
    }

    #[test]
    fn default_coordinate_is_lexicographically_first() {
        let mut coords = BTreeMap::new();
        coords.insert("time".to_string(), coord(&[0.0, 13.0]));
        coords.insert("iteration".to_string(), coord(&[0.0, 1.0]));
        let da = LabeledArray::new("iteration", vec![0.1, 0.2], DType::Float64, coords).unwrap();
        assert_eq!(da.default_coord(), "iteration");
        assert_eq!(da.coord_names().collect::<Vec<_>>(), vec!["iteration", "time"]);
    }

    #[test]
    fn extent_ignores_nan() {
        let e = Extent::of(&[f64::NAN, 3.0, -1.0, f64::INFINITY]).unwrap();
        assert_eq!(e, Extent { min: -1.0, max: 3.0 });
        assert_eq!(Extent::of(&[f64::NAN]), None);
    }

    #[test]
    fn metadata_lines_layout() {
        let da = LabeledArray::new("i", vec![1.0; 11], DType::Float64, BTreeMap::new())
            .unwrap()
            .with_attrs(vec![
                ("title".into(), AttrValue::Text("Test Data".into())),
                ("scale".into(), AttrValue::Float(2.0)),
                ("flags".into(), AttrValue::IntegerList(vec![1, 2, 3])),
            ]);
        assert_eq!(
            da.metadata_lines(),
            vec![
                "dtype: float64",
                "shape: (11,)",
                "",
                "Attributes:",
                "-----------",
                "title: Test Data",
                "scale: 2.0",
                "flags: [1 2 3]",
            ]
        );
    }
}
