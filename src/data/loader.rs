use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::fs;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use netcdf3::{Attribute, DataType, DataVector, FileReader};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{AttrValue, Attributes, Coordinate, DType, LabeledArray};

/// Variable name used for arrays that were saved without a name.
pub const UNNAMED_VARIABLE: &str = "__xarray_dataarray_variable__";

/// CF encoding attributes consumed while decoding; never shown to the user.
const ENCODING_ATTRS: [&str; 5] = [
    "_FillValue",
    "missing_value",
    "scale_factor",
    "add_offset",
    "coordinates",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a one-dimensional labeled array from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.nc` / `.nc3` / `.cdf` – netCDF-3 classic or 64-bit offset
/// * `.json` – `{"dims": [...], "data": [...], "coords": {...}, "attrs": {...}}`
pub fn load_file(path: &Path) -> Result<LabeledArray> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let array = match ext.as_str() {
        "nc" | "nc3" | "cdf" | "netcdf" => load_netcdf(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {:?} ({} samples along '{}') with coordinates {:?}",
        array.name().unwrap_or("<unnamed>"),
        array.len(),
        array.dim(),
        array.coord_names().collect::<Vec<_>>()
    );
    Ok(array)
}

/// netcdf3 errors carry no `Display`-based chain; keep their debug form.
pub(crate) fn nc_error<E: Debug>(err: E) -> anyhow::Error {
    anyhow!("{err:?}")
}

// ---------------------------------------------------------------------------
// netCDF loader
// ---------------------------------------------------------------------------

fn load_netcdf(path: &Path) -> Result<LabeledArray> {
    let contents = read_netcdf(path)?;
    array_from_netcdf(&contents)
}

/// One variable of a netCDF file: header information plus widened values.
#[derive(Debug, Clone)]
pub struct NcVariable {
    pub name: String,
    pub dims: Vec<String>,
    /// `None` for character data.
    pub dtype: Option<DType>,
    pub attrs: Attributes,
    pub values: Option<Vec<f64>>,
}

impl NcVariable {
    fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Everything the viewer needs from a netCDF file, read up front.
#[derive(Debug, Clone)]
pub struct NcContents {
    pub vars: Vec<NcVariable>,
    pub global_attrs: Attributes,
}

impl NcContents {
    fn var(&self, name: &str) -> Option<&NcVariable> {
        self.vars.iter().find(|v| v.name == name)
    }
}

/// Read the header and every variable of a netCDF-3 file.
///
/// The total data size the header promises is checked against the file
/// length before any variable is read, so a corrupt record count or
/// oversized dimensions fail here instead of exhausting memory.
pub fn read_netcdf(path: &Path) -> Result<NcContents> {
    let mut magic = [0u8; 4];
    let has_magic = fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .is_ok();
    if has_magic && &magic == b"\x89HDF" {
        bail!("netCDF-4/HDF5 files are not supported, save as NETCDF3_64BIT instead");
    }
    let file_len = fs::metadata(path).context("reading file size")?.len();

    // A panic inside the header parser becomes an ordinary load error.
    panic::catch_unwind(AssertUnwindSafe(|| read_checked(path, file_len)))
        .unwrap_or_else(|_| Err(anyhow!("malformed netCDF header")))
}

fn read_checked(path: &Path, file_len: u64) -> Result<NcContents> {
    let mut reader = FileReader::open(path)
        .map_err(nc_error)
        .context("reading netCDF header")?;

    let data_set = reader.data_set();
    let mut vars = Vec::new();
    let mut needed: u64 = 0;
    for var in data_set.get_vars() {
        let name = var.name().to_string();
        let mut dims = Vec::new();
        let mut count: Option<usize> = Some(1);
        for dim in var.get_dims() {
            let len = if dim.is_unlimited() {
                data_set.num_records().unwrap_or(0)
            } else {
                dim.size()
            };
            count = count.and_then(|c| c.checked_mul(len));
            dims.push(dim.name().to_string());
        }
        let data_type = var.data_type();
        let bytes = count
            .and_then(|c| c.checked_mul(type_size(&data_type)))
            .and_then(|b| u64::try_from(b).ok())
            .and_then(|b| needed.checked_add(b))
            .with_context(|| format!("variable '{name}' is too large"))?;
        needed = bytes;

        vars.push(NcVariable {
            name,
            dims,
            dtype: dtype_of(&data_type),
            attrs: attributes(var.get_attrs()),
            values: None,
        });
    }
    let global_attrs = attributes(data_set.get_global_attrs());
    if needed > file_len {
        bail!("file is truncated: variables need {needed} bytes, the file has {file_len}");
    }

    for var in &mut vars {
        let data = reader
            .read_var(&var.name)
            .map_err(nc_error)
            .with_context(|| format!("reading variable '{}'", var.name))?;
        var.values = widen(data);
    }
    Ok(NcContents { vars, global_attrs })
}

fn type_size(data_type: &DataType) -> usize {
    match data_type {
        DataType::I8 | DataType::U8 => 1,
        DataType::I16 => 2,
        DataType::I32 | DataType::F32 => 4,
        DataType::F64 => 8,
    }
}

fn dtype_of(data_type: &DataType) -> Option<DType> {
    match data_type {
        DataType::I8 => Some(DType::Int8),
        DataType::U8 => None,
        DataType::I16 => Some(DType::Int16),
        DataType::I32 => Some(DType::Int32),
        DataType::F32 => Some(DType::Float32),
        DataType::F64 => Some(DType::Float64),
    }
}

fn widen(data: DataVector) -> Option<Vec<f64>> {
    match data {
        DataVector::I8(v) => Some(v.into_iter().map(f64::from).collect()),
        DataVector::U8(_) => None,
        DataVector::I16(v) => Some(v.into_iter().map(f64::from).collect()),
        DataVector::I32(v) => Some(v.into_iter().map(f64::from).collect()),
        DataVector::F32(v) => Some(v.into_iter().map(f64::from).collect()),
        DataVector::F64(v) => Some(v),
    }
}

fn attributes(attrs: Vec<&Attribute>) -> Attributes {
    attrs
        .into_iter()
        .map(|a| (a.name().to_string(), attr_value(a)))
        .collect()
}

fn attr_value(attr: &Attribute) -> AttrValue {
    match attr.data_type() {
        DataType::U8 => {
            let bytes = attr.get_u8().unwrap_or_default();
            let text = String::from_utf8_lossy(bytes);
            AttrValue::Text(text.trim_end_matches('\0').to_string())
        }
        DataType::I8 => integers(attr.get_i8().unwrap_or_default().iter().map(|&x| i64::from(x))),
        DataType::I16 => integers(attr.get_i16().unwrap_or_default().iter().map(|&x| i64::from(x))),
        DataType::I32 => integers(attr.get_i32().unwrap_or_default().iter().map(|&x| i64::from(x))),
        DataType::F32 => floats(attr.get_f32().unwrap_or_default().iter().map(|&x| f64::from(x))),
        DataType::F64 => floats(attr.get_f64().unwrap_or_default().iter().copied()),
    }
}

fn integers(vs: impl Iterator<Item = i64>) -> AttrValue {
    let mut vs: Vec<i64> = vs.collect();
    if vs.len() == 1 {
        AttrValue::Integer(vs.remove(0))
    } else {
        AttrValue::IntegerList(vs)
    }
}

fn floats(vs: impl Iterator<Item = f64>) -> AttrValue {
    let mut vs: Vec<f64> = vs.collect();
    if vs.len() == 1 {
        AttrValue::Float(vs.remove(0))
    } else {
        AttrValue::FloatList(vs)
    }
}

/// Numeric payload of an attribute, empty for text.
fn numbers(value: &AttrValue) -> Vec<f64> {
    match value {
        AttrValue::Integer(i) => vec![*i as f64],
        AttrValue::Float(v) => vec![*v],
        AttrValue::IntegerList(vs) => vs.iter().map(|&i| i as f64).collect(),
        AttrValue::FloatList(vs) => vs.clone(),
        AttrValue::Text(_) | AttrValue::Bool(_) => Vec::new(),
    }
}

/// Pick the single data variable of a netCDF file and attach its coordinates.
///
/// Coordinate variables are those named like their only dimension, plus any
/// listed in a `coordinates` attribute (per variable or global). Every other
/// variable is a data variable, and there must be exactly one.
pub fn array_from_netcdf(contents: &NcContents) -> Result<LabeledArray> {
    let mut coord_names: BTreeSet<String> = contents
        .vars
        .iter()
        .filter(|v| v.dims == [v.name.as_str()])
        .map(|v| v.name.clone())
        .collect();

    let listed = contents
        .vars
        .iter()
        .filter_map(|v| v.attr("coordinates"))
        .chain(
            contents
                .global_attrs
                .iter()
                .filter(|(k, _)| k == "coordinates")
                .map(|(_, v)| v),
        )
        .filter_map(AttrValue::as_str);
    for text in listed {
        coord_names.extend(text.split_whitespace().map(str::to_string));
    }

    let data_vars: Vec<&NcVariable> = contents
        .vars
        .iter()
        .filter(|v| !coord_names.contains(&v.name))
        .collect();
    let var = match data_vars.as_slice() {
        [only] => *only,
        [] => bail!("file contains no data variable"),
        many => bail!(
            "file contains {} data variables ({}); expected exactly one",
            many.len(),
            many.iter().map(|v| v.name.as_str()).collect::<Vec<_>>().join(", ")
        ),
    };

    let [dim] = var.dims.as_slice() else {
        bail!(
            "'{}' has {} dimensions; only one-dimensional arrays can be viewed",
            var.name,
            var.dims.len()
        );
    };

    let (data, dtype, attrs) = decode_variable(var)?;

    let mut coords = BTreeMap::new();
    for name in &coord_names {
        let Some(cvar) = contents.var(name) else {
            log::warn!("coordinate '{name}' is listed but not stored in the file");
            continue;
        };
        if cvar.dims != [dim.as_str()] {
            log::warn!("skipping coordinate '{name}': not aligned with dimension '{dim}'");
            continue;
        }
        let (values, cdtype, cattrs) = decode_variable(cvar)?;
        coords.insert(name.clone(), Coordinate::new(values, cdtype).with_attrs(cattrs));
    }

    let mut array = LabeledArray::new(dim.clone(), data, dtype, coords)?.with_attrs(attrs);
    if var.name != UNNAMED_VARIABLE {
        array = array.with_name(var.name.clone());
    }
    Ok(array)
}

/// Apply CF mask/scale decoding to a variable's values.
fn decode_variable(var: &NcVariable) -> Result<(Vec<f64>, DType, Attributes)> {
    let (Some(values), Some(mut dtype)) = (&var.values, var.dtype) else {
        bail!("variable '{}' holds characters, not numbers", var.name);
    };
    let mut values = values.clone();

    let first = |key: &str| var.attr(key).and_then(|a| numbers(a).first().copied());
    let fills: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|key| var.attr(key))
        .flat_map(numbers)
        .filter(|f| !f.is_nan())
        .collect();
    let scale = first("scale_factor");
    let offset = first("add_offset");

    let mut masked = false;
    for v in values.iter_mut().filter(|v| fills.contains(&**v)) {
        *v = f64::NAN;
        masked = true;
    }
    if scale.is_some() || offset.is_some() {
        let (scale, offset) = (scale.unwrap_or(1.0), offset.unwrap_or(0.0));
        for v in &mut values {
            *v = *v * scale + offset;
        }
    }
    if dtype.is_integer()
        && (masked || var.attr("_FillValue").is_some() || scale.is_some() || offset.is_some())
    {
        dtype = DType::Float64;
    }

    let attrs = var
        .attrs
        .iter()
        .filter(|(k, _)| !ENCODING_ATTRS.contains(&k.as_str()))
        .cloned()
        .collect();
    Ok((values, dtype, attrs))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Dictionary export of a labeled array:
///
/// ```json
/// {
///   "name": "signal",
///   "dims": ["iteration"],
///   "data": [0.12, 0.57, null, ...],
///   "coords": {
///     "time": {"dims": ["iteration"], "data": [0.0, 1.3, ...], "attrs": {"units": "s"}}
///   },
///   "attrs": {"title": "Test Data"}
/// }
/// ```
#[derive(Debug, Deserialize)]
struct JsonArray {
    #[serde(default)]
    name: Option<String>,
    dims: Vec<String>,
    data: Vec<JsonValue>,
    #[serde(default)]
    coords: BTreeMap<String, JsonCoord>,
    #[serde(default)]
    attrs: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
struct JsonCoord {
    dims: Vec<String>,
    data: JsonValue,
    #[serde(default)]
    attrs: serde_json::Map<String, JsonValue>,
}

fn load_json(path: &Path) -> Result<LabeledArray> {
    let text = fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<LabeledArray> {
    let root: JsonArray = serde_json::from_str(text).context("parsing JSON")?;

    let [dim] = root.dims.as_slice() else {
        bail!(
            "array has {} dimensions; only one-dimensional arrays can be viewed",
            root.dims.len()
        );
    };
    let (data, dtype) = json_numbers(&root.data).context("reading 'data'")?;

    let mut coords = BTreeMap::new();
    for (name, coord) in &root.coords {
        if coord.dims.as_slice() != [dim.clone()] {
            log::warn!("skipping coordinate '{name}': not aligned with dimension '{dim}'");
            continue;
        }
        let items = coord
            .data
            .as_array()
            .with_context(|| format!("coordinate '{name}': 'data' is not a list"))?;
        let (values, cdtype) =
            json_numbers(items).with_context(|| format!("reading coordinate '{name}'"))?;
        coords.insert(
            name.clone(),
            Coordinate::new(values, cdtype).with_attrs(json_attrs(&coord.attrs)),
        );
    }

    let mut array = LabeledArray::new(dim.clone(), data, dtype, coords)?
        .with_attrs(json_attrs(&root.attrs));
    if let Some(name) = root.name {
        array = array.with_name(name);
    }
    Ok(array)
}

/// Flat list of numbers; `null` becomes NaN. All-integer lists are `int64`.
fn json_numbers(items: &[JsonValue]) -> Result<(Vec<f64>, DType)> {
    let mut all_integers = true;
    let values = items
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            JsonValue::Null => {
                all_integers = false;
                Ok(f64::NAN)
            }
            JsonValue::Number(n) => {
                all_integers &= n.is_i64() || n.is_u64();
                n.as_f64().with_context(|| format!("[{i}]: {n} is out of range"))
            }
            JsonValue::Array(_) => {
                bail!("[{i}] is a nested list; only one-dimensional arrays can be viewed")
            }
            other => bail!("[{i}]: {other} is not a number"),
        })
        .collect::<Result<Vec<f64>>>()?;
    let dtype = if all_integers {
        DType::Int64
    } else {
        DType::Float64
    };
    Ok((values, dtype))
}

fn json_attrs(map: &serde_json::Map<String, JsonValue>) -> Attributes {
    map.iter()
        .map(|(k, v)| (k.clone(), json_to_attr(v)))
        .collect()
}

fn json_to_attr(val: &JsonValue) -> AttrValue {
    match val {
        JsonValue::String(s) => AttrValue::Text(s.clone()),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttrValue::Integer(i),
            None => AttrValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::Bool(b) => AttrValue::Bool(*b),
        JsonValue::Null => AttrValue::Text("None".to_string()),
        JsonValue::Array(items) => {
            if let Some(ints) = items.iter().map(JsonValue::as_i64).collect::<Option<Vec<_>>>() {
                AttrValue::IntegerList(ints)
            } else if let Some(fs) = items.iter().map(JsonValue::as_f64).collect::<Option<Vec<_>>>() {
                AttrValue::FloatList(fs)
            } else {
                AttrValue::Text(val.to_string())
            }
        }
        JsonValue::Object(_) => AttrValue::Text(val.to_string()),
    }
}
