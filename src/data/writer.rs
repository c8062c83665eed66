use std::path::Path;

use anyhow::{Context, Result};
use netcdf3::{DataSet, DataType, DataVector, FileWriter, Version};

use super::loader::{UNNAMED_VARIABLE, nc_error};
use super::model::{AttrValue, DType, LabeledArray};

/// Save an array as netCDF-3, laid out the way the loader expects:
/// one data variable, one variable per coordinate, and a `coordinates`
/// attribute naming the coordinates that are not dimension coordinates.
pub fn write_netcdf(array: &LabeledArray, path: &Path, version: Version) -> Result<()> {
    let (data_set, vars) = to_data_set(array)?;
    write_data_set(path, &data_set, version, &vars)
}

/// The netCDF definition of `array` and the encoded values of each variable.
pub fn to_data_set(array: &LabeledArray) -> Result<(DataSet, Vec<(String, DataVector)>)> {
    let dim = array.dim();
    let mut data_set = DataSet::new();
    data_set.add_fixed_dim(dim, array.len()).map_err(nc_error)?;
    let mut vars = Vec::new();

    for (name, coord) in array.coords() {
        let values = encode(&coord.values, coord.dtype);
        define(&mut data_set, name, dim, &values)?;
        fill_value(&mut data_set, name, coord.dtype)?;
        for (key, value) in &coord.attrs {
            attribute(&mut data_set, name, key, value)?;
        }
        vars.push((name.clone(), values));
    }

    let name = array.name().unwrap_or(UNNAMED_VARIABLE);
    let values = encode(array.data(), array.dtype());
    define(&mut data_set, name, dim, &values)?;
    fill_value(&mut data_set, name, array.dtype())?;
    for (key, value) in array.attrs() {
        attribute(&mut data_set, name, key, value)?;
    }
    let auxiliary: Vec<&str> = array.coord_names().filter(|n| *n != dim).collect();
    if !auxiliary.is_empty() {
        data_set
            .add_var_attr_string(name, "coordinates", auxiliary.join(" ").as_str())
            .map_err(nc_error)?;
    }
    vars.push((name.to_string(), values));

    Ok((data_set, vars))
}

/// Write a definition and its variables to `path`, replacing any file there.
pub fn write_data_set(
    path: &Path,
    data_set: &DataSet,
    version: Version,
    vars: &[(String, DataVector)],
) -> Result<()> {
    let mut writer = FileWriter::open(path).map_err(nc_error)?;
    writer.set_def(data_set, version, 0).map_err(nc_error)?;
    for (name, values) in vars {
        match values {
            DataVector::I8(v) => writer.write_var_i8(name, v),
            DataVector::U8(v) => writer.write_var_u8(name, v),
            DataVector::I16(v) => writer.write_var_i16(name, v),
            DataVector::I32(v) => writer.write_var_i32(name, v),
            DataVector::F32(v) => writer.write_var_f32(name, v),
            DataVector::F64(v) => writer.write_var_f64(name, v),
        }
        .map_err(nc_error)
        .with_context(|| format!("writing variable '{name}'"))?;
    }
    writer.close().map_err(nc_error)
}

fn define(data_set: &mut DataSet, name: &str, dim: &str, values: &DataVector) -> Result<()> {
    let data_type = match values {
        DataVector::I8(_) => DataType::I8,
        DataVector::U8(_) => DataType::U8,
        DataVector::I16(_) => DataType::I16,
        DataVector::I32(_) => DataType::I32,
        DataVector::F32(_) => DataType::F32,
        DataVector::F64(_) => DataType::F64,
    };
    data_set
        .add_var(name, &[dim], data_type)
        .map_err(nc_error)
        .with_context(|| format!("defining variable '{name}'"))
}

/// Floating point variables carry a NaN fill value.
fn fill_value(data_set: &mut DataSet, var: &str, dtype: DType) -> Result<()> {
    match dtype {
        DType::Float32 => data_set.add_var_attr_f32(var, "_FillValue", vec![f32::NAN]),
        DType::Float64 => data_set.add_var_attr_f64(var, "_FillValue", vec![f64::NAN]),
        _ => return Ok(()),
    }
    .map_err(nc_error)
}

/// netCDF-3 has no 64-bit integers: `Int64` is stored as `int` when every
/// value fits, and reads back as `Int32`. Larger values fall back to `double`.
fn encode(values: &[f64], dtype: DType) -> DataVector {
    match dtype {
        DType::Int8 => DataVector::I8(values.iter().map(|&v| v as i8).collect()),
        DType::Int16 => DataVector::I16(values.iter().map(|&v| v as i16).collect()),
        DType::Int32 => DataVector::I32(values.iter().map(|&v| v as i32).collect()),
        DType::Int64 if values.iter().all(|&v| fits_i32(v)) => {
            DataVector::I32(values.iter().map(|&v| v as i32).collect())
        }
        DType::Float32 => DataVector::F32(values.iter().map(|&v| v as f32).collect()),
        DType::Int64 | DType::Float64 => DataVector::F64(values.to_vec()),
    }
}

fn fits_i32(v: f64) -> bool {
    v.fract() == 0.0 && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX)
}

fn attribute(data_set: &mut DataSet, var: &str, key: &str, value: &AttrValue) -> Result<()> {
    match value {
        AttrValue::Text(s) => data_set.add_var_attr_string(var, key, s.as_str()).map_err(nc_error),
        AttrValue::Bool(b) => data_set.add_var_attr_i8(var, key, vec![i8::from(*b)]).map_err(nc_error),
        AttrValue::Integer(i) => integers(data_set, var, key, &[*i]),
        AttrValue::IntegerList(vs) => integers(data_set, var, key, vs),
        AttrValue::Float(v) => data_set.add_var_attr_f64(var, key, vec![*v]).map_err(nc_error),
        AttrValue::FloatList(vs) => data_set.add_var_attr_f64(var, key, vs.clone()).map_err(nc_error),
    }
    .with_context(|| format!("writing attribute '{key}' of '{var}'"))
}

/// Integer attributes are `int` when they fit, `double` otherwise.
fn integers(data_set: &mut DataSet, var: &str, key: &str, vs: &[i64]) -> Result<()> {
    match vs.iter().map(|&v| i32::try_from(v).ok()).collect::<Option<Vec<_>>>() {
        Some(ints) => data_set.add_var_attr_i32(var, key, ints),
        None => data_set.add_var_attr_f64(var, key, vs.iter().map(|&v| v as f64).collect()),
    }
    .map_err(nc_error)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::loader::{array_from_netcdf, read_netcdf};
    use crate::data::model::Coordinate;

    #[test]
    fn written_array_loads_back() {
        let mut coords = BTreeMap::new();
        coords.insert(
            "iteration".to_string(),
            Coordinate::new(vec![0.0, 0.5, 1.0], DType::Float64),
        );
        coords.insert(
            "time".to_string(),
            Coordinate::new(vec![0.0, 6.5, 13.0], DType::Float64)
                .with_attrs(vec![("units".into(), AttrValue::Text("s".into()))]),
        );
        let array = LabeledArray::new("iteration", vec![0.3, f64::NAN, 0.9], DType::Float64, coords)
            .unwrap()
            .with_attrs(vec![
                ("title".into(), AttrValue::Text("Test Data".into())),
                ("runs".into(), AttrValue::Integer(3)),
            ]);

        let dir = tempfile::tempdir().unwrap();
        for (file, version) in [("cdf1.nc", Version::Classic), ("cdf2.nc", Version::Offset64Bit)] {
            let path = dir.path().join(file);
            write_netcdf(&array, &path, version).unwrap();
            let back = array_from_netcdf(&read_netcdf(&path).unwrap()).unwrap();

            assert_eq!(back.name(), None);
            assert_eq!(back.dim(), "iteration");
            assert_eq!(back.dtype(), DType::Float64);
            assert_eq!(back.data()[0], 0.3);
            assert!(back.data()[1].is_nan());
            assert_eq!(back.coords(), array.coords());
            assert_eq!(back.attrs(), array.attrs());
        }
    }

    #[test]
    fn named_integer_array_keeps_its_name() {
        let array = LabeledArray::new("n", vec![1.0, 2.0], DType::Int64, BTreeMap::new())
            .unwrap()
            .with_name("counts");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.nc");
        write_netcdf(&array, &path, Version::Classic).unwrap();

        let contents = read_netcdf(&path).unwrap();
        let counts = contents.vars.iter().find(|v| v.name == "counts").unwrap();
        assert_eq!(counts.dtype, Some(DType::Int32));
        let back = array_from_netcdf(&contents).unwrap();
        assert_eq!(back.name(), Some("counts"));
        assert_eq!(back.data(), &[1.0, 2.0]);
        // Int64 narrows to Int32 on disk; the index coordinate does too.
        assert_eq!(back.dtype(), DType::Int32);
        assert_eq!(back.coord("n").map(|c| c.dtype), Some(DType::Int32));
    }

    #[test]
    fn wide_integers_are_stored_as_doubles() {
        let array = LabeledArray::new("n", vec![1.0, 5e9], DType::Int64, BTreeMap::new()).unwrap();
        let (_, vars) = to_data_set(&array).unwrap();
        let data = vars.iter().find(|(n, _)| n == UNNAMED_VARIABLE).unwrap();
        assert!(matches!(&data.1, DataVector::F64(v) if v == &[1.0, 5e9]), "{:?}", data.1);
    }
}
