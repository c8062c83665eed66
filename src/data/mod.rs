/// Data layer: core types, file formats, and sample data.
///
/// Architecture:
/// ```text
///  .nc (netCDF-3)     .json
///        │              │
///        ▼              │
///   ┌──────────┐        │
///   │  netcdf3  │  header + raw variables
///   └──────────┘        │
///        │              │
///        ▼              ▼
///   ┌────────────────────┐
///   │       loader        │  pick data variable, CF decode → LabeledArray
///   └────────────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ LabeledArray  │  samples, coordinates, attributes
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  LabeledArray → netCDF-3 (self test, sample generator)
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod sample;
pub mod writer;
