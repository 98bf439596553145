/// Data layer: core types and CSV ingestion.
///
/// Architecture:
/// ```text
///   CSV bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + infer dtypes → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ DatasetStore  │  single active slot (crate::state)
///   └──────────────┘
///        │
///        ▼
///   profile / chart / regression
/// ```

pub mod loader;
pub mod model;
