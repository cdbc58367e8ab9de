/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  one or more .csv files
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse → clean → alias → dedup → coerce → derive
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Dataset     │  Vec<Record>, column names (+ Capabilities)
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec predicates, AND-combined → filtered Dataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  counts, means, rates, cross-tabs → reports
///   └───────────┘
/// ```

pub mod aggregate;
pub mod coerce;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
