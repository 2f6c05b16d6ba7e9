/// Data layer: core types, loading, caching, and filtering.
///
/// Architecture:
/// ```text
///   USGS feed URL / local .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch + parse CSV → EventCatalog
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ CatalogCache  │  one snapshot per URL, 1 h TTL
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  month/year + magnitude predicate → index view
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
