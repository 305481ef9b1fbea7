//! Canonical schema, header aliases, and the schema normalizer.

mod canonical;
mod coerce;
mod normalizer;

pub use canonical::{AliasTable, CanonicalField, normalize_header};
pub use coerce::{coerce, from_serial_day, parse_date, parse_number};
pub use normalizer::{
    CoercionFailure, ColumnMapping, ColumnRename, NormalizedTable, SchemaNormalizer,
};
