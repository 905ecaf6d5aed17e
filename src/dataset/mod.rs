//! Tabular input handling: CSV ingest, cleaning, schema derivation, splits,
//! and the request-to-row mapping used by the service.

pub mod clean;
mod error;
mod record;
mod schema;
mod split;
mod table;
mod value;

pub use error::DatasetError;
pub use record::{Fields, RawRecord};
pub use schema::{FeatureSchema, SCHEMA_FILE_NAME};
pub use split::{SplitIndices, stratified_split};
pub use table::{RawTable, TableRow};
pub use value::{RawValue, UnsupportedValue};
