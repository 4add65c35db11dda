//! Store documents, records and their durable table
//!
//! The in-memory cache itself lives in [`crate::manager::DataManager`];
//! this module holds the value types it caches and the table it mirrors
//! every write to.

pub mod document;
pub mod record;
pub mod schema;
pub mod table;

pub use document::{Document, BASIC_DATA_KEY, FORM_FIELDS_KEY, INPUTS_KEY, RESULTS_KEY};
pub use record::StoreRecord;
pub use schema::StoreSchema;
pub use table::{SqliteTable, StoreTable};
