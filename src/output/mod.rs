//! Output module for persisting harvested records
//!
//! This module handles:
//! - Deduplicating records by natural key ([`ResultSet`])
//! - Lenient date coercion
//! - Writing CSV files and Excel workbooks
//! - Loading, merging and saving JSON dumps between runs

mod csv_writer;
pub mod dates;
mod dump;
mod excel;
mod result_set;
mod traits;

pub use csv_writer::{write_csv, write_csv_to};
pub use dump::{load_dump, merge_dump, read_json, save_json};
pub use excel::write_excel;
pub use result_set::{DuplicatePolicy, Insertion, ResultSet};
pub use traits::{FlatRecord, Keyed, WriteError, WriteResult};
