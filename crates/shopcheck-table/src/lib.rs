//! Test-data workbooks: row reads with unique e-mail rewriting, and appends
//! that stay correct when several writers share a file.

pub mod error;
pub mod store;
pub mod unique;
pub mod workbook;

pub use error::TableError;
pub use store::{ReadOptions, RetryPolicy, TableStore};
pub use unique::{materialize_email, UNIQUE_MARKER};
pub use workbook::{DocumentFormat, Row, Sheet, Workbook};
