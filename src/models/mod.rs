pub mod catalog;
pub mod employee;
pub mod error;
pub mod records;
pub mod sheet;
pub mod stay;

pub use catalog::*;
pub use employee::*;
pub use error::*;
pub use records::*;
pub use sheet::*;
pub use stay::*;
