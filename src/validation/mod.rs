pub mod tax_id;

pub use tax_id::{OverflowPolicy, TaxIdValidator};
