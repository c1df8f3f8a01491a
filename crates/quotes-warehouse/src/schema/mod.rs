/// Common conversions (used in data transformations)
pub mod common;
pub mod stock;
