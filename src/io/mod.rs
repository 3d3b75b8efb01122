//! I/O handling for settlement files

pub mod csv_rows;

pub use csv_rows::decode_rows;
