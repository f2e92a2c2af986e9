pub mod config;
pub mod curfew;
pub mod simulate;
