//! Production planning for X3 station complexes.
//!
//! Computes real production cycles and hourly product/resource rates of
//! factories under a given sun power and asteroid yield, and answers
//! distance queries over the sector network.

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod sample;

pub use catalog::{Catalog, RaceFilter};
pub use error::CalcError;
pub use models::{Factory, FactorySize, Product, ProductionKind, Race, Sector, SectorId, Sun, Ware};
