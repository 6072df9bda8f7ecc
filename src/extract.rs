//! Static game-data import
//!
//! Scans a data directory for `*.xml` files and picks up `<ware>`,
//! `<sector>` and `<factory>` elements:
//!
//! ```xml
//! <ware id="energyCells" name="Energy Cells"/>
//! <sector id="kingdom-end" name="Kingdom End" x="6" y="1" race="boron" suns="150" west="argon-prime"/>
//! <factory id="spp-boron-l" name="Solar Power Plant L" size="L" race="boron" cycle="60" price="2900000" volume="5000">
//!   <product ware="energyCells" quantity="690"/>
//!   <resource ware="crystals" quantity="5"/>
//!   <capacity ware="crystals" quantity="1400"/>
//!   <manufacturer sector="kingdom-end"/>
//! </factory>
//! ```
//!
//! Ware references are resolved when the catalog is loaded, so files may
//! be imported in any order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use rusqlite::Connection;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{Capacity, Factory, FactorySize, Product, Race, Sector, Sun, Ware};

/// Compiled element patterns
struct Patterns {
    simple: Regex,
    factory: Regex,
    child: Regex,
    attribute: Regex,
}

impl Patterns {
    fn new() -> Result<Self> {
        Ok(Self {
            simple: Regex::new(r"<(ware|sector)\b([^>]*?)/>")?,
            factory: Regex::new(r"(?s)<factory\b([^>]*)>(.*?)</factory>")?,
            child: Regex::new(r"<(product|resource|capacity|manufacturer)\b([^>]*?)/>")?,
            attribute: Regex::new(r#"(\w+)\s*=\s*"([^"]*)""#)?,
        })
    }

    fn attributes(&self, text: &str) -> Attributes {
        Attributes(
            self.attribute
                .captures_iter(text)
                .map(|cap| (cap[1].to_string(), cap[2].to_string()))
                .collect(),
        )
    }
}

struct Attributes(HashMap<String, String>);

impl Attributes {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| anyhow!("missing attribute '{key}'"))
    }

    fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let value = self.required(key)?;
        value
            .parse()
            .with_context(|| format!("invalid {key} '{value}'"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(_) => self.parse(key),
            None => Ok(default),
        }
    }
}

/// Records parsed from one data file
#[derive(Debug, Default)]
pub struct ParsedData {
    pub wares: Vec<Ware>,
    pub sectors: Vec<Sector>,
    pub factories: Vec<Factory>,
    /// Records that could not be parsed, with the reason
    pub rejected: Vec<String>,
}

/// Find all data files below `data_dir`
pub fn find_data_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(data_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.with_context(|| format!("Failed to scan {}", data_dir.display()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn parse_sector(attrs: &Attributes) -> Result<Sector> {
    let id = attrs.required("id")?;
    let race: Race = attrs.parse("race")?;
    let suns = Sun::try_from(attrs.parse_or::<u32>("suns", Sun::default().percent())?)?;
    let mut sector = Sector::new(
        id,
        attrs.get("name").unwrap_or(id),
        attrs.parse("x")?,
        attrs.parse("y")?,
        race,
        suns,
    );
    sector.north = attrs.get("north").map(Into::into);
    sector.south = attrs.get("south").map(Into::into);
    sector.east = attrs.get("east").map(Into::into);
    sector.west = attrs.get("west").map(Into::into);
    Ok(sector)
}

fn parse_factory(patterns: &Patterns, attrs: &Attributes, body: &str) -> Result<Factory> {
    let id = attrs.required("id")?;
    let size: FactorySize = attrs.parse("size")?;
    let race: Race = attrs.parse("race")?;

    let mut product = None;
    let mut resources = Vec::new();
    let mut capacities = Vec::new();
    let mut manufacturers = Vec::new();

    for cap in patterns.child.captures_iter(body) {
        let child = patterns.attributes(&cap[2]);
        match &cap[1] {
            "product" => {
                let ware = child.required("ware")?;
                product = Some(Product::new(Ware::new(ware, ware), child.parse("quantity")?));
            }
            "resource" => {
                let ware = child.required("ware")?;
                resources.push(Product::new(Ware::new(ware, ware), child.parse("quantity")?));
            }
            "capacity" => {
                let ware = child.required("ware")?;
                capacities.push(Capacity {
                    ware: Ware::new(ware, ware),
                    quantity: child.parse("quantity")?,
                });
            }
            _ => manufacturers.push(child.required("sector")?.into()),
        }
    }

    let product = product.ok_or_else(|| anyhow!("factory has no <product>"))?;
    Ok(Factory::new(
        id,
        attrs.get("name").unwrap_or(id),
        size,
        race,
        attrs.parse("cycle")?,
        product,
    )
    .with_price(attrs.parse_or("price", 0)?)
    .with_volume(attrs.parse_or("volume", 0)?)
    .with_resources(resources)
    .with_capacities(capacities)
    .with_manufacturers(manufacturers))
}

fn parse_content(patterns: &Patterns, content: &str) -> ParsedData {
    let mut data = ParsedData::default();

    for cap in patterns.simple.captures_iter(content) {
        let attrs = patterns.attributes(&cap[2]);
        match &cap[1] {
            "ware" => match attrs.required("id") {
                Ok(id) => data.wares.push(Ware::new(id, attrs.get("name").unwrap_or(id))),
                Err(e) => data.rejected.push(format!("ware: {e}")),
            },
            _ => match parse_sector(&attrs) {
                Ok(sector) => data.sectors.push(sector),
                Err(e) => data.rejected.push(format!(
                    "sector {}: {e:#}",
                    attrs.get("id").unwrap_or("?")
                )),
            },
        }
    }

    for cap in patterns.factory.captures_iter(content) {
        let attrs = patterns.attributes(&cap[1]);
        match parse_factory(patterns, &attrs, &cap[2]) {
            Ok(factory) => data.factories.push(factory),
            Err(e) => data.rejected.push(format!(
                "factory {}: {e:#}",
                attrs.get("id").unwrap_or("?")
            )),
        }
    }

    data
}

/// Parse wares, sectors and factories from the text of one data file
pub fn parse_data(content: &str) -> Result<ParsedData> {
    let patterns = Patterns::new()?;
    Ok(parse_content(&patterns, content))
}

/// Import all data files below `data_dir` into the database
pub fn extract_to_database(conn: &Connection, data_dir: &Path) -> Result<ExtractStats> {
    let mut stats = ExtractStats::default();
    let patterns = Patterns::new()?;

    info!(dir = %data_dir.display(), "scanning for data files");
    let files = find_data_files(data_dir)?;
    info!(count = files.len(), "found data files");

    for path in &files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let data = parse_content(&patterns, &content);

        for ware in &data.wares {
            db::upsert_ware(conn, ware)?;
        }
        for sector in &data.sectors {
            db::upsert_sector(conn, sector)?;
        }
        for factory in &data.factories {
            db::upsert_factory(conn, factory)?;
        }
        for reason in &data.rejected {
            warn!(file = %path.display(), "skipped record: {reason}");
        }

        stats.files += 1;
        stats.wares += data.wares.len();
        stats.sectors += data.sectors.len();
        stats.factories += data.factories.len();
        stats.errors += data.rejected.len();

        info!(
            file = %path.display(),
            wares = data.wares.len(),
            sectors = data.sectors.len(),
            factories = data.factories.len(),
            "parsed"
        );
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub files: usize,
    pub wares: usize,
    pub sectors: usize,
    pub factories: usize,
    pub errors: usize,
}

impl std::fmt::Display for ExtractStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Extracted {} wares, {} sectors and {} factories from {} files. Errors: {}",
            self.wares, self.sectors, self.factories, self.files, self.errors
        )
    }
}
