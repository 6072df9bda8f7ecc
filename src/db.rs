//! Database schema and operations for the factory catalog

use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::catalog::Catalog;
use crate::models::{Capacity, Factory, FactorySize, Product, Race, Sector, SectorId, Sun, Ware};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS wares (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        -- Neighbour columns hold sector ids and may point one way only
        CREATE TABLE IF NOT EXISTS sectors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            x INTEGER NOT NULL,
            y INTEGER NOT NULL,
            race TEXT NOT NULL,
            suns INTEGER NOT NULL,
            north TEXT,
            south TEXT,
            east TEXT,
            west TEXT
        );

        CREATE TABLE IF NOT EXISTS factories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            size TEXT NOT NULL,
            race TEXT NOT NULL,
            cycle INTEGER NOT NULL,
            product_ware TEXT NOT NULL,
            product_quantity REAL NOT NULL,
            price INTEGER NOT NULL,
            volume INTEGER NOT NULL
        );

        -- Resources consumed per base cycle, kept in catalog order
        CREATE TABLE IF NOT EXISTS factory_resources (
            factory_id TEXT,
            position INTEGER,
            ware_id TEXT NOT NULL,
            quantity REAL NOT NULL,
            PRIMARY KEY (factory_id, position)
        );

        CREATE TABLE IF NOT EXISTS factory_capacities (
            factory_id TEXT,
            ware_id TEXT,
            quantity INTEGER NOT NULL,
            PRIMARY KEY (factory_id, ware_id)
        );

        -- Shipyards selling the factory; order breaks distance ties
        CREATE TABLE IF NOT EXISTS factory_manufacturers (
            factory_id TEXT,
            position INTEGER,
            sector_id TEXT NOT NULL,
            PRIMARY KEY (factory_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_factories_product ON factories(product_ware);
        "#,
    )?;
    Ok(())
}

/// Clear all catalog data (for re-extraction)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM factory_manufacturers;
        DELETE FROM factory_capacities;
        DELETE FROM factory_resources;
        DELETE FROM factories;
        DELETE FROM sectors;
        DELETE FROM wares;
        "#,
    )?;
    Ok(())
}

/// Insert or replace a ware
pub fn upsert_ware(conn: &Connection, ware: &Ware) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO wares (id, name) VALUES (?1, ?2)",
        (&ware.id, &ware.name),
    )?;
    Ok(())
}

/// Insert or replace a sector, including its neighbour links
pub fn upsert_sector(conn: &Connection, sector: &Sector) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO sectors (id, name, x, y, race, suns, north, south, east, west)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            sector.id.as_str(),
            &sector.name,
            sector.x,
            sector.y,
            sector.race.id(),
            sector.suns.percent(),
            sector.north.as_ref().map(SectorId::as_str),
            sector.south.as_ref().map(SectorId::as_str),
            sector.east.as_ref().map(SectorId::as_str),
            sector.west.as_ref().map(SectorId::as_str),
        ),
    )?;
    Ok(())
}

/// Insert or replace a factory together with its resources, capacities
/// and manufacturers
pub fn upsert_factory(conn: &Connection, factory: &Factory) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO factories
            (id, name, size, race, cycle, product_ware, product_quantity, price, volume)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            factory.id(),
            factory.name(),
            factory.size().as_str(),
            factory.race().id(),
            factory.cycle(),
            &factory.product().ware.id,
            factory.product().quantity,
            factory.price(),
            factory.volume(),
        ),
    )?;

    for table in ["factory_resources", "factory_capacities", "factory_manufacturers"] {
        conn.execute(
            &format!("DELETE FROM {table} WHERE factory_id = ?1"),
            [factory.id()],
        )?;
    }

    for (position, resource) in factory.resources().iter().enumerate() {
        conn.execute(
            "INSERT INTO factory_resources (factory_id, position, ware_id, quantity)
             VALUES (?1, ?2, ?3, ?4)",
            (factory.id(), position as i64, &resource.ware.id, resource.quantity),
        )?;
    }

    for capacity in factory.capacities() {
        conn.execute(
            "INSERT INTO factory_capacities (factory_id, ware_id, quantity) VALUES (?1, ?2, ?3)",
            (factory.id(), &capacity.ware.id, capacity.quantity),
        )?;
    }

    for (position, sector) in factory.manufacturers().iter().enumerate() {
        conn.execute(
            "INSERT INTO factory_manufacturers (factory_id, position, sector_id)
             VALUES (?1, ?2, ?3)",
            (factory.id(), position as i64, sector.as_str()),
        )?;
    }

    Ok(())
}

struct SectorRow {
    id: String,
    name: String,
    x: i32,
    y: i32,
    race: String,
    suns: u32,
    links: [Option<String>; 4],
}

struct FactoryRow {
    id: String,
    name: String,
    size: String,
    race: String,
    cycle: u32,
    product_ware: String,
    product_quantity: f64,
    price: u32,
    volume: u32,
}

/// Look up a ware, falling back to a bare id so that the catalog
/// validation reports the missing ware by name
fn ware_ref(wares: &HashMap<String, Ware>, id: &str) -> Ware {
    wares
        .get(id)
        .cloned()
        .unwrap_or_else(|| Ware::new(id, id))
}

fn read_wares(conn: &Connection) -> Result<HashMap<String, Ware>> {
    let mut stmt = conn.prepare("SELECT id, name FROM wares ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Ware::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut wares = HashMap::new();
    for row in rows {
        let ware = row?;
        wares.insert(ware.id.clone(), ware);
    }
    Ok(wares)
}

fn read_sectors(conn: &Connection) -> Result<Vec<Sector>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, x, y, race, suns, north, south, east, west FROM sectors ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(SectorRow {
            id: row.get(0)?,
            name: row.get(1)?,
            x: row.get(2)?,
            y: row.get(3)?,
            race: row.get(4)?,
            suns: row.get(5)?,
            links: [row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?],
        })
    })?;

    let mut sectors = Vec::new();
    for row in rows {
        let row = row?;
        let race: Race = row
            .race
            .parse()
            .with_context(|| format!("sector '{}'", row.id))?;
        let suns = Sun::try_from(row.suns).with_context(|| format!("sector '{}'", row.id))?;
        let [north, south, east, west] = row.links.map(|link| link.map(SectorId::from));
        sectors.push(Sector {
            id: row.id.into(),
            name: row.name,
            x: row.x,
            y: row.y,
            race,
            suns,
            north,
            south,
            east,
            west,
        });
    }
    Ok(sectors)
}

/// Read all factories with their resources, capacities and manufacturers.
/// References are not checked here; `load_catalog` does that.
fn read_factories(conn: &Connection, wares: &HashMap<String, Ware>) -> Result<Vec<Factory>> {
    let mut resources: HashMap<String, Vec<Product>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT factory_id, ware_id, quantity FROM factory_resources
         ORDER BY factory_id, position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, f64>(2)?))
    })?;
    for row in rows {
        let (factory_id, ware_id, quantity) = row?;
        resources
            .entry(factory_id)
            .or_default()
            .push(Product::new(ware_ref(wares, &ware_id), quantity));
    }

    let mut capacities: HashMap<String, Vec<Capacity>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT factory_id, ware_id, quantity FROM factory_capacities
         ORDER BY factory_id, ware_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, u32>(2)?))
    })?;
    for row in rows {
        let (factory_id, ware_id, quantity) = row?;
        capacities.entry(factory_id).or_default().push(Capacity {
            ware: ware_ref(wares, &ware_id),
            quantity,
        });
    }

    let mut manufacturers: HashMap<String, Vec<SectorId>> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT factory_id, sector_id FROM factory_manufacturers ORDER BY factory_id, position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (factory_id, sector_id) = row?;
        manufacturers
            .entry(factory_id)
            .or_default()
            .push(sector_id.into());
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, size, race, cycle, product_ware, product_quantity, price, volume
         FROM factories ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(FactoryRow {
            id: row.get(0)?,
            name: row.get(1)?,
            size: row.get(2)?,
            race: row.get(3)?,
            cycle: row.get(4)?,
            product_ware: row.get(5)?,
            product_quantity: row.get(6)?,
            price: row.get(7)?,
            volume: row.get(8)?,
        })
    })?;

    let mut factories = Vec::new();
    for row in rows {
        let row = row?;
        let size: FactorySize = row
            .size
            .parse()
            .with_context(|| format!("factory '{}'", row.id))?;
        let race: Race = row
            .race
            .parse()
            .with_context(|| format!("factory '{}'", row.id))?;
        let product = Product::new(ware_ref(wares, &row.product_ware), row.product_quantity);
        let factory = Factory::new(row.id.as_str(), row.name, size, race, row.cycle, product)
            .with_price(row.price)
            .with_volume(row.volume)
            .with_resources(resources.remove(&row.id).unwrap_or_default())
            .with_capacities(capacities.remove(&row.id).unwrap_or_default())
            .with_manufacturers(manufacturers.remove(&row.id).unwrap_or_default());
        factories.push(factory);
    }
    Ok(factories)
}

/// List all factories in the database in canonical order
pub fn list_factories(conn: &Connection) -> Result<Vec<Factory>> {
    let wares = read_wares(conn)?;
    let mut factories = read_factories(conn, &wares)?;
    factories.sort();
    Ok(factories)
}

/// Read the whole catalog into memory and link it
pub fn load_catalog(conn: &Connection) -> Result<Catalog> {
    let wares = read_wares(conn)?;
    let sectors = read_sectors(conn)?;
    let factories = read_factories(conn, &wares)?;

    debug!(
        wares = wares.len(),
        sectors = sectors.len(),
        factories = factories.len(),
        "loaded catalog rows"
    );

    let catalog = Catalog::new(wares.into_values().collect(), sectors, factories)?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn round_trips_a_linked_catalog() {
        let conn = memory_db();
        let energy = Ware::new("energyCells", "Energy Cells");
        let crystals = Ware::new("crystals", "Crystals");
        upsert_ware(&conn, &energy).unwrap();
        upsert_ware(&conn, &crystals).unwrap();

        let mut home =
            Sector::new("kingdom-end", "Kingdom End", 6, 1, Race::Boron, Sun::Percent150);
        home.west = Some("argon-prime".into());
        let prime = Sector::new("argon-prime", "Argon Prime", 3, 1, Race::Argon, Sun::Percent100);
        upsert_sector(&conn, &home).unwrap();
        upsert_sector(&conn, &prime).unwrap();

        let plant = Factory::new(
            "spp-boron-l",
            "Solar Power Plant L",
            FactorySize::L,
            Race::Boron,
            60,
            Product::new(energy.clone(), 690.0),
        )
        .with_price(2_900_000)
        .with_volume(5000)
        .with_resources(vec![Product::new(crystals.clone(), 5.0)])
        .with_capacities(vec![Capacity { ware: crystals, quantity: 1400 }])
        .with_manufacturers(vec!["kingdom-end".into(), "argon-prime".into()]);
        upsert_factory(&conn, &plant).unwrap();
        // replacing must not duplicate child rows
        upsert_factory(&conn, &plant).unwrap();

        let catalog = load_catalog(&conn).unwrap();
        let loaded = catalog.factory("spp-boron-l").unwrap();
        assert!(loaded.is_solar_power_plant());
        assert_eq!(loaded.price(), 2_900_000);
        assert_eq!(loaded.resources().len(), 1);
        assert_eq!(loaded.capacities()[0].quantity, 1400);
        let manufacturers: Vec<&str> =
            loaded.manufacturers().iter().map(SectorId::as_str).collect();
        assert_eq!(manufacturers, vec!["kingdom-end", "argon-prime"]);

        let sector = catalog.sector("kingdom-end").unwrap();
        assert_eq!(sector.suns, Sun::Percent150);
        assert_eq!(sector.west.as_ref().map(SectorId::as_str), Some("argon-prime"));
        assert_eq!(catalog.distance(&"kingdom-end".into(), &"argon-prime".into()), Ok(1));
    }

    #[test]
    fn rejects_unknown_sun_power() {
        let conn = memory_db();
        conn.execute(
            "INSERT INTO sectors (id, name, x, y, race, suns)
             VALUES ('s', 'S', 0, 0, 'argon', 125)",
            [],
        )
        .unwrap();
        let err = load_catalog(&conn).unwrap_err();
        assert!(format!("{err:#}").contains("125"));
    }

    #[test]
    fn reports_missing_wares() {
        let conn = memory_db();
        let factory = Factory::new(
            "wheat-argon-m",
            "Wheat Farm M",
            FactorySize::M,
            Race::Argon,
            300,
            Product::new(Ware::new("wheat", "Wheat"), 10.0),
        );
        upsert_factory(&conn, &factory).unwrap();
        let err = load_catalog(&conn).unwrap_err();
        assert!(err.to_string().contains("wheat"));
    }

    #[test]
    fn lists_factories_in_canonical_order() {
        let conn = memory_db();
        let energy = Ware::new("energyCells", "Energy Cells");
        upsert_ware(&conn, &energy).unwrap();
        for (id, name, size, race) in [
            ("spp-boron-xl", "Solar Power Plant XL", FactorySize::XL, Race::Boron),
            ("spp-boron-m", "Solar Power Plant M", FactorySize::M, Race::Boron),
            ("spp-argon-l", "Solar Power Plant L", FactorySize::L, Race::Argon),
        ] {
            let product = Product::new(energy.clone(), 100.0);
            let factory = Factory::new(id, name, size, race, 60, product)
                .with_resources(vec![Product::new(Ware::new("crystals", "Crystals"), 1.0)]);
            upsert_factory(&conn, &factory).unwrap();
        }

        // listing works without sectors and with the crystals ware missing
        let factories = list_factories(&conn).unwrap();
        let ids: Vec<&str> = factories.iter().map(Factory::id).collect();
        assert_eq!(ids, vec!["spp-boron-m", "spp-argon-l", "spp-boron-xl"]);
        assert_eq!(factories[0].product().ware.name, "Energy Cells");
        assert_eq!(factories[0].resources()[0].ware.id, "crystals");
    }

    #[test]
    fn clear_removes_everything() {
        let conn = memory_db();
        upsert_ware(&conn, &Ware::new("ore", "Ore")).unwrap();
        clear_catalog(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM wares", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
