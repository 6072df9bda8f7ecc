//! Built-in sample catalog for trying the calculator without game data

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::db;
use crate::models::{
    Capacity, Factory, FactorySize, Product, Race, Sector, Sun, Ware, ENERGY_CELLS, ICE, ORE,
    SILICON_WAFERS,
};

fn link(
    sector: &mut Sector,
    north: Option<&str>,
    south: Option<&str>,
    east: Option<&str>,
    west: Option<&str>,
) {
    sector.north = north.map(Into::into);
    sector.south = south.map(Into::into);
    sector.east = east.map(Into::into);
    sector.west = west.map(Into::into);
}

fn sample_sectors() -> Vec<Sector> {
    let mut argon_prime =
        Sector::new("argon-prime", "Argon Prime", 3, 1, Race::Argon, Sun::Percent100);
    link(&mut argon_prime, None, Some("the-wall"), Some("home-of-light"), None);

    let mut home_of_light =
        Sector::new("home-of-light", "Home of Light", 4, 1, Race::Argon, Sun::Percent150);
    link(&mut home_of_light, None, None, Some("kingdom-end"), Some("argon-prime"));

    let mut kingdom_end =
        Sector::new("kingdom-end", "Kingdom End", 5, 1, Race::Boron, Sun::Percent150);
    link(&mut kingdom_end, None, Some("ceos-buckzoid"), None, Some("home-of-light"));

    // The gate to The Wall only works in this direction
    let mut ceos_buckzoid =
        Sector::new("ceos-buckzoid", "Ceo's Buckzoid", 5, 2, Race::Teladi, Sun::Percent100);
    link(&mut ceos_buckzoid, Some("kingdom-end"), None, None, Some("the-wall"));

    let mut the_wall = Sector::new("the-wall", "The Wall", 3, 2, Race::Argon, Sun::Percent100);
    link(&mut the_wall, Some("argon-prime"), Some("family-whi"), None, None);

    let mut family_whi =
        Sector::new("family-whi", "Family Whi", 3, 3, Race::Split, Sun::Percent300);
    link(&mut family_whi, Some("the-wall"), None, None, None);

    let xenon =
        Sector::new("xenon-sector-472", "Xenon Sector 472", 8, 8, Race::Xenon, Sun::Percent0);

    vec![
        argon_prime,
        home_of_light,
        kingdom_end,
        ceos_buckzoid,
        the_wall,
        family_whi,
        xenon,
    ]
}

#[allow(clippy::too_many_arguments)]
fn factory(
    id: &str,
    name: &str,
    size: FactorySize,
    race: Race,
    cycle: u32,
    product: Product,
    resources: Vec<Product>,
    price: u32,
    manufacturers: &[&str],
) -> Factory {
    let capacities = resources
        .iter()
        .chain(std::iter::once(&product))
        .map(|p| Capacity {
            ware: p.ware.clone(),
            quantity: (p.quantity * 20.0).ceil() as u32,
        })
        .collect();
    Factory::new(id, name, size, race, cycle, product)
        .with_resources(resources)
        .with_capacities(capacities)
        .with_price(price)
        .with_volume(match size {
            FactorySize::S => 1000,
            FactorySize::M => 2500,
            FactorySize::L => 5000,
            FactorySize::XL => 10000,
        })
        .with_manufacturers(manufacturers.iter().map(|&m| m.into()).collect())
}

fn sample_factories(ware: impl Fn(&str) -> Ware) -> Vec<Factory> {
    let energy = |quantity| Product::new(ware(ENERGY_CELLS), quantity);
    let silicon = |quantity| Product::new(ware(SILICON_WAFERS), quantity);
    let ore = |quantity| Product::new(ware(ORE), quantity);
    let crystals = |quantity| Product::new(ware("crystals"), quantity);

    vec![
        factory(
            "silicon-teladi-m",
            "Silicon Mine M",
            FactorySize::M,
            Race::Teladi,
            600,
            silicon(4.0),
            vec![energy(96.0)],
            1_146_752,
            &["ceos-buckzoid"],
        ),
        factory(
            "silicon-teladi-l",
            "Silicon Mine L",
            FactorySize::L,
            Race::Teladi,
            600,
            silicon(10.0),
            vec![energy(240.0)],
            3_245_904,
            &["ceos-buckzoid"],
        ),
        factory(
            "silicon-argon-m",
            "Silicon Mine M",
            FactorySize::M,
            Race::Argon,
            600,
            silicon(4.0),
            vec![energy(96.0)],
            1_290_000,
            &["home-of-light", "the-wall"],
        ),
        factory(
            "ore-split-m",
            "Ore Mine M",
            FactorySize::M,
            Race::Split,
            600,
            ore(8.0),
            vec![energy(48.0)],
            529_000,
            &["family-whi"],
        ),
        factory(
            "ore-split-l",
            "Ore Mine L",
            FactorySize::L,
            Race::Split,
            600,
            ore(20.0),
            vec![energy(120.0)],
            1_588_000,
            &["family-whi"],
        ),
        factory(
            "ore-argon-m",
            "Ore Mine M",
            FactorySize::M,
            Race::Argon,
            600,
            ore(8.0),
            vec![energy(48.0)],
            588_000,
            &["argon-prime"],
        ),
        factory(
            "ice-argon-m",
            "Ice Mine M",
            FactorySize::M,
            Race::Argon,
            600,
            Product::new(ware(ICE), 8.0),
            vec![energy(48.0)],
            640_000,
            &["the-wall"],
        ),
        factory(
            "spp-boron-m",
            "Solar Power Plant M",
            FactorySize::M,
            Race::Boron,
            60,
            energy(276.0),
            vec![crystals(2.0)],
            846_104,
            &["kingdom-end"],
        ),
        factory(
            "spp-boron-l",
            "Solar Power Plant L",
            FactorySize::L,
            Race::Boron,
            60,
            energy(690.0),
            vec![crystals(5.0)],
            2_947_528,
            &["kingdom-end"],
        ),
        factory(
            "spp-boron-xl",
            "Solar Power Plant XL",
            FactorySize::XL,
            Race::Boron,
            60,
            energy(1380.0),
            vec![crystals(10.0)],
            5_852_442,
            &["kingdom-end"],
        ),
        factory(
            "spp-argon-m",
            "Solar Power Plant M",
            FactorySize::M,
            Race::Argon,
            60,
            energy(276.0),
            vec![crystals(2.0)],
            902_000,
            &["argon-prime"],
        ),
        factory(
            "crystal-argon-m",
            "Crystal Fab M",
            FactorySize::M,
            Race::Argon,
            120,
            crystals(3.0),
            vec![energy(360.0), silicon(6.0)],
            1_034_000,
            &["argon-prime", "home-of-light"],
        ),
    ]
}

fn sample_wares() -> Vec<Ware> {
    vec![
        Ware::new(ENERGY_CELLS, "Energy Cells"),
        Ware::new(SILICON_WAFERS, "Silicon Wafers"),
        Ware::new(ORE, "Ore"),
        Ware::new(ICE, "Ice"),
        Ware::new("crystals", "Crystals"),
    ]
}

/// Replace the database contents with the sample catalog
pub fn load_sample_data(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;

    let wares = sample_wares();
    for ware in &wares {
        db::upsert_ware(conn, ware)?;
    }

    let sectors = sample_sectors();
    for sector in &sectors {
        db::upsert_sector(conn, sector)?;
    }

    let lookup = |id: &str| {
        wares
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .unwrap_or_else(|| Ware::new(id, id))
    };
    let factories = sample_factories(lookup);
    for factory in &factories {
        db::upsert_factory(conn, factory)?;
    }

    info!(
        wares = wares.len(),
        sectors = sectors.len(),
        factories = factories.len(),
        "loaded sample catalog"
    );
    Ok(())
}
