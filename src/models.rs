//! Data models for wares, races, sectors and factories

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::CalcError;

pub const SILICON_WAFERS: &str = "siliconWafers";
pub const ORE: &str = "ore";
pub const ICE: &str = "ice";
pub const ENERGY_CELLS: &str = "energyCells";

/// A tradeable commodity. Only the id takes part in equality.
#[derive(Debug, Clone)]
pub struct Ware {
    pub id: String,
    pub name: String,
}

impl Ware {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl PartialEq for Ware {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Ware {}

impl Hash for Ware {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A ware paired with a quantity, either per cycle or per hour
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub ware: Ware,
    pub quantity: f64,
}

impl Product {
    pub fn new(ware: Ware, quantity: f64) -> Self {
        Self { ware, quantity }
    }
}

/// Storage capacity of a factory for one ware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capacity {
    pub ware: Ware,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactorySize {
    S,
    M,
    L,
    XL,
}

impl FactorySize {
    pub fn as_str(self) -> &'static str {
        match self {
            FactorySize::S => "S",
            FactorySize::M => "M",
            FactorySize::L => "L",
            FactorySize::XL => "XL",
        }
    }
}

impl fmt::Display for FactorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactorySize {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S" => Ok(FactorySize::S),
            "M" => Ok(FactorySize::M),
            "L" => Ok(FactorySize::L),
            "XL" => Ok(FactorySize::XL),
            _ => Err(CalcError::UnknownSize(s.to_string())),
        }
    }
}

/// The races owning sectors and manufacturing factories.
/// Declaration order is the ordering used as a tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Race {
    Argon,
    Boron,
    Split,
    Paranid,
    Teladi,
    Goner,
    Terran,
    Atf,
    Pirates,
    Yaki,
    Xenon,
    Khaak,
    Friendly,
}

impl Race {
    pub const ALL: [Race; 13] = [
        Race::Argon,
        Race::Boron,
        Race::Split,
        Race::Paranid,
        Race::Teladi,
        Race::Goner,
        Race::Terran,
        Race::Atf,
        Race::Pirates,
        Race::Yaki,
        Race::Xenon,
        Race::Khaak,
        Race::Friendly,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Race::Argon => "argon",
            Race::Boron => "boron",
            Race::Split => "split",
            Race::Paranid => "paranid",
            Race::Teladi => "teladi",
            Race::Goner => "goner",
            Race::Terran => "terran",
            Race::Atf => "atf",
            Race::Pirates => "pirates",
            Race::Yaki => "yaki",
            Race::Xenon => "xenon",
            Race::Khaak => "khaak",
            Race::Friendly => "friendly",
        }
    }

    /// Map colour as (r, g, b)
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Race::Argon => (0x00, 0x66, 0xcc),
            Race::Boron => (0x00, 0xaa, 0x44),
            Race::Split => (0xcc, 0x00, 0xcc),
            Race::Paranid => (0x00, 0xcc, 0xcc),
            Race::Teladi => (0xcc, 0xcc, 0x00),
            Race::Goner => (0x88, 0x88, 0xff),
            Race::Terran => (0xff, 0xff, 0xff),
            Race::Atf => (0xaa, 0xaa, 0xaa),
            Race::Pirates => (0x88, 0x44, 0x00),
            Race::Yaki => (0xff, 0x66, 0x00),
            Race::Xenon => (0xcc, 0x00, 0x00),
            Race::Khaak => (0x66, 0x00, 0x66),
            Race::Friendly => (0x44, 0x44, 0x44),
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Race {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        Race::ALL
            .into_iter()
            .find(|race| race.id() == wanted)
            .ok_or_else(|| CalcError::UnknownRace(s.to_string()))
    }
}

/// Sun power presets. Each preset fixes the cycle of a solar power plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Sun {
    Percent0,
    #[default]
    Percent100,
    Percent150,
    Percent300,
    Percent400,
}

impl Sun {
    pub const ALL: [Sun; 5] = [
        Sun::Percent0,
        Sun::Percent100,
        Sun::Percent150,
        Sun::Percent300,
        Sun::Percent400,
    ];

    pub fn percent(self) -> u32 {
        match self {
            Sun::Percent0 => 0,
            Sun::Percent100 => 100,
            Sun::Percent150 => 150,
            Sun::Percent300 => 300,
            Sun::Percent400 => 400,
        }
    }

    /// Solar power plant cycle in seconds. Output saturates at 300%.
    pub fn cycle(self) -> u32 {
        match self {
            Sun::Percent0 => 76,
            Sun::Percent100 => 59,
            Sun::Percent150 => 53,
            Sun::Percent300 | Sun::Percent400 => 45,
        }
    }
}

impl TryFrom<u32> for Sun {
    type Error = CalcError;

    fn try_from(percent: u32) -> Result<Self, Self::Error> {
        Sun::ALL
            .into_iter()
            .find(|sun| sun.percent() == percent)
            .ok_or(CalcError::UnknownSunPower { percent })
    }
}

impl fmt::Display for Sun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Key of a sector inside the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectorId(pub String);

impl SectorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectorId {
    fn from(id: &str) -> Self {
        SectorId(id.to_string())
    }
}

impl From<String> for SectorId {
    fn from(id: String) -> Self {
        SectorId(id)
    }
}

impl Borrow<str> for SectorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node of the sector network. `x`/`y` only place the sector on the map;
/// connectivity comes exclusively from the four neighbour slots, which may
/// be one-way.
#[derive(Debug, Clone)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub race: Race,
    pub suns: Sun,
    pub north: Option<SectorId>,
    pub south: Option<SectorId>,
    pub east: Option<SectorId>,
    pub west: Option<SectorId>,
}

impl Sector {
    pub fn new(id: &str, name: &str, x: i32, y: i32, race: Race, suns: Sun) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            x,
            y,
            race,
            suns,
            north: None,
            south: None,
            east: None,
            west: None,
        }
    }

    /// Outgoing links in north, south, east, west order
    pub fn neighbors(&self) -> impl Iterator<Item = &SectorId> {
        [&self.north, &self.south, &self.east, &self.west]
            .into_iter()
            .flatten()
    }
}

/// How a factory's real cycle and output depend on its environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductionKind {
    Ordinary,
    SiliconMine,
    OreMine,
    IceMine,
    SolarPowerPlant,
}

impl ProductionKind {
    pub fn classify(ware: &Ware) -> Self {
        match ware.id.as_str() {
            SILICON_WAFERS => ProductionKind::SiliconMine,
            ORE => ProductionKind::OreMine,
            ICE => ProductionKind::IceMine,
            ENERGY_CELLS => ProductionKind::SolarPowerPlant,
            _ => ProductionKind::Ordinary,
        }
    }
}

/// A factory type as defined by the static game data.
///
/// Base cycle, product and resources already reflect the factory size.
/// The production kind is derived from the product once, on construction.
#[derive(Debug, Clone)]
pub struct Factory {
    id: String,
    name: String,
    size: FactorySize,
    race: Race,
    cycle: u32,
    product: Product,
    resources: Vec<Product>,
    price: u32,
    volume: u32,
    capacities: Vec<Capacity>,
    manufacturers: Vec<SectorId>,
    kind: ProductionKind,
}

impl Factory {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        size: FactorySize,
        race: Race,
        cycle: u32,
        product: Product,
    ) -> Self {
        let kind = ProductionKind::classify(&product.ware);
        Self {
            id: id.into(),
            name: name.into(),
            size,
            race,
            cycle,
            product,
            resources: Vec::new(),
            price: 0,
            volume: 0,
            capacities: Vec::new(),
            manufacturers: Vec::new(),
            kind,
        }
    }

    pub fn with_resources(mut self, resources: Vec<Product>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_price(mut self, price: u32) -> Self {
        self.price = price;
        self
    }

    pub fn with_volume(mut self, volume: u32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_capacities(mut self, capacities: Vec<Capacity>) -> Self {
        self.capacities = capacities;
        self
    }

    pub fn with_manufacturers(mut self, manufacturers: Vec<SectorId>) -> Self {
        self.manufacturers = manufacturers;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, e.g. "Silicon Mine M"
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> FactorySize {
        self.size
    }

    pub fn race(&self) -> Race {
        self.race
    }

    /// Base production cycle in seconds
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Product per base cycle
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Resources consumed per base cycle
    pub fn resources(&self) -> &[Product] {
        &self.resources
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    pub fn capacities(&self) -> &[Capacity] {
        &self.capacities
    }

    /// Sectors where this factory can be bought, in catalog order
    pub fn manufacturers(&self) -> &[SectorId] {
        &self.manufacturers
    }

    pub fn kind(&self) -> ProductionKind {
        self.kind
    }

    pub fn is_mine(&self) -> bool {
        self.is_silicon_mine() || self.is_ore_mine() || self.is_ice_mine()
    }

    pub fn is_silicon_mine(&self) -> bool {
        self.kind == ProductionKind::SiliconMine
    }

    pub fn is_ore_mine(&self) -> bool {
        self.kind == ProductionKind::OreMine
    }

    pub fn is_ice_mine(&self) -> bool {
        self.kind == ProductionKind::IceMine
    }

    pub fn is_solar_power_plant(&self) -> bool {
        self.kind == ProductionKind::SolarPowerPlant
    }

    /// Ordering used to list factories: size variants of the same factory
    /// type sort by size, everything else by name and then race.
    pub fn canonical_cmp(&self, other: &Factory) -> Ordering {
        let mut result = Ordering::Equal;
        if self.id != other.id
            && self.product.ware == other.product.ware
            && name_stem(&self.name) == name_stem(&other.name)
        {
            result = self.size.cmp(&other.size);
        }
        result
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.race.cmp(&other.race))
    }
}

/// Name without its trailing size token
fn name_stem(name: &str) -> &str {
    match name.rfind(' ') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

impl PartialEq for Factory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Factory {}

impl Hash for Factory {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Factory {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Not transitive when names interleave across wares: "Mine M" < "Mine L"
// by size, "Mine L" < "Mine Lz" and "Mine Lz" < "Mine M" by name. The
// order of `Catalog::factories()` and `db::list_factories` is unspecified
// for such sets, and `slice::sort` may panic on them.
impl Ord for Factory {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_cmp(other)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Display for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ware(id: &str) -> Ware {
        Ware::new(id, id)
    }

    fn factory(id: &str, name: &str, size: FactorySize, race: Race, ware_id: &str) -> Factory {
        Factory::new(id, name, size, race, 60, Product::new(ware(ware_id), 1.0))
    }

    fn silicon_mine(id: &str, size: FactorySize) -> Factory {
        let name = format!("Silicon Mine {}", size);
        factory(id, &name, size, Race::Teladi, SILICON_WAFERS)
    }

    fn crystal_fab(id: &str, name: &str, race: Race) -> Factory {
        factory(id, name, FactorySize::M, race, "crystals")
    }

    #[test]
    fn classification_comes_from_product_ware() {
        let mine = silicon_mine("silicon-teladi-m", FactorySize::M);
        assert!(mine.is_mine());
        assert!(mine.is_silicon_mine());
        assert!(!mine.is_solar_power_plant());

        let ice = factory("ice-terran-m", "Ice Mine M", FactorySize::M, Race::Terran, ICE);
        assert!(ice.is_mine() && ice.is_ice_mine());

        let plant = factory(
            "spp-boron-l",
            "Solar Power Plant L",
            FactorySize::L,
            Race::Boron,
            ENERGY_CELLS,
        );
        assert_eq!(plant.kind(), ProductionKind::SolarPowerPlant);
        assert!(!plant.is_mine());

        let fab = crystal_fab("crystal-argon-m", "Crystal Fab M", Race::Argon);
        assert_eq!(fab.kind(), ProductionKind::Ordinary);
        assert!(!fab.is_mine() && !fab.is_solar_power_plant());
    }

    #[test]
    fn size_variants_sort_by_size_not_name() {
        let m = silicon_mine("silicon-teladi-m", FactorySize::M);
        let l = silicon_mine("silicon-teladi-l", FactorySize::L);
        let xl = silicon_mine("silicon-teladi-xl", FactorySize::XL);

        // By name alone "L" < "M" < "XL"; the size rule wins.
        let mut all = vec![xl.clone(), l.clone(), m.clone()];
        all.sort();
        assert_eq!(all, vec![m, l, xl]);
    }

    #[test]
    fn different_wares_sort_by_name_then_race() {
        let crystal_argon = crystal_fab("crystal-argon-m", "Crystal Fab M", Race::Argon);
        let crystal_boron = crystal_fab("crystal-boron-m", "Crystal Fab M", Race::Boron);
        let cattle =
            factory("cattle-argon-l", "Cattle Ranch L", FactorySize::L, Race::Argon, "meatsteak");

        assert_eq!(cattle.canonical_cmp(&crystal_argon), Ordering::Less);
        assert_eq!(crystal_argon.canonical_cmp(&crystal_boron), Ordering::Less);
    }

    #[test]
    fn same_ware_with_different_stem_sorts_by_name() {
        let big = factory(
            "spp-boron-xl",
            "Solar Power Plant XL",
            FactorySize::XL,
            Race::Boron,
            ENERGY_CELLS,
        );
        let cells =
            factory("cells-argon-s", "Cell Plant S", FactorySize::S, Race::Argon, ENERGY_CELLS);
        assert_eq!(cells.canonical_cmp(&big), Ordering::Less);
    }

    #[test]
    fn interleaved_names_across_wares_do_not_order_transitively() {
        let a = factory("a", "Mine M", FactorySize::M, Race::Argon, "w");
        let b = factory("b", "Mine L", FactorySize::L, Race::Argon, "w");
        let c = factory("c", "Mine Lz", FactorySize::M, Race::Argon, "v");

        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(b.cmp(&c), Ordering::Less);
        assert_eq!(c.cmp(&a), Ordering::Less);
    }

    #[test]
    fn equality_is_by_id() {
        let a = crystal_fab("crystal-argon-m", "Crystal Fab M", Race::Argon);
        let renamed =
            factory("crystal-argon-m", "Kristallfabrik M", FactorySize::L, Race::Boron, "other");
        assert_eq!(a, renamed);
        assert_ne!(a, crystal_fab("crystal-argon-l", "Crystal Fab M", Race::Argon));
    }

    #[test]
    fn race_colors_are_distinct() {
        let colors: std::collections::HashSet<_> = Race::ALL.iter().map(|r| r.color()).collect();
        assert_eq!(colors.len(), Race::ALL.len());
        assert_eq!(Race::ALL.len(), 13);
        assert_eq!(Race::Argon.color(), (0x00, 0x66, 0xcc));
    }

    #[test]
    fn sun_presets_are_the_only_valid_percentages() {
        assert_eq!(Sun::try_from(150), Ok(Sun::Percent150));
        assert_eq!(Sun::try_from(125), Err(CalcError::UnknownSunPower { percent: 125 }));
        assert_eq!(Sun::default().percent(), 100);
        assert_eq!(Sun::Percent400.cycle(), Sun::Percent300.cycle());
    }

    #[test]
    fn parses_race_and_size() {
        assert_eq!("Teladi".parse::<Race>(), Ok(Race::Teladi));
        assert!("vulcan".parse::<Race>().is_err());
        assert_eq!("xl".parse::<FactorySize>(), Ok(FactorySize::XL));
        assert!(FactorySize::S < FactorySize::XL);
    }

    #[test]
    fn neighbors_skip_empty_slots() {
        let mut sector =
            Sector::new("argon-prime", "Argon Prime", 3, 2, Race::Argon, Sun::Percent100);
        sector.east = Some("home-of-light".into());
        sector.south = Some("the-wall".into());
        let ids: Vec<&str> = sector.neighbors().map(SectorId::as_str).collect();
        assert_eq!(ids, vec!["the-wall", "home-of-light"]);
    }
}
