//! Read-only catalog of wares, sectors and factories plus the sector
//! network queries

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::CalcError;
use crate::models::{Factory, FactorySize, Race, Sector, SectorId, Ware};

/// Decides which races' shipyards are excluded from manufacturer searches
pub trait RaceFilter {
    fn is_race_ignored(&self, race: Race) -> bool;
}

impl RaceFilter for [Race] {
    fn is_race_ignored(&self, race: Race) -> bool {
        self.contains(&race)
    }
}

impl RaceFilter for Vec<Race> {
    fn is_race_ignored(&self, race: Race) -> bool {
        self.contains(&race)
    }
}

impl RaceFilter for HashSet<Race> {
    fn is_race_ignored(&self, race: Race) -> bool {
        self.contains(&race)
    }
}

impl RaceFilter for BTreeSet<Race> {
    fn is_race_ignored(&self, race: Race) -> bool {
        self.contains(&race)
    }
}

impl<F> RaceFilter for F
where
    F: Fn(Race) -> bool,
{
    fn is_race_ignored(&self, race: Race) -> bool {
        self(race)
    }
}

/// The fully linked game data. Built once, never mutated afterwards.
#[derive(Debug, Default)]
pub struct Catalog {
    wares: HashMap<String, Ware>,
    sectors: HashMap<SectorId, Sector>,
    factories: HashMap<String, Factory>,
}

impl Catalog {
    /// Build a catalog, rejecting neighbour or manufacturer links that do
    /// not resolve and factories whose wares are unknown.
    pub fn new(
        wares: Vec<Ware>,
        sectors: Vec<Sector>,
        factories: Vec<Factory>,
    ) -> Result<Self, CalcError> {
        let catalog = Catalog {
            wares: wares.into_iter().map(|w| (w.id.clone(), w)).collect(),
            sectors: sectors.into_iter().map(|s| (s.id.clone(), s)).collect(),
            factories: factories
                .into_iter()
                .map(|f| (f.id().to_string(), f))
                .collect(),
        };
        catalog.validate()?;
        debug!(
            wares = catalog.wares.len(),
            sectors = catalog.sectors.len(),
            factories = catalog.factories.len(),
            "catalog built"
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CalcError> {
        for sector in self.sectors.values() {
            for neighbor in sector.neighbors() {
                if !self.sectors.contains_key(neighbor) {
                    return Err(CalcError::DanglingReference {
                        owner: format!("sector '{}'", sector.id),
                        kind: "sector",
                        target: neighbor.to_string(),
                    });
                }
            }
        }

        for factory in self.factories.values() {
            let owner = || format!("factory '{}'", factory.id());
            let wares = std::iter::once(&factory.product().ware)
                .chain(factory.resources().iter().map(|r| &r.ware))
                .chain(factory.capacities().iter().map(|c| &c.ware));
            for ware in wares {
                if !self.wares.contains_key(&ware.id) {
                    return Err(CalcError::DanglingReference {
                        owner: owner(),
                        kind: "ware",
                        target: ware.id.clone(),
                    });
                }
            }
            for manufacturer in factory.manufacturers() {
                if !self.sectors.contains_key(manufacturer) {
                    return Err(CalcError::DanglingReference {
                        owner: owner(),
                        kind: "sector",
                        target: manufacturer.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn ware(&self, id: &str) -> Result<&Ware, CalcError> {
        self.wares
            .get(id)
            .ok_or_else(|| CalcError::UnknownWare(id.to_string()))
    }

    pub fn sector(&self, id: &str) -> Result<&Sector, CalcError> {
        self.sectors
            .get(id)
            .ok_or_else(|| CalcError::UnknownSector(id.into()))
    }

    pub fn factory(&self, id: &str) -> Result<&Factory, CalcError> {
        self.factories
            .get(id)
            .ok_or_else(|| CalcError::UnknownFactory(id.to_string()))
    }

    /// Sector displayed at the given map position
    pub fn sector_at(&self, x: i32, y: i32) -> Option<&Sector> {
        self.sectors.values().find(|s| s.x == x && s.y == y)
    }

    /// All sectors sorted by id
    pub fn sectors(&self) -> Vec<&Sector> {
        let mut sectors: Vec<_> = self.sectors.values().collect();
        sectors.sort_by(|a, b| a.id.cmp(&b.id));
        sectors
    }

    /// All factories in canonical order
    pub fn factories(&self) -> Vec<&Factory> {
        let mut factories: Vec<_> = self.factories.values().collect();
        factories.sort();
        factories
    }

    /// Factories producing `ware`, in canonical order
    pub fn factories_producing(&self, ware: &Ware) -> Vec<&Factory> {
        let mut factories: Vec<_> = self
            .factories
            .values()
            .filter(|f| &f.product().ware == ware)
            .collect();
        factories.sort();
        factories
    }

    /// Cheapest factory of the given size producing `ware`. Among equally
    /// priced factories the first in canonical order wins.
    pub fn cheapest_factory(&self, ware: &Ware, size: FactorySize) -> Option<&Factory> {
        self.factories_producing(ware)
            .into_iter()
            .filter(|f| f.size() == size)
            .fold(None, |cheapest: Option<&Factory>, f| match cheapest {
                Some(c) if c.price() <= f.price() => Some(c),
                _ => Some(f),
            })
    }

    /// Number of jumps on the shortest path from `from` to `to`, following
    /// neighbour links in their own direction only.
    pub fn distance(&self, from: &SectorId, to: &SectorId) -> Result<u32, CalcError> {
        let start = self.sector(from.as_str())?;
        self.sector(to.as_str())?;
        if from == to {
            return Ok(0);
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(&start.id);
        queue.push_back((start, 0u32));

        while let Some((sector, jumps)) = queue.pop_front() {
            for neighbor in sector.neighbors() {
                if neighbor == to {
                    return Ok(jumps + 1);
                }
                if visited.insert(neighbor) {
                    queue.push_back((self.sector(neighbor.as_str())?, jumps + 1));
                }
            }
        }

        Err(CalcError::Unreachable {
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Manufacturer sector of `factory` closest to `source`.
    ///
    /// Sectors owned by races the filter ignores are skipped unless
    /// `all_races` is set; when that leaves nothing, the search is repeated
    /// for all races. Manufacturers that cannot be reached from `source` are
    /// never candidates. Ties go to the earlier manufacturer in the list.
    pub fn nearest_manufacturer<F>(
        &self,
        source: &SectorId,
        factory: &Factory,
        filter: &F,
        all_races: bool,
    ) -> Result<Option<&Sector>, CalcError>
    where
        F: RaceFilter + ?Sized,
    {
        let mut nearest: Option<(&Sector, u32)> = None;

        for id in factory.manufacturers() {
            let manufacturer = self.sector(id.as_str())?;
            if !all_races && filter.is_race_ignored(manufacturer.race) {
                continue;
            }
            let distance = match self.distance(source, id) {
                Ok(distance) => distance,
                Err(CalcError::Unreachable { .. }) => {
                    debug!(%source, manufacturer = %id, "manufacturer not reachable");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((manufacturer, distance));
            }
        }

        if nearest.is_none() && !all_races && !factory.manufacturers().is_empty() {
            debug!(
                factory = factory.id(),
                %source,
                "no manufacturer of an allowed race, retrying with all races"
            );
            return self.nearest_manufacturer(source, factory, filter, true);
        }

        Ok(nearest.map(|(sector, _)| sector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, Sun, SILICON_WAFERS};

    fn sector(id: &str, race: Race, x: i32, y: i32) -> Sector {
        Sector::new(id, id, x, y, race, Sun::Percent100)
    }

    fn link(from: &mut Sector, slot: &str, to: &str) {
        let target = Some(SectorId::from(to));
        match slot {
            "north" => from.north = target,
            "south" => from.south = target,
            "east" => from.east = target,
            _ => from.west = target,
        }
    }

    /// a <-> b <-> c, c -> d one way, d -> a one way, e isolated.
    /// The display coordinates deliberately disagree with the links.
    fn network() -> Vec<Sector> {
        let mut a = sector("a", Race::Argon, 0, 0);
        let mut b = sector("b", Race::Boron, 5, 5);
        let mut c = sector("c", Race::Teladi, 1, 0);
        let mut d = sector("d", Race::Split, 0, 1);
        let e = sector("e", Race::Xenon, 0, 2);
        link(&mut a, "east", "b");
        link(&mut b, "west", "a");
        link(&mut b, "east", "c");
        link(&mut c, "west", "b");
        link(&mut c, "south", "d");
        link(&mut d, "north", "a");
        vec![a, b, c, d, e]
    }

    fn silicon() -> Ware {
        Ware::new(SILICON_WAFERS, "Silicon Wafers")
    }

    fn mine(id: &str, race: Race, price: u32, manufacturers: &[&str]) -> Factory {
        Factory::new(id, "Silicon Mine M", FactorySize::M, race, 600, Product::new(silicon(), 4.0))
            .with_price(price)
            .with_manufacturers(manufacturers.iter().map(|&m| m.into()).collect())
    }

    fn catalog(factories: Vec<Factory>) -> Catalog {
        Catalog::new(vec![silicon()], network(), factories).unwrap()
    }

    #[test]
    fn distance_to_self_is_zero() {
        let catalog = catalog(vec![]);
        assert_eq!(catalog.distance(&"a".into(), &"a".into()), Ok(0));
        assert_eq!(catalog.distance(&"e".into(), &"e".into()), Ok(0));
    }

    #[test]
    fn distance_follows_links_not_coordinates() {
        let catalog = catalog(vec![]);
        // c is drawn next to a but two jumps away
        assert_eq!(catalog.distance(&"a".into(), &"c".into()), Ok(2));
        assert_eq!(catalog.distance(&"a".into(), &"d".into()), Ok(3));
    }

    #[test]
    fn one_way_links_make_distance_asymmetric() {
        let catalog = catalog(vec![]);
        assert_eq!(catalog.distance(&"d".into(), &"a".into()), Ok(1));
        assert_eq!(catalog.distance(&"a".into(), &"d".into()), Ok(3));
    }

    #[test]
    fn reciprocal_links_give_symmetric_distance() {
        let catalog = catalog(vec![]);
        assert_eq!(
            catalog.distance(&"a".into(), &"b".into()),
            catalog.distance(&"b".into(), &"a".into())
        );
    }

    #[test]
    fn unreachable_sector_is_an_error() {
        let catalog = catalog(vec![]);
        assert_eq!(
            catalog.distance(&"a".into(), &"e".into()),
            Err(CalcError::Unreachable {
                from: "a".into(),
                to: "e".into()
            })
        );
        assert!(matches!(
            catalog.distance(&"a".into(), &"nowhere".into()),
            Err(CalcError::UnknownSector(_))
        ));
    }

    #[test]
    fn rejects_dangling_links() {
        let mut sectors = network();
        sectors[4].north = Some("missing".into());
        let err = Catalog::new(vec![silicon()], sectors, vec![]).unwrap_err();
        assert!(matches!(err, CalcError::DanglingReference { kind: "sector", .. }));

        let factories = vec![mine("m", Race::Teladi, 1, &["a"])];
        let err = Catalog::new(vec![], network(), factories).unwrap_err();
        assert!(matches!(err, CalcError::DanglingReference { kind: "ware", .. }));

        let factories = vec![mine("m", Race::Teladi, 1, &["zz"])];
        let err = Catalog::new(vec![silicon()], network(), factories).unwrap_err();
        assert!(matches!(err, CalcError::DanglingReference { kind: "sector", .. }));
    }

    #[test]
    fn nearest_manufacturer_picks_closest() {
        let catalog = catalog(vec![mine("m", Race::Teladi, 1, &["c", "b", "d"])]);
        let factory = catalog.factory("m").unwrap();
        let none: &[Race] = &[];
        let nearest = catalog.nearest_manufacturer(&"a".into(), factory, none, false).unwrap();
        assert_eq!(nearest.map(|s| s.id.as_str()), Some("b"));
    }

    #[test]
    fn nearest_manufacturer_ties_go_to_first_listed() {
        let catalog = catalog(vec![mine("m", Race::Teladi, 1, &["c", "a"])]);
        let factory = catalog.factory("m").unwrap();
        // both one jump away from b
        let nearest = catalog
            .nearest_manufacturer(&"b".into(), factory, &Vec::<Race>::new(), false)
            .unwrap();
        assert_eq!(nearest.map(|s| s.id.as_str()), Some("c"));
    }

    #[test]
    fn ignored_races_are_skipped() {
        let catalog = catalog(vec![mine("m", Race::Teladi, 1, &["b", "c"])]);
        let factory = catalog.factory("m").unwrap();
        let ignored = vec![Race::Boron];
        let nearest = catalog.nearest_manufacturer(&"a".into(), factory, &ignored, false).unwrap();
        assert_eq!(nearest.map(|s| s.id.as_str()), Some("c"));

        let nearest = catalog.nearest_manufacturer(&"a".into(), factory, &ignored, true).unwrap();
        assert_eq!(nearest.map(|s| s.id.as_str()), Some("b"));
    }

    #[test]
    fn falls_back_to_all_races_when_every_seller_is_ignored() {
        let catalog = catalog(vec![mine("m", Race::Teladi, 1, &["c"])]);
        let factory = catalog.factory("m").unwrap();
        let only_teladi_ignored = |race: Race| race == Race::Teladi;
        let nearest = catalog
            .nearest_manufacturer(&"a".into(), factory, &only_teladi_ignored, false)
            .unwrap();
        assert_eq!(nearest.map(|s| s.id.as_str()), Some("c"));
    }

    #[test]
    fn no_manufacturers_means_none() {
        let catalog = catalog(vec![mine("m", Race::Teladi, 1, &[])]);
        let factory = catalog.factory("m").unwrap();
        let everyone: HashSet<Race> = Race::ALL.into_iter().collect();
        let nearest = catalog.nearest_manufacturer(&"a".into(), factory, &everyone, false);
        assert!(nearest.unwrap().is_none());
    }

    #[test]
    fn unreachable_manufacturers_are_not_candidates() {
        let catalog = catalog(vec![mine("m", Race::Xenon, 1, &["e"])]);
        let factory = catalog.factory("m").unwrap();
        let none: &[Race] = &[];
        let nearest = catalog.nearest_manufacturer(&"a".into(), factory, none, false);
        assert!(nearest.unwrap().is_none());
    }

    #[test]
    fn cheapest_factory_by_size() {
        let catalog = catalog(vec![
            mine("argon", Race::Argon, 900, &["a"]),
            mine("teladi", Race::Teladi, 700, &["c"]),
            mine("boron", Race::Boron, 700, &["b"]),
        ]);
        let cheapest = catalog.cheapest_factory(&silicon(), FactorySize::M).unwrap();
        // equal price, Boron sorts before Teladi
        assert_eq!(cheapest.id(), "boron");
        assert!(catalog.cheapest_factory(&silicon(), FactorySize::L).is_none());
    }

    #[test]
    fn catalog_can_be_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }

    #[test]
    fn lookups() {
        let catalog = catalog(vec![]);
        assert_eq!(catalog.sector_at(1, 0).map(|s| s.id.as_str()), Some("c"));
        assert!(catalog.sector_at(9, 9).is_none());
        assert!(matches!(catalog.factory("x"), Err(CalcError::UnknownFactory(_))));
        assert!(matches!(catalog.ware("x"), Err(CalcError::UnknownWare(_))));
        assert_eq!(catalog.sectors().len(), 5);
    }
}
