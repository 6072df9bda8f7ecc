//! Production-rate model
//!
//! Turns the per-cycle figures stored on a [`Factory`] into the real cycle,
//! real product and hourly rates for a given sun power and asteroid yield.

use std::fmt;

use crate::models::{Factory, Product, ProductionKind, Sun};

/// Yield used by the per-hour convenience methods
pub const DEFAULT_YIELD: u32 = 25;

/// Yield used for the display baselines (`default_cycle` and friends)
pub const DISPLAY_YIELD: u32 = 26;

/// Mine cycles are padded up to the first multiple that leaves this window.
const CYCLE_WINDOW: f64 = 59.9;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Cycle construction shared by all mine kinds
struct MineFormula {
    base: u32,
    divisor: f64,
    floor_split: bool,
}

const SILICON_FORMULA: MineFormula = MineFormula {
    base: 2400,
    divisor: 2.0,
    floor_split: false,
};

const ORE_FORMULA: MineFormula = MineFormula {
    base: 600,
    divisor: 4.0,
    floor_split: true,
};

impl MineFormula {
    fn base_time(&self, asteroid_yield: u32) -> u32 {
        self.base / asteroid_yield.saturating_add(1) + 1
    }

    fn multiple(&self, asteroid_yield: u32) -> u32 {
        (CYCLE_WINDOW / f64::from(self.base_time(asteroid_yield))).floor() as u32 + 1
    }

    fn cycle(&self, asteroid_yield: u32) -> u32 {
        self.base_time(asteroid_yield) * self.multiple(asteroid_yield)
    }

    fn scale(&self, product: &Product, asteroid_yield: u32) -> Product {
        let multiple = f64::from(self.multiple(asteroid_yield));
        let quantity = if self.floor_split {
            multiple * (product.quantity / self.divisor).floor()
        } else {
            multiple * product.quantity / self.divisor
        };
        Product::new(product.ware.clone(), quantity)
    }
}

impl Factory {
    fn mine_formula(&self) -> Option<&'static MineFormula> {
        match self.kind() {
            ProductionKind::SiliconMine => Some(&SILICON_FORMULA),
            ProductionKind::OreMine | ProductionKind::IceMine => Some(&ORE_FORMULA),
            ProductionKind::SolarPowerPlant | ProductionKind::Ordinary => None,
        }
    }

    /// Real production cycle in seconds. Always at least one second.
    pub fn real_cycle(&self, sun: Sun, asteroid_yield: u32) -> u32 {
        if self.is_solar_power_plant() {
            return sun.cycle();
        }
        match self.mine_formula() {
            Some(formula) => formula.cycle(asteroid_yield),
            None => self.cycle(),
        }
    }

    /// Product of one real cycle
    pub fn real_product(&self, _sun: Sun, asteroid_yield: u32) -> Product {
        match self.mine_formula() {
            Some(formula) => formula.scale(self.product(), asteroid_yield),
            None => self.product().clone(),
        }
    }

    /// Resources consumed in one real cycle, in catalog order
    pub fn real_resources(&self, _sun: Sun, asteroid_yield: u32) -> Vec<Product> {
        match self.mine_formula() {
            Some(formula) => self
                .resources()
                .iter()
                .map(|resource| formula.scale(resource, asteroid_yield))
                .collect(),
            None => self.resources().to_vec(),
        }
    }

    /// Product made per hour under the given sun power and asteroid yield
    pub fn product_per_hour(&self, sun: Sun, asteroid_yield: u32) -> Product {
        let cycle = f64::from(self.real_cycle(sun, asteroid_yield));
        let product = self.real_product(sun, asteroid_yield);
        Product::new(product.ware, product.quantity * SECONDS_PER_HOUR / cycle)
    }

    /// Resources consumed per hour, in the factory's resource order
    pub fn resources_per_hour(&self, sun: Sun, asteroid_yield: u32) -> Vec<Product> {
        let cycle = f64::from(self.real_cycle(sun, asteroid_yield));
        self.real_resources(sun, asteroid_yield)
            .into_iter()
            .map(|resource| {
                Product::new(resource.ware, resource.quantity * SECONDS_PER_HOUR / cycle)
            })
            .collect()
    }

    /// Hourly product for the default sun and [`DEFAULT_YIELD`]
    pub fn product_per_hour_default(&self) -> Product {
        self.product_per_hour(Sun::default(), DEFAULT_YIELD)
    }

    /// Hourly resources for the default sun and [`DEFAULT_YIELD`]
    pub fn resources_per_hour_default(&self) -> Vec<Product> {
        self.resources_per_hour(Sun::default(), DEFAULT_YIELD)
    }

    /// Cycle shown in factory listings. Not used for any calculation.
    pub fn default_cycle(&self) -> u32 {
        self.real_cycle(Sun::default(), DISPLAY_YIELD)
    }

    pub fn default_product(&self) -> Product {
        self.real_product(Sun::default(), DISPLAY_YIELD)
    }

    pub fn default_resources(&self) -> Vec<Product> {
        self.real_resources(Sun::default(), DISPLAY_YIELD)
    }
}

/// Format a cycle as `H:MM:SS`, `M:SS` or plain seconds
pub fn format_cycle(seconds: u32) -> String {
    if seconds >= 60 * 60 {
        format!("{}:{:02}:{:02}", seconds / 3600, seconds % 3600 / 60, seconds % 60)
    } else if seconds >= 60 {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    } else {
        seconds.to_string()
    }
}

/// Production figures of one factory under fixed environment parameters
#[derive(Debug, Clone)]
pub struct FactoryReport {
    pub factory_id: String,
    pub factory_name: String,
    pub sun: Sun,
    pub asteroid_yield: u32,
    pub cycle: u32,
    pub product: Product,
    pub resources: Vec<Product>,
    pub product_per_hour: Product,
    pub resources_per_hour: Vec<Product>,
}

pub fn factory_report(factory: &Factory, sun: Sun, asteroid_yield: u32) -> FactoryReport {
    FactoryReport {
        factory_id: factory.id().to_string(),
        factory_name: factory.name().to_string(),
        sun,
        asteroid_yield,
        cycle: factory.real_cycle(sun, asteroid_yield),
        product: factory.real_product(sun, asteroid_yield),
        resources: factory.real_resources(sun, asteroid_yield),
        product_per_hour: factory.product_per_hour(sun, asteroid_yield),
        resources_per_hour: factory.resources_per_hour(sun, asteroid_yield),
    }
}

impl fmt::Display for FactoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ({}) ===", self.factory_name, self.factory_id)?;
        writeln!(f, "Suns: {}  Yield: {}", self.sun, self.asteroid_yield)?;
        writeln!(f, "Cycle: {}", format_cycle(self.cycle))?;
        writeln!(f)?;

        writeln!(f, "Per cycle:")?;
        writeln!(f, "  produces {} x {:.2}", self.product.ware.name, self.product.quantity)?;
        for resource in &self.resources {
            writeln!(f, "  consumes {} x {:.2}", resource.ware.name, resource.quantity)?;
        }
        writeln!(f)?;

        writeln!(f, "Per hour:")?;
        writeln!(
            f,
            "  produces {} x {:.0}",
            self.product_per_hour.ware.name, self.product_per_hour.quantity
        )?;
        for resource in &self.resources_per_hour {
            writeln!(f, "  consumes {} x {:.0}", resource.ware.name, resource.quantity)?;
        }

        Ok(())
    }
}
