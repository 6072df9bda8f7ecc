//! Errors raised by the calculation engine

use crate::models::SectorId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcError {
    /// No chain of neighbour links leads from `from` to `to`.
    #[error("sector '{to}' is not reachable from '{from}'")]
    Unreachable { from: SectorId, to: SectorId },

    /// Sun power that is not one of the defined presets.
    #[error("no sun preset for {percent}% sun power")]
    UnknownSunPower { percent: u32 },

    #[error("sector '{0}' not found")]
    UnknownSector(SectorId),

    #[error("factory '{0}' not found")]
    UnknownFactory(String),

    #[error("ware '{0}' not found")]
    UnknownWare(String),

    #[error("unknown race '{0}'")]
    UnknownRace(String),

    #[error("unknown factory size '{0}'")]
    UnknownSize(String),

    /// A catalog record points at a sector or ware that does not exist.
    #[error("{owner} references missing {kind} '{target}'")]
    DanglingReference {
        owner: String,
        kind: &'static str,
        target: String,
    },
}
