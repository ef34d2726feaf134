//! Layout tables that are presented through a paged model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Stations,
    Segments,
    Lines,
    RsOwners,
    RsModels,
    Rollingstock,
}

impl TableKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Stations => "Stations",
            Self::Segments => "Railway Segments",
            Self::Lines => "Lines",
            Self::RsOwners => "Rollingstock Owners",
            Self::RsModels => "Rollingstock Models",
            Self::Rollingstock => "Rollingstock",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::Stations,
            Self::Segments,
            Self::Lines,
            Self::RsOwners,
            Self::RsModels,
            Self::Rollingstock,
        ]
    }
}

impl std::str::FromStr for TableKind {
    type Err = crate::MrtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "stations" | "station" => Ok(Self::Stations),
            "segments" | "segment" | "railway_segments" => Ok(Self::Segments),
            "lines" | "line" => Ok(Self::Lines),
            "owners" | "owner" | "rs_owners" => Ok(Self::RsOwners),
            "models" | "model" | "rs_models" => Ok(Self::RsModels),
            "rollingstock" | "rs" | "rs_list" => Ok(Self::Rollingstock),
            other => Err(crate::MrtpError::NotFound(format!("unknown table '{}'", other))),
        }
    }
}
