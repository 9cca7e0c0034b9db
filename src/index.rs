//! The published year/phase index for every school.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::ordered::OrderedMap;

/// One published phase of an admission year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseLink {
    pub name: String,
    pub link: String,
}

/// `school → year → phases`, phases in published order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    pub schools: HashMap<String, OrderedMap<String, Vec<PhaseLink>>>,
}

impl Index {
    pub fn school_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Years known for `school`, ascending. `None` if the school is unknown.
    pub fn years(&self, school: &str) -> Option<Vec<u16>> {
        let years = self.schools.get(school)?;
        let mut parsed: Vec<u16> = years
            .keys()
            .filter_map(|key| match key.trim().parse::<u16>() {
                Ok(year) => Some(year),
                Err(_) => {
                    warn!(school, key = %key, "Skipping non-numeric year in index");
                    None
                }
            })
            .collect();
        parsed.sort_unstable();
        parsed.dedup();
        Some(parsed)
    }

    /// Phases published for `school` in `year`, in index order.
    pub fn phases(&self, school: &str, year: u16) -> Option<&[PhaseLink]> {
        self.schools
            .get(school)?
            .iter()
            .find(|(key, _)| key.trim().parse::<u16>().ok() == Some(year))
            .map(|(_, phases)| phases.as_slice())
    }
}
