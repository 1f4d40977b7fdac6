use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::models::Resident;
use crate::utils::validators::block_code;

/// Пара (блок, квартира), однозначно задающая жилое помещение.
/// Блок хранится кодом в верхнем регистре: "Block a" и "A" дают один ключ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccupancyKey {
    pub block: String,
    pub unit: String,
}

impl OccupancyKey {
    pub fn new(block: &str, unit: &str) -> Self {
        Self {
            block: block_code(block).to_uppercase(),
            unit: unit.trim().to_string(),
        }
    }
}

impl fmt::Display for OccupancyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block {}, Apartment {}", self.block, self.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub resident_id: Uuid,
    pub full_name: String,
}

/// Индекс занятости, строится заново из полного списка жильцов
#[derive(Debug, Default, Clone)]
pub struct OccupancyIndex {
    by_key: HashMap<OccupancyKey, Vec<Occupant>>,
}

impl OccupancyIndex {
    pub fn from_residents(residents: &[Resident]) -> Self {
        let mut by_key: HashMap<OccupancyKey, Vec<Occupant>> = HashMap::new();
        for resident in residents {
            by_key
                .entry(OccupancyKey::new(&resident.block_number, &resident.apartment_number))
                .or_default()
                .push(Occupant {
                    resident_id: resident.id,
                    full_name: resident.full_name.clone(),
                });
        }
        Self { by_key }
    }

    /// Кто занимает помещение, не считая жильца `excluding` (нужно при редактировании)
    pub fn occupant(&self, block: &str, unit: &str, excluding: Option<Uuid>) -> Option<&Occupant> {
        self.by_key
            .get(&OccupancyKey::new(block, unit))?
            .iter()
            .find(|occupant| Some(occupant.resident_id) != excluding)
    }

    pub fn is_occupied(&self, block: &str, unit: &str) -> bool {
        self.occupant(block, unit, None).is_some()
    }

    pub fn insert(&mut self, resident: &Resident) {
        self.by_key
            .entry(OccupancyKey::new(&resident.block_number, &resident.apartment_number))
            .or_default()
            .push(Occupant {
                resident_id: resident.id,
                full_name: resident.full_name.clone(),
            });
    }

    pub fn occupied_units(&self) -> usize {
        self.by_key.len()
    }
}
