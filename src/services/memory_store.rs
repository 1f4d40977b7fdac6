//! Хранилище в памяти для тестов: умеет отказывать заданное число раз и отвечать с задержкой.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Apartment, Block, NewApartment, NewResident, Resident};
use crate::services::occupancy::OccupancyKey;
use crate::services::store::ResidentStore;
use crate::utils::validators::block_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListResidents,
    CreateResident,
    BlockExists,
    ApartmentExists,
    FindResident,
    ResolveBlock,
    CreateApartments,
}

#[derive(Default)]
struct Inner {
    blocks: Vec<Block>,
    apartments: Vec<Apartment>,
    residents: Vec<Resident>,
    fail_next: HashMap<StoreOp, u32>,
    delays: HashMap<StoreOp, Duration>,
    calls: HashMap<StoreOp, u32>,
    invalidations: u32,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(self, name: &str, numbers: &[&str]) -> Self {
        {
            let mut inner = self.lock();
            let block = Block {
                id: Uuid::new_v4(),
                name: block_label(name),
                created_at: Utc::now(),
            };
            for number in numbers {
                inner.apartments.push(Apartment {
                    id: Uuid::new_v4(),
                    block_id: block.id,
                    number: number.to_string(),
                    floor: 1,
                    created_at: Utc::now(),
                });
            }
            inner.blocks.push(block);
        }
        self
    }

    pub fn with_resident(self, full_name: &str, block: &str, unit: &str) -> Self {
        self.lock().residents.push(Resident {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            phone_number: None,
            block_number: block.to_string(),
            apartment_number: unit.to_string(),
            move_in_month: None,
            move_in_year: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        self
    }

    /// Следующие `times` вызовов `op` завершатся временной ошибкой
    pub fn fail_next(&self, op: StoreOp, times: u32) {
        self.lock().fail_next.insert(op, times);
    }

    pub fn delay(&self, op: StoreOp, delay: Duration) {
        self.lock().delays.insert(op, delay);
    }

    pub fn calls(&self, op: StoreOp) -> u32 {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn residents(&self) -> Vec<Resident> {
        self.lock().residents.clone()
    }

    pub fn apartment_numbers(&self, block: &str) -> Vec<String> {
        let inner = self.lock();
        let label = block_label(block);
        let Some(block) = inner.blocks.iter().find(|b| b.name == label) else {
            return Vec::new();
        };
        inner
            .apartments
            .iter()
            .filter(|a| a.block_id == block.id)
            .map(|a| a.number.clone())
            .collect()
    }

    pub fn invalidations(&self) -> u32 {
        self.lock().invalidations
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn enter(&self, op: StoreOp) -> AppResult<()> {
        let (delay, fail) = {
            let mut inner = self.lock();
            *inner.calls.entry(op).or_default() += 1;
            let fail = match inner.fail_next.get_mut(&op) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    true
                }
                _ => false,
            };
            (inner.delays.get(&op).copied(), fail)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(AppError::Unavailable(format!("{:?} failed", op)));
        }
        Ok(())
    }

    fn block_id(inner: &Inner, block: &str) -> Option<Uuid> {
        let label = block_label(block);
        inner
            .blocks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(&label))
            .map(|b| b.id)
    }
}

#[axum::async_trait]
impl ResidentStore for MemoryStore {
    async fn list_residents(&self) -> AppResult<Vec<Resident>> {
        self.enter(StoreOp::ListResidents).await?;
        Ok(self.residents())
    }

    async fn create_resident(&self, resident: &NewResident) -> AppResult<Resident> {
        self.enter(StoreOp::CreateResident).await?;
        let key = OccupancyKey::new(&resident.block_number, &resident.apartment_number);
        let mut inner = self.lock();
        if inner
            .residents
            .iter()
            .any(|r| OccupancyKey::new(&r.block_number, &r.apartment_number) == key)
        {
            return Err(AppError::Conflict(format!("{} is already occupied", key)));
        }
        let created = Resident {
            id: Uuid::new_v4(),
            full_name: resident.full_name.clone(),
            phone_number: resident.phone_number.clone(),
            block_number: key.block,
            apartment_number: key.unit,
            move_in_month: Some(resident.move_in_month.clone()),
            move_in_year: Some(resident.move_in_year.clone()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        inner.residents.push(created.clone());
        Ok(created)
    }

    async fn block_exists(&self, block: &str) -> AppResult<bool> {
        self.enter(StoreOp::BlockExists).await?;
        Ok(Self::block_id(&self.lock(), block).is_some())
    }

    async fn apartment_exists(&self, block: &str, number: &str) -> AppResult<bool> {
        self.enter(StoreOp::ApartmentExists).await?;
        let inner = self.lock();
        let Some(block_id) = Self::block_id(&inner, block) else {
            return Ok(false);
        };
        Ok(inner
            .apartments
            .iter()
            .any(|a| a.block_id == block_id && a.number == number.trim()))
    }

    async fn find_resident_by_unit(&self, block: &str, number: &str) -> AppResult<Option<String>> {
        self.enter(StoreOp::FindResident).await?;
        let key = OccupancyKey::new(block, number);
        Ok(self
            .lock()
            .residents
            .iter()
            .find(|r| OccupancyKey::new(&r.block_number, &r.apartment_number) == key)
            .map(|r| r.full_name.clone()))
    }

    async fn resolve_block_id(&self, block: &str) -> AppResult<Option<Uuid>> {
        self.enter(StoreOp::ResolveBlock).await?;
        Ok(Self::block_id(&self.lock(), block))
    }

    async fn create_apartments(
        &self,
        block_id: Uuid,
        apartments: &[NewApartment],
    ) -> AppResult<Vec<Apartment>> {
        self.enter(StoreOp::CreateApartments).await?;
        let mut inner = self.lock();
        let mut created = Vec::new();
        for apartment in apartments {
            let exists = inner
                .apartments
                .iter()
                .any(|a| a.block_id == block_id && a.number == apartment.number);
            if exists {
                continue;
            }
            let row = Apartment {
                id: Uuid::new_v4(),
                block_id,
                number: apartment.number.clone(),
                floor: apartment.floor,
                created_at: Utc::now(),
            };
            inner.apartments.push(row.clone());
            created.push(row);
        }
        Ok(created)
    }

    fn invalidate_cache(&self) {
        self.lock().invalidations += 1;
    }
}
