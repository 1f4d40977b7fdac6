use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{conflict_on_unique, AppResult};
use crate::models::{Apartment, Block, NewApartment, NewResident, Resident};
use crate::services::occupancy::OccupancyKey;
use crate::services::property_cache::{PropertyCache, PropertySnapshot};

/// Хранилище, к которому обращается импорт жильцов.
/// Блок везде передаётся так, как его ввёл оператор: кодом ("A") или полным именем ("Block A").
#[axum::async_trait]
pub trait ResidentStore: Send + Sync {
    async fn list_residents(&self) -> AppResult<Vec<Resident>>;

    async fn create_resident(&self, resident: &NewResident) -> AppResult<Resident>;

    async fn block_exists(&self, block: &str) -> AppResult<bool>;

    async fn apartment_exists(&self, block: &str, number: &str) -> AppResult<bool>;

    /// Имя жильца, занимающего помещение, если оно занято
    async fn find_resident_by_unit(&self, block: &str, number: &str) -> AppResult<Option<String>>;

    async fn resolve_block_id(&self, block: &str) -> AppResult<Option<Uuid>>;

    /// Создаёт квартиры блока, уже существующие номера пропускаются
    async fn create_apartments(
        &self,
        block_id: Uuid,
        apartments: &[NewApartment],
    ) -> AppResult<Vec<Apartment>>;

    /// Сбрасывает закэшированные данные о блоках и квартирах
    fn invalidate_cache(&self);
}

pub struct PgStore {
    pool: PgPool,
    cache: Arc<PropertyCache>,
}

impl PgStore {
    pub fn new(pool: PgPool, cache: Arc<PropertyCache>) -> Self {
        Self { pool, cache }
    }

    async fn snapshot(&self) -> AppResult<Arc<PropertySnapshot>> {
        self.cache
            .get_or_load(|| async {
                let blocks = sqlx::query_as::<_, Block>("SELECT * FROM blocks ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?;
                let apartments =
                    sqlx::query_as::<_, Apartment>("SELECT * FROM apartments ORDER BY block_id, number")
                        .fetch_all(&self.pool)
                        .await?;
                Ok(PropertySnapshot { blocks, apartments })
            })
            .await
    }
}

#[axum::async_trait]
impl ResidentStore for PgStore {
    async fn list_residents(&self) -> AppResult<Vec<Resident>> {
        let residents = sqlx::query_as::<_, Resident>(
            "SELECT * FROM residents ORDER BY block_number, apartment_number",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(residents)
    }

    async fn create_resident(&self, resident: &NewResident) -> AppResult<Resident> {
        let key = OccupancyKey::new(&resident.block_number, &resident.apartment_number);
        let created = sqlx::query_as::<_, Resident>(
            r#"
            INSERT INTO residents
                (full_name, phone_number, block_number, apartment_number, move_in_month, move_in_year)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&resident.full_name)
        .bind(&resident.phone_number)
        .bind(&key.block)
        .bind(&key.unit)
        .bind(&resident.move_in_month)
        .bind(&resident.move_in_year)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique(format!("{} is already occupied", key)))?;

        Ok(created)
    }

    async fn block_exists(&self, block: &str) -> AppResult<bool> {
        Ok(self.snapshot().await?.block_by_name(block).is_some())
    }

    async fn apartment_exists(&self, block: &str, number: &str) -> AppResult<bool> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot
            .block_by_name(block)
            .map(|b| snapshot.has_apartment(b.id, number))
            .unwrap_or(false))
    }

    async fn find_resident_by_unit(&self, block: &str, number: &str) -> AppResult<Option<String>> {
        let key = OccupancyKey::new(block, number);
        let name: Option<(String,)> = sqlx::query_as(
            "SELECT full_name FROM residents WHERE block_number = $1 AND apartment_number = $2 LIMIT 1",
        )
        .bind(&key.block)
        .bind(&key.unit)
        .fetch_optional(&self.pool)
        .await?;

        Ok(name.map(|(full_name,)| full_name))
    }

    async fn resolve_block_id(&self, block: &str) -> AppResult<Option<Uuid>> {
        Ok(self.snapshot().await?.block_by_name(block).map(|b| b.id))
    }

    async fn create_apartments(
        &self,
        block_id: Uuid,
        apartments: &[NewApartment],
    ) -> AppResult<Vec<Apartment>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(apartments.len());

        for apartment in apartments {
            let row = sqlx::query_as::<_, Apartment>(
                r#"
                INSERT INTO apartments (block_id, number, floor)
                VALUES ($1, $2, $3)
                ON CONFLICT (block_id, number) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(block_id)
            .bind(apartment.number.trim())
            .bind(apartment.floor)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(row) = row {
                created.push(row);
            }
        }

        tx.commit().await?;
        self.cache.invalidate();

        Ok(created)
    }

    fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}
