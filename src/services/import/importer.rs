use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{ErrorCategory, Resident};
use crate::services::import::conflicts::OccupiedLocations;
use crate::services::import::validator::ImportRow;
use crate::services::import::ImportSettings;
use crate::services::occupancy::OccupancyKey;
use crate::services::retry::with_retry;
use crate::services::store::ResidentStore;

/// Причина, по которой строка не была импортирована
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowFailure {
    #[error("Row {line} ({name}): Block {block}, Apartment {unit} is already occupied by {occupant}")]
    Occupied {
        line: usize,
        name: String,
        block: String,
        unit: String,
        occupant: String,
    },

    /// Помещение заняли в обход импорта (нарушение уникальности при вставке)
    #[error("Row {line} ({name}): Block {block}, Apartment {unit} is already occupied")]
    Taken {
        line: usize,
        name: String,
        block: String,
        unit: String,
    },

    #[error("Row {line} ({name}): Block \"{block}\" does not exist")]
    BlockMissing { line: usize, name: String, block: String },

    #[error("Row {line} ({name}): Apartment {unit} does not exist in Block {block}")]
    ApartmentMissing {
        line: usize,
        name: String,
        block: String,
        unit: String,
    },

    #[error("Row {line} ({name}): Could not verify {target}: {reason}")]
    Unverified {
        line: usize,
        name: String,
        target: String,
        reason: String,
    },

    #[error("Row {line} ({name}): Failed to create resident after {attempts} attempt(s): {reason}")]
    CreateFailed {
        line: usize,
        name: String,
        attempts: u32,
        reason: String,
    },
}

impl RowFailure {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RowFailure::Occupied { .. } | RowFailure::Taken { .. } => ErrorCategory::LocationConflict,
            RowFailure::BlockMissing { .. } => ErrorCategory::MissingBlock,
            RowFailure::ApartmentMissing { .. } => ErrorCategory::MissingApartment,
            RowFailure::Unverified { .. } | RowFailure::CreateFailed { .. } => ErrorCategory::Other,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<Resident>,
    pub failures: Vec<RowFailure>,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.created.len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }
}

/// Занятость помещений во время импорта. В `confirmed` попадают только созданные жильцы
/// (и занятые до импорта); строки для одного помещения проходят проверку по очереди.
struct UnitClaims {
    confirmed: Mutex<OccupiedLocations>,
    turns: Mutex<HashMap<OccupancyKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl UnitClaims {
    fn new(occupied: OccupiedLocations) -> Self {
        Self {
            confirmed: Mutex::new(occupied),
            turns: Mutex::new(HashMap::new()),
        }
    }

    fn confirmed(&self) -> MutexGuard<'_, OccupiedLocations> {
        self.confirmed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn turn(&self, key: &OccupancyKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut turns = self.turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        turns.entry(key.clone()).or_default().clone()
    }
}

/// Создаёт жильцов порциями по `chunk_size` строк. Строки внутри порции идут параллельно,
/// следующая порция начинается после завершения предыдущей и паузы `chunk_delay`.
pub async fn import_rows(
    rows: &[ImportRow],
    occupied: OccupiedLocations,
    store: &dyn ResidentStore,
    settings: &ImportSettings,
) -> BatchOutcome {
    let claims = UnitClaims::new(occupied);
    let chunk_size = settings.chunk_size.max(1);
    let chunk_count = rows.len().div_ceil(chunk_size);
    let mut outcome = BatchOutcome::default();

    for (chunk_index, chunk) in rows.chunks(chunk_size).enumerate() {
        let results = join_all(
            chunk
                .iter()
                .map(|row| import_row(row, &claims, store, settings)),
        )
        .await;

        for result in results {
            match result {
                Ok(resident) => outcome.created.push(resident),
                Err(failure) => {
                    tracing::debug!("Import row rejected: {}", failure);
                    outcome.failures.push(failure);
                }
            }
        }

        if chunk_index + 1 < chunk_count {
            tokio::time::sleep(settings.chunk_delay).await;
        }
    }

    outcome
}

async fn import_row(
    row: &ImportRow,
    claims: &UnitClaims,
    store: &dyn ResidentStore,
    settings: &ImportSettings,
) -> Result<Resident, RowFailure> {
    let key = row.key();

    // Очередь берётся до первого ожидания: join_all опрашивает строки по порядку,
    // поэтому строки с одинаковым помещением проверяются в порядке файла.
    let turn = claims.turn(&key);
    let _turn = turn.lock().await;

    if let Some(occupant) = claims.confirmed().get(&key).cloned() {
        return Err(RowFailure::Occupied {
            line: row.line,
            name: row.full_name.clone(),
            block: key.block,
            unit: key.unit,
            occupant,
        });
    }

    let resident = create_checked(row, store, settings).await?;
    claims.confirmed().insert(key, row.full_name.clone());
    Ok(resident)
}

async fn create_checked(
    row: &ImportRow,
    store: &dyn ResidentStore,
    settings: &ImportSettings,
) -> Result<Resident, RowFailure> {
    let key = row.key();
    let block = key.block.as_str();
    let unit = key.unit.as_str();

    let block_exists = with_retry(settings.retry, "block_exists", || store.block_exists(block))
        .await
        .map_err(|e| RowFailure::Unverified {
            line: row.line,
            name: row.full_name.clone(),
            target: format!("Block {}", block),
            reason: e.to_string(),
        })?;
    if !block_exists {
        return Err(RowFailure::BlockMissing {
            line: row.line,
            name: row.full_name.clone(),
            block: block.to_string(),
        });
    }

    let apartment_exists = with_retry(settings.retry, "apartment_exists", || {
        store.apartment_exists(block, unit)
    })
    .await
    .map_err(|e| RowFailure::Unverified {
        line: row.line,
        name: row.full_name.clone(),
        target: format!("Apartment {} in Block {}", unit, block),
        reason: e.to_string(),
    })?;
    if !apartment_exists {
        return Err(RowFailure::ApartmentMissing {
            line: row.line,
            name: row.full_name.clone(),
            block: block.to_string(),
            unit: unit.to_string(),
        });
    }

    let payload = row.to_new_resident();
    with_retry(settings.retry, "create_resident", || store.create_resident(&payload))
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => RowFailure::Taken {
                line: row.line,
                name: row.full_name.clone(),
                block: block.to_string(),
                unit: unit.to_string(),
            },
            e => RowFailure::CreateFailed {
                line: row.line,
                name: row.full_name.clone(),
                attempts: if e.is_transient() { settings.retry.max_attempts.max(1) } else { 1 },
                reason: e.to_string(),
            },
        })
}
