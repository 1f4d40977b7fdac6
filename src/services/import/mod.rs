//! Импорт жильцов из CSV: разбор, проверка строк, поиск конфликтов занятости,
//! создание порциями с повторами и итоговый отчёт.

pub mod conflicts;
pub mod gaps;
pub mod importer;
pub mod months;
pub mod parser;
pub mod report;
pub mod validator;

use std::time::Duration;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{ErrorCategory, ErrorGroups, ImportReport};
use crate::services::occupancy::OccupancyIndex;
use crate::services::retry::{with_retry, RetryPolicy};
use crate::services::store::ResidentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    pub retry: RetryPolicy,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub conflict_timeout: Duration,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            chunk_size: 3,
            chunk_delay: Duration::from_millis(500),
            conflict_timeout: Duration::from_secs(15),
        }
    }
}

impl From<&Config> for ImportSettings {
    fn from(config: &Config) -> Self {
        Self {
            retry: RetryPolicy {
                max_attempts: config.import_max_attempts.max(1),
                base_delay: Duration::from_millis(config.import_retry_base_ms),
            },
            chunk_size: config.import_chunk_size.max(1),
            chunk_delay: Duration::from_millis(config.import_chunk_delay_ms),
            conflict_timeout: Duration::from_secs(config.import_conflict_timeout_secs),
        }
    }
}

/// Полный прогон импорта по тексту файла. Ошибки отдельных строк попадают в отчёт;
/// `Err` возвращается, только если не удалось получить список жильцов.
pub async fn run_import(
    store: &dyn ResidentStore,
    settings: &ImportSettings,
    text: &str,
) -> AppResult<ImportReport> {
    let residents = with_retry(settings.retry, "list_residents", || store.list_residents()).await?;
    let mut index = OccupancyIndex::from_residents(&residents);

    let parsed = parser::parse_csv(text);
    let validated = validator::validate_rows(&parsed.rows);
    tracing::info!(
        parsed = parsed.rows.len(),
        malformed = parsed.errors.len(),
        valid = validated.valid_rows.len(),
        invalid = validated.validation_errors.len(),
        "Import file parsed"
    );

    let conflicts =
        conflicts::detect_conflicts(&validated.valid_rows, &index, store, settings).await;
    if !conflicts.import_errors.is_empty() {
        tracing::info!(conflicts = conflicts.import_errors.len(), "Import conflicts detected");
    }

    let outcome = importer::import_rows(
        &validated.valid_rows,
        conflicts.occupied_locations,
        store,
        settings,
    )
    .await;

    let success_count = outcome.success_count();
    let failure_count =
        parsed.errors.len() + validated.validation_errors.len() + outcome.failures.len();
    let summary = report::summary_message(success_count, failure_count);
    tracing::info!(success_count, failure_count, "{}", summary);

    for resident in &outcome.created {
        index.insert(resident);
    }
    let refreshed = success_count > 0 && refresh(store, settings, &mut index).await;

    let total_rows = parsed.rows.len() + parsed.errors.len();
    let mut groups = ErrorGroups::default();
    let mut errors = Vec::new();
    for message in parsed.errors.into_iter().chain(validated.validation_errors) {
        groups.push(ErrorCategory::Other, message.clone());
        errors.push(message);
    }
    for message in conflicts.import_errors {
        groups.push(report::classify(&message), message.clone());
        errors.push(message);
    }
    for failure in &outcome.failures {
        let message = failure.to_string();
        groups.push(failure.category(), message.clone());
        errors.push(message);
    }
    groups.group_missing_by_block();

    Ok(ImportReport {
        total_rows,
        success_count,
        failure_count,
        summary,
        errors,
        groups,
        occupied_units: index.occupied_units(),
        refreshed,
    })
}

/// Сбрасывает кэш блоков и перечитывает жильцов после успешного импорта
async fn refresh(store: &dyn ResidentStore, settings: &ImportSettings, index: &mut OccupancyIndex) -> bool {
    store.invalidate_cache();
    match with_retry(settings.retry, "list_residents", || store.list_residents()).await {
        Ok(residents) => {
            *index = OccupancyIndex::from_residents(&residents);
            tracing::debug!(residents = residents.len(), "Residents refreshed after import");
            true
        }
        Err(e) => {
            tracing::warn!("Failed to refresh residents after import: {}", e);
            false
        }
    }
}
