use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Apartment, MissingApartments, NewApartment};
use crate::services::retry::{with_retry, RetryPolicy};
use crate::services::single_flight::SingleFlight;
use crate::services::store::ResidentStore;
use crate::utils::validators::block_label;

static MISSING_APARTMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Apartment ([^\s,]+) does not exist in Block ([^\s,]+)").unwrap());

#[derive(Debug, Clone)]
pub struct GapResolution {
    pub block_id: Uuid,
    pub created: Vec<Apartment>,
    /// Повторный импорт того же файла пройдёт для строк с этими квартирами
    pub reimport_ready: bool,
}

/// Этаж по номеру квартиры: четыре квартиры на этаж
pub fn floor_for(number: &str) -> i32 {
    let digits: String = number.trim().chars().take_while(char::is_ascii_digit).collect();
    match digits.parse::<i64>() {
        Ok(n) => ((n + 3) / 4).min(i32::MAX as i64) as i32,
        Err(_) => 1,
    }
}

/// Недостающие квартиры из ошибок импорта, по блокам, без повторов
pub fn missing_apartments(errors: &[String]) -> Vec<MissingApartments> {
    let mut by_block: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for error in errors {
        for captures in MISSING_APARTMENT_REGEX.captures_iter(error) {
            let numbers = by_block.entry(captures[2].to_string()).or_default();
            let number = captures[1].to_string();
            if !numbers.contains(&number) {
                numbers.push(number);
            }
        }
    }
    by_block
        .into_iter()
        .map(|(block, numbers)| MissingApartments { block, numbers })
        .collect()
}

/// Создаёт недостающие квартиры блока. Пока идёт создание для блока,
/// повторный запуск для того же блока отклоняется.
pub async fn resolve_missing_apartments(
    store: &dyn ResidentStore,
    flights: &Arc<SingleFlight<String>>,
    retry: RetryPolicy,
    block: &str,
    numbers: &[String],
) -> AppResult<GapResolution> {
    let label = block_label(block);
    let _flight = flights.try_begin(label.clone()).ok_or_else(|| {
        AppError::Conflict(format!("Apartments for {} are already being created", label))
    })?;

    let mut apartments: Vec<NewApartment> = Vec::new();
    for number in numbers.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if apartments.iter().all(|a| a.number != number) {
            apartments.push(NewApartment {
                number: number.to_string(),
                floor: floor_for(number),
            });
        }
    }
    if apartments.is_empty() {
        return Err(AppError::BadRequest("No apartment numbers given".to_string()));
    }

    let block_id = with_retry(retry, "resolve_block_id", || store.resolve_block_id(block))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} does not exist", label)))?;

    let created = with_retry(retry, "create_apartments", || {
        store.create_apartments(block_id, &apartments)
    })
    .await?;
    store.invalidate_cache();

    tracing::info!(
        block = %label,
        requested = apartments.len(),
        created = created.len(),
        "Missing apartments created"
    );

    Ok(GapResolution {
        block_id,
        created,
        reimport_ready: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::{MemoryStore, StoreOp};

    #[test]
    fn test_floor_heuristic() {
        assert_eq!(floor_for("1"), 1);
        assert_eq!(floor_for("4"), 1);
        assert_eq!(floor_for("5"), 2);
        assert_eq!(floor_for("999"), 250);
        assert_eq!(floor_for("12B"), 3);
        assert_eq!(floor_for("B12"), 1);
    }

    #[test]
    fn test_missing_apartments_grouped_by_block() {
        let errors = vec![
            "Row 2 (Alice): Apartment 999 does not exist in Block A".to_string(),
            "Row 3 (Bob): Apartment 998 does not exist in Block A".to_string(),
            "Row 4 (Carol): Apartment 999 does not exist in Block A".to_string(),
            "Row 5 (Dave): Apartment 7 does not exist in Block B2".to_string(),
            "Row 6 (Eve): Block \"Z\" does not exist".to_string(),
        ];
        assert_eq!(
            missing_apartments(&errors),
            vec![
                MissingApartments {
                    block: "A".to_string(),
                    numbers: vec!["999".to_string(), "998".to_string()],
                },
                MissingApartments {
                    block: "B2".to_string(),
                    numbers: vec!["7".to_string()],
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_creates_only_missing_apartments() {
        let store = MemoryStore::new().with_block("A", &["101"]);
        let flights = Arc::new(SingleFlight::default());
        let numbers = vec!["101".to_string(), "999".to_string(), " 999 ".to_string(), "5".to_string()];

        let resolution =
            resolve_missing_apartments(&store, &flights, RetryPolicy::default(), "A", &numbers)
                .await
                .unwrap();

        assert_eq!(resolution.created.len(), 2);
        assert!(resolution.reimport_ready);
        let floors: Vec<i32> = resolution.created.iter().map(|a| a.floor).collect();
        assert_eq!(floors, vec![250, 2]);
        assert_eq!(store.apartment_numbers("A"), vec!["101", "999", "5"]);
        assert_eq!(store.invalidations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_block() {
        let store = MemoryStore::new();
        let flights = Arc::new(SingleFlight::default());
        let result = resolve_missing_apartments(
            &store,
            &flights,
            RetryPolicy::default(),
            "Z",
            &["1".to_string()],
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(store.calls(StoreOp::CreateApartments), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_call_for_same_block_is_suppressed() {
        let store = MemoryStore::new().with_block("A", &[]);
        let flights = Arc::new(SingleFlight::default());
        let _running = flights.try_begin("Block A".to_string());

        let result = resolve_missing_apartments(
            &store,
            &flights,
            RetryPolicy::default(),
            "Block A",
            &["1".to_string()],
        )
        .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(store.calls(StoreOp::ResolveBlock), 0);
    }
}
