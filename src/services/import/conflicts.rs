use std::collections::{HashMap, HashSet};

use futures::stream::{FuturesUnordered, StreamExt};

use crate::services::import::validator::ImportRow;
use crate::services::import::ImportSettings;
use crate::services::occupancy::{OccupancyIndex, OccupancyKey};
use crate::services::retry::with_retry;
use crate::services::store::ResidentStore;

/// Занятые помещения: ключ -> имя жильца
pub type OccupiedLocations = HashMap<OccupancyKey, String>;

pub const CONFLICT_IN_IMPORT: &str = "Conflict in import:";

pub const LOCATION_OCCUPIED: &str = "Location already occupied:";

pub const CONNECTION_ERROR_OCCUPANT: &str = "Unknown resident (connection error)";

pub const TIMEOUT_WARNING: &str =
    "Warning: Occupancy check timed out, some location conflicts may not have been detected";

#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub import_errors: Vec<String>,
    pub occupied_locations: OccupiedLocations,
}

/// Ищет конфликты внутри файла и с уже заселёнными квартирами.
/// Строки не удаляются: повторы отсекает импорт по карте занятости.
pub async fn detect_conflicts(
    rows: &[ImportRow],
    index: &OccupancyIndex,
    store: &dyn ResidentStore,
    settings: &ImportSettings,
) -> ConflictReport {
    let mut import_errors = batch_conflicts(rows);
    let (database_errors, occupied_locations) = database_conflicts(rows, index, store, settings).await;
    import_errors.extend(database_errors);

    ConflictReport {
        import_errors,
        occupied_locations,
    }
}

/// Первая строка для помещения задаёт ожидаемое имя, строки с другим именем конфликтуют с ней
pub fn batch_conflicts(rows: &[ImportRow]) -> Vec<String> {
    let mut first_seen: HashMap<OccupancyKey, &str> = HashMap::new();
    let mut reported = HashSet::new();
    let mut errors = Vec::new();

    for row in rows {
        let key = row.key();
        match first_seen.get(&key) {
            Some(first) if !same_person(first, &row.full_name) => {
                let message = format!(
                    "{} Both \"{}\" and \"{}\" are being assigned to {}",
                    CONFLICT_IN_IMPORT, first, row.full_name, key
                );
                if reported.insert(message.clone()) {
                    errors.push(message);
                }
            }
            Some(_) => {}
            None => {
                first_seen.insert(key, &row.full_name);
            }
        }
    }

    errors
}

fn same_person(a: &str, b: &str) -> bool {
    a.trim().to_uppercase() == b.trim().to_uppercase()
}

async fn database_conflicts(
    rows: &[ImportRow],
    index: &OccupancyIndex,
    store: &dyn ResidentStore,
    settings: &ImportSettings,
) -> (Vec<String>, OccupiedLocations) {
    let mut seen = HashSet::new();
    let candidates: Vec<(usize, OccupancyKey)> = rows
        .iter()
        .enumerate()
        .map(|(position, row)| (position, row.key()))
        .filter(|(_, key)| index.is_occupied(&key.block, &key.unit))
        // одно сообщение на помещение, в позиции первой строки
        .filter(|(_, key)| seen.insert(key.clone()))
        .collect();

    if candidates.is_empty() {
        return (Vec::new(), OccupiedLocations::new());
    }

    tracing::debug!(units = candidates.len(), "Resolving occupants of already occupied units");

    let mut lookups: FuturesUnordered<_> = candidates
        .into_iter()
        .map(|(position, key)| async move {
            let name = occupant_name(&key, index, store, settings).await;
            (position, key, name)
        })
        .collect();

    let deadline = tokio::time::Instant::now() + settings.conflict_timeout;
    let mut resolved = Vec::new();
    let mut timed_out = false;

    loop {
        match tokio::time::timeout_at(deadline, lookups.next()).await {
            Ok(Some(found)) => resolved.push(found),
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    resolved = resolved.len(),
                    pending = lookups.len(),
                    "Occupancy check timed out, continuing with partial data"
                );
                timed_out = true;
                break;
            }
        }
    }

    resolved.sort_by_key(|(position, _, _)| *position);

    let mut errors = Vec::with_capacity(resolved.len() + 1);
    let mut occupied = OccupiedLocations::new();
    for (_, key, name) in resolved {
        errors.push(format!("{} {} occupied by {}", LOCATION_OCCUPIED, key, name));
        occupied.insert(key, name);
    }
    if timed_out {
        errors.push(TIMEOUT_WARNING.to_string());
    }

    (errors, occupied)
}

async fn occupant_name(
    key: &OccupancyKey,
    index: &OccupancyIndex,
    store: &dyn ResidentStore,
    settings: &ImportSettings,
) -> String {
    let lookup = with_retry(settings.retry, "find_resident_by_unit", || {
        store.find_resident_by_unit(&key.block, &key.unit)
    })
    .await;

    match lookup {
        Ok(Some(name)) => name,
        // жилец мог смениться после построения индекса
        Ok(None) => index
            .occupant(&key.block, &key.unit, None)
            .map(|occupant| occupant.full_name.clone())
            .unwrap_or_else(|| CONNECTION_ERROR_OCCUPANT.to_string()),
        Err(e) => {
            tracing::warn!(unit = %key, "Occupant lookup failed: {}", e);
            CONNECTION_ERROR_OCCUPANT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::{MemoryStore, StoreOp};
    use std::time::Duration;

    fn row(line: usize, name: &str, block: &str, unit: &str) -> ImportRow {
        ImportRow {
            line,
            full_name: name.to_string(),
            phone_number: Some("555".to_string()),
            block_number: block.to_string(),
            apartment_number: unit.to_string(),
            move_in_month: None,
            move_in_year: None,
        }
    }

    async fn index_of(store: &MemoryStore) -> OccupancyIndex {
        OccupancyIndex::from_residents(&store.list_residents().await.unwrap())
    }

    #[test]
    fn test_batch_conflict_reported_once_for_repeated_pair() {
        let rows = vec![
            row(2, "Alice", "A", "101"),
            row(3, "Bob", "A", "101"),
            row(4, "Alice", "A", "101"),
            row(5, "Bob", "A", "101"),
            row(6, "Bob", "A", "101"),
        ];
        let errors = batch_conflicts(&rows);
        assert_eq!(
            errors,
            vec!["Conflict in import: Both \"Alice\" and \"Bob\" are being assigned to Block A, Apartment 101"]
        );
    }

    #[test]
    fn test_same_name_repeats_are_not_batch_conflicts() {
        let rows = vec![
            row(2, "Alice", "A", "101"),
            row(3, "ALICE", "A", "101"),
            row(4, "Carol", "A", "102"),
        ];
        assert!(batch_conflicts(&rows).is_empty());
    }

    #[test]
    fn test_first_row_sets_expected_name() {
        let rows = vec![
            row(2, "Alice", "A", "101"),
            row(3, "Bob", "A", "101"),
            row(4, "Carol", "A", "101"),
        ];
        let errors = batch_conflicts(&rows);
        assert_eq!(errors.len(), 2);
        assert!(errors[1].contains("Both \"Alice\" and \"Carol\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_occupant_is_reported() {
        let store = MemoryStore::new().with_block("B", &["5"]).with_resident("Carol", "B", "5");
        let index = index_of(&store).await;
        let rows = vec![row(2, "Dave", "B", "5"), row(3, "Eve", "B", "6")];

        let report = detect_conflicts(&rows, &index, &store, &ImportSettings::default()).await;

        assert_eq!(
            report.import_errors,
            vec!["Location already occupied: Block B, Apartment 5 occupied by Carol"]
        );
        assert_eq!(
            report.occupied_locations.get(&OccupancyKey::new("B", "5")).map(String::as_str),
            Some("Carol")
        );
        assert_eq!(store.calls(StoreOp::FindResident), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_occupied_unit_reported_once_for_repeated_rows() {
        let store = MemoryStore::new()
            .with_resident("Carol", "B", "5")
            .with_resident("Frank", "B", "6");
        let index = index_of(&store).await;
        let rows = vec![
            row(2, "Frank", "B", "6"),
            row(3, "Dave", "B", "5"),
            row(4, "Eve", "b", "5"),
        ];

        let report = detect_conflicts(&rows, &index, &store, &ImportSettings::default()).await;

        assert_eq!(
            report.import_errors,
            vec![
                "Location already occupied: Block B, Apartment 6 occupied by Frank",
                "Location already occupied: Block B, Apartment 5 occupied by Carol",
            ]
        );
        assert_eq!(store.calls(StoreOp::FindResident), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_failure_falls_back_to_placeholder() {
        let store = MemoryStore::new().with_resident("Carol", "B", "5");
        let index = index_of(&store).await;
        store.fail_next(StoreOp::FindResident, 10);

        let report =
            detect_conflicts(&[row(2, "Dave", "B", "5")], &index, &store, &ImportSettings::default()).await;

        assert_eq!(store.calls(StoreOp::FindResident), 3);
        assert_eq!(
            report.import_errors,
            vec![format!(
                "Location already occupied: Block B, Apartment 5 occupied by {}",
                CONNECTION_ERROR_OCCUPANT
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_partial_results() {
        let store = MemoryStore::new()
            .with_resident("Carol", "B", "5")
            .with_resident("Frank", "B", "6");
        let index = index_of(&store).await;
        // каждая попытка дольше общего лимита, поиск не успевает завершиться
        store.delay(StoreOp::FindResident, Duration::from_secs(20));

        let rows = vec![row(2, "Dave", "B", "5"), row(3, "Eve", "B", "6")];
        let report = detect_conflicts(&rows, &index, &store, &ImportSettings::default()).await;

        assert_eq!(report.import_errors, vec![TIMEOUT_WARNING]);
        assert!(report.occupied_locations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_lookups_for_free_units() {
        let store = MemoryStore::new();
        let index = index_of(&store).await;
        let report =
            detect_conflicts(&[row(2, "Dave", "B", "5")], &index, &store, &ImportSettings::default()).await;
        assert!(report.import_errors.is_empty());
        assert_eq!(store.calls(StoreOp::FindResident), 0);
    }
}
