use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Apartment, Block};
use crate::utils::validators::block_label;

/// Снимок блоков и квартир, из которого отвечают проверки существования
#[derive(Debug, Clone, Default)]
pub struct PropertySnapshot {
    pub blocks: Vec<Block>,
    pub apartments: Vec<Apartment>,
}

impl PropertySnapshot {
    /// Принимает и полное имя ("Block A"), и код блока ("A")
    pub fn block_by_name(&self, name: &str) -> Option<&Block> {
        let label = block_label(name);
        self.blocks
            .iter()
            .find(|block| block.name.eq_ignore_ascii_case(&label))
    }

    pub fn has_apartment(&self, block_id: Uuid, number: &str) -> bool {
        let number = number.trim();
        self.apartments
            .iter()
            .any(|apartment| apartment.block_id == block_id && apartment.number == number)
    }
}

/// Кэш данных о блоках с ограниченным временем жизни.
/// Любое изменение блоков или квартир должно вызывать `invalidate`.
#[derive(Debug)]
pub struct PropertyCache {
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<PropertySnapshot>)>>,
}

impl PropertyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<Arc<PropertySnapshot>> {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_ref() {
            Some((loaded_at, snapshot)) if loaded_at.elapsed() < self.ttl => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }

    pub fn put(&self, snapshot: PropertySnapshot) -> Arc<PropertySnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some((Instant::now(), Arc::clone(&snapshot)));
        snapshot
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.take().is_some() {
            tracing::debug!("Property cache invalidated");
        }
    }

    pub async fn get_or_load<F, Fut>(&self, load: F) -> AppResult<Arc<PropertySnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<PropertySnapshot>>,
    {
        if let Some(snapshot) = self.get() {
            return Ok(snapshot);
        }
        let snapshot = load().await?;
        tracing::debug!(
            blocks = snapshot.blocks.len(),
            apartments = snapshot.apartments.len(),
            "Property cache loaded"
        );
        Ok(self.put(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Utc;

    fn snapshot() -> PropertySnapshot {
        let block = Block {
            id: Uuid::new_v4(),
            name: "Block A".to_string(),
            created_at: Utc::now(),
        };
        let apartment = Apartment {
            id: Uuid::new_v4(),
            block_id: block.id,
            number: "101".to_string(),
            floor: 26,
            created_at: Utc::now(),
        };
        PropertySnapshot {
            blocks: vec![block],
            apartments: vec![apartment],
        }
    }

    #[test]
    fn test_block_lookup_accepts_code_and_label() {
        let snapshot = snapshot();
        assert!(snapshot.block_by_name("A").is_some());
        assert!(snapshot.block_by_name("Block A").is_some());
        assert!(snapshot.block_by_name("block a").is_some());
        assert!(snapshot.block_by_name("Z").is_none());

        let id = snapshot.blocks[0].id;
        assert!(snapshot.has_apartment(id, "101"));
        assert!(!snapshot.has_apartment(id, "999"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = PropertyCache::new(Duration::from_secs(60));
        cache.put(snapshot());
        assert!(cache.get().is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache = PropertyCache::new(Duration::from_secs(60));
        let first = cache.get_or_load(|| async { Ok(snapshot()) }).await.unwrap();
        let cached = cache
            .get_or_load(|| async { Err(AppError::Internal("must be served from cache".into())) })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &cached));

        cache.invalidate();
        let reloaded = cache
            .get_or_load(|| async { Ok(PropertySnapshot::default()) })
            .await
            .unwrap();
        assert!(reloaded.blocks.is_empty());
    }
}
