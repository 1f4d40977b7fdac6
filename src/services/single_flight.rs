use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightState {
    Idle,
    Running,
}

/// Не даёт запустить вторую копию операции с тем же ключом, пока первая не завершилась.
/// Переход Idle -> Running выполняет `try_begin`, обратно в Idle возвращает `FlightGuard::drop`.
#[derive(Debug)]
pub struct SingleFlight<K: Hash + Eq> {
    running: Mutex<HashSet<K>>,
}

impl<K: Hash + Eq> Default for SingleFlight<K> {
    fn default() -> Self {
        Self {
            running: Mutex::new(HashSet::new()),
        }
    }
}

impl<K: Hash + Eq + Clone> SingleFlight<K> {
    pub fn try_begin(self: &Arc<Self>, key: K) -> Option<FlightGuard<K>> {
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(FlightGuard {
            flight: Arc::clone(self),
            key,
        })
    }

    pub fn state(&self, key: &K) -> FlightState {
        if self.lock().contains(key) {
            FlightState::Running
        } else {
            FlightState::Idle
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<K>> {
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct FlightGuard<K: Hash + Eq + Clone> {
    flight: Arc<SingleFlight<K>>,
    key: K,
}

impl<K: Hash + Eq + Clone> Drop for FlightGuard<K> {
    fn drop(&mut self) {
        self.flight.lock().remove(&self.key);
    }
}
