use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use chrono::DateTime;
use chrono_tz::Tz;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{domain::UserId, session::SleepSession};

type Slot = Arc<Mutex<Option<SleepSession>>>;
type SlotMap = Arc<StdMutex<HashMap<UserId, Slot>>>;

/// In-memory `UserId -> SleepSession` map with one lock per user.
///
/// The outer map is only held long enough to find (or create) a user's slot,
/// never across an `.await`. Reads and writes of a session happen under the
/// slot lock, so handling for one user never waits on another user's handling.
///
/// A slot lives only while its user is tracking or someone is waiting on it:
/// the map holds one slot per tracking user plus one per user whose slot some
/// other task is still holding.
#[derive(Default)]
pub struct SessionStore {
    slots: SlotMap,
}

/// Exclusive access to one user's session slot.
///
/// Held for the whole handling of an inbound action, including the outbound
/// notification, so concurrent actions for the same user are serialized.
/// Dropping an empty guard with no other waiters removes the slot.
pub struct SessionGuard {
    user_id: UserId,
    slots: SlotMap,
    slot: OwnedMutexGuard<Option<SleepSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, user_id: UserId) -> Slot {
        let mut map = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    pub async fn lock_user(&self, user_id: UserId) -> SessionGuard {
        let slot = self.slot(user_id);
        SessionGuard {
            user_id,
            slots: self.slots.clone(),
            slot: slot.lock_owned().await,
        }
    }

    /// Start (or restart) tracking. Returns the session that was displaced, if any.
    pub async fn begin(&self, user_id: UserId, start_time: DateTime<Tz>) -> Option<SleepSession> {
        self.lock_user(user_id).await.begin(start_time)
    }

    pub async fn end(&self, user_id: UserId) -> Option<SleepSession> {
        self.lock_user(user_id).await.end()
    }

    pub async fn cancel(&self, user_id: UserId) -> Option<SleepSession> {
        self.lock_user(user_id).await.cancel()
    }

    pub async fn is_tracking(&self, user_id: UserId) -> bool {
        self.lock_user(user_id).await.current().is_some()
    }

    pub async fn get(&self, user_id: UserId) -> Option<SleepSession> {
        self.lock_user(user_id).await.current().cloned()
    }

    /// Number of users currently tracking.
    pub async fn active_count(&self) -> usize {
        let slots: Vec<Slot> = {
            let map = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            map.values().cloned().collect()
        };
        let mut count = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }
}

impl SessionGuard {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn current(&self) -> Option<&SleepSession> {
        self.slot.as_ref()
    }

    pub fn begin(&mut self, start_time: DateTime<Tz>) -> Option<SleepSession> {
        self.slot.replace(SleepSession::new(self.user_id, start_time))
    }

    pub fn end(&mut self) -> Option<SleepSession> {
        self.slot.take()
    }

    pub fn cancel(&mut self) -> Option<SleepSession> {
        self.slot.take()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.slot.is_some() {
            return;
        }
        let mut map = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let ours = OwnedMutexGuard::mutex(&self.slot);
        // Anyone else holding the slot cloned it under the map lock we now hold,
        // so a count of two (map + this guard) means nobody is waiting.
        if Arc::strong_count(ours) != 2 {
            return;
        }
        if map
            .get(&self.user_id)
            .is_some_and(|slot| Arc::ptr_eq(slot, ours))
        {
            map.remove(&self.user_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Tz> {
        Berlin
            .with_ymd_and_hms(2025, 6, 1, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[tokio::test]
    async fn begin_then_end_removes_entry() {
        let store = SessionStore::new();
        assert!(store.begin(UserId(1), at(7, 0)).await.is_none());
        assert!(store.is_tracking(UserId(1)).await);

        let s = store.end(UserId(1)).await.unwrap();
        assert_eq!(s.start_time, at(7, 0));
        assert_eq!(s.user_id, UserId(1));
        assert!(!store.is_tracking(UserId(1)).await);
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test]
    async fn begin_overwrites_and_returns_displaced() {
        let store = SessionStore::new();
        store.begin(UserId(1), at(7, 0)).await;
        let displaced = store.begin(UserId(1), at(8, 0)).await.unwrap();
        assert_eq!(displaced.start_time, at(7, 0));
        assert_eq!(store.get(UserId(1)).await.unwrap().start_time, at(8, 0));
    }

    #[tokio::test]
    async fn end_and_cancel_on_idle_are_noops() {
        let store = SessionStore::new();
        store.begin(UserId(2), at(7, 0)).await;

        assert!(store.end(UserId(1)).await.is_none());
        assert!(store.cancel(UserId(1)).await.is_none());
        assert!(store.cancel(UserId(1)).await.is_none());
        assert_eq!(store.active_count().await, 1);
        assert!(store.is_tracking(UserId(2)).await);
    }

    #[tokio::test]
    async fn users_are_independent() {
        let store = Arc::new(SessionStore::new());
        store.begin(UserId(1), at(7, 0)).await;
        store.begin(UserId(2), at(8, 0)).await;

        // Holding user 1's slot must not block user 2.
        let _held = store.lock_user(UserId(1)).await;
        let other = tokio::time::timeout(Duration::from_secs(1), store.end(UserId(2)))
            .await
            .expect("user 2 blocked by user 1");
        assert_eq!(other.unwrap().start_time, at(8, 0));
    }

    #[tokio::test]
    async fn same_user_is_serialized() {
        let store = Arc::new(SessionStore::new());
        store.begin(UserId(1), at(7, 0)).await;

        let held = store.lock_user(UserId(1)).await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), store.end(UserId(1))).await;
        assert!(blocked.is_err(), "second access should wait for the guard");
        drop(held);

        assert!(store.end(UserId(1)).await.is_some());
    }

    fn slot_count(store: &SessionStore) -> usize {
        store.slots.lock().unwrap().len()
    }

    #[tokio::test]
    async fn idle_slots_are_released() {
        let store = SessionStore::new();
        store.begin(UserId(1), at(7, 0)).await;
        assert_eq!(slot_count(&store), 1);

        store.end(UserId(1)).await;
        assert_eq!(slot_count(&store), 0);

        // Touching idle users leaves nothing behind.
        for id in 2..50 {
            assert!(!store.is_tracking(UserId(id)).await);
            store.cancel(UserId(id)).await;
        }
        assert_eq!(slot_count(&store), 0);
    }

    #[tokio::test]
    async fn slot_with_waiter_is_kept() {
        let store = Arc::new(SessionStore::new());
        store.begin(UserId(1), at(7, 0)).await;

        let mut held = store.lock_user(UserId(1)).await;
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.begin(UserId(1), at(9, 0)).await })
        };
        // Let the waiter clone the slot and park on it.
        tokio::time::sleep(Duration::from_millis(20)).await;

        held.end();
        drop(held);
        assert!(waiter.await.unwrap().is_none());
        assert_eq!(store.get(UserId(1)).await.unwrap().start_time, at(9, 0));
        assert_eq!(slot_count(&store), 1);
    }
}
