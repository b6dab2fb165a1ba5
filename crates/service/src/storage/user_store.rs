use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use common::metrics;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::ServiceError;
use crate::users::domain::{Listing, PartialRecord, UserId, UserRecord};
use crate::users::repository::UserRepository;

/// In-memory user table with densely packed ids.
///
/// Keys always form `1..=len()` and `next_id == len() + 1`. Deleting an id
/// shifts every higher id down by one, so ids are not stable across deletes.
#[derive(Debug, Clone)]
pub struct UserStore {
    records: BTreeMap<UserId, UserRecord>,
    next_id: UserId,
}

impl Default for UserStore {
    fn default() -> Self { Self::new() }
}

impl UserStore {
    pub fn new() -> Self {
        Self { records: BTreeMap::new(), next_id: 1 }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Id the next `create` will assign.
    pub fn next_id(&self) -> UserId { self.next_id }

    /// Store `record` under the next free id.
    pub fn create(&mut self, record: UserRecord) -> (UserId, UserRecord) {
        let id = self.next_id;
        self.records.insert(id, record.clone());
        self.next_id += 1;
        (id, record)
    }

    /// All records in ascending id order.
    pub fn list(&self) -> Listing {
        if self.records.is_empty() {
            return Listing::Empty;
        }
        Listing::Users(self.records.clone())
    }

    pub fn get(&self, id: UserId) -> Result<UserRecord, ServiceError> {
        self.records.get(&id).cloned().ok_or_else(|| ServiceError::not_found(id))
    }

    /// Merge the present fields of `partial` into the record at `id`.
    pub fn update(&mut self, id: UserId, partial: PartialRecord) -> Result<UserRecord, ServiceError> {
        let existing = self.records.get_mut(&id).ok_or_else(|| ServiceError::not_found(id))?;
        partial.apply_to(existing);
        Ok(existing.clone())
    }

    /// Remove the record at `id` and close the gap it leaves.
    pub fn delete(&mut self, id: UserId) -> Result<UserRecord, ServiceError> {
        let removed = self.records.remove(&id).ok_or_else(|| ServiceError::not_found(id))?;

        // id was just removed, so the tail holds exactly the keys above it, ascending
        let tail = self.records.split_off(&id);
        let shifted = tail.len();
        for (k, record) in tail {
            self.records.insert(k - 1, record);
        }
        self.next_id -= 1;

        debug!(id, shifted, remaining = self.records.len(), "user deleted, ids reindexed");
        Ok(removed)
    }
}

/// Process-wide store shared across request handlers.
///
/// One lock guards both the records and the id counter, so a delete's
/// reindexing never interleaves with another operation.
#[derive(Clone, Default)]
pub struct SharedUserStore {
    inner: Arc<RwLock<UserStore>>,
}

impl SharedUserStore {
    pub fn new() -> Arc<Self> {
        metrics::set_user_count(0);
        Arc::new(Self::default())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn create(&self, record: UserRecord) -> (UserId, UserRecord) {
        let mut store = self.inner.write().await;
        let (id, record) = store.create(record);
        debug!(id, count = store.len(), "user created");
        metrics::set_user_count(store.len());
        metrics::record_operation("create", true);
        (id, record)
    }

    pub async fn list(&self) -> Listing {
        let store = self.inner.read().await;
        metrics::record_operation("list", true);
        store.list()
    }

    pub async fn get(&self, id: UserId) -> Result<UserRecord, ServiceError> {
        let store = self.inner.read().await;
        let res = store.get(id);
        metrics::record_operation("get", res.is_ok());
        res
    }

    pub async fn update(&self, id: UserId, partial: PartialRecord) -> Result<UserRecord, ServiceError> {
        let mut store = self.inner.write().await;
        let no_op = partial.is_empty();
        let res = store.update(id, partial);
        if res.is_ok() {
            debug!(id, no_op, "user updated");
        }
        metrics::record_operation("update", res.is_ok());
        res
    }

    pub async fn delete(&self, id: UserId) -> Result<UserRecord, ServiceError> {
        let mut store = self.inner.write().await;
        let res = store.delete(id);
        metrics::set_user_count(store.len());
        metrics::record_operation("delete", res.is_ok());
        res
    }
}

#[async_trait]
impl UserRepository for SharedUserStore {
    async fn create(&self, record: UserRecord) -> (UserId, UserRecord) { self.create(record).await }
    async fn list(&self) -> Listing { self.list().await }
    async fn get(&self, id: UserId) -> Result<UserRecord, ServiceError> { self.get(id).await }
    async fn update(&self, id: UserId, partial: PartialRecord) -> Result<UserRecord, ServiceError> { self.update(id, partial).await }
    async fn delete(&self, id: UserId) -> Result<UserRecord, ServiceError> { self.delete(id).await }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserRecord {
        UserRecord {
            username: name.into(),
            email: format!("{name}@example.com"),
            age: 20,
            password: format!("{name}-secret"),
            is_active: true,
        }
    }

    fn keys(store: &UserStore) -> Vec<UserId> {
        match store.list() {
            Listing::Empty => Vec::new(),
            Listing::Users(users) => users.keys().copied().collect(),
        }
    }

    fn assert_dense(store: &UserStore) {
        let expected: Vec<UserId> = (1..=store.len() as UserId).collect();
        assert_eq!(keys(store), expected);
        assert_eq!(store.next_id(), store.len() as UserId + 1);
    }

    #[test]
    fn creates_assign_sequential_ids() {
        let mut store = UserStore::new();
        for i in 0..5 {
            let (id, rec) = store.create(user(&format!("u{i}")));
            assert_eq!(id, i + 1);
            assert_eq!(store.get(id), Ok(rec));
        }
        assert_eq!(keys(&store), vec![1, 2, 3, 4, 5]);
        assert_dense(&store);
    }

    #[test]
    fn empty_store_lists_as_empty() {
        let store = UserStore::new();
        assert_eq!(store.list(), Listing::Empty);
        assert!(store.list().is_empty());
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut store = UserStore::new();
        store.create(user("a"));
        assert_eq!(store.get(0), Err(ServiceError::NotFound(0)));
        assert_eq!(store.get(2), Err(ServiceError::NotFound(2)));
        assert_eq!(store.update(7, PartialRecord::default()), Err(ServiceError::NotFound(7)));
        assert_eq!(store.delete(2), Err(ServiceError::NotFound(2)));
        assert_dense(&store);
    }

    #[test]
    fn negative_ids_are_not_found_and_leave_store_untouched() {
        let mut store = UserStore::new();
        store.create(user("a"));
        store.create(user("b"));
        assert_eq!(store.get(-1), Err(ServiceError::NotFound(-1)));
        assert_eq!(store.update(-1, PartialRecord { age: Some(1), ..Default::default() }), Err(ServiceError::NotFound(-1)));
        assert_eq!(store.delete(-1), Err(ServiceError::NotFound(-1)));
        assert_eq!(store.delete(0), Err(ServiceError::NotFound(0)));
        assert_dense(&store);
        assert_eq!(store.get(2), Ok(user("b")));
    }

    #[test]
    fn update_merges_present_fields_only() -> Result<(), ServiceError> {
        let mut store = UserStore::new();
        let (id, before) = store.create(user("a"));

        let unchanged = store.update(id, PartialRecord::default())?;
        assert_eq!(unchanged, before);
        assert_eq!(store.get(id)?, before);

        let aged = store.update(id, PartialRecord { age: Some(30), ..Default::default() })?;
        assert_eq!(aged, UserRecord { age: 30, ..before.clone() });

        let renamed = store.update(
            id,
            PartialRecord { username: Some("b".into()), is_active: Some(false), ..Default::default() },
        )?;
        assert_eq!(renamed.username, "b");
        assert!(!renamed.is_active);
        assert_eq!(renamed.age, 30);
        assert_eq!(renamed.email, before.email);
        Ok(())
    }

    #[test]
    fn delete_shifts_higher_ids_down() -> Result<(), ServiceError> {
        let mut store = UserStore::new();
        let names = ["a", "b", "c", "d", "e"];
        for n in names {
            store.create(user(n));
        }

        let removed = store.delete(2)?;
        assert_eq!(removed, user("b"));
        assert_dense(&store);
        assert_eq!(store.get(1)?, user("a"));
        assert_eq!(store.get(2)?, user("c"));
        assert_eq!(store.get(3)?, user("d"));
        assert_eq!(store.get(4)?, user("e"));
        assert_eq!(store.get(5), Err(ServiceError::NotFound(5)));
        Ok(())
    }

    #[test]
    fn delete_then_create_reuses_highest_slot() -> Result<(), ServiceError> {
        let mut store = UserStore::new();
        store.create(user("a"));
        store.create(user("b"));
        store.create(user("c"));

        assert_eq!(store.delete(2)?, user("b"));
        let Listing::Users(users) = store.list() else { panic!("expected users") };
        assert_eq!(users.into_iter().collect::<Vec<_>>(), vec![(1, user("a")), (2, user("c"))]);

        let (id, _) = store.create(user("d"));
        assert_eq!(id, 3);
        assert_dense(&store);
        Ok(())
    }

    #[test]
    fn deleting_first_and_last_keeps_range_dense() -> Result<(), ServiceError> {
        let mut store = UserStore::new();
        for n in ["a", "b", "c", "d"] {
            store.create(user(n));
        }
        assert_eq!(store.delete(4)?, user("d"));
        assert_dense(&store);
        assert_eq!(store.delete(1)?, user("a"));
        assert_dense(&store);
        assert_eq!(store.get(1)?, user("b"));
        assert_eq!(store.get(2)?, user("c"));

        store.delete(1)?;
        store.delete(1)?;
        assert!(store.is_empty());
        assert_eq!(store.list(), Listing::Empty);
        assert_eq!(store.create(user("z")).0, 1);
        Ok(())
    }

    #[test]
    fn interleaved_creates_and_deletes_match_a_vec_model() -> Result<(), ServiceError> {
        // a Vec shifts elements the same way the store reindexes ids
        let mut model: Vec<UserRecord> = Vec::new();
        let mut store = UserStore::new();
        let script: &[(bool, UserId)] = &[
            (true, 0), (true, 0), (true, 0), (false, 2), (true, 0),
            (false, 1), (false, 2), (true, 0), (true, 0), (false, 2),
        ];
        for (step, &(is_create, id)) in script.iter().enumerate() {
            if is_create {
                let rec = user(&format!("s{step}"));
                let (assigned, _) = store.create(rec.clone());
                model.push(rec);
                assert_eq!(assigned, model.len() as UserId);
            } else {
                let expected = model.remove(id as usize - 1);
                assert_eq!(store.delete(id)?, expected);
            }
            assert_dense(&store);
            for (idx, rec) in model.iter().enumerate() {
                assert_eq!(&store.get(idx as UserId + 1)?, rec);
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn shared_store_round_trip() -> anyhow::Result<()> {
        let store = SharedUserStore::new();
        assert_eq!(store.list().await, Listing::Empty);

        let (id, rec) = store.create(user("a")).await;
        assert_eq!(id, 1);
        assert_eq!(store.get(id).await?, rec);

        let updated = store.update(id, PartialRecord { email: Some("new@example.com".into()), ..Default::default() }).await?;
        assert_eq!(updated.email, "new@example.com");

        assert_eq!(store.delete(id).await?, updated);
        assert_eq!(store.delete(id).await, Err(ServiceError::NotFound(1)));
        assert_eq!(store.len().await, 0);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_keep_ids_dense() -> anyhow::Result<()> {
        let store = SharedUserStore::new();
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(user(&format!("c{i}"))).await;
                if i % 4 == 0 {
                    let _ = store.delete(1).await;
                }
            }));
        }
        for h in handles {
            h.await?;
        }

        let guard = store.inner.read().await;
        assert_eq!(guard.len(), 48);
        assert_dense(&guard);
        Ok(())
    }
}
