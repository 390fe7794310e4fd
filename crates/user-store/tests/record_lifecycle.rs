//! Record lifecycle properties, checked against every backend compiled in.
//!
//! Each backend runs the same suite: create/read round trip, duplicate
//! rejection, update-requires-existence, full overwrite, delete boundary, and
//! list containment.

use proptest::prelude::*;
use user_store::{FieldMap, HashStore, MemoryStore, User, UserStore, UserStoreError};

fn fields(name: &str, email: &str) -> FieldMap {
    User::new(name, email).to_fields()
}

fn create_then_read<S: HashStore>(users: &UserStore<S>) {
    users.create("A", "x@y.com").unwrap();
    assert!(users.exists("x@y.com").unwrap());
    assert_eq!(users.read("x@y.com").unwrap(), fields("A", "x@y.com"));
}

fn duplicate_create_rejected<S: HashStore>(users: &UserStore<S>) {
    users.create("A", "x@y.com").unwrap();
    let err = users.create("B", "x@y.com").unwrap_err();
    assert!(matches!(err, UserStoreError::AlreadyExists { .. }));
    assert_eq!(users.read("x@y.com").unwrap(), fields("A", "x@y.com"));
}

fn update_requires_existence<S: HashStore>(users: &UserStore<S>) {
    let err = users.update("A", "missing@y.com").unwrap_err();
    assert!(err.is_not_found());
    assert!(!users.exists("missing@y.com").unwrap());
    assert_eq!(users.count().unwrap(), 0);
}

fn update_overwrites_fully<S: HashStore>(users: &UserStore<S>) {
    users.create("A", "x@y.com").unwrap();
    users.update("B", "x@y.com").unwrap();
    assert_eq!(users.read("x@y.com").unwrap(), fields("B", "x@y.com"));
}

fn delete_boundary<S: HashStore>(users: &UserStore<S>) {
    users.create("A", "x@y.com").unwrap();
    users.delete("x@y.com").unwrap();
    assert!(users.delete("x@y.com").unwrap_err().is_not_found());
    assert!(users.read("x@y.com").unwrap_err().is_not_found());
}

fn list_reflects_store<S: HashStore>(users: &UserStore<S>) {
    users.create("A", "a@x.com").unwrap();
    users.create("B", "b@x.com").unwrap();
    users
        .store()
        .hash_write("session:a@x.com", &[("token", "t")])
        .unwrap();

    let records = users.list_all().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.contains(&fields("A", "a@x.com")));
    assert!(records.contains(&fields("B", "b@x.com")));
}

/// Runs `check` once per backend, each on a fresh store.
macro_rules! for_each_backend {
    ($check:ident) => {
        mod $check {
            use super::*;

            #[test]
            fn memory() {
                $check(&UserStore::new(MemoryStore::new()));
            }

            #[cfg(feature = "sqlite")]
            #[test]
            fn sqlite() {
                let store = user_store::SqliteStore::open_in_memory().unwrap();
                $check(&UserStore::new(store));
            }

            #[cfg(feature = "redb")]
            #[test]
            fn redb() {
                let store = user_store::RedbStore::open_in_memory().unwrap();
                $check(&UserStore::new(store));
            }
        }
    };
}

for_each_backend!(create_then_read);
for_each_backend!(duplicate_create_rejected);
for_each_backend!(update_requires_existence);
for_each_backend!(update_overwrites_fully);
for_each_backend!(delete_boundary);
for_each_backend!(list_reflects_store);

#[test]
fn shared_store_sees_writes_from_every_handle() {
    let store = std::sync::Arc::new(MemoryStore::new());
    let writer = UserStore::new(store.clone());
    let reader = UserStore::new(store);

    writer.create("A", "a@x.com").unwrap();
    assert_eq!(reader.read("a@x.com").unwrap(), fields("A", "a@x.com"));
    reader.delete("a@x.com").unwrap();
    assert!(!writer.exists("a@x.com").unwrap());
}

proptest! {
    #[test]
    fn any_user_round_trips(
        name in "\\PC{1,32}",
        email in "[a-z0-9._%+-]{1,16}@[a-z0-9-]{1,12}\\.[a-z]{2,6}",
    ) {
        let users = UserStore::new(MemoryStore::new());
        users.create(&name, &email).unwrap();
        prop_assert_eq!(users.read(&email).unwrap(), fields(&name, &email));
        prop_assert_eq!(users.list_all().unwrap(), vec![fields(&name, &email)]);
    }
}
