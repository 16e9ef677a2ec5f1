use tagsearch_cache::{cache_key, CacheManager, Expiration};
use tagsearch_db::Store;
use tempfile::{NamedTempFile, TempDir};
use time::{Duration, OffsetDateTime};

fn fixture() -> (NamedTempFile, TempDir, Store, CacheManager) {
    let db_file = NamedTempFile::new().expect("temp db file");
    let store = Store::connect(db_file.path().to_str().unwrap()).expect("connect store");
    let cache_dir = TempDir::new().expect("temp cache dir");
    let cache = CacheManager::new(cache_dir.path());
    (db_file, cache_dir, store, cache)
}

#[test]
fn fresh_key_is_absent() {
    let (_db, _dir, _store, cache) = fixture();
    let key = cache_key("\"RUST\"");
    assert!(!cache.has(&key));
}

#[test]
fn create_then_has_then_get_round_trips_a_page() {
    let (_db, _dir, mut store, cache) = fixture();
    store
        .upsert_article("a1", "202601010000", "202601010000", &["RUST".into()])
        .expect("seed article");

    let key = cache_key("\"RUST\"");
    cache
        .create(
            &mut store,
            &key,
            &["RUST".into()],
            Expiration::Relative { minutes: 7 * 24 * 60 },
            1,
            1,
        )
        .expect("create cache entry");
    assert!(cache.has(&key));

    // page file absent until `set`
    let before_set = cache.get(&key, "DESC_POSTDATE.", 1).expect("get before set");
    assert_eq!(before_set, None);

    cache
        .set(&key, "DESC_POSTDATE.", 1, &["a1".to_string()], false)
        .expect("set page");

    let page = cache
        .get(&key, "DESC_POSTDATE.", 1)
        .expect("get after set")
        .expect("page present");
    assert_eq!(page, vec!["a1".to_string()]);
}

#[test]
fn out_of_range_page_returns_empty_list_without_touching_disk() {
    let (_db, _dir, mut store, cache) = fixture();
    let key = cache_key("\"RUST\"");
    cache
        .create(&mut store, &key, &["RUST".into()], Expiration::Relative { minutes: 15 }, 0, 0)
        .expect("create cache entry");

    let page = cache.get(&key, "DESC_POSTDATE.", 5).expect("get out-of-range page");
    assert_eq!(page, Some(Vec::new()));
}

#[test]
fn pinned_entry_expiration_never_slides() {
    let (_db, _dir, mut store, cache) = fixture();
    let far_future = OffsetDateTime::now_utc() + Duration::days(3650);
    let key = cache_key("\"RUST\"");
    cache
        .create(&mut store, &key, &["RUST".into()], Expiration::Absolute(far_future), 1, 1)
        .expect("create pinned cache entry");

    let before = cache.expiration_time(&key).expect("read expiration").unwrap();
    cache.update(&key, None).expect("update on pinned entry is a no-op");
    let after = cache.expiration_time(&key).expect("read expiration").unwrap();
    assert_eq!(before, after);
}

#[test]
fn relative_entry_slides_forward_on_update() {
    let (_db, _dir, mut store, cache) = fixture();
    let key = cache_key("\"RUST\"");
    // start already-expired so the slide is unambiguous
    cache
        .create(
            &mut store,
            &key,
            &["RUST".into()],
            Expiration::Relative { minutes: 15 },
            1,
            1,
        )
        .expect("create relative cache entry");

    let before = cache.expiration_time(&key).expect("read expiration").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(10));
    cache.update(&key, None).expect("slide expiration");
    let after = cache.expiration_time(&key).expect("read expiration").unwrap();
    assert!(after >= before);
}

#[test]
fn delete_cache_during_transaction_renames_out_of_namespace() {
    let (_db, _dir, mut store, cache) = fixture();
    let key = cache_key("\"RUST\"");
    cache
        .create(&mut store, &key, &["RUST".into()], Expiration::Relative { minutes: 15 }, 0, 0)
        .expect("create cache entry");
    assert!(cache.has(&key));

    cache
        .delete_cache_during_transaction(&mut store, &key, OffsetDateTime::now_utc())
        .expect("invalidate entry");
    assert!(!cache.has(&key));
    assert!(!store.cache_row_exists(&key).unwrap());
}

#[test]
fn delete_by_tag_invalidates_every_matching_entry() {
    let (_db, _dir, mut store, cache) = fixture();
    store
        .upsert_article("a1", "202601010000", "202601010000", &["RUST".into()])
        .expect("seed article");

    let key = cache_key("\"RUST\"");
    cache
        .create(&mut store, &key, &["RUST".into()], Expiration::Relative { minutes: 15 }, 1, 1)
        .expect("create cache entry");
    assert!(cache.has(&key));

    cache
        .delete_by_tag(&mut store, "RUST", OffsetDateTime::now_utc())
        .expect("invalidate by tag");
    assert!(!cache.has(&key));
}

#[test]
fn sweep_filesystem_removes_renamed_directories() {
    let (_db, _dir, mut store, cache) = fixture();
    let key = cache_key("\"RUST\"");
    cache
        .create(&mut store, &key, &["RUST".into()], Expiration::Relative { minutes: 15 }, 0, 0)
        .expect("create cache entry");
    cache
        .delete_cache_during_transaction(&mut store, &key, OffsetDateTime::now_utc())
        .expect("invalidate entry");

    // the renamed directory is still on disk until a sweep runs
    let renamed_dirs: Vec<_> = std::fs::read_dir(_dir.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().contains('.'))
        .collect();
    assert_eq!(renamed_dirs.len(), 1);

    let report = cache.sweep_filesystem().expect("sweep filesystem");
    assert_eq!(report.directories_removed, 1);
    assert_eq!(report.errors, 0);

    let remaining: Vec<_> = std::fs::read_dir(_dir.path()).unwrap().flatten().collect();
    assert!(remaining.is_empty());
}
