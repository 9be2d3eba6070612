//! Independent handles sharing one catalog from several threads.

use std::sync::{Arc, Barrier};
use std::thread;

use camino::Utf8PathBuf;
use catalog_store::{Catalog, CatalogOptions, ItemRecord};
use serde_json::json;
use tempfile::TempDir;

const WRITERS: i64 = 4;
const ITEMS_PER_WRITER: i64 = 50;

fn open_catalog(dir: &TempDir) -> Catalog {
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
    Catalog::open(root.join("data.db"), CatalogOptions::default()).expect("open catalog")
}

fn item(id: i64, price: f64) -> ItemRecord {
    ItemRecord::from_value(json!({
        "id": id,
        "commodityName": format!("item-{id}"),
        "price": price,
        "onSaleCount": 1,
    }))
    .expect("valid record")
}

#[test]
fn disjoint_writers_lose_no_rows() {
    let dir = TempDir::new().expect("temp dir");
    let catalog = open_catalog(&dir);
    let barrier = Arc::new(Barrier::new(usize::try_from(WRITERS).expect("writer count")));

    let workers: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let catalog = catalog.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut store = catalog.store().expect("worker store");
                barrier.wait();
                let first = writer * ITEMS_PER_WRITER;
                for id in first..first + ITEMS_PER_WRITER {
                    store.upsert_smart(&item(id, 1.0)).expect("upsert");
                    // Each handle sees its own write immediately.
                    assert!(store.get(id).expect("read back").is_some());
                }
                store.close().expect("close worker store");
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    let store = catalog.store().expect("reader store");
    let stats = store.stats().expect("stats");
    assert_eq!(stats.total, WRITERS * ITEMS_PER_WRITER);
}

#[test]
fn concurrent_smart_upserts_of_one_id_insert_once() {
    let dir = TempDir::new().expect("temp dir");
    let catalog = open_catalog(&dir);
    let barrier = Arc::new(Barrier::new(2));

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let catalog = catalog.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut store = catalog.store().expect("worker store");
                barrier.wait();
                store
                    .upsert_batch_smart(&[item(1, 1.0), item(2, 2.0)])
                    .expect("batch upsert")
            })
        })
        .collect();

    let summaries: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker panicked"))
        .collect();

    let inserted: usize = summaries.iter().map(|summary| summary.new).sum();
    let updated: usize = summaries.iter().map(|summary| summary.updated).sum();
    assert_eq!(inserted, 2);
    assert_eq!(updated, 2);
}

#[test]
fn readers_proceed_while_a_handle_is_open_for_writing() {
    let dir = TempDir::new().expect("temp dir");
    let catalog = open_catalog(&dir);
    let mut writer = catalog.store().expect("writer");
    writer.insert(&item(1, 4.0)).expect("insert");

    let reader = catalog.store().expect("reader");
    let cheapest = reader.cheapest(5).expect("cheapest");
    assert_eq!(cheapest.len(), 1);
    assert_eq!(cheapest.first().map(|item| item.id), Some(1));
}
