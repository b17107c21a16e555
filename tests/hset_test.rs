//! Concurrent Set Integration Tests

use gt_utils::ConcurrentSet;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_set_lifecycle() {
    let set = ConcurrentSet::new();
    set.add([1, 2, 2, 3]);
    assert_eq!(set.len(), 3);
    assert!(set.contains(&[1, 2, 3]));
    assert!(!set.contains(&[1, 2, 3, 4]));

    set.remove(&[1]);
    assert_eq!(set.len(), 2);

    set.remove(&[3]);
    set.remove(&[3]);
    assert_eq!(set.len(), 1);
    assert!(set.contains(&[2]));
}

#[test]
fn test_json_round_trip_reproduces_set() {
    let original: ConcurrentSet<String> = ["alpha", "beta", "gamma"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let encoded = assert_ok!(original.to_json());
    let restored: ConcurrentSet<String> = ConcurrentSet::new();
    restored.add(["stale".to_string()]);
    assert_ok!(restored.from_json(&encoded));

    assert!(restored.same(Some(&original)));
    assert!(original.same(Some(&restored)));
    assert!(!restored.exists(&"stale".to_string()));
}

#[test]
fn test_malformed_json_is_rejected() {
    let set: ConcurrentSet<u32> = [10, 20].into_iter().collect();
    assert_err!(set.from_json(b"{\"not\": \"an array\"}"));
    assert_eq!(set.len(), 2);
}

#[tokio::test]
async fn test_shared_across_tasks() {
    let set: Arc<ConcurrentSet<u64>> = Arc::new(ConcurrentSet::new());

    let tasks: Vec<_> = (0..8u64)
        .map(|worker| {
            let set = Arc::clone(&set);
            tokio::spawn(async move {
                for n in 0..100 {
                    set.add([worker * 100 + n]);
                }
                // Every worker also touches the shared range
                set.add(0..10);
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(set.len(), 800);
    let snapshot: ConcurrentSet<u64> = set.values().into_iter().collect();
    assert!(snapshot.same(Some(&*set)));
}
