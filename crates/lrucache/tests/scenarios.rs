use lrucache::{Error, LruCache};

fn order(cache: &LruCache<i32, i32>) -> Vec<i32> {
    cache.keys().copied().collect()
}

#[test]
fn test_example_sequence() {
    let mut cache = LruCache::new(2).unwrap();

    cache.put(1, 1);
    cache.put(2, 2);
    assert_eq!(cache.get(&1), Some(&1));
    assert_eq!(order(&cache), vec![1, 2]);

    cache.put(3, 3); // evicts 2
    assert_eq!(cache.get(&2), None);

    cache.put(4, 4); // evicts 1
    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&3), Some(&3));
    assert_eq!(cache.get(&4), Some(&4));

    assert!(cache.check_invariants().is_ok());
}

#[test]
fn test_update_refreshes_recency() {
    let mut cache = LruCache::new(2).unwrap();

    cache.put(2, 1);
    cache.put(1, 1);
    cache.put(2, 3); // update, promotes 2
    cache.put(4, 1); // evicts 1

    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), Some(&3));
}

#[test]
fn test_zero_capacity_rejected() {
    assert!(matches!(
        LruCache::<i32, i32>::new(0),
        Err(Error::InvalidCapacity { capacity: 0 })
    ));
}

#[test]
fn test_repeated_get_is_idempotent() {
    let mut cache = LruCache::new(3).unwrap();
    cache.put(1, 10);
    cache.put(2, 20);

    let first = cache.get(&1).copied();
    let second = cache.get(&1).copied();

    assert_eq!(first, Some(10));
    assert_eq!(first, second);
    assert_eq!(cache.len(), 2);
    assert_eq!(order(&cache), vec![1, 2]);
}

#[test]
fn test_evicted_key_is_oldest_touch() {
    let mut cache = LruCache::new(3).unwrap();

    cache.put(1, 1);
    cache.put(2, 2);
    cache.put(3, 3);
    cache.get(&1);
    cache.put(2, 22);

    // Last touches: 3 oldest, then 1, then 2
    assert_eq!(cache.peek_lru(), Some((&3, &3)));
    cache.put(4, 4);

    assert_eq!(cache.get(&3), None);
    assert_eq!(order(&cache), vec![4, 2, 1]);
    assert_eq!(cache.stats().evictions(), 1);
}

#[test]
fn test_size_bounded_under_churn() {
    let mut cache = LruCache::new(8).unwrap();

    for i in 0..1000 {
        cache.put(i % 37, i);
        if i % 3 == 0 {
            cache.get(&(i % 11));
        }
        assert!(cache.len() <= cache.capacity());
    }

    assert_eq!(cache.len(), 8);
    assert!(cache.check_invariants().is_ok());
}
