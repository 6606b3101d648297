use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use flexcache_engine::{
    CacheConfig, CacheValue, EvictionPolicy, FlexCache, FlexError, FlexResult, Ttl,
};

/// Test value with an explicit weight, an identity tag, and a close counter.
struct Tracked {
    tag: u64,
    weight: usize,
    closed: Arc<AtomicUsize>,
}

impl CacheValue for Tracked {
    fn item_size(&self) -> FlexResult<usize> {
        Ok(self.weight)
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked(tag: u64, weight: usize) -> (Tracked, Arc<AtomicUsize>) {
    let closed = Arc::new(AtomicUsize::new(0));
    (
        Tracked {
            tag,
            weight,
            closed: Arc::clone(&closed),
        },
        closed,
    )
}

fn build_cache(policy: EvictionPolicy, max_items: usize, max_bytes: usize) -> FlexCache<Tracked> {
    FlexCache::with_config(CacheConfig {
        eviction_policy: policy,
        scan_interval: Duration::ZERO,
        max_items,
        max_bytes,
    })
}

#[test]
fn lru_eviction_spares_accessed_key() {
    let cache = build_cache(EvictionPolicy::Lru, 3, 0);

    cache.set("a", tracked(1, 1).0, Ttl::Never).expect("set");
    cache.set("b", tracked(2, 1).0, Ttl::Never).expect("set");
    cache.set("c", tracked(3, 1).0, Ttl::Never).expect("set");

    assert_eq!(cache.get("a").expect("hit").tag, 1);
    cache.set("d", tracked(4, 1).0, Ttl::Never).expect("set");

    assert_eq!(cache.get("a").expect("a survives").tag, 1);
    assert!(cache.get("b").is_none());
    assert_eq!(cache.get("c").expect("hit").tag, 3);
    assert_eq!(cache.get("d").expect("hit").tag, 4);
    assert_eq!(cache.item_count(), 3);
}

#[test]
fn fifo_eviction_ignores_accesses() {
    let cache = build_cache(EvictionPolicy::Fifo, 3, 0);

    cache.set("a", tracked(1, 1).0, Ttl::Never).expect("set");
    cache.set("b", tracked(2, 1).0, Ttl::Never).expect("set");
    cache.set("c", tracked(3, 1).0, Ttl::Never).expect("set");

    assert!(cache.get("a").is_some());
    assert!(cache.get("a").is_some());
    cache.set("d", tracked(4, 1).0, Ttl::Never).expect("set");

    assert!(cache.get("a").is_none());
    assert_eq!(cache.get("b").expect("hit").tag, 2);
    assert_eq!(cache.get("c").expect("hit").tag, 3);
    assert_eq!(cache.get("d").expect("hit").tag, 4);
}

#[test]
fn byte_budget_drives_eviction() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 100);

    let (k1, k1_closed) = tracked(1, 50);
    cache.set("k1", k1, Ttl::Never).expect("set");
    cache.set("k2", tracked(2, 50).0, Ttl::Never).expect("set");
    cache.set("k3", tracked(3, 60).0, Ttl::Never).expect("set");

    assert!(cache.byte_total() <= 100);
    assert!(cache.get("k1").is_none());
    assert_eq!(k1_closed.load(Ordering::SeqCst), 1);
}

#[test]
fn ttl_expires_lazily_without_scanner() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 0);

    let (value, closed) = tracked(1, 1);
    cache
        .set("k", value, Ttl::After(Duration::from_millis(50)))
        .expect("set");

    thread::sleep(Duration::from_millis(100));

    // Still physically present until an observation sweeps it.
    assert_eq!(cache.item_count(), 1);

    assert!(cache.get("k").is_none());
    assert_eq!(cache.item_count(), 0);
    assert_eq!(cache.byte_total(), 0);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn duplicate_key_keeps_first_value() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 0);

    cache.set("k", tracked(1, 1).0, Ttl::Never).expect("set");
    let err = cache.set("k", tracked(2, 1).0, Ttl::Never).unwrap_err();

    assert_eq!(err, FlexError::DuplicateKey);
    assert_eq!(cache.get("k").expect("first value").tag, 1);
}

#[test]
fn clear_closes_every_value() {
    let cache = build_cache(EvictionPolicy::Lru, 5, 0);

    let mut counters = Vec::new();
    for i in 0..5u64 {
        let (value, closed) = tracked(i, 1);
        cache.set(format!("k{i}"), value, Ttl::Never).expect("set");
        counters.push(closed);
    }

    cache.clear();

    for closed in &counters {
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
    assert_eq!(cache.item_count(), 0);
    assert_eq!(cache.byte_total(), 0);

    // Clearing again is a no-op: counters stay at exactly one.
    cache.clear();
    for closed in &counters {
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn ttl_window_is_visible_then_absent() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 0);

    let (value, closed) = tracked(1, 1);
    cache
        .set("k", value, Ttl::After(Duration::from_millis(300)))
        .expect("set");

    assert_eq!(cache.get("k").expect("fresh").tag, 1);

    thread::sleep(Duration::from_millis(350));
    assert!(cache.get("k").is_none());
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn wall_clock_deadlines_convert_at_entry() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 0);

    let future = SystemTime::now() + Duration::from_millis(200);
    cache.set("soon", tracked(1, 1).0, Ttl::At(future)).expect("set");
    assert!(cache.get("soon").is_some());

    let past = SystemTime::now() - Duration::from_secs(5);
    cache.set("stale", tracked(2, 1).0, Ttl::At(past)).expect("set");
    assert!(cache.get("stale").is_none());

    thread::sleep(Duration::from_millis(250));
    assert!(cache.get("soon").is_none());
}

#[test]
fn periodic_scan_sweeps_on_set() {
    let cache: FlexCache<Tracked> = FlexCache::with_config(CacheConfig {
        eviction_policy: EvictionPolicy::Lru,
        scan_interval: Duration::from_millis(10),
        max_items: 0,
        max_bytes: 0,
    });

    let (value, closed) = tracked(1, 1);
    cache
        .set("short", value, Ttl::After(Duration::from_millis(20)))
        .expect("set");

    thread::sleep(Duration::from_millis(50));

    // The due sweep runs as part of this set; no get ever touches "short".
    cache.set("other", tracked(2, 1).0, Ttl::Never).expect("set");

    assert_eq!(cache.item_count(), 1);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn explicit_scan_removes_expired_entries() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 0);

    let (value, closed) = tracked(1, 1);
    cache
        .set("k", value, Ttl::After(Duration::from_millis(20)))
        .expect("set");
    cache.set("keep", tracked(2, 1).0, Ttl::Never).expect("set");

    thread::sleep(Duration::from_millis(50));
    cache.scan();

    assert_eq!(cache.item_count(), 1);
    assert_eq!(cache.byte_total(), 1);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(cache.get("keep").is_some());
}

#[test]
fn expired_key_still_blocks_reinsert_until_observed() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 0);

    cache
        .set("k", tracked(1, 1).0, Ttl::After(Duration::from_millis(20)))
        .expect("set");
    thread::sleep(Duration::from_millis(50));

    // Physically present, so set still refuses the key.
    let err = cache.set("k", tracked(2, 1).0, Ttl::Never).unwrap_err();
    assert_eq!(err, FlexError::DuplicateKey);

    assert!(cache.get("k").is_none());
    cache.set("k", tracked(3, 1).0, Ttl::Never).expect("set after sweep");
    assert_eq!(cache.get("k").expect("hit").tag, 3);
}

#[test]
fn random_policy_eventually_victimizes_everyone() {
    let members = ["m0", "m1", "m2", "m3"];
    let mut victim_seen = [false; 4];

    for _ in 0..200 {
        let cache = build_cache(EvictionPolicy::Random, 4, 0);
        for (i, member) in members.iter().enumerate() {
            cache.set(member, tracked(i as u64, 1).0, Ttl::Never).expect("set");
        }

        cache.set("extra", tracked(99, 1).0, Ttl::Never).expect("set");
        assert_eq!(cache.item_count(), 4);

        let evicted: Vec<usize> = members
            .iter()
            .enumerate()
            .filter(|(_, member)| cache.get(*member).is_none())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(evicted.len(), 1);
        victim_seen[evicted[0]] = true;
    }

    assert_eq!(victim_seen, [true; 4]);
}

#[test]
fn counters_mirror_physical_state() {
    let cache = build_cache(EvictionPolicy::Lru, 0, 0);
    let mut shadow: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    let mut rng = SmallRng::seed_from_u64(0xFEED_F00D);
    for step in 0..500u64 {
        let key = format!("k{}", rng.gen_range(0..24));
        match rng.gen_range(0..3) {
            0 => {
                let weight = rng.gen_range(1..16);
                let outcome = cache.set(&key, tracked(step, weight).0, Ttl::Never);
                if shadow.contains_key(&key) {
                    assert_eq!(outcome, Err(FlexError::DuplicateKey));
                } else {
                    outcome.expect("set");
                    shadow.insert(key, weight);
                }
            }
            1 => {
                assert_eq!(cache.get(&key).is_some(), shadow.contains_key(&key));
            }
            _ => {
                assert_eq!(cache.delete(&key), shadow.remove(&key).is_some());
            }
        }

        assert_eq!(cache.item_count(), shadow.len());
        assert_eq!(cache.byte_total(), shadow.values().sum::<usize>());
    }
}

#[test]
fn close_fires_exactly_once_across_mixed_churn() {
    let cache = build_cache(EvictionPolicy::Lru, 8, 64);
    let mut counters = Vec::new();

    let mut rng = SmallRng::seed_from_u64(0xDEAD_BEEF);
    for step in 0..1000u64 {
        let key = format!("k{}", rng.gen_range(0..32));
        match rng.gen_range(0..100) {
            0..=49 => {
                let (value, closed) = tracked(step, rng.gen_range(1..12));
                if cache.set(&key, value, Ttl::Never).is_ok() {
                    counters.push(closed);
                }
            }
            50..=79 => {
                cache.get(&key);
            }
            80..=94 => {
                cache.delete(&key);
            }
            95..=97 => {
                cache.scan();
            }
            _ => {
                cache.clear();
            }
        }
    }

    cache.clear();
    assert_eq!(cache.item_count(), 0);
    assert_eq!(cache.byte_total(), 0);
    for closed in &counters {
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
