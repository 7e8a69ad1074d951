//! Proxy selection for outbound requests.
//!
//! The collector owns one HTTP client per configured proxy; a
//! [`ProxySelector`] decides which of them serves the next request.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::ProxyRotation;

/// Picks a proxy slot from a pool of `pool_len` proxies.
///
/// Returns `None` when the pool is empty (send directly).
pub trait ProxySelector: Send + Sync {
    fn select(&self, pool_len: usize) -> Option<usize>;
}

/// Cycles through the pool, one slot per request, across calls.
#[derive(Debug, Default)]
pub struct RoundRobinSelector {
    next: AtomicUsize,
}

impl RoundRobinSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProxySelector for RoundRobinSelector {
    fn select(&self, pool_len: usize) -> Option<usize> {
        if pool_len == 0 {
            return None;
        }
        Some(self.next.fetch_add(1, Ordering::Relaxed) % pool_len)
    }
}

/// Always the first proxy.
#[derive(Debug, Default)]
pub struct FirstProxySelector;

impl ProxySelector for FirstProxySelector {
    fn select(&self, pool_len: usize) -> Option<usize> {
        (pool_len > 0).then_some(0)
    }
}

/// Build the selector named by the configuration.
pub fn selector_for(rotation: ProxyRotation) -> Box<dyn ProxySelector> {
    match rotation {
        ProxyRotation::RoundRobin => Box::new(RoundRobinSelector::new()),
        ProxyRotation::First => Box::new(FirstProxySelector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_cycles() {
        let sel = RoundRobinSelector::new();
        let picks: Vec<_> = (0..7).map(|_| sel.select(3).unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_round_robin_empty_pool() {
        let sel = RoundRobinSelector::new();
        assert_eq!(sel.select(0), None);
        // An empty pool does not advance the rotation.
        assert_eq!(sel.select(2), Some(0));
    }

    #[test]
    fn test_round_robin_shared_across_threads() {
        let sel = std::sync::Arc::new(RoundRobinSelector::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sel = sel.clone();
                std::thread::spawn(move || (0..100).map(|_| sel.select(4).unwrap()).collect::<Vec<_>>())
            })
            .collect();

        let mut counts = [0usize; 4];
        for h in handles {
            for slot in h.join().unwrap() {
                counts[slot] += 1;
            }
        }
        assert_eq!(counts, [100, 100, 100, 100]);
    }

    #[test]
    fn test_first_proxy() {
        let sel = FirstProxySelector;
        assert_eq!(sel.select(0), None);
        assert_eq!(sel.select(1), Some(0));
        assert_eq!(sel.select(5), Some(0));
        assert_eq!(sel.select(5), Some(0));
    }

    #[test]
    fn test_selector_for_config() {
        let first = selector_for(ProxyRotation::First);
        assert_eq!(first.select(3), Some(0));
        assert_eq!(first.select(3), Some(0));

        let rr = selector_for(ProxyRotation::RoundRobin);
        assert_eq!(rr.select(3), Some(0));
        assert_eq!(rr.select(3), Some(1));
    }
}
