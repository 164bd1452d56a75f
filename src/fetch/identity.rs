//! Identity rotation for fingerprint reduction

use crate::config::ClientIdentity;
use rand::seq::SliceRandom;

/// Fixed pool of browser identities; each fetch attempt draws one at random
pub struct IdentityPool {
    identities: Vec<ClientIdentity>,
}

impl IdentityPool {
    /// Build a pool. An empty slice falls back to a single generic identity
    /// so the fetcher never sends a request with no user agent.
    pub fn new(identities: &[ClientIdentity]) -> Self {
        let identities = if identities.is_empty() {
            vec![ClientIdentity {
                user_agent: "Mozilla/5.0 (compatible; DealWatch/0.1)".to_string(),
                accept_language: "en-US,en;q=0.9".to_string(),
            }]
        } else {
            identities.to_vec()
        };
        Self { identities }
    }

    pub fn pick(&self) -> &ClientIdentity {
        self.identities
            .choose(&mut rand::thread_rng())
            .expect("pool is never empty")
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;

    #[test]
    fn picks_from_configured_pool() {
        let config = FetchConfig::default();
        let pool = IdentityPool::new(&config.identities);
        let agents: Vec<&str> = config.identities.iter().map(|i| i.user_agent.as_str()).collect();
        for _ in 0..20 {
            assert!(agents.contains(&pool.pick().user_agent.as_str()));
        }
    }

    #[test]
    fn empty_pool_gets_a_fallback() {
        let pool = IdentityPool::new(&[]);
        assert_eq!(pool.len(), 1);
        assert!(pool.pick().user_agent.contains("DealWatch"));
    }
}
