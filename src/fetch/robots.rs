//! robots.txt rules and the per-origin decision cache
//!
//! Parse failures and unreachable robots.txt files degrade to a permissive
//! default: product pages are public, and refusing to check them at all
//! would be worse than fetching politely without directives.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Parsed robots.txt directives for one crawler identity
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    disallow: Vec<String>,
    allow: Vec<String>,
}

impl RobotsRules {
    /// Parse robots.txt content, keeping only the groups that apply to
    /// `user_agent`. A group naming the agent specifically overrides any
    /// wildcard group seen earlier.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let ua_lower = user_agent.to_lowercase();
        let mut rules = RobotsRules::default();
        let mut group_applies = false;
        let mut specific_group_found = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match directive.trim().to_lowercase().as_str() {
                "user-agent" => {
                    let agent = value.to_lowercase();
                    if agent == "*" {
                        group_applies = !specific_group_found;
                    } else if ua_lower.contains(&agent) || agent.contains(&ua_lower) {
                        if !specific_group_found {
                            // first specific match supersedes wildcard rules
                            rules.disallow.clear();
                            rules.allow.clear();
                        }
                        group_applies = true;
                        specific_group_found = true;
                    } else {
                        group_applies = false;
                    }
                }
                "disallow" if group_applies && !value.is_empty() => {
                    rules.disallow.push(value.to_string());
                }
                "allow" if group_applies && !value.is_empty() => {
                    rules.allow.push(value.to_string());
                }
                _ => {}
            }
        }

        rules
    }

    /// Permissive rules used when robots.txt is missing or unparseable
    pub fn allow_all() -> Self {
        RobotsRules::default()
    }

    /// Whether a path may be fetched. Longest matching pattern wins;
    /// an allow pattern wins ties.
    pub fn is_allowed(&self, path: &str) -> bool {
        let longest = |patterns: &[String]| {
            patterns
                .iter()
                .filter(|p| Self::path_matches(path, p))
                .map(|p| p.len())
                .max()
                .unwrap_or(0)
        };
        longest(&self.allow) >= longest(&self.disallow)
    }

    /// Match a path against a robots pattern with `*` wildcards and an
    /// optional `$` end anchor.
    fn path_matches(path: &str, pattern: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }

        let (pattern, anchored) = match pattern.strip_suffix('$') {
            Some(p) => (p, true),
            None => (pattern, false),
        };

        if !pattern.contains('*') {
            return if anchored {
                path == pattern
            } else {
                path.starts_with(pattern)
            };
        }

        let mut pos = 0;
        for (i, part) in pattern.split('*').enumerate() {
            if part.is_empty() {
                continue;
            }
            match path[pos..].find(part) {
                Some(found) => {
                    if i == 0 && found != 0 {
                        return false;
                    }
                    pos += found + part.len();
                }
                None => return false,
            }
        }

        !anchored || pos == path.len()
    }
}

/// One cached robots decision set for an origin
#[derive(Debug, Clone)]
struct CacheEntry {
    rules: RobotsRules,
    fetched_at: Instant,
}

/// Per-origin robots.txt cache with a fixed TTL.
///
/// The only long-lived shared mutable state in the core; entries are simply
/// overwritten once stale.
pub struct RobotsCache {
    entries: LruCache<String, CacheEntry>,
    ttl: Duration,
}

impl RobotsCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("max(1) is non-zero");
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Fresh rules for an origin, if cached and within TTL
    pub fn get(&mut self, origin: &str) -> Option<RobotsRules> {
        let entry = self.entries.get(origin)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.rules.clone())
        } else {
            None
        }
    }

    pub fn put(&mut self, origin: String, rules: RobotsRules) {
        self.entries.put(
            origin,
            CacheEntry {
                rules,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_specific_agent_group() {
        let content = r#"
User-agent: *
Disallow: /private/
Allow: /private/public/

User-agent: DealWatchBot
Disallow: /admin/
"#;
        let rules = RobotsRules::parse(content, "DealWatchBot/0.1 (+respect-robots)");
        // specific group replaces wildcard rules entirely
        assert!(rules.is_allowed("/private/listing"));
        assert!(!rules.is_allowed("/admin/settings"));
        assert!(rules.is_allowed("/catalog/phone.html"));
    }

    #[test]
    fn wildcard_and_anchor_patterns() {
        let content = r#"
User-agent: *
Disallow: /private/
Disallow: /*.pdf$
Allow: /private/readme.txt
"#;
        let rules = RobotsRules::parse(content, "DealWatchBot");
        assert!(!rules.is_allowed("/private/secret"));
        assert!(rules.is_allowed("/private/readme.txt"));
        assert!(!rules.is_allowed("/docs/manual.pdf"));
        assert!(rules.is_allowed("/docs/manual.html"));
    }

    #[test]
    fn path_matching() {
        assert!(RobotsRules::path_matches("/admin/test", "/admin/"));
        assert!(!RobotsRules::path_matches("/public/test", "/admin/"));
        assert!(RobotsRules::path_matches("/images/cat.jpg", "/images/*.jpg"));
        assert!(RobotsRules::path_matches("/page.html", "/page.html$"));
        assert!(!RobotsRules::path_matches("/page.html?q=1", "/page.html$"));
    }

    #[test]
    fn allow_all_permits_everything() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allowed("/anything/at/all"));
    }

    #[test]
    fn cache_expires_entries() {
        let mut cache = RobotsCache::new(4, Duration::from_secs(0));
        cache.put("https://example.com".to_string(), RobotsRules::allow_all());
        // zero TTL means immediately stale
        assert!(cache.get("https://example.com").is_none());

        let mut cache = RobotsCache::new(4, Duration::from_secs(3600));
        cache.put("https://example.com".to_string(), RobotsRules::allow_all());
        assert!(cache.get("https://example.com").is_some());
    }
}
