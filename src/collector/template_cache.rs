//! Per-exporter template cache (§3, §4.3, §4.5).
//!
//! Keyed by `(remote address, observation-domain-id, template-id)` — two
//! exporters may legally reuse the same (observation-domain-id,
//! template-id) pair with different field lists (§9), so the remote
//! address is part of the key rather than a separate top-level map per
//! connection.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::codec::set::{OptionsTemplate, Template};

use super::ttl::{TemplateMetadata, TtlConfig};

/// Either kind of template record a data set may be decoded against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateDef {
    Template(Template),
    OptionsTemplate(OptionsTemplate),
}

impl TemplateDef {
    pub fn fields(&self) -> Vec<crate::codec::set::TemplateField> {
        match self {
            TemplateDef::Template(t) => t.fields.clone(),
            TemplateDef::OptionsTemplate(t) => t.all_fields(),
        }
    }

    pub fn fixed_record_length(&self) -> Option<usize> {
        match self {
            TemplateDef::Template(t) => t.fixed_record_length(),
            TemplateDef::OptionsTemplate(t) => t.fixed_record_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    remote: SocketAddr,
    observation_domain_id: u32,
    template_id: u16,
}

/// Live template state for one collector (§4.3 "Template cache").
/// Mutated only by the owning connection/UDP task; the sweeper only ever
/// removes expired entries.
#[derive(Debug)]
pub struct TemplateCache {
    ttl: TtlConfig,
    entries: HashMap<CacheKey, (TemplateDef, TemplateMetadata)>,
}

impl TemplateCache {
    pub fn new(ttl: TtlConfig) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Installs or replaces a template, resetting its TTL deadline
    /// (`live -> live` in the template-entry state machine, §4.5).
    pub fn insert(
        &mut self,
        remote: SocketAddr,
        observation_domain_id: u32,
        template_id: u16,
        def: TemplateDef,
    ) {
        let key = CacheKey {
            remote,
            observation_domain_id,
            template_id,
        };
        self.entries.insert(key, (def, TemplateMetadata::new()));
    }

    /// Looks up a live template, evicting it lazily if its deadline has
    /// passed (§4.3: "expired entries are evicted lazily on lookup").
    pub fn get(
        &mut self,
        remote: SocketAddr,
        observation_domain_id: u32,
        template_id: u16,
    ) -> Option<&TemplateDef> {
        let key = CacheKey {
            remote,
            observation_domain_id,
            template_id,
        };
        if let Some((_, metadata)) = self.entries.get(&key) {
            if self.ttl.duration.as_nanos() > 0 && metadata.is_expired(&self.ttl) {
                self.entries.remove(&key);
                return None;
            }
        }
        self.entries.get(&key).map(|(def, _)| def)
    }

    /// Proactive sweep: removes every entry past its deadline (§4.3 "a
    /// sweeper task wakes every templateTTL/2 and deletes expired
    /// entries"). A no-op when TTL is disabled (zero duration).
    pub fn sweep_expired(&mut self) -> usize {
        if self.ttl.duration.as_nanos() == 0 {
            return 0;
        }
        let before = self.entries.len();
        self.entries.retain(|_, (_, metadata)| !metadata.is_expired(&self.ttl));
        before - self.entries.len()
    }

    pub fn ttl(&self) -> &TtlConfig {
        &self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every template belonging to one exporter, e.g. on connection
    /// close, so a later connection from a different exporter on the same
    /// observation domain doesn't inherit stale state.
    pub fn clear_remote(&mut self, remote: SocketAddr) {
        self.entries.retain(|key, _| key.remote != remote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::set::TemplateField;
    use std::time::Duration;

    fn addr() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    #[test]
    fn stores_and_resolves_by_composite_key() {
        let mut cache = TemplateCache::new(TtlConfig::default());
        let template = Template::new(256, vec![TemplateField { enterprise_id: 0, element_id: 4, length: 1 }]);
        cache.insert(addr(), 0, 256, TemplateDef::Template(template.clone()));
        assert_eq!(cache.get(addr(), 0, 256), Some(&TemplateDef::Template(template)));
        assert_eq!(cache.get(addr(), 1, 256), None, "different observation domain is a different entry");
    }

    #[test]
    fn expired_entry_is_evicted_lazily() {
        let mut cache = TemplateCache::new(TtlConfig::new(Duration::from_millis(50)));
        let template = Template::new(256, vec![]);
        cache.insert(addr(), 0, 256, TemplateDef::Template(template));
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(cache.get(addr(), 0, 256), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_never_expires() {
        let mut cache = TemplateCache::new(TtlConfig::new(Duration::from_secs(0)));
        let template = Template::new(256, vec![]);
        cache.insert(addr(), 0, 256, TemplateDef::Template(template.clone()));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(addr(), 0, 256), Some(&TemplateDef::Template(template)));
    }

    #[test]
    fn sweep_removes_expired_entries_across_exporters() {
        let mut cache = TemplateCache::new(TtlConfig::new(Duration::from_millis(50)));
        cache.insert(addr(), 0, 256, TemplateDef::Template(Template::new(256, vec![])));
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(cache.sweep_expired(), 1);
        assert!(cache.is_empty());
    }
}
