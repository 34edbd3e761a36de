//! Per-session cache of region collections and stale-response detection.
//!
//! Fetching is done by the caller (the browser layer or the CLI); this
//! type only decides whether a fetch is needed and whether a finished
//! fetch may still be committed. Every request gets a fresh generation
//! number, and only the response carrying the latest generation for the
//! requested scope is accepted. Earlier in-flight requests are not
//! cancelled; their responses are discarded when they arrive.

use std::collections::HashMap;
use std::rc::Rc;

use crate::scope::ScopeId;
use crate::types::{LoadError, RegionCollection};

/// Identifies one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    /// Scope being fetched.
    pub scope: ScopeId,
    /// Request generation.
    pub generation: u64,
}

/// What [`ScopeLoader::begin`] decided.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStep {
    /// The scope is cached; no fetch needed.
    Cached(Rc<RegionCollection>),
    /// Fetch the scope's document, then call [`ScopeLoader::complete`].
    Fetch(LoadTicket),
}

/// What [`ScopeLoader::complete`] did with a response.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The collection was cached and should become active.
    Committed(Rc<RegionCollection>),
    /// A newer request superseded this one; the response was dropped.
    Stale,
    /// The fetch failed; an empty collection was cached for the scope.
    Failed(LoadError),
}

/// Region cache and request generations for one session.
#[derive(Debug, Clone, Default)]
pub struct ScopeLoader {
    cache: HashMap<ScopeId, Rc<RegionCollection>>,
    generation: u64,
    in_flight: Option<LoadTicket>,
}

impl ScopeLoader {
    /// An empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `scope`. Cached non-empty collections are returned
    /// directly (and cancel interest in any in-flight fetch); empty or
    /// missing ones need a fetch.
    pub fn begin(&mut self, scope: ScopeId) -> LoadStep {
        self.generation += 1;
        if let Some(cached) = self.cache.get(&scope).filter(|c| !c.is_empty()) {
            tracing::debug!(%scope, "scope served from cache");
            self.in_flight = None;
            return LoadStep::Cached(Rc::clone(cached));
        }
        let ticket = LoadTicket {
            scope,
            generation: self.generation,
        };
        tracing::info!(%scope, generation = ticket.generation, "fetching scope");
        self.in_flight = Some(ticket);
        LoadStep::Fetch(ticket)
    }

    /// Deliver the result of the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<RegionCollection, LoadError>,
    ) -> LoadOutcome {
        if self.in_flight != Some(ticket) {
            tracing::warn!(
                scope = %ticket.scope,
                generation = ticket.generation,
                latest = self.generation,
                "discarding stale scope response",
            );
            return LoadOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(collection) if collection.scope() == ticket.scope => {
                tracing::info!(scope = %ticket.scope, regions = collection.len(), "scope loaded");
                let collection = Rc::new(collection);
                self.cache.insert(ticket.scope, Rc::clone(&collection));
                LoadOutcome::Committed(collection)
            }
            Ok(collection) => {
                tracing::warn!(
                    requested = %ticket.scope,
                    received = %collection.scope(),
                    "discarding response for a different scope",
                );
                LoadOutcome::Stale
            }
            Err(err) => {
                tracing::warn!(scope = %ticket.scope, %err, "scope load failed");
                self.cache
                    .insert(ticket.scope, Rc::new(RegionCollection::empty(ticket.scope)));
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Returns `true` while a fetch is outstanding.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The outstanding fetch, if any.
    #[must_use]
    pub const fn in_flight(&self) -> Option<LoadTicket> {
        self.in_flight
    }

    /// Cached collection for `scope` (possibly empty after a failure).
    #[must_use]
    pub fn cached(&self, scope: ScopeId) -> Option<&Rc<RegionCollection>> {
        self.cache.get(&scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;

    fn collection(scope: ScopeId, names: &[&str]) -> RegionCollection {
        let regions = names
            .iter()
            .map(|n| Region {
                name: (*n).to_owned(),
                geometry: geo::MultiPolygon::new(vec![]),
                properties: serde_json::Map::new(),
            })
            .collect();
        RegionCollection::new(scope, regions)
    }

    fn ticket(step: LoadStep) -> LoadTicket {
        match step {
            LoadStep::Fetch(t) => t,
            LoadStep::Cached(_) => unreachable!("expected a fetch"),
        }
    }

    #[test]
    fn first_request_fetches_then_caches() {
        let mut loader = ScopeLoader::new();
        let t = ticket(loader.begin(ScopeId::World));
        assert!(loader.is_loading());
        let outcome = loader.complete(t, Ok(collection(ScopeId::World, &["A"])));
        assert!(matches!(outcome, LoadOutcome::Committed(ref c) if c.len() == 1));
        assert!(!loader.is_loading());
        assert!(matches!(loader.begin(ScopeId::World), LoadStep::Cached(_)));
    }

    #[test]
    fn superseded_response_is_stale() {
        let mut loader = ScopeLoader::new();
        let world = ticket(loader.begin(ScopeId::World));
        let states = ticket(loader.begin(ScopeId::UsStates));
        assert_eq!(
            loader.complete(world, Ok(collection(ScopeId::World, &["A"]))),
            LoadOutcome::Stale
        );
        assert!(loader.cached(ScopeId::World).is_none());
        let outcome = loader.complete(states, Ok(collection(ScopeId::UsStates, &["Ohio"])));
        assert!(matches!(outcome, LoadOutcome::Committed(_)));
    }

    #[test]
    fn re_requesting_the_same_scope_invalidates_older_ticket() {
        let mut loader = ScopeLoader::new();
        let first = ticket(loader.begin(ScopeId::World));
        let second = ticket(loader.begin(ScopeId::World));
        assert_ne!(first, second);
        assert_eq!(loader.complete(first, Ok(collection(ScopeId::World, &["A"]))), LoadOutcome::Stale);
    }

    #[test]
    fn cache_hit_discards_in_flight_fetch() {
        let mut loader = ScopeLoader::new();
        let t = ticket(loader.begin(ScopeId::World));
        loader.complete(t, Ok(collection(ScopeId::World, &["A"])));
        let states = ticket(loader.begin(ScopeId::UsStates));
        assert!(matches!(loader.begin(ScopeId::World), LoadStep::Cached(_)));
        assert_eq!(
            loader.complete(states, Ok(collection(ScopeId::UsStates, &["Ohio"]))),
            LoadOutcome::Stale
        );
    }

    #[test]
    fn failure_caches_empty_and_refetches() {
        let mut loader = ScopeLoader::new();
        let t = ticket(loader.begin(ScopeId::CanadaProvinces));
        let outcome = loader.complete(t, Err(LoadError::Http { status: 404 }));
        assert_eq!(outcome, LoadOutcome::Failed(LoadError::Http { status: 404 }));
        assert!(loader.cached(ScopeId::CanadaProvinces).is_some_and(|c| c.is_empty()));
        assert!(matches!(loader.begin(ScopeId::CanadaProvinces), LoadStep::Fetch(_)));
    }

    #[test]
    fn response_for_wrong_scope_is_stale() {
        let mut loader = ScopeLoader::new();
        let t = ticket(loader.begin(ScopeId::World));
        assert_eq!(
            loader.complete(t, Ok(collection(ScopeId::UsStates, &["Ohio"]))),
            LoadOutcome::Stale
        );
    }
}
