//! Collection discovery.
//!
//! The backend's collection listing is only a hint: it may be missing,
//! incomplete or refused. A discovery pass therefore probes the union of the
//! server-reported names and a configured seed vocabulary, and keeps every
//! candidate that answers with at least one item. Collections outside both
//! lists are not found.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ListResponse};
use crate::config::DiscoveryConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::Session;
use crate::traits::HttpError;

/// Items of one collection, keyed by item key.
pub type Collection = Map<String, Value>;

/// Snapshot of every non-empty collection found by one discovery pass.
///
/// Ordered by name, so two passes over the same backend compare equal
/// regardless of the order in which probes completed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSet {
    collections: BTreeMap<String, Collection>,
}

impl CollectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, items: Collection) {
        self.collections.insert(name.into(), items);
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Collection names in ascending order.
    pub fn names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Item count across all collections.
    pub fn total_items(&self) -> usize {
        self.collections.values().map(Map::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Collection)> {
        self.collections.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Collection> {
        self.collections
    }
}

impl FromIterator<(String, Collection)> for CollectionSet {
    fn from_iter<T: IntoIterator<Item = (String, Collection)>>(iter: T) -> Self {
        Self {
            collections: iter.into_iter().collect(),
        }
    }
}

/// Why a candidate was left out of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Answered, but with no items or without `success`
    Empty,
    /// 401: the credential was rejected
    Unauthorized,
    /// 403: the collection exists but is not readable by this user
    Denied,
    /// 404
    NotFound,
    /// Any other non-2xx status
    Failed { status: u16 },
    /// No response at all
    Unreachable,
    /// A response that could not be decoded
    Malformed(String),
}

/// Result of a discovery pass, with the fate of every candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// Non-empty collections found
    pub collections: CollectionSet,
    /// Candidates left out, by name
    pub skipped: BTreeMap<String, SkipReason>,
    /// Names the server reported before probing
    pub server_names: Vec<String>,
}

impl DiscoveryReport {
    /// Number of candidates probed.
    pub fn probed(&self) -> usize {
        self.collections.len() + self.skipped.len()
    }

    /// Candidates the user may not read.
    pub fn denied(&self) -> Vec<&str> {
        self.skipped
            .iter()
            .filter(|(_, reason)| **reason == SkipReason::Denied)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Merge server-reported names with the seed vocabulary.
///
/// Server names come first; each name appears once, at its first position.
pub fn merge_candidates(server_names: &[String], seeds: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    server_names
        .iter()
        .chain(seeds.iter())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Reconstructs the set of non-empty collections visible to a session.
#[derive(Debug, Clone)]
pub struct CollectionDiscovery {
    api: ApiClient,
    config: DiscoveryConfig,
}

impl CollectionDiscovery {
    pub fn new(api: ApiClient, config: DiscoveryConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run a pass and return only the snapshot.
    pub async fn discover_all(&self, session: &Session) -> ConsoleResult<CollectionSet> {
        Ok(self.discover(session).await?.collections)
    }

    /// Run a pass and report every candidate.
    ///
    /// Per-candidate failures are recorded, not returned. The pass fails only
    /// when the session has no credential, when every probe went unanswered
    /// (`Transport`), or when every probe was refused with 401
    /// (`Unauthenticated`).
    pub async fn discover(&self, session: &Session) -> ConsoleResult<DiscoveryReport> {
        session.require_credential()?;

        let server_names = match self.api.collection_names(session).await {
            Ok(names) => names,
            Err(e) => {
                debug!("Collection listing unavailable, using seed list only: {}", e);
                Vec::new()
            }
        };

        let candidates = merge_candidates(&server_names, &self.config.seed_collections);
        let mut report = DiscoveryReport {
            server_names,
            ..DiscoveryReport::default()
        };
        if candidates.is_empty() {
            return Ok(report);
        }

        debug!(
            "Probing {} candidate collections ({} in flight)",
            candidates.len(),
            self.config.concurrency
        );

        let api = self.api.clone();
        let owned_session = session.clone();
        let outcomes: Vec<(String, ConsoleResult<ListResponse>)> = stream::iter(candidates)
            .map(move |name| {
                let api = api.clone();
                let session = owned_session.clone();
                async move {
                    let result = api.list(&session, &name).await;
                    (name, result)
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut transport_error: Option<HttpError> = None;
        for (name, outcome) in outcomes {
            match outcome {
                Ok(listing) if listing.success && !listing.items.is_empty() => {
                    debug!("Collection '{}' has {} items", name, listing.items.len());
                    report.collections.insert(name, listing.items);
                }
                Ok(_) => {
                    report.skipped.insert(name, SkipReason::Empty);
                }
                Err(err) => {
                    let reason = classify(&name, &err);
                    if let ConsoleError::Transport(e) = err {
                        transport_error.get_or_insert(e);
                    }
                    report.skipped.insert(name, reason);
                }
            }
        }

        if report.collections.is_empty() {
            let all = |wanted: SkipReason| report.skipped.values().all(|r| *r == wanted);
            if all(SkipReason::Unreachable) {
                if let Some(e) = transport_error {
                    warn!("Discovery failed: backend unreachable");
                    return Err(ConsoleError::Transport(e));
                }
            }
            if all(SkipReason::Unauthorized) {
                warn!("Discovery failed: credential rejected");
                return Err(ConsoleError::Unauthenticated);
            }
        }

        info!(
            "Discovery found {} collections ({} items) among {} candidates",
            report.collections.len(),
            report.collections.total_items(),
            report.probed()
        );
        Ok(report)
    }
}

fn classify(name: &str, err: &ConsoleError) -> SkipReason {
    match err {
        ConsoleError::Unauthenticated => SkipReason::Unauthorized,
        ConsoleError::Api { status: 403, .. } => {
            warn!("Skipping '{}': permission denied", name);
            SkipReason::Denied
        }
        ConsoleError::Api { status: 404, .. } => SkipReason::NotFound,
        ConsoleError::Api { status, message } => {
            debug!("Skipping '{}': HTTP {} {}", name, status, message);
            SkipReason::Failed { status: *status }
        }
        ConsoleError::Transport(e) => {
            debug!("Skipping '{}': {}", name, e);
            SkipReason::Unreachable
        }
        other => {
            debug!("Skipping '{}': {}", name, other);
            SkipReason::Malformed(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::session::BearerToken;
    use serde_json::json;
    use std::sync::Arc;

    const BASE: &str = "http://ab.test";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn discovery(mock: &MockHttpClient, seeds: &[&str]) -> CollectionDiscovery {
        CollectionDiscovery::new(
            ApiClient::new(BASE, Arc::new(mock.clone())),
            DiscoveryConfig::default()
                .with_seed_collections(seeds.iter().copied())
                .with_concurrency(4),
        )
    }

    fn session() -> Session {
        Session::authenticated(BearerToken::new("t"), "alice")
    }

    fn list_url(name: &str) -> String {
        format!("{}/data/list/{}", BASE, name)
    }

    #[test]
    fn test_merge_candidates_dedupes_server_first() {
        let merged = merge_candidates(
            &names(&["custom", "sensors", "custom"]),
            &names(&["sensors", "todos"]),
        );
        assert_eq!(merged, names(&["custom", "sensors", "todos"]));
        assert!(merge_candidates(&[], &[]).is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_session_issues_no_request() {
        let mock = MockHttpClient::new();
        let err = discovery(&mock, &["sensors"])
            .discover_all(&Session::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Unauthenticated));
        assert!(mock.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_classifies_each_candidate() {
        let mock = MockHttpClient::new();
        mock.set_response(
            &format!("{}/data/collections", BASE),
            MockResponse::json(200, json!({"success": true, "collections": ["custom"]})),
        );
        mock.set_response(
            &list_url("custom"),
            MockResponse::json(200, json!({"success": true, "items": {"a": 1, "b": 2}})),
        );
        mock.set_response(
            &list_url("empty"),
            MockResponse::json(200, json!({"success": true, "items": {}})),
        );
        mock.set_response(
            &list_url("secret"),
            MockResponse::json(403, json!({"detail": "Forbidden"})),
        );
        mock.set_response(&list_url("gone"), MockResponse::status(404));
        mock.set_response(&list_url("broken"), MockResponse::status(500));
        mock.set_response(
            &list_url("down"),
            MockResponse::Error(HttpError::Timeout("slow".into())),
        );
        mock.set_response(
            &list_url("garbled"),
            MockResponse::Success(crate::traits::Response::new(200, "not json".into())),
        );

        let report = discovery(
            &mock,
            &["empty", "secret", "gone", "broken", "down", "garbled", "custom"],
        )
        .discover(&session())
        .await
        .unwrap();

        assert_eq!(report.server_names, names(&["custom"]));
        assert_eq!(report.collections.names(), vec!["custom"]);
        assert_eq!(report.collections.total_items(), 2);
        assert_eq!(report.probed(), 7);
        assert_eq!(report.skipped["empty"], SkipReason::Empty);
        assert_eq!(report.skipped["secret"], SkipReason::Denied);
        assert_eq!(report.skipped["gone"], SkipReason::NotFound);
        assert_eq!(report.skipped["broken"], SkipReason::Failed { status: 500 });
        assert_eq!(report.skipped["down"], SkipReason::Unreachable);
        assert!(matches!(report.skipped["garbled"], SkipReason::Malformed(_)));
        assert_eq!(report.denied(), vec!["secret"]);

        // "custom" is reported by the server and seeded: probed once
        assert_eq!(mock.requests_to(&list_url("custom")).len(), 1);
    }

    #[tokio::test]
    async fn test_success_flag_required() {
        let mock = MockHttpClient::new();
        mock.set_response(&format!("{}/data/collections", BASE), MockResponse::status(404));
        mock.set_response(
            &list_url("sensors"),
            MockResponse::json(200, json!({"success": false, "items": {"k": 1}})),
        );

        let report = discovery(&mock, &["sensors"])
            .discover(&session())
            .await
            .unwrap();
        assert!(report.collections.is_empty());
        assert_eq!(report.skipped["sensors"], SkipReason::Empty);
    }

    #[tokio::test]
    async fn test_all_unreachable_is_transport_error() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".into(),
        )));

        let err = discovery(&mock, &["sensors", "todos"])
            .discover_all(&session())
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Transport(_)));
    }

    #[tokio::test]
    async fn test_all_unauthorized_is_unauthenticated() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(401, json!({"detail": "Invalid token"})));

        let err = discovery(&mock, &["sensors", "todos"])
            .discover_all(&session())
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_partial_failures_are_swallowed() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".into(),
        )));
        mock.set_response(
            &list_url("todos"),
            MockResponse::json(200, json!({"success": true, "items": {}})),
        );

        let set = discovery(&mock, &["sensors", "todos"])
            .discover_all(&session())
            .await
            .unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::json(200, json!({"success": true, "collections": []})));

        let set = discovery(&mock, &[]).discover_all(&session()).await.unwrap();
        assert!(set.is_empty());
        assert_eq!(mock.get_requests().len(), 1);
    }
}
