//! Route lookup and the reload-driven route registry.
//!
//! # Responsibilities
//! - Compile the active configuration's routes into matchers, per endpoint
//! - Look up the first matching route for a request
//! - Rebuild the table whenever the store signals a reload
//!
//! # Design Decisions
//! - A compiled table is immutable; a reload swaps in a new one (ArcSwap)
//! - First match wins, in document order
//! - Routes with no matcher or an unknown app are skipped, not fatal
//! - The reload signal carries nothing; the registry always re-reads the store

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;
use tokio::sync::broadcast;

use crate::config::schema::{CanonicalConfig, StaticData};
use crate::routing::matcher::{compile, RequestMatcher};
use crate::store::{ConfigStore, ReloadReceiver};

#[derive(Debug)]
struct CompiledRoute {
    app_id: String,
    static_data: StaticData,
    matcher: Box<dyn RequestMatcher>,
}

/// The outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResolution {
    pub app_id: String,
    pub static_data: StaticData,
    pub params: HashMap<String, String>,
}

/// Compiled routes keyed by endpoint ID.
#[derive(Debug, Default)]
pub struct RouteTable {
    endpoints: HashMap<String, Vec<CompiledRoute>>,
    listeners: HashMap<String, Vec<String>>,
}

impl RouteTable {
    pub fn from_config(config: &CanonicalConfig) -> Self {
        let mut table = RouteTable::default();

        for endpoint in &config.endpoints {
            let mut compiled = Vec::with_capacity(endpoint.routes.len());
            for route in &endpoint.routes {
                let Some(matcher) = &route.matcher else {
                    continue;
                };
                if config.app(&route.app_id).is_none() {
                    tracing::debug!(
                        endpoint = %endpoint.id,
                        app_id = %route.app_id,
                        "Skipping route to unknown app"
                    );
                    continue;
                }
                compiled.push(CompiledRoute {
                    app_id: route.app_id.clone(),
                    static_data: route.static_data.clone(),
                    matcher: compile(matcher),
                });
            }

            for listener_id in &endpoint.listener_ids {
                table
                    .listeners
                    .entry(listener_id.clone())
                    .or_default()
                    .push(endpoint.id.clone());
            }
            table.endpoints.insert(endpoint.id.clone(), compiled);
        }

        table
    }

    /// First route of `endpoint_id` matching the request.
    pub fn find(&self, endpoint_id: &str, req: &Request<Body>) -> Option<RouteResolution> {
        self.endpoints
            .get(endpoint_id)?
            .iter()
            .find(|route| route.matcher.matches(Some(req)))
            .map(|route| RouteResolution {
                app_id: route.app_id.clone(),
                static_data: route.static_data.clone(),
                params: route.matcher.extract_params(Some(req)),
            })
    }

    /// First route matching the request across the endpoints served on a listener.
    pub fn find_for_listener(
        &self,
        listener_id: &str,
        req: &Request<Body>,
    ) -> Option<RouteResolution> {
        self.listeners
            .get(listener_id)?
            .iter()
            .find_map(|endpoint_id| self.find(endpoint_id, req))
    }

    pub fn route_count(&self) -> usize {
        self.endpoints.values().map(Vec::len).sum()
    }
}

/// Holds the current route table and rebuilds it on reload.
pub struct RouteRegistry {
    store: Arc<ConfigStore>,
    table: ArcSwap<RouteTable>,
}

impl RouteRegistry {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        let table = RouteTable::from_config(&store.snapshot());
        Self {
            store,
            table: ArcSwap::from_pointee(table),
        }
    }

    pub fn current(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Recompile from whatever the store holds now.
    pub fn rebuild(&self) {
        let table = RouteTable::from_config(&self.store.get());
        tracing::info!(routes = table.route_count(), "Route table rebuilt");
        self.table.store(Arc::new(table));
    }

    /// Rebuild on every reload signal until shutdown or until the store is dropped.
    pub async fn run(
        self: Arc<Self>,
        mut reload: ReloadReceiver,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                changed = reload.changed() => {
                    if !changed {
                        break;
                    }
                    self.rebuild();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Route registry stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::parser::RawDocument;

    const CONFIG: &str = r#"
        [[listeners]]
        id = "public"
        address = ":8080"
        type = "http"

        [[endpoints]]
        id = "main"
        listener_ids = ["public"]

        [[endpoints.routes]]
        app_id = "api"
        http = { path_prefix = "/api" }
        static_data = { tier = "gold" }

        [[endpoints.routes]]
        app_id = "missing"
        http = { path_prefix = "/ghost" }

        [[endpoints.routes]]
        app_id = "fallback"
        http = { path_prefix = "/" }

        [[apps]]
        id = "api"
        type = "echo"

        [[apps]]
        id = "fallback"
        type = "echo"
    "#;

    fn request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::default()).unwrap()
    }

    fn table() -> RouteTable {
        let store = ConfigStore::empty();
        store.update(&RawDocument::toml(CONFIG)).unwrap();
        RouteTable::from_config(&store.get())
    }

    #[test]
    fn test_first_match_wins() {
        let table = table();

        let resolved = table.find("main", &request("/api/users")).unwrap();
        assert_eq!(resolved.app_id, "api");
        assert_eq!(resolved.static_data.get("tier").unwrap(), "gold");

        assert_eq!(table.find("main", &request("/other")).unwrap().app_id, "fallback");
        assert!(table.find("nope", &request("/api")).is_none());
    }

    #[test]
    fn test_unknown_app_is_skipped() {
        let table = table();
        assert_eq!(table.route_count(), 2);
        assert_eq!(table.find("main", &request("/ghost")).unwrap().app_id, "fallback");
    }

    #[test]
    fn test_find_for_listener() {
        let table = table();
        assert_eq!(
            table.find_for_listener("public", &request("/api")).unwrap().app_id,
            "api"
        );
        assert!(table.find_for_listener("private", &request("/api")).is_none());
    }

    #[tokio::test]
    async fn test_registry_rebuilds_on_reload() {
        let store = Arc::new(ConfigStore::empty());
        let receiver = store.subscribe().unwrap();
        let registry = Arc::new(RouteRegistry::new(store.clone()));
        assert_eq!(registry.current().route_count(), 0);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(registry.clone().run(receiver, shutdown_rx));

        store.update(&RawDocument::toml(CONFIG)).unwrap();
        for _ in 0..50 {
            if registry.current().route_count() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(registry.current().route_count(), 2);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
    }
}
