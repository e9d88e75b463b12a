//! Route lookup.
//!
//! # Responsibilities
//! - Store the ordered rule list
//! - Reject malformed tables at startup (missing catch-all, shadowed rules)
//! - Look up the first rule matching a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan in declared order (rule counts are tiny)
//! - Lookup is total: the mandatory catch-all makes a miss impossible

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::routing::matcher::PathPrefix;
use crate::routing::weighted::{SplitPolicy, Weight};
use crate::upstream::{Backend, BackendError};

/// Startup-time route table defects.
#[derive(Debug, thiserror::Error)]
pub enum RouteTableError {
    #[error("route table is empty")]
    Empty,

    #[error("route table must end with a catch-all '/' rule, last rule is {last:?} ({prefix})")]
    MissingCatchAll { last: String, prefix: String },

    #[error("route {route:?}: prefix {prefix:?} must start with '/'")]
    RelativePrefix { route: String, prefix: String },

    #[error("route {route:?} ({prefix}) is unreachable, {shadowed_by:?} ({by_prefix}) matches first")]
    Shadowed {
        route: String,
        prefix: String,
        shadowed_by: String,
        by_prefix: String,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One routing rule.
#[derive(Debug, Clone)]
pub struct Route {
    /// Rule identifier for logging/metrics.
    pub name: String,
    pub prefix: PathPrefix,
    pub policy: SplitPolicy,
}

impl Route {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>, policy: SplitPolicy) -> Self {
        Self {
            name: name.into(),
            prefix: PathPrefix::new(prefix),
            policy,
        }
    }
}

/// The outcome of routing one request. Lives only as long as that request.
#[derive(Debug, Clone, Copy)]
pub struct RoutingDecision<'a> {
    pub route: &'a Route,
    pub backend: &'a Arc<Backend>,
}

/// Ordered, validated rule list. First match wins.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Validate and freeze a rule list.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteTableError> {
        let last = routes.last().ok_or(RouteTableError::Empty)?;
        if !last.prefix.is_universal() {
            return Err(RouteTableError::MissingCatchAll {
                last: last.name.clone(),
                prefix: last.prefix.to_string(),
            });
        }

        for (i, route) in routes.iter().enumerate() {
            if !route.prefix.is_absolute() {
                return Err(RouteTableError::RelativePrefix {
                    route: route.name.clone(),
                    prefix: route.prefix.to_string(),
                });
            }
            if let Some(earlier) = routes[..i].iter().find(|r| r.prefix.covers(&route.prefix)) {
                return Err(RouteTableError::Shadowed {
                    route: route.name.clone(),
                    prefix: route.prefix.to_string(),
                    shadowed_by: earlier.name.clone(),
                    by_prefix: earlier.prefix.to_string(),
                });
            }
        }

        Ok(Self { routes })
    }

    /// Build the migration rule set from configuration:
    ///
    /// 1. movies health → movies
    /// 2. movies → weighted(movies, monolith)
    /// 3. events → events
    /// 4. `/` → monolith
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteTableError> {
        let monolith = Arc::new(Backend::new("monolith", &config.upstreams.monolith_url)?);
        let movies = Arc::new(Backend::new("movies", &config.upstreams.movies_url)?);
        let events = Arc::new(Backend::new("events", &config.upstreams.events_url)?);

        Self::new(vec![
            Route::new(
                "movies-health",
                config.paths.movies_health.as_str(),
                SplitPolicy::Static(movies.clone()),
            ),
            Route::new(
                "movies",
                config.paths.movies.as_str(),
                SplitPolicy::Weighted {
                    primary: movies,
                    secondary: monolith.clone(),
                    weight: Weight::clamped(config.migration.percent),
                    enabled: config.migration.gradual,
                },
            ),
            Route::new(
                "events",
                config.paths.events.as_str(),
                SplitPolicy::Static(events),
            ),
            Route::new("default", "/", SplitPolicy::Static(monolith)),
        ])
    }

    /// Find the first rule matching `path`.
    pub fn match_path(&self, path: &str) -> &Route {
        // The constructor guarantees a universal last rule.
        self.routes
            .iter()
            .find(|route| route.prefix.matches(path))
            .unwrap_or_else(|| &self.routes[self.routes.len() - 1])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(name: &str, port: u16) -> Arc<Backend> {
        Arc::new(Backend::new(name, &format!("http://127.0.0.1:{}", port)).unwrap())
    }

    fn default_table() -> RouteTable {
        RouteTable::from_config(&GatewayConfig::default()).unwrap()
    }

    #[test]
    fn default_rule_order() {
        let table = default_table();
        let names: Vec<_> = table.routes().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["movies-health", "movies", "events", "default"]);
    }

    #[test]
    fn first_match_wins() {
        let table = default_table();
        assert_eq!(table.match_path("/api/movies/health").name, "movies-health");
        assert_eq!(table.match_path("/api/movies/health/db").name, "movies-health");
        assert_eq!(table.match_path("/api/movies").name, "movies");
        assert_eq!(table.match_path("/api/movies/42").name, "movies");
        assert_eq!(table.match_path("/api/events/movie").name, "events");
    }

    #[test]
    fn partial_segment_falls_through_to_catch_all() {
        let table = default_table();
        assert_eq!(table.match_path("/api/moviesextra").name, "default");
        assert_eq!(table.match_path("/api/movies-health").name, "default");
        assert_eq!(table.match_path("/api/eventsource").name, "default");
    }

    #[test]
    fn unrelated_paths_go_to_monolith() {
        let table = default_table();
        for path in ["/", "/api/users", "/api/payments/9", "/favicon.ico"] {
            let route = table.match_path(path);
            assert_eq!(route.name, "default");
            assert!(matches!(&route.policy, SplitPolicy::Static(b) if b.name() == "monolith"));
        }
    }

    #[test]
    fn gradual_flag_and_weight_flow_into_policy() {
        let mut config = GatewayConfig::default();
        config.migration.gradual = false;
        config.migration.percent = 140;
        let table = RouteTable::from_config(&config).unwrap();

        match &table.match_path("/api/movies").policy {
            SplitPolicy::Weighted {
                weight, enabled, ..
            } => {
                assert_eq!(weight.percent(), 100);
                assert!(!enabled);
            }
            other => panic!("expected weighted policy, got {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(RouteTable::new(vec![]), Err(RouteTableError::Empty)));
    }

    #[test]
    fn rejects_missing_catch_all() {
        let err = RouteTable::new(vec![Route::new(
            "movies",
            "/api/movies",
            SplitPolicy::Static(backend("movies", 8081)),
        )])
        .unwrap_err();
        assert!(matches!(err, RouteTableError::MissingCatchAll { .. }));
    }

    #[test]
    fn rejects_health_rule_after_generic_rule() {
        let movies = backend("movies", 8081);
        let err = RouteTable::new(vec![
            Route::new("movies", "/api/movies", SplitPolicy::Static(movies.clone())),
            Route::new("movies-health", "/api/movies/health", SplitPolicy::Static(movies)),
            Route::new("default", "/", SplitPolicy::Static(backend("monolith", 8080))),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RouteTableError::Shadowed { ref route, .. } if route == "movies-health"
        ));
    }

    #[test]
    fn rejects_early_catch_all() {
        let monolith = backend("monolith", 8080);
        let err = RouteTable::new(vec![
            Route::new("default", "/", SplitPolicy::Static(monolith.clone())),
            Route::new("events", "/api/events", SplitPolicy::Static(backend("events", 8082))),
            Route::new("fallback", "/", SplitPolicy::Static(monolith)),
        ])
        .unwrap_err();
        assert!(matches!(err, RouteTableError::Shadowed { .. }));
    }

    #[test]
    fn rejects_relative_prefix() {
        let monolith = backend("monolith", 8080);
        let err = RouteTable::new(vec![
            Route::new("bad", "api", SplitPolicy::Static(monolith.clone())),
            Route::new("default", "/", SplitPolicy::Static(monolith)),
        ])
        .unwrap_err();
        assert!(matches!(err, RouteTableError::RelativePrefix { .. }));
    }

    #[test]
    fn invalid_backend_address_fails_build() {
        let mut config = GatewayConfig::default();
        config.upstreams.events_url = "ftp://events".into();
        assert!(matches!(
            RouteTable::from_config(&config),
            Err(RouteTableError::Backend(_))
        ));
    }
}
