//! Route matching logic.
//!
//! # Responsibilities
//! - Decide whether a request satisfies one configured route condition
//! - Extract path parameters where a matcher supports them
//!
//! # Design Decisions
//! - Path matching is a literal, case-sensitive string prefix (not segment-aware)
//! - Empty prefix = always matches (wildcard)
//! - An absent request never matches and never errors
//! - Matchers are immutable after construction and shared across requests

use std::collections::HashMap;

use axum::body::Body;
use axum::http::Request;

use crate::config::schema::RouteMatcher;

/// Trait for matching requests against a route condition.
pub trait RequestMatcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request is present and matches this condition.
    fn matches(&self, req: Option<&Request<Body>>) -> bool;

    /// Path parameters captured from the request.
    fn extract_params(&self, req: Option<&Request<Body>>) -> HashMap<String, String>;
}

/// Build the matcher for a canonical route condition.
pub fn compile(matcher: &RouteMatcher) -> Box<dyn RequestMatcher> {
    match matcher {
        RouteMatcher::HttpPathPrefix(prefix) => {
            Box::new(HttpPathPrefixMatcher::new(prefix.clone()))
        }
        RouteMatcher::GrpcService(service) => Box::new(GrpcServiceMatcher::new(service.clone())),
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct HttpPathPrefixMatcher {
    prefix: String,
}

impl HttpPathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl RequestMatcher for HttpPathPrefixMatcher {
    fn matches(&self, req: Option<&Request<Body>>) -> bool {
        req.is_some_and(|req| req.uri().path().starts_with(&self.prefix))
    }

    fn extract_params(&self, _req: Option<&Request<Body>>) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Matches gRPC calls to one fully-qualified service (`/<service>/<method>`).
#[derive(Debug, Clone)]
pub struct GrpcServiceMatcher {
    service: String,
    path_prefix: String,
}

impl GrpcServiceMatcher {
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let path_prefix = format!("/{}/", service);
        Self {
            service,
            path_prefix,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl RequestMatcher for GrpcServiceMatcher {
    fn matches(&self, req: Option<&Request<Body>>) -> bool {
        req.is_some_and(|req| req.uri().path().starts_with(&self.path_prefix))
    }

    /// Captures the called method as `method`.
    fn extract_params(&self, req: Option<&Request<Body>>) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(method) = req
            .and_then(|req| req.uri().path().strip_prefix(self.path_prefix.as_str()))
            .filter(|method| !method.is_empty())
        {
            params.insert("method".to_string(), method.to_string());
        }
        params
    }
}
