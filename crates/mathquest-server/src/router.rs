//! API route table with regex path matching

use hyper::Method;
use regex::Regex;

/// Operations exposed over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    ListTopics,
    GetTopic,
    UnlockTopic,
    MyProgress,
    UserProgress,
    UserSummary,
    GetProgress,
    UpdateProgress,
    CompleteStage,
    CurrentUser,
}

/// Route table entries: method, anchored path pattern, endpoint
const ROUTES: &[(&str, &str, Endpoint)] = &[
    ("GET", r"^/health$", Endpoint::Health),
    ("GET", r"^/api/topics$", Endpoint::ListTopics),
    ("GET", r"^/api/topics/([^/]+)$", Endpoint::GetTopic),
    ("POST", r"^/api/topics/([^/]+)/unlock$", Endpoint::UnlockTopic),
    ("GET", r"^/api/progress$", Endpoint::MyProgress),
    ("GET", r"^/api/progress/user/([^/]+)$", Endpoint::UserProgress),
    ("GET", r"^/api/progress/user/([^/]+)/summary$", Endpoint::UserSummary),
    ("GET", r"^/api/progress/([^/]+)$", Endpoint::GetProgress),
    ("POST", r"^/api/progress/([^/]+)$", Endpoint::UpdateProgress),
    ("POST", r"^/api/progress/([^/]+)/stages/([^/]+)$", Endpoint::CompleteStage),
    ("GET", r"^/api/user$", Endpoint::CurrentUser),
];

/// Compiled route
struct CompiledRoute {
    method: Method,
    regex: Regex,
    endpoint: Endpoint,
}

/// Result of routing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub endpoint: Endpoint,
    /// Capture groups in pattern order
    pub captures: Vec<String>,
}

/// Why no route matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMiss {
    NotFound,
    /// The path exists under another method
    MethodNotAllowed,
}

/// Router for matching requests to endpoints
pub struct ApiRouter {
    routes: Vec<CompiledRoute>,
}

impl ApiRouter {
    /// Compile the route table
    pub fn new() -> Result<Self, regex::Error> {
        let mut routes = Vec::with_capacity(ROUTES.len());
        for &(method, pattern, endpoint) in ROUTES {
            routes.push(CompiledRoute {
                method: if method == "POST" { Method::POST } else { Method::GET },
                regex: Regex::new(pattern)?,
                endpoint,
            });
        }
        Ok(Self { routes })
    }

    /// Match a request; a single trailing slash is ignored
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch, RouteMiss> {
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };

        let mut path_known = false;
        for route in &self.routes {
            let Some(captures) = route.regex.captures(path) else {
                continue;
            };
            if route.method != *method {
                path_known = true;
                continue;
            }
            let groups: Vec<String> = captures
                .iter()
                .skip(1) // Skip the full match
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();
            return Ok(RouteMatch {
                endpoint: route.endpoint,
                captures: groups,
            });
        }

        Err(if path_known {
            RouteMiss::MethodNotAllowed
        } else {
            RouteMiss::NotFound
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> ApiRouter {
        ApiRouter::new().unwrap()
    }

    #[test]
    fn test_route_topics() {
        let r = router();
        assert_eq!(r.route(&Method::GET, "/api/topics").unwrap().endpoint, Endpoint::ListTopics);

        let m = r.route(&Method::GET, "/api/topics/3").unwrap();
        assert_eq!(m.endpoint, Endpoint::GetTopic);
        assert_eq!(m.captures, vec!["3"]);

        let m = r.route(&Method::POST, "/api/topics/2/unlock").unwrap();
        assert_eq!(m.endpoint, Endpoint::UnlockTopic);
    }

    #[test]
    fn test_route_progress_variants() {
        let r = router();
        let m = r.route(&Method::GET, "/api/progress/user/7").unwrap();
        assert_eq!(m.endpoint, Endpoint::UserProgress);
        assert_eq!(m.captures, vec!["7"]);

        let m = r.route(&Method::GET, "/api/progress/user/7/summary").unwrap();
        assert_eq!(m.endpoint, Endpoint::UserSummary);

        let m = r.route(&Method::POST, "/api/progress/4/stages/teach").unwrap();
        assert_eq!(m.endpoint, Endpoint::CompleteStage);
        assert_eq!(m.captures, vec!["4", "teach"]);

        let m = r.route(&Method::GET, "/api/progress/4/").unwrap();
        assert_eq!(m.endpoint, Endpoint::GetProgress);
    }

    #[test]
    fn test_route_misses() {
        let r = router();
        assert_eq!(r.route(&Method::GET, "/nope"), Err(RouteMiss::NotFound));
        assert_eq!(
            r.route(&Method::DELETE, "/api/topics/1"),
            Err(RouteMiss::MethodNotAllowed)
        );
        assert_eq!(
            r.route(&Method::GET, "/api/topics/1/unlock"),
            Err(RouteMiss::MethodNotAllowed)
        );
    }
}
