//! Paths that bypass identity resolution entirely.
//!
//! Patterns follow the ant-style convention used for the allow-list:
//! `/docs/**` matches `/docs` and everything below it, anything else is an exact match.

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(base) => Self::Subtree(base.to_string()),
            None => Self::Exact(pattern.to_string()),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => p == path,
            Self::Subtree(base) => match path.strip_prefix(base.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublicPaths {
    patterns: Vec<PathPattern>,
}

/// Root/static assets, API docs, auth endpoints and the liveness probe.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/",
    "/index.html",
    "/css/**",
    "/js/**",
    "/images/**",
    "/swagger-ui/**",
    "/swagger-ui.html",
    "/v3/api-docs/**",
    "/swagger-resources/**",
    "/api/auth/**",
    "/health",
];

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PATHS.iter().copied())
    }
}

impl PublicPaths {
    pub fn new<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            patterns: patterns.into_iter().map(PathPattern::parse).collect(),
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}
