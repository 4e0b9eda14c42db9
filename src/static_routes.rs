//! Static resource routing.
//!
//! Maps URL path patterns to ordered lists of asset locations. The first
//! pattern matching a request path wins; within it, the first location that
//! contains the requested file wins. A miss is reported as `None` and turned
//! into a 404 by the HTTP layer.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One place assets for a pattern may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    /// Logical location as configured (e.g. `/WEB-INF/pages/css/`)
    base: String,

    /// Directory on disk backing the location
    root: PathBuf,
}

impl ResourceLocation {
    pub fn new(base: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            root: root.into(),
        }
    }

    /// A location inside the web root, e.g. `/WEB-INF/pages/css/`.
    pub fn in_web_root(web_root: &Path, base: &str) -> Self {
        Self::new(base, web_root.join(base.trim_start_matches('/')))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    /// `/prefix/**`: any remainder, including nested directories
    Subtree(String),

    /// `/prefix/*`: a single path segment
    Segment(String),

    /// `/exact/file.css`: only this path; the remainder is its last segment
    Exact(String),
}

impl PathPattern {
    fn parse(pattern: &str) -> Self {
        if let Some(prefix) = pattern.strip_suffix("**") {
            Self::Subtree(prefix.to_string())
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            Self::Segment(prefix.to_string())
        } else {
            Self::Exact(pattern.to_string())
        }
    }

    /// The part of `path` to look up inside a location, if the pattern matches.
    fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        match self {
            Self::Subtree(prefix) => path.strip_prefix(prefix.as_str()),
            Self::Segment(prefix) => path
                .strip_prefix(prefix.as_str())
                .filter(|rest| !rest.contains('/')),
            Self::Exact(exact) => (path == exact).then(|| path.rsplit('/').next()).flatten(),
        }
    }
}

/// A URL pattern and its candidate locations in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    pattern: String,
    matcher: PathPattern,
    locations: Vec<ResourceLocation>,
}

impl StaticRoute {
    pub fn new(pattern: impl Into<String>, locations: Vec<ResourceLocation>) -> Self {
        let pattern = pattern.into();
        Self {
            matcher: PathPattern::parse(&pattern),
            pattern,
            locations,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn locations(&self) -> &[ResourceLocation] {
        &self.locations
    }
}

/// A request path resolved to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Logical location of the file (e.g. `/WEB-INF/pages/css/app.css`)
    pub location: String,

    /// Path of the file on disk
    pub file: PathBuf,
}

/// Ordered static route table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRouteTable {
    routes: Vec<StaticRoute>,
}

impl StaticRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route; earlier routes take precedence.
    pub fn with_route(mut self, pattern: &str, locations: Vec<ResourceLocation>) -> Self {
        self.routes.push(StaticRoute::new(pattern, locations));
        self
    }

    /// The application's routes: stylesheets and scripts from the page
    /// directory, third-party web assets from the vendored webjars directory.
    pub fn standard(web_root: &Path, webjars_dir: &Path) -> Self {
        Self::new()
            .with_route(
                "/css/**",
                vec![ResourceLocation::in_web_root(web_root, "/WEB-INF/pages/css/")],
            )
            .with_route(
                "/js/**",
                vec![ResourceLocation::in_web_root(web_root, "/WEB-INF/pages/js/")],
            )
            .with_route(
                "/webjars/**",
                vec![ResourceLocation::new(
                    "classpath:/META-INF/resources/webjars/",
                    webjars_dir,
                )],
            )
    }

    pub fn routes(&self) -> &[StaticRoute] {
        &self.routes
    }

    /// Resolve a request path to a file.
    ///
    /// Only the first matching pattern is consulted. Paths that try to leave
    /// a location (`..`, backslashes, absolute remainders) never resolve.
    pub fn route(&self, path: &str) -> Option<ResolvedResource> {
        let (route, remainder) = self
            .routes
            .iter()
            .find_map(|route| route.matcher.remainder(path).map(|rest| (route, rest)))?;

        let Some(relative) = sanitize(remainder) else {
            debug!("Rejected static path '{}'", path);
            return None;
        };

        route.locations.iter().find_map(|location| {
            let file = location.root.join(&relative);
            file.is_file().then(|| ResolvedResource {
                location: format!("{}{}", location.base, relative),
                file,
            })
        })
    }
}

/// Percent-decode a remainder and reject anything that is not a plain
/// relative file path.
fn sanitize(remainder: &str) -> Option<String> {
    let decoded = percent_decode_str(remainder).decode_utf8().ok()?;

    if decoded.is_empty()
        || decoded.starts_with('/')
        || decoded.contains('\\')
        || decoded.contains('\0')
        || decoded.contains(':')
    {
        return None;
    }

    let valid = decoded
        .split('/')
        .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    valid.then(|| decoded.into_owned())
}
