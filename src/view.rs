//! Logical view name to template path resolution.

/// Prefix marking a logical view name as a client redirect.
pub const REDIRECT_PREFIX: &str = "redirect:";

/// Prefix marking a logical view name as a server-side forward.
pub const FORWARD_PREFIX: &str = "forward:";

/// What a handler's logical view name turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Render the template at this path (relative to the web root)
    Template(String),

    /// Send the client to this URL
    Redirect(String),

    /// Dispatch internally to this path
    Forward(String),
}

/// Stateless prefix/suffix view resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewResolver {
    prefix: String,
    suffix: String,
}

impl ViewResolver {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// `prefix + logical_name + suffix`. Whether the template exists is the
    /// renderer's concern.
    ///
    /// # Example
    /// ```
    /// use eucaptcha_web::view::ViewResolver;
    ///
    /// let resolver = ViewResolver::new("/WEB-INF/pages/", ".jsp");
    /// assert_eq!(resolver.resolve("index"), "/WEB-INF/pages/index.jsp");
    /// ```
    pub fn resolve(&self, logical_name: &str) -> String {
        let mut path =
            String::with_capacity(self.prefix.len() + logical_name.len() + self.suffix.len());
        path.push_str(&self.prefix);
        path.push_str(logical_name);
        path.push_str(&self.suffix);
        path
    }

    /// Resolve a logical name, honouring `redirect:` and `forward:` prefixes.
    pub fn resolve_view(&self, logical_name: &str) -> View {
        if let Some(url) = logical_name.strip_prefix(REDIRECT_PREFIX) {
            View::Redirect(url.to_string())
        } else if let Some(path) = logical_name.strip_prefix(FORWARD_PREFIX) {
            View::Forward(path.to_string())
        } else {
            View::Template(self.resolve(logical_name))
        }
    }
}

impl Default for ViewResolver {
    fn default() -> Self {
        Self::new("/WEB-INF/pages/", ".jsp")
    }
}
