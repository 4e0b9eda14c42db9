use crate::config::Config;
use crate::i18n::{LocaleChangeInterceptor, MessageCatalog, SessionLocaleResolver};
use crate::interceptor::InterceptorChain;
use crate::session::SessionStore;
use crate::static_routes::StaticRouteTable;
use crate::validation::LocalizedValidator;
use crate::view::ViewResolver;
use crate::web::render::{Renderer, TemplateRenderer};
use std::sync::Arc;
use tracing::info;

/// Everything the router shares across requests. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<MessageCatalog>,
    pub sessions: Arc<SessionStore>,
    pub locale_resolver: Arc<SessionLocaleResolver>,
    pub interceptors: InterceptorChain,
    pub views: Arc<ViewResolver>,
    pub static_routes: Arc<StaticRouteTable>,
    pub validator: Arc<LocalizedValidator>,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// Wire the pipeline components from configuration and a loaded catalog.
    pub fn new(config: Config, catalog: MessageCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let sessions = Arc::new(SessionStore::new(config.session_idle_timeout));
        let locale_resolver = Arc::new(SessionLocaleResolver::new(
            sessions.clone(),
            config.default_locale.clone(),
        ));

        let locale_change = LocaleChangeInterceptor::new(&config.locale_param, locale_resolver.clone())
            .with_http_methods(config.locale_change_methods.clone());
        let interceptors = InterceptorChain::new().with(Arc::new(locale_change));

        let views = Arc::new(ViewResolver::new(&config.view_prefix, &config.view_suffix));
        let static_routes = Arc::new(StaticRouteTable::standard(
            &config.web_root,
            &config.webjars_dir,
        ));
        let validator = Arc::new(LocalizedValidator::new(catalog.clone()));
        let renderer: Arc<dyn Renderer> =
            Arc::new(TemplateRenderer::new(&config.web_root, catalog.clone()));

        info!(
            "Locale pipeline: param '{}', default {}, views {}<name>{}",
            config.locale_param,
            config
                .default_locale
                .as_ref()
                .map(|l| l.to_tag())
                .unwrap_or_else(|| "Accept-Language".to_string()),
            views.prefix(),
            views.suffix()
        );

        Self {
            config: Arc::new(config),
            catalog,
            sessions,
            locale_resolver,
            interceptors,
            views,
            static_routes,
            validator,
            renderer,
        }
    }

    /// Replace the page renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}
