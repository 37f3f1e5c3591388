use std::sync::Arc;

use axum::{Router, body::Body as AxumBody, extract::Request, routing::any};
use eyre::{Result, WrapErr};
use hyper::{Response, StatusCode};
use tower_http::trace::TraceLayer;

use crate::{
    adapters::{
        handlers::{
            ContentSource, EchoHandler, MockHandler, ReverseProxyHandler, StaticContentHandler,
            discover_endpoints, plain_error,
        },
        middleware::CorsAndContentType,
    },
    config::{ServerConfig, parse_proxy_rules},
    core::{DenyList, RouteError, RouteTable},
    ports::http_client::HttpClient,
};

pub const ECHO_PATH: &str = "/echo";

/// The handler bound to a route.
pub enum RouteHandler {
    Static(StaticContentHandler),
    Proxy(ReverseProxyHandler),
    Mock(MockHandler),
    Echo(EchoHandler),
}

impl RouteHandler {
    pub fn kind(&self) -> &'static str {
        match self {
            RouteHandler::Static(_) => "static",
            RouteHandler::Proxy(_) => "proxy",
            RouteHandler::Mock(_) => "mock",
            RouteHandler::Echo(_) => "echo",
        }
    }
}

/// Owns the route table and runs the selected handler through the middleware.
///
/// `/echo` is registered on construction so no other route can claim it.
pub struct Dispatcher {
    routes: RouteTable<RouteHandler>,
    middleware: CorsAndContentType,
}

impl Dispatcher {
    pub fn new(middleware: CorsAndContentType) -> Self {
        let mut routes = RouteTable::new();
        // A fresh table cannot hold a duplicate
        let _ = routes.register(ECHO_PATH, RouteHandler::Echo(EchoHandler));
        Self { routes, middleware }
    }

    /// Build the full route table: mock endpoints, the content route, then proxy rules.
    pub fn from_config(config: &ServerConfig, client: Arc<dyn HttpClient>) -> Result<Self> {
        let middleware = CorsAndContentType::from_config(config)?;
        let cors = middleware.cors().cloned();
        let mut dispatcher = Self::new(middleware);

        if let Some(mock_root) = config
            .mock_dir
            .as_ref()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            for endpoint in discover_endpoints(mock_root) {
                let handler = MockHandler::new(mock_root, endpoint.clone());
                dispatcher.register_or_warn(endpoint, RouteHandler::Mock(handler));
            }
        }

        let status = StatusCode::from_u16(config.status)
            .wrap_err_with(|| format!("Invalid status code {}", config.status))?;
        let source = ContentSource::resolve(&config.body)?;
        let content = StaticContentHandler::new(source, DenyList::parse(&config.deny), status);
        dispatcher.register_or_warn(config.path.clone(), RouteHandler::Static(content));

        for rule in parse_proxy_rules(&config.proxy) {
            let prefix = rule.prefix.clone();
            let upstream = rule.upstream.clone();
            let handler = ReverseProxyHandler::new(rule, client.clone(), cors.clone());
            if dispatcher.register_or_warn(prefix.clone(), RouteHandler::Proxy(handler)) {
                tracing::info!("sending {} to {}", prefix, upstream);
            }
        }

        Ok(dispatcher)
    }

    pub fn register(
        &mut self,
        prefix: impl Into<String>,
        handler: RouteHandler,
    ) -> Result<(), RouteError> {
        self.routes.register(prefix, handler)
    }

    /// Returns whether the route was added.
    fn register_or_warn(&mut self, prefix: String, handler: RouteHandler) -> bool {
        let kind = handler.kind();
        match self.register(prefix, handler) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Ignoring {} route: {}", kind, e);
                false
            }
        }
    }

    pub fn routes(&self) -> &RouteTable<RouteHandler> {
        &self.routes
    }

    /// Route `req` to the handler with the longest matching prefix.
    pub async fn dispatch(&self, req: Request) -> Response<AxumBody> {
        let path = req.uri().path().to_string();
        let Some(route) = self.routes.find(&path) else {
            return plain_error(StatusCode::NOT_FOUND, "404 page not found");
        };

        let handler = route.handler();
        let suffix = route.strip(&path).to_string();
        self.middleware
            .run(req, move |req| async move {
                match handler {
                    RouteHandler::Static(h) if h.is_directory() => h.handle(&suffix, req).await,
                    RouteHandler::Static(h) => h.handle(&path, req).await,
                    RouteHandler::Proxy(h) => h.handle(req).await,
                    RouteHandler::Mock(h) => h.handle(req).await,
                    RouteHandler::Echo(h) => h.handle(req).await,
                }
            })
            .await
    }

    /// Axum router sending every path and method through [`Dispatcher::dispatch`].
    pub fn into_router(self) -> Router {
        let dispatcher = Arc::new(self);
        let handle = move |req: Request| {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.dispatch(req).await }
        };

        Router::new()
            .route("/", any(handle.clone()))
            .route("/{*path}", any(handle))
            .layer(TraceLayer::new_for_http())
    }
}
