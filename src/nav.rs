// Route table and navigation-query state.
//
// RouteTemplate is the single source of truth mapping logical page names to
// path templates with [param] segments. NavState holds the committed
// navigation query (the shareable, bookmarkable representation of filter +
// pagination state) and broadcasts every commit over a watch channel.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::watch;

// The navigation query string, decoded. Absence of a key means unset/default.
pub type QueryMap = BTreeMap<String, String>;

// Decode a raw query string ("a=1&b=two") into a QueryMap.
pub fn parse_query(raw: &str) -> QueryMap {
    serde_urlencoded::from_str(raw).unwrap_or_default()
}

// Encode a QueryMap back into a query string, keys in stable order.
pub fn encode_query(query: &QueryMap) -> String {
    serde_urlencoded::to_string(query).unwrap_or_default()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("missing route parameter '{0}'")]
    MissingParam(&'static str),
}

// A path template with named [param] segments, fixed at definition time.
#[derive(Debug, Clone, Copy)]
pub struct RouteTemplate {
    pub label: &'static str,
    pub template: &'static str,
    pub params: &'static [&'static str],
}

impl RouteTemplate {
    // Instantiate the template, substituting every [param]. Each declared
    // parameter must be present in `values`.
    pub fn instantiate(&self, values: &[(&str, &str)]) -> Result<String, RouteError> {
        let mut path = self.template.to_string();
        for param in self.params {
            let value = values
                .iter()
                .find(|(name, _)| name == param)
                .map(|(_, value)| *value)
                .ok_or(RouteError::MissingParam(param))?;
            path = path.replace(&format!("[{param}]"), value);
        }
        Ok(path)
    }

    // Shorthand for parameterless routes.
    pub fn path(&self) -> &'static str {
        self.template
    }
}

// Logical page names -> path templates. Mirrored by the axum router in
// routes/mod.rs; handlers and templates build links through these, never
// from string literals.
pub mod routes {
    use super::RouteTemplate;

    pub const HOME: RouteTemplate = RouteTemplate {
        label: "Home",
        template: "/",
        params: &[],
    };

    pub const CATALOG: RouteTemplate = RouteTemplate {
        label: "Catalog",
        template: "/catalog",
        params: &[],
    };

    pub const CATALOG_BRAND: RouteTemplate = RouteTemplate {
        label: "Brand Catalog",
        template: "/catalog/[brand]",
        params: &["brand"],
    };

    pub const CATALOG_MODEL: RouteTemplate = RouteTemplate {
        label: "Model Catalog",
        template: "/catalog/[brand]/[model]",
        params: &["brand", "model"],
    };

    pub const VEHICLE: RouteTemplate = RouteTemplate {
        label: "Vehicle Details",
        template: "/catalog/[brand]/[model]/[vehicle_id]",
        params: &["brand", "model", "vehicle_id"],
    };

    // Short detail link used when brand/model slugs are unknown.
    pub const VEHICLE_SHORT: RouteTemplate = RouteTemplate {
        label: "Vehicle Details",
        template: "/v/[vehicle_id]",
        params: &["vehicle_id"],
    };

    pub const HEALTH: RouteTemplate = RouteTemplate {
        label: "Health",
        template: "/health",
        params: &[],
    };
}

// Owns the current navigation query. Commits are atomic: the new query
// replaces the old one and is broadcast to subscribers in one step. The
// generation counter increments once per commit, so callers can observe
// "exactly one commit happened" without racing the watch channel's
// coalescing.
pub struct NavState {
    tx: watch::Sender<QueryMap>,
    generation: std::sync::atomic::AtomicU64,
}

impl NavState {
    pub fn new(initial: QueryMap) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            generation: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> QueryMap {
        self.tx.borrow().clone()
    }

    // Commit a new query. A single atomic push; no intermediate state is
    // observable.
    pub fn push(&self, query: QueryMap) {
        self.generation
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.tx.send_replace(query);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryMap> {
        self.tx.subscribe()
    }
}
