// Path table and request dispatch

use std::collections::HashMap;

use crate::database::Database;
use crate::errors::{Error, Result};
use crate::http::{decode_component, encode_component, Request, Response};
use crate::validator::LinkPolicy;
use chrono::{DateTime, Utc};
use matchit::Router;

/// Declares every API path twice: `paths::NAME` is the matchit pattern under `/api`,
/// `endpoints::NAME` is the key the router hands back on a match.
macro_rules! make_paths {
    ($($name:ident: $path:expr,)*) => {
        pub mod paths {
            $(pub const $name: &str = concat!("/api", $path);)*
        }

        pub mod endpoints {
            $(pub const $name: &str = stringify!($name);)*
        }
    };
}

make_paths! {
    EMPLOYEES: "/employees",
    EMPLOYEE_BY_ID: "/employees/{employee_id}",
    EMPLOYEE_STATS: "/employees/{employee_id}/stats",
    LEADS: "/leads",
    TIPS: "/tips",
    TIP_BY_ID: "/tips/{tip_id}",
    QUOTE: "/quote",
}

/// Registers the listed paths on a matchit router
macro_rules! add_path {
    ($router:ident $(, $path:ident)*) => {
        $($router.insert(paths::$path, endpoints::$path)?;)*
    };
}

/// Placeholders used in `paths`
pub mod params {
    pub const EMPLOYEE_ID: &str = "employee_id";
    pub const TIP_ID: &str = "tip_id";
}

pub fn employee_by_id(employee_id: &str) -> String {
    paths::EMPLOYEE_BY_ID.replace("{employee_id}", &encode_component(employee_id))
}

pub fn employee_stats(employee_id: &str) -> String {
    paths::EMPLOYEE_STATS.replace("{employee_id}", &encode_component(employee_id))
}

pub fn tip_by_id(tip_id: &str) -> String {
    paths::TIP_BY_ID.replace("{tip_id}", &encode_component(tip_id))
}

/// Build path parameters by placeholder name, for calling handlers directly in tests
#[allow(unused_macros)]
macro_rules! make_params {
    () => {
        $crate::routes::HttpParams::new()
    };
    ($($name:ident: $value:expr),+ $(,)?) => {{
        let mut params = $crate::routes::HttpParams::new();
        $(params.insert($crate::routes::params::$name.to_string(), $value.to_string());)+
        params
    }};
}

#[allow(unused_imports)]
pub(crate) use make_params;

/// Only fails if two patterns conflict, which is a bug in `make_paths!`
fn new_router() -> Result<Router<&'static str>> {
    let mut router = Router::new();
    add_path!(router, EMPLOYEES, EMPLOYEE_BY_ID, EMPLOYEE_STATS, LEADS, TIPS, TIP_BY_ID, QUOTE);
    Ok(router)
}

/// Everything a handler can touch while serving a request
pub struct AppState {
    pub db: Box<dyn Database + Send>,
    pub links: LinkPolicy,
    /// Source of the current time, replaced by a fixed clock in tests
    pub clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(db: Box<dyn Database + Send>, links: LinkPolicy) -> Self {
        AppState {
            db,
            links,
            clock: Utc::now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// Decoded path parameters, keyed by placeholder name
pub type HttpParams = HashMap<String, String>;
pub type HttpHandler = fn(Request, HttpParams, &mut AppState) -> Result<Response>;

/// Dispatches requests to handlers by path pattern and method
pub struct HttpRouter {
    routes: Router<&'static str>,
    handlers: HashMap<(&'static str, &'static str), HttpHandler>,
}

impl HttpRouter {
    /// A router knowing every API path but no handler yet
    pub fn new() -> Result<Self> {
        Ok(HttpRouter {
            routes: new_router()?,
            handlers: HashMap::new(),
        })
    }

    /// Register `handler` for `method` on one of the `endpoints`
    pub fn add_route(&mut self, method: &'static str, endpoint: &'static str, handler: HttpHandler) {
        self.handlers.insert((endpoint, method), handler);
    }

    /// Call the handler registered for the request.
    ///
    /// The query string is ignored for matching. An unknown path, or a known path without a
    /// handler for the method, is Error::NotFound. Handlers validate their own input.
    pub fn route(&self, request: Request, state: &mut AppState) -> Result<Response> {
        let matched = self
            .routes
            .at(request.route_path())
            .map_err(|_| Error::NotFound("Not found".to_string()))?;
        let endpoint = *matched.value;
        let handler = self
            .handlers
            .iter()
            .find(|((e, method), _)| *e == endpoint && *method == request.method)
            .map(|(_, handler)| handler)
            .ok_or_else(|| {
                Error::NotFound(format!("No handler for {} {}", request.method, endpoint))
            })?;

        let params: HttpParams = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), decode_component(v)))
            .collect();
        handler(request, params, state)
    }
}
