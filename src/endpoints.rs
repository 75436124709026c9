use crate::api::{
    Ack, Employee, EmployeeResponse, EmployeeUpdate, EmployeesResponse, ErrorBody, NewLead,
    NewTip, OrderResponse, QuoteResponse, StatsResponse, TipResponse,
};
use crate::calculator::{self, Selection};
use crate::database::Database;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::routes::*;
use crate::stats::{self, Period};
use crate::store::{self, INVALID_DATA, MISSING_FIELDS};
use crate::{orders, validator::LinkCheck};
use log::{debug, error, info};
use serde::de::DeserializeOwned;

pub fn create_http_router() -> Result<HttpRouter> {
    let mut router = HttpRouter::new()?;

    router.add_route("GET", endpoints::EMPLOYEES, get_employees);
    router.add_route("POST", endpoints::EMPLOYEES, post_employee);
    router.add_route("GET", endpoints::EMPLOYEE_BY_ID, get_employee);
    router.add_route("PUT", endpoints::EMPLOYEE_BY_ID, put_employee);
    router.add_route("GET", endpoints::EMPLOYEE_STATS, get_employee_stats);
    router.add_route("POST", endpoints::LEADS, post_lead);
    router.add_route("POST", endpoints::TIPS, post_tip);
    router.add_route("GET", endpoints::TIPS, get_order);
    router.add_route("GET", endpoints::TIP_BY_ID, get_tip);
    router.add_route("GET", endpoints::QUOTE, get_quote);

    Ok(router)
}

/// Route a request and turn whatever comes out into an HTTP response.
///
/// Every error becomes a `{ ok: false, error }` body; internal failures only expose a generic
/// message and are logged with their detail.
pub fn handle(router: &HttpRouter, state: &mut AppState, request: Request) -> Response {
    info!("{} {}", request.method, request.path);
    let err = match router.route(request, state) {
        Ok(response) => return response,
        Err(err) => err,
    };

    if err.is_internal() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }
    Response::json(err.status_code(), &ErrorBody::new(err.public_message()))
        .unwrap_or_else(|_| Response::internal_server_error())
}

/// Deserialize a JSON body, reporting malformed input as invalid data
fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|err| {
        debug!("Malformed JSON body: {}", err);
        Error::Validation(INVALID_DATA.to_string())
    })
}

fn path_param<'a>(params: &'a HttpParams, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::Validation(MISSING_FIELDS.to_string()))
}

fn parse_number(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Validation(INVALID_DATA.to_string()))
}

fn get_employees(_: Request, _: HttpParams, state: &mut AppState) -> Result<Response> {
    let employees = state.db.list_employees()?;
    Response::json(200, &EmployeesResponse { employees })
}

fn post_employee(request: Request, _: HttpParams, state: &mut AppState) -> Result<Response> {
    let employee: Employee = parse_json(&request.body)?;
    let employee = store::onboard_employee(state.db.as_mut(), employee)?;
    Response::json(201, &EmployeeResponse { ok: true, employee })
}

fn get_employee(_: Request, params: HttpParams, state: &mut AppState) -> Result<Response> {
    let employee = state.db.get_employee(path_param(&params, params::EMPLOYEE_ID)?)?;
    Response::json(200, &EmployeeResponse { ok: true, employee })
}

fn put_employee(request: Request, params: HttpParams, state: &mut AppState) -> Result<Response> {
    let update: EmployeeUpdate = parse_json(&request.body)?;
    let employee_id = path_param(&params, params::EMPLOYEE_ID)?;
    let employee = store::update_profile(state.db.as_mut(), employee_id, &update)?;
    info!("Employee {} updated", employee.id);
    Response::json(200, &EmployeeResponse { ok: true, employee })
}

fn get_employee_stats(
    request: Request,
    params: HttpParams,
    state: &mut AppState,
) -> Result<Response> {
    let employee_id = path_param(&params, params::EMPLOYEE_ID)?;
    // Unknown employees are a 404 rather than empty statistics
    state.db.get_employee(employee_id)?;

    let query = request.query();
    let period = match query.get("period").filter(|p| !p.is_empty()) {
        Some(period) => Period::parse(period)?,
        None => Period::default(),
    };
    let restaurant = query
        .get("restaurant")
        .map(String::as_str)
        .filter(|r| !r.is_empty());

    let tips = state.db.list_tips()?;
    let stats = stats::employee_stats(&tips, employee_id, period, restaurant, state.now());
    Response::json(200, &StatsResponse { ok: true, stats })
}

fn post_lead(request: Request, _: HttpParams, state: &mut AppState) -> Result<Response> {
    let mut form = request.form();
    let mut field = |name: &str| form.remove(name).unwrap_or_default();
    let lead = NewLead {
        workplace: field("workplace"),
        name: field("name"),
        phone: field("phone"),
        email: field("email"),
    };
    let now = state.now();
    store::capture_lead(state.db.as_mut(), lead, now)?;
    Response::json(200, &Ack { ok: true })
}

fn post_tip(request: Request, _: HttpParams, state: &mut AppState) -> Result<Response> {
    let tip: NewTip = parse_json(&request.body)?;
    let now = state.now();
    let created = store::submit_tip(state.db.as_mut(), tip, now)?;
    Response::json(200, &created)
}

/// Order details behind a tipping link
fn get_order(request: Request, _: HttpParams, state: &mut AppState) -> Result<Response> {
    let query = request.query();
    let code = query.get("code").map(|c| c.trim()).unwrap_or_default();
    if code.is_empty() {
        return Err(Error::Validation(orders::MISSING_CODE.to_string()));
    }

    let now = state.now();
    let check = state.links.check(
        code,
        query.get("sig").map(String::as_str),
        query.get("ts").map(String::as_str),
        now.timestamp(),
    )?;
    if check == LinkCheck::Verified {
        debug!("Link for order {} verified", code);
    }

    let order_data = orders::order_data(state.db.as_ref(), code, now)?;
    Response::json(200, &OrderResponse { ok: true, order_data })
}

fn get_tip(_: Request, params: HttpParams, state: &mut AppState) -> Result<Response> {
    let tip = store::find_tip(state.db.as_ref(), path_param(&params, params::TIP_ID)?)?;
    Response::json(200, &TipResponse { ok: true, tip })
}

/// Amounts the payment screen would show for a bill and a selection
fn get_quote(request: Request, _: HttpParams, _: &mut AppState) -> Result<Response> {
    let query = request.query();
    let base = query
        .get("base")
        .ok_or_else(|| Error::Validation(MISSING_FIELDS.to_string()))
        .and_then(|base| parse_number(base))?;

    let selection = match (query.get("percent"), query.get("amount")) {
        (Some(percent), None) => Selection::Percentage(parse_number(percent)?),
        (None, Some(amount)) => Selection::Custom(parse_number(amount)?),
        (Some(_), Some(_)) => return Err(Error::Validation(INVALID_DATA.to_string())),
        (None, None) => return Err(Error::Validation(MISSING_FIELDS.to_string())),
    };
    let pay_commission = match query.get("commission").map(String::as_str) {
        None | Some("true") => true,
        Some("false") => false,
        Some(_) => return Err(Error::Validation(INVALID_DATA.to_string())),
    };

    let quote = calculator::quote(base, selection, pay_commission)?;
    Response::json(200, &QuoteResponse { ok: true, quote })
}
