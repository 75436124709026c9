use std::error::Error;

use clap::Parser;
use log::debug;
use tipjar::api::{
    Ack, EmployeesResponse, ErrorBody, OrderResponse, QuoteResponse, StatsResponse,
    TipCreated, TipResponse,
};
use tipjar::calculator::Selection;
use tipjar::cli::{ClientArgs, ClientCommand, LinkArgs};
use tipjar::flow::TipFlow;
use tipjar::http::{code_to_string, encode_pairs, HttpClient, Response};
use tipjar::routes::{self, paths};

type CliResult<T> = std::result::Result<T, Box<dyn Error>>;

/// The server closes the connection after each answer, so every request gets its own client
fn request(target: &str, method: &str, endpoint: &str, body: &str) -> CliResult<Response> {
    debug!("{} {}", method, endpoint);
    let mut client = HttpClient::new(target)?;
    Ok(client.send(method, endpoint, body)?)
}

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, encode_pairs(pairs))
    }
}

fn order_endpoint(code: &str, link: &LinkArgs) -> String {
    let mut pairs = vec![("code", code)];
    if let Some(sig) = &link.sig {
        pairs.push(("sig", sig.as_str()));
    }
    if let Some(ts) = &link.ts {
        pairs.push(("ts", ts.as_str()));
    }
    with_query(paths::TIPS, &pairs)
}

fn quote_endpoint(base: u64, selection: Selection, pay_commission: bool) -> String {
    let base = base.to_string();
    let (key, value) = match selection {
        Selection::Percentage(percent) => ("percent", percent.to_string()),
        Selection::Custom(amount) => ("amount", amount.to_string()),
    };
    let commission = pay_commission.to_string();
    with_query(
        paths::QUOTE,
        &[
            ("base", base.as_str()),
            (key, value.as_str()),
            ("commission", commission.as_str()),
        ],
    )
}

/// Message carried by an error answer
fn error_message(response: &Response) -> String {
    response
        .parse_body::<ErrorBody>()
        .map(|body| body.error)
        .unwrap_or_else(|_| match response.status {
            Some(code) => format!("{} {}", code, code_to_string(code)),
            None => "No status in response".to_string(),
        })
}

fn print_response<'a, Body>(response: &'a Response)
where
    Body: serde::Deserialize<'a> + std::fmt::Debug,
{
    match response.status {
        Some(code) => println!("Response Status: {} - {}", code, code_to_string(code)),
        None => println!("No status in response"),
    }
    if response.body.is_empty() {
        return;
    }
    if !response.is_success() {
        println!("Error: {}", error_message(response));
        return;
    }
    match response.parse_body::<Body>() {
        Ok(json) => println!("Response Body: {:#?}", json),
        Err(e) => println!("Error parsing response body: {}\n{:?}", e, response.body),
    }
}

/// Walk a guest through the tipping screens, stopping at the first failure
fn leave_tip(
    target: &str,
    code: &str,
    rating: u8,
    comment: Option<String>,
    selection: Selection,
    pay_commission: bool,
    link: &LinkArgs,
) -> CliResult<()> {
    let mut flow = TipFlow::new();
    flow.enter_code(code)?;

    let response = request(target, "GET", &order_endpoint(code, link), "")?;
    if !response.is_success() {
        return Err(give_up(&mut flow, &response));
    }
    flow.link_checked()?;
    let order = response.parse_body::<OrderResponse>()?.order_data;
    println!(
        "Order {} at {}, {} ₽",
        order.order.order_number, order.order.restaurant, order.order.order_amount
    );
    flow.order_loaded(order)?;

    flow.rate(rating, comment)?;
    flow.select_amount(selection)?;
    flow.consent(pay_commission)?;
    if let Some(quote) = flow.quote() {
        println!(
            "Tip {} ₽, commission {} ₽, total {} ₽",
            quote.tip_amount,
            if quote.pay_commission { quote.commission } else { 0 },
            quote.total
        );
    }

    let body = serde_json::to_string(&flow.submission()?)?;
    let response = request(target, "POST", paths::TIPS, &body)?;
    if !response.is_success() {
        return Err(give_up(&mut flow, &response));
    }
    let created = response.parse_body::<TipCreated>()?;
    flow.submitted(&created.tip_id)?;
    println!("Спасибо! Tip {} saved ({})", created.tip_id, created.redirect_url);
    Ok(())
}

fn give_up(flow: &mut TipFlow, response: &Response) -> Box<dyn Error> {
    let message = error_message(response);
    if let Err(err) = flow.fail(message.clone()) {
        debug!("{}", err);
    }
    message.into()
}

fn main() -> CliResult<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = ClientArgs::parse();
    let target = args.target.as_str();

    match args.command {
        ClientCommand::Employees => {
            let response = request(target, "GET", paths::EMPLOYEES, "")?;
            print_response::<EmployeesResponse>(&response);
        }
        ClientCommand::Order { code, link } => {
            let response = request(target, "GET", &order_endpoint(&code, &link), "")?;
            print_response::<OrderResponse>(&response);
        }
        ClientCommand::Tip {
            code,
            rating,
            amount,
            comment,
            no_commission,
            link,
        } => leave_tip(
            target,
            &code,
            rating,
            comment,
            amount.selection(),
            !no_commission,
            &link,
        )?,
        ClientCommand::ShowTip { tip_id } => {
            let response = request(target, "GET", &routes::tip_by_id(&tip_id), "")?;
            print_response::<TipResponse>(&response);
        }
        ClientCommand::Lead {
            workplace,
            name,
            phone,
            email,
        } => {
            let body = encode_pairs(&[
                ("workplace", workplace.as_str()),
                ("name", name.as_str()),
                ("phone", phone.as_str()),
                ("email", email.as_str()),
            ]);
            let mut client = HttpClient::new(target)?;
            let response = client.send_form(paths::LEADS, &body)?;
            print_response::<Ack>(&response);
        }
        ClientCommand::Stats {
            employee,
            period,
            restaurant,
        } => {
            let mut pairs = Vec::new();
            if let Some(period) = &period {
                pairs.push(("period", period.as_str()));
            }
            if let Some(restaurant) = &restaurant {
                pairs.push(("restaurant", restaurant.as_str()));
            }
            let endpoint = with_query(&routes::employee_stats(&employee), &pairs);
            let response = request(target, "GET", &endpoint, "")?;
            print_response::<StatsResponse>(&response);
        }
        ClientCommand::Quote {
            base,
            amount,
            no_commission,
        } => {
            let endpoint = quote_endpoint(base, amount.selection(), !no_commission);
            let response = request(target, "GET", &endpoint, "")?;
            print_response::<QuoteResponse>(&response);
        }
    }

    Ok(())
}
