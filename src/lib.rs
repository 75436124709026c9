pub mod api;
pub mod calculator;
pub mod cli;
pub mod database;
pub mod endpoints;
pub mod errors;
pub mod flow;
pub mod http;
pub mod orders;
pub mod routes;
pub mod stats;
pub mod store;
pub mod threadpool;
pub mod validator;
