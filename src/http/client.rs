use crate::errors;
use crate::http::{parse_response, Response};
use std::io::{BufReader, Write};
use std::net::TcpStream;

/// Simple HTTP client
///
/// It sends HTTP requests from a set of parameters, then parses and yields the server response.
pub struct HttpClient {
    stream: TcpStream,
    host: String,
}

impl HttpClient {
    /// Create a new client connected to the given server.
    ///
    /// An error is returned if the connection cannot be made for whatever reason
    pub fn new(server: &str) -> errors::Result<Self> {
        Ok(HttpClient {
            stream: TcpStream::connect(server)?,
            host: server.to_string(),
        })
    }

    /// Send an HTTP request with a JSON (or empty) body on the open connection.
    ///
    /// The server closes the connection after answering: drop the client once the response is
    /// retrieved.
    pub fn send(&mut self, method: &str, endpoint: &str, body: &str) -> errors::Result<Response> {
        self.send_with_type(method, endpoint, "application/json", body)
    }

    /// Send a form-encoded body
    pub fn send_form(&mut self, endpoint: &str, body: &str) -> errors::Result<Response> {
        self.send_with_type(
            "POST",
            endpoint,
            "application/x-www-form-urlencoded",
            body,
        )
    }

    fn send_with_type(
        &mut self,
        method: &str,
        endpoint: &str,
        content_type: &str,
        body: &str,
    ) -> errors::Result<Response> {
        self.stream.write_all(
            format! {
                "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
                method, endpoint, self.host, content_type, body.len(), body
            }
            .as_bytes(),
        )?;

        let buf_reader = BufReader::new(&mut self.stream);
        parse_response(buf_reader)
    }
}
