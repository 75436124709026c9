use crate::errors;
use crate::http::{parse_request, Request, Response};
use crate::threadpool::ThreadPool;
use log::{debug, error, info, warn};
use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};

/// Turn an HTTP status code into its reason phrase
pub fn code_to_string(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// This is the main server.
///
/// It listens for incoming connections on a TCP socket, parses the requests and dispatches them
/// to a handler. Whatever the handler produces is then converted in an HTTP response and sent
/// back to the client. One request is served per connection.
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// Create a new server listening on the given address
    pub fn new(addr: &str) -> errors::Result<Self> {
        Ok(HttpServer {
            listener: TcpListener::bind(addr)?,
        })
    }

    /// Address the server actually listens on
    pub fn local_addr(&self) -> errors::Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the server
    ///
    /// Calls the handler with the incoming requests on a pool of `workers` threads.
    ///
    /// This function is blocking, with no real way of stopping it (except the socket being
    /// forcefully closed by the OS or the program being killed)
    pub fn serve<F>(&self, workers: usize, handler: F)
    where
        F: Fn(Request) -> Response + Send + Sync + 'static + Clone,
    {
        let threadpool = ThreadPool::new(workers);
        if let Ok(addr) = self.listener.local_addr() {
            info!("Listening on {} with {} workers", addr, workers);
        }
        for stream in self.listener.incoming() {
            match stream {
                Ok(mut stream) => {
                    let handler = handler.clone();
                    threadpool.execute(move || handle_stream(&mut stream, &handler))
                }
                Err(err) => warn!("Failed to accept connection: {}", err),
            }
        }
    }

    /// Utility function for one-shot servers.
    ///
    /// This is mostly for testing, it listens to a single connection, processes the
    /// request and exit.
    pub fn serve_once<F>(&self, handler: F) -> errors::Result<()>
    where
        F: Fn(Request) -> Response,
    {
        let (mut stream, _) = self.listener.accept()?;
        handle_stream(&mut stream, &handler);
        Ok(())
    }
}

/// Parse an HTTP request from a TCP stream, calls the handler and write back the answer
fn handle_stream<F>(mut stream: &mut TcpStream, handler: F)
where
    F: Fn(Request) -> Response,
{
    let buf_reader = BufReader::new(&mut stream);
    match parse_request(buf_reader) {
        Ok(req) => respond(stream, handler(req)),
        Err(err) => {
            debug!("Unreadable request: {}", err);
            respond(stream, Response::bad_request())
        }
    }
}

/// Serialize a response head and body
pub fn serialize_response(resp: &Response) -> String {
    let status = resp.status.unwrap_or(500);
    format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        code_to_string(status),
        resp.body.len(),
        resp.headers
            .iter()
            .map(|(k, v)| format!("{}: {}\r\n", k, v))
            .collect::<Vec<_>>()
            .join(""),
        resp.body
    )
}

/// Writes an HTTP response to a stream
fn respond(stream: &mut TcpStream, resp: Response) {
    if let Err(err) = stream.write_all(serialize_response(&resp).as_bytes()) {
        error!("Failed to respond: {}", err);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::http::parse_response;

    #[test]
    fn test_serialize_response() {
        let response = Response::json(200, &crate::api::Ack { ok: true }).unwrap();
        let raw = serialize_response(&response);
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));

        let parsed = parse_response(BufReader::new(raw.as_bytes())).unwrap();
        assert_eq!(parsed.status, Some(200));
        assert_eq!(parsed.body, r#"{"ok":true}"#);
    }

    #[test]
    fn test_body_length_is_in_bytes() {
        let response = Response::ok_with_body("Чаевые".to_string());
        let raw = serialize_response(&response);
        assert!(raw.contains("Content-Length: 12\r\n"));
    }

    #[test]
    fn test_unknown_code_has_a_reason() {
        assert_eq!(code_to_string(418), "Unknown");
        assert_eq!(code_to_string(404), "Not Found");
    }
}
