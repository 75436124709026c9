use std::io::{BufReader, Read};

use serde::Serialize;

use crate::errors::Result;
use crate::http::request::{content_length, owned_headers, read_message};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// An HTTP response to be sent to a client
#[derive(Debug)]
pub struct Response {
    /// Status code of the response. Optional because that's what httparse returns, but it
    /// shouldn't happen in practice since we control the responses.
    pub status: Option<u16>,
    /// Headers for the response. It is not necessary to add Content-Length to it, this is done
    /// automatically on serialization.
    pub headers: Vec<(String, String)>,
    /// Body of the response. Give an empty string for an empty body
    pub body: String,
}

impl Response {
    /// Creates an empty OK response (204)
    pub fn ok() -> Response {
        Response {
            status: Some(204),
            headers: vec![],
            body: "".to_string(),
        }
    }

    /// Creates an OK (200) response with the given body
    pub fn ok_with_body(str: String) -> Response {
        Response {
            status: Some(200),
            headers: vec![],
            body: str,
        }
    }

    /// Creates a response with the given status and a JSON body
    pub fn json<T: Serialize>(status: u16, body: &T) -> Result<Response> {
        Ok(Response {
            status: Some(status),
            headers: vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())],
            body: serde_json::to_string(body)?,
        })
    }

    /// Creates an error response without body.
    ///
    /// The code must be in the 4xx or 5xx range.
    pub fn error(code: u16) -> Response {
        assert!((400..600).contains(&code), "Invalid error code");
        Response {
            status: Some(code),
            headers: vec![],
            body: "".to_string(),
        }
    }

    /// Creates a Bad Request (400) response, for messages that could not even be parsed.
    pub fn bad_request() -> Response {
        Self::error(400)
    }

    /// Creates an Internal Server Error (500) response.
    pub fn internal_server_error() -> Response {
        Self::error(500)
    }

    /// Deserialize the JSON body
    pub fn parse_body<'a, T: serde::Deserialize<'a>>(&'a self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|code| (200..300).contains(&code))
    }
}

/// Parse an HTTP response from a byte stream
pub fn parse_response<T>(buf_reader: BufReader<T>) -> Result<Response>
where
    T: Sized + Read,
{
    let (mut response, body) = read_message(buf_reader, |data| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut resp = httparse::Response::new(&mut headers);
        match resp.parse(data)? {
            httparse::Status::Complete(parsed_len) => Ok(Some((
                parsed_len,
                content_length(resp.headers),
                Response {
                    status: resp.code,
                    headers: owned_headers(resp.headers),
                    body: String::new(),
                },
            ))),
            httparse::Status::Partial => Ok(None),
        }
    })?;
    response.body = body;
    Ok(response)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::ErrorBody;
    use rand::Rng;

    #[test]
    fn test_parse_simple_response() {
        let resp_str = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let parsed = parse_response(BufReader::new(&resp_str[..])).unwrap();

        assert_eq!(parsed.status, Some(200));
        assert_eq!(parsed.headers.len(), 1);
        assert_eq!(parsed.body, "");
        assert!(parsed.is_success());
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"ok":false,"error":"Некорректные данные"}"#;
        let resp_str = format!(
            "HTTP/1.1 400 Bad Request\r\nContent-Length: {}\r\nContent-Type: application/json\r\n\r\n{}",
            body.len(),
            body
        );

        let parsed = parse_response(BufReader::new(resp_str.as_bytes())).unwrap();

        assert_eq!(parsed.status, Some(400));
        assert!(!parsed.is_success());
        let error: ErrorBody = parsed.parse_body().unwrap();
        assert_eq!(error.error, "Некорректные данные");
    }

    #[test]
    fn test_parse_response_with_large_body() {
        let mut rng = rand::thread_rng();
        let body: String = (0..40960).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
        let resp_str = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let parsed = parse_response(BufReader::new(resp_str.as_bytes())).unwrap();

        assert_eq!(parsed.body, body);
    }

    #[test]
    fn test_json_response() {
        let response = Response::json(404, &ErrorBody::new("Заказ не найден")).unwrap();
        assert_eq!(response.status, Some(404));
        assert_eq!(response.body, r#"{"ok":false,"error":"Заказ не найден"}"#);
        assert_eq!(
            response.headers,
            vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())]
        );
    }
}
