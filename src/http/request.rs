use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::io::{BufReader, Read};

/// Represents an HTTP request.
#[derive(Debug)]
pub struct Request {
    /// The HTTP method used in the request
    pub method: String,
    /// The full target of the request, query string included
    pub path: String,
    /// Headers of the request
    pub headers: Vec<(String, String)>,
    /// Body of the request
    pub body: String,
}

impl Request {
    /// Create a new request from scratch
    pub fn new(method: &str, path: &str, headers: Vec<(String, String)>, body: String) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            headers,
            body,
        }
    }
    /// Create a new GET request for the given path, with an empty body
    pub fn get(path: &str) -> Request {
        Request::new("GET", path, vec![], "".to_string())
    }
    /// Create a new POST request for the given path, with the given body
    pub fn post(path: &str, body: String) -> Request {
        Request::new("POST", path, vec![], body)
    }
    /// Create a new PUT request for the given path, with the given body
    pub fn put(path: &str, body: String) -> Request {
        Request::new("PUT", path, vec![], body)
    }
    /// Create a new DELETE request for the given path, with the given body
    pub fn delete(path: &str, body: String) -> Request {
        Request::new("DELETE", path, vec![], body)
    }

    /// Path without the query string, this is what gets routed
    pub fn route_path(&self) -> &str {
        self.path.split_once('?').map_or(&self.path, |(path, _)| path)
    }

    /// Decoded query string parameters. The last occurrence of a key wins.
    pub fn query(&self) -> HashMap<String, String> {
        self.path
            .split_once('?')
            .map(|(_, query)| parse_urlencoded(query))
            .unwrap_or_default()
    }

    /// Body decoded as `application/x-www-form-urlencoded`
    pub fn form(&self) -> HashMap<String, String> {
        parse_urlencoded(&self.body)
    }
}

/// Parse `key=value&other=value` pairs, decoding `+` and percent escapes
pub fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

/// Decode a single urlencoded component. Invalid escapes are kept verbatim.
pub fn decode_component(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

/// Encode a component for a query string or a form body
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Build `key=value&...` from pairs
pub fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Reads a full HTTP message head then as many body bytes as Content-Length announces.
///
/// `parse_head` is called on the accumulated bytes every time more data arrives; it returns the
/// head length, the announced body length and the parsed head, or None while the head is partial.
pub(crate) fn read_message<T, H, F>(mut buf_reader: BufReader<T>, mut parse_head: F) -> Result<(H, String)>
where
    T: Read,
    F: FnMut(&[u8]) -> Result<Option<(usize, usize, H)>>,
{
    let mut buf = [0; 4096];
    let mut data: Vec<u8> = Vec::new();

    let (parsed_len, body_len, head) = loop {
        let bytes_read = buf_reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        data.extend_from_slice(&buf[..bytes_read]);

        if let Some(parsed) = parse_head(&data)? {
            break parsed;
        }
    };

    // HTTP/1.1 clients wait for the response before sending the next request, so anything past
    // the announced body is dropped
    while data.len() - parsed_len < body_len {
        let bytes_read = buf_reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        data.extend_from_slice(&buf[..bytes_read]);
    }

    let body = String::from_utf8_lossy(&data[parsed_len..parsed_len + body_len]).to_string();
    Ok((head, body))
}

/// Content length announced in a list of httparse headers, 0 if absent
pub(crate) fn content_length(headers: &[httparse::Header]) -> usize {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case("Content-Length"))
        .and_then(|length| String::from_utf8_lossy(length.value).trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// Copy httparse headers into owned pairs
pub(crate) fn owned_headers(headers: &[httparse::Header]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect()
}

/// Parse an HTTP request from a byte stream
pub fn parse_request<T>(buf_reader: BufReader<T>) -> Result<Request>
where
    T: Sized + Read,
{
    let (mut request, body) = read_message(buf_reader, |data| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(data)? {
            httparse::Status::Complete(parsed_len) => Ok(Some((
                parsed_len,
                content_length(req.headers),
                Request {
                    method: req.method.unwrap_or("GET").to_string(),
                    path: req.path.unwrap_or("/").to_string(),
                    headers: owned_headers(req.headers),
                    body: String::new(),
                },
            ))),
            httparse::Status::Partial => Ok(None),
        }
    })?;
    request.body = body;
    Ok(request)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    fn random_text(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
    }

    #[test]
    fn test_parse_simple_request() {
        let req_str = b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "GET");
        assert_eq!(parsed_req.path, "/");
        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, "");
    }

    #[test]
    fn test_parse_incomplete_request() {
        let req_str =
            b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*";
        let buf_reader = BufReader::new(&req_str[..]);

        assert!(matches!(parse_request(buf_reader), Err(Error::ConnectionReset)));
    }

    #[test]
    fn test_parse_garbage() {
        let buf_reader = BufReader::new(&b"\x00\x01 nonsense\r\n\r\n"[..]);
        assert!(matches!(parse_request(buf_reader), Err(Error::Http(_))));
    }

    #[test]
    fn test_parse_tip_submission() {
        let body = r#"{"code":"TEST001","amount":250,"rating":5,"comment":"Отлично!","recipientType":"waiter"}"#;
        let req_str = format!(
            "POST /api/tips HTTP/1.1\r\nHost: localhost:9898\r\ncontent-length: {}\r\nContent-Type: application/json\r\n\r\n{}",
            body.len(),
            body
        );

        let parsed_req = parse_request(BufReader::new(req_str.as_bytes())).unwrap();

        assert_eq!(parsed_req.method, "POST");
        assert_eq!(parsed_req.route_path(), "/api/tips");
        assert!(parsed_req
            .headers
            .contains(&("Content-Type".to_string(), "application/json".to_string())));
        assert_eq!(parsed_req.body, body);
    }

    #[test]
    fn test_parse_request_with_large_body_and_header() {
        let body = random_text(40960);
        let x_test_header = random_text(40960);

        let req_str = format!(
            "POST / HTTP/1.1\r\nHost: localhost:8080\r\nContent-Length: {}\r\nX-TEST: {}\r\n\r\n{}",
            body.len(),
            x_test_header,
            body
        );

        let parsed_req = parse_request(BufReader::new(req_str.as_bytes())).unwrap();

        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, body);
        assert_eq!(parsed_req.headers[2], ("X-TEST".to_string(), x_test_header));
    }

    #[test]
    fn test_query_string() {
        let request = Request::get("/api/tips?code=TEST001&sig=test_signature&ts=1734567890");
        assert_eq!(request.route_path(), "/api/tips");

        let query = request.query();
        assert_eq!(query.get("code").unwrap(), "TEST001");
        assert_eq!(query.get("sig").unwrap(), "test_signature");
        assert_eq!(query.get("ts").unwrap(), "1734567890");

        assert!(Request::get("/api/tips").query().is_empty());
    }

    #[test]
    fn test_form_body() {
        let request = Request::post(
            "/api/leads",
            "workplace=%D0%9A%D0%B0%D1%84%D0%B5&name=Olga+Ivanova&phone=%2B7900&email=".to_string(),
        );
        let form = request.form();
        assert_eq!(form.get("workplace").unwrap(), "Кафе");
        assert_eq!(form.get("name").unwrap(), "Olga Ivanova");
        assert_eq!(form.get("phone").unwrap(), "+7900");
        assert_eq!(form.get("email").unwrap(), "");
    }

    #[test]
    fn test_decode_keeps_broken_escapes() {
        assert_eq!(decode_component("100%"), "100%");
        assert_eq!(decode_component("%zz"), "%zz");
        assert_eq!(decode_component("%4"), "%4");
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("Ресторан \"У Моря\""), "%D0%A0%D0%B5%D1%81%D1%82%D0%BE%D1%80%D0%B0%D0%BD+%22%D0%A3+%D0%9C%D0%BE%D1%80%D1%8F%22");
        assert_eq!(decode_component(&encode_component("a+b & c=d")), "a+b & c=d");
        assert_eq!(encode_pairs(&[("code", "TEST 1"), ("ts", "1")]), "code=TEST+1&ts=1");
    }
}
