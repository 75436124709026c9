pub mod server;
pub use server::*;

pub mod request;
pub use request::*;

pub mod response;
pub use response::*;

pub mod client;
pub use client::*;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_simple_http_request() {
        // Port 0 lets the OS pick a free port
        let server = HttpServer::new("127.0.0.1:0").expect("Failed to spawn server");
        let addr = server.local_addr().unwrap().to_string();

        let handle = std::thread::spawn(move || {
            server
                .serve_once(|request| {
                    let echo = format!(
                        "{} {} {}",
                        request.method,
                        request.route_path(),
                        request.body
                    );
                    Response::ok_with_body(echo)
                })
                .unwrap();
        });

        let mut client = HttpClient::new(&addr).expect("Failed to connect client");
        let resp = client
            .send("POST", "/api/tips?code=TEST001", "{\"amount\": 250}")
            .expect("Failed to communicate with server");

        assert_eq!(resp.status, Some(200));
        assert_eq!(resp.body, "POST /api/tips {\"amount\": 250}");

        handle.join().unwrap();
    }
}
