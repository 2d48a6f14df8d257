//! End-to-end HTTP scenarios from spec.md §8: a CRUD demo server over
//! plain TCP, exercising GET/POST/PUT/DELETE and the 404-not-found
//! convention for unknown resources.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netcore_http::{
    make_error_response_with_status, make_ok_response, HttpClient, HttpContext, HttpHandler, HttpRequest,
    HttpResponse, HttpServer,
};
use netcore_tcp::{TcpAcceptor, TcpConfig, TcpConnector};
use tokio::time::timeout;

/// An in-memory key/value store keyed by URL path, the CRUD demo's
/// "resource".
#[derive(Default)]
struct Store {
    items: Mutex<HashMap<String, Vec<u8>>>,
}

struct CrudServerHandler {
    store: Arc<Store>,
}

impl HttpHandler for CrudServerHandler {
    fn on_request(&self, ctx: &HttpContext, req: &HttpRequest) {
        let mut items = self.store.items.lock().expect("store mutex poisoned");
        let response = match req.method.as_str() {
            "GET" => match items.get(&req.url) {
                Some(body) => netcore_http::make_get_response(body.clone()),
                None => make_error_response_with_status(404, "not found"),
            },
            "POST" | "PUT" => {
                items.insert(req.url.clone(), req.body.to_vec());
                make_ok_response()
            }
            "DELETE" => {
                if items.remove(&req.url).is_some() {
                    make_ok_response()
                } else {
                    make_error_response_with_status(404, "not found")
                }
            }
            _ => make_error_response_with_status(405, "method not allowed"),
        };
        ctx.respond(&response);
    }
}

#[derive(Default)]
struct CrudClientHandler {
    last_response: Arc<Mutex<Option<HttpResponse>>>,
}

impl HttpHandler for CrudClientHandler {
    fn on_response(&self, _ctx: &HttpContext, resp: &HttpResponse) {
        *self.last_response.lock().expect("last_response mutex poisoned") = Some(resp.clone());
    }
}

fn get_request(url: &str) -> HttpRequest {
    build_request("GET", url, Vec::new())
}

fn build_request(method: &str, url: &str, body: Vec<u8>) -> HttpRequest {
    HttpRequest {
        method: method.to_string(),
        url: url.to_string(),
        version: netcore_http::HttpVersion::Http11,
        headers: vec![
            ("Host".to_string(), "localhost".to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
        ],
        body: body.into(),
        raw: bytes::Bytes::new(),
    }
}

async fn wait_for_response(last: &Arc<Mutex<Option<HttpResponse>>>) -> HttpResponse {
    timeout(Duration::from_secs(2), async {
        loop {
            if let Some(resp) = last.lock().expect("last_response mutex poisoned").take() {
                return resp;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("no response within timeout")
}

#[tokio::test]
async fn http_crud_demo_over_tcp() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let acceptor = TcpAcceptor::bind(addr, TcpConfig::default()).unwrap();
    let local_addr = acceptor.local_addr().unwrap();
    let store = Arc::new(Store::default());
    let server = HttpServer::with_listener(acceptor, move || CrudServerHandler { store: store.clone() });
    server.start();

    let last_response = Arc::new(Mutex::new(None));
    let last_for_factory = last_response.clone();
    let client = HttpClient::new(TcpConnector::new(local_addr, TcpConfig::default()), move || CrudClientHandler {
        last_response: last_for_factory.clone(),
    });
    client.connect().await.unwrap();

    // GET before creation: 404.
    client.send_request(&get_request("/widgets/1")).unwrap();
    let resp = wait_for_response(&last_response).await;
    assert_eq!(resp.status, 404);

    // PUT creates the resource.
    client
        .send_request(&build_request("PUT", "/widgets/1", b"gear".to_vec()))
        .unwrap();
    let resp = wait_for_response(&last_response).await;
    assert_eq!(resp.status, 200);

    // GET now returns the stored body.
    client.send_request(&get_request("/widgets/1")).unwrap();
    let resp = wait_for_response(&last_response).await;
    assert_eq!(resp.status, 200);
    assert_eq!(&resp.body[..], b"gear");

    // POST overwrites it.
    client
        .send_request(&build_request("POST", "/widgets/1", b"sprocket".to_vec()))
        .unwrap();
    let resp = wait_for_response(&last_response).await;
    assert_eq!(resp.status, 200);
    client.send_request(&get_request("/widgets/1")).unwrap();
    let resp = wait_for_response(&last_response).await;
    assert_eq!(&resp.body[..], b"sprocket");

    // DELETE removes it; a second DELETE is a 404.
    client
        .send_request(&build_request("DELETE", "/widgets/1", Vec::new()))
        .unwrap();
    let resp = wait_for_response(&last_response).await;
    assert_eq!(resp.status, 200);
    client
        .send_request(&build_request("DELETE", "/widgets/1", Vec::new()))
        .unwrap();
    let resp = wait_for_response(&last_response).await;
    assert_eq!(resp.status, 404);

    client.disconnect().await;
    server.stop().await;
}
