use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum PinboardBehavior {
    Done,
    Reject(&'static str),
}

#[derive(Debug, Clone)]
pub struct ServicesStubConfig {
    /// JSON returned as `data.article` for the GraphQL query.
    pub article_lookup: Value,
    pub pinboard: PinboardBehavior,
}

#[derive(Debug, Clone)]
pub struct GraphqlCall {
    pub authorization: Option<String>,
    pub variables: Value,
}

/// One fake host serving both the Omnivore GraphQL endpoint (`POST
/// /api/graphql`) and the Pinboard API (`GET /v1/posts/add`).
pub struct ServicesStub {
    pub graphql_url: String,
    pub pinboard_url: String,
    graphql_calls: Arc<Mutex<Vec<GraphqlCall>>>,
    pinboard_calls: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ServicesStub {
    pub fn spawn(config: ServicesStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start services stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let graphql_calls = Arc::new(Mutex::new(Vec::new()));
        let pinboard_calls = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let graphql_log = Arc::clone(&graphql_calls);
        let pinboard_log = Arc::clone(&pinboard_calls);
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let parsed = url::Url::parse(&format!("http://stub{}", request.url()))
                    .expect("parse request url");

                let method = request.method().clone();
                let response_body = match (&method, parsed.path()) {
                    (tiny_http::Method::Post, "/api/graphql") => {
                        let mut body = String::new();
                        if request.as_reader().read_to_string(&mut body).is_err() {
                            let _ = request.respond(
                                tiny_http::Response::from_string("invalid request body")
                                    .with_status_code(400),
                            );
                            continue;
                        }
                        let parsed_body: Value = match serde_json::from_str(&body) {
                            Ok(value) => value,
                            Err(_) => {
                                let _ = request.respond(
                                    tiny_http::Response::from_string("invalid json")
                                        .with_status_code(400),
                                );
                                continue;
                            }
                        };
                        let authorization = request
                            .headers()
                            .iter()
                            .find(|h| h.field.equiv("Authorization"))
                            .map(|h| h.value.as_str().to_owned());
                        graphql_log.lock().unwrap().push(GraphqlCall {
                            authorization,
                            variables: parsed_body
                                .get("variables")
                                .cloned()
                                .unwrap_or(Value::Null),
                        });
                        serde_json::json!({ "data": { "article": config.article_lookup } })
                    }
                    (tiny_http::Method::Get, "/v1/posts/add") => {
                        let query = parsed
                            .query_pairs()
                            .map(|(k, v)| (k.into_owned(), v.into_owned()))
                            .collect::<Vec<_>>();
                        pinboard_log.lock().unwrap().push(query);
                        match &config.pinboard {
                            PinboardBehavior::Done => serde_json::json!({ "result_code": "done" }),
                            PinboardBehavior::Reject(code) => {
                                serde_json::json!({ "result_code": *code })
                            }
                        }
                    }
                    _ => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("not found").with_status_code(404),
                        );
                        continue;
                    }
                };

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(200)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            graphql_url: format!("{base_url}/api/graphql"),
            pinboard_url: format!("{base_url}/v1"),
            graphql_calls,
            pinboard_calls,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn graphql_calls(&self) -> Vec<GraphqlCall> {
        self.graphql_calls.lock().unwrap().clone()
    }

    pub fn pinboard_calls(&self) -> Vec<Vec<(String, String)>> {
        self.pinboard_calls.lock().unwrap().clone()
    }
}

impl Drop for ServicesStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
