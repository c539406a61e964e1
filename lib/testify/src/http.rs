use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use headers::{Authorization, HeaderMapExt};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub fn unauthorized() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .body(Full::new("401 Unauthorized\n".into()))
        .unwrap()
}

/// HTTP status code 404
pub fn not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new("Not Found".into()))
        .unwrap()
}

#[derive(Clone)]
struct Route {
    status: StatusCode,
    body: Bytes,
}

/// A request observed by the mock server.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

/// A tiny HTTP/1 server for tests.
///
/// Explicit routes win over fixtures. With `fixtures(root)`, a GET of
/// `/redfish/v1/Foo/Bar` is answered with `root/Foo/Bar/index.json`.
#[derive(Default)]
pub struct MockServer {
    routes: HashMap<String, Route>,
    delays: HashMap<String, Duration>,
    root: Option<PathBuf>,
    credential: Option<(String, String)>,
}

struct State {
    routes: HashMap<String, Route>,
    delays: HashMap<String, Duration>,
    root: Option<PathBuf>,
    auth: Option<HeaderMap>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, status: StatusCode, body: impl Into<Bytes>) -> Self {
        self.routes.insert(
            path.to_string(),
            Route {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Serve the content of `filename` with 200 at `path`.
    pub fn route_file(self, path: &str, filename: impl AsRef<Path>) -> Self {
        let filename = filename.as_ref();
        let data = std::fs::read(filename)
            .unwrap_or_else(|err| panic!("read fixture {filename:?} failed, {err}"));

        self.route(path, StatusCode::OK, data)
    }

    pub fn fixtures(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Hold the response of `path` for `delay` before answering.
    pub fn delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    /// Reject requests without the matching Basic credential with 401.
    pub fn with_basic_auth(mut self, user: &str, password: &str) -> Self {
        self.credential = Some((user.to_string(), password.to_string()));
        self
    }

    pub async fn start(self) -> ServerHandle {
        let listener = TcpListener::bind(crate::next_addr())
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr of mock server");

        let auth = self.credential.map(|(user, password)| {
            let mut headers = HeaderMap::new();
            headers.typed_insert(Authorization::basic(&user, &password));
            headers
        });

        let state = Arc::new(State {
            routes: self.routes,
            delays: self.delays,
            root: self.root,
            auth,
            requests: Mutex::new(vec![]),
        });

        let task = tokio::spawn({
            let state = Arc::clone(&state);

            async move {
                loop {
                    let Ok((stream, _peer)) = listener.accept().await else {
                        continue;
                    };

                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let service = service_fn(|req: Request<Incoming>| {
                            let state = Arc::clone(&state);
                            async move { Ok::<_, Infallible>(state.handle(req).await) }
                        });

                        // clients hanging up early is expected in timeout tests
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await;
                    });
                }
            }
        });

        ServerHandle { addr, state, task }
    }
}

impl State {
    async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let path = req.uri().path().to_string();

        self.requests.lock().unwrap().push(Recorded {
            method: req.method().clone(),
            path: path.clone(),
            headers: req.headers().clone(),
        });

        if let Some(expected) = &self.auth {
            let matched = match (
                expected.get(http::header::AUTHORIZATION),
                req.headers().get(http::header::AUTHORIZATION),
            ) {
                (Some(want), Some(got)) => want == got,
                _ => false,
            };

            if !matched {
                return unauthorized();
            }
        }

        if let Some(delay) = self.delays.get(&path) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(route) = self.routes.get(&path) {
            return Response::builder()
                .status(route.status)
                .header("Content-Type", "application/json")
                .body(Full::new(route.body.clone()))
                .unwrap();
        }

        if req.method() != Method::GET {
            return not_found();
        }

        let (Some(root), Some(rest)) = (&self.root, path.strip_prefix("/redfish/v1")) else {
            return not_found();
        };

        let filename = root
            .join(rest.trim_matches('/'))
            .join("index.json");
        match tokio::fs::read(&filename).await {
            Ok(data) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Full::new(data.into()))
                .unwrap(),
            Err(_) => not_found(),
        }
    }
}

/// A running [`MockServer`], stopped when dropped.
pub struct ServerHandle {
    addr: SocketAddr,
    state: Arc<State>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://ip:port`, without a trailing slash
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// How many times `path` was requested.
    pub fn hits(&self, path: &str) -> usize {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
