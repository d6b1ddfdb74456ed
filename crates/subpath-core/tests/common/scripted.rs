//! In-memory transport with a scripted response table and an offline switch.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use subpath_core::error::TransportError;
use subpath_core::transport::{Request, Response, Transport};

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `status` for the exact URL (query included).
    pub fn route(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.as_bytes().to_vec()));
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs requested so far, in order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: Request) -> Result<Response, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(request.url.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::network(request.url.as_str(), "offline"));
        }
        let hit = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(match hit {
            Some((status, body)) => Response::new(status, body).with_url(request.url),
            None => Response::new(404, "not found").with_url(request.url),
        })
    }
}
