//! Test collaborators shared by the bundle tests.

use crate::Context;
use async_trait::async_trait;
use bytes::Bytes;
use parcel_archive::MemorySink;
use parcel_fetch::{HttpClient, Response};
use parcel_storage::{DirectLinks, Listing};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Serves fixed bodies by URL and records when each request starts and ends.
/// Unknown URLs are `404 Not Found`.
#[derive(Default)]
pub(crate) struct FakeClient {
    bodies: HashMap<String, Result<&'static [u8], u16>>,
    log: Mutex<Vec<String>>,
}

impl FakeClient {
    pub(crate) fn with_body(mut self, url: &str, body: &'static [u8]) -> Self {
        self.bodies.insert(url.to_string(), Ok(body));
        self
    }

    pub(crate) fn with_status(mut self, url: &str, status: u16) -> Self {
        self.bodies.insert(url.to_string(), Err(status));
        self
    }

    /// `start <url>` and `end <url>` lines, in the order they happened.
    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn requests(&self) -> usize {
        self.log().iter().filter(|line| line.starts_with("start ")).count()
    }
}

#[async_trait]
impl HttpClient for FakeClient {
    async fn get(&self, url: &str) -> parcel_fetch::error::Result<Response> {
        self.log.lock().unwrap().push(format!("start {url}"));
        // Give any concurrent caller the chance to interleave.
        tokio::task::yield_now().await;
        let response = match self.bodies.get(url) {
            Some(Ok(body)) => Response::ok([Bytes::from_static(body)]),
            Some(Err(status)) => Response::new(*status, "Nope", None),
            None => Response::new(404, "Not Found", None),
        };
        self.log.lock().unwrap().push(format!("end {url}"));
        Ok(response)
    }
}

pub(crate) fn context<L: Listing + 'static>(listing: Arc<L>, client: Arc<FakeClient>) -> Context {
    context_with_sink(listing, client, MemorySink::default())
}

pub(crate) fn context_with_sink<L: Listing + 'static>(
    listing: Arc<L>,
    client: Arc<FakeClient>,
    sink: MemorySink,
) -> Context {
    Context::new(listing, Arc::new(DirectLinks::new("http://store")), client, Arc::new(sink))
}
