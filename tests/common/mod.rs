#![allow(dead_code)]

use chutes_openai_proxy::error::{ProxyError, Result};
use chutes_openai_proxy::models::chutes::ChutesRequest;
use chutes_openai_proxy::provider::{Upstream, UpstreamFuture, UpstreamResponse};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the fake backend does for one POST
pub enum Reply {
    Status(StatusCode, &'static str),
    Stream(Vec<&'static str>),
    Transport(&'static str),
}

/// Upstream that answers from a script and records every call
pub struct ScriptedUpstream {
    replies: Mutex<VecDeque<Reply>>,
    refreshes: Mutex<VecDeque<Option<&'static str>>>,
    refresh_enabled: bool,
    pub posts: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub seen_clearances: Mutex<Vec<Option<String>>>,
    pub refresh_inputs: Mutex<Vec<Option<String>>>,
    pub envelopes: Mutex<Vec<ChutesRequest>>,
}

impl ScriptedUpstream {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            refreshes: Mutex::new(VecDeque::new()),
            refresh_enabled: true,
            posts: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            seen_clearances: Mutex::new(Vec::new()),
            refresh_inputs: Mutex::new(Vec::new()),
            envelopes: Mutex::new(Vec::new()),
        }
    }

    /// Values handed out by successive refreshes; `None` means the refresh failed
    pub fn with_refreshes(self, refreshes: Vec<Option<&'static str>>) -> Self {
        *self.refreshes.lock().unwrap() = refreshes.into();
        self
    }

    pub fn without_refresh(mut self) -> Self {
        self.refresh_enabled = false;
        self
    }

    pub fn post_count(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

impl Upstream for ScriptedUpstream {
    fn post_chat<'a>(
        &'a self,
        request: &'a ChutesRequest,
        clearance: Option<&'a str>,
    ) -> UpstreamFuture<'a, Result<UpstreamResponse>> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        self.seen_clearances
            .lock()
            .unwrap()
            .push(clearance.map(String::from));
        self.envelopes.lock().unwrap().push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Transport("script exhausted"));

        Box::pin(async move {
            match reply {
                Reply::Status(status, body) => Ok(UpstreamResponse::from_chunks(status, [body])),
                Reply::Stream(chunks) => Ok(UpstreamResponse::from_chunks(StatusCode::OK, chunks)),
                Reply::Transport(msg) => Err(ProxyError::UpstreamError(msg.to_string())),
            }
        })
    }

    fn fetch_clearance<'a>(
        &'a self,
        clearance: Option<&'a str>,
    ) -> UpstreamFuture<'a, Option<String>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_inputs
            .lock()
            .unwrap()
            .push(clearance.map(String::from));
        let next = self.refreshes.lock().unwrap().pop_front().flatten();
        Box::pin(async move { next.map(String::from) })
    }

    fn supports_refresh(&self) -> bool {
        self.refresh_enabled
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// Body lines for a backend stream that says `Hi!` in two deltas
pub const HI_STREAM: [&str; 3] = [
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\n",
    "data: [DONE]\n\n",
];
