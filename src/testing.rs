//! Test scaffolding: a scriptable in-memory transport.
//!
//! Lets connection-lifecycle tests run without a real server. Each dial
//! consumes the next scripted plan; once the script runs out every further
//! dial is refused, which is the behavior reconnect tests want anyway.

use crate::error::CoachIqError;
use crate::transport::{ConnectFuture, Frame, WsTransport};
use futures_util::{Sink, Stream};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

enum DialPlan {
    Refuse,
    Hang,
    Accept(mpsc::UnboundedReceiver<Result<Frame, CoachIqError>>),
}

/// Feeds frames into an accepted mock session. Dropping it ends the
/// stream, which the manager sees as an unclean close.
pub struct ServerHandle {
    frames: mpsc::UnboundedSender<Result<Frame, CoachIqError>>,
}

impl ServerHandle {
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.frames.send(Ok(Frame::Text(text.into())));
    }

    pub fn send_frame(&self, frame: Frame) {
        let _ = self.frames.send(Ok(frame));
    }

    pub fn fail(&self, message: &str) {
        let _ = self
            .frames
            .send(Err(CoachIqError::Transport(message.to_string())));
    }
}

#[derive(Clone, Default)]
pub struct MockTransport {
    dials: Arc<Mutex<VecDeque<DialPlan>>>,
    dial_count: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<Frame>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next dial to fail immediately.
    pub fn refuse_next(&self) {
        self.dials.lock().unwrap().push_back(DialPlan::Refuse);
    }

    /// Script the next dial to never resolve (exercises the dial timeout).
    pub fn hang_next(&self) {
        self.dials.lock().unwrap().push_back(DialPlan::Hang);
    }

    /// Script the next dial to succeed; the returned handle is the server
    /// side of the session.
    pub fn accept_next(&self) -> ServerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.dials.lock().unwrap().push_back(DialPlan::Accept(rx));
        ServerHandle { frames: tx }
    }

    pub fn dial_count(&self) -> usize {
        self.dial_count.load(Ordering::SeqCst)
    }

    /// Frames the manager wrote, across every session so far.
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent_frames()
            .into_iter()
            .filter_map(|frame| match frame {
                Frame::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl WsTransport for MockTransport {
    type Reader = MockReader;
    type Writer = MockWriter;

    fn connect(&self, _url: &url::Url) -> ConnectFuture<Self::Reader, Self::Writer> {
        self.dial_count.fetch_add(1, Ordering::SeqCst);
        let plan = self
            .dials
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DialPlan::Refuse);
        let sent = self.sent.clone();

        Box::pin(async move {
            match plan {
                DialPlan::Refuse => Err(CoachIqError::Transport(
                    "mock endpoint refused connection".to_string(),
                )),
                DialPlan::Hang => futures_util::future::pending().await,
                DialPlan::Accept(rx) => Ok((MockWriter { sent }, MockReader { frames: rx })),
            }
        })
    }
}

pub struct MockReader {
    frames: mpsc::UnboundedReceiver<Result<Frame, CoachIqError>>,
}

impl Stream for MockReader {
    type Item = Result<Frame, CoachIqError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_recv(cx)
    }
}

pub struct MockWriter {
    sent: Arc<Mutex<Vec<Frame>>>,
}

impl Sink<Frame> for MockWriter {
    type Error = CoachIqError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Frame) -> Result<(), Self::Error> {
        self.sent.lock().unwrap().push(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}
