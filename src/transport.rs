/// file: src/transport.rs
/// description: WebSocket transport abstraction and the tokio-tungstenite implementation
use crate::error::CoachIqError;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// Close code and reason reported by the peer, when the close was clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

/// Transport-level frame, decoupled from any one WebSocket library so the
/// connection loop can run against a mock in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close(Option<CloseInfo>),
}

pub type ConnectFuture<R, W> =
    Pin<Box<dyn Future<Output = Result<(W, R), CoachIqError>> + Send>>;

/// Dials a WebSocket endpoint and yields the split halves. The connection
/// manager owns whichever pair comes back; a transport instance is only a
/// dialer and holds no per-connection state.
pub trait WsTransport: Send + Sync + 'static {
    type Reader: Stream<Item = Result<Frame, CoachIqError>> + Send + Unpin + 'static;
    type Writer: Sink<Frame, Error = CoachIqError> + Send + Unpin + 'static;

    fn connect(&self, url: &Url) -> ConnectFuture<Self::Reader, Self::Writer>;
}

type WsStreamInner = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport over tokio-tungstenite with rustls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl WsTransport for TungsteniteTransport {
    type Reader = TungsteniteReader;
    type Writer = TungsteniteWriter;

    fn connect(&self, url: &Url) -> ConnectFuture<Self::Reader, Self::Writer> {
        let url = url.clone();
        Box::pin(async move {
            let (ws_stream, _response) = connect_async(url.as_str()).await?;
            let (sink, stream) = ws_stream.split();
            Ok((TungsteniteWriter(sink), TungsteniteReader(stream)))
        })
    }
}

pub struct TungsteniteReader(SplitStream<WsStreamInner>);

impl Stream for TungsteniteReader {
    type Item = Result<Frame, CoachIqError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.0.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(message))) => Poll::Ready(Some(Ok(frame_from_message(message)))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e.into()))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

pub struct TungsteniteWriter(SplitSink<WsStreamInner, Message>);

impl Sink<Frame> for TungsteniteWriter {
    type Error = CoachIqError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_ready_unpin(cx).map_err(Into::into)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Frame) -> Result<(), Self::Error> {
        self.0.start_send_unpin(message_from_frame(item)).map_err(Into::into)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_flush_unpin(cx).map_err(Into::into)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_close_unpin(cx).map_err(Into::into)
    }
}

fn frame_from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.to_string()),
        Message::Binary(data) => Frame::Binary(data.to_vec()),
        Message::Ping(data) => Frame::Ping(data.to_vec()),
        Message::Pong(data) => Frame::Pong(data.to_vec()),
        Message::Close(frame) => Frame::Close(frame.map(|f| CloseInfo {
            code: f.code.into(),
            reason: f.reason.to_string(),
        })),
        // Raw frames never surface from a read loop.
        Message::Frame(_) => Frame::Binary(Vec::new()),
    }
}

fn message_from_frame(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data.into()),
        Frame::Ping(data) => Message::Ping(data.into()),
        Frame::Pong(data) => Message::Pong(data.into()),
        Frame::Close(info) => Message::Close(info.map(|i| CloseFrame {
            code: CloseCode::from(i.code),
            reason: i.reason.into(),
        })),
    }
}
