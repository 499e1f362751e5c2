use std::time::Duration;

use futures::{SinkExt as _, StreamExt as _};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::channel::{Channel, ChannelConnector, ChannelStatus};
use crate::errors::ChannelError;
use crate::model::SessionHandle;

const OUTBOUND_CAPACITY: usize = 8;

/// Opens WebSocket channels at `{base_url}/ws/{session_id}`.
#[derive(Clone, Debug)]
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub(crate) fn channel_url(&self, session: &SessionHandle) -> String {
        format!(
            "{}/ws/{}",
            self.base_url.trim_end_matches('/'),
            session.session_id
        )
    }
}

#[async_trait::async_trait]
impl ChannelConnector for WsConnector {
    async fn open(
        &self,
        session: &SessionHandle,
        buffer_capacity: usize,
    ) -> Result<Box<dyn Channel>, ChannelError> {
        let url = self.channel_url(session);
        debug!(event = "channel.opening", url = %url);
        let (status_tx, status_rx) = watch::channel(ChannelStatus::Connecting);
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer_capacity.max(1));
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let task = tokio::spawn(pump(url, status_tx, inbound_tx, outbound_rx));
        Ok(Box::new(WsChannel {
            status: status_rx,
            inbound: inbound_rx,
            outbound: outbound_tx,
            task,
        }))
    }
}

/// Handle to a WebSocket owned by a background pump task.
pub struct WsChannel {
    status: watch::Receiver<ChannelStatus>,
    inbound: mpsc::Receiver<Result<String, ChannelError>>,
    outbound: mpsc::Sender<String>,
    task: JoinHandle<()>,
}

#[async_trait::async_trait]
impl Channel for WsChannel {
    fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    /// Waits for the handshake result pushed by the pump task.
    async fn ready(&mut self, _poll_interval: Duration) -> Result<(), ChannelError> {
        let status = *self
            .status
            .wait_for(|status| *status != ChannelStatus::Connecting)
            .await
            .map_err(|_| ChannelError::closed("channel task ended during handshake"))?;
        match status {
            ChannelStatus::Open => Ok(()),
            ChannelStatus::Connecting | ChannelStatus::Closed => {
                Err(ChannelError::closed("websocket handshake failed"))
            }
        }
    }

    async fn send(&mut self, frame: String) -> Result<(), ChannelError> {
        self.outbound
            .send(frame)
            .await
            .map_err(|_| ChannelError::closed("websocket writer has stopped"))
    }

    async fn next_frame(&mut self) -> Option<Result<String, ChannelError>> {
        self.inbound.recv().await
    }

    async fn disconnect(self: Box<Self>) {
        let WsChannel {
            inbound,
            outbound,
            task,
            ..
        } = *self;
        drop(inbound);
        drop(outbound);
        if let Err(err) = task.await {
            warn!(event = "channel.pump_failed", error = %err);
        }
    }
}

async fn pump(
    url: String,
    status: watch::Sender<ChannelStatus>,
    inbound: mpsc::Sender<Result<String, ChannelError>>,
    mut outbound: mpsc::Receiver<String>,
) {
    let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(err) => {
            warn!(event = "channel.connect_failed", url = %url, error = %err);
            let _ = status.send(ChannelStatus::Closed);
            return;
        }
    };
    let _ = status.send(ChannelStatus::Open);
    debug!(event = "channel.open", url = %url);

    let (mut writer, mut reader) = socket.split();
    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(frame) => {
                    if let Err(err) = writer.send(Message::text(frame)).await {
                        let _ = inbound
                            .send(Err(ChannelError::transport(format!(
                                "websocket write failed: {err}"
                            ))))
                            .await;
                        break;
                    }
                }
                None => {
                    if let Err(err) = writer.send(Message::Close(None)).await {
                        debug!(event = "channel.close_failed", error = %err);
                    }
                    break;
                }
            },
            incoming = reader.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if inbound.send(Ok(text.as_str().to_owned())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    warn!(event = "channel.binary_skipped", len = bytes.len() as u64);
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(event = "channel.remote_close", frame = ?frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    let _ = inbound
                        .send(Err(ChannelError::transport(format!(
                            "websocket read failed: {err}"
                        ))))
                        .await;
                    break;
                }
                None => break,
            },
        }
    }
    let _ = status.send(ChannelStatus::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SessionClient;
    use crate::errors::{IdeaError, SessionError};
    use crate::model::GenerationRequest;
    use crate::session::SessionApi;
    use futures::{SinkExt as _, StreamExt as _};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    struct ServerLog {
        path: String,
        received: Vec<String>,
        saw_close: bool,
    }

    /// Accepts one websocket, waits for the first text frame, replays
    /// `script`, then records everything until the client closes.
    async fn spawn_server(script: Vec<String>) -> (String, JoinHandle<ServerLog>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut path = String::new();
            let mut ws = tokio_tungstenite::accept_hdr_async(
                stream,
                |request: &Request, response: Response| {
                    path = request.uri().path().to_string();
                    Ok::<Response, ErrorResponse>(response)
                },
            )
            .await
            .expect("handshake");

            let mut log = ServerLog {
                path: String::new(),
                received: Vec::new(),
                saw_close: false,
            };
            while let Some(message) = ws.next().await {
                if let Message::Text(text) = message.expect("message") {
                    log.received.push(text.as_str().to_owned());
                    break;
                }
            }
            for frame in script {
                ws.send(Message::text(frame)).await.expect("send");
            }
            while let Some(Ok(message)) = ws.next().await {
                match message {
                    Message::Text(text) => log.received.push(text.as_str().to_owned()),
                    Message::Close(_) => {
                        log.saw_close = true;
                        break;
                    }
                    _ => {}
                }
            }
            log.path = path;
            log
        });
        (format!("ws://{addr}"), handle)
    }

    struct FixedSession(&'static str);

    #[async_trait::async_trait]
    impl SessionApi for FixedSession {
        async fn create_session(
            &self,
            _request: &GenerationRequest,
        ) -> Result<SessionHandle, SessionError> {
            Ok(SessionHandle::new(self.0))
        }
    }

    #[test]
    fn channel_url_uses_session_id() {
        let connector = WsConnector::new("wss://ideas.example.com/");
        assert_eq!(
            connector.channel_url(&SessionHandle::new("abc")),
            "wss://ideas.example.com/ws/abc"
        );
    }

    #[tokio::test]
    async fn round_trip_over_loopback_socket() {
        let (base, server) = spawn_server(vec![
            r#"{"type":"connected"}"#.to_string(),
            r#"{"type":"complete"}"#.to_string(),
        ])
        .await;
        let connector = WsConnector::new(base);
        let mut channel = connector
            .open(&SessionHandle::new("sess-1"), 4)
            .await
            .expect("open");

        channel
            .ready(Duration::from_millis(50))
            .await
            .expect("ready");
        assert_eq!(channel.status(), ChannelStatus::Open);
        channel
            .send(r#"{"type":"start"}"#.to_string())
            .await
            .expect("send");

        let first = channel.next_frame().await.expect("frame").expect("ok");
        assert_eq!(first, r#"{"type":"connected"}"#);
        let second = channel.next_frame().await.expect("frame").expect("ok");
        assert_eq!(second, r#"{"type":"complete"}"#);

        channel.disconnect().await;
        let log = server.await.expect("server");
        assert_eq!(log.path, "/ws/sess-1");
        assert_eq!(log.received, vec![r#"{"type":"start"}"#.to_string()]);
        assert!(log.saw_close);
    }

    #[tokio::test]
    async fn ready_fails_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let connector = WsConnector::new(format!("ws://{addr}"));
        let mut channel = connector
            .open(&SessionHandle::new("s"), 4)
            .await
            .expect("open returns before connecting");
        let err = channel
            .ready(Duration::from_millis(50))
            .await
            .expect_err("refused");
        assert!(matches!(err, ChannelError::Closed { .. }));
        assert_eq!(channel.status(), ChannelStatus::Closed);
        channel.disconnect().await;
    }

    #[tokio::test]
    async fn session_client_end_to_end_over_websocket() {
        let state = serde_json::json!({
            "result": {
                "title": "5am Club, Honestly",
                "hook": "'I tried waking at 5am for 30 days'",
                "script_outline": "## Setup\n## Struggle\n## Result",
                "tags": ["mornings"],
            }
        });
        let (base, server) = spawn_server(vec![
            serde_json::json!({"type": "token", "content": "Thinking"}).to_string(),
            serde_json::json!({
                "type": "node_complete",
                "node": "structured_generation",
                "state": state,
            })
            .to_string(),
            serde_json::json!({"type": "complete"}).to_string(),
        ])
        .await;
        let client = SessionClient::builder()
            .session_api(Arc::new(FixedSession("live-1")))
            .connector(Arc::new(WsConnector::new(base)))
            .build()
            .expect("client");

        let idea = client
            .run(
                GenerationRequest::new("fitness creator").theme("morning routines"),
                9,
            )
            .await
            .expect("idea");
        assert_eq!(idea.title, "5am Club, Honestly");
        assert_eq!(idea.hook, "I tried waking at 5am for 30 days");
        assert_eq!(idea.beats, vec!["Setup", "Struggle", "Result"]);

        let log = server.await.expect("server");
        assert_eq!(log.path, "/ws/live-1");
        assert_eq!(log.received, vec![r#"{"type":"start"}"#.to_string()]);
        assert!(log.saw_close);
    }

    #[tokio::test]
    async fn remote_error_over_websocket_closes_channel() {
        let (base, server) = spawn_server(vec![
            serde_json::json!({"type": "error", "message": "quota exceeded"}).to_string(),
        ])
        .await;
        let client = SessionClient::builder()
            .session_api(Arc::new(FixedSession("live-2")))
            .connector(Arc::new(WsConnector::new(base)))
            .build()
            .expect("client");

        let err = client
            .run(GenerationRequest::new("p"), 1)
            .await
            .expect_err("remote error");
        assert_eq!(err, IdeaError::RemoteGeneration("quota exceeded".into()));
        assert!(server.await.expect("server").saw_close);
    }
}
