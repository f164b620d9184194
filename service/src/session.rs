//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The session loop: binds one [`Transport`] to one handler instance and
//! drives it from `Opening` through `Closed`.
//!
//! This is the only place the Telnet codec, the line editor, and a
//! `ServerHandler` are all in scope together. Everything above this module
//! only ever touches a session through a [`SessionHandle`].

use crate::config::ServerConfig;
use crate::error::{Result, ServiceError};
use crate::handler::ServerHandler;
use crate::line::{LineEditor, LineEvent};
use crate::registry::Registry;
use crate::transport::Transport;
use crate::types::{now_unix_millis, SessionId, SessionInfo, SessionState, TransportKind};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telehub_telnetcodec::{CodecError, TelnetCodec, TelnetEvent, TelnetFrame, TelnetOption};
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

const WELCOME_WRITE_TIMEOUT: Duration = Duration::from_secs(2);
const NEGOTIATION_QUIESCENCE: Duration = Duration::from_millis(500);
const HANDLER_CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);
const CLOSING_FLUSH_CAP: Duration = Duration::from_secs(2);
const READ_CHUNK: usize = 4096;

/// Event published to the monitor bus (4.H): lifecycle and traffic.
///
/// This type deliberately carries no dependency on `telehub-monitor`; the
/// launcher, which depends on both crates, converts these into
/// `telehub_monitor::BusEvent` at the point where a `Server` is wired to a
/// `MonitorBus`.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started(SessionInfo),
    Ended(SessionId, &'static str),
    ClientInput(SessionId, String),
    ServerMessage(SessionId, String),
}

/// A live handle to a session, cheap to clone, safe to hold from a handler
/// callback or a push producer running on another task.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    peer_addr: SocketAddr,
    transport_kind: TransportKind,
    outbound: mpsc::UnboundedSender<Outbound>,
    cancel: Arc<Notify>,
    state: Arc<AtomicU8>,
}

#[derive(Debug)]
enum Outbound {
    Line(String),
    Raw(Vec<u8>),
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport_kind
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Queue a line for delivery, terminated the same way ordinary dispatcher
    /// output is (`\r\n`). Safe to call from any task, including a
    /// handler-driven push producer.
    pub fn write_line(&self, line: impl Into<String>) {
        let _ = self.outbound.send(Outbound::Line(line.into()));
    }

    /// Queue raw bytes, still routed through Telnet encoding if this session
    /// negotiates Telnet.
    pub fn write_raw(&self, bytes: impl Into<Vec<u8>>) {
        let _ = self.outbound.send(Outbound::Raw(bytes.into()));
    }

    /// Request cooperative termination. Idempotent.
    pub fn request_close(&self) {
        self.cancel.notify_one();
    }
}

/// Runs one session to completion. Returns once the transport has been
/// closed and the session has reached `Closed`.
///
/// `on_event` is called for session-started/session-ended bus publication;
/// it is synchronous and must not block (mirrors the monitor bus's
/// never-block-the-session contract).
#[instrument(skip_all, fields(session = %id, transport = %transport_kind))]
#[allow(clippy::too_many_arguments)]
pub async fn run(
    id: SessionId,
    peer_addr: SocketAddr,
    transport_kind: TransportKind,
    mut transport: Transport,
    config: Arc<ServerConfig>,
    handler: Arc<dyn ServerHandler>,
    cancel: Arc<Notify>,
    registry: Arc<Registry>,
    mut on_event: impl FnMut(SessionEvent),
) -> Result<SessionInfo> {
    let state = Arc::new(AtomicU8::new(SessionState::Opening as u8));
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();
    let handle = SessionHandle {
        id,
        peer_addr,
        transport_kind,
        outbound: outbound_tx,
        cancel: cancel.clone(),
        state: state.clone(),
    };

    let created_at = Instant::now();
    let mut info = SessionInfo {
        id,
        transport: transport_kind,
        state: SessionState::Opening,
        peer_addr,
        created_at,
        created_at_unix_ms: now_unix_millis(),
        last_activity: created_at,
        is_newest: true,
        bytes_sent: 0,
        bytes_received: 0,
    };

    let mut telnet = transport_kind
        .negotiates_telnet()
        .then(default_telnet_codec);
    let mut read_buf = BytesMut::with_capacity(READ_CHUNK);
    // Telnet sessions negotiate WILL ECHO and echo locally in the line
    // editor; line-mode TCP has no negotiation, so the client's own terminal
    // is assumed to echo and the server must stay silent.
    let mut editor = LineEditor::new(telnet.is_some());
    let mut ping_interval = wants_heartbeat(transport_kind).then(|| {
        let mut interval = tokio::time::interval(config.ping_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval
    });

    let result = run_inner(
        id,
        &mut transport,
        &mut telnet,
        &mut read_buf,
        &mut editor,
        &config,
        &handler,
        &handle,
        &cancel,
        &state,
        &mut outbound_rx,
        &mut info,
        &registry,
        &mut ping_interval,
        &mut on_event,
    )
    .await;

    let reason: &'static str = match &result {
        Ok(reason) => reason,
        Err(ServiceError::TransportClosed) => "eof",
        Err(ServiceError::HandlerTimeout) => "handler-timeout",
        Err(ServiceError::ProtocolError(_)) => "protocol-error",
        Err(_) => "error",
    };

    if let Err(err) = &result {
        handler.on_error(id, &handle, err).await;
    }

    state.store(SessionState::Closing as u8, Ordering::Release);
    info.state = SessionState::Closing;
    registry.update(id, info.clone());
    let _ = timeout(
        CLOSING_FLUSH_CAP,
        drain_outbound(id, &mut outbound_rx, &mut transport, &mut telnet, &mut on_event),
    )
    .await;
    let _ = transport.close().await;

    state.store(SessionState::Closed as u8, Ordering::Release);
    info.state = SessionState::Closed;
    info.last_activity = Instant::now();
    registry.update(id, info.clone());
    on_event(SessionEvent::Ended(id, reason));
    handler.on_disconnect(id, &handle).await;

    info!(reason, "session closed");
    match result {
        Ok(_) | Err(ServiceError::TransportClosed) => Ok(info),
        Err(err) => Err(err),
    }
}

fn wants_heartbeat(transport_kind: TransportKind) -> bool {
    matches!(transport_kind, TransportKind::WebSocket | TransportKind::WsTelnet)
}

/// Resolves when `interval` next ticks, or never if there is no heartbeat
/// for this session's transport.
async fn ping_tick(interval: &mut Option<tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn default_telnet_codec() -> TelnetCodec {
    let mut codec = TelnetCodec::new();
    for option in [
        TelnetOption::Echo,
        TelnetOption::SuppressGoAhead,
        TelnetOption::TerminalType,
        TelnetOption::Naws,
        TelnetOption::Linemode,
    ] {
        codec.support_local(option);
        codec.support_remote(option);
    }
    codec
}

#[allow(clippy::too_many_arguments)]
async fn run_inner(
    id: SessionId,
    transport: &mut Transport,
    telnet: &mut Option<TelnetCodec>,
    read_buf: &mut BytesMut,
    editor: &mut LineEditor,
    config: &Arc<ServerConfig>,
    handler: &Arc<dyn ServerHandler>,
    handle: &SessionHandle,
    cancel: &Arc<Notify>,
    state: &Arc<AtomicU8>,
    outbound_rx: &mut mpsc::UnboundedReceiver<Outbound>,
    info: &mut SessionInfo,
    registry: &Arc<Registry>,
    ping_interval: &mut Option<tokio::time::Interval>,
    on_event: &mut dyn FnMut(SessionEvent),
) -> Result<&'static str> {
    if !config.welcome_message.is_empty() {
        let mut bytes = config.welcome_message.clone().into_bytes();
        bytes.extend_from_slice(b"\r\n");
        let _ = timeout(WELCOME_WRITE_TIMEOUT, write_out(transport, telnet, &bytes)).await
            .map_err(|_| ServiceError::HandlerTimeout)??;
        info.bytes_sent += bytes.len() as u64;
    }

    state.store(SessionState::Negotiating as u8, Ordering::Release);
    info.state = SessionState::Negotiating;
    registry.update(id, info.clone());

    if let Some(codec) = telnet.as_mut() {
        negotiate_bringup(transport, codec, info).await?;
    }

    state.store(SessionState::Running as u8, Ordering::Release);
    info.state = SessionState::Running;
    registry.update(id, info.clone());
    handler.on_connect(id, handle).await;

    loop {
        tokio::select! {
            biased;

            _ = cancel.notified() => {
                debug!("session cancelled");
                return Ok("cancelled");
            }

            Some(outbound) = outbound_rx.recv() => {
                deliver_outbound(id, transport, telnet, outbound, info, on_event).await?;
            }

            _ = ping_tick(ping_interval) => {
                transport.heartbeat(config.ping_timeout).await?;
            }

            chunk = transport.read_some(READ_CHUNK) => {
                let chunk = chunk?;
                if chunk.is_empty() {
                    return Ok("eof");
                }
                info.bytes_received += chunk.len() as u64;
                info.last_activity = Instant::now();

                let trigger = feed_input(
                    id, transport, telnet, read_buf, editor, config, handler, handle, info, &chunk,
                    outbound_rx, on_event,
                ).await?;
                if let Some(reason) = trigger {
                    return Ok(reason);
                }
            }

            _ = tokio::time::sleep(idle_deadline(info, config)) => {
                warn!("session idle timeout");
                handler.on_idle_timeout(id, handle).await;
                return Ok("idle");
            }
        }
        registry.update(id, info.clone());
    }
}

fn idle_deadline(info: &SessionInfo, config: &ServerConfig) -> Duration {
    config
        .connection_timeout
        .saturating_sub(info.last_activity.elapsed())
}

/// Feeds one freshly-read chunk through Telnet + the line editor + the
/// dispatcher. Returns the termination reason if a terminal trigger fired.
#[allow(clippy::too_many_arguments)]
async fn feed_input(
    id: SessionId,
    transport: &mut Transport,
    telnet: &mut Option<TelnetCodec>,
    read_buf: &mut BytesMut,
    editor: &mut LineEditor,
    config: &Arc<ServerConfig>,
    handler: &Arc<dyn ServerHandler>,
    handle: &SessionHandle,
    info: &mut SessionInfo,
    chunk: &[u8],
    outbound_rx: &mut mpsc::UnboundedReceiver<Outbound>,
    on_event: &mut dyn FnMut(SessionEvent),
) -> Result<Option<&'static str>> {
    if let Some(codec) = telnet.as_mut() {
        read_buf.extend_from_slice(chunk);
        loop {
            let event = match decode_one(codec, read_buf) {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(err) => return Err(ServiceError::ProtocolError(err)),
            };
            send_pending_replies(transport, codec, info).await?;
            if let TelnetEvent::Data(byte) = event {
                if let Some(trigger) = process_byte(
                    id, transport, telnet, editor, config, handler, handle, info, byte, outbound_rx,
                    on_event,
                )
                .await?
                {
                    return Ok(Some(trigger));
                }
            }
        }
        Ok(None)
    } else {
        for &byte in chunk {
            if let Some(trigger) = process_byte(
                id, transport, telnet, editor, config, handler, handle, info, byte, outbound_rx, on_event,
            )
            .await?
            {
                return Ok(Some(trigger));
            }
        }
        Ok(None)
    }
}

fn decode_one(
    codec: &mut TelnetCodec,
    buf: &mut BytesMut,
) -> std::result::Result<Option<TelnetEvent>, CodecError> {
    use tokio_util::codec::Decoder;
    codec.decode(buf)
}

async fn send_pending_replies(
    transport: &mut Transport,
    codec: &mut TelnetCodec,
    info: &mut SessionInfo,
) -> Result<()> {
    for reply in codec.take_pending_replies() {
        let bytes = encode_frame(codec, reply)?;
        transport.write_all(&bytes).await?;
        info.bytes_sent += bytes.len() as u64;
    }
    Ok(())
}

fn encode_frame(codec: &mut TelnetCodec, frame: TelnetFrame) -> Result<Vec<u8>> {
    use tokio_util::codec::Encoder;
    let mut buf = BytesMut::new();
    codec
        .encode(frame, &mut buf)
        .map_err(ServiceError::ProtocolError)?;
    Ok(buf.to_vec())
}

#[allow(clippy::too_many_arguments)]
async fn process_byte(
    id: SessionId,
    transport: &mut Transport,
    telnet: &mut Option<TelnetCodec>,
    editor: &mut LineEditor,
    config: &Arc<ServerConfig>,
    handler: &Arc<dyn ServerHandler>,
    handle: &SessionHandle,
    info: &mut SessionInfo,
    byte: u8,
    outbound_rx: &mut mpsc::UnboundedReceiver<Outbound>,
    on_event: &mut dyn FnMut(SessionEvent),
) -> Result<Option<&'static str>> {
    for event in editor.push_byte(byte) {
        match event {
            LineEvent::Echo(bytes) => {
                write_out(transport, telnet, &bytes).await?;
                info.bytes_sent += bytes.len() as u64;
            }
            LineEvent::Interrupt => return Ok(Some("client-interrupt")),
            LineEvent::OrderlyClose => return Ok(Some("client-eof")),
            LineEvent::LineReady(line) => {
                on_event(SessionEvent::ClientInput(id, line.clone()));
                if dispatch_line(
                    id, transport, telnet, config, handler, handle, info, &line, outbound_rx, on_event,
                )
                .await?
                {
                    return Ok(Some("client-quit"));
                }
            }
        }
    }
    Ok(None)
}

async fn dispatch_line(
    id: SessionId,
    transport: &mut Transport,
    telnet: &mut Option<TelnetCodec>,
    config: &Arc<ServerConfig>,
    handler: &Arc<dyn ServerHandler>,
    handle: &SessionHandle,
    info: &mut SessionInfo,
    line: &str,
    outbound_rx: &mut mpsc::UnboundedReceiver<Outbound>,
    on_event: &mut dyn FnMut(SessionEvent),
) -> Result<bool> {
    let trimmed = line.trim();
    if matches!(trimmed.to_ascii_lowercase().as_str(), "quit" | "exit" | "q") {
        write_line_out(transport, telnet, "Goodbye!", info).await?;
        on_event(SessionEvent::ServerMessage(id, "Goodbye!".to_string()));
        return Ok(true);
    }

    match timeout(HANDLER_CALLBACK_TIMEOUT, handler.on_line(id, handle, trimmed)).await {
        Ok(()) => {}
        Err(_) => {
            warn!("handler callback timed out");
            handler.on_timeout(id, handle).await;
            write_line_out(transport, telnet, "Internal error.", info).await?;
            on_event(SessionEvent::ServerMessage(id, "Internal error.".to_string()));
            return Ok(true);
        }
    }

    // Flush anything the handler pushed through the session handle during
    // `on_line` before the prompt, so direct responses land ahead of it
    // rather than racing the next `select!` iteration.
    while let Ok(outbound) = outbound_rx.try_recv() {
        deliver_outbound(id, transport, telnet, outbound, info, on_event).await?;
    }

    if !config.prompt.is_empty() {
        write_out(transport, telnet, config.prompt.as_bytes()).await?;
        info.bytes_sent += config.prompt.len() as u64;
    }
    Ok(false)
}

async fn deliver_outbound(
    id: SessionId,
    transport: &mut Transport,
    telnet: &mut Option<TelnetCodec>,
    outbound: Outbound,
    info: &mut SessionInfo,
    on_event: &mut dyn FnMut(SessionEvent),
) -> Result<()> {
    match outbound {
        Outbound::Line(line) => {
            write_line_out(transport, telnet, &line, info).await?;
            on_event(SessionEvent::ServerMessage(id, line));
            Ok(())
        }
        Outbound::Raw(bytes) => {
            write_out(transport, telnet, &bytes).await?;
            info.bytes_sent += bytes.len() as u64;
            Ok(())
        }
    }
}

async fn write_line_out(
    transport: &mut Transport,
    telnet: &mut Option<TelnetCodec>,
    line: &str,
    info: &mut SessionInfo,
) -> Result<()> {
    let mut bytes = line.as_bytes().to_vec();
    bytes.extend_from_slice(b"\r\n");
    write_out(transport, telnet, &bytes).await?;
    info.bytes_sent += bytes.len() as u64;
    Ok(())
}

async fn write_out(transport: &mut Transport, telnet: &mut Option<TelnetCodec>, bytes: &[u8]) -> Result<()> {
    match telnet {
        Some(codec) => {
            use tokio_util::codec::Encoder;
            let mut buf = BytesMut::new();
            codec
                .encode(bytes, &mut buf)
                .map_err(ServiceError::ProtocolError)?;
            transport.write_all(&buf).await
        }
        None => transport.write_all(bytes).await,
    }
}

/// Sends the initial option offers and waits out the 500 ms quiescence
/// window (or a hard idle-free ceiling of a few round trips) before
/// returning. Never fails the session: an unresponsive client simply
/// proceeds at `Running` with options at their defaults.
async fn negotiate_bringup(
    transport: &mut Transport,
    codec: &mut TelnetCodec,
    info: &mut SessionInfo,
) -> Result<()> {
    let offers = [
        codec.enable_remote(TelnetOption::SuppressGoAhead),
        codec.enable_local(TelnetOption::SuppressGoAhead),
        codec.enable_local(TelnetOption::Echo),
        codec.enable_remote(TelnetOption::TerminalType),
        codec.enable_remote(TelnetOption::Naws),
    ];
    for frame in offers.into_iter().flatten() {
        let bytes = encode_frame(codec, frame)?;
        transport.write_all(&bytes).await?;
        info.bytes_sent += bytes.len() as u64;
    }

    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        let read = timeout(NEGOTIATION_QUIESCENCE, transport.read_some(READ_CHUNK)).await;
        let chunk = match read {
            Ok(Ok(chunk)) => chunk,
            Ok(Err(err)) => return Err(err),
            Err(_) => break,
        };
        if chunk.is_empty() {
            break;
        }
        info.bytes_received += chunk.len() as u64;
        buf.extend_from_slice(&chunk);
        loop {
            match decode_one(codec, &mut buf) {
                Ok(Some(_event)) => send_pending_replies(transport, codec, info).await?,
                Ok(None) => break,
                Err(err) => return Err(ServiceError::ProtocolError(err)),
            }
        }
    }
    Ok(())
}

async fn drain_outbound(
    id: SessionId,
    outbound_rx: &mut mpsc::UnboundedReceiver<Outbound>,
    transport: &mut Transport,
    telnet: &mut Option<TelnetCodec>,
    on_event: &mut dyn FnMut(SessionEvent),
) {
    let mut info = SessionInfo {
        id,
        transport: TransportKind::Tcp,
        state: SessionState::Closing,
        peer_addr: "0.0.0.0:0".parse().expect("static address parses"),
        created_at: Instant::now(),
        created_at_unix_ms: now_unix_millis(),
        last_activity: Instant::now(),
        is_newest: false,
        bytes_sent: 0,
        bytes_received: 0,
    };
    while let Ok(outbound) = outbound_rx.try_recv() {
        let _ = deliver_outbound(id, transport, telnet, outbound, &mut info, on_event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_deadline_shrinks_as_time_passes() {
        let config = ServerConfig::default().with_connection_timeout(Duration::from_secs(60));
        let info = SessionInfo {
            id: SessionId::new(1),
            transport: TransportKind::Tcp,
            state: SessionState::Running,
            peer_addr: "127.0.0.1:1".parse().unwrap(),
            created_at: Instant::now(),
            created_at_unix_ms: now_unix_millis(),
            last_activity: Instant::now(),
            is_newest: true,
            bytes_sent: 0,
            bytes_received: 0,
        };
        let deadline = idle_deadline(&info, &config);
        assert!(deadline <= Duration::from_secs(60));
    }

    #[test]
    fn session_handle_exposes_state_transitions() {
        let state = Arc::new(AtomicU8::new(SessionState::Opening as u8));
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = SessionHandle {
            id: SessionId::new(1),
            peer_addr: "127.0.0.1:1".parse().unwrap(),
            transport_kind: TransportKind::Tcp,
            outbound: tx,
            cancel: Arc::new(Notify::new()),
            state: state.clone(),
        };
        assert_eq!(handle.state(), SessionState::Opening);
        state.store(SessionState::Running as u8, Ordering::Release);
        assert_eq!(handle.state(), SessionState::Running);
    }
}
