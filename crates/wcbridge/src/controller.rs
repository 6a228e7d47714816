//! The bridge controller: owns the session state machine, decrypts and
//! dispatches inbound frames, and re-encrypts outbound replies.
//!
//! Frame processing runs on a single event loop, so state transitions are
//! naturally serialized. Approval gates are awaited on spawned tasks and
//! matched back to their originating request id by capture, which lets any
//! number of consent prompts stay pending while traffic continues.

use crate::{
    approval::{
        ApprovalGate, RequestDecision, RequestMethod, SessionDecision, SessionProposal,
        SigningPrompt,
    },
    session::{
        BridgeConfig, PeerMeta, SessionParams, SessionRequestParams, SessionState,
        SessionUpdateParams,
    },
    signer::{TransactionParams, WalletSigner},
    transport::{Transport, TransportError, TransportEvent},
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;
use wcbridge_protocol::{
    EncryptedPayload, MessageType, ProtocolError, SessionKey, SocketMessage, WcUri, open, seal,
};
use wcbridge_rpc::{ResponseOutcome, RpcError, RpcRequest, RpcResponse};

/// Notifications surfaced to the host application.
#[derive(Clone, Debug)]
pub enum BridgeEvent {
    /// Session approved and acknowledged; the wallet now listens on its own
    /// client-id topic.
    SessionEstablished { peer_id: String, peer_meta: PeerMeta },
    /// The transport closed in an orderly fashion, or `disconnect` ran.
    Closed,
    /// Transport-level failure; the session is over, reconnection is the
    /// host's call.
    Error(String),
}

/// Failures of controller operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("rpc encode failed: {0}")]
    Rpc(#[from] serde_json::Error),
    #[error("session is closed")]
    Closed,
    #[error("already connected")]
    AlreadyConnected,
}

struct Inner<T, S, G> {
    config: BridgeConfig,
    uri: WcUri,
    key: SessionKey,
    client_id: String,
    transport: T,
    signer: S,
    gate: G,
    state: Mutex<SessionState>,
    peer_id: Mutex<Option<String>>,
    events: UnboundedSender<BridgeEvent>,
}

/// Wallet-side controller for one bridge session.
pub struct BridgeController<T, S, G> {
    inner: Arc<Inner<T, S, G>>,
}

impl<T, S, G> Clone for BridgeController<T, S, G> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T, S, G> BridgeController<T, S, G>
where
    T: Transport,
    S: WalletSigner,
    G: ApprovalGate,
{
    /// Creates a controller for the session described by `uri`.
    ///
    /// Fails only if the uri's key material is not valid 32-byte hex. The
    /// returned receiver carries host notifications for this session.
    pub fn new(
        config: BridgeConfig,
        uri: WcUri,
        transport: T,
        signer: S,
        gate: G,
    ) -> Result<(Self, UnboundedReceiver<BridgeEvent>), BridgeError> {
        let key = SessionKey::from_hex(&uri.key)?;
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            config,
            uri,
            key,
            client_id: Uuid::new_v4().to_string(),
            transport,
            signer,
            gate,
            state: Mutex::new(SessionState::Idle),
            peer_id: Mutex::new(None),
            events,
        };
        Ok((Self { inner: Arc::new(inner) }, rx))
    }

    /// The locally generated id the counterparty will address us by.
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.lock()
    }

    pub fn peer_id(&self) -> Option<String> {
        self.inner.peer_id.lock().clone()
    }

    /// Marks the connection attempt as started. The transport's `Opened`
    /// event completes the handshake by subscribing to the session topic.
    pub fn connect(&self) -> Result<(), BridgeError> {
        let mut state = self.inner.state.lock();
        match *state {
            SessionState::Idle | SessionState::Connecting => {
                *state = SessionState::Connecting;
                Ok(())
            }
            SessionState::Closed => Err(BridgeError::Closed),
            _ => Err(BridgeError::AlreadyConnected),
        }
    }

    /// Drives the controller from the transport's event stream until it
    /// ends.
    pub async fn run(&self, mut events: UnboundedReceiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
    }

    /// Processes one transport event.
    pub async fn handle_event(&self, event: TransportEvent) {
        if self.state() == SessionState::Closed {
            trace!(target: "bridge", "dropping event for closed session");
            return;
        }
        match event {
            TransportEvent::Opened => self.on_open().await,
            TransportEvent::Message(raw) => {
                if let Err(err) = self.handle_frame(&raw).await {
                    warn!(target: "bridge", %err, "dropping inbound frame");
                }
            }
            TransportEvent::Closed => {
                *self.inner.state.lock() = SessionState::Closed;
                self.notify(BridgeEvent::Closed);
            }
            TransportEvent::Error(reason) => {
                *self.inner.state.lock() = SessionState::Closed;
                self.notify(BridgeEvent::Error(reason));
            }
        }
    }

    /// Socket is open: subscribe to the session topic and start waiting for
    /// the counterparty's session request.
    async fn on_open(&self) {
        *self.inner.state.lock() = SessionState::Subscribed;
        if let Err(err) = self.send_subscribe(self.inner.uri.topic.clone()).await {
            warn!(target: "bridge", %err, "failed to subscribe to session topic");
        }
        *self.inner.state.lock() = SessionState::AwaitingSessionRequest;
        debug!(target: "bridge", topic = %self.inner.uri.topic, "awaiting session request");
    }

    /// Frame → envelope → plaintext → rpc → dispatch. Every failing stage
    /// is reported by name; the frame is dropped and the session stays up.
    async fn handle_frame(&self, raw: &str) -> Result<(), BridgeError> {
        let frame: SocketMessage = serde_json::from_str(raw)
            .map_err(|err| trace_stage("frame", err))?;
        if frame.kind != MessageType::Pub {
            trace!(target: "bridge", "ignoring non-pub frame");
            return Ok(());
        }
        let payload: EncryptedPayload = serde_json::from_str(&frame.payload)
            .map_err(|err| trace_stage("payload", err))?;
        let plaintext = open(&self.inner.key, &payload).inspect_err(|err| {
            warn!(target: "bridge", stage = "open", %err, "envelope rejected");
        })?;
        let request: RpcRequest = serde_json::from_slice(&plaintext)
            .map_err(|err| trace_stage("rpc", err))?;
        self.dispatch(request).await;
        Ok(())
    }

    async fn dispatch(&self, request: RpcRequest) {
        let Some(method) = request.method.clone() else {
            warn!(target: "bridge", id = request.id, "request without method, ignoring");
            return;
        };
        trace!(target: "bridge", %method, id = request.id, "dispatching");
        match method.as_str() {
            "wc_sessionRequest" => self.on_session_request(request),
            "eth_sign" => self.on_signing_request(request, RequestMethod::Sign),
            "eth_signTypedData" => self.on_signing_request(request, RequestMethod::SignTypedData),
            "eth_sendTransaction" => self.on_send_transaction(request),
            other => {
                warn!(target: "bridge", method = other, "unknown method, no response sent");
            }
        }
    }

    /// Counterparty proposes a session. The consent prompt runs on its own
    /// task; no state changes until the user decides.
    fn on_session_request(&self, request: RpcRequest) {
        if self.state() != SessionState::AwaitingSessionRequest {
            warn!(target: "bridge", state = ?self.state(), "unexpected session request, ignoring");
            return;
        }
        let params: SessionRequestParams = match request.params.first() {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(params) => params,
                Err(err) => {
                    warn!(target: "bridge", %err, "malformed session request params, ignoring");
                    return;
                }
            },
            None => {
                warn!(target: "bridge", "session request without params, ignoring");
                return;
            }
        };

        let this = self.clone();
        let id = request.id;
        tokio::spawn(async move {
            let proposal = SessionProposal {
                peer_id: params.peer_id.clone(),
                peer_meta: params.peer_meta.clone(),
                chain_id: params.chain_id,
            };
            let decision = this.inner.gate.approve_session(proposal).await;
            // The session may have been torn down while the prompt was
            // pending; a late decision must not touch a terminal state.
            if this.state() != SessionState::AwaitingSessionRequest {
                debug!(target: "bridge", "session no longer awaiting, dropping session decision");
                return;
            }
            let chain_id = this.inner.config.network.chain_id();
            match decision {
                SessionDecision::Approved { accounts } => {
                    *this.inner.peer_id.lock() = Some(params.peer_id.clone());
                    let result = SessionParams {
                        peer_id: this.inner.client_id.clone(),
                        peer_meta: this.inner.config.client_meta.clone(),
                        approved: true,
                        chain_id,
                        accounts,
                    };
                    if let Err(err) = this.respond_json(id, &result).await {
                        error!(target: "bridge", %err, "failed to send session approval");
                        return;
                    }
                    // The approval response must reach the wire before the
                    // counterparty can address the client-id topic.
                    if let Err(err) = this.send_subscribe(this.inner.client_id.clone()).await {
                        error!(target: "bridge", %err, "failed to subscribe to client topic");
                        return;
                    }
                    {
                        let mut state = this.inner.state.lock();
                        if *state == SessionState::Closed {
                            debug!(target: "bridge", "session closed during approval, not activating");
                            return;
                        }
                        *state = SessionState::Active;
                    }
                    info!(target: "bridge", peer = %params.peer_id, "session established");
                    this.notify(BridgeEvent::SessionEstablished {
                        peer_id: params.peer_id,
                        peer_meta: params.peer_meta,
                    });
                }
                SessionDecision::Rejected => {
                    // Wire quirk: rejection reuses the result envelope with
                    // approved=false, not the error envelope.
                    let result = SessionParams {
                        peer_id: this.inner.client_id.clone(),
                        peer_meta: this.inner.config.client_meta.clone(),
                        approved: false,
                        chain_id,
                        accounts: Vec::new(),
                    };
                    if let Err(err) = this.respond_json(id, &result).await {
                        error!(target: "bridge", %err, "failed to send session rejection");
                    }
                    debug!(target: "bridge", "session rejected, still awaiting session request");
                }
            }
        });
    }

    /// `eth_sign` / `eth_signTypedData`: `params = [address, payload]`.
    fn on_signing_request(&self, request: RpcRequest, method: RequestMethod) {
        if self.state() != SessionState::Active {
            warn!(target: "bridge", method = method.as_str(), "signing request outside active session");
            return;
        }
        let id = request.id;
        let (address, payload) = match (request.params.first(), request.params.get(1)) {
            (Some(address), Some(payload)) => (as_display_string(address), payload.clone()),
            _ => {
                self.respond_error_detached(id, RpcError::invalid_params("expected [address, message]"));
                return;
            }
        };

        let this = self.clone();
        tokio::spawn(async move {
            let message = as_display_string(&payload);
            let prompt = SigningPrompt {
                method,
                fields: vec![("address", address.clone()), ("message", message.clone())],
            };
            let decision = this.inner.gate.approve_request(prompt).await;
            if this.state() == SessionState::Closed {
                debug!(target: "bridge", "session closed during approval, dropping signing response");
                return;
            }
            let outcome = match decision {
                RequestDecision::Approved => {
                    let signed = match method {
                        RequestMethod::SignTypedData => {
                            this.inner.signer.sign_typed_data(&address, &payload).await
                        }
                        _ => this.inner.signer.sign_message(&address, &message).await,
                    };
                    match signed {
                        Ok(signature) => ResponseOutcome::Success(json!(signature)),
                        Err(err) => {
                            warn!(target: "bridge", %err, "signer failed");
                            RpcError::internal(err.to_string()).into()
                        }
                    }
                }
                RequestDecision::Rejected => RpcError::rejected("User rejected the request").into(),
            };
            if let Err(err) = this.respond(RpcResponse::new(id, outcome)).await {
                error!(target: "bridge", %err, "failed to send signing response");
            }
        });
    }

    /// `eth_sendTransaction`: `params = [tx]`. Rejection must use the
    /// strict error envelope, anything else trips the counterparty's
    /// dispatcher.
    fn on_send_transaction(&self, request: RpcRequest) {
        if self.state() != SessionState::Active {
            warn!(target: "bridge", "transaction request outside active session");
            return;
        }
        let id = request.id;
        let tx: TransactionParams = match request.params.first() {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(tx) => tx,
                Err(err) => {
                    self.respond_error_detached(id, RpcError::invalid_params(err.to_string()));
                    return;
                }
            },
            None => {
                self.respond_error_detached(id, RpcError::invalid_params("expected [transaction]"));
                return;
            }
        };

        let this = self.clone();
        tokio::spawn(async move {
            let rendered = serde_json::to_string(&tx).unwrap_or_default();
            let prompt = SigningPrompt {
                method: RequestMethod::SendTransaction,
                fields: vec![("transaction", rendered)],
            };
            let decision = this.inner.gate.approve_request(prompt).await;
            if this.state() == SessionState::Closed {
                debug!(target: "bridge", "session closed during approval, dropping transaction response");
                return;
            }
            let outcome = match decision {
                RequestDecision::Approved => match this.inner.signer.send_transaction(tx).await {
                    Ok(hash) => ResponseOutcome::Success(json!(hash)),
                    Err(err) => {
                        warn!(target: "bridge", %err, "transaction submission failed");
                        RpcError::internal(err.to_string()).into()
                    }
                },
                RequestDecision::Rejected => {
                    RpcError::rejected("User rejected the transaction").into()
                }
            };
            if let Err(err) = this.respond(RpcResponse::new(id, outcome)).await {
                error!(target: "bridge", %err, "failed to send transaction response");
            }
        });
    }

    /// Announces closure (best effort), closes the transport and enters the
    /// terminal state. Exactly one session-closed frame is ever sent.
    pub async fn disconnect(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state == SessionState::Closed {
                return;
            }
            *state = SessionState::Closed;
        }
        let update = RpcRequest::new(
            "wc_sessionUpdate",
            vec![json!(SessionUpdateParams::closed())],
        );
        match serde_json::to_vec(&update) {
            Ok(plaintext) => {
                if let Err(err) = self.publish(&plaintext).await {
                    warn!(target: "bridge", %err, "failed to announce session close");
                }
            }
            Err(err) => warn!(target: "bridge", %err, "failed to encode session close"),
        }
        self.inner.transport.close().await;
        self.notify(BridgeEvent::Closed);
    }

    /// Serializes `result` into a success response for `id` and sends it.
    async fn respond_json<R: serde::Serialize>(&self, id: u64, result: &R) -> Result<(), BridgeError> {
        self.respond(RpcResponse::success(id, serde_json::to_value(result)?)).await
    }

    async fn respond(&self, response: RpcResponse) -> Result<(), BridgeError> {
        let plaintext = serde_json::to_vec(&response)?;
        self.publish(&plaintext).await
    }

    /// Sends an error response from a non-async context, logging failures.
    fn respond_error_detached(&self, id: u64, error: RpcError) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.respond(RpcResponse::error(id, error)).await {
                error!(target: "bridge", %err, "failed to send error response");
            }
        });
    }

    /// Seals and publishes a plaintext, targeting the peer topic once the
    /// peer is known and the session topic before that.
    async fn publish(&self, plaintext: &[u8]) -> Result<(), BridgeError> {
        let topic =
            self.peer_id().unwrap_or_else(|| self.inner.uri.topic.clone());
        let payload = seal(&self.inner.key, plaintext)?;
        let frame = SocketMessage::publish(topic, &payload)?;
        self.inner.transport.send(serde_json::to_string(&frame)?).await?;
        Ok(())
    }

    async fn send_subscribe(&self, topic: String) -> Result<(), BridgeError> {
        let frame = SocketMessage::subscribe(topic);
        self.inner.transport.send(serde_json::to_string(&frame)?).await?;
        Ok(())
    }

    fn notify(&self, event: BridgeEvent) {
        // The host may have dropped the receiver; that is not our problem.
        let _ = self.inner.events.send(event);
    }
}

/// Human-readable rendering of a params element: strings verbatim, other
/// JSON nodes as their compact text.
fn as_display_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn trace_stage(stage: &'static str, err: serde_json::Error) -> BridgeError {
    warn!(target: "bridge", stage, %err, "frame decode failed");
    BridgeError::Rpc(err)
}
