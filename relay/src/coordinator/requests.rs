use super::SessionCoordinator;
use crate::adapter::{RelayClient, RelayConnector};
use crate::delegates::{DelegateError, Notification, WalletDelegate};
use crate::errors::CoordinatorError;
use libwalletconnect::request::ApiRequest;
use libwalletconnect::state_machine::{Admission, PendingRequest};
use libwalletconnect::{
    resolve_signer, signing_intent, Address, ErrorReason, RelayMethod, RpcResponse, SessionRequestEvent, SignResult,
    SigningIntent, UnsignedTransaction,
};
use log::*;
use serde_json::Value;
use std::future::Future;
use tokio::runtime::Handle;

/// Keeps a request that is being prepared from being stranded in `Preparing` if the task preparing it is dropped.
///
/// Unless it is disarmed, dropping the guard answers the request with an error and releases the requests queued
/// behind it.
struct PreparingGuard<C: RelayConnector, D: WalletDelegate> {
    coordinator: SessionCoordinator<C, D>,
    event: Option<SessionRequestEvent>,
}

impl<C: RelayConnector, D: WalletDelegate> PreparingGuard<C, D> {
    fn new(coordinator: &SessionCoordinator<C, D>, event: &SessionRequestEvent) -> Self {
        Self { coordinator: coordinator.clone(), event: Some(event.clone()) }
    }

    fn disarm(mut self) {
        self.event = None;
    }
}

impl<C: RelayConnector, D: WalletDelegate> Drop for PreparingGuard<C, D> {
    fn drop(&mut self) {
        let Some(event) = self.event.take() else {
            return;
        };
        warn!("Preparation of request {} was interrupted", event.key());
        match Handle::try_current() {
            Ok(runtime) => {
                let coordinator = self.coordinator.clone();
                runtime.spawn(async move { coordinator.abandon_preparation(event).await });
            }
            Err(e) => error!("Request {} is stuck in preparation. {e}", event.key()),
        }
    }
}

impl<C: RelayConnector, D: WalletDelegate> SessionCoordinator<C, D> {
    /// Dispatches a `session_request` by method.
    ///
    /// Signing requests go through the request flow and wait for a user decision. Node and explorer calls are
    /// answered straight away, as are methods the wallet does not support.
    pub(crate) async fn on_session_request(&self, event: SessionRequestEvent) {
        match &event.method {
            method if method.is_signing() => self.on_signing_request(event).await,
            RelayMethod::RequestNodeApi | RelayMethod::RequestExplorerApi => self.passthrough(event).await,
            method => {
                warn!("Request {} uses unsupported method {method}", event.key());
                let response = RpcResponse::error(event.id, ErrorReason::unsupported_method());
                // A failed send has already been logged. There is nothing else to clean up.
                let _ = self.send_response(&event.topic, response).await;
            }
        }
    }

    async fn on_signing_request(&self, event: SessionRequestEvent) {
        let key = event.key();
        let admission = self.inner.requests.lock().await.admit(&event);
        match admission {
            Admission::Dispatch => {
                debug!("Preparing request {key}");
                if !self.prepare_signing(event).await {
                    self.dispatch_next().await;
                }
            }
            Admission::Deferred => info!("Request {key} queued behind the request in flight"),
            Admission::Duplicate => warn!("Request {key} is already being handled. Dropping the duplicate"),
        }
    }

    /// Translates and builds a signing request that has just entered the `Preparing` stage, then puts it in front of
    /// the user.
    ///
    /// Returns `true` if the request is now pending a decision. Otherwise it has been answered with an error, or
    /// dropped along with its session, and the flow has moved on.
    async fn prepare_signing(&self, event: SessionRequestEvent) -> bool {
        let key = event.key();
        let guard = PreparingGuard::new(self, &event);
        let addresses = self.inner.delegate.addresses().await;
        let intent = match signing_intent(&event, &addresses) {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Answering request {key} with an error. {e}");
                guard.disarm();
                self.finish_unsurfaced(&event, RpcResponse::error(event.id, (&e).into())).await;
                return false;
            }
        };
        let built = {
            let _busy = self.busy("Responding to WalletConnect");
            self.build_transaction(&intent).await
        };
        let unsigned_tx = match built {
            Ok(tx) => tx,
            Err(e) => {
                error!("Could not build the {} transaction for request {key}. {e}", intent.kind());
                let err = CoordinatorError::BuildFailed(e.to_string());
                self.notify(Notification::error(err.to_string()));
                guard.disarm();
                self.finish_unsurfaced(&event, RpcResponse::error(event.id, err.protocol_reason())).await;
                return false;
            }
        };
        let pending = PendingRequest { event, intent, unsigned_tx };
        let surfaced = self.inner.requests.lock().await.flow.surface(pending.clone());
        guard.disarm();
        match surfaced {
            Ok(()) => {
                info!("Request {key} ({}) is waiting for the user", pending.intent.kind());
                self.inner.delegate.on_request(&pending);
                true
            }
            Err(e) => {
                warn!("Request {key} left the flow while it was being prepared. {e}");
                false
            }
        }
    }

    async fn abandon_preparation(&self, event: SessionRequestEvent) {
        let reason = ErrorReason::send_failed().with_message("The request was interrupted before it could be shown");
        self.finish_unsurfaced(&event, RpcResponse::error(event.id, reason)).await;
        self.dispatch_next().await;
    }

    async fn build_transaction(&self, intent: &SigningIntent) -> Result<UnsignedTransaction, DelegateError> {
        let delegate = &self.inner.delegate;
        match intent {
            SigningIntent::Transfer(i) => delegate.build_transfer(i).await,
            SigningIntent::DeployContract(i) => delegate.build_deploy_contract(i).await,
            SigningIntent::ExecuteScript(i) => delegate.build_call_contract(i).await,
        }
    }

    /// Prepares queued requests in arrival order until one of them is surfaced or the queue is empty.
    pub(crate) async fn dispatch_next(&self) {
        loop {
            let next = self.inner.requests.lock().await.next_deferred();
            let Some(event) = next else {
                return;
            };
            debug!("Dispatching queued request {}", event.key());
            if self.prepare_signing(event).await {
                return;
            }
        }
    }

    async fn passthrough(&self, event: SessionRequestEvent) {
        let key = event.key();
        let request = match event.params::<ApiRequest>() {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed {} request {key}. {e}", event.method);
                let response = RpcResponse::error(event.id, ErrorReason::unsupported_method());
                let _ = self.send_response(&event.topic, response).await;
                return;
            }
        };
        debug!("Forwarding {} {} for request {key}", request.method, request.path);
        let result = match event.method {
            RelayMethod::RequestNodeApi => self.inner.delegate.node_request(&request).await,
            _ => self.inner.delegate.explorer_request(&request).await,
        };
        let response = match result {
            Ok(value) => RpcResponse::success(event.id, value),
            Err(e) => {
                warn!("API request {key} failed. {e}");
                RpcResponse::error(event.id, e.into())
            }
        };
        let _ = self.send_response(&event.topic, response).await;
    }

    //------------------------------------------   User decisions   ----------------------------------------------------

    /// Signs and submits the pending request with the wallet's signer and answers the dApp.
    pub async fn approve_request(&self) -> Result<SignResult, CoordinatorError> {
        let delegate = self.inner.delegate.clone();
        self.approve_request_with(move |tx, address| async move { delegate.sign_and_submit(&tx, &address).await })
            .await
    }

    /// Approves the pending request, using `sign` to sign and submit the transaction.
    ///
    /// The signer address is looked up again before signing. If the wallet no longer holds it, the dApp is told so
    /// and `sign` is never called. Whatever happens, exactly one response is sent and the request flow returns to
    /// idle.
    pub async fn approve_request_with<F, Fut>(&self, sign: F) -> Result<SignResult, CoordinatorError>
    where
        F: FnOnce(UnsignedTransaction, Address) -> Fut + Send,
        Fut: Future<Output = Result<Option<SignResult>, DelegateError>> + Send,
    {
        let request = self.inner.requests.lock().await.flow.take_for_response()?;
        let key = request.key();
        let outcome = {
            let _busy = self.busy("Signing transaction");
            self.sign_pending(&request, sign).await
        };
        let response = match &outcome {
            Ok((_, value)) => RpcResponse::success(key.id, value.clone()),
            Err(e) => RpcResponse::error(key.id, e.protocol_reason()),
        };
        let sent = self.finish_request(&request, response).await;
        match outcome {
            Ok((result, _)) => {
                info!("Request {key} signed and submitted as {}", result.tx_id);
                self.notify(Notification::info("Transaction sent"));
                sent.map(|_| result)
            }
            Err(e) => {
                error!("Request {key} failed. {e}");
                self.notify(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn sign_pending<F, Fut>(
        &self,
        request: &PendingRequest,
        sign: F,
    ) -> Result<(SignResult, Value), CoordinatorError>
    where
        F: FnOnce(UnsignedTransaction, Address) -> Fut,
        Fut: Future<Output = Result<Option<SignResult>, DelegateError>>,
    {
        let signer = &request.intent.from_address().hash;
        let addresses = self.inner.delegate.addresses().await;
        let address =
            resolve_signer(signer, &addresses).cloned().ok_or_else(|| CoordinatorError::SignerMissing(signer.clone()))?;
        let result = sign(request.unsigned_tx.clone(), address)
            .await?
            .ok_or_else(|| CoordinatorError::SendFailed("Nothing was signed or sent".to_string()))?;
        let value = serde_json::to_value(&result)?;
        Ok((result, value))
    }

    /// Answers the pending request with a user rejection.
    pub async fn reject_request(&self) -> Result<(), CoordinatorError> {
        let request = self.inner.requests.lock().await.flow.take_for_response()?;
        info!("User rejected request {}", request.key());
        self.finish_request(&request, RpcResponse::error(request.event.id, ErrorReason::user_rejected())).await
    }

    /// The request surface was closed without a decision. A pending request is answered as if the user rejected it.
    ///
    /// Returns `false` if there was nothing left to answer.
    pub async fn dismiss_request(&self) -> Result<bool, CoordinatorError> {
        let pending = self.inner.requests.lock().await.flow.pending().map(PendingRequest::key);
        match pending {
            Some(key) => {
                warn!("Request {key} was abandoned without a decision. Rejecting it");
                self.reject_request().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn pending_request(&self) -> Option<PendingRequest> {
        self.inner.requests.lock().await.flow.pending().cloned()
    }

    pub async fn queued_requests(&self) -> usize {
        self.inner.requests.lock().await.deferred_len()
    }

    /// Feeds requests the relay client still holds unanswered back through the request flow. Requests already in
    /// flight or queued are skipped.
    pub async fn resume_pending_requests(&self) -> Result<usize, CoordinatorError> {
        let client = self.ensure_client().await?;
        let requests = client.pending_requests().await?;
        let count = requests.len();
        for request in requests {
            debug!("Resuming unanswered request {}", request.key());
            self.on_session_request(request).await;
        }
        Ok(count)
    }

    //------------------------------------------   Peer-side cancellation   --------------------------------------------

    /// The session on `topic` was deleted or expired. Anything waiting to be answered on it is dropped.
    ///
    /// A request that is still being prepared is dropped as well. It is neither shown nor answered once its
    /// preparation completes.
    pub(crate) async fn on_session_gone(&self, topic: &str) {
        let discarded = self.inner.requests.lock().await.discard_topic(topic);
        if let Some(request) = discarded.pending {
            info!("Discarding request {} since its session has ended", request.key());
            self.inner.delegate.close_request(&request.key());
            self.notify(Notification::info("The dApp ended the session. The request was discarded"));
        }
        if let Some(key) = discarded.preparing {
            info!("Request {key} will not be shown since its session has ended");
        }
        for event in discarded.queued {
            debug!("Dropping queued request {}", event.key());
        }
        self.dispatch_next().await;
        self.refresh_after_event().await;
    }

    //------------------------------------------   Responses   ---------------------------------------------------------

    async fn send_response(&self, topic: &str, response: RpcResponse) -> Result<(), CoordinatorError> {
        let id = response.id;
        let client = self.ensure_client().await.inspect_err(|e| {
            error!("No relay client to answer request {topic}#{id}. {e}");
        })?;
        let is_error = response.is_error();
        client.respond(topic, response).await.inspect_err(|e| {
            error!("Could not answer request {topic}#{id}. {e}");
        })?;
        if is_error {
            info!("Answered request {topic}#{id} with an error");
        } else {
            info!("Answered request {topic}#{id}");
        }
        Ok(())
    }

    /// Returns the flow to idle and answers a request that never reached the user. A request that has left the flow
    /// in the meantime (its session ended) is not answered.
    async fn finish_unsurfaced(&self, event: &SessionRequestEvent, response: RpcResponse) {
        let finished = self.inner.requests.lock().await.flow.finish(&event.key());
        match finished {
            Ok(()) => {
                let _ = self.send_response(&event.topic, response).await;
            }
            Err(e) => debug!("Not answering request {}. {e}", event.key()),
        }
    }

    /// Answers the request being responded to, closes it on the surface and moves on to the next queued request.
    async fn finish_request(&self, request: &PendingRequest, response: RpcResponse) -> Result<(), CoordinatorError> {
        let key = request.key();
        let sent = self.send_response(&request.event.topic, response).await;
        if let Err(e) = self.inner.requests.lock().await.flow.finish(&key) {
            warn!("{e}");
        }
        self.inner.delegate.close_request(&key);
        self.dispatch_next().await;
        sent
    }
}
