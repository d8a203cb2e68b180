use super::SessionCoordinator;
use crate::adapter::{RelayClient, RelayConnector};
use crate::delegates::{Notification, WalletDelegate};
use crate::errors::CoordinatorError;
use libwalletconnect::state_machine::FlowError;
use libwalletconnect::{validate, Address, CompatibleProposal, ErrorReason, ProposalParams, SessionProposal};
use log::*;

impl<C: RelayConnector, D: WalletDelegate> SessionCoordinator<C, D> {
    /// Takes in a `session_proposal`, either from the event stream or recovered from the pairing history.
    pub(crate) async fn on_session_proposal(&self, params: ProposalParams) {
        let proposal = match SessionProposal::from_params(&params) {
            Ok(p) => p,
            Err(e) => {
                warn!("Proposal {} lists unparseable chains. {e}", params.id);
                self.send_proposal_rejection(params.id, ErrorReason::unsupported_chains()).await;
                return;
            }
        };
        let received = {
            let mut flow = self.inner.proposal.lock().await;
            if flow.current().is_some_and(|p| p.id == proposal.id) {
                warn!("Proposal {} is already in flight. Ignoring the repeat", proposal.id);
                return;
            }
            flow.receive(proposal.clone())
        };
        match received {
            Ok(()) => {
                info!("Session proposal {} from {}", proposal.id, proposal.proposer.name);
                self.inner.delegate.on_proposal(&proposal);
            }
            Err(e) => {
                warn!("Rejecting proposal {} from {}. {e}", proposal.id, proposal.proposer.name);
                self.send_proposal_rejection(proposal.id, ErrorReason::user_rejected()).await;
            }
        }
    }

    /// Approves the pending proposal using `address` as the session account.
    ///
    /// If the proposal is not compatible with `address` and the wallet's network, the user is told why and the
    /// proposal stays pending so that another address can be tried. Once the approval has been sent the proposal is
    /// cleared whatever the outcome. Returns the new session topic.
    pub async fn approve_proposal(&self, address: &Address) -> Result<String, CoordinatorError> {
        let validated = {
            let mut flow = self.inner.proposal.lock().await;
            let proposal = flow.pending().cloned().ok_or(FlowError::NothingPending("proposal"))?;
            let validated = validate(&proposal, &self.inner.config.network_id, address);
            if validated.is_ok() {
                flow.begin_approval()?;
            }
            validated.map(|compatible| (proposal.clone(), compatible)).map_err(|e| (proposal.id, e))
        };
        let (proposal, compatible) = match validated {
            Ok(approval) => approval,
            Err((id, e)) => {
                info!("Proposal {id} cannot be approved with {}. {e}", address.hash);
                self.notify(Notification::error(format!("Cannot approve: {}", e.reason())));
                return Err(e.into());
            }
        };
        let result = {
            let _busy = self.busy("Approving session");
            self.send_approval(&proposal, compatible).await
        };
        self.inner.proposal.lock().await.finish();
        self.inner.delegate.close_proposal(proposal.id);
        match &result {
            Ok(topic) => {
                info!("Session {topic} established with {}", proposal.proposer.name);
                self.notify(Notification::info(format!("Connected to {}", proposal.proposer.name)));
            }
            Err(e) => {
                error!("Approval of proposal {} failed. {e}", proposal.id);
                self.notify(Notification::error(format!("Could not approve the session. {e}")));
            }
        }
        result
    }

    async fn send_approval(
        &self,
        proposal: &SessionProposal,
        compatible: CompatibleProposal,
    ) -> Result<String, CoordinatorError> {
        let client = self.ensure_client().await?;
        debug!("Approving proposal {} for account {}", proposal.id, compatible.account());
        let approval =
            client.approve_proposal(proposal.id, &proposal.relay_protocol, compatible.namespaces()).await?;
        approval.acknowledged.await?;
        if let Err(e) = self.refresh_sessions_from(&client).await {
            warn!("Session {} is acknowledged but the session list could not be refreshed. {e}", approval.topic);
        }
        Ok(approval.topic)
    }

    /// Rejects the pending proposal on the user's behalf.
    pub async fn reject_proposal(&self) -> Result<(), CoordinatorError> {
        let proposal = self.inner.proposal.lock().await.begin_rejection()?;
        let result = match self.ensure_client().await {
            Ok(client) => client.reject_proposal(proposal.id, ErrorReason::user_rejected()).await.map_err(Into::into),
            Err(e) => Err(CoordinatorError::from(e)),
        };
        self.inner.proposal.lock().await.finish();
        self.inner.delegate.close_proposal(proposal.id);
        match &result {
            Ok(()) => info!("Rejected proposal {}", proposal.id),
            Err(e) => {
                error!("Could not send the rejection of proposal {}. {e}", proposal.id);
                self.notify(Notification::error(format!("Could not reject the session. {e}")));
            }
        }
        result
    }

    /// The proposal surface was closed without a decision. A pending proposal is rejected.
    ///
    /// Returns `false` if there was nothing left to answer.
    pub async fn dismiss_proposal(&self) -> Result<bool, CoordinatorError> {
        let pending = self.inner.proposal.lock().await.pending().map(|p| p.id);
        match pending {
            Some(id) => {
                warn!("Proposal {id} was dismissed without a decision. Rejecting it");
                self.reject_proposal().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn pending_proposal(&self) -> Option<SessionProposal> {
        self.inner.proposal.lock().await.pending().cloned()
    }

    pub(crate) async fn on_proposal_expired(&self, id: u64) {
        let expired = self.inner.proposal.lock().await.expire(id);
        match expired {
            Some(proposal) => {
                info!("Proposal {id} expired before it was answered");
                self.inner.delegate.close_proposal(id);
                self.notify(Notification::info(format!("The request from {} expired", proposal.proposer.name)));
            }
            None => debug!("Proposal {id} expired, but it is not pending"),
        }
    }

    async fn send_proposal_rejection(&self, id: u64, reason: ErrorReason) {
        let client = match self.ensure_client().await {
            Ok(client) => client,
            Err(e) => {
                error!("Cannot reject proposal {id}. {e}");
                return;
            }
        };
        if let Err(e) = client.reject_proposal(id, reason).await {
            error!("Could not reject proposal {id}. {e}");
        }
    }
}
