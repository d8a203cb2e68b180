use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("A {flow} is already in progress ({current})")]
    Busy { flow: &'static str, current: String },
    #[error("There is no pending {0}")]
    NothingPending(&'static str),
    #[error("Cannot {action} while the {flow} flow is {stage}")]
    InvalidTransition { flow: &'static str, action: &'static str, stage: String },
    #[error("Request {0} is not the one in flight")]
    UnknownRequest(String),
}

impl FlowError {
    pub fn invalid(flow: &'static str, action: &'static str, stage: impl ToString) -> Self {
        FlowError::InvalidTransition { flow, action, stage: stage.to_string() }
    }
}
