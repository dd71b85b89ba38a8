use crate::config::SupersedePolicy;
use crate::transfer::outcome::{Failure, TransferOutcome};
use crate::transfer::request::{RequestId, TransferRequest};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum State {
    #[default]
    Idle,
    Pending {
        request: TransferRequest,
    },
    Settled {
        request_id: RequestId,
        outcome: TransferOutcome,
    },
}

impl State {
    pub fn pending_id(&self) -> Option<RequestId> {
        match self {
            State::Pending { request } => Some(request.id),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, State::Pending { .. })
    }

    pub fn to_display_string(&self) -> String {
        match self {
            State::Idle => "Idle".to_string(),
            State::Pending { request } => format!("Pending({})", request.id),
            State::Settled {
                request_id,
                outcome,
            } => match outcome {
                TransferOutcome::Success {
                    predicted_class, ..
                } => format!("Settled({}, {})", request_id, predicted_class),
                TransferOutcome::Failure(failure) => {
                    format!("Settled({}, {})", request_id, failure.kind)
                }
            },
        }
    }
}

#[derive(Debug)]
pub enum Event {
    Submit(TransferRequest),
    Settle {
        request_id: RequestId,
        outcome: TransferOutcome,
    },
    /// A failure produced before any transfer (acquisition, validation).
    Reject {
        request_id: RequestId,
        failure: Failure,
    },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTransfer(TransferRequest),
    CancelTransfer(RequestId),
    RejectBusy(RequestId),
    DiscardLate(RequestId),
}

impl Effect {
    pub fn to_display_string(&self) -> String {
        match self {
            Effect::StartTransfer(request) => format!("StartTransfer({})", request.id),
            Effect::CancelTransfer(id) => format!("CancelTransfer({})", id),
            Effect::RejectBusy(id) => format!("RejectBusy({})", id),
            Effect::DiscardLate(id) => format!("DiscardLate({})", id),
        }
    }
}

pub fn init() -> (State, Vec<Effect>) {
    (State::Idle, vec![])
}

pub fn transition(policy: SupersedePolicy, state: State, event: Event) -> (State, Vec<Effect>) {
    match (state, event) {
        (State::Pending { request: pending }, Event::Submit(request)) => match policy {
            SupersedePolicy::LatestWins => (
                State::Pending {
                    request: request.clone(),
                },
                vec![
                    Effect::CancelTransfer(pending.id),
                    Effect::StartTransfer(request),
                ],
            ),
            SupersedePolicy::RejectWhileBusy => (
                State::Pending { request: pending },
                vec![Effect::RejectBusy(request.id)],
            ),
        },
        (_, Event::Submit(request)) => (
            State::Pending {
                request: request.clone(),
            },
            vec![Effect::StartTransfer(request)],
        ),

        (
            State::Pending { request },
            Event::Settle {
                request_id,
                outcome,
            },
        ) if request.id == request_id => (
            State::Settled {
                request_id,
                outcome,
            },
            vec![],
        ),
        (state, Event::Settle { request_id, .. }) => (state, vec![Effect::DiscardLate(request_id)]),

        (State::Pending { request: pending }, Event::Reject { request_id, failure }) => match policy {
            SupersedePolicy::LatestWins => (
                State::Settled {
                    request_id,
                    outcome: TransferOutcome::Failure(failure),
                },
                vec![Effect::CancelTransfer(pending.id)],
            ),
            SupersedePolicy::RejectWhileBusy => (
                State::Pending { request: pending },
                vec![Effect::RejectBusy(request_id)],
            ),
        },
        (_, Event::Reject { request_id, failure }) => (
            State::Settled {
                request_id,
                outcome: TransferOutcome::Failure(failure),
            },
            vec![],
        ),

        (State::Pending { request }, Event::Reset) => {
            (State::Idle, vec![Effect::CancelTransfer(request.id)])
        }
        (_, Event::Reset) => (State::Idle, vec![]),
    }
}
