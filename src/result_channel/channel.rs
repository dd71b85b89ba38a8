use crate::config::{Config, SupersedePolicy};
use crate::error::PipelineError;
use crate::library::logger::interface::Logger;
use crate::media::media_buffer::MediaBuffer;
use crate::result_channel::core::{init, transition, Effect, Event, State};
use crate::transfer::client::TransferClient;
use crate::transfer::outcome::{Failure, TransferOutcome};
use crate::transfer::request::{ModelSelector, RequestId, TransferRequest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Single-slot holder between submissions and whoever renders the result.
///
/// Transfers are spawned on the ambient Tokio runtime, so `submit` must be
/// called from inside one.
#[derive(Clone)]
pub struct ResultChannel {
    inner: Arc<Inner>,
}

struct Inner {
    policy: SupersedePolicy,
    endpoint: String,
    client: TransferClient,
    logger: Arc<dyn Logger + Send + Sync>,
    state: watch::Sender<State>,
    in_flight: Mutex<HashMap<RequestId, CancellationToken>>,
    next_id: AtomicU64,
}

impl ResultChannel {
    pub fn new(config: &Config, client: TransferClient, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        let (state, _) = watch::channel(init().0);
        Self {
            inner: Arc::new(Inner {
                policy: config.supersede_policy,
                endpoint: config.endpoint.clone(),
                client,
                logger: logger.with_namespace("result_channel"),
                state,
                in_flight: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn current(&self) -> State {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.inner.state.subscribe()
    }

    /// Starts a transfer for `buffer`. Under `RejectWhileBusy` a pending
    /// request makes this fail with `Busy`.
    pub fn submit(&self, buffer: MediaBuffer, model: ModelSelector) -> Result<RequestId, PipelineError> {
        let request = TransferRequest::new(self.next_request_id(), buffer, model);
        let request_id = request.id;
        let effects = self.dispatch(Event::Submit(request));
        self.run_effects(effects).map(|()| request_id)
    }

    /// Settles a failure that happened before any transfer was started.
    pub fn reject(&self, failure: Failure) -> Result<RequestId, PipelineError> {
        let request_id = self.next_request_id();
        let effects = self.dispatch(Event::Reject {
            request_id,
            failure,
        });
        self.run_effects(effects).map(|()| request_id)
    }

    /// Delivers the outcome of `request_id`. Returns false when the request
    /// is no longer the pending one and the outcome was dropped.
    pub fn publish(&self, request_id: RequestId, outcome: TransferOutcome) -> bool {
        self.release(request_id);
        let effects = self.dispatch(Event::Settle {
            request_id,
            outcome,
        });
        let discarded = effects.contains(&Effect::DiscardLate(request_id));
        let _ = self.run_effects(effects);
        if !discarded {
            let _ = self
                .inner
                .logger
                .info(&format!("Published outcome for {}", request_id));
        }
        !discarded
    }

    pub fn reset(&self) {
        let effects = self.dispatch(Event::Reset);
        let _ = self.run_effects(effects);
    }

    /// Returns the current settled state, or waits for the next one when
    /// nothing is settled yet. Any request counts.
    pub async fn settled(&self) -> Option<(RequestId, TransferOutcome)> {
        let mut receiver = self.subscribe();
        let state = receiver
            .wait_for(|state| matches!(state, State::Settled { .. }))
            .await
            .ok()?;
        match &*state {
            State::Settled {
                request_id,
                outcome,
            } => Some((*request_id, outcome.clone())),
            _ => None,
        }
    }

    /// Waits until `request_id` settles. Returns `None` when it was
    /// superseded or reset instead.
    pub async fn outcome_of(&self, request_id: RequestId) -> Option<TransferOutcome> {
        let mut receiver = self.subscribe();
        let state = receiver
            .wait_for(|state| match state {
                State::Pending { request } => request.id != request_id,
                State::Settled { .. } | State::Idle => true,
            })
            .await
            .ok()?;
        match &*state {
            State::Settled {
                request_id: settled_id,
                outcome,
            } if *settled_id == request_id => Some(outcome.clone()),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.inner
            .in_flight
            .lock()
            .map(|in_flight| in_flight.len())
            .unwrap_or(0)
    }

    fn next_request_id(&self) -> RequestId {
        RequestId(self.inner.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn dispatch(&self, event: Event) -> Vec<Effect> {
        let mut effects = vec![];
        let logger = &self.inner.logger;
        let policy = self.inner.policy;

        self.inner.state.send_if_modified(|state| {
            let old = std::mem::take(state);
            let old_display = old.to_display_string();
            let (new, new_effects) = transition(policy, old, event);

            let _ = logger.info(&format!(
                "{} -> {} effects: [{}]",
                old_display,
                new.to_display_string(),
                new_effects
                    .iter()
                    .map(Effect::to_display_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));

            self.track_in_flight(&new_effects);

            let modified = !new_effects
                .iter()
                .any(|effect| matches!(effect, Effect::DiscardLate(_) | Effect::RejectBusy(_)));
            *state = new;
            effects = new_effects;
            modified
        });

        effects
    }

    fn run_effects(&self, effects: Vec<Effect>) -> Result<(), PipelineError> {
        let mut result = Ok(());
        for effect in effects {
            if let Err(e) = self.run_effect(effect) {
                result = Err(e);
            }
        }
        result
    }

    fn run_effect(&self, effect: Effect) -> Result<(), PipelineError> {
        match effect {
            Effect::StartTransfer(request) => {
                self.start_transfer(request);
                Ok(())
            }
            Effect::CancelTransfer(request_id) => {
                let _ = self
                    .inner
                    .logger
                    .info(&format!("Cancelled transfer {}", request_id));
                Ok(())
            }
            Effect::RejectBusy(request_id) => {
                let _ = self
                    .inner
                    .logger
                    .warn(&format!("Rejected {}: a submission is already pending", request_id));
                Err(PipelineError::Busy)
            }
            Effect::DiscardLate(request_id) => {
                let _ = self
                    .inner
                    .logger
                    .info(&format!("Discarding late outcome for {}", request_id));
                Ok(())
            }
        }
    }

    /// Registers and cancels tokens while the state lock is held, so a
    /// concurrent preemption always finds the token it has to cancel.
    fn track_in_flight(&self, effects: &[Effect]) {
        let Ok(mut in_flight) = self.inner.in_flight.lock() else {
            return;
        };
        for effect in effects {
            match effect {
                Effect::StartTransfer(request) => {
                    in_flight.insert(request.id, CancellationToken::new());
                }
                Effect::CancelTransfer(request_id) => {
                    if let Some(token) = in_flight.remove(request_id) {
                        token.cancel();
                    }
                }
                Effect::RejectBusy(_) | Effect::DiscardLate(_) => {}
            }
        }
    }

    fn start_transfer(&self, request: TransferRequest) {
        let token = self
            .inner
            .in_flight
            .lock()
            .ok()
            .and_then(|in_flight| in_flight.get(&request.id).cloned());

        // Already superseded before it could be spawned.
        let Some(token) = token else {
            let _ = self
                .inner
                .logger
                .info(&format!("Skipping transfer {}: no longer pending", request.id));
            return;
        };

        let channel = self.clone();
        tokio::spawn(async move {
            let request_id = request.id;
            let outcome = channel
                .inner
                .client
                .submit(request, &channel.inner.endpoint, &token)
                .await;
            channel.publish(request_id, outcome);
        });
    }

    fn release(&self, request_id: RequestId) -> Option<CancellationToken> {
        self.inner
            .in_flight
            .lock()
            .ok()
            .and_then(|mut in_flight| in_flight.remove(&request_id))
    }
}
