use crate::controller::{Controller, Outcome, RuleContext};
use crate::domain::display::Slot;
use crate::domain::error::InputError;
use crate::session::{Event, Session, SessionView};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tokio::sync::Mutex;

/// Slots re-evaluated after the Profile rule re-arms the counters.
const REARMED_SLOTS: [Slot; 3] = [Slot::Price, Slot::Indicators, Slot::Forecast];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotStatus {
    /// The slot now shows the rule's fragment.
    Applied,
    /// The rule declined to update; the slot is untouched.
    NoUpdate,
    /// A newer request for the slot was issued meanwhile; the result was discarded.
    Stale,
    /// Malformed input aborted the rule.
    Rejected { error: String },
    /// A collaborator call failed.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub slot: Slot,
    pub generation: u64,
    #[serde(flatten)]
    pub status: SlotStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub session: SessionView,
    pub updates: Vec<SlotUpdate>,
}

impl DispatchReport {
    pub fn status(&self, slot: Slot) -> Option<&SlotStatus> {
        self.updates
            .iter()
            .rev()
            .find(|u| u.slot == slot)
            .map(|u| &u.status)
    }
}

struct Job {
    slot: Slot,
    generation: u64,
    ctx: RuleContext,
}

impl Controller {
    /// First render of a new session: every rule runs with ARMED counters.
    pub async fn initialize(&self, session: &Mutex<Session>) -> DispatchReport {
        let jobs = {
            let mut s = session.lock().await;
            issue_jobs(&mut s, Slot::ALL)
        };
        self.run(session, jobs).await
    }

    /// Applies an event and evaluates every rule it triggers.
    ///
    /// The session lock is released while rules talk to collaborators, so
    /// overlapping dispatches for one session can interleave; each result is
    /// applied only if its generation is still the latest for its slot.
    pub async fn dispatch(&self, session: &Mutex<Session>, event: Event) -> DispatchReport {
        let jobs = {
            let mut s = session.lock().await;

            let mut triggered = BTreeSet::new();
            if event.inputs.date_range_differs(&s.inputs) {
                triggered.insert(Slot::Price);
                triggered.insert(Slot::Indicators);
            }
            s.inputs = event.inputs;
            if let Some(action) = event.action {
                let clicks = s.counters.click(action);
                tracing::debug!(session_id = %s.id, ?action, clicks, "action fired");
                triggered.insert(Slot::for_action(action));
            }

            issue_jobs(&mut s, triggered)
        };
        self.run(session, jobs).await
    }

    async fn run(&self, session: &Mutex<Session>, jobs: Vec<Job>) -> DispatchReport {
        let mut queue: VecDeque<Job> = jobs.into();
        let mut updates = Vec::with_capacity(queue.len());

        while let Some(job) = queue.pop_front() {
            let slot = job.slot;
            let generation = job.generation;

            // Superseded before it started: skip the upstream calls entirely.
            if !session.lock().await.generations.is_current(slot, generation) {
                tracing::debug!(?slot, generation, "skipping superseded job");
                updates.push(stale(slot, generation));
                continue;
            }

            let result = self.evaluate(slot, &job.ctx).await;

            let mut s = session.lock().await;
            if !s.generations.is_current(slot, generation) {
                tracing::debug!(session_id = %s.id, ?slot, generation, latest = s.generations.latest(slot), "discarding stale result");
                updates.push(stale(slot, generation));
                continue;
            }

            let status = match result {
                Ok(output) => match output.outcome {
                    Outcome::Update(fragment) => {
                        s.display.replace(slot, fragment);
                        if output.rearm {
                            s.counters.rearm();
                            // Supersedes any in-flight chart requests for the previous ticker.
                            queue.extend(issue_jobs(&mut s, REARMED_SLOTS));
                        }
                        SlotStatus::Applied
                    }
                    Outcome::NoUpdate => SlotStatus::NoUpdate,
                },
                Err(err) => {
                    if let Some(input) = err.downcast_ref::<InputError>() {
                        tracing::info!(session_id = %s.id, ?slot, error = %input, "rule rejected input");
                        SlotStatus::Rejected {
                            error: input.to_string(),
                        }
                    } else {
                        let error = format!("{err:#}");
                        tracing::error!(session_id = %s.id, ?slot, %error, "rule failed");
                        if let Some(hook) = &self.on_failure {
                            hook(slot, &err);
                        }
                        SlotStatus::Failed { error }
                    }
                }
            };

            updates.push(SlotUpdate {
                slot,
                generation,
                status,
            });
        }

        let session = session.lock().await.view();
        DispatchReport { session, updates }
    }
}

fn stale(slot: Slot, generation: u64) -> SlotUpdate {
    SlotUpdate {
        slot,
        generation,
        status: SlotStatus::Stale,
    }
}

fn issue_jobs(session: &mut Session, slots: impl IntoIterator<Item = Slot>) -> Vec<Job> {
    let today = Utc::now().date_naive();
    slots
        .into_iter()
        .map(|slot| Job {
            slot,
            generation: session.generations.issue(slot),
            ctx: RuleContext {
                inputs: session.inputs.clone(),
                counters: session.counters,
                today,
            },
        })
        .collect()
}
