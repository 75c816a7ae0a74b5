//! Encounter scheduler
//!
//! One `start_loop` spawns one task that runs sessions back to back until its
//! scope is cancelled. The scope is cancelled by `stop_loop` or by the mode
//! signal leaving active play; both go through [`SchedulerInner::halt`], which
//! runs synchronously on the caller's thread: the current actor is hidden
//! through the immediate path, the state returns to `Idle` and the mode
//! subscription is dropped before the caller regains control.

use crate::config::EncounterConfig;
use crate::lookup::SpatialLookup;
use crate::session::{EncounterState, SessionLog, SessionTransition};
use glam::Vec3;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use wraith_core::tick::{delay, next_frame};
use wraith_core::{CancellationSlot, LifecycleError, Pose, Result, ScopeTicket};
use wraith_gamestate::{ModeSignal, ModeSubscription};
use wraith_spawn::{ActorInstance, SpawnContext, SpawnCoordinator};

struct SchedulerState {
    slot: CancellationSlot,
    subscription: Option<ModeSubscription>,
    session: SessionLog,
    rng: StdRng,
    cycles: u64,
}

struct SchedulerInner {
    spawner: Arc<SpawnCoordinator>,
    lookup: Arc<dyn SpatialLookup>,
    mode: ModeSignal,
    config: EncounterConfig,
    state: Mutex<SchedulerState>,
}

/// Drives a spawn coordinator through timed encounter sessions
#[derive(Clone)]
pub struct EncounterScheduler {
    inner: Arc<SchedulerInner>,
}

impl EncounterScheduler {
    pub fn new(
        spawner: Arc<SpawnCoordinator>,
        lookup: Arc<dyn SpatialLookup>,
        mode: ModeSignal,
        config: EncounterConfig,
    ) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::error!("Encounter config rejected ({}), using defaults", err);
                EncounterConfig {
                    seed: config.seed,
                    ..EncounterConfig::default()
                }
            }
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(SchedulerInner {
                spawner,
                lookup,
                mode,
                config,
                state: Mutex::new(SchedulerState {
                    slot: CancellationSlot::new(),
                    subscription: None,
                    session: SessionLog::new(),
                    rng,
                    cycles: 0,
                }),
            }),
        }
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.inner.config
    }

    pub fn spawner(&self) -> &Arc<SpawnCoordinator> {
        &self.inner.spawner
    }

    /// Start the loop
    ///
    /// Returns false if a loop is already running, the mode is not active
    /// play, or there is no async runtime to run on.
    pub fn start_loop(&self) -> bool {
        let inner = &self.inner;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::error!("Encounter loop needs a tokio runtime");
            return false;
        };
        if !inner.mode.is_active_play() {
            log::warn!("Encounter loop not started: mode is {}", inner.mode.current());
            return false;
        }

        let mut state = inner.state.lock();
        if state.subscription.is_some() {
            return false;
        }
        let ticket = state.slot.supersede();
        let generation = ticket.generation();
        let weak = Arc::downgrade(inner);
        state.subscription = Some(inner.mode.subscribe(move |change| {
            if change.to.is_active_play() {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.halt(generation, "left active play");
            }
        }));
        drop(state);

        log::info!("Encounter loop started");
        runtime.spawn(inner.clone().run(ticket));

        // The mode may have flipped before the subscription was in place
        if !inner.mode.is_active_play() {
            inner.halt(generation, "left active play");
        }
        true
    }

    /// Stop the loop, hide the current actor and drop the mode subscription
    pub fn stop_loop(&self) {
        let generation = self.inner.state.lock().slot.generation();
        self.inner.halt(generation, "stopped");
    }

    /// Whether a loop is running
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().subscription.is_some()
    }

    /// Current session state
    pub fn state(&self) -> EncounterState {
        self.inner.state.lock().session.state()
    }

    /// Every recorded state change, oldest first
    pub fn history(&self) -> Vec<SessionTransition> {
        self.inner.state.lock().session.transitions().to_vec()
    }

    /// Number of times `state` was entered
    pub fn entries(&self, state: EncounterState) -> usize {
        self.inner.state.lock().session.entries(state)
    }

    /// Sessions started so far
    pub fn cycles(&self) -> u64 {
        self.inner.state.lock().cycles
    }
}

impl SchedulerInner {
    async fn run(self: Arc<Self>, ticket: ScopeTicket) {
        let reason = loop {
            if let Err(err) = self.cycle(&ticket).await {
                break err;
            }
        };
        if !reason.is_cancelled() {
            log::warn!("Encounter loop ended: {}", reason);
        }
        self.halt(ticket.generation(), "loop exited");
    }

    async fn cycle(&self, ticket: &ScopeTicket) -> Result<()> {
        let token = ticket.token();
        let (spawn_wait, chase_time, cycle) = {
            let mut state = self.state.lock();
            let state = &mut *state;
            state.cycles += 1;
            (
                self.config.draw_spawn_wait(&mut state.rng),
                self.config.draw_chase_time(&mut state.rng),
                state.cycles,
            )
        };

        self.enter(ticket, EncounterState::WaitingForWindow)?;
        delay(token, spawn_wait).await?;

        self.enter(ticket, EncounterState::Spawning)?;
        if let Some(previous) = self.spawner.current() {
            previous.fade().wait_until_idle(token).await?;
        }
        let (instance, target) = match self.spawn_near_target(cycle) {
            Ok(spawned) => spawned,
            Err(err) => {
                log::warn!("Encounter cycle {} skipped: {}", cycle, err);
                self.enter(ticket, EncounterState::Idle)?;
                return next_frame(token, self.frame_interval()).await;
            }
        };
        if ticket.is_cancelled() {
            return Err(LifecycleError::Cancelled);
        }
        instance.fade().request_appear(instance.pose().position);
        self.spawner.enable_ai();
        self.spawner.set_chase_target(Some(target));

        self.enter(ticket, EncounterState::Chasing)?;
        delay(token, chase_time).await?;

        self.enter(ticket, EncounterState::Retreating)?;
        self.spawner.disable_ai();
        self.spawner.set_chase_target(None);
        let fade = instance.fade();
        fade.request_disappear(false);
        fade.wait_until_idle(token).await?;

        self.enter(ticket, EncounterState::Idle)
    }

    fn spawn_near_target(&self, cycle: u64) -> Result<(ActorInstance, Vec3)> {
        let role = &self.config.target_role;
        let target = self
            .lookup
            .find_nearest(role, self.config.search_origin)
            .ok_or_else(|| LifecycleError::NoSpawnLocation { role: role.clone() })?;

        let pose = Pose::facing(target + self.config.spawn_offset, target);
        let context = SpawnContext::new("encounter").with_field("cycle", cycle.to_string());
        let instance = self.spawner.try_spawn_at(pose, Some(context))?;
        Ok((instance, target))
    }

    /// Record a state change, unless the loop has been halted
    fn enter(&self, ticket: &ScopeTicket, to: EncounterState) -> Result<()> {
        let mut state = self.state.lock();
        if ticket.is_cancelled() || !state.slot.is_current(ticket) {
            return Err(LifecycleError::Cancelled);
        }
        state.session.enter(to);
        Ok(())
    }

    fn halt(&self, generation: u64, reason: &str) {
        let mut state = self.state.lock();
        if state.slot.generation() != generation {
            return;
        }
        let Some(subscription) = state.subscription.take() else {
            return;
        };
        state.slot.cancel();
        state.session.enter(EncounterState::Idle);
        drop(state);
        drop(subscription);

        self.spawner.disable_ai();
        self.spawner.set_chase_target(None);
        if let Some(instance) = self.spawner.current() {
            instance.fade().request_disappear(true);
        }
        log::info!("Encounter loop halted: {}", reason);
    }

    fn frame_interval(&self) -> Duration {
        self.spawner.config().fade.frame_duration()
    }
}

impl std::fmt::Debug for EncounterScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("EncounterScheduler")
            .field("state", &state.session.state())
            .field("running", &state.subscription.is_some())
            .field("cycles", &state.cycles)
            .finish()
    }
}
