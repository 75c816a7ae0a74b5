//! Spawn coordinator

use crate::factory::{ActorFactory, PursuitDriver};
use crate::retry::RetryPoints;
use glam::Vec3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use wraith_core::tick::{delay, secs};
use wraith_core::{ActorId, CancellationSlot, LifecycleError, Pose, Result, TemplateId};
use wraith_fade::{ActorFadeController, FadeConfig};

/// Whether the current instance acts on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnMode {
    /// Scripted set-dressing: no pursuit, no automatic despawn
    Story,
    /// Autonomous: pursuit and automatic despawn enabled
    Random,
}

impl Default for SpawnMode {
    fn default() -> Self {
        Self::Random
    }
}

/// Narrative/event data attached to a spawned actor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnContext {
    /// Event or encounter this actor belongs to
    pub event: String,
    /// Free-form correlation fields
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl SpawnContext {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Coordinator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Template to instantiate; spawning is refused without one
    pub template: Option<TemplateId>,
    /// Seconds after spawning before a Random-mode actor fades out by itself
    pub despawn_after: Option<f32>,
    /// Mode new coordinators start in
    pub mode: SpawnMode,
    /// Level-authored start pose used by `load`
    pub start_pose: Option<Pose>,
    /// Fade settings for spawned actors
    pub fade: FadeConfig,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            template: None,
            despawn_after: None,
            mode: SpawnMode::Random,
            start_pose: None,
            fade: FadeConfig::default(),
        }
    }
}

impl SpawnConfig {
    pub fn with_template(mut self, template: impl Into<TemplateId>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_despawn_after(mut self, seconds: f32) -> Self {
        self.despawn_after = Some(seconds);
        self
    }

    pub fn with_fade(mut self, fade: FadeConfig) -> Self {
        self.fade = fade;
        self
    }

    pub fn despawn_duration(&self) -> Option<Duration> {
        self.despawn_after.map(secs)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(after) = self.despawn_after {
            if !after.is_finite() || after < 0.0 {
                return Err(LifecycleError::InvalidConfig(format!(
                    "despawn_after must be non-negative, got {}",
                    after
                )));
            }
        }
        self.fade.validate()
    }
}

/// Handle to a live actor
#[derive(Clone)]
pub struct ActorInstance {
    id: ActorId,
    pose: Pose,
    context: Option<SpawnContext>,
    fade: ActorFadeController,
    pursuit: Arc<dyn PursuitDriver>,
}

impl ActorInstance {
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Pose the actor was spawned at
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn context(&self) -> Option<&SpawnContext> {
        self.context.as_ref()
    }

    pub fn fade(&self) -> &ActorFadeController {
        &self.fade
    }

    pub fn pursuit(&self) -> &Arc<dyn PursuitDriver> {
        &self.pursuit
    }

    pub fn is_busy(&self) -> bool {
        self.fade.is_busy()
    }
}

impl std::fmt::Debug for ActorInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorInstance")
            .field("id", &self.id)
            .field("pose", &self.pose)
            .field("context", &self.context)
            .field("fade", &self.fade)
            .finish()
    }
}

struct CoordinatorState {
    current: Option<ActorInstance>,
    mode: SpawnMode,
    ai_enabled: bool,
    points: RetryPoints,
    despawn: CancellationSlot,
}

/// Owns the single live actor slot
pub struct SpawnCoordinator {
    factory: Arc<dyn ActorFactory>,
    config: SpawnConfig,
    state: Arc<Mutex<CoordinatorState>>,
}

impl SpawnCoordinator {
    pub fn new(factory: Arc<dyn ActorFactory>, config: SpawnConfig) -> Self {
        let points = RetryPoints {
            start: config.start_pose,
            ..RetryPoints::default()
        };
        Self {
            factory,
            state: Arc::new(Mutex::new(CoordinatorState {
                current: None,
                mode: config.mode,
                ai_enabled: false,
                points,
                despawn: CancellationSlot::new(),
            })),
            config,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// The live instance, if any
    pub fn current(&self) -> Option<ActorInstance> {
        self.state.lock().current.clone()
    }

    pub fn mode(&self) -> SpawnMode {
        self.state.lock().mode
    }

    pub fn is_ai_enabled(&self) -> bool {
        self.state.lock().ai_enabled
    }

    /// Whether the current instance is allowed to pursue right now
    pub fn is_pursuing(&self) -> bool {
        let state = self.state.lock();
        state.current.is_some() && Self::pursuit_allowed(&state)
    }

    /// Spawn a new instance, replacing the current one
    ///
    /// Logs and returns `None` if no template is configured (the current
    /// instance is left alone) or the factory refuses.
    pub fn spawn_at(&self, pose: Pose, context: Option<SpawnContext>) -> Option<ActorInstance> {
        match self.try_spawn_at(pose, context) {
            Ok(instance) => Some(instance),
            Err(err) => {
                log::error!("Spawn aborted: {}", err);
                None
            }
        }
    }

    /// Spawn a new instance, replacing the current one
    ///
    /// The previous instance is destroyed and the new one installed under one
    /// lock, so no caller ever observes two live instances. New instances
    /// start hidden with the AI toggle off.
    pub fn try_spawn_at(&self, pose: Pose, context: Option<SpawnContext>) -> Result<ActorInstance> {
        let template = self
            .config
            .template
            .as_ref()
            .ok_or(LifecycleError::MissingTemplate)?;

        let mut state = self.state.lock();
        if let Some(previous) = state.current.take() {
            self.destroy_instance(&mut state, previous);
        }

        let spawned = self.factory.instantiate(template, pose)?;
        let fade = ActorFadeController::new(spawned.id, spawned.surface, self.config.fade.clone());
        let instance = ActorInstance {
            id: spawned.id,
            pose,
            context,
            fade,
            pursuit: spawned.pursuit,
        };

        state.ai_enabled = false;
        state.current = Some(instance.clone());
        Self::push_pursuit(&state);
        if state.mode == SpawnMode::Random {
            self.arm_despawn(&mut state);
        }

        log::info!(
            "Spawned {} from '{}' at {}",
            instance.id,
            template,
            pose.position
        );
        Ok(instance)
    }

    /// Destroy the current instance, if any
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        if let Some(previous) = state.current.take() {
            self.destroy_instance(&mut state, previous);
        }
    }

    /// Switch between scripted and autonomous behaviour
    pub fn set_mode(&self, mode: SpawnMode) {
        let mut state = self.state.lock();
        if state.mode == mode {
            return;
        }
        state.mode = mode;
        log::debug!("Spawn mode set to {:?}", mode);
        Self::push_pursuit(&state);
        match mode {
            SpawnMode::Story => state.despawn.revoke(),
            SpawnMode::Random => self.arm_despawn(&mut state),
        }
    }

    /// Let the current instance move/pursue (subject to the mode)
    pub fn enable_ai(&self) {
        let mut state = self.state.lock();
        state.ai_enabled = true;
        Self::push_pursuit(&state);
    }

    /// Stop the current instance from moving
    pub fn disable_ai(&self) {
        let mut state = self.state.lock();
        state.ai_enabled = false;
        Self::push_pursuit(&state);
    }

    /// Point the current instance's pursuit at `target`
    pub fn set_chase_target(&self, target: Option<Vec3>) {
        let state = self.state.lock();
        if let Some(instance) = &state.current {
            if let Err(err) = instance.pursuit.set_target(target) {
                log::debug!("{}: could not set chase target: {}", instance.id, err);
            }
        }
    }

    /// Override where the next `load` spawns the actor
    pub fn set_retry_point(&self, pose: Pose) {
        self.state.lock().points.retry = Some(pose);
    }

    pub fn clear_retry_point(&self) {
        self.state.lock().points.retry = None;
    }

    pub fn set_start_pose(&self, pose: Pose) {
        self.state.lock().points.start = Some(pose);
    }

    /// Remember the last saved player-adjacent pose
    pub fn record_player_pose(&self, pose: Pose) {
        self.state.lock().points.last_player = Some(pose);
    }

    /// Pose the next `load` would use
    pub fn resolve_load_pose(&self) -> Option<Pose> {
        self.state.lock().points.resolve()
    }

    /// Spawn at the resolved load pose, consuming the retry override
    pub fn load(&self, context: Option<SpawnContext>) -> Option<ActorInstance> {
        let pose = self.state.lock().points.take_for_load();
        match pose {
            Some(pose) => self.spawn_at(pose, context),
            None => {
                log::warn!("Load requested with no retry point, start pose or player pose");
                None
            }
        }
    }

    fn destroy_instance(&self, state: &mut CoordinatorState, instance: ActorInstance) {
        state.despawn.revoke();
        if instance.is_busy() {
            log::debug!("{}: destroyed while mid-transition", instance.id);
        }
        self.factory.destroy(instance.id);
        log::debug!("Destroyed {}", instance.id);
    }

    fn pursuit_allowed(state: &CoordinatorState) -> bool {
        state.ai_enabled && state.mode == SpawnMode::Random
    }

    fn push_pursuit(state: &CoordinatorState) {
        if let Some(instance) = &state.current {
            if let Err(err) = instance.pursuit.set_active(Self::pursuit_allowed(state)) {
                log::debug!("{}: could not toggle pursuit: {}", instance.id, err);
            }
        }
    }

    fn arm_despawn(&self, state: &mut CoordinatorState) {
        let Some(after) = self.config.despawn_duration() else {
            return;
        };
        let Some(instance) = state.current.clone() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("{}: no async runtime, despawn timer not armed", instance.id);
            return;
        };

        let ticket = state.despawn.supersede();
        let shared = Arc::downgrade(&self.state);
        runtime.spawn(async move {
            if delay(ticket.token(), after).await.is_err() {
                return;
            }
            let Some(shared) = shared.upgrade() else {
                return;
            };
            let mut state = shared.lock();
            let owned = state.despawn.is_current(&ticket)
                && state.current.as_ref().map(|current| current.id) == Some(instance.id);
            if !owned {
                return;
            }
            log::info!("{}: despawn timer elapsed", instance.id);
            state.ai_enabled = false;
            Self::push_pursuit(&state);
            instance.fade.request_disappear(false);
        });
    }
}

impl std::fmt::Debug for SpawnCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SpawnCoordinator")
            .field("current", &state.current.as_ref().map(|i| i.id))
            .field("mode", &state.mode)
            .field("ai_enabled", &state.ai_enabled)
            .finish()
    }
}
