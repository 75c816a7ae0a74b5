//! Actor fade controller
//!
//! Every request goes through the same steps while holding the controller's
//! lock: supersede the current scope, take a busy lease unit, apply the
//! synchronous part of the request, then spawn the interpolation. The lock is
//! never held across a suspension point, and each interpolation step re-checks
//! that its scope is still current before writing to the surface, so a
//! superseded sequence can never write after its successor has started.

use crate::state::{FadeConfig, FadeState};
use crate::surface::VisualSurface;
use glam::Vec3;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wraith_core::tick::{next_frame, wait_until, FrameClock};
use wraith_core::{
    ActorId, BusyGuard, BusyLease, CancellationSlot, LifecycleError, Result, ScopeTicket,
};

/// How a fade request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeOutcome {
    /// Reached its target
    Completed,
    /// A newer request took over the actor before this one finished
    Superseded,
    /// Cancelled with no successor; the terminal value was forced
    Cancelled,
    /// Never started (already hidden, or deferred by an action sequence)
    Ignored,
    /// The actor was destroyed underneath the request
    ActorGone,
    /// The surface rejected a write for another reason
    Failed,
}

/// Handle to a fade request
///
/// Dropping it detaches the sequence; it keeps running.
#[derive(Debug)]
pub struct FadeTask(TaskState);

#[derive(Debug)]
enum TaskState {
    Ready(FadeOutcome),
    Running(JoinHandle<FadeOutcome>),
}

impl FadeTask {
    fn ready(outcome: FadeOutcome) -> Self {
        Self(TaskState::Ready(outcome))
    }

    fn running(handle: JoinHandle<FadeOutcome>) -> Self {
        Self(TaskState::Running(handle))
    }

    /// Whether a sequence was spawned for this request
    pub fn is_started(&self) -> bool {
        matches!(self.0, TaskState::Running(_))
    }

    /// Whether the request has reached an outcome
    pub fn is_finished(&self) -> bool {
        match &self.0 {
            TaskState::Ready(_) => true,
            TaskState::Running(handle) => handle.is_finished(),
        }
    }

    /// Wait for the outcome
    pub async fn wait(self) -> FadeOutcome {
        match self.0 {
            TaskState::Ready(outcome) => outcome,
            TaskState::Running(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::error!("Fade sequence aborted: {}", err);
                    FadeOutcome::Failed
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeKind {
    Appear,
    Disappear,
    Partial,
}

#[derive(Debug, Clone, Copy)]
struct FadePlan {
    kind: FadeKind,
    from_opacity: f32,
    to_opacity: f32,
    from_tint: Vec3,
    to_tint: Vec3,
    duration: Duration,
    terminal: FadeState,
}

impl FadePlan {
    fn sample(&self, t: f32) -> (f32, Vec3) {
        let opacity = self.from_opacity + (self.to_opacity - self.from_opacity) * t;
        (opacity, self.from_tint.lerp(self.to_tint, t))
    }
}

#[derive(Debug)]
struct ControllerState {
    fade: FadeState,
    slot: CancellationSlot,
    initial_position: Option<Vec3>,
    /// Live action sequences
    actions: usize,
    /// Latest position requested while an action sequence was running
    pending_position: Option<Vec3>,
}

struct ControllerInner {
    actor: ActorId,
    surface: Arc<dyn VisualSurface>,
    config: FadeConfig,
    lease: BusyLease,
    state: Mutex<ControllerState>,
}

/// Owns the visual lifecycle of one actor
#[derive(Clone)]
pub struct ActorFadeController {
    inner: Arc<ControllerInner>,
}

impl ActorFadeController {
    /// Create a controller for `actor`
    ///
    /// The surface's current position is recorded as the initial position, and
    /// its current visibility decides whether the controller starts `Visible`
    /// or `Hidden`.
    pub fn new(actor: ActorId, surface: Arc<dyn VisualSurface>, config: FadeConfig) -> Self {
        let initial_position = surface.position().ok();
        let shown = surface.visible().unwrap_or(false) && surface.opacity().unwrap_or(0.0) > 0.0;
        Self {
            inner: Arc::new(ControllerInner {
                actor,
                surface,
                config,
                lease: BusyLease::new(),
                state: Mutex::new(ControllerState {
                    fade: if shown {
                        FadeState::Visible
                    } else {
                        FadeState::Hidden
                    },
                    slot: CancellationSlot::new(),
                    initial_position,
                    actions: 0,
                    pending_position: None,
                }),
            }),
        }
    }

    pub fn actor(&self) -> ActorId {
        self.inner.actor
    }

    pub fn config(&self) -> &FadeConfig {
        &self.inner.config
    }

    pub fn surface(&self) -> Arc<dyn VisualSurface> {
        self.inner.surface.clone()
    }

    /// Current fade state
    pub fn state(&self) -> FadeState {
        self.inner.state.lock().fade
    }

    /// True while any sequence holds a busy lease unit
    pub fn is_busy(&self) -> bool {
        self.inner.lease.is_busy()
    }

    /// Outstanding busy lease units
    pub fn busy_count(&self) -> usize {
        self.inner.lease.count()
    }

    /// Shared handle to the busy lease
    pub fn lease(&self) -> BusyLease {
        self.inner.lease.clone()
    }

    /// Position recorded at construction (used by position reset)
    pub fn initial_position(&self) -> Option<Vec3> {
        self.inner.state.lock().initial_position
    }

    pub fn set_initial_position(&self, position: Vec3) {
        self.inner.state.lock().initial_position = Some(position);
    }

    /// Whether a scripted action sequence is running
    pub fn is_in_action(&self) -> bool {
        self.inner.state.lock().actions > 0
    }

    /// Make the actor appear at `position`
    ///
    /// Synchronously snaps opacity to 0, enables the actor and moves it, then
    /// fades in over `fade_in`. While an action sequence is running only the
    /// position is recorded.
    pub fn request_appear(&self, position: Vec3) -> FadeTask {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.actions > 0 {
            log::debug!("{}: appear held during action sequence", inner.actor);
            state.pending_position = Some(position);
            return FadeTask::ready(FadeOutcome::Ignored);
        }

        let ticket = state.slot.supersede();
        let guard = inner.lease.acquire();
        let tint = inner.config.visible_tint;
        let prepared = inner
            .surface
            .set_opacity(0.0)
            .and_then(|_| inner.surface.set_tint(tint))
            .and_then(|_| inner.surface.set_position(position))
            .and_then(|_| inner.surface.set_visible(true));
        if let Err(err) = prepared {
            state.slot.revoke();
            state.fade = FadeState::Hidden;
            return FadeTask::ready(inner.abandon(err));
        }
        state.fade = FadeState::FadingIn;
        drop(state);

        log::debug!("{}: appearing at {}", inner.actor, position);
        self.spawn(
            ticket,
            guard,
            FadePlan {
                kind: FadeKind::Appear,
                from_opacity: 0.0,
                to_opacity: 1.0,
                from_tint: tint,
                to_tint: tint,
                duration: inner.config.fade_in_duration(),
                terminal: FadeState::Visible,
            },
        )
    }

    /// Make the actor disappear
    ///
    /// `immediate` snaps to hidden right now and overrides whatever is
    /// running; it is the only request that bypasses action-sequence
    /// deferral. Otherwise the actor fades out from its current opacity over
    /// `fade_out`, is disabled, and optionally returns to its initial position.
    /// A non-immediate request on a hidden actor does nothing.
    pub fn request_disappear(&self, immediate: bool) -> FadeTask {
        if immediate {
            return self.hide_immediately();
        }

        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.actions > 0 {
            log::debug!("{}: disappear dropped during action sequence", inner.actor);
            return FadeTask::ready(FadeOutcome::Ignored);
        }
        if state.fade == FadeState::Hidden {
            return FadeTask::ready(FadeOutcome::Ignored);
        }

        let current = inner
            .surface
            .opacity()
            .and_then(|opacity| Ok((opacity, inner.surface.tint()?)));
        let (from_opacity, from_tint) = match current {
            Ok(values) => values,
            Err(err) => return FadeTask::ready(inner.abandon(err)),
        };

        let ticket = state.slot.supersede();
        let guard = inner.lease.acquire();
        state.fade = FadeState::FadingOut;
        drop(state);

        log::debug!("{}: disappearing", inner.actor);
        self.spawn(
            ticket,
            guard,
            FadePlan {
                kind: FadeKind::Disappear,
                from_opacity,
                to_opacity: 0.0,
                from_tint,
                to_tint: from_tint,
                duration: inner.config.fade_out_duration(),
                terminal: FadeState::Hidden,
            },
        )
    }

    /// Fade to an arbitrary opacity and tint
    ///
    /// Starts from the surface's current values, so a partial fade issued
    /// while another is running continues from wherever that one got to.
    /// Ignored for hidden actors.
    pub fn request_partial_fade(
        &self,
        target_opacity: f32,
        target_tint: Vec3,
        duration: Duration,
    ) -> FadeTask {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.fade == FadeState::Hidden {
            return FadeTask::ready(FadeOutcome::Ignored);
        }

        let current = inner
            .surface
            .opacity()
            .and_then(|opacity| Ok((opacity, inner.surface.tint()?)));
        let (from_opacity, from_tint) = match current {
            Ok(values) => values,
            Err(err) => return FadeTask::ready(inner.abandon(err)),
        };

        let ticket = state.slot.supersede();
        let guard = inner.lease.acquire();
        state.fade = FadeState::PartiallyFaded;
        drop(state);

        self.spawn(
            ticket,
            guard,
            FadePlan {
                kind: FadeKind::Partial,
                from_opacity,
                to_opacity: target_opacity.clamp(0.0, 1.0),
                from_tint,
                to_tint: target_tint,
                duration,
                terminal: FadeState::PartiallyFaded,
            },
        )
    }

    /// Cancel the running sequence without replacing it
    ///
    /// The sequence stops at its next suspension point and forces the end
    /// value of the direction it was heading in.
    pub fn cancel(&self) {
        self.inner.state.lock().slot.cancel();
    }

    /// Mark the start of a scripted action sequence
    ///
    /// Until every returned guard is dropped, ordinary disappear requests are
    /// dropped and appear requests only record their position. The latest
    /// recorded position is applied when the last guard drops.
    pub fn begin_action(&self) -> ActionSequence {
        let mut state = self.inner.state.lock();
        state.actions += 1;
        log::debug!("{}: action sequence started", self.inner.actor);
        ActionSequence {
            inner: self.inner.clone(),
        }
    }

    /// Suspend until no sequence holds the busy lease
    pub async fn wait_until_idle(&self, token: &CancellationToken) -> Result<()> {
        let lease = &self.inner.lease;
        wait_until(token, self.inner.config.frame_duration(), || !lease.is_busy()).await
    }

    fn hide_immediately(&self) -> FadeTask {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        state.slot.revoke();
        state.fade = FadeState::Hidden;
        let result = inner
            .surface
            .set_opacity(0.0)
            .and_then(|_| inner.surface.set_visible(false));
        drop(state);

        log::debug!("{}: hidden immediately", inner.actor);
        match result {
            Ok(()) => FadeTask::ready(FadeOutcome::Completed),
            Err(err) => FadeTask::ready(inner.abandon(err)),
        }
    }

    fn spawn(&self, ticket: ScopeTicket, guard: BusyGuard, plan: FadePlan) -> FadeTask {
        let inner = self.inner.clone();
        FadeTask::running(tokio::spawn(async move {
            let _guard = guard;
            inner.run(ticket, plan).await
        }))
    }
}

impl ControllerInner {
    async fn run(&self, ticket: ScopeTicket, plan: FadePlan) -> FadeOutcome {
        match self.interpolate(&ticket, &plan).await {
            Ok(()) => self.finish(&ticket, &plan, FadeOutcome::Completed),
            Err(LifecycleError::Cancelled) => self.finish(&ticket, &plan, FadeOutcome::Cancelled),
            Err(err) => self.abandon(err),
        }
    }

    async fn interpolate(&self, ticket: &ScopeTicket, plan: &FadePlan) -> Result<()> {
        let frame = self.config.frame_duration();
        let clock = FrameClock::start(plan.duration);
        loop {
            let t = clock.progress();
            self.step(ticket, plan, t)?;
            if t >= 1.0 {
                return Ok(());
            }
            next_frame(ticket.token(), frame).await?;
        }
    }

    fn step(&self, ticket: &ScopeTicket, plan: &FadePlan, t: f32) -> Result<()> {
        let state = self.state.lock();
        if ticket.is_cancelled() || !state.slot.is_current(ticket) {
            return Err(LifecycleError::Cancelled);
        }
        let (opacity, tint) = plan.sample(t);
        self.surface.set_opacity(opacity)?;
        self.surface.set_tint(tint)
    }

    /// Force the plan's end values, unless a newer sequence owns the actor
    fn finish(&self, ticket: &ScopeTicket, plan: &FadePlan, outcome: FadeOutcome) -> FadeOutcome {
        let mut state = self.state.lock();
        if !state.slot.is_current(ticket) {
            return FadeOutcome::Superseded;
        }

        let mut forced = self
            .surface
            .set_opacity(plan.to_opacity)
            .and_then(|_| self.surface.set_tint(plan.to_tint));
        if plan.kind == FadeKind::Disappear {
            forced = forced.and_then(|_| self.surface.set_visible(false));
            if self.config.reset_position_on_hide {
                if let Some(initial) = state.initial_position {
                    forced = forced.and_then(|_| self.surface.set_position(initial));
                }
            }
        }
        if let Err(err) = forced {
            drop(state);
            return self.abandon(err);
        }

        state.fade = plan.terminal;
        log::trace!("{}: {:?} sequence ended {:?}", self.actor, plan.kind, outcome);
        outcome
    }

    fn abandon(&self, err: LifecycleError) -> FadeOutcome {
        match err {
            LifecycleError::ActorGone(_) => {
                log::debug!("{}: actor gone, dropping fade", self.actor);
                FadeOutcome::ActorGone
            }
            other => {
                log::warn!("{}: fade failed: {}", self.actor, other);
                FadeOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for ActorFadeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ActorFadeController")
            .field("actor", &self.inner.actor)
            .field("state", &state.fade)
            .field("busy", &self.inner.lease.count())
            .field("actions", &state.actions)
            .finish()
    }
}

/// Guard for a running scripted action sequence
#[must_use = "the action sequence ends when the guard is dropped"]
pub struct ActionSequence {
    inner: Arc<ControllerInner>,
}

impl Drop for ActionSequence {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.actions = state.actions.saturating_sub(1);
        if state.actions > 0 {
            return;
        }
        log::debug!("{}: action sequence finished", self.inner.actor);
        if let Some(position) = state.pending_position.take() {
            if let Err(err) = self.inner.surface.set_position(position) {
                log::debug!("{}: could not apply held position: {}", self.inner.actor, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    fn setup(config: FadeConfig) -> (Arc<MemorySurface>, ActorFadeController) {
        let actor = ActorId::new();
        let surface = Arc::new(MemorySurface::new(actor).with_position(Vec3::new(1.0, 0.0, 0.0)));
        let fade = ActorFadeController::new(actor, surface.clone(), config);
        (surface, fade)
    }

    async fn shown(config: FadeConfig) -> (Arc<MemorySurface>, ActorFadeController) {
        let (surface, fade) = setup(config);
        assert_eq!(
            fade.request_appear(Vec3::ZERO).wait().await,
            FadeOutcome::Completed
        );
        (surface, fade)
    }

    #[tokio::test(start_paused = true)]
    async fn test_appear_snaps_transparent_then_fades_in() {
        let (surface, fade) = setup(FadeConfig::default());
        let target = Vec3::new(4.0, 0.0, 2.0);

        let task = fade.request_appear(target);
        let snap = surface.snapshot();
        assert_eq!(snap.opacity, 0.0);
        assert!(snap.visible);
        assert_eq!(snap.position, target);
        assert!(fade.is_busy());
        assert_eq!(fade.state(), FadeState::FadingIn);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let halfway = surface.snapshot().opacity;
        assert!(halfway > 0.3 && halfway < 0.7, "opacity {halfway}");

        assert_eq!(task.wait().await, FadeOutcome::Completed);
        assert_eq!(surface.snapshot().opacity, 1.0);
        assert_eq!(fade.state(), FadeState::Visible);
        assert!(!fade.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_appear_then_disappear_converges_hidden() {
        let (surface, fade) = setup(FadeConfig::default());

        let appear = fade.request_appear(Vec3::ZERO);
        let disappear = fade.request_disappear(false);

        assert_eq!(appear.wait().await, FadeOutcome::Superseded);
        assert_eq!(disappear.wait().await, FadeOutcome::Completed);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let snap = surface.snapshot();
        assert_eq!(snap.opacity, 0.0);
        assert!(!snap.visible);
        assert_eq!(fade.state(), FadeState::Hidden);
        assert_eq!(fade.busy_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disappear_while_hidden_is_noop() {
        let (surface, fade) = setup(FadeConfig::default());
        let before = surface.snapshot();

        let task = fade.request_disappear(false);
        assert!(!task.is_started());
        assert_eq!(fade.busy_count(), 0);
        assert_eq!(task.wait().await, FadeOutcome::Ignored);
        assert_eq!(surface.snapshot(), before);
        assert_eq!(fade.state(), FadeState::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_appears_complete_once() {
        let (surface, fade) = setup(FadeConfig::default());
        let first_target = Vec3::new(2.0, 0.0, 0.0);
        let second_target = Vec3::new(-3.0, 0.0, 5.0);

        let first = fade.request_appear(first_target);
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = fade.request_appear(second_target);

        // The second request restarted from transparent
        assert_eq!(surface.snapshot().opacity, 0.0);

        assert_eq!(first.wait().await, FadeOutcome::Superseded);
        // The superseded sequence did not touch the surface after handing over
        assert!(surface.snapshot().opacity < 0.1);

        assert_eq!(second.wait().await, FadeOutcome::Completed);
        let snap = surface.snapshot();
        assert_eq!(snap.opacity, 1.0);
        assert_eq!(snap.position, second_target);
        assert_eq!(fade.busy_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_disappear_overrides_running_fade() {
        let (surface, fade) = setup(FadeConfig::default());
        let appear = fade.request_appear(Vec3::ZERO);
        tokio::time::sleep(Duration::from_millis(300)).await;

        let hide = fade.request_disappear(true);
        assert!(hide.is_finished());
        let snap = surface.snapshot();
        assert_eq!(snap.opacity, 0.0);
        assert!(!snap.visible);
        assert_eq!(fade.state(), FadeState::Hidden);

        assert_eq!(appear.wait().await, FadeOutcome::Superseded);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(surface.snapshot().opacity, 0.0);
        assert!(!fade.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_fades_compose() {
        let (surface, fade) = shown(FadeConfig::default()).await;
        let red = Vec3::new(1.0, 0.2, 0.2);

        let first = fade.request_partial_fade(0.5, red, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(500)).await;
        let midway = surface.snapshot().opacity;
        assert!((midway - 0.75).abs() < 0.05, "opacity {midway}");

        let second = fade.request_partial_fade(0.2, red, Duration::from_secs(1));
        // Continues from where the first got to instead of jumping
        assert!((surface.snapshot().opacity - midway).abs() < 1e-6);

        assert_eq!(first.wait().await, FadeOutcome::Superseded);
        assert_eq!(second.wait().await, FadeOutcome::Completed);
        let snap = surface.snapshot();
        assert!((snap.opacity - 0.2).abs() < 1e-6);
        assert!((snap.tint - red).length() < 1e-6);
        assert!(snap.visible);
        assert_eq!(fade.state(), FadeState::PartiallyFaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_fade_on_hidden_actor_is_ignored() {
        let (_surface, fade) = setup(FadeConfig::default());
        let task = fade.request_partial_fade(0.5, Vec3::ONE, Duration::from_secs(1));
        assert_eq!(task.wait().await, FadeOutcome::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_forces_terminal_value() {
        let (surface, fade) = shown(FadeConfig::default()).await;

        let task = fade.request_disappear(false);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(surface.snapshot().opacity > 0.5);

        fade.cancel();
        assert_eq!(task.wait().await, FadeOutcome::Cancelled);
        let snap = surface.snapshot();
        assert_eq!(snap.opacity, 0.0);
        assert!(!snap.visible);
        assert_eq!(fade.state(), FadeState::Hidden);
        assert_eq!(fade.busy_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_sequence_defers_requests() {
        let (surface, fade) = shown(FadeConfig::default()).await;
        let held = Vec3::new(7.0, 0.0, 7.0);

        let action = fade.begin_action();
        assert!(fade.is_in_action());
        assert_eq!(fade.request_disappear(false).wait().await, FadeOutcome::Ignored);
        assert_eq!(fade.request_appear(held).wait().await, FadeOutcome::Ignored);
        assert_eq!(fade.state(), FadeState::Visible);
        assert_eq!(surface.snapshot().position, Vec3::ZERO);

        drop(action);
        assert!(!fade.is_in_action());
        assert_eq!(surface.snapshot().position, held);
        assert_eq!(fade.state(), FadeState::Visible);

        // Requests issued after the sequence are handled normally
        assert_eq!(
            fade.request_disappear(false).wait().await,
            FadeOutcome::Completed
        );
        assert_eq!(fade.state(), FadeState::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_disappear_ignores_action_sequence() {
        let (surface, fade) = shown(FadeConfig::default()).await;
        let _action = fade.begin_action();

        assert_eq!(fade.request_disappear(true).wait().await, FadeOutcome::Completed);
        assert!(!surface.snapshot().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroyed_actor_is_a_noop() {
        let (surface, fade) = setup(FadeConfig::default());
        surface.destroy();

        assert_eq!(
            fade.request_appear(Vec3::ZERO).wait().await,
            FadeOutcome::ActorGone
        );
        assert!(!fade.is_busy());
        assert_eq!(fade.state(), FadeState::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_appear_during_fade_out_ends_hidden() {
        let (surface, fade) = shown(FadeConfig::default()).await;
        let fade_out = fade.request_disappear(false);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fade.state(), FadeState::FadingOut);

        surface.destroy();
        assert_eq!(
            fade.request_appear(Vec3::X).wait().await,
            FadeOutcome::ActorGone
        );
        assert_eq!(fade.state(), FadeState::Hidden);
        assert_eq!(fade_out.wait().await, FadeOutcome::Superseded);
        assert_eq!(fade.state(), FadeState::Hidden);
        assert_eq!(fade.busy_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroyed_mid_sequence_releases_lease() {
        let (surface, fade) = setup(FadeConfig::default());
        let task = fade.request_appear(Vec3::ZERO);
        tokio::time::sleep(Duration::from_millis(100)).await;

        surface.destroy();
        assert_eq!(task.wait().await, FadeOutcome::ActorGone);
        assert_eq!(fade.busy_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disappear_resets_position() {
        let (surface, fade) = shown(FadeConfig::default().with_position_reset()).await;
        assert_eq!(surface.snapshot().position, Vec3::ZERO);

        fade.request_disappear(false).wait().await;
        assert_eq!(surface.snapshot().position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_idle() {
        let (_surface, fade) = setup(FadeConfig::default().with_durations(2.0, 2.0));
        let token = CancellationToken::new();
        let start = tokio::time::Instant::now();

        let _task = fade.request_appear(Vec3::ZERO);
        fade.wait_until_idle(&token).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(!fade.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_fade_completes_in_place() {
        let (surface, fade) = setup(FadeConfig::default().with_durations(0.0, 0.0));
        assert_eq!(
            fade.request_appear(Vec3::ZERO).wait().await,
            FadeOutcome::Completed
        );
        assert_eq!(surface.snapshot().opacity, 1.0);
    }
}
