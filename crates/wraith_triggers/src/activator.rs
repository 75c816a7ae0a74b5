//! Proximity trap activator

use crate::config::TrapConfig;
use crate::events::TrapEvent;
use crate::filter::TrapFilter;
use crate::member::TrapMember;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use wraith_core::tick::{delay, wait_until};
use wraith_core::{CancellationSlot, ScopeTicket};
use wraith_gamestate::{ModeChange, ModeSignal, ModeSubscription};

/// Where the occupants are relative to the zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrapPhase {
    /// Nobody inside
    #[default]
    Outside,
    /// Inside, countdown running (or held while out of play)
    InsideCounting,
    /// Inside, batch already raised this stay
    Appeared,
}

struct TrapState {
    phase: TrapPhase,
    occupants: HashSet<u64>,
    /// Per member: appear issued and not yet dismissed
    raised: Vec<bool>,
    countdown: CancellationSlot,
    exit: CancellationSlot,
    events: Vec<TrapEvent>,
    filter: TrapFilter,
    mode: Option<ModeSignal>,
    subscription: Option<ModeSubscription>,
}

impl TrapState {
    fn shown(&self) -> bool {
        self.raised.iter().any(|raised| *raised)
    }

    fn fully_raised(&self) -> bool {
        !self.raised.is_empty() && self.raised.iter().all(|raised| *raised)
    }

    fn in_play(&self) -> bool {
        self.mode
            .as_ref()
            .map(|mode| mode.is_active_play())
            .unwrap_or(true)
    }
}

struct TrapInner {
    config: TrapConfig,
    members: Vec<TrapMember>,
    origin: Instant,
    state: Mutex<TrapState>,
}

/// Raises a batch of actors on sustained zone presence and dismisses them on exit
#[derive(Clone)]
pub struct ProximityTrapActivator {
    inner: Arc<TrapInner>,
}

impl ProximityTrapActivator {
    /// Create a trap over `members`; occupants are filtered by the configured tags
    pub fn new(config: TrapConfig, members: Vec<TrapMember>) -> Self {
        let filter = TrapFilter::from_config(&config);
        let raised = vec![false; members.len()];
        Self {
            inner: Arc::new(TrapInner {
                config,
                members,
                origin: Instant::now(),
                state: Mutex::new(TrapState {
                    phase: TrapPhase::Outside,
                    occupants: HashSet::new(),
                    raised,
                    countdown: CancellationSlot::new(),
                    exit: CancellationSlot::new(),
                    events: Vec::new(),
                    filter,
                    mode: None,
                    subscription: None,
                }),
            }),
        }
    }

    /// Replace the occupant filter
    pub fn with_filter(self, filter: TrapFilter) -> Self {
        self.inner.state.lock().filter = filter;
        self
    }

    /// Only count down while `mode` is in active play
    ///
    /// Leaving play interrupts a running countdown; returning to play with
    /// someone still inside starts it again from the beginning.
    pub fn with_mode(self, mode: ModeSignal) -> Self {
        let weak = Arc::downgrade(&self.inner);
        let subscription = mode.subscribe(move |change| {
            if let Some(inner) = weak.upgrade() {
                inner.on_mode_change(change);
            }
        });
        let mut state = self.inner.state.lock();
        state.mode = Some(mode);
        state.subscription = Some(subscription);
        drop(state);
        self
    }

    pub fn config(&self) -> &TrapConfig {
        &self.inner.config
    }

    pub fn members(&self) -> &[TrapMember] {
        &self.inner.members
    }

    pub fn phase(&self) -> TrapPhase {
        self.inner.state.lock().phase
    }

    /// Whether any member has been raised and not yet dismissed
    pub fn is_shown(&self) -> bool {
        self.inner.state.lock().shown()
    }

    /// Whether any member is mid-transition
    pub fn is_busy(&self) -> bool {
        self.inner.members.iter().any(TrapMember::is_busy)
    }

    pub fn occupant_count(&self) -> usize {
        self.inner.state.lock().occupants.len()
    }

    pub fn is_inside(&self, entity: u64) -> bool {
        self.inner.state.lock().occupants.contains(&entity)
    }

    /// Take every queued event
    pub fn drain_events(&self) -> Vec<TrapEvent> {
        std::mem::take(&mut self.inner.state.lock().events)
    }

    /// Zone-enter callback
    pub fn on_enter(&self) {
        let mut state = self.inner.state.lock();
        self.inner.enter(&mut state, None);
    }

    /// Zone-exit callback
    pub fn on_exit(&self) {
        let mut state = self.inner.state.lock();
        self.inner.exit(&mut state, None);
    }

    /// Feed an overlap change for one entity
    ///
    /// Entities rejected by the filter are ignored. The first accepted
    /// occupant entering counts as zone-enter, the last one leaving as
    /// zone-exit.
    pub fn process_overlap(&self, entity: u64, inside: bool, tags: &HashSet<String>) {
        let mut state = self.inner.state.lock();
        if !state.filter.passes(tags) {
            return;
        }
        if inside {
            if state.occupants.insert(entity) && state.occupants.len() == 1 {
                self.inner.enter(&mut state, Some(entity));
            }
        } else if state.occupants.remove(&entity) && state.occupants.is_empty() {
            self.inner.exit(&mut state, Some(entity));
        }
    }

    /// Drop everything: cancel pending work, hide and deactivate every member
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.countdown.revoke();
        state.exit.revoke();
        state.occupants.clear();
        state.phase = TrapPhase::Outside;
        state.raised.fill(false);
        drop(state);

        for member in &self.inner.members {
            member.fade.request_disappear(true);
            if let Err(err) = member.container.set_active(false) {
                log::debug!("{}: container switch failed: {}", member.actor(), err);
            }
        }
        log::debug!("Trap reset");
    }
}

impl TrapInner {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn enter(self: &Arc<Self>, state: &mut TrapState, entity: Option<u64>) {
        if state.phase != TrapPhase::Outside {
            return;
        }
        state.events.push(TrapEvent::enter(entity, self.elapsed()));
        state.exit.revoke();

        if state.fully_raised() {
            log::debug!("Trap re-entered before dismissal");
            state.phase = TrapPhase::Appeared;
            return;
        }
        if state.shown() {
            log::debug!("Trap re-entered mid-raise, finishing the batch");
            state.phase = TrapPhase::Appeared;
            self.launch_raise(state, Duration::ZERO);
            return;
        }
        state.phase = TrapPhase::InsideCounting;
        self.start_countdown(state);
    }

    fn exit(self: &Arc<Self>, state: &mut TrapState, entity: Option<u64>) {
        if state.phase == TrapPhase::Outside {
            return;
        }
        state.events.push(TrapEvent::exit(entity, self.elapsed()));
        state.countdown.revoke();
        state.phase = TrapPhase::Outside;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::error!("Trap exit needs a tokio runtime");
            return;
        };
        let ticket = state.exit.supersede();
        runtime.spawn(self.clone().dismiss(ticket));
    }

    fn start_countdown(self: &Arc<Self>, state: &mut TrapState) {
        if !state.in_play() {
            log::debug!("Trap countdown held until play resumes");
            return;
        }
        self.launch_raise(state, self.config.countdown_duration());
    }

    fn launch_raise(self: &Arc<Self>, state: &mut TrapState, wait: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::error!("Trap countdown needs a tokio runtime");
            return;
        };
        let ticket = state.countdown.supersede();
        runtime.spawn(self.clone().raise(ticket, wait));
    }

    fn on_mode_change(self: &Arc<Self>, change: &ModeChange) {
        let mut state = self.state.lock();
        if state.phase != TrapPhase::InsideCounting {
            return;
        }
        if change.leaves_play() {
            log::debug!("Trap countdown interrupted by {}", change.to);
            state.countdown.revoke();
        } else if change.enters_play() {
            self.start_countdown(&mut state);
        }
    }

    /// Wait out `wait`, then appear every member not yet raised once it is idle
    async fn raise(self: Arc<Self>, ticket: ScopeTicket, wait: Duration) {
        let token = ticket.token();
        if delay(token, wait).await.is_err() {
            return;
        }
        {
            let mut state = self.state.lock();
            if !self.owns(&state.countdown, &ticket) || state.phase == TrapPhase::Outside {
                return;
            }
            state.phase = TrapPhase::Appeared;
        }
        log::info!("Trap countdown elapsed, raising {} members", self.members.len());

        for (index, member) in self.members.iter().enumerate() {
            if self.state.lock().raised[index] {
                continue;
            }
            if member.fade.wait_until_idle(token).await.is_err() {
                return;
            }
            let mut state = self.state.lock();
            if !self.owns(&state.countdown, &ticket) {
                return;
            }
            if let Err(err) = member.container.set_active(true) {
                log::debug!("{}: container switch failed: {}", member.actor(), err);
                continue;
            }
            member.fade.request_appear(member.position);
            state.raised[index] = true;
            let at = self.elapsed();
            state.events.push(TrapEvent::appear_requested(member.actor(), at));
        }
    }

    /// Exit delay, then disappear the batch and deactivate once all are idle
    async fn dismiss(self: Arc<Self>, ticket: ScopeTicket) {
        let token = ticket.token();
        if delay(token, self.config.exit_delay_duration()).await.is_err() {
            return;
        }
        {
            let mut state = self.state.lock();
            if !self.owns(&state.exit, &ticket) {
                return;
            }
            state.raised.fill(false);
            let at = self.elapsed();
            for member in &self.members {
                member.fade.request_disappear(false);
                state.events.push(TrapEvent::disappear_requested(member.actor(), at));
            }
        }

        let frame = self.config.frame_duration();
        loop {
            let members = &self.members;
            if wait_until(token, frame, || !members.iter().any(TrapMember::is_busy))
                .await
                .is_err()
            {
                return;
            }
            if self.try_deactivate(&ticket) {
                return;
            }
        }
    }

    /// Switch every container off if all members are still idle
    ///
    /// Returns false when a member went busy again and the caller should keep
    /// waiting.
    fn try_deactivate(&self, ticket: &ScopeTicket) -> bool {
        let mut state = self.state.lock();
        if !self.owns(&state.exit, ticket) {
            return true;
        }
        if self.members.iter().any(TrapMember::is_busy) {
            return false;
        }
        for member in &self.members {
            if let Err(err) = member.container.set_active(false) {
                log::debug!("{}: container switch failed: {}", member.actor(), err);
            }
        }
        let at = self.elapsed();
        state.events.push(TrapEvent::deactivated(at));
        log::info!("Trap deactivated {} members", self.members.len());
        true
    }

    fn owns(&self, slot: &CancellationSlot, ticket: &ScopeTicket) -> bool {
        !ticket.is_cancelled() && slot.is_current(ticket)
    }
}

impl std::fmt::Debug for ProximityTrapActivator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ProximityTrapActivator")
            .field("phase", &state.phase)
            .field("raised", &state.raised)
            .field("occupants", &state.occupants.len())
            .field("members", &self.inner.members.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TrapEventType;
    use crate::member::MemoryContainer;
    use glam::Vec3;
    use wraith_core::ActorId;
    use wraith_fade::{ActorFadeController, FadeConfig, FadeState, MemorySurface};
    use wraith_gamestate::GameMode;

    struct Rig {
        trap: ProximityTrapActivator,
        surfaces: Vec<Arc<MemorySurface>>,
        containers: Vec<Arc<MemoryContainer>>,
    }

    fn rig(config: TrapConfig, fade_outs: &[f32]) -> Rig {
        let mut surfaces = Vec::new();
        let mut containers = Vec::new();
        let mut members = Vec::new();
        for (i, fade_out) in fade_outs.iter().enumerate() {
            let actor = ActorId::new();
            let surface = Arc::new(MemorySurface::new(actor));
            let container = Arc::new(MemoryContainer::new());
            let fade = ActorFadeController::new(
                actor,
                surface.clone(),
                FadeConfig::default().with_durations(1.0, *fade_out),
            );
            members.push(TrapMember::new(
                fade,
                container.clone(),
                Vec3::new(i as f32, 0.0, 0.0),
            ));
            surfaces.push(surface);
            containers.push(container);
        }
        Rig {
            trap: ProximityTrapActivator::new(config, members),
            surfaces,
            containers,
        }
    }

    fn count(events: &[TrapEvent], event_type: TrapEventType) -> usize {
        events.iter().filter(|e| e.event_type == event_type).count()
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn player() -> HashSet<String> {
        ["player".to_string()].into_iter().collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_before_countdown_never_appears() {
        let rig = rig(TrapConfig::default().with_countdown(10.0), &[1.0, 1.0]);

        rig.trap.on_enter();
        assert_eq!(rig.trap.phase(), TrapPhase::InsideCounting);
        sleep_ms(4_000).await;
        rig.trap.on_exit();
        sleep_ms(30_000).await;

        let events = rig.trap.drain_events();
        assert_eq!(count(&events, TrapEventType::AppearRequested), 0);
        assert!(!rig.trap.is_shown());
        for surface in &rig.surfaces {
            assert!(!surface.snapshot().visible);
        }
        for container in &rig.containers {
            assert!(!container.is_active());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_raises_every_member() {
        let rig = rig(TrapConfig::default().with_countdown(2.0), &[1.0, 1.0, 1.0]);
        rig.trap.on_enter();

        sleep_ms(1_900).await;
        assert!(rig.trap.drain_events().iter().all(|e| e.is_enter()));

        sleep_ms(200).await;
        assert_eq!(rig.trap.phase(), TrapPhase::Appeared);
        let events = rig.trap.drain_events();
        assert_eq!(count(&events, TrapEventType::AppearRequested), 3);
        assert!(rig.containers.iter().all(|c| c.is_active()));

        sleep_ms(1_100).await;
        for member in rig.trap.members() {
            assert_eq!(member.fade.state(), FadeState::Visible);
        }
        assert_eq!(rig.surfaces[2].snapshot().position, Vec3::new(2.0, 0.0, 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivation_waits_for_every_member() {
        let config = TrapConfig::default().with_countdown(1.0).with_exit_delay(1.0);
        let rig = rig(config, &[1.0, 3.0]);

        rig.trap.on_enter();
        sleep_ms(2_500).await;
        rig.trap.on_exit();
        rig.trap.drain_events();

        // Disappear requested at +1s; the fast member is done at +2s
        sleep_ms(2_500).await;
        assert_eq!(rig.trap.members()[0].fade.state(), FadeState::Hidden);
        assert!(rig.trap.members()[1].is_busy());
        assert!(rig.containers.iter().all(|c| c.is_active()));
        let events = rig.trap.drain_events();
        assert_eq!(count(&events, TrapEventType::DisappearRequested), 2);
        assert_eq!(count(&events, TrapEventType::Deactivated), 0);

        sleep_ms(2_000).await;
        assert!(!rig.trap.is_busy());
        assert!(rig.containers.iter().all(|c| !c.is_active()));
        assert_eq!(count(&rig.trap.drain_events(), TrapEventType::Deactivated), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentry_cancels_pending_dismissal() {
        let config = TrapConfig::default().with_countdown(1.0).with_exit_delay(2.0);
        let rig = rig(config, &[1.0]);

        rig.trap.on_enter();
        sleep_ms(2_500).await;
        rig.trap.on_exit();
        sleep_ms(1_000).await;
        rig.trap.on_enter();
        assert_eq!(rig.trap.phase(), TrapPhase::Appeared);

        sleep_ms(10_000).await;
        let events = rig.trap.drain_events();
        assert_eq!(count(&events, TrapEventType::DisappearRequested), 0);
        assert_eq!(count(&events, TrapEventType::AppearRequested), 1);
        assert_eq!(rig.trap.members()[0].fade.state(), FadeState::Visible);
        assert!(rig.containers[0].is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_busy_member_before_appearing() {
        let rig = rig(TrapConfig::default().with_countdown(0.5), &[1.0]);
        let member = rig.trap.members()[0].clone();
        let _fade_in = member.fade.request_appear(Vec3::new(9.0, 0.0, 9.0));

        // Still fading in when the countdown elapses
        rig.trap.on_enter();
        sleep_ms(600).await;
        assert_eq!(count(&rig.trap.drain_events(), TrapEventType::AppearRequested), 0);
        assert_eq!(member.fade.state(), FadeState::FadingIn);

        sleep_ms(1_000).await;
        let events = rig.trap.drain_events();
        assert_eq!(count(&events, TrapEventType::AppearRequested), 1);
        assert!(events[0].at >= Duration::from_secs(1));
        assert_eq!(rig.surfaces[0].snapshot().position, Vec3::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reentry_mid_raise_finishes_batch() {
        let config = TrapConfig::default().with_countdown(0.5);
        let rig = rig(config, &[1.0, 1.0]);
        let slow = rig.trap.members()[1].clone();
        slow.fade.request_appear(Vec3::ZERO).wait().await;
        let _dimming = slow
            .fade
            .request_partial_fade(0.5, Vec3::ONE, Duration::from_secs(5));

        // The first member is raised, the second is still dimming on exit
        rig.trap.on_enter();
        sleep_ms(1_000).await;
        assert!(rig.trap.is_shown());
        rig.trap.on_exit();
        sleep_ms(500).await;
        rig.trap.on_enter();
        assert_eq!(rig.trap.phase(), TrapPhase::Appeared);

        sleep_ms(30_000).await;
        let events = rig.trap.drain_events();
        assert_eq!(count(&events, TrapEventType::AppearRequested), 2);
        assert_eq!(count(&events, TrapEventType::DisappearRequested), 0);
        for member in rig.trap.members() {
            assert_eq!(member.fade.state(), FadeState::Visible);
        }
        assert_eq!(rig.surfaces[1].snapshot().position, Vec3::new(1.0, 0.0, 0.0));
        assert!(rig.containers.iter().all(|c| c.is_active()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_occupancy_follows_filter() {
        let config = TrapConfig::default().with_countdown(60.0).ignoring("ghost");
        let rig = rig(config, &[1.0]);
        let enemy: HashSet<String> = ["enemy".to_string()].into_iter().collect();
        let ghost: HashSet<String> = ["player".to_string(), "ghost".to_string()]
            .into_iter()
            .collect();

        rig.trap.process_overlap(1, true, &enemy);
        rig.trap.process_overlap(4, true, &ghost);
        assert_eq!(rig.trap.phase(), TrapPhase::Outside);
        assert_eq!(rig.trap.occupant_count(), 0);

        rig.trap.process_overlap(2, true, &player());
        rig.trap.process_overlap(3, true, &player());
        assert_eq!(rig.trap.occupant_count(), 2);
        assert!(rig.trap.is_inside(2));

        rig.trap.process_overlap(2, false, &player());
        assert_eq!(rig.trap.phase(), TrapPhase::InsideCounting);

        rig.trap.process_overlap(3, false, &player());
        assert_eq!(rig.trap.phase(), TrapPhase::Outside);

        let events = rig.trap.drain_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].entity, Some(2));
        assert_eq!(events[1].entity, Some(3));
        assert!(events[1].is_exit());
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_play_holds_countdown() {
        let mode = ModeSignal::new(GameMode::Playing);
        let rig = rig(TrapConfig::default().with_countdown(2.0), &[1.0]);
        let trap = rig.trap.clone().with_mode(mode.clone());

        trap.on_enter();
        sleep_ms(1_500).await;
        mode.push(GameMode::Paused);
        sleep_ms(5_000).await;
        assert_eq!(count(&trap.drain_events(), TrapEventType::AppearRequested), 0);
        assert_eq!(trap.phase(), TrapPhase::InsideCounting);

        mode.pop();
        sleep_ms(1_900).await;
        assert_eq!(count(&trap.drain_events(), TrapEventType::AppearRequested), 0);
        sleep_ms(200).await;
        assert_eq!(count(&trap.drain_events(), TrapEventType::AppearRequested), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_hides_everything() {
        let rig = rig(TrapConfig::default().with_countdown(0.5), &[1.0, 1.0]);
        rig.trap.on_enter();
        sleep_ms(1_000).await;
        assert!(rig.trap.is_shown());

        rig.trap.reset();
        assert_eq!(rig.trap.phase(), TrapPhase::Outside);
        assert!(!rig.trap.is_shown());
        for surface in &rig.surfaces {
            assert!(!surface.snapshot().visible);
        }
        assert!(rig.containers.iter().all(|c| c.deactivations() == 1));
    }
}
