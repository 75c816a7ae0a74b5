//! Headless simulation
//!
//! Wires the lifecycle crates to in-memory hosts (surfaces, factory, spatial
//! lookup, containers) and plays a scripted timeline of mode changes and trap
//! visits against them.

use crate::config::{SimulationConfig, WraithConfig};
use glam::Vec3;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use wraith_core::prelude::CancellationToken;
use wraith_core::tick::secs;
use wraith_core::ActorId;
use wraith_encounter::{EncounterScheduler, EncounterState, SessionTransition, StaticLookup};
use wraith_fade::{ActorFadeController, MemorySurface};
use wraith_gamestate::{GameMode, ModeSignal, ModeSubscription};
use wraith_spawn::{MemoryFactory, SpawnCoordinator};
use wraith_triggers::{MemoryContainer, ProximityTrapActivator, TrapEvent, TrapEventType, TrapMember};

/// Entity id the simulated player uses for trap overlaps
pub const PLAYER_ENTITY: u64 = 1;

/// Spacing between trap actors
const TRAP_SPACING: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
enum Cue {
    Mode(GameMode),
    Enter,
    Exit,
}

/// Outcome of a simulation run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Simulated time covered
    pub elapsed: Duration,
    /// Encounter sessions started
    pub sessions: u64,
    pub spawned: usize,
    pub destroyed: usize,
    /// Highest number of encounter actors alive at once
    pub max_live: usize,
    /// Times active play was left while the encounter loop ran
    pub interruptions: usize,
    pub transitions: Vec<SessionTransition>,
    pub trap_events: Vec<TrapEvent>,
    pub final_mode: GameMode,
}

impl SimulationReport {
    /// Number of times the encounter entered `state`
    pub fn entries(&self, state: EncounterState) -> usize {
        self.transitions.iter().filter(|t| t.to == state).count()
    }

    /// Number of trap events of `event_type`
    pub fn trap_count(&self, event_type: TrapEventType) -> usize {
        self.trap_events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn log_summary(&self) {
        log::info!("Simulation finished after {:.1}s", self.elapsed.as_secs_f32());
        log::info!(
            "  Encounters: {} sessions, {} chases, {} interrupted",
            self.sessions,
            self.entries(EncounterState::Chasing),
            self.interruptions
        );
        log::info!(
            "  Actors: {} spawned, {} destroyed, max {} alive",
            self.spawned,
            self.destroyed,
            self.max_live
        );
        log::info!(
            "  Trap: {} appear requests, {} disappear requests, {} deactivations",
            self.trap_count(TrapEventType::AppearRequested),
            self.trap_count(TrapEventType::DisappearRequested),
            self.trap_count(TrapEventType::Deactivated)
        );
        log::info!("  Final mode: {}", self.final_mode);
    }
}

/// All components of one headless run
pub struct Simulation {
    mode: ModeSignal,
    factory: Arc<MemoryFactory>,
    spawner: Arc<SpawnCoordinator>,
    lookup: Arc<StaticLookup>,
    scheduler: EncounterScheduler,
    trap: ProximityTrapActivator,
    containers: Vec<Arc<MemoryContainer>>,
    occupant_tags: HashSet<String>,
}

impl Simulation {
    pub fn new(config: &WraithConfig) -> Self {
        let sim = &config.simulation;
        let mode = ModeSignal::new(sim.initial_mode);

        let mut factory = MemoryFactory::new();
        if let Some(template) = &config.spawn.template {
            factory = factory.with_template(template.clone());
        }
        let factory = Arc::new(factory);
        let spawner = Arc::new(SpawnCoordinator::new(factory.clone(), config.spawn.clone()));

        let lookup = Arc::new(
            StaticLookup::new().with(config.encounter.target_role.clone(), sim.player_position),
        );
        let scheduler = EncounterScheduler::new(
            spawner.clone(),
            lookup.clone(),
            mode.clone(),
            config.encounter.clone(),
        );

        let mut members = Vec::with_capacity(sim.trap_members);
        let mut containers = Vec::with_capacity(sim.trap_members);
        for i in 0..sim.trap_members {
            let actor = ActorId::new();
            let position = sim.trap_position + Vec3::new(i as f32 * TRAP_SPACING, 0.0, 0.0);
            let surface = Arc::new(MemorySurface::new(actor).with_position(position));
            let container = Arc::new(MemoryContainer::new());
            let fade = ActorFadeController::new(actor, surface, config.spawn.fade.clone());
            members.push(TrapMember::new(fade, container.clone(), position));
            containers.push(container);
        }
        let trap = ProximityTrapActivator::new(config.trap.clone(), members).with_mode(mode.clone());

        let mut occupant_tags = HashSet::new();
        if !config.trap.occupant_tag.is_empty() {
            occupant_tags.insert(config.trap.occupant_tag.clone());
        }

        Self {
            mode,
            factory,
            spawner,
            lookup,
            scheduler,
            trap,
            containers,
            occupant_tags,
        }
    }

    pub fn mode(&self) -> &ModeSignal {
        &self.mode
    }

    pub fn factory(&self) -> &Arc<MemoryFactory> {
        &self.factory
    }

    pub fn spawner(&self) -> &Arc<SpawnCoordinator> {
        &self.spawner
    }

    pub fn lookup(&self) -> &Arc<StaticLookup> {
        &self.lookup
    }

    pub fn scheduler(&self) -> &EncounterScheduler {
        &self.scheduler
    }

    pub fn trap(&self) -> &ProximityTrapActivator {
        &self.trap
    }

    pub fn containers(&self) -> &[Arc<MemoryContainer>] {
        &self.containers
    }

    /// Play the timeline for `sim.duration` simulated seconds
    pub async fn run(&self, sim: &SimulationConfig) -> SimulationReport {
        let origin = Instant::now();
        let mut cues: Vec<(f32, Cue)> = sim
            .timeline
            .iter()
            .map(|cue| (cue.at, Cue::Mode(cue.mode)))
            .collect();
        for visit in &sim.trap_visits {
            cues.push((visit.enter, Cue::Enter));
            cues.push((visit.exit, Cue::Exit));
        }
        cues.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut play: Option<(CancellationToken, ModeSubscription)> = None;
        let mut interruptions = 0;
        self.resume_encounters(&mut play);

        for (at, cue) in cues {
            if at > sim.duration {
                break;
            }
            tokio::time::sleep_until(origin + secs(at)).await;
            match cue {
                Cue::Mode(mode) => {
                    log::info!("[{:>7.2}s] mode -> {}", at, mode);
                    self.mode.set(mode);
                }
                Cue::Enter => {
                    log::info!("[{:>7.2}s] player enters trap zone", at);
                    self.trap.process_overlap(PLAYER_ENTITY, true, &self.occupant_tags);
                }
                Cue::Exit => {
                    log::info!("[{:>7.2}s] player leaves trap zone", at);
                    self.trap.process_overlap(PLAYER_ENTITY, false, &self.occupant_tags);
                }
            }

            if play.as_ref().is_some_and(|(token, _)| token.is_cancelled()) {
                interruptions += 1;
                play = None;
            }
            self.resume_encounters(&mut play);
        }

        tokio::time::sleep_until(origin + secs(sim.duration)).await;
        self.scheduler.stop_loop();

        SimulationReport {
            elapsed: origin.elapsed(),
            sessions: self.scheduler.cycles(),
            spawned: self.factory.spawned_count(),
            destroyed: self.factory.destroyed_count(),
            max_live: self.factory.max_live(),
            interruptions,
            transitions: self.scheduler.history(),
            trap_events: self.trap.drain_events(),
            final_mode: self.mode.current(),
        }
    }

    /// Start the encounter loop if play is active and it is not running
    fn resume_encounters(&self, play: &mut Option<(CancellationToken, ModeSubscription)>) {
        if !self.mode.is_active_play() || self.scheduler.is_running() {
            return;
        }
        if self.scheduler.start_loop() {
            *play = Some(self.mode.play_token());
        }
    }
}
