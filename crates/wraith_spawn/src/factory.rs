//! Actor factory and pursuit interfaces

use glam::Vec3;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use wraith_core::{ActorId, LifecycleError, Pose, Result, TemplateId};
use wraith_fade::{MemorySurface, VisualSurface};

/// Host-side movement/pursuit agent of one actor
pub trait PursuitDriver: Send + Sync {
    /// Whether the actor processes movement this tick
    fn set_active(&self, active: bool) -> Result<()>;
    /// Point the actor chases, if any
    fn set_target(&self, target: Option<Vec3>) -> Result<()>;
}

/// Everything the host hands back for a freshly instantiated actor
#[derive(Clone)]
pub struct SpawnedActor {
    pub id: ActorId,
    pub surface: Arc<dyn VisualSurface>,
    pub pursuit: Arc<dyn PursuitDriver>,
}

/// Host-side actor instantiation
///
/// Called with the coordinator's slot locked; implementations must not call
/// back into the coordinator.
pub trait ActorFactory: Send + Sync {
    /// Instantiate `template` at `pose`
    fn instantiate(&self, template: &TemplateId, pose: Pose) -> Result<SpawnedActor>;
    /// Destroy a previously instantiated actor
    fn destroy(&self, actor: ActorId);
}

/// Pursuit agent that records what it was told
#[derive(Debug, Default)]
pub struct MemoryPursuit {
    state: Mutex<(bool, Option<Vec3>)>,
}

impl MemoryPursuit {
    pub fn is_active(&self) -> bool {
        self.state.lock().0
    }

    pub fn target(&self) -> Option<Vec3> {
        self.state.lock().1
    }
}

impl PursuitDriver for MemoryPursuit {
    fn set_active(&self, active: bool) -> Result<()> {
        self.state.lock().0 = active;
        Ok(())
    }

    fn set_target(&self, target: Option<Vec3>) -> Result<()> {
        self.state.lock().1 = target;
        Ok(())
    }
}

#[derive(Default)]
struct FactoryState {
    live: HashMap<ActorId, (Arc<MemorySurface>, Arc<MemoryPursuit>)>,
    spawned: usize,
    destroyed: usize,
    max_live: usize,
}

/// Factory that creates [`MemorySurface`]-backed actors
///
/// Only templates it was told about can be instantiated.
#[derive(Default)]
pub struct MemoryFactory {
    templates: Vec<TemplateId>,
    state: Mutex<FactoryState>,
}

impl MemoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a template
    pub fn with_template(mut self, template: impl Into<TemplateId>) -> Self {
        self.templates.push(template.into());
        self
    }

    /// Number of actors currently alive
    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Highest number of simultaneously alive actors ever observed
    pub fn max_live(&self) -> usize {
        self.state.lock().max_live
    }

    pub fn spawned_count(&self) -> usize {
        self.state.lock().spawned
    }

    pub fn destroyed_count(&self) -> usize {
        self.state.lock().destroyed
    }

    /// Surface of a live actor
    pub fn surface(&self, actor: ActorId) -> Option<Arc<MemorySurface>> {
        self.state.lock().live.get(&actor).map(|(s, _)| s.clone())
    }

    /// Pursuit agent of a live actor
    pub fn pursuit(&self, actor: ActorId) -> Option<Arc<MemoryPursuit>> {
        self.state.lock().live.get(&actor).map(|(_, p)| p.clone())
    }
}

impl ActorFactory for MemoryFactory {
    fn instantiate(&self, template: &TemplateId, pose: Pose) -> Result<SpawnedActor> {
        if !self.templates.contains(template) {
            return Err(LifecycleError::InvalidConfig(format!(
                "unknown template '{}'",
                template
            )));
        }

        let id = ActorId::new();
        let surface = Arc::new(MemorySurface::new(id).with_position(pose.position));
        let pursuit = Arc::new(MemoryPursuit::default());

        let mut state = self.state.lock();
        state.live.insert(id, (surface.clone(), pursuit.clone()));
        state.spawned += 1;
        state.max_live = state.max_live.max(state.live.len());

        Ok(SpawnedActor {
            id,
            surface,
            pursuit,
        })
    }

    fn destroy(&self, actor: ActorId) {
        let mut state = self.state.lock();
        if let Some((surface, _)) = state.live.remove(&actor) {
            surface.destroy();
            state.destroyed += 1;
        }
    }
}
