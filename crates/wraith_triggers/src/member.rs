//! Trap members

use glam::Vec3;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use wraith_core::{ActorId, Result};
use wraith_fade::ActorFadeController;

/// Structural on/off switch of a member's container
pub trait ContainerSwitch: Send + Sync {
    fn set_active(&self, active: bool) -> Result<()>;
}

/// Container switch that records its state
#[derive(Debug, Default)]
pub struct MemoryContainer {
    active: AtomicBool,
    deactivations: AtomicUsize,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Times the container was switched off
    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }
}

impl ContainerSwitch for MemoryContainer {
    fn set_active(&self, active: bool) -> Result<()> {
        self.active.store(active, Ordering::SeqCst);
        if !active {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// One actor managed by a trap
#[derive(Clone)]
pub struct TrapMember {
    /// Fade controller of the actor
    pub fade: ActorFadeController,
    /// Container switched on before appearing and off after the batch is idle
    pub container: Arc<dyn ContainerSwitch>,
    /// Where the actor appears
    pub position: Vec3,
}

impl TrapMember {
    pub fn new(
        fade: ActorFadeController,
        container: Arc<dyn ContainerSwitch>,
        position: Vec3,
    ) -> Self {
        Self {
            fade,
            container,
            position,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.fade.actor()
    }

    pub fn is_busy(&self) -> bool {
        self.fade.is_busy()
    }
}

impl std::fmt::Debug for TrapMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrapMember")
            .field("fade", &self.fade)
            .field("position", &self.position)
            .finish()
    }
}
