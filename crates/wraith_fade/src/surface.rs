//! Visual surface interface
//!
//! A surface is whatever the host renders an actor with. The fade engine only
//! needs an addressable opacity, a tint, a structural visibility switch and a
//! position. Every call can fail with [`LifecycleError::ActorGone`] once the
//! host has destroyed the actor.

use glam::Vec3;
use parking_lot::Mutex;
use wraith_core::{ActorId, LifecycleError, Result};

/// Host-provided visual state of one actor
pub trait VisualSurface: Send + Sync {
    fn opacity(&self) -> Result<f32>;
    fn set_opacity(&self, opacity: f32) -> Result<()>;

    fn tint(&self) -> Result<Vec3>;
    fn set_tint(&self, tint: Vec3) -> Result<()>;

    /// Structural visibility (renderer/collider enabled)
    fn visible(&self) -> Result<bool>;
    fn set_visible(&self, visible: bool) -> Result<()>;

    fn position(&self) -> Result<Vec3>;
    fn set_position(&self, position: Vec3) -> Result<()>;
}

/// Point-in-time copy of a [`MemorySurface`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSnapshot {
    pub opacity: f32,
    pub tint: Vec3,
    pub visible: bool,
    pub position: Vec3,
    pub destroyed: bool,
}

impl Default for SurfaceSnapshot {
    fn default() -> Self {
        Self {
            opacity: 0.0,
            tint: Vec3::ONE,
            visible: false,
            position: Vec3::ZERO,
            destroyed: false,
        }
    }
}

/// Surface that keeps its state in memory
///
/// Used by the headless runtime and by tests. Starts hidden and transparent.
#[derive(Debug)]
pub struct MemorySurface {
    actor: ActorId,
    state: Mutex<SurfaceSnapshot>,
}

impl MemorySurface {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            state: Mutex::new(SurfaceSnapshot::default()),
        }
    }

    /// Start at a given position
    pub fn with_position(self, position: Vec3) -> Self {
        self.state.lock().position = position;
        self
    }

    /// Start fully shown
    pub fn shown(self) -> Self {
        {
            let mut state = self.state.lock();
            state.opacity = 1.0;
            state.visible = true;
        }
        self
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SurfaceSnapshot {
        *self.state.lock()
    }

    /// Simulate the host destroying the actor
    pub fn destroy(&self) {
        self.state.lock().destroyed = true;
    }

    fn read<T>(&self, f: impl FnOnce(&SurfaceSnapshot) -> T) -> Result<T> {
        let state = self.state.lock();
        if state.destroyed {
            return Err(LifecycleError::ActorGone(self.actor));
        }
        Ok(f(&state))
    }

    fn write(&self, f: impl FnOnce(&mut SurfaceSnapshot)) -> Result<()> {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(LifecycleError::ActorGone(self.actor));
        }
        f(&mut state);
        Ok(())
    }
}

impl VisualSurface for MemorySurface {
    fn opacity(&self) -> Result<f32> {
        self.read(|s| s.opacity)
    }

    fn set_opacity(&self, opacity: f32) -> Result<()> {
        self.write(|s| s.opacity = opacity.clamp(0.0, 1.0))
    }

    fn tint(&self) -> Result<Vec3> {
        self.read(|s| s.tint)
    }

    fn set_tint(&self, tint: Vec3) -> Result<()> {
        self.write(|s| s.tint = tint)
    }

    fn visible(&self) -> Result<bool> {
        self.read(|s| s.visible)
    }

    fn set_visible(&self, visible: bool) -> Result<()> {
        self.write(|s| s.visible = visible)
    }

    fn position(&self) -> Result<Vec3> {
        self.read(|s| s.position)
    }

    fn set_position(&self, position: Vec3) -> Result<()> {
        self.write(|s| s.position = position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_surface_roundtrip() {
        let surface = MemorySurface::new(ActorId::from_raw(1)).with_position(Vec3::X);
        surface.set_opacity(0.4).unwrap();
        surface.set_visible(true).unwrap();

        let snap = surface.snapshot();
        assert_eq!(snap.opacity, 0.4);
        assert!(snap.visible);
        assert_eq!(snap.position, Vec3::X);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let surface = MemorySurface::new(ActorId::from_raw(1));
        surface.set_opacity(1.7).unwrap();
        assert_eq!(surface.opacity().unwrap(), 1.0);
    }

    #[test]
    fn test_destroyed_surface_reports_gone() {
        let actor = ActorId::from_raw(9);
        let surface = MemorySurface::new(actor);
        surface.destroy();

        assert_eq!(surface.opacity(), Err(LifecycleError::ActorGone(actor)));
        assert_eq!(
            surface.set_visible(true),
            Err(LifecycleError::ActorGone(actor))
        );
    }
}
