//! Spatial lookup interface

use glam::Vec3;
use parking_lot::RwLock;

/// "Find the nearest object bearing role X near point P"
pub trait SpatialLookup: Send + Sync {
    fn find_nearest(&self, role: &str, near: Vec3) -> Option<Vec3>;
}

/// Lookup over a fixed set of tagged points that can be moved at runtime
#[derive(Debug, Default)]
pub struct StaticLookup {
    entries: RwLock<Vec<(String, Vec3)>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object
    pub fn with(self, role: impl Into<String>, position: Vec3) -> Self {
        self.entries.write().push((role.into(), position));
        self
    }

    /// Move every object with `role` to `position`, adding one if none exist
    pub fn place(&self, role: &str, position: Vec3) {
        let mut entries = self.entries.write();
        let mut moved = false;
        for (entry_role, entry_position) in entries.iter_mut() {
            if entry_role == role {
                *entry_position = position;
                moved = true;
            }
        }
        if !moved {
            entries.push((role.to_string(), position));
        }
    }

    /// Remove every object with `role`
    pub fn remove(&self, role: &str) {
        self.entries.write().retain(|(entry_role, _)| entry_role != role);
    }
}

impl SpatialLookup for StaticLookup {
    fn find_nearest(&self, role: &str, near: Vec3) -> Option<Vec3> {
        self.entries
            .read()
            .iter()
            .filter(|(entry_role, _)| entry_role == role)
            .map(|(_, position)| *position)
            .min_by(|a, b| a.distance_squared(near).total_cmp(&b.distance_squared(near)))
    }
}
