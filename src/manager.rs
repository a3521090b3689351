//! Shared repository of skeleton and animation descriptions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use data::{AnimationData, ArmatureData};

/// Repository of [`ArmatureData`] and [`AnimationData`] keyed by skeleton name.
///
/// A single repository is created by the application, wrapped into an `Arc`
/// and handed to every [`Armature`] it builds. Registered data is immutable:
/// armatures receive `Arc` clones and never write through them.
///
/// [`ArmatureData`]: ../data/struct.ArmatureData.html
/// [`AnimationData`]: ../data/struct.AnimationData.html
/// [`Armature`]: ../armature/struct.Armature.html
#[derive(Debug, Default)]
pub struct DataManager {
    armatures: Mutex<HashMap<String, Arc<ArmatureData>>>,
    animations: Mutex<HashMap<String, Arc<AnimationData>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    // The maps stay consistent even if a holder panicked.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DataManager {
    /// Create an empty repository.
    pub fn new() -> Self {
        DataManager::default()
    }

    /// Registers a skeleton under `name`, replacing any previous entry.
    pub fn add_armature_data<S: Into<String>>(
        &self,
        name: S,
        data: ArmatureData,
    ) -> Arc<ArmatureData> {
        let name = name.into();
        info!("Registering armature data {}", name);
        let data = Arc::new(data);
        lock(&self.armatures).insert(name, data.clone());
        data
    }

    /// Skeleton registered under `name`.
    pub fn armature_data(
        &self,
        name: &str,
    ) -> Option<Arc<ArmatureData>> {
        lock(&self.armatures).get(name).cloned()
    }

    /// Forgets a skeleton. Armatures already built from it keep their copy.
    pub fn remove_armature_data(
        &self,
        name: &str,
    ) -> Option<Arc<ArmatureData>> {
        lock(&self.armatures).remove(name)
    }

    /// Registers the movements of a skeleton under `name`, replacing any
    /// previous entry.
    pub fn add_animation_data<S: Into<String>>(
        &self,
        name: S,
        data: AnimationData,
    ) -> Arc<AnimationData> {
        let name = name.into();
        info!("Registering animation data {}", name);
        let data = Arc::new(data);
        lock(&self.animations).insert(name, data.clone());
        data
    }

    /// Movements registered under `name`.
    pub fn animation_data(
        &self,
        name: &str,
    ) -> Option<Arc<AnimationData>> {
        lock(&self.animations).get(name).cloned()
    }

    /// Forgets the movements of a skeleton.
    pub fn remove_animation_data(
        &self,
        name: &str,
    ) -> Option<Arc<AnimationData>> {
        lock(&self.animations).remove(name)
    }

    /// Registers a skeleton together with its movements, the usual output
    /// of a data reader.
    pub fn add(
        &self,
        armature: ArmatureData,
        animation: AnimationData,
    ) {
        let name = armature.name.clone();
        self.add_armature_data(name.clone(), armature);
        self.add_animation_data(name, animation);
    }
}
