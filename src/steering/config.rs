use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use super::params::SteeringParams;

pub const INITIAL_CONFIG_PATH: &str = "assets/initial_config.ron";
pub const PROFILES_ASSET_PATH: &str = "agents.profiles.ron";

/// Static configuration read once at startup: tick rate, seed and the sizes
/// of the shared grids. Changing these mid-run would break replay
/// determinism, so they are not hot-reloaded.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InitialConfig {
    pub tick_rate: f64,
    pub rng_seed: u64,

    // Flow field
    pub flow_width: usize,
    pub flow_height: usize,
    pub flow_cell_size: f32,
    pub flow_detection_radius: f32,
    /// Wall-clock seconds between regenerations.
    pub flow_regen_interval_secs: f32,
    /// Grid center used when no `FlowFieldAnchor` exists.
    pub flow_origin: Vec2,

    // Neighbor lookup
    pub world_size: f32,
    pub spatial_cell_size: f32,
    pub neighbor_query_radius: f32,

    /// Window of the heading smoother given to newly spawned agents.
    pub heading_samples: usize,
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            rng_seed: 0x5eed,
            flow_width: 64,
            flow_height: 64,
            flow_cell_size: 1.0,
            flow_detection_radius: 1.5,
            flow_regen_interval_secs: 1.0,
            flow_origin: Vec2::ZERO,
            world_size: 256.0,
            spatial_cell_size: 4.0,
            neighbor_query_radius: 5.0,
            heading_samples: 5,
        }
    }
}

/// Read and parse an [`InitialConfig`] from a RON file.
pub fn load_initial_config(path: impl AsRef<Path>) -> Result<InitialConfig, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config = ron::from_str::<InitialConfig>(&contents)?;
    Ok(config)
}

/// Startup system: insert the [`InitialConfig`] resource unless one was
/// provided up front.
pub(crate) fn load_initial_config_system(mut commands: Commands, existing: Option<Res<InitialConfig>>) {
    if existing.is_some() {
        info!("[CONFIG] Using InitialConfig provided by the app");
        return;
    }

    match load_initial_config(INITIAL_CONFIG_PATH) {
        Ok(config) => {
            info!("[CONFIG] Loaded initial config from {}", INITIAL_CONFIG_PATH);
            commands.insert_resource(config);
        }
        Err(e) => {
            error!("[CONFIG] Failed to load {}: {}", INITIAL_CONFIG_PATH, e);
            error!("[CONFIG] Using default InitialConfig");
            commands.insert_resource(InitialConfig::default());
        }
    }
}

/// Named sets of behavior tunables, hot-reloadable.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug, Default)]
pub struct SteeringProfiles {
    pub profiles: FxHashMap<String, SteeringParams>,
}

impl SteeringProfiles {
    pub fn get(&self, name: &str) -> Option<&SteeringParams> {
        self.profiles.get(name)
    }
}

#[derive(Resource)]
pub struct SteeringProfilesHandle(pub Handle<SteeringProfiles>);

/// Name of the profile an agent's [`SteeringParams`] are taken from.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct SteeringProfile(pub String);

/// Loads `agents.profiles.ron` through the asset server and keeps every
/// agent with a [`SteeringProfile`] in sync with it.
///
/// Needs `AssetPlugin`; headless tests that only add `MinimalPlugins` can
/// skip this and insert [`SteeringParams`] directly.
pub struct SteeringProfilesPlugin;

impl Plugin for SteeringProfilesPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RonAssetPlugin::<SteeringProfiles>::new(&["profiles.ron"]))
            .add_systems(Startup, setup_steering_profiles)
            .add_systems(Update, apply_steering_profiles);
    }
}

fn setup_steering_profiles(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load(PROFILES_ASSET_PATH);
    commands.insert_resource(SteeringProfilesHandle(handle));
}

/// Copy profile parameters onto agents when the asset (re)loads or when an
/// agent's profile name is set or changed.
pub fn apply_steering_profiles(
    mut commands: Commands,
    handle: Option<Res<SteeringProfilesHandle>>,
    profiles: Res<Assets<SteeringProfiles>>,
    mut events: MessageReader<AssetEvent<SteeringProfiles>>,
    mut agents: Query<(Entity, Ref<SteeringProfile>, Option<&mut SteeringParams>)>,
) {
    let Some(handle) = handle else {
        events.clear();
        return;
    };

    let mut reloaded = false;
    for event in events.read() {
        if event.is_modified(handle.0.id()) || event.is_loaded_with_dependencies(handle.0.id()) {
            info!("[CONFIG] Steering profiles event: {:?}", event);
            reloaded = true;
        }
    }

    let Some(profiles) = profiles.get(&handle.0) else {
        return;
    };

    for (entity, profile, params) in agents.iter_mut() {
        if !reloaded && !profile.is_changed() {
            continue;
        }
        let Some(source) = profiles.get(&profile.0) else {
            warn!("[CONFIG] Unknown steering profile '{}' on {:?}", profile.0, entity);
            continue;
        };
        match params {
            Some(mut params) => *params = source.clone(),
            None => {
                commands.entity(entity).insert(source.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_initial_config_parses() {
        let config = load_initial_config(INITIAL_CONFIG_PATH).expect("initial_config.ron should parse");
        assert!(config.tick_rate > 0.0);
        assert!(config.flow_width > 0 && config.flow_height > 0);
        assert!(config.flow_regen_interval_secs > 0.0);
    }

    #[test]
    fn test_missing_initial_config_is_an_error() {
        assert!(load_initial_config("assets/does_not_exist.ron").is_err());
    }

    #[test]
    fn test_partial_initial_config_uses_defaults() {
        let config: InitialConfig = ron::from_str("(tick_rate: 60.0)").unwrap();
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.flow_width, InitialConfig::default().flow_width);
    }

    #[test]
    fn test_shipped_profiles_parse() {
        let contents = include_str!("../../assets/agents.profiles.ron");
        let profiles: SteeringProfiles = ron::from_str(contents).expect("profiles should parse");

        for name in ["ship", "enemy", "missile", "miner"] {
            assert!(profiles.get(name).is_some(), "missing profile {name}");
        }

        // Unlisted fields fall back to the defaults.
        let missile = profiles.get("missile").unwrap();
        assert_eq!(missile.stop_radius, SteeringParams::default().stop_radius);
    }
}
