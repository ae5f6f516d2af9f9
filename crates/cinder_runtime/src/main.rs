//! Cinder Runtime
//!
//! Headless demo host: builds a tiny scene, runs the script scheduler for a few
//! frames and exercises hot reload, cloning and reordering along the way.
//!
//! Usage: `cinder [settings.json]`

mod scripts;

use anyhow::Result;
use cinder_core::{EntityAllocator, FrameClock};
use cinder_script::{CreateArgs, RawAttributes, ScriptSettings, ScriptSystem};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const FRAMES: u64 = 12;
const RELOAD_FRAME: u64 = 5;
const CLONE_FRAME: u64 = 7;
const MOVE_FRAME: u64 = 9;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Cinder v{}", cinder_core::VERSION);

    let settings = match std::env::args().nth(1) {
        Some(path) => ScriptSettings::from_json_file(&path)?,
        None => ScriptSettings::default(),
    };
    tracing::info!(?settings, "script settings loaded");

    let mut system = ScriptSystem::new(settings);
    system.set_preloading(true);
    system.register_type(scripts::spinner()?);
    system.register_type(scripts::spawner()?);
    system.register_type(scripts::faulty()?);
    system.register_type(scripts::follower()?);

    let mut entities = EntityAllocator::new();
    let player = entities.alloc();
    let camera = entities.alloc();

    system.add_component(player, true);
    system.create(player, "spinner", CreateArgs::new().raw_attributes(raw(json!({ "speed": 0.25 }))?))?;
    system.create(player, "spawner", CreateArgs::new().raw_attributes(raw(json!({ "period": 3 }))?))?;
    system.create(player, "faulty", CreateArgs::new())?;
    // no `pulse` type yet: recorded now, created when the type is registered
    let _ = system.create(player, "pulse", CreateArgs::new().enabled(false));

    system.add_component(camera, true);
    system.create(
        camera,
        "follower",
        CreateArgs::new().raw_attributes(raw(json!({ "target": player.to_bits() }))?),
    )?;

    if let Some(component) = system.component_mut(player) {
        component.events_mut().on("error", |event| {
            tracing::info!(%event, "script error observed");
        })?;
        component.events_mut().on("swap:spinner", |event| {
            tracing::info!(%event, "spinner swapped");
        })?;
    }

    tracing::info!("Initializing scripts...");
    system.set_preloading(false);
    system.initialize();
    system.post_initialize();
    system.register_type(scripts::pulse());

    let mut clock = FrameClock::new();
    while clock.frame_count() < FRAMES {
        let dt = clock.advance();
        system.update(dt);
        system.post_update(dt);

        match clock.frame_count() {
            RELOAD_FRAME => {
                system.register_type(scripts::spinner()?);
            }
            CLONE_FRAME => {
                let player_copy = entities.alloc();
                let camera_copy = entities.alloc();
                let cloned = system.clone_subtree(&[(player, player_copy), (camera, camera_copy)]);
                tracing::info!(cloned, "player subtree cloned");
            }
            MOVE_FRAME => {
                if let Some(component) = system.component_mut(player) {
                    component.move_script("faulty", 0);
                    tracing::info!(order = ?component.script_names(), "scripts reordered");
                }
            }
            _ => {}
        }
    }

    if let Some(spinner) = system
        .component(player)
        .and_then(|component| component.get::<scripts::Spinner>("spinner"))
    {
        tracing::info!(angle = spinner.angle, reloads = spinner.generation, "spinner final state");
    }

    let stats = system.stats();
    tracing::info!(
        frames = clock.frame_count(),
        components = stats.components,
        instances = stats.instances,
        update_passes = stats.update_passes,
        update_time = ?stats.update_time,
        "Runtime finished"
    );

    Ok(())
}

fn raw(value: serde_json::Value) -> Result<RawAttributes> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("attributes must be an object, got {other}"),
    }
}
