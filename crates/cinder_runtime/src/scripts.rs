//! Demo scripts driven by the runtime binary.

use anyhow::bail;
use cinder_script::{
    AttributeDef, AttributeError, Capabilities, CreateArgs, Script, ScriptContext, ScriptResult,
    ScriptType,
};

/// Rotates at `speed` turns per second. Keeps its angle across hot reloads.
#[derive(Default)]
pub struct Spinner {
    pub angle: f64,
    pub generation: u32,
}

impl Script for Spinner {
    fn update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> ScriptResult {
        let speed = ctx
            .attributes()
            .and_then(|attributes| attributes.get_number("speed"))
            .unwrap_or(1.0);
        self.angle = (self.angle + speed * dt as f64).fract();
        Ok(())
    }

    fn swap(&mut self, _ctx: &mut ScriptContext<'_>, old: &mut dyn Script) -> ScriptResult {
        if let Some(old) = (*old).as_any().downcast_ref::<Spinner>() {
            self.angle = old.angle;
            self.generation = old.generation + 1;
        }
        tracing::info!(angle = self.angle, generation = self.generation, "spinner reloaded");
        Ok(())
    }
}

pub fn spinner() -> Result<ScriptType, AttributeError> {
    ScriptType::new("spinner", Spinner::default)
        .capabilities(Capabilities::UPDATE | Capabilities::SWAP)
        .attribute(AttributeDef::number("speed").with_default(0.5))
}

/// Adds a `pulse` sibling every `period` frames and removes it on the next one.
#[derive(Default)]
pub struct Spawner {
    frames: u32,
}

impl Script for Spawner {
    fn update(&mut self, ctx: &mut ScriptContext<'_>, _dt: f32) -> ScriptResult {
        self.frames += 1;
        let period = ctx
            .attribute("period")
            .and_then(|value| value.as_number())
            .unwrap_or(4.0) as u32;
        if ctx.has("pulse") {
            ctx.destroy("pulse");
        } else if self.frames % period.max(1) == 0 {
            ctx.create("pulse", CreateArgs::new())?;
        }
        Ok(())
    }
}

pub fn spawner() -> Result<ScriptType, AttributeError> {
    ScriptType::new("spawner", Spawner::default)
        .capabilities(Capabilities::UPDATE)
        .attribute(AttributeDef::number("period").with_default(4.0))
}

pub struct Pulse;

impl Script for Pulse {
    fn initialize(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        tracing::info!(entity = ?ctx.entity(), "pulse");
        Ok(())
    }

    fn update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) -> ScriptResult {
        Ok(())
    }

    fn destroy(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        tracing::info!(entity = ?ctx.entity(), "pulse faded");
        Ok(())
    }
}

pub fn pulse() -> ScriptType {
    ScriptType::new("pulse", || Pulse)
        .capabilities(Capabilities::INITIALIZE | Capabilities::UPDATE | Capabilities::DESTROY)
}

/// Fails on its `fail_on` frame. The scheduler disables it; siblings keep running.
#[derive(Default)]
pub struct Faulty {
    frames: u32,
}

impl Script for Faulty {
    fn update(&mut self, ctx: &mut ScriptContext<'_>, _dt: f32) -> ScriptResult {
        self.frames += 1;
        let fail_on = ctx
            .attribute("fail_on")
            .and_then(|value| value.as_number())
            .unwrap_or(3.0) as u32;
        if self.frames == fail_on {
            bail!("sensor offline after {} frames", self.frames);
        }
        Ok(())
    }
}

pub fn faulty() -> Result<ScriptType, AttributeError> {
    ScriptType::new("faulty", Faulty::default)
        .capabilities(Capabilities::UPDATE)
        .attribute(AttributeDef::number("fail_on").with_default(3.0))
}

/// Logs the entity it follows.
pub struct Follower;

impl Script for Follower {
    fn initialize(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        let target = ctx
            .attributes()
            .and_then(|attributes| attributes.get_entity("target"));
        tracing::info!(entity = ?ctx.entity(), ?target, "follower ready");
        Ok(())
    }
}

pub fn follower() -> Result<ScriptType, AttributeError> {
    ScriptType::new("follower", || Follower)
        .capabilities(Capabilities::INITIALIZE)
        .attribute(AttributeDef::entity("target"))
}
