//! Per-tick update: clock, time uniforms, camera controls, render.

use crate::materials::{MaterialId, MaterialSet, UniformValue, U_TIME};
use crate::render::{CameraControls, FrameView, PerspectiveCamera, RenderService};
use crate::scene::SceneGraph;
use std::time::Instant;

/// Seconds since the session started. Never decreases and is never reset.
#[derive(Debug, Clone)]
pub struct TimeCursor {
    start: Instant,
    last: f32,
}

impl Default for TimeCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeCursor {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last: 0.0,
        }
    }

    /// Record an externally measured elapsed time. A sample below the last
    /// one (or NaN) leaves the cursor where it was.
    pub fn sample(&mut self, elapsed_secs: f32) -> f32 {
        if elapsed_secs > self.last {
            self.last = elapsed_secs;
        }
        self.last
    }

    pub fn last(&self) -> f32 {
        self.last
    }
}

/// Borrowed view of everything one tick touches.
pub struct FrameContext<'a, R: RenderService + ?Sized, C: CameraControls + ?Sized> {
    pub scene: &'a SceneGraph,
    pub materials: &'a mut MaterialSet,
    pub time_driven: &'a [MaterialId],
    pub controls: &'a mut C,
    pub camera: &'a mut PerspectiveCamera,
    pub renderer: &'a mut R,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub time: f32,
    pub camera_moved: bool,
    pub rendered: bool,
}

#[derive(Debug, Default)]
pub struct FrameUpdater {
    time: TimeCursor,
    frames: u64,
    failed_frames: u64,
}

impl FrameUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(&self) -> f32 {
        self.time.last()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn failed_frames(&self) -> u64 {
        self.failed_frames
    }

    /// Tick against the wall clock.
    pub fn tick<R, C>(&mut self, ctx: FrameContext<'_, R, C>) -> FrameOutcome
    where
        R: RenderService + ?Sized,
        C: CameraControls + ?Sized,
    {
        let elapsed = self.time.start.elapsed().as_secs_f32();
        self.run_once(elapsed, ctx)
    }

    /// One tick with an explicit elapsed time. The host schedules the next.
    pub fn run_once<R, C>(&mut self, elapsed_secs: f32, ctx: FrameContext<'_, R, C>) -> FrameOutcome
    where
        R: RenderService + ?Sized,
        C: CameraControls + ?Sized,
    {
        let time = self.time.sample(elapsed_secs);

        for id in ctx.time_driven {
            let material = ctx.materials.get_mut(*id);
            if let Err(err) = material.set_uniform(U_TIME, UniformValue::Float(time)) {
                log::warn!("{}", err);
            }
        }

        let camera_moved = ctx.controls.update(ctx.camera);

        let view = FrameView {
            scene: ctx.scene,
            materials: ctx.materials,
            camera: ctx.camera,
        };
        let rendered = match ctx.renderer.render(&view) {
            Ok(()) => true,
            Err(err) => {
                self.failed_frames += 1;
                log::error!("Frame {} failed: {}", self.frames, err);
                false
            }
        };
        self.frames += 1;

        FrameOutcome {
            time,
            camera_moved,
            rendered,
        }
    }
}
