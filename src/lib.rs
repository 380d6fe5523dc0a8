//! Baked portal scene: a lightmapped model, animated portal and firefly
//! shaders, an orbit camera and an optional debug panel, driven by a
//! per-frame update loop.

pub mod app;
pub mod assets;
pub mod color;
pub mod composer;
pub mod config;
pub mod frame;
pub mod materials;
pub mod particles;
pub mod render;
pub mod scene;
pub mod tunables;
pub mod ui;
pub mod viewport;
