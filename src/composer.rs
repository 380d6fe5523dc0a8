//! The portal scene: materials, fireflies, camera and the baked model, kept
//! in sync with viewport changes, panel edits and the frame clock.

use crate::assets::{
    AssetBinder, AssetError, AssetEvent, ModelLoader, ModelState, TextureLoader, TextureOptions,
};
use crate::config::SceneConfig;
use crate::frame::{FrameContext, FrameOutcome, FrameUpdater};
use crate::materials::sky::SKY_DOME_SCALE;
use crate::materials::{
    build_materials, update_sky, MaterialError, MaterialInputs, MaterialSet, PortalMaterials,
};
use crate::particles::ParticleField;
use crate::render::{CameraControls, PerspectiveCamera, RenderError, RenderService};
use crate::scene::{Node, NodeId, NodeKind, SceneError, SceneGraph};
use crate::tunables::Tunables;
use crate::ui::{BindingTargets, ControlPanel, ControlPanelBinder, EguiPanel};
use crate::viewport::{ViewportController, ViewportMetrics};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

pub struct SceneComposer<R: RenderService, C: CameraControls, P: ControlPanel = EguiPanel> {
    config: SceneConfig,
    tunables: Tunables,
    renderer: R,
    controls: C,
    camera: PerspectiveCamera,
    scene: SceneGraph,
    materials: MaterialSet,
    ids: PortalMaterials,
    fireflies: NodeId,
    camera_node: NodeId,
    sky: Option<NodeId>,
    viewport: ViewportController,
    assets: AssetBinder,
    panel: Option<ControlPanelBinder<P>>,
    updater: FrameUpdater,
}

impl<R: RenderService, C: CameraControls, P: ControlPanel> SceneComposer<R, C, P> {
    /// Build every material and the static part of the scene, then push the
    /// initial viewport and tunables to the renderer. Asset loading starts
    /// separately with [`SceneComposer::begin_loading`].
    pub fn new(
        config: SceneConfig,
        mut renderer: R,
        controls: C,
        metrics: ViewportMetrics,
        panel: Option<P>,
    ) -> Result<Self, ComposeError> {
        let tunables = config.tunables.clamped();
        let mut materials = MaterialSet::new();
        let ids = build_materials(
            &mut materials,
            &MaterialInputs {
                pole_light_color: config.pole_light_color,
                portal_color_start: tunables.portal_color_start,
                portal_color_end: tunables.portal_color_end,
                baked_texture: config.assets.baked_texture.clone(),
                fireflies_size: tunables.fireflies_size,
                device_pixel_ratio: metrics.device_pixel_ratio,
                sky: config.sky_enabled.then_some(tunables.sky),
            },
        );

        let field = match config.firefly_seed {
            Some(seed) => {
                ParticleField::generate_with(config.firefly_count, &mut StdRng::seed_from_u64(seed))
            }
            None => ParticleField::generate(config.firefly_count),
        };
        let mut scene = SceneGraph::new();
        let fireflies = scene.add(
            Node::new("fireflies", NodeKind::Points(field)).with_material(ids.fireflies),
            None,
        );

        let sky = ids.sky.map(|material| {
            let mut dome = Node::new("sky", NodeKind::Sky).with_material(material);
            dome.scale = Vec3::splat(SKY_DOME_SCALE);
            scene.add(dome, None)
        });

        let mut viewport = ViewportController::new(metrics);
        let mut camera = PerspectiveCamera::new(&config.camera, viewport.state().aspect());
        let mut camera_node = Node::new("camera", NodeKind::Camera);
        camera_node.position = camera.position;
        let camera_node = scene.add(camera_node, None);

        viewport.apply(&mut camera, &mut renderer, materials.get_mut(ids.fireflies))?;
        renderer.set_clear_color(tunables.clear_color);
        if let Some(sky) = ids.sky {
            update_sky(&tunables.sky, materials.get_mut(sky), &mut renderer)?;
        }

        let panel =
            panel.map(|panel| ControlPanelBinder::bind(panel, &tunables, config.sky_enabled));
        let assets = AssetBinder::new(config.nodes.clone());

        log::info!(
            "Scene composed: {} materials, {} fireflies, sky {}",
            materials.len(),
            config.firefly_count,
            if sky.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            config,
            tunables,
            renderer,
            controls,
            camera,
            scene,
            materials,
            ids,
            fireflies,
            camera_node,
            sky,
            viewport,
            assets,
            panel,
            updater: FrameUpdater::new(),
        })
    }

    /// Request the baked texture and the model. Both resolve later through
    /// [`SceneComposer::poll_assets`].
    pub fn begin_loading(&mut self, textures: &dyn TextureLoader, models: &dyn ModelLoader) {
        let texture_options = self
            .materials
            .get(self.ids.baked)
            .map
            .as_ref()
            .map(|slot| slot.options)
            .unwrap_or_else(TextureOptions::baked);
        self.assets.begin(
            textures,
            models,
            &self.config.assets.baked_texture,
            texture_options,
            &self.config.assets.model,
        );
    }

    /// Apply whatever loads finished since the last call. Every finished
    /// load is handled; the first failure is returned.
    pub fn poll_assets(&mut self) -> Result<(), ComposeError> {
        if self.assets.is_settled() {
            return Ok(());
        }
        let mut first_error = None;
        for event in self.assets.poll() {
            let result = match event {
                AssetEvent::TextureReady(image) => {
                    log::info!("Baked texture ready ({}x{})", image.width, image.height);
                    if let Some(slot) = self.materials.get_mut(self.ids.baked).map.as_mut() {
                        slot.image = Some(image);
                    }
                    Ok(())
                }
                AssetEvent::ModelReady(model) => self
                    .assets
                    .bind_model(&model, &mut self.scene, &self.ids)
                    .map(|_| ()),
                AssetEvent::Failed(err) => Err(err),
            };
            if let Err(err) = result {
                log::error!("Asset error: {}", err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Host size notification.
    pub fn resize(&mut self, metrics: ViewportMetrics) -> Result<bool, ComposeError> {
        let changed = self.viewport.resize(
            metrics,
            &mut self.camera,
            &mut self.renderer,
            self.materials.get_mut(self.ids.fireflies),
        )?;
        Ok(changed)
    }

    /// Push pending panel edits to their targets.
    pub fn apply_panel_changes(&mut self) -> usize {
        let Some(panel) = self.panel.as_mut() else {
            return 0;
        };
        panel.apply_pending(BindingTargets {
            tunables: &mut self.tunables,
            materials: &mut self.materials,
            ids: &self.ids,
            renderer: &mut self.renderer,
        })
    }

    /// One frame against the wall clock.
    pub fn tick(&mut self) -> FrameOutcome {
        self.apply_panel_changes();
        let time_driven = self.ids.time_driven();
        let outcome = self.updater.tick(FrameContext {
            scene: &self.scene,
            materials: &mut self.materials,
            time_driven: &time_driven,
            controls: &mut self.controls,
            camera: &mut self.camera,
            renderer: &mut self.renderer,
        });
        self.sync_camera_node();
        outcome
    }

    /// One frame at an explicit elapsed time.
    pub fn tick_at(&mut self, elapsed_secs: f32) -> FrameOutcome {
        self.apply_panel_changes();
        let time_driven = self.ids.time_driven();
        let outcome = self.updater.run_once(
            elapsed_secs,
            FrameContext {
                scene: &self.scene,
                materials: &mut self.materials,
                time_driven: &time_driven,
                controls: &mut self.controls,
                camera: &mut self.camera,
                renderer: &mut self.renderer,
            },
        );
        self.sync_camera_node();
        outcome
    }

    fn sync_camera_node(&mut self) {
        self.scene.node_mut(self.camera_node).position = self.camera.position;
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn materials(&self) -> &MaterialSet {
        &self.materials
    }

    pub fn material_ids(&self) -> &PortalMaterials {
        &self.ids
    }

    pub fn fireflies(&self) -> NodeId {
        self.fireflies
    }

    pub fn sky(&self) -> Option<NodeId> {
        self.sky
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut C {
        &mut self.controls
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn model_state(&self) -> &ModelState {
        self.assets.state()
    }

    pub fn panel_mut(&mut self) -> Option<&mut P> {
        self.panel.as_mut().map(|binder| binder.panel_mut())
    }

    pub fn frame_updater(&self) -> &FrameUpdater {
        &self.updater
    }
}
