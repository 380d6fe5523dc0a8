use super::{
    AssetError, LoadStatus, ModelGraph, ModelLoader, PendingLoad, TextureImage, TextureLoader,
    TextureOptions,
};
use crate::materials::PortalMaterials;
use crate::scene::{NodeId, SceneError, SceneGraph};
use std::path::Path;

/// Names of the model's direct children that receive scene materials.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeNames {
    pub baked: String,
    pub pole_light_a: String,
    pub pole_light_b: String,
    pub portal_light: String,
}

impl Default for NodeNames {
    fn default() -> Self {
        Self {
            baked: "baked".to_string(),
            pole_light_a: "rope008".to_string(),
            pole_light_b: "base006".to_string(),
            portal_light: "Circle".to_string(),
        }
    }
}

/// Indices into `ModelGraph::children` of the four named nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedNodes {
    pub baked: usize,
    pub pole_light_a: usize,
    pub pole_light_b: usize,
    pub portal_light: usize,
}

impl ResolvedNodes {
    /// Look up every name before anything is touched, so a model missing one
    /// of them is rejected as a whole.
    pub fn resolve(model: &ModelGraph, names: &NodeNames) -> Result<Self, AssetError> {
        let find = |name: &str| {
            model.child_index(name).ok_or_else(|| AssetError::MissingNode {
                name: name.to_string(),
            })
        };
        Ok(Self {
            baked: find(&names.baked)?,
            pole_light_a: find(&names.pole_light_a)?,
            pole_light_b: find(&names.pole_light_b)?,
            portal_light: find(&names.portal_light)?,
        })
    }
}

/// Scene handles of an attached model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundModel {
    pub root: NodeId,
    pub baked: NodeId,
    pub pole_light_a: NodeId,
    pub pole_light_b: NodeId,
    pub portal_light: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelState {
    Idle,
    Pending,
    Bound(BoundModel),
    Failed,
}

#[derive(Debug)]
pub enum AssetEvent {
    TextureReady(TextureImage),
    ModelReady(ModelGraph),
    Failed(AssetError),
}

/// Tracks the baked texture and model loads and binds the model once it
/// arrives.
pub struct AssetBinder {
    names: NodeNames,
    texture: Option<PendingLoad<TextureImage>>,
    model: Option<PendingLoad<ModelGraph>>,
    state: ModelState,
}

impl AssetBinder {
    pub fn new(names: NodeNames) -> Self {
        Self {
            names,
            texture: None,
            model: None,
            state: ModelState::Idle,
        }
    }

    pub fn names(&self) -> &NodeNames {
        &self.names
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// True once no load is in flight.
    pub fn is_settled(&self) -> bool {
        self.texture.is_none() && self.model.is_none()
    }

    /// Start both loads. The texture is requested first.
    pub fn begin(
        &mut self,
        textures: &dyn TextureLoader,
        models: &dyn ModelLoader,
        texture_path: &Path,
        texture_options: TextureOptions,
        model_path: &Path,
    ) {
        if self.state != ModelState::Idle {
            log::warn!("Asset loading already started");
            return;
        }
        self.texture = Some(textures.load(texture_path, texture_options));
        self.model = Some(models.load(model_path));
        self.state = ModelState::Pending;
    }

    /// Collect finished loads. Each load reports exactly once.
    pub fn poll(&mut self) -> Vec<AssetEvent> {
        let mut events = Vec::new();
        if let Some(event) = take_finished(&mut self.texture, AssetEvent::TextureReady) {
            events.push(event);
        }
        if let Some(event) = take_finished(&mut self.model, AssetEvent::ModelReady) {
            if matches!(event, AssetEvent::Failed(_)) {
                self.state = ModelState::Failed;
            }
            events.push(event);
        }
        events
    }

    /// Attach `model` to `scene` and swap in the scene materials. Either all
    /// four nodes are bound or the model is not attached at all.
    pub fn bind_model(
        &mut self,
        model: &ModelGraph,
        scene: &mut SceneGraph,
        materials: &PortalMaterials,
    ) -> Result<BoundModel, AssetError> {
        if let ModelState::Bound(bound) = self.state {
            log::warn!("Model already bound, ignoring {}", model.source);
            return Ok(bound);
        }
        let resolved = match ResolvedNodes::resolve(model, &self.names) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.state = ModelState::Failed;
                return Err(err);
            }
        };

        let (root, children) = scene.add_model(model);
        let bound = BoundModel {
            root,
            baked: children[resolved.baked],
            pole_light_a: children[resolved.pole_light_a],
            pole_light_b: children[resolved.pole_light_b],
            portal_light: children[resolved.portal_light],
        };
        let assignments = [
            (bound.baked, &self.names.baked, materials.baked),
            (bound.pole_light_a, &self.names.pole_light_a, materials.pole_light),
            (bound.pole_light_b, &self.names.pole_light_b, materials.pole_light),
            (bound.portal_light, &self.names.portal_light, materials.portal),
        ];
        for (node, name, material) in assignments {
            scene
                .assign_material(Some(node), name, material)
                .map_err(|SceneError::MissingNode { name }| AssetError::MissingNode { name })?;
        }

        log::info!("Bound model {} ({} nodes)", model.source, scene.len());
        self.state = ModelState::Bound(bound);
        Ok(bound)
    }
}

fn take_finished<T>(
    slot: &mut Option<PendingLoad<T>>,
    ready: fn(T) -> AssetEvent,
) -> Option<AssetEvent> {
    let status = slot.as_ref()?.poll();
    let event = match status {
        LoadStatus::Pending => return None,
        LoadStatus::Ready(value) => ready(value),
        LoadStatus::Failed(err) => {
            log::error!("{}", err);
            AssetEvent::Failed(err)
        }
    };
    *slot = None;
    Some(event)
}
