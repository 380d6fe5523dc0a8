use super::{AssetError, MeshInfo, ModelGraph, ModelLoader, ModelNode, PendingLoad};
use std::path::{Path, PathBuf};

/// Parses `.glb`/`.gltf` documents with the `gltf` crate on a worker thread.
///
/// Only the node hierarchy is extracted; vertex data stays with whatever
/// renderer consumes the file.
#[derive(Debug, Clone, Default)]
pub struct GltfModelLoader {
    base_dir: PathBuf,
}

impl GltfModelLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ModelLoader for GltfModelLoader {
    fn load(&self, path: &Path) -> PendingLoad<ModelGraph> {
        let full_path = self.base_dir.join(path);
        let label = path.display().to_string();
        log::info!("Loading model {}", full_path.display());
        PendingLoad::spawn(label, move || {
            let bytes = std::fs::read(&full_path).map_err(|source| AssetError::Read {
                path: full_path.display().to_string(),
                source,
            })?;
            parse_model(&bytes, &full_path.display().to_string())
        })
    }
}

pub(crate) fn parse_model(bytes: &[u8], label: &str) -> Result<ModelGraph, AssetError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| AssetError::Gltf {
        path: label.to_string(),
        source,
    })?;
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| AssetError::EmptyModel {
            path: label.to_string(),
        })?;
    let children = scene.nodes().map(|node| convert_node(&node)).collect();
    Ok(ModelGraph::new(label, children))
}

fn convert_node(node: &gltf::Node<'_>) -> ModelNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let mesh = node.mesh().map(|mesh| {
        let mut primitive_count = 0;
        let mut material = None;
        for primitive in mesh.primitives() {
            primitive_count += 1;
            if material.is_none() {
                material = primitive.material().name().map(str::to_string);
            }
        }
        MeshInfo {
            primitive_count,
            material,
        }
    });
    ModelNode {
        name: node.name().unwrap_or("").to_string(),
        mesh,
        translation,
        rotation,
        scale,
        children: node.children().map(|child| convert_node(&child)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_model;
    use crate::assets::AssetError;

    const PORTAL_JSON: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0, 1, 2] } ],
        "nodes": [
            { "name": "baked", "translation": [1.0, 2.0, 3.0] },
            { "name": "Circle", "children": [3] },
            { "name": "rope008" },
            { "name": "inner" }
        ]
    }"#;

    #[test]
    fn root_nodes_become_children() {
        let model = parse_model(PORTAL_JSON.as_bytes(), "portal.gltf").unwrap();
        let names: Vec<&str> = model.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["baked", "Circle", "rope008"]);
        assert_eq!(model.children[0].translation, [1.0, 2.0, 3.0]);
        assert_eq!(model.children[1].children[0].name, "inner");
        assert!(model.child("inner").is_none());
    }

    #[test]
    fn scene_without_default_falls_back_to_first() {
        let json = r#"{
            "asset": { "version": "2.0" },
            "scenes": [ { "nodes": [0] } ],
            "nodes": [ { "name": "baked" } ]
        }"#;
        let model = parse_model(json.as_bytes(), "no-default.gltf").unwrap();
        assert_eq!(model.children.len(), 1);
    }

    #[test]
    fn document_without_scenes_is_rejected() {
        let json = r#"{ "asset": { "version": "2.0" } }"#;
        let err = parse_model(json.as_bytes(), "empty.gltf").unwrap_err();
        assert!(matches!(err, AssetError::EmptyModel { .. }));
    }

    #[test]
    fn invalid_bytes_are_a_gltf_error() {
        let err = parse_model(b"{ not json", "broken.glb").unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }
}
