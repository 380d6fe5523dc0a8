mod binder;
mod model;
mod texture;

pub use binder::{AssetBinder, AssetEvent, BoundModel, ModelState, NodeNames, ResolvedNodes};
pub use model::GltfModelLoader;
pub use texture::ImageTextureLoader;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read asset at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to parse glTF {path}: {source}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("glTF {path} has no scene")]
    EmptyModel { path: String },
    #[error("model has no child node named {name:?}")]
    MissingNode { name: String },
    #[error("loader for {label} stopped before reporting a result")]
    Disconnected { label: String },
}

impl AssetError {
    /// A required node was absent. Every other variant is a load failure.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, AssetError::MissingNode { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColorSpace {
    /// Display-referred values, decoded to linear when sampled.
    Srgb,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    pub flip_y: bool,
    pub color_space: ColorSpace,
}

impl TextureOptions {
    /// Baked lightmaps are exported with glTF UV orientation and already
    /// encoded for display.
    pub fn baked() -> Self {
        Self {
            flip_y: false,
            color_space: ColorSpace::Srgb,
        }
    }
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_y: true,
            color_space: ColorSpace::Linear,
        }
    }
}

/// Decoded RGBA8 pixels plus the sampling options they were loaded with.
#[derive(Clone, PartialEq)]
pub struct TextureImage {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub options: TextureOptions,
}

impl std::fmt::Debug for TextureImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureImage")
            .field("label", &self.label)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .field("options", &self.options)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub primitive_count: usize,
    pub material: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub name: String,
    pub mesh: Option<MeshInfo>,
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mesh: None,
            translation: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
            children: Vec::new(),
        }
    }

    pub fn mesh(name: &str, material: Option<&str>) -> Self {
        Self {
            mesh: Some(MeshInfo {
                primitive_count: 1,
                material: material.map(str::to_string),
            }),
            ..Self::named(name)
        }
    }
}

/// Node hierarchy of a loaded model. `children` are the root nodes of the
/// model's scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGraph {
    pub source: String,
    pub children: Vec<ModelNode>,
}

impl ModelGraph {
    pub fn new(source: impl Into<String>, children: Vec<ModelNode>) -> Self {
        Self {
            source: source.into(),
            children,
        }
    }

    /// Exact-name lookup among the direct children, first match wins.
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|child| child.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&ModelNode> {
        self.child_index(name).map(|index| &self.children[index])
    }
}

pub trait TextureLoader {
    fn load(&self, path: &Path, options: TextureOptions) -> PendingLoad<TextureImage>;
}

pub trait ModelLoader {
    fn load(&self, path: &Path) -> PendingLoad<ModelGraph>;
}

pub enum LoadStatus<T> {
    Pending,
    Ready(T),
    Failed(AssetError),
}

/// Completion signal for an in-flight load. Polled from the main thread.
pub struct PendingLoad<T> {
    label: String,
    receiver: Receiver<Result<T, AssetError>>,
}

/// Sending half of a `PendingLoad`.
pub struct LoadCompleter<T> {
    sender: Sender<Result<T, AssetError>>,
}

impl<T> LoadCompleter<T> {
    pub fn complete(self, result: Result<T, AssetError>) {
        // The receiver may already be gone if the session was torn down.
        let _ = self.sender.send(result);
    }
}

impl<T> PendingLoad<T> {
    pub fn channel(label: impl Into<String>) -> (LoadCompleter<T>, Self) {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        (
            LoadCompleter { sender },
            Self {
                label: label.into(),
                receiver,
            },
        )
    }

    pub fn ready(label: impl Into<String>, result: Result<T, AssetError>) -> Self {
        let (completer, pending) = Self::channel(label);
        completer.complete(result);
        pending
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn poll(&self) -> LoadStatus<T> {
        match self.receiver.try_recv() {
            Ok(Ok(value)) => LoadStatus::Ready(value),
            Ok(Err(err)) => LoadStatus::Failed(err),
            Err(TryRecvError::Empty) => LoadStatus::Pending,
            Err(TryRecvError::Disconnected) => LoadStatus::Failed(AssetError::Disconnected {
                label: self.label.clone(),
            }),
        }
    }
}

impl<T: Send + 'static> PendingLoad<T> {
    /// Run `job` on a worker thread and report through the returned handle.
    pub fn spawn<F>(label: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> Result<T, AssetError> + Send + 'static,
    {
        let (completer, pending) = Self::channel(label);
        let spawned = std::thread::Builder::new()
            .name(format!("load {}", pending.label))
            .spawn(move || completer.complete(job()));
        if let Err(err) = spawned {
            // The completer was dropped with the closure; poll reports Disconnected.
            log::error!("failed to start loader for {}: {}", pending.label, err);
        }
        pending
    }
}
