use crate::assets::{ModelGraph, ModelNode};
use crate::materials::MaterialId;
use crate::particles::ParticleField;
use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh { primitive_count: usize },
    Points(ParticleField),
    /// Inside-out dome rendered with the sky material.
    Sky,
    Camera,
}

/// Which material a node renders with.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialSlot {
    None,
    /// Material that came with the model file, by name.
    Imported(Option<String>),
    /// Material owned by the composer. Once bound a node never reverts to its
    /// imported material.
    Bound(MaterialId),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    material: MaterialSlot,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            material: MaterialSlot::None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = MaterialSlot::Bound(material);
        self
    }

    pub fn material(&self) -> &MaterialSlot {
        &self.material
    }

    pub fn bound_material(&self) -> Option<MaterialId> {
        match self.material {
            MaterialSlot::Bound(id) => Some(id),
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn local_transform(&self) -> Mat4 {
        compose_transform_matrix(self.position, self.rotation, self.scale)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("cannot assign a material to missing node {name:?}")]
    MissingNode { name: String },
}

/// Arena of scene nodes. Handles are never invalidated during a session.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn add(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Attach a loaded model under a new group. Returns the group and the ids
    /// of the model's direct children, index-aligned with `model.children`.
    pub fn add_model(&mut self, model: &ModelGraph) -> (NodeId, Vec<NodeId>) {
        let root = self.add(Node::new(&model.source, NodeKind::Group), None);
        let children = model
            .children
            .iter()
            .map(|child| self.add_model_node(child, root))
            .collect();
        (root, children)
    }

    fn add_model_node(&mut self, source: &ModelNode, parent: NodeId) -> NodeId {
        let (kind, material) = match &source.mesh {
            Some(mesh) => (
                NodeKind::Mesh {
                    primitive_count: mesh.primitive_count,
                },
                MaterialSlot::Imported(mesh.material.clone()),
            ),
            None => (NodeKind::Group, MaterialSlot::None),
        };
        let mut node = Node::new(&source.name, kind);
        node.position = Vec3::from(source.translation);
        node.rotation = Quat::from_array(source.rotation);
        node.scale = Vec3::from(source.scale);
        node.material = material;
        let id = self.add(node, Some(parent));
        for child in &source.children {
            self.add_model_node(child, id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Overwrite the material of `node`. An absent handle is an error, never
    /// a silent skip.
    pub fn assign_material(
        &mut self,
        node: Option<NodeId>,
        name: &str,
        material: MaterialId,
    ) -> Result<(), SceneError> {
        let id = node.ok_or_else(|| SceneError::MissingNode {
            name: name.to_string(),
        })?;
        self.nodes[id.0].material = MaterialSlot::Bound(material);
        Ok(())
    }

    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let node = self.node(id);
        let local = node.local_transform();
        match node.parent {
            Some(parent) => self.world_transform(parent) * local,
            None => local,
        }
    }

    /// Depth-first walk from every root, parents before children.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }
}

pub fn compose_transform_matrix(position: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelNode;
    use crate::materials::{MaterialDescriptor, MaterialSet};

    fn portal_model() -> ModelGraph {
        let mut baked = ModelNode::mesh("baked", Some("bakedImported"));
        baked.translation = [0.0, 1.0, 0.0];
        baked.children.push(ModelNode::mesh("inner", None));
        ModelGraph::new(
            "baked-portal.glb",
            vec![baked, ModelNode::mesh("Circle", Some("portalImported"))],
        )
    }

    #[test]
    fn model_children_keep_their_order_and_imported_materials() {
        let mut scene = SceneGraph::new();
        let (root, children) = scene.add_model(&portal_model());
        assert_eq!(children.len(), 2);
        assert_eq!(scene.node(children[0]).name, "baked");
        assert_eq!(scene.node(children[0]).parent(), Some(root));
        assert_eq!(
            scene.node(children[1]).material(),
            &MaterialSlot::Imported(Some("portalImported".to_string()))
        );
        // root group + 2 children + 1 grandchild
        assert_eq!(scene.len(), 4);
    }

    #[test]
    fn assigned_material_replaces_the_imported_one() {
        let mut materials = MaterialSet::new();
        let first = materials.add(MaterialDescriptor::flat("first"));
        let second = materials.add(MaterialDescriptor::flat("second"));

        let mut scene = SceneGraph::new();
        let (_, children) = scene.add_model(&portal_model());
        let circle = children.get(1).copied();
        scene.assign_material(circle, "Circle", first).unwrap();
        assert_eq!(scene.node(circle.unwrap()).bound_material(), Some(first));

        scene.assign_material(circle, "Circle", second).unwrap();
        assert_eq!(
            scene.node(circle.unwrap()).material(),
            &MaterialSlot::Bound(second)
        );
    }

    #[test]
    fn assigning_to_an_absent_node_fails_loudly() {
        let mut materials = MaterialSet::new();
        let material = materials.add(MaterialDescriptor::flat("m"));
        let mut scene = SceneGraph::new();
        scene.add_model(&portal_model());
        let missing = None;
        assert_eq!(
            scene.assign_material(missing, "rope008", material),
            Err(SceneError::MissingNode {
                name: "rope008".to_string()
            })
        );
    }

    #[test]
    fn world_transform_accumulates_parents() {
        let mut scene = SceneGraph::new();
        let mut parent = Node::new("parent", NodeKind::Group);
        parent.position = Vec3::new(1.0, 0.0, 0.0);
        let parent = scene.add(parent, None);
        let mut child = Node::new("child", NodeKind::Group);
        child.position = Vec3::new(0.0, 2.0, 0.0);
        let child = scene.add(child, Some(parent));

        let origin = scene.world_transform(child).transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn walk_visits_parents_before_children() {
        let mut scene = SceneGraph::new();
        let (root, children) = scene.add_model(&portal_model());
        let order = scene.walk();
        assert_eq!(order[0], root);
        assert_eq!(order[1], children[0]);
        assert_eq!(scene.node(order[2]).name, "inner");
        assert_eq!(order[3], children[1]);
    }
}
