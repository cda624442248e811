//! Scene graph
//!
//! Nodes live in a slotmap arena and form a tree under a root group. Every
//! node has a local [`Transform`]; world matrices are the product of the
//! ancestors' locals. What a node *is* is the closed [`NodeKind`] enum, so
//! the renderer sorts descendants by matching instead of inspecting types.
//!
//! Materials live in a second arena owned by the scene. Meshes refer to them
//! by [`MaterialId`], which lets several meshes share one material and lets
//! the renderer borrow a mesh and its material at the same time.

mod camera;

pub use camera::{Camera, Projection};

use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::config::BindingValidation;
use crate::foundation::math::{Mat4, Mat4Ext, Transform, Vec3};
use crate::geometry::Geometry;
use crate::gpu::GraphicsContext;
use crate::light::Light;
use crate::material::Material;
use crate::render::{Mesh, RenderError, RenderResult};

new_key_type! {
    /// Handle to a scene node
    pub struct NodeId;

    /// Handle to a material in the scene's material arena
    pub struct MaterialId;
}

/// What a scene node carries
#[derive(Debug)]
pub enum NodeKind {
    /// Pure transform node
    Group,
    /// Drawable
    Mesh(Mesh),
    /// Light source
    Light(Light),
    /// Viewpoint
    Camera(Camera),
}

impl NodeKind {
    /// Mesh view
    pub const fn as_mesh(&self) -> Option<&Mesh> {
        match self {
            Self::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Mutable mesh view
    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match self {
            Self::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Light view
    pub const fn as_light(&self) -> Option<&Light> {
        match self {
            Self::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mutable light view
    pub fn as_light_mut(&mut self) -> Option<&mut Light> {
        match self {
            Self::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Camera view
    pub const fn as_camera(&self) -> Option<&Camera> {
        match self {
            Self::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Mutable camera view
    pub fn as_camera_mut(&mut self) -> Option<&mut Camera> {
        match self {
            Self::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Kind name for diagnostics
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Mesh(_) => "mesh",
            Self::Light(_) => "light",
            Self::Camera(_) => "camera",
        }
    }
}

/// One node of the tree
#[derive(Debug)]
pub struct SceneNode {
    /// Transform relative to the parent
    pub transform: Transform,
    /// Node payload
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// Parent node, `None` for the root
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Scene tree plus the materials its meshes use
#[derive(Debug)]
pub struct Scene {
    nodes: SlotMap<NodeId, SceneNode>,
    materials: SlotMap<MaterialId, Material>,
    root: NodeId,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with a root group
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode {
            transform: Transform::identity(),
            kind: NodeKind::Group,
            parent: None,
            children: Vec::new(),
        });
        Self {
            nodes,
            materials: SlotMap::with_key(),
            root,
        }
    }

    /// Root group
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Attach a node under `parent`
    pub fn add_node(&mut self, parent: NodeId, transform: Transform, kind: NodeKind) -> RenderResult<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(RenderError::MissingNode(parent));
        }
        let id = self.nodes.insert(SceneNode {
            transform,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        log::trace!("Added {} node {:?} under {:?}", self.nodes[id].kind.label(), id, parent);
        Ok(id)
    }

    /// Attach a group
    pub fn add_group(&mut self, parent: NodeId, transform: Transform) -> RenderResult<NodeId> {
        self.add_node(parent, transform, NodeKind::Group)
    }

    /// Attach a light
    pub fn add_light(&mut self, parent: NodeId, transform: Transform, light: Light) -> RenderResult<NodeId> {
        self.add_node(parent, transform, NodeKind::Light(light))
    }

    /// Attach a camera
    pub fn add_camera(&mut self, parent: NodeId, transform: Transform, camera: Camera) -> RenderResult<NodeId> {
        self.add_node(parent, transform, NodeKind::Camera(camera))
    }

    /// Build a mesh from `geometry` and a material of this scene, and attach it
    ///
    /// The mesh's vertex array is created here, once.
    pub fn add_mesh(
        &mut self,
        ctx: &mut dyn GraphicsContext,
        parent: NodeId,
        transform: Transform,
        geometry: Rc<Geometry>,
        material: MaterialId,
        validation: BindingValidation,
    ) -> RenderResult<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(RenderError::MissingNode(parent));
        }
        let material_ref = self
            .materials
            .get(material)
            .ok_or(RenderError::MissingMaterial(material))?;
        let mesh = Mesh::new(ctx, geometry, material, material_ref, validation)?;
        self.add_node(parent, transform, NodeKind::Mesh(mesh))
    }

    /// Move a material into the arena
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    /// Material by id
    pub fn material(&self, id: MaterialId) -> RenderResult<&Material> {
        self.materials.get(id).ok_or(RenderError::MissingMaterial(id))
    }

    /// Mutable material by id
    pub fn material_mut(&mut self, id: MaterialId) -> RenderResult<&mut Material> {
        self.materials.get_mut(id).ok_or(RenderError::MissingMaterial(id))
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> RenderResult<&SceneNode> {
        self.nodes.get(id).ok_or(RenderError::MissingNode(id))
    }

    /// Mutable node by id
    pub fn node_mut(&mut self, id: NodeId) -> RenderResult<&mut SceneNode> {
        self.nodes.get_mut(id).ok_or(RenderError::MissingNode(id))
    }

    /// Local transform of a node
    pub fn transform_mut(&mut self, id: NodeId) -> RenderResult<&mut Transform> {
        Ok(&mut self.node_mut(id)?.transform)
    }

    /// Mesh node payload
    pub fn mesh(&self, id: NodeId) -> RenderResult<&Mesh> {
        self.node(id)?.kind.as_mesh().ok_or(RenderError::WrongNodeKind { node: id, expected: "mesh" })
    }

    /// Mutable mesh node payload
    pub fn mesh_mut(&mut self, id: NodeId) -> RenderResult<&mut Mesh> {
        self.node_mut(id)?
            .kind
            .as_mesh_mut()
            .ok_or(RenderError::WrongNodeKind { node: id, expected: "mesh" })
    }

    /// A mesh together with its material, borrowed for drawing
    pub fn mesh_and_material_mut(&mut self, id: NodeId) -> RenderResult<(&Mesh, &mut Material)> {
        let mesh = self
            .nodes
            .get(id)
            .ok_or(RenderError::MissingNode(id))?
            .kind
            .as_mesh()
            .ok_or(RenderError::WrongNodeKind { node: id, expected: "mesh" })?;
        let material = self
            .materials
            .get_mut(mesh.material())
            .ok_or(RenderError::MissingMaterial(mesh.material()))?;
        Ok((mesh, material))
    }

    /// Light node payload
    pub fn light(&self, id: NodeId) -> RenderResult<&Light> {
        self.node(id)?.kind.as_light().ok_or(RenderError::WrongNodeKind { node: id, expected: "light" })
    }

    /// Camera node payload
    pub fn camera(&self, id: NodeId) -> RenderResult<&Camera> {
        self.node(id)?.kind.as_camera().ok_or(RenderError::WrongNodeKind { node: id, expected: "camera" })
    }

    /// Mutable camera node payload
    pub fn camera_mut(&mut self, id: NodeId) -> RenderResult<&mut Camera> {
        self.node_mut(id)?
            .kind
            .as_camera_mut()
            .ok_or(RenderError::WrongNodeKind { node: id, expected: "camera" })
    }

    /// Every node in preorder, root first
    pub fn descendant_list(&self) -> Vec<NodeId> {
        self.flatten().into_iter().map(|(id, _)| id).collect()
    }

    /// Every node in preorder with its world matrix, root first
    pub fn flatten(&self) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, Mat4::identity())];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let world = parent_world * node.transform.to_matrix();
            out.push((id, world));
            // Reverse so the first child is visited first
            stack.extend(node.children.iter().rev().map(|child| (*child, world)));
        }
        out
    }

    /// World matrix of a node
    pub fn world_matrix(&self, id: NodeId) -> RenderResult<Mat4> {
        let mut world = self.node(id)?.transform.to_matrix();
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            let node = self.node(parent)?;
            world = node.transform.to_matrix() * world;
            current = node.parent;
        }
        Ok(world)
    }

    /// World position of a node
    pub fn world_position(&self, id: NodeId) -> RenderResult<Vec3> {
        Ok(self.world_matrix(id)?.translation_part())
    }

    /// Release every mesh and material
    pub fn release(self, ctx: &mut dyn GraphicsContext) {
        let mut meshes = 0;
        for (_, node) in self.nodes {
            if let NodeKind::Mesh(mesh) = node.kind {
                mesh.release(ctx);
                meshes += 1;
            }
        }
        let materials = self.materials.len();
        for (_, material) in self.materials {
            material.release(ctx);
        }
        log::debug!("Released scene: {} meshes, {} materials", meshes, materials);
    }
}
