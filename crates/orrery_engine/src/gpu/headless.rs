//! In-memory graphics context
//!
//! `HeadlessContext` implements [`GraphicsContext`] without a device. Programs
//! are "compiled" by extracting their GLSL interface, so uniform and attribute
//! lookups behave like a driver's: names the shaders don't declare have no
//! location. Bound state is tracked exactly as an immediate-mode API would,
//! and every call is appended to a command log that tests and tools can
//! inspect.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{
    AttributeLocation, BlendFactor, BufferId, Capability, ClearFlags, DrawStyle, FramebufferId,
    GpuError, GpuResult, GpuValue, GraphicsContext, PolygonMode, ProgramId, ShaderInterface,
    TextureDescriptor, TextureFormat, TextureId, UniformLocation, VertexArrayId,
};

/// Largest texture or framebuffer edge the context accepts
pub const MAX_TEXTURE_SIZE: u32 = 16384;

/// A recorded draw with the state it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Bound framebuffer, `None` for the default target
    pub framebuffer: Option<FramebufferId>,
    /// Current program
    pub program: Option<ProgramId>,
    /// Bound vertex array
    pub vertex_array: Option<VertexArrayId>,
    /// Primitive topology
    pub style: DrawStyle,
    /// First vertex
    pub first: u32,
    /// Vertex count
    pub count: u32,
}

/// One recorded context call
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    /// Capability enabled
    Enable(Capability),
    /// Capability disabled
    Disable(Capability),
    /// Clear color changed
    ClearColor([f32; 4]),
    /// Buffers cleared on a framebuffer
    Clear {
        /// Target framebuffer
        framebuffer: Option<FramebufferId>,
        /// Cleared buffers
        flags: ClearFlags,
    },
    /// Viewport changed
    Viewport {
        /// Origin x
        x: i32,
        /// Origin y
        y: i32,
        /// Width
        width: u32,
        /// Height
        height: u32,
    },
    /// Blend factors changed
    BlendFunc(BlendFactor, BlendFactor),
    /// Fill mode changed
    PolygonMode(PolygonMode),
    /// Line width changed
    LineWidth(f32),
    /// Program made current
    UseProgram(ProgramId),
    /// Uniform written on the current program
    SetUniform {
        /// Program receiving the value
        program: ProgramId,
        /// Uniform name as declared (flattened for struct members)
        name: String,
        /// Value written
        value: GpuValue,
    },
    /// Vertex array bound or unbound
    BindVertexArray(Option<VertexArrayId>),
    /// Texture bound to a unit
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Texture
        texture: TextureId,
    },
    /// Framebuffer bound
    BindFramebuffer(Option<FramebufferId>),
    /// Draw issued
    Draw(DrawCall),
}

#[derive(Debug)]
struct ProgramRecord {
    interface: ShaderInterface,
    values: HashMap<u32, GpuValue>,
}

#[derive(Debug, Default)]
struct VertexArrayRecord {
    attributes: BTreeMap<u32, (BufferId, u32)>,
}

#[derive(Debug, Clone, Copy)]
struct FramebufferRecord {
    color: TextureId,
    depth: Option<TextureId>,
}

/// Currently bound state
#[derive(Debug, Clone, PartialEq)]
struct BoundState {
    program: Option<ProgramId>,
    vertex_array: Option<VertexArrayId>,
    framebuffer: Option<FramebufferId>,
    viewport: (i32, i32, u32, u32),
    clear_color: [f32; 4],
    capabilities: BTreeSet<Capability>,
    blend_func: (BlendFactor, BlendFactor),
    polygon_mode: PolygonMode,
    line_width: f32,
    texture_units: BTreeMap<u32, TextureId>,
}

/// Device-free [`GraphicsContext`] that records everything it is asked to do
#[derive(Debug)]
pub struct HeadlessContext {
    surface: (u32, u32),
    next_handle: u32,
    programs: HashMap<ProgramId, ProgramRecord>,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayRecord>,
    buffers: HashMap<BufferId, usize>,
    textures: HashMap<TextureId, TextureDescriptor>,
    framebuffers: HashMap<FramebufferId, FramebufferRecord>,
    state: BoundState,
    commands: Vec<GpuCommand>,
}

impl HeadlessContext {
    /// Create a context whose default framebuffer is `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: (width, height),
            next_handle: 1,
            programs: HashMap::new(),
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            state: BoundState {
                program: None,
                vertex_array: None,
                framebuffer: None,
                viewport: (0, 0, width, height),
                clear_color: [0.0, 0.0, 0.0, 0.0],
                capabilities: BTreeSet::new(),
                blend_func: (BlendFactor::One, BlendFactor::Zero),
                polygon_mode: PolygonMode::Fill,
                line_width: 1.0,
                texture_units: BTreeMap::new(),
            },
            commands: Vec::new(),
        }
    }

    fn allocate_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn record(&mut self, command: GpuCommand) {
        log::trace!("gpu: {:?}", command);
        self.commands.push(command);
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the command log, typically once per frame
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded draw calls in submission order
    pub fn draw_calls(&self) -> Vec<&DrawCall> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                GpuCommand::Draw(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Recorded uniform writes to `program` named `name`, oldest first
    pub fn uniform_writes(&self, program: ProgramId, name: &str) -> Vec<GpuValue> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                GpuCommand::SetUniform { program: p, name: n, value } if *p == program && n == name => {
                    Some(*value)
                }
                _ => None,
            })
            .collect()
    }

    /// Last value written to a uniform of `program`
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<GpuValue> {
        let record = self.programs.get(&program)?;
        let index = record.interface.uniform_index(name)?;
        record.values.get(&u32::try_from(index).ok()?).copied()
    }

    /// Linked interface of a program
    pub fn program_interface(&self, program: ProgramId) -> Option<&ShaderInterface> {
        self.programs.get(&program).map(|record| &record.interface)
    }

    /// Currently bound framebuffer
    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.framebuffer
    }

    /// Currently bound program
    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.program
    }

    /// Current viewport as `(x, y, width, height)`
    pub fn viewport(&self) -> (i32, i32, u32, u32) {
        self.state.viewport
    }

    /// Current clear color
    pub fn clear_color(&self) -> [f32; 4] {
        self.state.clear_color
    }

    /// Whether a capability is enabled
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.capabilities.contains(&capability)
    }

    /// Current blend factors
    pub fn blend_func(&self) -> (BlendFactor, BlendFactor) {
        self.state.blend_func
    }

    /// Current polygon mode
    pub fn polygon_mode(&self) -> PolygonMode {
        self.state.polygon_mode
    }

    /// Current line width
    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    /// Texture bound to `unit`
    pub fn bound_texture(&self, unit: u32) -> Option<TextureId> {
        self.state.texture_units.get(&unit).copied()
    }

    /// Attribute slots of a vertex array as `(location, buffer, components)`
    pub fn vertex_array_attributes(&self, vertex_array: VertexArrayId) -> Vec<(u32, BufferId, u32)> {
        self.vertex_arrays
            .get(&vertex_array)
            .map(|record| {
                record
                    .attributes
                    .iter()
                    .map(|(location, (buffer, components))| (*location, *buffer, *components))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of live resources of every kind, for leak checks
    pub fn live_resources(&self) -> usize {
        self.programs.len()
            + self.vertex_arrays.len()
            + self.buffers.len()
            + self.textures.len()
            + self.framebuffers.len()
    }

    /// Whether a framebuffer handle is still alive
    pub fn has_framebuffer(&self, framebuffer: FramebufferId) -> bool {
        self.framebuffers.contains_key(&framebuffer)
    }

    /// Whether a texture handle is still alive
    pub fn has_texture(&self, texture: TextureId) -> bool {
        self.textures.contains_key(&texture)
    }

    /// Whether a program handle is still alive
    pub fn has_program(&self, program: ProgramId) -> bool {
        self.programs.contains_key(&program)
    }
}

impl GraphicsContext for HeadlessContext {
    fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    fn enable(&mut self, capability: Capability) {
        self.state.capabilities.insert(capability);
        self.record(GpuCommand::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.state.capabilities.remove(&capability);
        self.record(GpuCommand::Disable(capability));
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.state.clear_color = color;
        self.record(GpuCommand::ClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) {
        let framebuffer = self.state.framebuffer;
        self.record(GpuCommand::Clear { framebuffer, flags });
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.state.viewport = (x, y, width, height);
        self.record(GpuCommand::Viewport { x, y, width, height });
    }

    fn set_blend_func(&mut self, source: BlendFactor, destination: BlendFactor) {
        self.state.blend_func = (source, destination);
        self.record(GpuCommand::BlendFunc(source, destination));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.state.polygon_mode = mode;
        self.record(GpuCommand::PolygonMode(mode));
    }

    fn set_line_width(&mut self, width: f32) {
        self.state.line_width = width;
        self.record(GpuCommand::LineWidth(width));
    }

    fn create_program(&mut self, vertex_source: &str, fragment_source: &str) -> GpuResult<ProgramId> {
        let interface = ShaderInterface::link(vertex_source, fragment_source)?;
        let program = ProgramId(self.allocate_handle());
        log::debug!(
            "Linked program {:?}: {} uniforms, {} attributes",
            program,
            interface.uniforms.len(),
            interface.attributes.len()
        );
        self.programs.insert(
            program,
            ProgramRecord {
                interface,
                values: HashMap::new(),
            },
        );
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_none() {
            log::warn!("delete_program: unknown program {:?}", program);
        }
        if self.state.program == Some(program) {
            self.state.program = None;
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        if !self.programs.contains_key(&program) {
            log::warn!("use_program: unknown program {:?}", program);
        }
        self.state.program = Some(program);
        self.record(GpuCommand::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let index = self.programs.get(&program)?.interface.uniform_index(name)?;
        u32::try_from(index).ok().map(UniformLocation)
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        let index = self.programs.get(&program)?.interface.attribute_index(name)?;
        u32::try_from(index).ok().map(AttributeLocation)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: GpuValue) {
        let Some(program) = self.state.program else {
            log::warn!("set_uniform without a current program");
            return;
        };
        let Some(record) = self.programs.get_mut(&program) else {
            log::warn!("set_uniform on released program {:?}", program);
            return;
        };
        let Some((name, _)) = record.interface.uniforms.get(location.0 as usize) else {
            log::warn!("set_uniform: location {} not in program {:?}", location.0, program);
            return;
        };
        let name = name.clone();
        record.values.insert(location.0, value);
        self.record(GpuCommand::SetUniform { program, name, value });
    }

    fn create_vertex_array(&mut self) -> GpuResult<VertexArrayId> {
        let vertex_array = VertexArrayId(self.allocate_handle());
        self.vertex_arrays.insert(vertex_array, VertexArrayRecord::default());
        Ok(vertex_array)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array);
        if self.state.vertex_array == Some(vertex_array) {
            self.state.vertex_array = None;
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.state.vertex_array = vertex_array;
        self.record(GpuCommand::BindVertexArray(vertex_array));
    }

    fn create_buffer(&mut self, data: &[u8]) -> GpuResult<BufferId> {
        let buffer = BufferId(self.allocate_handle());
        self.buffers.insert(buffer, data.len());
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }

    fn vertex_attribute(
        &mut self,
        location: AttributeLocation,
        buffer: BufferId,
        components: u32,
    ) -> GpuResult<()> {
        if !self.buffers.contains_key(&buffer) {
            return Err(GpuError::InvalidHandle { kind: "buffer", id: buffer.0 });
        }
        let vertex_array = self
            .state
            .vertex_array
            .ok_or(GpuError::InvalidHandle { kind: "vertex array", id: 0 })?;
        let record = self
            .vertex_arrays
            .get_mut(&vertex_array)
            .ok_or(GpuError::InvalidHandle { kind: "vertex array", id: vertex_array.0 })?;
        record.attributes.insert(location.0, (buffer, components));
        Ok(())
    }

    fn create_texture(&mut self, descriptor: &TextureDescriptor, pixels: Option<&[u8]>) -> GpuResult<TextureId> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(GpuError::TextureUpload(format!(
                "zero-sized texture {}x{}",
                descriptor.width, descriptor.height
            )));
        }
        if descriptor.width > MAX_TEXTURE_SIZE || descriptor.height > MAX_TEXTURE_SIZE {
            return Err(GpuError::TextureUpload(format!(
                "{}x{} exceeds the maximum texture size {MAX_TEXTURE_SIZE}",
                descriptor.width, descriptor.height
            )));
        }
        if let Some(pixels) = pixels {
            if pixels.len() != descriptor.byte_len() {
                return Err(GpuError::TextureUpload(format!(
                    "expected {} bytes of pixel data, got {}",
                    descriptor.byte_len(),
                    pixels.len()
                )));
            }
        }
        let texture = TextureId(self.allocate_handle());
        self.textures.insert(texture, *descriptor);
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.state.texture_units.retain(|_, bound| *bound != texture);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        if !self.textures.contains_key(&texture) {
            log::warn!("bind_texture: unknown texture {:?}", texture);
        }
        self.state.texture_units.insert(unit, texture);
        self.record(GpuCommand::BindTexture { unit, texture });
    }

    fn create_framebuffer(&mut self, color: TextureId, depth: Option<TextureId>) -> GpuResult<FramebufferId> {
        let color_desc = self
            .textures
            .get(&color)
            .ok_or(GpuError::InvalidHandle { kind: "texture", id: color.0 })?;
        if color_desc.format != TextureFormat::Rgba8 {
            return Err(GpuError::FramebufferIncomplete(
                "color attachment is not color-renderable".into(),
            ));
        }
        if let Some(depth) = depth {
            let depth_desc = self
                .textures
                .get(&depth)
                .ok_or(GpuError::InvalidHandle { kind: "texture", id: depth.0 })?;
            if depth_desc.format != TextureFormat::Depth32F {
                return Err(GpuError::FramebufferIncomplete(
                    "depth attachment is not depth-renderable".into(),
                ));
            }
            if (depth_desc.width, depth_desc.height) != (color_desc.width, color_desc.height) {
                return Err(GpuError::FramebufferIncomplete(
                    "attachment sizes differ".into(),
                ));
            }
        }
        let framebuffer = FramebufferId(self.allocate_handle());
        self.framebuffers.insert(framebuffer, FramebufferRecord { color, depth });
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(record) = self.framebuffers.remove(&framebuffer) {
            log::trace!(
                "Released framebuffer {:?} (color {:?}, depth {:?})",
                framebuffer,
                record.color,
                record.depth
            );
        }
        if self.state.framebuffer == Some(framebuffer) {
            self.state.framebuffer = None;
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        if let Some(id) = framebuffer {
            if !self.framebuffers.contains_key(&id) {
                log::warn!("bind_framebuffer: unknown framebuffer {:?}", id);
            }
        }
        self.state.framebuffer = framebuffer;
        self.record(GpuCommand::BindFramebuffer(framebuffer));
    }

    fn draw_arrays(&mut self, style: DrawStyle, first: u32, count: u32) {
        if self.state.program.is_none() || self.state.vertex_array.is_none() {
            log::warn!("draw_arrays with incomplete bindings: {:?}", self.state);
        }
        let call = DrawCall {
            framebuffer: self.state.framebuffer,
            program: self.state.program,
            vertex_array: self.state.vertex_array,
            style,
            first,
            count,
        };
        self.record(GpuCommand::Draw(call));
    }
}
