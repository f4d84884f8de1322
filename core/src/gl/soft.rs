//! Software GL backend
//!
//! Tracks the GL state a trace manipulates and reports errors the way a
//! driver would, without rasterizing anything. Used by the headless host,
//! as the windowed player's state source, and throughout the tests.

use glam::{Mat4, Vec3, Vec4};
use hashbrown::{HashMap, HashSet};

use super::GlApi;
use super::consts::*;

const MODELVIEW_STACK_MAX: usize = 32;
const PROJECTION_STACK_MAX: usize = 4;
const TEXTURE_STACK_MAX: usize = 4;
const MAX_ATTRIBS: u32 = 16;
/// Largest buffer object store SoftGl will allocate (1 GiB)
const MAX_BUFFER_SIZE: usize = 1 << 30;
/// Most names one glGen* call may request
const MAX_GEN_NAMES: usize = 1 << 20;

/// Counters accumulated while replaying
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftGlStats {
    pub draw_calls: u64,
    pub vertices: u64,
    pub primitives: u64,
    pub clears: u64,
    pub flushes: u64,
    pub finishes: u64,
    pub list_calls: u64,
}

/// Client array or vertex attribute layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayPointer {
    pub size: i32,
    pub ty: u32,
    pub stride: i32,
    /// Address, or byte offset into `buffer` when non-zero
    pub pointer: usize,
    pub buffer: u32,
}

/// State-tracking GL implementation.
///
/// Display lists only record how many commands they hold; commands issued
/// while compiling are applied immediately in both modes.
pub struct SoftGl {
    error: u32,
    inside_begin_end: bool,

    clear_color: [f32; 4],
    clear_depth: f64,
    viewport: [i32; 4],
    scissor: [i32; 4],
    enabled: HashSet<u32>,
    depth_func: u32,
    shade_model: u32,
    blend: (u32, u32),
    line_width: f32,
    point_size: f32,

    matrix_mode: u32,
    modelview: Vec<Mat4>,
    projection: Vec<Mat4>,
    texture: Vec<Mat4>,

    client_states: HashSet<u32>,
    client_arrays: HashMap<u32, ArrayPointer>,
    attrib_arrays: HashMap<u32, ArrayPointer>,
    attribs_enabled: HashSet<u32>,

    next_buffer: u32,
    buffers: HashMap<u32, Vec<u8>>,
    array_buffer: u32,
    element_buffer: u32,

    next_texture: u32,
    textures: HashSet<u32>,
    texture_bindings: HashMap<u32, u32>,

    lists: HashMap<u32, usize>,
    compiling: Option<(u32, usize)>,

    stats: SoftGlStats,
    call_log: Option<Vec<&'static str>>,
}

impl Default for SoftGl {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftGl {
    pub fn new() -> Self {
        Self {
            error: NO_ERROR,
            inside_begin_end: false,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            viewport: [0; 4],
            scissor: [0; 4],
            enabled: HashSet::new(),
            depth_func: LESS,
            shade_model: SMOOTH,
            blend: (1, 0),
            line_width: 1.0,
            point_size: 1.0,
            matrix_mode: MODELVIEW,
            modelview: vec![Mat4::IDENTITY],
            projection: vec![Mat4::IDENTITY],
            texture: vec![Mat4::IDENTITY],
            client_states: HashSet::new(),
            client_arrays: HashMap::new(),
            attrib_arrays: HashMap::new(),
            attribs_enabled: HashSet::new(),
            next_buffer: 1,
            buffers: HashMap::new(),
            array_buffer: 0,
            element_buffer: 0,
            next_texture: 1,
            textures: HashSet::new(),
            texture_bindings: HashMap::new(),
            lists: HashMap::new(),
            compiling: None,
            stats: SoftGlStats::default(),
            call_log: None,
        }
    }

    /// Backend that logs every entry point it receives, by GL name.
    pub fn with_call_log() -> Self {
        Self {
            call_log: Some(Vec::new()),
            ..Self::new()
        }
    }

    /// Entry points received so far (empty unless created with
    /// [`SoftGl::with_call_log`]).
    pub fn call_log(&self) -> &[&'static str] {
        self.call_log.as_deref().unwrap_or(&[])
    }

    pub fn stats(&self) -> SoftGlStats {
        self.stats
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.viewport
    }

    pub fn is_enabled(&self, cap: u32) -> bool {
        self.enabled.contains(&cap)
    }

    pub fn is_client_state_enabled(&self, array: u32) -> bool {
        self.client_states.contains(&array)
    }

    pub fn client_array(&self, array: u32) -> Option<ArrayPointer> {
        self.client_arrays.get(&array).copied()
    }

    pub fn attrib_array(&self, index: u32) -> Option<ArrayPointer> {
        self.attrib_arrays.get(&index).copied()
    }

    pub fn buffer_contents(&self, buffer: u32) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn is_texture(&self, texture: u32) -> bool {
        self.textures.contains(&texture)
    }

    /// Number of commands compiled into `list`, if it exists.
    pub fn list_len(&self, list: u32) -> Option<usize> {
        self.lists.get(&list).copied()
    }

    /// Top of the matrix stack for `mode`.
    pub fn matrix(&self, mode: u32) -> Option<Mat4> {
        let stack = match mode {
            MODELVIEW => &self.modelview,
            PROJECTION => &self.projection,
            TEXTURE => &self.texture,
            _ => return None,
        };
        stack.last().copied()
    }

    fn log(&mut self, name: &'static str) {
        if let Some(log) = self.call_log.as_mut() {
            log.push(name);
        }
    }

    /// First error sticks until read.
    fn set_error(&mut self, code: u32) {
        if self.error == NO_ERROR {
            self.error = code;
        }
    }

    fn compiled(&mut self) {
        if let Some((_, count)) = self.compiling.as_mut() {
            *count += 1;
        }
    }

    /// Common entry for commands not allowed between glBegin and glEnd.
    fn command(&mut self, name: &'static str) -> bool {
        self.log(name);
        if self.inside_begin_end {
            self.set_error(INVALID_OPERATION);
            return false;
        }
        self.compiled();
        true
    }

    /// Entry for commands allowed between glBegin and glEnd.
    fn vertex_command(&mut self, name: &'static str) {
        self.log(name);
        self.compiled();
    }

    fn emit_vertex(&mut self) {
        if self.inside_begin_end {
            self.stats.vertices += 1;
        }
    }

    fn stack_mut(&mut self) -> (&mut Vec<Mat4>, usize) {
        match self.matrix_mode {
            PROJECTION => (&mut self.projection, PROJECTION_STACK_MAX),
            TEXTURE => (&mut self.texture, TEXTURE_STACK_MAX),
            _ => (&mut self.modelview, MODELVIEW_STACK_MAX),
        }
    }

    fn top_mut(&mut self) -> &mut Mat4 {
        let (stack, _) = self.stack_mut();
        if stack.is_empty() {
            stack.push(Mat4::IDENTITY);
        }
        let last = stack.len() - 1;
        &mut stack[last]
    }

    fn multiply(&mut self, m: Mat4) {
        let top = self.top_mut();
        *top *= m;
    }

    fn check_pointer(&mut self, size_ok: bool, ty: u32, stride: i32) -> bool {
        if !size_ok || stride < 0 {
            self.set_error(INVALID_VALUE);
            return false;
        }
        if !is_data_type(ty) {
            self.set_error(INVALID_ENUM);
            return false;
        }
        true
    }

    fn set_client_array(&mut self, array: u32, size: i32, ty: u32, stride: i32, pointer: usize) {
        let buffer = self.array_buffer;
        self.client_arrays.insert(
            array,
            ArrayPointer {
                size,
                ty,
                stride,
                pointer,
                buffer,
            },
        );
    }

    fn bound_buffer(&self, target: u32) -> Option<u32> {
        match target {
            ARRAY_BUFFER => Some(self.array_buffer),
            ELEMENT_ARRAY_BUFFER => Some(self.element_buffer),
            _ => None,
        }
    }

    fn record_draw(&mut self, count: u64) {
        self.stats.draw_calls += 1;
        self.stats.vertices += count;
    }
}

fn is_data_type(ty: u32) -> bool {
    (BYTE..=FLOAT).contains(&ty) || ty == DOUBLE
}

fn is_index_type(ty: u32) -> bool {
    matches!(ty, UNSIGNED_BYTE | UNSIGNED_SHORT | UNSIGNED_INT)
}

fn is_client_array(array: u32) -> bool {
    matches!(
        array,
        VERTEX_ARRAY
            | NORMAL_ARRAY
            | COLOR_ARRAY
            | INDEX_ARRAY
            | TEXTURE_COORD_ARRAY
            | EDGE_FLAG_ARRAY
            | FOG_COORD_ARRAY
            | SECONDARY_COLOR_ARRAY
    )
}

fn is_usage(usage: u32) -> bool {
    (STREAM_DRAW..=DYNAMIC_DRAW + 2).contains(&usage)
}

fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let x = 2.0 * near / (right - left);
    let y = 2.0 * near / (top - bottom);
    let a = (right + left) / (right - left);
    let b = (top + bottom) / (top - bottom);
    let c = -(far + near) / (far - near);
    let d = -2.0 * far * near / (far - near);
    Mat4::from_cols(
        Vec4::new(x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, y, 0.0, 0.0),
        Vec4::new(a, b, c, -1.0),
        Vec4::new(0.0, 0.0, d, 0.0),
    )
}

impl GlApi for SoftGl {
    fn get_error(&mut self) -> u32 {
        self.log("glGetError");
        if self.inside_begin_end {
            self.set_error(INVALID_OPERATION);
            return NO_ERROR;
        }
        std::mem::replace(&mut self.error, NO_ERROR)
    }

    fn get_integer(&mut self, pname: u32) -> i32 {
        self.log("glGetIntegerv");
        if self.inside_begin_end {
            self.set_error(INVALID_OPERATION);
            return 0;
        }
        let value = match pname {
            ARRAY_BUFFER_BINDING => self.array_buffer,
            ELEMENT_ARRAY_BUFFER_BINDING => self.element_buffer,
            TEXTURE_BINDING_2D => self.texture_bindings.get(&TEXTURE_2D).copied().unwrap_or(0),
            MATRIX_MODE => self.matrix_mode,
            MODELVIEW_STACK_DEPTH => self.modelview.len() as u32,
            PROJECTION_STACK_DEPTH => self.projection.len() as u32,
            MAX_VERTEX_ATTRIBS => MAX_ATTRIBS,
            _ => {
                self.set_error(INVALID_ENUM);
                return 0;
            }
        };
        value as i32
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if !self.command("glViewport") {
            return;
        }
        if width < 0 || height < 0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.viewport = [x, y, width, height];
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if !self.command("glScissor") {
            return;
        }
        if width < 0 || height < 0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.scissor = [x, y, width, height];
    }

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        if self.command("glClearColor") {
            self.clear_color = [red, green, blue, alpha].map(|c| c.clamp(0.0, 1.0));
        }
    }

    fn clear_depth(&mut self, depth: f64) {
        if self.command("glClearDepth") {
            self.clear_depth = depth.clamp(0.0, 1.0);
        }
    }

    fn clear(&mut self, mask: u32) {
        if !self.command("glClear") {
            return;
        }
        let valid =
            COLOR_BUFFER_BIT | DEPTH_BUFFER_BIT | STENCIL_BUFFER_BIT | ACCUM_BUFFER_BIT;
        if mask & !valid != 0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.stats.clears += 1;
    }

    fn enable(&mut self, cap: u32) {
        if self.command("glEnable") {
            self.enabled.insert(cap);
        }
    }

    fn disable(&mut self, cap: u32) {
        if self.command("glDisable") {
            self.enabled.remove(&cap);
        }
    }

    fn flush(&mut self) {
        if self.command("glFlush") {
            self.stats.flushes += 1;
        }
    }

    fn finish(&mut self) {
        if self.command("glFinish") {
            self.stats.finishes += 1;
        }
    }

    fn blend_func(&mut self, sfactor: u32, dfactor: u32) {
        if self.command("glBlendFunc") {
            self.blend = (sfactor, dfactor);
        }
    }

    fn depth_func(&mut self, func: u32) {
        if !self.command("glDepthFunc") {
            return;
        }
        if !(NEVER..=ALWAYS).contains(&func) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.depth_func = func;
    }

    fn shade_model(&mut self, mode: u32) {
        if !self.command("glShadeModel") {
            return;
        }
        if mode != FLAT && mode != SMOOTH {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.shade_model = mode;
    }

    fn line_width(&mut self, width: f32) {
        if !self.command("glLineWidth") {
            return;
        }
        if width <= 0.0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.line_width = width;
    }

    fn point_size(&mut self, size: f32) {
        if !self.command("glPointSize") {
            return;
        }
        if size <= 0.0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.point_size = size;
    }

    fn matrix_mode(&mut self, mode: u32) {
        if !self.command("glMatrixMode") {
            return;
        }
        if !matches!(mode, MODELVIEW | PROJECTION | TEXTURE) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.matrix_mode = mode;
    }

    fn load_identity(&mut self) {
        if self.command("glLoadIdentity") {
            *self.top_mut() = Mat4::IDENTITY;
        }
    }

    fn push_matrix(&mut self) {
        if !self.command("glPushMatrix") {
            return;
        }
        let (stack, max) = self.stack_mut();
        if stack.len() >= max {
            self.set_error(STACK_OVERFLOW);
            return;
        }
        let top = stack.last().copied().unwrap_or(Mat4::IDENTITY);
        stack.push(top);
    }

    fn pop_matrix(&mut self) {
        if !self.command("glPopMatrix") {
            return;
        }
        let (stack, _) = self.stack_mut();
        if stack.len() <= 1 {
            self.set_error(STACK_UNDERFLOW);
            return;
        }
        stack.pop();
    }

    fn ortho(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) {
        if !self.command("glOrtho") {
            return;
        }
        if left == right || bottom == top || near == far {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.multiply(Mat4::orthographic_rh_gl(
            left as f32,
            right as f32,
            bottom as f32,
            top as f32,
            near as f32,
            far as f32,
        ));
    }

    fn frustum(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) {
        if !self.command("glFrustum") {
            return;
        }
        if near <= 0.0 || far <= 0.0 || left == right || bottom == top || near == far {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.multiply(frustum(
            left as f32,
            right as f32,
            bottom as f32,
            top as f32,
            near as f32,
            far as f32,
        ));
    }

    fn translate_f(&mut self, x: f32, y: f32, z: f32) {
        if self.command("glTranslatef") {
            self.multiply(Mat4::from_translation(Vec3::new(x, y, z)));
        }
    }

    fn rotate_f(&mut self, angle: f32, x: f32, y: f32, z: f32) {
        if !self.command("glRotatef") {
            return;
        }
        let axis = Vec3::new(x, y, z).normalize_or_zero();
        if axis != Vec3::ZERO {
            self.multiply(Mat4::from_axis_angle(axis, angle.to_radians()));
        }
    }

    fn scale_f(&mut self, x: f32, y: f32, z: f32) {
        if self.command("glScalef") {
            self.multiply(Mat4::from_scale(Vec3::new(x, y, z)));
        }
    }

    fn load_matrix_f(&mut self, m: &[f32]) {
        if !self.command("glLoadMatrixf") {
            return;
        }
        if m.len() < 16 {
            self.set_error(INVALID_VALUE);
            return;
        }
        *self.top_mut() = Mat4::from_cols_slice(&m[..16]);
    }

    fn mult_matrix_f(&mut self, m: &[f32]) {
        if !self.command("glMultMatrixf") {
            return;
        }
        if m.len() < 16 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.multiply(Mat4::from_cols_slice(&m[..16]));
    }

    fn begin(&mut self, mode: u32) {
        if !self.command("glBegin") {
            return;
        }
        if !is_primitive_mode(mode) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.inside_begin_end = true;
    }

    fn end(&mut self) {
        self.log("glEnd");
        if !self.inside_begin_end {
            self.set_error(INVALID_OPERATION);
            return;
        }
        self.inside_begin_end = false;
        self.compiled();
        self.stats.primitives += 1;
    }

    fn vertex_2f(&mut self, _x: f32, _y: f32) {
        self.vertex_command("glVertex2f");
        self.emit_vertex();
    }

    fn vertex_3f(&mut self, _x: f32, _y: f32, _z: f32) {
        self.vertex_command("glVertex3f");
        self.emit_vertex();
    }

    fn vertex_3fv(&mut self, v: &[f32]) {
        self.vertex_command("glVertex3fv");
        if v.len() < 3 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.emit_vertex();
    }

    fn color_3f(&mut self, _red: f32, _green: f32, _blue: f32) {
        self.vertex_command("glColor3f");
    }

    fn color_4f(&mut self, _red: f32, _green: f32, _blue: f32, _alpha: f32) {
        self.vertex_command("glColor4f");
    }

    fn normal_3f(&mut self, _x: f32, _y: f32, _z: f32) {
        self.vertex_command("glNormal3f");
    }

    fn tex_coord_2f(&mut self, _s: f32, _t: f32) {
        self.vertex_command("glTexCoord2f");
    }

    fn enable_client_state(&mut self, array: u32) {
        if !self.command("glEnableClientState") {
            return;
        }
        if !is_client_array(array) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.client_states.insert(array);
    }

    fn disable_client_state(&mut self, array: u32) {
        if !self.command("glDisableClientState") {
            return;
        }
        if !is_client_array(array) {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.client_states.remove(&array);
    }

    fn vertex_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize) {
        if self.command("glVertexPointer")
            && self.check_pointer((2..=4).contains(&size), ty, stride)
        {
            self.set_client_array(VERTEX_ARRAY, size, ty, stride, pointer);
        }
    }

    fn color_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize) {
        if self.command("glColorPointer")
            && self.check_pointer((3..=4).contains(&size), ty, stride)
        {
            self.set_client_array(COLOR_ARRAY, size, ty, stride, pointer);
        }
    }

    fn tex_coord_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize) {
        if self.command("glTexCoordPointer")
            && self.check_pointer((1..=4).contains(&size), ty, stride)
        {
            self.set_client_array(TEXTURE_COORD_ARRAY, size, ty, stride, pointer);
        }
    }

    fn secondary_color_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize) {
        if self.command("glSecondaryColorPointer")
            && self.check_pointer(size == 3, ty, stride)
        {
            self.set_client_array(SECONDARY_COLOR_ARRAY, size, ty, stride, pointer);
        }
    }

    fn normal_pointer(&mut self, ty: u32, stride: i32, pointer: usize) {
        if self.command("glNormalPointer") && self.check_pointer(true, ty, stride) {
            self.set_client_array(NORMAL_ARRAY, 3, ty, stride, pointer);
        }
    }

    fn index_pointer(&mut self, ty: u32, stride: i32, pointer: usize) {
        if self.command("glIndexPointer") && self.check_pointer(true, ty, stride) {
            self.set_client_array(INDEX_ARRAY, 1, ty, stride, pointer);
        }
    }

    fn fog_coord_pointer(&mut self, ty: u32, stride: i32, pointer: usize) {
        if self.command("glFogCoordPointer") && self.check_pointer(true, ty, stride) {
            self.set_client_array(FOG_COORD_ARRAY, 1, ty, stride, pointer);
        }
    }

    fn edge_flag_pointer(&mut self, stride: i32, pointer: usize) {
        if self.command("glEdgeFlagPointer") && self.check_pointer(true, UNSIGNED_BYTE, stride) {
            self.set_client_array(EDGE_FLAG_ARRAY, 1, UNSIGNED_BYTE, stride, pointer);
        }
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        _normalized: bool,
        stride: i32,
        pointer: usize,
    ) {
        if !self.command("glVertexAttribPointer") {
            return;
        }
        if index >= MAX_ATTRIBS {
            self.set_error(INVALID_VALUE);
            return;
        }
        if self.check_pointer((1..=4).contains(&size), ty, stride) {
            let buffer = self.array_buffer;
            self.attrib_arrays.insert(
                index,
                ArrayPointer {
                    size,
                    ty,
                    stride,
                    pointer,
                    buffer,
                },
            );
        }
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        if !self.command("glEnableVertexAttribArray") {
            return;
        }
        if index >= MAX_ATTRIBS {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.attribs_enabled.insert(index);
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        if !self.command("glDisableVertexAttribArray") {
            return;
        }
        if index >= MAX_ATTRIBS {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.attribs_enabled.remove(&index);
    }

    fn gen_buffers(&mut self, n: i32) -> Vec<u32> {
        if !self.command("glGenBuffers") {
            return Vec::new();
        }
        if n < 0 {
            self.set_error(INVALID_VALUE);
            return Vec::new();
        }
        let Some(names) = allocate_names(&mut self.next_buffer, n, |name| {
            self.buffers.contains_key(&name)
        }) else {
            self.set_error(OUT_OF_MEMORY);
            return Vec::new();
        };
        for &name in &names {
            self.buffers.insert(name, Vec::new());
        }
        names
    }

    fn bind_buffer(&mut self, target: u32, buffer: u32) {
        if !self.command("glBindBuffer") {
            return;
        }
        let slot = match target {
            ARRAY_BUFFER => &mut self.array_buffer,
            ELEMENT_ARRAY_BUFFER => &mut self.element_buffer,
            _ => {
                self.set_error(INVALID_ENUM);
                return;
            }
        };
        *slot = buffer;
        if buffer != 0 {
            self.buffers.entry(buffer).or_default();
        }
    }

    fn buffer_data(&mut self, target: u32, size: isize, data: Option<&[u8]>, usage: u32) {
        if !self.command("glBufferData") {
            return;
        }
        let Some(bound) = self.bound_buffer(target) else {
            self.set_error(INVALID_ENUM);
            return;
        };
        if !is_usage(usage) {
            self.set_error(INVALID_ENUM);
            return;
        }
        let Ok(size) = usize::try_from(size) else {
            self.set_error(INVALID_VALUE);
            return;
        };
        if bound == 0 {
            self.set_error(INVALID_OPERATION);
            return;
        }
        let mut contents = Vec::new();
        if size > MAX_BUFFER_SIZE || contents.try_reserve_exact(size).is_err() {
            tracing::warn!("glBufferData: cannot allocate {} bytes", size);
            self.set_error(OUT_OF_MEMORY);
            return;
        }
        contents.resize(size, 0);
        if let Some(data) = data {
            let n = data.len().min(size);
            contents[..n].copy_from_slice(&data[..n]);
        }
        self.buffers.insert(bound, contents);
    }

    fn buffer_sub_data(&mut self, target: u32, offset: isize, size: isize, data: Option<&[u8]>) {
        if !self.command("glBufferSubData") {
            return;
        }
        let Some(bound) = self.bound_buffer(target) else {
            self.set_error(INVALID_ENUM);
            return;
        };
        if bound == 0 {
            self.set_error(INVALID_OPERATION);
            return;
        }
        let (Ok(offset), Ok(size)) = (usize::try_from(offset), usize::try_from(size)) else {
            self.set_error(INVALID_VALUE);
            return;
        };
        let len = self.buffers.get(&bound).map_or(0, Vec::len);
        if offset.checked_add(size).is_none_or(|end| end > len) {
            self.set_error(INVALID_VALUE);
            return;
        }
        if let (Some(data), Some(contents)) = (data, self.buffers.get_mut(&bound)) {
            let n = data.len().min(size);
            contents[offset..offset + n].copy_from_slice(&data[..n]);
        }
    }

    fn delete_buffers(&mut self, n: i32, buffers: &[u32]) {
        if !self.command("glDeleteBuffers") {
            return;
        }
        let Ok(n) = usize::try_from(n) else {
            self.set_error(INVALID_VALUE);
            return;
        };
        for &name in buffers.iter().take(n) {
            if name == 0 {
                continue;
            }
            self.buffers.remove(&name);
            if self.array_buffer == name {
                self.array_buffer = 0;
            }
            if self.element_buffer == name {
                self.element_buffer = 0;
            }
        }
    }

    fn gen_textures(&mut self, n: i32) -> Vec<u32> {
        if !self.command("glGenTextures") {
            return Vec::new();
        }
        if n < 0 {
            self.set_error(INVALID_VALUE);
            return Vec::new();
        }
        let Some(names) = allocate_names(&mut self.next_texture, n, |name| {
            self.textures.contains(&name)
        }) else {
            self.set_error(OUT_OF_MEMORY);
            return Vec::new();
        };
        self.textures.extend(names.iter().copied());
        names
    }

    fn bind_texture(&mut self, target: u32, texture: u32) {
        if !self.command("glBindTexture") {
            return;
        }
        if target != TEXTURE_1D && target != TEXTURE_2D {
            self.set_error(INVALID_ENUM);
            return;
        }
        if texture != 0 {
            self.textures.insert(texture);
        }
        self.texture_bindings.insert(target, texture);
    }

    fn delete_textures(&mut self, n: i32, textures: &[u32]) {
        if !self.command("glDeleteTextures") {
            return;
        }
        let Ok(n) = usize::try_from(n) else {
            self.set_error(INVALID_VALUE);
            return;
        };
        for &name in textures.iter().take(n) {
            if name == 0 {
                continue;
            }
            self.textures.remove(&name);
            for bound in self.texture_bindings.values_mut() {
                if *bound == name {
                    *bound = 0;
                }
            }
        }
    }

    fn tex_parameter_i(&mut self, target: u32, _pname: u32, _param: i32) {
        if !self.command("glTexParameteri") {
            return;
        }
        if target != TEXTURE_1D && target != TEXTURE_2D {
            self.set_error(INVALID_ENUM);
        }
    }

    fn new_list(&mut self, list: u32, mode: u32) {
        self.log("glNewList");
        if self.inside_begin_end || self.compiling.is_some() {
            self.set_error(INVALID_OPERATION);
            return;
        }
        if list == 0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        if mode != COMPILE && mode != COMPILE_AND_EXECUTE {
            self.set_error(INVALID_ENUM);
            return;
        }
        self.compiling = Some((list, 0));
    }

    fn end_list(&mut self) {
        self.log("glEndList");
        if self.inside_begin_end {
            self.set_error(INVALID_OPERATION);
            return;
        }
        match self.compiling.take() {
            Some((list, count)) => {
                self.lists.insert(list, count);
            }
            None => self.set_error(INVALID_OPERATION),
        }
    }

    fn call_list(&mut self, list: u32) {
        self.vertex_command("glCallList");
        if self.lists.contains_key(&list) {
            self.stats.list_calls += 1;
        }
    }

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        if !self.command("glDrawArrays") {
            return;
        }
        if !is_primitive_mode(mode) {
            self.set_error(INVALID_ENUM);
            return;
        }
        if first < 0 || count < 0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.record_draw(count as u64);
    }

    fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, _indices: usize) {
        if !self.command("glDrawElements") {
            return;
        }
        if !is_primitive_mode(mode) || !is_index_type(ty) {
            self.set_error(INVALID_ENUM);
            return;
        }
        if count < 0 {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.record_draw(count as u64);
    }

    fn draw_range_elements(
        &mut self,
        mode: u32,
        start: u32,
        end: u32,
        count: i32,
        ty: u32,
        _indices: usize,
    ) {
        if !self.command("glDrawRangeElements") {
            return;
        }
        if !is_primitive_mode(mode) || !is_index_type(ty) {
            self.set_error(INVALID_ENUM);
            return;
        }
        if count < 0 || end < start {
            self.set_error(INVALID_VALUE);
            return;
        }
        self.record_draw(count as u64);
    }

    fn multi_draw_elements(
        &mut self,
        mode: u32,
        counts: &[i32],
        ty: u32,
        indices: &[usize],
        drawcount: i32,
    ) {
        if !self.command("glMultiDrawElements") {
            return;
        }
        if !is_primitive_mode(mode) || !is_index_type(ty) {
            self.set_error(INVALID_ENUM);
            return;
        }
        let Ok(drawcount) = usize::try_from(drawcount) else {
            self.set_error(INVALID_VALUE);
            return;
        };
        if counts.len() < drawcount || indices.len() < drawcount {
            self.set_error(INVALID_VALUE);
            return;
        }
        if counts[..drawcount].iter().any(|c| *c < 0) {
            self.set_error(INVALID_VALUE);
            return;
        }
        for &count in &counts[..drawcount] {
            self.record_draw(count as u64);
        }
    }
}

/// Hand out `n` unused names counting up from `*next`, skipping names already
/// in use. `None` when the request is too large or the name space runs out;
/// `*next` is only advanced on success.
fn allocate_names(next: &mut u32, n: i32, in_use: impl Fn(u32) -> bool) -> Option<Vec<u32>> {
    let n = usize::try_from(n).ok().filter(|&n| n <= MAX_GEN_NAMES)?;
    let mut names = Vec::with_capacity(n);
    let mut candidate = *next;
    while names.len() < n {
        if candidate == 0 {
            return None;
        }
        if !in_use(candidate) {
            names.push(candidate);
        }
        candidate = candidate.checked_add(1).unwrap_or(0);
    }
    *next = candidate;
    Some(names)
}
