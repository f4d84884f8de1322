//! Native GL surface
//!
//! [`GlApi`] is the boundary between the replay engine and whatever executes
//! GL calls: one method per replayable entry point, plus the two queries the
//! engine itself needs (`get_error` for the error observer, `get_integer` for
//! the buffer-binding guard). Native routines return nothing; failures are
//! observed through `get_error`.
//!
//! [`SoftGl`] is the bundled state-tracking implementation.

pub mod consts;
mod soft;

pub use consts::error_name;
pub use soft::{SoftGl, SoftGlStats};

/// Native API routines, one per supported GL entry point.
///
/// Argument types follow the materializer's parameter kinds: `i32` for
/// `GLint`/`GLsizei`, `u32` for enums, bitfields and object names, `isize`
/// for `GLsizeiptr`/`GLintptr`, `usize` for client pointers (replay-time
/// addresses or byte offsets into the bound buffer).
pub trait GlApi {
    // Queries used by the engine
    fn get_error(&mut self) -> u32;
    fn get_integer(&mut self, pname: u32) -> i32;

    // Framebuffer and fixed state
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32);
    fn clear_depth(&mut self, depth: f64);
    fn clear(&mut self, mask: u32);
    fn enable(&mut self, cap: u32);
    fn disable(&mut self, cap: u32);
    fn flush(&mut self);
    fn finish(&mut self);
    fn blend_func(&mut self, sfactor: u32, dfactor: u32);
    fn depth_func(&mut self, func: u32);
    fn shade_model(&mut self, mode: u32);
    fn line_width(&mut self, width: f32);
    fn point_size(&mut self, size: f32);

    // Matrix stack
    fn matrix_mode(&mut self, mode: u32);
    fn load_identity(&mut self);
    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn ortho(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64);
    fn frustum(&mut self, left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64);
    fn translate_f(&mut self, x: f32, y: f32, z: f32);
    fn rotate_f(&mut self, angle: f32, x: f32, y: f32, z: f32);
    fn scale_f(&mut self, x: f32, y: f32, z: f32);
    fn load_matrix_f(&mut self, m: &[f32]);
    fn mult_matrix_f(&mut self, m: &[f32]);

    // Immediate mode
    fn begin(&mut self, mode: u32);
    fn end(&mut self);
    fn vertex_2f(&mut self, x: f32, y: f32);
    fn vertex_3f(&mut self, x: f32, y: f32, z: f32);
    fn vertex_3fv(&mut self, v: &[f32]);
    fn color_3f(&mut self, red: f32, green: f32, blue: f32);
    fn color_4f(&mut self, red: f32, green: f32, blue: f32, alpha: f32);
    fn normal_3f(&mut self, x: f32, y: f32, z: f32);
    fn tex_coord_2f(&mut self, s: f32, t: f32);

    // Vertex arrays
    fn enable_client_state(&mut self, array: u32);
    fn disable_client_state(&mut self, array: u32);
    fn vertex_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize);
    fn color_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize);
    fn tex_coord_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize);
    fn secondary_color_pointer(&mut self, size: i32, ty: u32, stride: i32, pointer: usize);
    fn normal_pointer(&mut self, ty: u32, stride: i32, pointer: usize);
    fn index_pointer(&mut self, ty: u32, stride: i32, pointer: usize);
    fn fog_coord_pointer(&mut self, ty: u32, stride: i32, pointer: usize);
    fn edge_flag_pointer(&mut self, stride: i32, pointer: usize);
    #[allow(clippy::too_many_arguments)]
    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        pointer: usize,
    );
    fn enable_vertex_attrib_array(&mut self, index: u32);
    fn disable_vertex_attrib_array(&mut self, index: u32);

    // Buffer objects
    fn gen_buffers(&mut self, n: i32) -> Vec<u32>;
    fn bind_buffer(&mut self, target: u32, buffer: u32);
    fn buffer_data(&mut self, target: u32, size: isize, data: Option<&[u8]>, usage: u32);
    fn buffer_sub_data(&mut self, target: u32, offset: isize, size: isize, data: Option<&[u8]>);
    fn delete_buffers(&mut self, n: i32, buffers: &[u32]);

    // Textures
    fn gen_textures(&mut self, n: i32) -> Vec<u32>;
    fn bind_texture(&mut self, target: u32, texture: u32);
    fn delete_textures(&mut self, n: i32, textures: &[u32]);
    fn tex_parameter_i(&mut self, target: u32, pname: u32, param: i32);

    // Display lists
    fn new_list(&mut self, list: u32, mode: u32);
    fn end_list(&mut self);
    fn call_list(&mut self, list: u32);

    // Drawing
    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32);
    fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, indices: usize);
    fn draw_range_elements(
        &mut self,
        mode: u32,
        start: u32,
        end: u32,
        count: i32,
        ty: u32,
        indices: usize,
    );
    fn multi_draw_elements(
        &mut self,
        mode: u32,
        counts: &[i32],
        ty: u32,
        indices: &[usize],
        drawcount: i32,
    );
}
