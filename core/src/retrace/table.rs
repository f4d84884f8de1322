//! Call table
//!
//! Maps recorded call names to native routines. The GL entries are declared
//! once in [`gl_calls!`], which generates the dense [`CallId`] enum, each
//! call's parameter descriptors and the invocation routine. Policy hooks are
//! attached per entry when the table is built.

use hashbrown::HashMap;

use super::error::MaterializationError;
use super::hooks::{PostHook, PreHook};
use super::materialize::{Arg, FromArg, HandleKind, Param, ParamKind};
use crate::gl::GlApi;

use HandleKind::{Buffer, List, Texture};
use ParamKind::*;

/// Window-system buffer swap entry points. None of them has a native
/// routine here; the swap hook performs the platform's own swap.
pub const SWAP_CALLS: &[&str] = &[
    "glXSwapBuffers",
    "wglSwapBuffers",
    "eglSwapBuffers",
    "CGLFlushDrawable",
];

/// Native return values the dispatcher cares about.
trait IntoGenerated {
    fn into_generated(self) -> Option<Vec<u32>>;
}

impl IntoGenerated for () {
    fn into_generated(self) -> Option<Vec<u32>> {
        None
    }
}

impl IntoGenerated for Vec<u32> {
    fn into_generated(self) -> Option<Vec<u32>> {
        Some(self)
    }
}

fn take<'a, T: FromArg<'a>>(
    call: CallId,
    args: &mut std::slice::Iter<'a, Arg>,
    param: &'static str,
) -> Result<T, MaterializationError> {
    let arg = args.next().ok_or_else(|| MaterializationError::Arity {
        call: call.name().to_string(),
        expected: call.params().len(),
        actual: 0,
    })?;
    T::from_arg(arg).ok_or_else(|| MaterializationError::TypeMismatch {
        call: call.name().to_string(),
        param,
        found: arg.kind_name(),
    })
}

macro_rules! gl_calls {
    (
        $(
            $id:ident => $name:literal => $method:ident(
                $( $param:ident : $kind:expr ),* $(,)?
            ) $( -> $out:ident : $out_kind:expr )?;
        )*
    ) => {
        /// Dense identifier of a supported GL entry point.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CallId {
            $( $id, )*
        }

        impl CallId {
            pub const ALL: &'static [CallId] = &[ $( CallId::$id, )* ];

            /// GL entry point name as recorded in traces.
            pub fn name(self) -> &'static str {
                match self {
                    $( CallId::$id => $name, )*
                }
            }

            /// Parameter descriptors, in recorded argument order.
            pub fn params(self) -> &'static [Param] {
                match self {
                    $(
                        CallId::$id => const {
                            &[
                                $( Param { name: stringify!($param), kind: $kind }, )*
                                $( Param { name: stringify!($out), kind: $out_kind }, )?
                            ]
                        },
                    )*
                }
            }
        }

        /// Invoke the native routine for `id` with materialized arguments.
        ///
        /// Output parameters are not passed; names returned by generator
        /// calls come back as `Some`.
        pub fn invoke(
            id: CallId,
            api: &mut dyn GlApi,
            args: &[Arg],
        ) -> Result<Option<Vec<u32>>, MaterializationError> {
            match id {
                $(
                    CallId::$id => {
                        #[allow(unused_mut)]
                        let mut _args = args.iter();
                        $( let $param = take(id, &mut _args, stringify!($param))?; )*
                        Ok(api.$method( $( $param ),* ).into_generated())
                    }
                )*
            }
        }
    };
}

gl_calls! {
    // Framebuffer and fixed state
    Viewport => "glViewport" => viewport(x: Int, y: Int, width: Int, height: Int);
    Scissor => "glScissor" => scissor(x: Int, y: Int, width: Int, height: Int);
    ClearColor => "glClearColor" => clear_color(red: Float, green: Float, blue: Float, alpha: Float);
    ClearDepth => "glClearDepth" => clear_depth(depth: Double);
    Clear => "glClear" => clear(mask: UInt);
    Enable => "glEnable" => enable(cap: UInt);
    Disable => "glDisable" => disable(cap: UInt);
    Flush => "glFlush" => flush();
    Finish => "glFinish" => finish();
    BlendFunc => "glBlendFunc" => blend_func(sfactor: UInt, dfactor: UInt);
    DepthFunc => "glDepthFunc" => depth_func(func: UInt);
    ShadeModel => "glShadeModel" => shade_model(mode: UInt);
    LineWidth => "glLineWidth" => line_width(width: Float);
    PointSize => "glPointSize" => point_size(size: Float);

    // Matrix stack
    MatrixMode => "glMatrixMode" => matrix_mode(mode: UInt);
    LoadIdentity => "glLoadIdentity" => load_identity();
    PushMatrix => "glPushMatrix" => push_matrix();
    PopMatrix => "glPopMatrix" => pop_matrix();
    Ortho => "glOrtho" => ortho(left: Double, right: Double, bottom: Double, top: Double, near: Double, far: Double);
    Frustum => "glFrustum" => frustum(left: Double, right: Double, bottom: Double, top: Double, near: Double, far: Double);
    Translatef => "glTranslatef" => translate_f(x: Float, y: Float, z: Float);
    Rotatef => "glRotatef" => rotate_f(angle: Float, x: Float, y: Float, z: Float);
    Scalef => "glScalef" => scale_f(x: Float, y: Float, z: Float);
    LoadMatrixf => "glLoadMatrixf" => load_matrix_f(m: FloatArray);
    MultMatrixf => "glMultMatrixf" => mult_matrix_f(m: FloatArray);

    // Immediate mode
    Begin => "glBegin" => begin(mode: UInt);
    End => "glEnd" => end();
    Vertex2f => "glVertex2f" => vertex_2f(x: Float, y: Float);
    Vertex3f => "glVertex3f" => vertex_3f(x: Float, y: Float, z: Float);
    Vertex3fv => "glVertex3fv" => vertex_3fv(v: FloatArray);
    Color3f => "glColor3f" => color_3f(red: Float, green: Float, blue: Float);
    Color4f => "glColor4f" => color_4f(red: Float, green: Float, blue: Float, alpha: Float);
    Normal3f => "glNormal3f" => normal_3f(x: Float, y: Float, z: Float);
    TexCoord2f => "glTexCoord2f" => tex_coord_2f(s: Float, t: Float);

    // Vertex arrays
    EnableClientState => "glEnableClientState" => enable_client_state(array: UInt);
    DisableClientState => "glDisableClientState" => disable_client_state(array: UInt);
    VertexPointer => "glVertexPointer" => vertex_pointer(size: Int, ty: UInt, stride: Int, pointer: ClientPointer);
    ColorPointer => "glColorPointer" => color_pointer(size: Int, ty: UInt, stride: Int, pointer: ClientPointer);
    TexCoordPointer => "glTexCoordPointer" => tex_coord_pointer(size: Int, ty: UInt, stride: Int, pointer: ClientPointer);
    SecondaryColorPointer => "glSecondaryColorPointer" => secondary_color_pointer(size: Int, ty: UInt, stride: Int, pointer: ClientPointer);
    NormalPointer => "glNormalPointer" => normal_pointer(ty: UInt, stride: Int, pointer: ClientPointer);
    IndexPointer => "glIndexPointer" => index_pointer(ty: UInt, stride: Int, pointer: ClientPointer);
    FogCoordPointer => "glFogCoordPointer" => fog_coord_pointer(ty: UInt, stride: Int, pointer: ClientPointer);
    EdgeFlagPointer => "glEdgeFlagPointer" => edge_flag_pointer(stride: Int, pointer: ClientPointer);
    VertexAttribPointer => "glVertexAttribPointer" => vertex_attrib_pointer(index: UInt, size: Int, ty: UInt, normalized: Bool, stride: Int, pointer: ClientPointer);
    EnableVertexAttribArray => "glEnableVertexAttribArray" => enable_vertex_attrib_array(index: UInt);
    DisableVertexAttribArray => "glDisableVertexAttribArray" => disable_vertex_attrib_array(index: UInt);

    // Buffer objects
    GenBuffers => "glGenBuffers" => gen_buffers(n: Int) -> buffers: GenNames(Buffer);
    BindBuffer => "glBindBuffer" => bind_buffer(target: UInt, buffer: Handle(Buffer));
    BufferData => "glBufferData" => buffer_data(target: UInt, size: Size, data: Blob, usage: UInt);
    BufferSubData => "glBufferSubData" => buffer_sub_data(target: UInt, offset: Size, size: Size, data: Blob);
    DeleteBuffers => "glDeleteBuffers" => delete_buffers(n: Int, buffers: Handles(Buffer));

    // Textures
    GenTextures => "glGenTextures" => gen_textures(n: Int) -> textures: GenNames(Texture);
    BindTexture => "glBindTexture" => bind_texture(target: UInt, texture: Handle(Texture));
    DeleteTextures => "glDeleteTextures" => delete_textures(n: Int, textures: Handles(Texture));
    TexParameteri => "glTexParameteri" => tex_parameter_i(target: UInt, pname: UInt, param: Int);

    // Display lists
    NewList => "glNewList" => new_list(list: Handle(List), mode: UInt);
    EndList => "glEndList" => end_list();
    CallList => "glCallList" => call_list(list: Handle(List));

    // Drawing
    DrawArrays => "glDrawArrays" => draw_arrays(mode: UInt, first: Int, count: Int);
    DrawElements => "glDrawElements" => draw_elements(mode: UInt, count: Int, ty: UInt, indices: ClientPointer);
    DrawRangeElements => "glDrawRangeElements" => draw_range_elements(mode: UInt, start: UInt, end: UInt, count: Int, ty: UInt, indices: ClientPointer);
    MultiDrawElements => "glMultiDrawElements" => multi_draw_elements(mode: UInt, counts: IntArray, ty: UInt, indices: PointerArray, drawcount: Int);
}

impl CallId {
    fn hooks(self) -> (Option<PreHook>, Option<PostHook>) {
        match self {
            CallId::DrawArrays
            | CallId::DrawElements
            | CallId::DrawRangeElements
            | CallId::MultiDrawElements => (Some(PreHook::BufferBindingGuard), None),
            CallId::Viewport => (None, Some(PostHook::WindowGrowth)),
            CallId::Begin => (None, Some(PostHook::BeginPrimitive)),
            CallId::End => (Some(PreHook::EndPrimitive), None),
            CallId::Flush => (None, Some(PostHook::FlushBoundary)),
            _ => (None, None),
        }
    }
}

/// What a table entry dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Gl(CallId),
    /// Window-system call handled entirely by its hooks
    WindowSystem,
}

/// One call table entry: the target plus at most one hook on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEntry {
    pub target: Target,
    pub pre: Option<PreHook>,
    pub post: Option<PostHook>,
}

impl CallEntry {
    /// Parameter descriptors; window-system calls take none.
    pub fn params(&self) -> &'static [Param] {
        match self.target {
            Target::Gl(id) => id.params(),
            Target::WindowSystem => &[],
        }
    }
}

/// Name-to-entry lookup built once per dispatcher.
#[derive(Debug, Clone)]
pub struct CallTable {
    entries: HashMap<&'static str, CallEntry>,
}

impl Default for CallTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CallTable {
    pub fn new() -> Self {
        let mut entries = HashMap::with_capacity(CallId::ALL.len() + SWAP_CALLS.len());
        for &id in CallId::ALL {
            let (pre, post) = id.hooks();
            entries.insert(
                id.name(),
                CallEntry {
                    target: Target::Gl(id),
                    pre,
                    post,
                },
            );
        }
        for &name in SWAP_CALLS {
            entries.insert(
                name,
                CallEntry {
                    target: Target::WindowSystem,
                    pre: None,
                    post: Some(PostHook::SwapBoundary),
                },
            );
        }
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&CallEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Supported call names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
