//! OpenGL enumerants used by the replay engine and the reference backend

// Errors
pub const NO_ERROR: u32 = 0;
pub const INVALID_ENUM: u32 = 0x0500;
pub const INVALID_VALUE: u32 = 0x0501;
pub const INVALID_OPERATION: u32 = 0x0502;
pub const STACK_OVERFLOW: u32 = 0x0503;
pub const STACK_UNDERFLOW: u32 = 0x0504;
pub const OUT_OF_MEMORY: u32 = 0x0505;
pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;
pub const TABLE_TOO_LARGE: u32 = 0x8031;

// Primitive modes
pub const POINTS: u32 = 0x0000;
pub const LINES: u32 = 0x0001;
pub const LINE_LOOP: u32 = 0x0002;
pub const LINE_STRIP: u32 = 0x0003;
pub const TRIANGLES: u32 = 0x0004;
pub const TRIANGLE_STRIP: u32 = 0x0005;
pub const TRIANGLE_FAN: u32 = 0x0006;
pub const QUADS: u32 = 0x0007;
pub const QUAD_STRIP: u32 = 0x0008;
pub const POLYGON: u32 = 0x0009;

// Clear bits
pub const DEPTH_BUFFER_BIT: u32 = 0x0000_0100;
pub const ACCUM_BUFFER_BIT: u32 = 0x0000_0200;
pub const STENCIL_BUFFER_BIT: u32 = 0x0000_0400;
pub const COLOR_BUFFER_BIT: u32 = 0x0000_4000;

// Matrix modes
pub const MODELVIEW: u32 = 0x1700;
pub const PROJECTION: u32 = 0x1701;
pub const TEXTURE: u32 = 0x1702;

// Depth functions
pub const NEVER: u32 = 0x0200;
pub const LESS: u32 = 0x0201;
pub const LEQUAL: u32 = 0x0203;
pub const ALWAYS: u32 = 0x0207;

// Shading
pub const FLAT: u32 = 0x1D00;
pub const SMOOTH: u32 = 0x1D01;

// Capabilities
pub const DEPTH_TEST: u32 = 0x0B71;
pub const BLEND: u32 = 0x0BE2;
pub const CULL_FACE: u32 = 0x0B44;

// Display lists
pub const COMPILE: u32 = 0x1300;
pub const COMPILE_AND_EXECUTE: u32 = 0x1301;

// Data types
pub const BYTE: u32 = 0x1400;
pub const UNSIGNED_BYTE: u32 = 0x1401;
pub const SHORT: u32 = 0x1402;
pub const UNSIGNED_SHORT: u32 = 0x1403;
pub const INT: u32 = 0x1404;
pub const UNSIGNED_INT: u32 = 0x1405;
pub const FLOAT: u32 = 0x1406;
pub const DOUBLE: u32 = 0x140A;

// Client arrays
pub const VERTEX_ARRAY: u32 = 0x8074;
pub const NORMAL_ARRAY: u32 = 0x8075;
pub const COLOR_ARRAY: u32 = 0x8076;
pub const INDEX_ARRAY: u32 = 0x8077;
pub const TEXTURE_COORD_ARRAY: u32 = 0x8078;
pub const EDGE_FLAG_ARRAY: u32 = 0x8079;
pub const FOG_COORD_ARRAY: u32 = 0x8457;
pub const SECONDARY_COLOR_ARRAY: u32 = 0x845E;

// Buffer objects
pub const ARRAY_BUFFER: u32 = 0x8892;
pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;
pub const ARRAY_BUFFER_BINDING: u32 = 0x8894;
pub const ELEMENT_ARRAY_BUFFER_BINDING: u32 = 0x8895;
pub const STREAM_DRAW: u32 = 0x88E0;
pub const STATIC_DRAW: u32 = 0x88E4;
pub const DYNAMIC_DRAW: u32 = 0x88E8;

// Textures
pub const TEXTURE_1D: u32 = 0x0DE0;
pub const TEXTURE_2D: u32 = 0x0DE1;
pub const TEXTURE_BINDING_2D: u32 = 0x8069;

// Queries
pub const MATRIX_MODE: u32 = 0x0BA0;
pub const MODELVIEW_STACK_DEPTH: u32 = 0x0BA3;
pub const PROJECTION_STACK_DEPTH: u32 = 0x0BA4;
pub const MAX_VERTEX_ATTRIBS: u32 = 0x8869;

/// GL name of an error code, if it is one of the standard errors.
pub fn error_name(code: u32) -> Option<&'static str> {
    match code {
        NO_ERROR => Some("GL_NO_ERROR"),
        INVALID_ENUM => Some("GL_INVALID_ENUM"),
        INVALID_VALUE => Some("GL_INVALID_VALUE"),
        INVALID_OPERATION => Some("GL_INVALID_OPERATION"),
        STACK_OVERFLOW => Some("GL_STACK_OVERFLOW"),
        STACK_UNDERFLOW => Some("GL_STACK_UNDERFLOW"),
        OUT_OF_MEMORY => Some("GL_OUT_OF_MEMORY"),
        INVALID_FRAMEBUFFER_OPERATION => Some("GL_INVALID_FRAMEBUFFER_OPERATION"),
        TABLE_TOO_LARGE => Some("GL_TABLE_TOO_LARGE"),
        _ => None,
    }
}

/// Whether `mode` is a valid primitive mode for `glBegin` and draw calls.
pub fn is_primitive_mode(mode: u32) -> bool {
    mode <= POLYGON
}
