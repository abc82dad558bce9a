use serde::{Deserialize, Serialize};

/// Shape of one accessor element. String forms follow glTF accessor `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositionType {
    Unknown,
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    ScalarArray,
    Vec2Array,
    Vec3Array,
    Vec4Array,
    Texture2D,
    TextureCube,
}

impl CompositionType {
    /// Number of numeric components per element. Zero for textures and `Unknown`,
    /// which carry no per-element components.
    pub fn number_of_components(self) -> usize {
        match self {
            Self::Scalar | Self::ScalarArray => 1,
            Self::Vec2 | Self::Vec2Array => 2,
            Self::Vec3 | Self::Vec3Array => 3,
            Self::Vec4 | Self::Vec4Array | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
            Self::Unknown | Self::Texture2D | Self::TextureCube => 0,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::ScalarArray | Self::Vec2Array | Self::Vec3Array | Self::Vec4Array
        )
    }

    pub fn is_texture(self) -> bool {
        matches!(self, Self::Texture2D | Self::TextureCube)
    }

    /// True if elements of this shape can live in an accessor.
    pub fn is_storable(self) -> bool {
        self.number_of_components() > 0
    }

    pub fn as_gltf_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
            Self::ScalarArray => "SCALAR_ARRAY",
            Self::Vec2Array => "VEC2_ARRAY",
            Self::Vec3Array => "VEC3_ARRAY",
            Self::Vec4Array => "VEC4_ARRAY",
            Self::Texture2D => "TEXTURE_2D",
            Self::TextureCube => "TEXTURE_CUBE_MAP",
        }
    }

    /// Look up a composition type by its glTF string.
    ///
    /// Unrecognised strings yield [`CompositionType::Unknown`] with a warning
    /// rather than an error, so importers can pass metadata through unchecked.
    pub fn from_gltf_str(s: &str) -> Self {
        match s {
            "SCALAR" => Self::Scalar,
            "VEC2" => Self::Vec2,
            "VEC3" => Self::Vec3,
            "VEC4" => Self::Vec4,
            "MAT2" => Self::Mat2,
            "MAT3" => Self::Mat3,
            "MAT4" => Self::Mat4,
            "SCALAR_ARRAY" => Self::ScalarArray,
            "VEC2_ARRAY" => Self::Vec2Array,
            "VEC3_ARRAY" => Self::Vec3Array,
            "VEC4_ARRAY" => Self::Vec4Array,
            "TEXTURE_2D" => Self::Texture2D,
            "TEXTURE_CUBE_MAP" => Self::TextureCube,
            other => {
                tracing::warn!(composition = other, "unknown composition type");
                Self::Unknown
            }
        }
    }

    /// Look up the non-array composition with the given component count.
    pub fn from_number_of_components(n: usize) -> Self {
        match n {
            1 => Self::Scalar,
            2 => Self::Vec2,
            3 => Self::Vec3,
            4 => Self::Vec4,
            9 => Self::Mat3,
            16 => Self::Mat4,
            other => {
                tracing::warn!(components = other, "no composition type with this arity");
                Self::Unknown
            }
        }
    }
}

/// Numeric representation of one component. Discriminants are the WebGL /
/// glTF `componentType` enum values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ComponentType {
    Unknown = 5119,
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    Int = 5124,
    UnsignedInt = 5125,
    Float = 5126,
    Double = 5127,
}

impl ComponentType {
    pub fn gl_enum(self) -> u32 {
        self as u32
    }

    /// Look up a component type by its GL enum value.
    ///
    /// Unrecognised values yield [`ComponentType::Unknown`] with a warning.
    pub fn from_gl_enum(value: u32) -> Self {
        match value {
            5120 => Self::Byte,
            5121 => Self::UnsignedByte,
            5122 => Self::Short,
            5123 => Self::UnsignedShort,
            5124 => Self::Int,
            5125 => Self::UnsignedInt,
            5126 => Self::Float,
            5127 => Self::Double,
            other => {
                tracing::warn!(gl_enum = other, "unknown component type");
                Self::Unknown
            }
        }
    }

    /// Width of one component in bytes. Zero for `Unknown`.
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Double => 8,
            Self::Unknown => 0,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::UnsignedByte
                | Self::Short
                | Self::UnsignedShort
                | Self::Int
                | Self::UnsignedInt
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Decode one component from exactly `size_in_bytes()` bytes.
    ///
    /// Every supported representation fits losslessly into an `f64`.
    pub fn decode(self, bytes: &[u8], little_endian: bool) -> f64 {
        macro_rules! get {
            ($t:ty) => {{
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                if little_endian {
                    <$t>::from_le_bytes(raw)
                } else {
                    <$t>::from_be_bytes(raw)
                }
            }};
        }
        match self {
            Self::Byte => f64::from(get!(i8)),
            Self::UnsignedByte => f64::from(get!(u8)),
            Self::Short => f64::from(get!(i16)),
            Self::UnsignedShort => f64::from(get!(u16)),
            Self::Int => f64::from(get!(i32)),
            Self::UnsignedInt => f64::from(get!(u32)),
            Self::Float => f64::from(get!(f32)),
            Self::Double => get!(f64),
            Self::Unknown => 0.0,
        }
    }

    /// Encode `value` into exactly `size_in_bytes()` bytes.
    ///
    /// Integer targets truncate toward zero and saturate at the type's range.
    pub fn encode(self, value: f64, little_endian: bool, out: &mut [u8]) {
        macro_rules! put {
            ($v:expr) => {{
                let v = $v;
                let raw = if little_endian {
                    v.to_le_bytes()
                } else {
                    v.to_be_bytes()
                };
                out.copy_from_slice(&raw);
            }};
        }
        match self {
            Self::Byte => put!(value as i8),
            Self::UnsignedByte => put!(value as u8),
            Self::Short => put!(value as i16),
            Self::UnsignedShort => put!(value as u16),
            Self::Int => put!(value as i32),
            Self::UnsignedInt => put!(value as u32),
            Self::Float => put!(value as f32),
            Self::Double => put!(value),
            Self::Unknown => {}
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Byte => "BYTE",
            Self::UnsignedByte => "UNSIGNED_BYTE",
            Self::Short => "SHORT",
            Self::UnsignedShort => "UNSIGNED_SHORT",
            Self::Int => "INT",
            Self::UnsignedInt => "UNSIGNED_INT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
        }
    }
}

/// Purpose of one of the four arenas owned by the memory manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BufferUse {
    /// Per-instance data the renderer reads back as a square RGBA texture.
    GpuInstanceData,
    /// Vertex attributes produced by importers.
    GpuVertexData,
    /// Uniform-buffer blobs.
    UboGeneric,
    /// CPU-only component data.
    CpuGeneric,
}

impl BufferUse {
    pub const ALL: [BufferUse; 4] = [
        BufferUse::GpuInstanceData,
        BufferUse::GpuVertexData,
        BufferUse::UboGeneric,
        BufferUse::CpuGeneric,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::GpuInstanceData => "GPUInstanceData",
            Self::GpuVertexData => "GPUVertexData",
            Self::UboGeneric => "UBOGeneric",
            Self::CpuGeneric => "CPUGeneric",
        }
    }
}
