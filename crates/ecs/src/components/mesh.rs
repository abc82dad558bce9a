use lattice_memory::{
    Accessor, BufferLayout, BufferUse, ComponentType, CompositionType, MemoryError, MemoryManager,
};

use crate::component::{ComponentClass, ComponentCore, MemberSlots};
use crate::error::EcsError;
use crate::impl_component;

/// Tightly packed source data for one vertex attribute.
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute<'a> {
    pub semantic: &'a str,
    pub composition: CompositionType,
    pub data: &'a [f32],
}

/// A set of vertex attributes living in the GPU vertex arena.
#[derive(Debug)]
pub struct Primitive {
    layout: BufferLayout,
    vertex_count: usize,
    attributes: Vec<(String, Accessor)>,
}

impl Primitive {
    /// Reserve one view in the vertex arena and load every attribute into it.
    ///
    /// With [`BufferLayout::Aos`] the attributes interleave inside one
    /// vertex-sized stride; with [`BufferLayout::Soa`] each attribute gets
    /// its own run. All attributes must describe the same vertex count.
    pub fn from_attributes(
        memory: &MemoryManager,
        layout: BufferLayout,
        attributes: &[VertexAttribute<'_>],
    ) -> Result<Self, EcsError> {
        let first = attributes.first().ok_or(MemoryError::EmptyAccessor)?;
        let vertex_count = vertex_count_of(first)?;

        let mut row_size = 0;
        for attribute in attributes {
            let found = vertex_count_of(attribute)?;
            if found != vertex_count {
                return Err(EcsError::VertexCountMismatch {
                    semantic: attribute.semantic.to_string(),
                    expected: vertex_count,
                    found,
                });
            }
            row_size += attribute.composition.number_of_components() * 4;
        }

        let stride = match layout {
            BufferLayout::Aos => row_size,
            BufferLayout::Soa => 0,
        };
        let mut view = memory
            .buffer(BufferUse::GpuVertexData)
            .take_buffer_view(row_size * vertex_count, stride, layout)?
            .with_little_endian(memory.little_endian());

        let mut loaded = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let accessor =
                view.take_accessor(attribute.composition, ComponentType::Float, vertex_count)?;
            accessor.copy_from_typed_array(attribute.data)?;
            loaded.push((attribute.semantic.to_string(), accessor));
        }
        tracing::debug!(
            vertex_count,
            attributes = loaded.len(),
            ?layout,
            "loaded primitive"
        );

        Ok(Self {
            layout,
            vertex_count,
            attributes: loaded,
        })
    }

    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn attribute(&self, semantic: &str) -> Option<&Accessor> {
        self.attributes
            .iter()
            .find(|(name, _)| name == semantic)
            .map(|(_, accessor)| accessor)
    }

    pub fn semantics(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributes.iter().map(|(name, _)| name.as_str())
    }
}

fn vertex_count_of(attribute: &VertexAttribute<'_>) -> Result<usize, MemoryError> {
    let components = attribute.composition.number_of_components();
    if components == 0 || attribute.data.len() % components != 0 {
        return Err(MemoryError::RaggedSource {
            len: attribute.data.len(),
            components,
        });
    }
    Ok(attribute.data.len() / components)
}

/// Geometry attached to an entity.
#[derive(Debug)]
pub struct MeshComponent {
    core: ComponentCore,
    primitives: Vec<Primitive>,
}

impl_component!(MeshComponent);

impl ComponentClass for MeshComponent {
    const NAME: &'static str = "MeshComponent";

    fn construct(core: ComponentCore, _slots: &mut MemberSlots) -> Result<Self, EcsError> {
        Ok(Self {
            core,
            primitives: Vec::new(),
        })
    }
}

impl MeshComponent {
    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(Primitive::vertex_count).sum()
    }
}
