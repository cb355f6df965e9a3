// Binding numbers must match the ones declared in the src/shaders/*.wgsl sources.

///
/// The input locations for the vertex stage
///
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VertexInputIndex {
    /// The transformation matrix
    Matrix = 0,

    /// The vertices to render
    Vertices = 1,

    /// The texture transformation matrix
    TextureMatrix = 2,
}

///
/// The input locations for the fragment stage
///
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FragmentInputIndex {
    /// The texture to render
    Texture = 0,

    /// The eraser texture to render
    EraseTexture = 1,

    /// The clip mask texture to apply to the rendering
    ClipMaskTexture = 2,
}

// Bind group sets. The vertex and fragment namespaces bind in separate sets,
// so a vertex slot and a fragment slot with the same number never alias.
pub const VERTEX_SET: u32 = 0;
pub const FRAGMENT_SET: u32 = 1;
pub const SAMPLER_SET: u32 = 2;

/// The sampler shared by all texture lookups (alone in its set)
pub const DEFAULT_SAMPLER: u32 = 0;

impl VertexInputIndex {
    pub const ALL: [VertexInputIndex; 3] = [
        VertexInputIndex::Matrix,
        VertexInputIndex::Vertices,
        VertexInputIndex::TextureMatrix,
    ];

    /// The binding number for this input within the vertex set
    #[inline]
    pub const fn binding(self) -> u32 {
        self as u32
    }
}

impl FragmentInputIndex {
    pub const ALL: [FragmentInputIndex; 3] = [
        FragmentInputIndex::Texture,
        FragmentInputIndex::EraseTexture,
        FragmentInputIndex::ClipMaskTexture,
    ];

    /// The binding number for this input within the fragment set
    #[inline]
    pub const fn binding(self) -> u32 {
        self as u32
    }
}

impl From<VertexInputIndex> for u32 {
    fn from(index: VertexInputIndex) -> u32 {
        index.binding()
    }
}

impl From<FragmentInputIndex> for u32 {
    fn from(index: FragmentInputIndex) -> u32 {
        index.binding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_bindings_match_the_contract() {
        assert_eq!(VertexInputIndex::Matrix.binding(), 0);
        assert_eq!(VertexInputIndex::Vertices.binding(), 1);
        assert_eq!(VertexInputIndex::TextureMatrix.binding(), 2);
    }

    #[test]
    fn fragment_bindings_match_the_contract() {
        assert_eq!(FragmentInputIndex::Texture.binding(), 0);
        assert_eq!(FragmentInputIndex::EraseTexture.binding(), 1);
        assert_eq!(FragmentInputIndex::ClipMaskTexture.binding(), 2);
    }

    #[test]
    fn vertex_bindings_are_contiguous_from_zero() {
        let mut bindings = VertexInputIndex::ALL.iter().map(|i| i.binding()).collect::<Vec<_>>();
        bindings.sort();
        bindings.dedup();

        assert_eq!(bindings, (0..VertexInputIndex::ALL.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn fragment_bindings_are_contiguous_from_zero() {
        let mut bindings = FragmentInputIndex::ALL.iter().map(|i| i.binding()).collect::<Vec<_>>();
        bindings.sort();
        bindings.dedup();

        assert_eq!(bindings, (0..FragmentInputIndex::ALL.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn namespaces_bind_in_distinct_sets() {
        assert_ne!(VERTEX_SET, FRAGMENT_SET);
        assert_ne!(VERTEX_SET, SAMPLER_SET);
        assert_ne!(FRAGMENT_SET, SAMPLER_SET);
    }

    #[test]
    fn u32_conversion_preserves_values() {
        assert_eq!(u32::from(VertexInputIndex::Vertices), 1);
        assert_eq!(u32::from(FragmentInputIndex::ClipMaskTexture), 2);
    }
}
