use crate::bindings::VertexInputIndex;

use bytemuck::{Pod, Zeroable};

///
/// A 4x4 transformation matrix, stored in row-major order and applied to column vectors
///
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix(pub [[f32; 4]; 4]);

impl Default for Matrix {
    fn default() -> Matrix {
        Matrix::identity()
    }
}

impl Matrix {
    ///
    /// Returns the identity matrix
    ///
    pub fn identity() -> Matrix {
        Matrix([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    ///
    /// Returns a matrix that translates by the specified amount
    ///
    pub fn translate(dx: f32, dy: f32) -> Matrix {
        Matrix([
            [1.0, 0.0, 0.0, dx],
            [0.0, 1.0, 0.0, dy],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    ///
    /// Returns a matrix that scales by the specified amount
    ///
    pub fn scale(sx: f32, sy: f32) -> Matrix {
        Matrix([
            [sx,  0.0, 0.0, 0.0],
            [0.0, sy,  0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    ///
    /// Computes `self * other`, the matrix that applies `other` before `self`
    ///
    pub fn multiply(self, other: Matrix) -> Matrix {
        let Matrix(a) = self;
        let Matrix(b) = other;
        let mut result = [[0.0; 4]; 4];

        for row in 0..4 {
            for col in 0..4 {
                result[row][col] = (0..4).map(|i| a[row][i] * b[i][col]).sum();
            }
        }

        Matrix(result)
    }

    ///
    /// Applies this matrix to a 2D point
    ///
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let Matrix(m) = self;

        (
            m[0][0]*x + m[0][1]*y + m[0][3],
            m[1][0]*x + m[1][1]*y + m[1][3],
        )
    }

    ///
    /// Flattens this matrix into the column-major layout the shaders expect
    ///
    pub fn to_gpu(&self) -> [f32; 16] {
        let Matrix(m) = self;
        let mut flat = [0.0; 16];

        for col in 0..4 {
            for row in 0..4 {
                flat[col*4 + row] = m[row][col];
            }
        }

        flat
    }
}

impl<Src, Dst> From<euclid::Transform2D<f32, Src, Dst>> for Matrix {
    fn from(t: euclid::Transform2D<f32, Src, Dst>) -> Matrix {
        Matrix([
            [t.m11, t.m21, 0.0, t.m31],
            [t.m12, t.m22, 0.0, t.m32],
            [0.0,   0.0,   1.0, 0.0],
            [0.0,   0.0,   0.0, 1.0],
        ])
    }
}

///
/// The transformation matrix, as bound for the vertex stage
///
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuTransform(pub [f32; 16]);

impl GpuTransform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
    pub const BINDING: u32 = VertexInputIndex::Matrix.binding();

    pub fn bind_group_layout_entry() -> wgpu::BindGroupLayoutEntry {
        matrix_layout_entry(Self::BINDING)
    }

    pub fn bind_group_entry(buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
        matrix_bind_group_entry(Self::BINDING, buffer)
    }

    pub fn buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;

        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("transform"),
            contents: bytemuck::bytes_of(self),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }
}

impl From<Matrix> for GpuTransform {
    fn from(matrix: Matrix) -> GpuTransform {
        GpuTransform(matrix.to_gpu())
    }
}

///
/// The texture coordinate transformation matrix, as bound for the vertex stage
///
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuTextureTransform(pub [f32; 16]);

impl GpuTextureTransform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
    pub const BINDING: u32 = VertexInputIndex::TextureMatrix.binding();

    pub fn bind_group_layout_entry() -> wgpu::BindGroupLayoutEntry {
        matrix_layout_entry(Self::BINDING)
    }

    pub fn bind_group_entry(buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
        matrix_bind_group_entry(Self::BINDING, buffer)
    }

    pub fn buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;

        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("texture_transform"),
            contents: bytemuck::bytes_of(self),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }
}

impl From<Matrix> for GpuTextureTransform {
    fn from(matrix: Matrix) -> GpuTextureTransform {
        GpuTextureTransform(matrix.to_gpu())
    }
}

fn matrix_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<[f32; 16]>() as u64),
        },
        count: None,
    }
}

fn matrix_bind_group_entry(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::Buffer(buffer.as_entire_buffer_binding()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_the_diagonal() {
        let flat = Matrix::identity().to_gpu();

        for col in 0..4 {
            for row in 0..4 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_eq!(flat[col*4 + row], expected);
            }
        }
    }

    #[test]
    fn translation_moves_points() {
        let matrix = Matrix::translate(10.0, -5.0);
        assert_eq!(matrix.transform_point(1.0, 2.0), (11.0, -3.0));
    }

    #[test]
    fn scaling_scales_points() {
        let matrix = Matrix::scale(2.0, 3.0);
        assert_eq!(matrix.transform_point(1.0, 2.0), (2.0, 6.0));
    }

    #[test]
    fn multiplication_applies_right_hand_side_first() {
        let scale_then_translate = Matrix::translate(10.0, 0.0).multiply(Matrix::scale(2.0, 2.0));
        assert_eq!(scale_then_translate.transform_point(1.0, 1.0), (12.0, 2.0));

        let translate_then_scale = Matrix::scale(2.0, 2.0).multiply(Matrix::translate(10.0, 0.0));
        assert_eq!(translate_then_scale.transform_point(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn translation_lands_in_the_last_gpu_column() {
        let flat = Matrix::translate(7.0, 8.0).to_gpu();

        // Column 3 holds the translation when the matrix is applied to column vectors
        assert_eq!(flat[12], 7.0);
        assert_eq!(flat[13], 8.0);
        assert_eq!(flat[15], 1.0);
    }

    #[test]
    fn euclid_transforms_convert() {
        let euclid_transform = euclid::default::Transform2D::translation(3.0, 4.0).pre_scale(2.0, 2.0);
        let matrix = Matrix::from(euclid_transform);

        let (x, y) = matrix.transform_point(1.0, 1.0);
        let expected = euclid_transform.transform_point(euclid::default::Point2D::new(1.0, 1.0));

        assert!((x - expected.x).abs() < 1e-6);
        assert!((y - expected.y).abs() < 1e-6);
    }

    #[test]
    fn gpu_matrices_are_a_single_mat4() {
        assert_eq!(GpuTransform::SIZE, 64);
        assert_eq!(GpuTextureTransform::SIZE, 64);
        assert_eq!(GpuTransform::BINDING, 0);
        assert_eq!(GpuTextureTransform::BINDING, 2);
    }
}
