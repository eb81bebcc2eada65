//! Sprite vertex layout and the CPU-side quad batch.
//!
//! The whole frame is rebuilt on the CPU as a list of textured quads, then
//! streamed into GPU buffers in one upload. Consecutive quads sharing a
//! texture collapse into a single draw call.

use infman_core::geometry::Rect;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl SpriteVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Normalised texture region. `u1 < u0` samples the region mirrored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect {
        u0: 0.0,
        v0: 0.0,
        u1: 1.0,
        v1: 1.0,
    };

    /// Column `index` of a horizontal strip of `count` equal frames.
    pub fn strip_frame(index: u32, count: u32, flip_x: bool) -> Self {
        let count = count.max(1);
        let width = 1.0 / count as f32;
        let u0 = index.min(count - 1) as f32 * width;
        let u1 = u0 + width;
        if flip_x {
            Self { u0: u1, v0: 0.0, u1: u0, v1: 1.0 }
        } else {
            Self { u0, v0: 0.0, u1, v1: 1.0 }
        }
    }
}

/// A run of indices drawn with one texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub texture: usize,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Default)]
pub struct QuadBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
    sealed: usize,
}

impl QuadBatch {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
        self.sealed = 0;
    }

    /// Close the current run: later quads never merge into earlier draw
    /// calls. Returns the number of draw calls before the boundary.
    pub fn seal(&mut self) -> usize {
        self.sealed = self.draw_calls.len();
        self.sealed
    }

    pub fn index_len(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Append a y-down quad covering `dst`.
    pub fn push(&mut self, texture: usize, dst: Rect, uv: UvRect, color: [f32; 4]) {
        let base_index = self.vertices.len() as u32;
        let corners = [
            ([dst.x, dst.y], [uv.u0, uv.v0]),
            ([dst.right(), dst.y], [uv.u1, uv.v0]),
            ([dst.right(), dst.bottom()], [uv.u1, uv.v1]),
            ([dst.x, dst.bottom()], [uv.u0, uv.v1]),
        ];
        for (position, tex_coords) in corners {
            self.vertices.push(SpriteVertex {
                position,
                tex_coords,
                color,
            });
        }

        let index_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
        self.push_draw_call(texture, index_start, 6);
    }

    fn push_draw_call(&mut self, texture: usize, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls[self.sealed..].last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if last.texture == texture && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture,
            index_start,
            index_count,
        });
    }
}
