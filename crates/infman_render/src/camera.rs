use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic 2D camera over a y-down world.
///
/// `target` is the world point shown at the centre of the viewport. The
/// viewport is the game's logical resolution; the surface stretches it to the
/// physical window.
#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    pub target: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            target: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    /// Camera whose world units are screen pixels with the origin top-left.
    pub fn screen(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            target: Vec2::new(viewport_width as f32 * 0.5, viewport_height as f32 * 0.5),
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let half_w = (self.viewport.0 as f32) / (2.0 * self.zoom);
        let half_h = (self.viewport.1 as f32) / (2.0 * self.zoom);

        // bottom/top swapped relative to a y-up camera.
        Mat4::orthographic_rh(
            self.target.x - half_w,
            self.target.x + half_w,
            self.target.y + half_h,
            self.target.y - half_h,
            -1.0,
            1.0,
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
        }
    }
}
