//! Perspective camera, projection and the camera uniform shared by every pipeline.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4};
use winit::dpi::PhysicalPosition;

use crate::interaction::Ray;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A free camera described by position, yaw and pitch.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// Ray from the camera through the given cursor position.
    pub fn cast_ray_from_mouse(
        &self,
        coords: PhysicalPosition<f64>,
        width: f32,
        height: f32,
        projection: &Projection,
    ) -> Ray {
        let ndc_x = (2.0 * coords.x as f32) / width.max(1.0) - 1.0;
        let ndc_y = 1.0 - (2.0 * coords.y as f32) / height.max(1.0);

        let inverse = (projection.calc_matrix() * self.calc_matrix())
            .invert()
            .unwrap_or_else(Matrix4::identity);
        let unproject = |z: f32| {
            let p = inverse * Vector4::new(ndc_x, ndc_y, z, 1.0);
            Point3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        };
        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(self.position, far - near)
    }
}

/// Perspective projection. Only the aspect ratio changes at runtime.
#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Follow the viewport. Zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// `1 / tan(fovy / 2)`, the vertical scale of the projection.
    pub fn focal_y(&self) -> f32 {
        1.0 / (self.fovy.0 / 2.0).tan()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Reflection across the horizontal plane `y = height`.
pub fn mirror_matrix(height: f32) -> Matrix4<f32> {
    #[rustfmt::skip]
    let mirror = Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, -1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 2.0 * height, 0.0, 1.0,
    );
    mirror
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    /// width, height, focal_y, aspect
    pub viewport: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
            viewport: [1.0, 1.0, 1.0, 1.0],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection, size: [u32; 2]) {
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        self.write(camera.position, view_proj, projection, size);
    }

    /// The same camera seen in the mirror `y = height`, used for the water reflection.
    pub fn update_mirrored(
        &mut self,
        camera: &Camera,
        projection: &Projection,
        height: f32,
        size: [u32; 2],
    ) {
        let mirror = mirror_matrix(height);
        let view_proj = projection.calc_matrix() * camera.calc_matrix() * mirror;
        let eye = mirror * camera.position.to_homogeneous();
        self.write(Point3::new(eye.x, eye.y, eye.z), view_proj, projection, size);
    }

    fn write(
        &mut self,
        eye: Point3<f32>,
        view_proj: Matrix4<f32>,
        projection: &Projection,
        size: [u32; 2],
    ) {
        self.view_position = eye.to_homogeneous().into();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity).into();
        self.viewport = [
            size[0].max(1) as f32,
            size[1].max(1) as f32,
            projection.focal_y(),
            projection.aspect(),
        ];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of a camera: its uniform buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

pub fn camera_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}

pub fn camera_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some(label),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cgmath::{Deg, Transform};

    use super::*;

    fn camera() -> Camera {
        Camera::new((0.0, 5.0, 15.0), Deg(-90.0), Deg(0.0))
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let forward = camera().forward();
        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut projection = Projection::new(800, 600, Deg(75.0), 0.1, 2000.0);
        assert_relative_eq!(projection.aspect(), 800.0 / 600.0);
        projection.resize(1920, 1080);
        assert_relative_eq!(projection.aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut projection = Projection::new(800, 600, Deg(75.0), 0.1, 2000.0);
        projection.resize(0, 600);
        projection.resize(800, 0);
        assert_relative_eq!(projection.aspect(), 800.0 / 600.0);
    }

    #[test]
    fn ray_through_screen_centre_follows_view_direction() {
        let projection = Projection::new(800, 600, Deg(75.0), 0.1, 2000.0);
        let ray = camera().cast_ray_from_mouse((400.0, 300.0).into(), 800.0, 600.0, &projection);
        assert_eq!(ray.origin, Point3::new(0.0, 5.0, 15.0));
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
    }

    #[test]
    fn ray_through_top_edge_points_upwards() {
        let projection = Projection::new(800, 600, Deg(75.0), 0.1, 2000.0);
        let ray = camera().cast_ray_from_mouse((400.0, 0.0).into(), 800.0, 600.0, &projection);
        assert!(ray.direction.y > 0.0);
        // half of the vertical field of view
        let angle = ray.direction.y.atan2(-ray.direction.z);
        assert_relative_eq!(angle, 37.5_f32.to_radians(), epsilon = 1e-3);
    }

    #[test]
    fn mirror_reflects_points_across_the_plane() {
        let mirror = mirror_matrix(1.0);
        let reflected = mirror.transform_point(Point3::new(3.0, 5.0, -2.0));
        assert_relative_eq!(reflected.x, 3.0);
        assert_relative_eq!(reflected.y, -3.0);
        assert_relative_eq!(reflected.z, -2.0);
    }
}
