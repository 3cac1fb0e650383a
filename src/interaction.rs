//! Controller interaction: rays, ray/plant intersection and select handling.
//!
//! A controller is described by its pose (a world transform whose -Z axis is the
//! pointing direction). Pressing select on a controller casts a ray from that
//! pose; the nearest interactive plant it hits is forced to the selected
//! emissive intensity until the same controller releases.
//!
//! On the desktop the mouse emulates controller 0: the pose looks from the camera
//! through the cursor, see [`Ray::to_pose`].

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3};

use crate::scene::plants::PlantField;

/// Number of tracked-pointer controllers (left and right hand).
pub const MAX_CONTROLLERS: usize = 2;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    /// Always normalized.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray along the -Z axis of a controller pose.
    pub fn from_pose(pose: &Matrix4<f32>) -> Self {
        let origin = Point3::from_vec(pose.w.truncate());
        let direction = pose.transform_vector(-Vector3::unit_z());
        Self::new(origin, direction)
    }

    /// A pose located at the ray origin whose -Z axis follows the ray.
    pub fn to_pose(&self) -> Matrix4<f32> {
        let up = if self.direction.y.abs() > 0.999 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        Matrix4::look_to_rh(self.origin, self.direction, up)
            .invert()
            .unwrap_or_else(|| Matrix4::from_translation(self.origin.to_vec()))
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Distance to the first hit with a capped cone.
    ///
    /// In its local space the cone is centred on the origin: the apex sits at
    /// `y = height / 2` and the base disc of `radius` at `y = -height / 2`.
    /// `model` must be a rigid transform (rotation and translation).
    pub fn intersect_cone(&self, model: &Matrix4<f32>, radius: f32, height: f32) -> Option<f32> {
        let inverse = model.invert()?;
        let o = inverse.transform_point(self.origin);
        let d = inverse.transform_vector(self.direction);

        let half = height / 2.0;
        let k = radius / height;
        let k2 = k * k;
        let q0 = half - o.y;

        let mut best: Option<f32> = None;
        let mut consider = |t: f32| {
            if t >= 0.0 && best.is_none_or(|b| t < b) {
                best = Some(t);
            }
        };
        let on_side = |t: f32| {
            let y = o.y + t * d.y;
            (-half..=half).contains(&y)
        };

        // lateral surface: x^2 + z^2 = (k (half - y))^2
        let a = d.x * d.x + d.z * d.z - k2 * d.y * d.y;
        let b = 2.0 * (o.x * d.x + o.z * d.z) + 2.0 * k2 * q0 * d.y;
        let c = o.x * o.x + o.z * o.z - k2 * q0 * q0;
        if a.abs() < EPSILON {
            if b.abs() > EPSILON {
                let t = -c / b;
                if on_side(t) {
                    consider(t);
                }
            }
        } else {
            let discriminant = b * b - 4.0 * a * c;
            if discriminant >= 0.0 {
                let root = discriminant.sqrt();
                for t in [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)] {
                    if on_side(t) {
                        consider(t);
                    }
                }
            }
        }

        // base cap
        if d.y.abs() > EPSILON {
            let t = (-half - o.y) / d.y;
            let x = o.x + t * d.x;
            let z = o.z + t * d.z;
            if x * x + z * z <= radius * radius {
                consider(t);
            }
        }

        best
    }
}

/// Nearest interactive plant hit by `ray`, with its distance.
pub fn pick_plant(ray: &Ray, plants: &PlantField) -> Option<(usize, f32)> {
    plants
        .plants
        .iter()
        .enumerate()
        .filter(|(_, plant)| plant.interactive)
        .filter_map(|(idx, plant)| {
            ray.intersect_cone(&plant.model_matrix(), plants.radius, plants.height)
                .map(|t| (idx, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    SelectStart {
        controller: usize,
        pose: Matrix4<f32>,
    },
    SelectEnd {
        controller: usize,
        pose: Matrix4<f32>,
    },
}

/// Per-controller selection state.
#[derive(Debug, Default)]
pub struct Controllers {
    held: [Option<usize>; MAX_CONTROLLERS],
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self, controller: usize) -> Option<usize> {
        self.held.get(controller).copied().flatten()
    }

    /// Apply a controller event to the plants. Returns the affected plant.
    pub fn handle(&mut self, event: ControllerEvent, plants: &mut PlantField) -> Option<usize> {
        match event {
            ControllerEvent::SelectStart { controller, pose } => {
                self.select_start(controller, &pose, plants)
            }
            ControllerEvent::SelectEnd { controller, pose } => {
                self.select_end(controller, &pose, plants)
            }
        }
    }

    pub fn select_start(
        &mut self,
        controller: usize,
        pose: &Matrix4<f32>,
        plants: &mut PlantField,
    ) -> Option<usize> {
        if controller >= MAX_CONTROLLERS {
            log::warn!("Ignoring select from unknown controller {}", controller);
            return None;
        }
        let (idx, distance) = pick_plant(&Ray::from_pose(pose), plants)?;
        // a press whose release never arrived must not pin its plant
        if let Some(stale) = self.held[controller].filter(|&prev| prev != idx) {
            plants.release(stale);
        }
        plants.select(idx);
        self.held[controller] = Some(idx);
        log::debug!("Controller {} selected plant {} at {:.2}", controller, idx, distance);
        Some(idx)
    }

    /// Release whatever `controller` holds. A controller holding nothing falls
    /// back to releasing the interactive plant its ray currently hits.
    pub fn select_end(
        &mut self,
        controller: usize,
        pose: &Matrix4<f32>,
        plants: &mut PlantField,
    ) -> Option<usize> {
        if controller >= MAX_CONTROLLERS {
            log::warn!("Ignoring release from unknown controller {}", controller);
            return None;
        }
        let idx = match self.held[controller].take() {
            Some(idx) => idx,
            None => pick_plant(&Ray::from_pose(pose), plants)?.0,
        };
        plants.release(idx);
        log::debug!("Controller {} released plant {}", controller, idx);
        Some(idx)
    }
}
