use glam::Vec3;

const NEAR_PLANE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Fixed perspective camera looking down -Z.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub fov_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            fov_degrees: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectedPoint {
    pub x: f32,
    pub y: f32,
    /// Distance in front of the camera, in world units.
    pub depth: f32,
    /// Pixels per world unit at this depth.
    pub scale: f32,
}

fn focal_length_px(fov_degrees: f32, viewport_height: u32) -> f32 {
    let half_fov = (fov_degrees * 0.5).to_radians();
    viewport_height as f32 * 0.5 / half_fov.tan()
}

pub fn project(world: Vec3, camera: &Camera, viewport: Viewport) -> Option<ProjectedPoint> {
    if viewport.width == 0 || viewport.height == 0 {
        return None;
    }
    let view = world - camera.position;
    let depth = -view.z;
    if depth < NEAR_PLANE {
        return None;
    }
    let scale = focal_length_px(camera.fov_degrees, viewport.height) / depth;
    Some(ProjectedPoint {
        x: viewport.width as f32 * 0.5 + view.x * scale,
        y: viewport.height as f32 * 0.5 - view.y * scale,
        depth,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn world_origin_maps_to_viewport_center() {
        let point = project(Vec3::ZERO, &Camera::default(), VIEWPORT)
            .expect("origin is in front of the camera");
        assert!((point.x - 400.0).abs() < f32::EPSILON);
        assert!((point.y - 300.0).abs() < f32::EPSILON);
        assert!((point.depth - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn focal_length_follows_vertical_field_of_view() {
        let focal = focal_length_px(50.0, 600);
        assert!((focal - 643.35).abs() < 0.02, "focal was {focal}");
    }

    #[test]
    fn screen_y_grows_downward_as_world_y_falls() {
        let camera = Camera::default();
        let above = project(Vec3::new(0.0, 2.0, 0.0), &camera, VIEWPORT).expect("in view");
        let below = project(Vec3::new(0.0, -2.0, 0.0), &camera, VIEWPORT).expect("in view");
        assert!(above.y < 300.0);
        assert!(below.y > 300.0);
        assert!((above.y - 300.0).abs() - (below.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn points_behind_or_grazing_the_camera_are_culled() {
        let camera = Camera::default();
        assert!(project(Vec3::new(0.0, 0.0, 20.0), &camera, VIEWPORT).is_none());
        assert!(project(Vec3::new(0.0, 0.0, 9.95), &camera, VIEWPORT).is_none());
        assert!(project(Vec3::new(0.0, 0.0, 9.8), &camera, VIEWPORT).is_some());
    }

    #[test]
    fn nearer_points_project_larger() {
        let camera = Camera::default();
        let near = project(Vec3::new(0.0, 0.0, 5.0), &camera, VIEWPORT).expect("in view");
        let far = project(Vec3::new(0.0, 0.0, -5.0), &camera, VIEWPORT).expect("in view");
        assert!(near.scale > far.scale);
    }

    #[test]
    fn empty_viewport_projects_nothing() {
        let empty = Viewport {
            width: 0,
            height: 0,
        };
        assert!(project(Vec3::ZERO, &Camera::default(), empty).is_none());
    }
}
