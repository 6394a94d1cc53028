use glam::{Mat3, Quat, Vec3};

/// Rotation that turns a quad lying in the local YZ plane (normal +X) to face
/// the camera. Yaw spins about +Z, pitch tilts toward the camera height.
pub fn billboard_rotation(position: Vec3, camera: Vec3) -> Quat {
    let to_camera = camera - position;
    if to_camera.length_squared() <= f32::EPSILON {
        return Quat::IDENTITY;
    }

    let horizontal = to_camera.truncate().length();
    let yaw = to_camera.y.atan2(to_camera.x);
    let pitch = to_camera.z.atan2(horizontal);
    Quat::from_rotation_z(yaw) * Quat::from_rotation_y(-pitch)
}

/// Rows of the affine transform `translation * rotation * scale`
pub fn transform_rows(scale: Vec3, rotation: Quat, translation: Vec3) -> [[f32; 4]; 3] {
    let m = Mat3::from_quat(rotation) * Mat3::from_diagonal(scale);
    [
        [m.x_axis.x, m.y_axis.x, m.z_axis.x, translation.x],
        [m.x_axis.y, m.y_axis.y, m.z_axis.y, translation.y],
        [m.x_axis.z, m.y_axis.z, m.z_axis.z, translation.z],
    ]
}
