//! Minimal kinematic car standing in for the external vehicle model.

use glam::{Quat, Vec3};
use trackway_common::Transform;
use trackway_traffic::{ExternalInput, InputLease, MotionController};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSpec {
    /// Degrees.
    pub max_steer_angle: f32,
    pub wheelbase: f32,
    pub max_acceleration: f32,
    pub max_braking: f32,
    /// Linear drag coefficient (1/s).
    pub drag: f32,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            max_steer_angle: 30.0,
            wheelbase: 2.6,
            max_acceleration: 12.0,
            max_braking: 20.0,
            drag: 0.05,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KinematicVehicle {
    spec: Option<VehicleSpec>,
    speed: f32,
    external: bool,
    input: ExternalInput,
    lease: InputLease,
}

impl KinematicVehicle {
    pub fn new(spec: VehicleSpec) -> Self {
        Self {
            spec: Some(spec),
            ..Self::default()
        }
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Integrate one step. Without external input the car coasts under drag.
    pub fn integrate(&mut self, transform: &Transform, dt: f32) -> Transform {
        let Some(spec) = self.spec else {
            return *transform;
        };
        let input = if self.external {
            self.input
        } else {
            ExternalInput::default()
        };

        let accel = input.throttle * spec.max_acceleration
            - input.brake * spec.max_braking
            - spec.drag * self.speed;
        self.speed = (self.speed + accel * dt).max(0.0);

        let forward = transform.forward();
        let mut yaw = forward.x.atan2(forward.z);
        let wheel_angle = (input.steer * spec.max_steer_angle).to_radians();
        yaw += self.speed * wheel_angle.tan() / spec.wheelbase * dt;

        let rotation = Quat::from_rotation_y(yaw);
        Transform {
            position: transform.position + rotation * Vec3::Z * self.speed * dt,
            rotation,
            scale: transform.scale,
        }
    }
}

impl MotionController for KinematicVehicle {
    fn steer_angle_limit(&self) -> Option<f32> {
        self.spec.map(|s| s.max_steer_angle)
    }

    fn current_speed(&self) -> f32 {
        self.speed
    }

    fn set_external_input(&mut self, input: ExternalInput) {
        self.input = input;
    }

    fn use_external_input(&mut self, enable: bool) {
        self.external = enable;
        if !enable {
            self.input = ExternalInput::default();
        }
    }

    fn lease(&self) -> &InputLease {
        &self.lease
    }

    fn lease_mut(&mut self) -> &mut InputLease {
        &mut self.lease
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_accelerates_forward() {
        let mut car = KinematicVehicle::new(VehicleSpec::default());
        car.use_external_input(true);
        car.set_external_input(ExternalInput::drive(0.0, 1.0));
        let mut t = Transform::default();
        for _ in 0..60 {
            t = car.integrate(&t, 1.0 / 60.0);
        }
        assert!(car.current_speed() > 10.0);
        assert!(t.position.z > 5.0);
        assert!(t.position.x.abs() < 1e-3);
    }

    #[test]
    fn positive_steer_turns_toward_positive_x() {
        let mut car = KinematicVehicle::new(VehicleSpec::default());
        car.use_external_input(true);
        car.set_external_input(ExternalInput::drive(1.0, 1.0));
        let mut t = Transform::default();
        for _ in 0..120 {
            t = car.integrate(&t, 1.0 / 60.0);
        }
        assert!(t.position.x > 0.0);
        assert!(t.forward().x > 0.0);
    }

    #[test]
    fn ignores_input_without_external_control() {
        let mut car = KinematicVehicle::new(VehicleSpec::default());
        car.set_external_input(ExternalInput::drive(0.0, 1.0));
        let t = car.integrate(&Transform::default(), 0.1);
        assert_eq!(car.current_speed(), 0.0);
        assert_eq!(t.position, Vec3::ZERO);
    }
}
