//! Contract with the external vehicle/motion model.

use serde::{Deserialize, Serialize};

/// One frame of externally driven control values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalInput {
    /// `[-1, 1]`, positive turns toward `+X` from a `+Z` heading.
    pub steer: f32,
    /// `[0, 1]`
    pub throttle: f32,
    /// `[0, 1]`
    pub brake: f32,
    pub handbrake: bool,
    pub boost: bool,
}

impl ExternalInput {
    /// Clamped input with no brake, handbrake or boost.
    pub fn drive(steer: f32, throttle: f32) -> Self {
        Self {
            steer: steer.clamp(-1.0, 1.0),
            throttle: throttle.clamp(0.0, 1.0),
            ..Self::default()
        }
    }
}

/// Identifies a controller competing for a motion collaborator's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId(pub u64);

/// Single-holder lease over a motion collaborator's external inputs.
///
/// Acquiring while another controller holds it transfers ownership; only
/// the current holder can release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLease {
    holder: Option<ControllerId>,
}

impl InputLease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease. Returns the previous holder if it was someone else.
    pub fn acquire(&mut self, id: ControllerId) -> Option<ControllerId> {
        let previous = self.holder.replace(id).filter(|prev| *prev != id);
        if let Some(prev) = previous {
            tracing::debug!(from = prev.0, to = id.0, "input lease transferred");
        }
        previous
    }

    /// Release the lease if `id` holds it.
    pub fn release(&mut self, id: ControllerId) -> bool {
        if self.holder == Some(id) {
            self.holder = None;
            true
        } else {
            false
        }
    }

    pub fn holder(&self) -> Option<ControllerId> {
        self.holder
    }

    pub fn is_held_by(&self, id: ControllerId) -> bool {
        self.holder == Some(id)
    }
}

/// What the pursuit controller needs from the vehicle model.
pub trait MotionController {
    /// Maximum steer angle in degrees, `None` if the vehicle has no spec loaded.
    fn steer_angle_limit(&self) -> Option<f32>;

    /// Current forward speed.
    fn current_speed(&self) -> f32;

    fn set_external_input(&mut self, input: ExternalInput);

    /// Switch between external (AI) input and the vehicle's own input source.
    fn use_external_input(&mut self, enable: bool);

    fn lease(&self) -> &InputLease;

    fn lease_mut(&mut self) -> &mut InputLease;
}
