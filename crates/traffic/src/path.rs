use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f32::consts::TAU;

/// Identity of a waypoint within its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaypointId(pub u32);

/// An authored anchor: position plus the direction traffic should face there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    pub position: Vec3,
    /// Unit-length direction of travel.
    pub forward: Vec3,
}

impl Waypoint {
    pub fn new(id: u32, position: Vec3, forward: Vec3) -> Self {
        Self {
            id: WaypointId(id),
            position,
            forward,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PathError {
    #[error("duplicate waypoint id {0:?}")]
    DuplicateId(WaypointId),
    #[error("waypoint {0:?} has no usable forward direction")]
    ZeroForward(WaypointId),
    #[error("waypoint {0:?} has a non-finite position")]
    NonFinite(WaypointId),
    #[error("generated path needs at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },
}

/// Ordered, optionally looping sequence of waypoints.
///
/// Read-only once built. On a non-looping path the last waypoint's
/// successor is itself, so followers hold at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaypointPath {
    waypoints: Vec<Waypoint>,
    looped: bool,
}

impl WaypointPath {
    /// Build a path, rejecting duplicate ids and degenerate directions.
    /// Forward vectors are normalized.
    pub fn new(waypoints: Vec<Waypoint>, looped: bool) -> Result<Self, PathError> {
        let mut seen = HashSet::with_capacity(waypoints.len());
        let mut checked = Vec::with_capacity(waypoints.len());
        for wp in waypoints {
            if !seen.insert(wp.id) {
                return Err(PathError::DuplicateId(wp.id));
            }
            if !wp.position.is_finite() {
                return Err(PathError::NonFinite(wp.id));
            }
            let forward = wp.forward.try_normalize().ok_or(PathError::ZeroForward(wp.id))?;
            checked.push(Waypoint { forward, ..wp });
        }
        Ok(Self {
            waypoints: checked,
            looped,
        })
    }

    /// Build a path through `points`, each facing the next point.
    ///
    /// The last point faces the first when looping, otherwise it keeps the
    /// direction of the final edge. A single point faces `+Z`.
    pub fn from_points(points: &[Vec3], looped: bool) -> Result<Self, PathError> {
        let n = points.len();
        let waypoints = points
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let forward = match (n, i + 1 < n) {
                    (1, _) => Vec3::Z,
                    (_, true) => points[i + 1] - p,
                    (_, false) if looped => points[0] - p,
                    (_, false) => p - points[i - 1],
                };
                Waypoint::new(i as u32, p, forward)
            })
            .collect();
        Self::new(waypoints, looped)
    }

    /// Looping elliptical circuit of `count` waypoints around `center`,
    /// starting on the `+Z` side.
    pub fn oval(
        center: Vec3,
        radius_x: f32,
        radius_z: f32,
        count: usize,
    ) -> Result<Self, PathError> {
        if count < 3 {
            return Err(PathError::TooFewPoints {
                needed: 3,
                got: count,
            });
        }
        let points: Vec<Vec3> = (0..count)
            .map(|i| {
                let theta = TAU * i as f32 / count as f32;
                center + Vec3::new(radius_x * theta.sin(), 0.0, radius_z * theta.cos())
            })
            .collect();
        Self::from_points(&points, true)
    }

    /// Successor of `current`.
    ///
    /// `None` or an id not on this path yields the first waypoint. Past the
    /// end, a looping path wraps to the first and a non-looping path holds
    /// on the last. Only an empty path returns `None`.
    pub fn get_next(&self, current: Option<WaypointId>) -> Option<&Waypoint> {
        let first = self.waypoints.first()?;
        let Some(index) = current.and_then(|id| self.index_of(id)) else {
            return Some(first);
        };
        match self.waypoints.get(index + 1) {
            Some(next) => Some(next),
            None if self.looped => Some(first),
            None => self.waypoints.last(),
        }
    }

    pub fn get(&self, id: WaypointId) -> Option<&Waypoint> {
        self.index_of(id).map(|i| &self.waypoints[i])
    }

    pub fn index_of(&self, id: WaypointId) -> Option<usize> {
        self.waypoints.iter().position(|wp| wp.id == id)
    }

    /// Waypoint at `index`, clamped to the last one.
    pub fn at_clamped(&self, index: usize) -> Option<&Waypoint> {
        let last = self.waypoints.len().checked_sub(1)?;
        self.waypoints.get(index.min(last))
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn is_looped(&self) -> bool {
        self.looped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc(looped: bool) -> WaypointPath {
        WaypointPath::from_points(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 50.0),
                Vec3::new(50.0, 0.0, 50.0),
            ],
            looped,
        )
        .unwrap()
    }

    #[test]
    fn looping_path_wraps() {
        let path = abc(true);
        let c = path.last().unwrap().id;
        assert_eq!(path.get_next(Some(c)).unwrap().id, WaypointId(0));
    }

    #[test]
    fn open_path_holds_on_last() {
        let path = abc(false);
        let c = path.last().unwrap().id;
        assert_eq!(path.get_next(Some(c)).unwrap().id, c);
    }

    #[test]
    fn next_walks_in_order() {
        let path = abc(false);
        assert_eq!(path.get_next(Some(WaypointId(0))).unwrap().id, WaypointId(1));
        assert_eq!(path.get_next(Some(WaypointId(1))).unwrap().id, WaypointId(2));
    }

    #[test]
    fn none_or_unknown_yields_first() {
        let path = abc(true);
        assert_eq!(path.get_next(None).unwrap().id, WaypointId(0));
        assert_eq!(path.get_next(Some(WaypointId(99))).unwrap().id, WaypointId(0));
    }

    #[test]
    fn empty_path_yields_none() {
        let path = WaypointPath::default();
        assert!(path.get_next(None).is_none());
        assert!(path.at_clamped(3).is_none());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let wp = Waypoint::new(1, Vec3::ZERO, Vec3::Z);
        let err = WaypointPath::new(vec![wp, wp], false).unwrap_err();
        assert_eq!(err, PathError::DuplicateId(WaypointId(1)));
    }

    #[test]
    fn zero_forward_rejected() {
        let wp = Waypoint::new(0, Vec3::ZERO, Vec3::ZERO);
        assert!(matches!(
            WaypointPath::new(vec![wp], false),
            Err(PathError::ZeroForward(_))
        ));
    }

    #[test]
    fn forwards_are_normalized() {
        let path = abc(false);
        for wp in path.iter() {
            assert!((wp.forward.length() - 1.0).abs() < 1e-5);
        }
        // last of an open path keeps the final edge direction
        assert!((path.last().unwrap().forward - Vec3::X).length() < 1e-5);
        // last of a loop faces the first
        let looped = abc(true);
        let expected = (Vec3::ZERO - Vec3::new(50.0, 0.0, 50.0)).normalize();
        assert!((looped.last().unwrap().forward - expected).length() < 1e-5);
    }

    #[test]
    fn oval_is_a_loop() {
        let path = WaypointPath::oval(Vec3::ZERO, 80.0, 200.0, 16).unwrap();
        assert_eq!(path.len(), 16);
        assert!(path.is_looped());
        assert!((path.first().unwrap().position - Vec3::new(0.0, 0.0, 200.0)).length() < 1e-3);
        assert!(WaypointPath::oval(Vec3::ZERO, 1.0, 1.0, 2).is_err());
    }

    #[test]
    fn clamped_index() {
        let path = abc(false);
        assert_eq!(path.at_clamped(1).unwrap().id, WaypointId(1));
        assert_eq!(path.at_clamped(10).unwrap().id, WaypointId(2));
    }
}
