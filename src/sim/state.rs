//! Game session types
//!
//! Everything the session owns besides the physics world and scene graph:
//! placement state, baskets, balls, gestures, and the event vocabulary used
//! between the session and the platform layer.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::physics::{BodyHandle, WallSide};
use crate::renderer::scene::NodeId;

/// Basket placement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// No valid basket
    Unplaced,
    /// Basket placed, touches re-place it
    Unlocked,
    /// Basket fixed, touches throw
    Locked,
}

/// The placed basket and its colliders
#[derive(Debug, Clone)]
pub struct Basket {
    pub position: Vec3,
    pub orientation: Quat,
    pub frame: BodyHandle,
    pub walls: Vec<(WallSide, BodyHandle)>,
}

impl Basket {
    /// Every physics body the basket owns
    pub fn bodies(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        std::iter::once(self.frame).chain(self.walls.iter().map(|(_, h)| *h))
    }
}

/// How a thrown ball ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallOutcome {
    Hit { points: u32 },
    Miss,
}

/// A paper ball. `body` is `None` while the ball is still ready in front of
/// the camera.
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: u32,
    pub node: NodeId,
    pub body: Option<BodyHandle>,
    /// Distance from the basket centre at throw time
    pub throw_distance: f32,
    pub outcome: Option<BallOutcome>,
    /// Time after which a scored ball is removed
    pub retire_at_ms: Option<f64>,
}

impl Ball {
    pub fn new(id: u32, node: NodeId) -> Self {
        Self {
            id,
            node,
            body: None,
            throw_distance: 0.0,
            outcome: None,
            retire_at_ms: None,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.body.is_none()
    }

    #[inline]
    pub fn is_scored(&self) -> bool {
        self.outcome.is_some()
    }

    /// Record a hit. Returns false if the ball already has an outcome.
    pub fn mark_hit(&mut self, points: u32) -> bool {
        if self.is_scored() {
            return false;
        }
        self.outcome = Some(BallOutcome::Hit { points });
        true
    }

    /// Record a miss. Returns false if the ball already has an outcome.
    pub fn mark_miss(&mut self) -> bool {
        if self.is_scored() {
            return false;
        }
        self.outcome = Some(BallOutcome::Miss);
        true
    }
}

/// Touch-start / touch-end pair for one throw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeGesture {
    /// Page coordinates (px)
    pub start: Vec2,
    pub start_time: f64,
    pub end: Vec2,
    pub end_time: f64,
}

impl SwipeGesture {
    /// Euclidean swipe length in pixels
    pub fn distance(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Milliseconds between touch-start and touch-end
    pub fn elapsed(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Swipe speed in px/ms, `None` when no time elapsed
    pub fn velocity(&self) -> Option<f32> {
        super::throw::swipe_velocity(self.distance(), self.elapsed())
    }
}

/// Sounds the session asks the platform to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sound {
    /// One of several cheer variants
    Cheer(u8),
    Miss,
    Throw,
    /// The taunt tune; its completion unpauses throwing
    Taunt { stage: u32 },
}

/// Number of cheer variants
pub const CHEER_VARIANTS: u8 = 4;

/// Output of the session, consumed by audio and UI
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Show the banner. `generation` lets a stale auto-hide be ignored.
    ShowMessage { text: String, generation: u32 },
    HideMessage,
    LockChanged(bool),
    PlaySound(Sound),
    ScoreChanged { total: u32, points: u32 },
    Missed { streak: u32 },
    TauntStarted(u32),
    TauntEnded,
}

/// Input to the session from the platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    TouchStart {
        page: Vec2,
        viewport: Vec2,
        timestamp: f64,
    },
    TouchEnd {
        page: Vec2,
        viewport: Vec2,
        timestamp: f64,
    },
    ToggleLock,
    DismissMessage,
    SoundFinished(Sound),
}

/// What a pending timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Ready the next ball
    ArmBall,
    HideMessage { generation: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    pub due_ms: f64,
    pub kind: TimerKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::scene::{Mesh, Node, Scene};

    fn ball() -> Ball {
        let mut scene = Scene::new();
        let node = scene.add(Node::new(Mesh::Ball { radius: 0.05 }));
        Ball::new(1, node)
    }

    #[test]
    fn test_ball_scored_once() {
        let mut b = ball();
        assert!(b.mark_miss());
        assert!(!b.mark_hit(3));
        assert!(!b.mark_miss());
        assert_eq!(b.outcome, Some(BallOutcome::Miss));

        let mut b = ball();
        assert!(b.mark_hit(2));
        assert!(!b.mark_miss());
        assert_eq!(b.outcome, Some(BallOutcome::Hit { points: 2 }));
    }

    #[test]
    fn test_swipe_gesture() {
        let swipe = SwipeGesture {
            start: Vec2::new(100.0, 500.0),
            start_time: 1000.0,
            end: Vec2::new(100.0, 400.0),
            end_time: 1200.0,
        };
        assert_eq!(swipe.distance(), 100.0);
        assert_eq!(swipe.elapsed(), 200.0);
        assert_eq!(swipe.velocity(), Some(0.5));

        let instant = SwipeGesture {
            end_time: 1000.0,
            ..swipe
        };
        assert_eq!(instant.velocity(), None);
    }
}
