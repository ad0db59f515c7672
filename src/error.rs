//! Game error taxonomy
//!
//! Nothing here is retried. `Unsupported` is terminal, every other variant is
//! either shown to the player as a transient banner or dropped with a debug log.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    /// The browser has no AR-capable display
    #[error("your browser does not support augmented reality")]
    Unsupported,

    /// Hit-test found no surface under the touch
    #[error("invalid bin location, please try again ಠ▃ಠ")]
    NoSurfaceHit,

    /// Lock requested before a basket was placed
    #[error("where is your basket dude ಠ▃ಠ")]
    BasketNotPlaced,

    /// Placement attempted while the basket is locked
    #[error("basket position is locked")]
    BasketLocked,

    /// Throw attempted while the basket is unlocked
    #[error("lock the basket before throwing")]
    BasketUnlocked,

    /// Throw attempted with no ball attached to the camera
    #[error("no ball is ready to throw")]
    NoReadyBall,

    /// Throw attempted while a taunt is playing
    #[error("throwing is paused")]
    ThrowsPaused,

    /// Swipe with no touch-start or a non-positive duration
    #[error("swipe gesture is incomplete")]
    InvalidSwipe,

    /// No camera pose has been reported yet
    #[error("camera is not tracking yet")]
    NotTracking,
}

impl GameError {
    /// Whether the player should see this error in the message banner
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            GameError::Unsupported | GameError::NoSurfaceHit | GameError::BasketNotPlaced
        )
    }
}
