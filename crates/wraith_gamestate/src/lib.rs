//! Wraith GameState - Global Mode Signal
//!
//! The application owns one [`ModeSignal`]. Lifecycle drivers (encounter loops,
//! trap activators) subscribe to it and stop whatever they are doing when the
//! game leaves active play.
//!
//! # Example
//!
//! ```ignore
//! use wraith_gamestate::prelude::*;
//!
//! let signal = ModeSignal::new(GameMode::Playing);
//! let (token, _subscription) = signal.play_token();
//!
//! signal.push(GameMode::Paused);
//! assert!(token.is_cancelled());
//! ```

pub mod mode;
pub mod signal;

pub mod prelude {
    pub use crate::mode::{GameMode, ModeChange};
    pub use crate::signal::{ModeSignal, ModeSubscription, SubscriberId};
}

pub use prelude::*;
