//! Rolling sample buffers
//!
//! - [`StatBuffer`]: fixed-capacity ring of scalars (speeds, bearing errors)
//! - [`MotionWindow`]: time-bounded ring of fixes for standing-still detection

mod motion;
mod stat;

pub use motion::MotionWindow;
pub use stat::StatBuffer;
