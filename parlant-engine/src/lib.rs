pub mod controller;
pub mod playback;
pub mod session;
pub mod traits;
