//! Data models for the client
//!
//! Wire DTOs exchanged with the backend and the view models derived from them,
//! organized by domain.

mod media;
mod upload;
mod user;
mod video;

pub use media::*;
pub use upload::*;
pub use user::*;
pub use video::*;
