//! Data models for the CafeHub application.
//!
//! Wire field names are snake_case, matching the mobile/web client contract.

mod cafe;
mod checkin;
mod live_update;
mod occupancy;
mod reservation;
mod review;
mod user;

pub use cafe::*;
pub use checkin::*;
pub use live_update::*;
pub use occupancy::*;
pub use reservation::*;
pub use review::*;
pub use user::*;
