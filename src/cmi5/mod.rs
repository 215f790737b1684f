//! cmi5 launch support: actor, launch context, negotiation

pub mod actor;
pub mod composer;
pub mod launch;
pub mod launch_data;

pub use actor::{Account, Actor};
pub use composer::{LaunchComposer, LaunchState};
pub use launch::{resolve_registration, LaunchContext};
pub use launch_data::{
    FetchTokenResponse, LaunchData, LaunchMode, MoveOn, LAUNCH_DATA_STATE_ID,
};
