//! Gates applied before and after resolution: crawler policy and author
//! opt-out.

pub mod opt_out;
pub mod robots;

pub use opt_out::{is_opted_out, OptOutPolicy};
pub use robots::{
    fetch_policy, is_disallowed, is_disallowed_for_any, AgentRules, RobotsPolicy, RobotsTxt,
};
