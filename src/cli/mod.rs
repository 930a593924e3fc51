//! Terminal front end

pub mod demo;
pub mod play;
