// private sub-module defined in other files
mod apply_force_directed_layout;

// exports identifiers from private sub-modules in the current module namespace
pub use self::apply_force_directed_layout::{ApplyForceDirectedLayout, DegreeOfFreedom, RunAsync};

pub const TOOLBOX_NAME: &str = "Network Diagram Tools";
pub const TOOLBOX_ALIAS: &str = "nd";
