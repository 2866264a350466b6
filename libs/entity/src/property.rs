//! Property names of the task database.

pub const NAME: &str = "Name";
pub const CLASS: &str = "Class";
pub const DUE: &str = "Due";
pub const ACTUALLY_DUE: &str = "Actually Due";
pub const PRIORITY: &str = "Priority";
pub const STATUS: &str = "Status";
pub const DONE: &str = "Done";
pub const ASSIGNED_TIME: &str = "Assigned time";
pub const LEVEL_OF_EFFORT: &str = "Level of Effort";
