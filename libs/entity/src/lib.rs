pub mod due;
pub mod priority;
pub mod property;
pub mod status;
pub mod task;

pub mod prelude {
    pub use crate::due::Due;
    pub use crate::priority::Priority;
    pub use crate::status::Status;
    pub use crate::task::Task as TaskEntity;
}
