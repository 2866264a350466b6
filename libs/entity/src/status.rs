/// Values of the `Status` status property that the triage commands write or
/// filter on. Tasks may carry other labels; those are kept as raw strings on
/// the task.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum Status {
    Done,
    Completed,
    #[strum(serialize = "Handed Off")]
    HandedOff,
    Deprecated,
    #[strum(serialize = "Waiting on Reply")]
    WaitingOnReply,
    #[strum(serialize = "Waiting on other task")]
    WaitingOnOtherTask,
}

impl Status {
    /// Statuses excluded from the open-task queries.
    pub const CLOSED: [Status; 5] = [
        Status::Done,
        Status::HandedOff,
        Status::Deprecated,
        Status::WaitingOnReply,
        Status::WaitingOnOtherTask,
    ];
}
