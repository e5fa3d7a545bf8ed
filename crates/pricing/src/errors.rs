use thiserror::Error;

/// Errors raised while constructing or evaluating a round schedule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("round schedule must contain at least one round")]
    Empty,

    #[error("round goals and rates differ in length: {goals} goals, {rates} rates")]
    LengthMismatch { goals: usize, rates: usize },

    #[error("round goal at index {index} does not exceed the previous goal")]
    NonIncreasingGoal { index: usize },

    #[error("round rate at index {index} is zero")]
    ZeroRate { index: usize },

    #[error("arithmetic overflow while pricing a contribution: {0}")]
    ArithmeticOverflow(&'static str),
}
