//! Domain types shared by the runtime and front ends.

mod spec;
mod status;

pub use spec::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_ECHO_COMMAND, DEFAULT_STOP_TIMEOUT, DEFAULT_STOP_WAIT,
    LaunchCommand, ServerSpec, StopStrategy,
};
pub use status::{
    LifecycleState, OutputLine, OutputStream, ServerEvent, ServerSnapshot, ServerStatus,
    StopOutcome,
};
