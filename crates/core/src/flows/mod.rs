pub mod engine;
pub mod states;

pub use engine::{FlowEngine, FlowTransitionError};
pub use states::{
    FlowAction, FlowReply, SessionEvent, SessionKey, SessionState, TransitionOutcome,
};
