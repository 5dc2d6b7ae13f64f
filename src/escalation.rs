mod machine;
mod state;

pub use machine::{EscalationMachine, EscalationThresholds, Observation, Transition};
pub use state::EscalationState;
