/// Escalation state of a tracked object, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    /// Not inside any restricted zone
    #[default]
    Clear,
    /// Inside a zone, dwell timer running
    Watching,
    /// Warning threshold crossed
    Warned,
    /// Violation threshold crossed; a record has been emitted for this episode
    Violating,
}
