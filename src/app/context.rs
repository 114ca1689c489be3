use uuid::Uuid;

/// Scope of every read and mutation in this service. Passed explicitly
/// through all calls; concurrent sessions never share mutable state
/// keyed on anything wider than this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityContext {
    pub hub_id: Uuid,
    pub user_id: Uuid,
}

impl ActivityContext {
    pub fn new(hub_id: Uuid, user_id: Uuid) -> Self {
        Self { hub_id, user_id }
    }
}
