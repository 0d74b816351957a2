use crate::plugin::{Builders, CapabilityId, Plugin};

/// Renders soft line breaks as newlines instead of spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftBreakAddsNewLinePlugin;

impl SoftBreakAddsNewLinePlugin {
    pub const ID: CapabilityId = "soft-break-adds-new-line";

    pub fn new() -> Self {
        Self
    }
}

impl Plugin for SoftBreakAddsNewLinePlugin {
    fn id(&self) -> CapabilityId {
        Self::ID
    }

    fn configure(&self, builders: &mut Builders) {
        builders.configuration.soft_break_adds_new_line(true);
    }
}
