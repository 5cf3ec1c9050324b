//! Game manifest: the engine-provided objects a game wants, plus its content

use super::object::ObjectSpec;

/// Engine-provided objects a game can opt into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalObject {
    /// Fire `InputAction`s on update-eligible objects
    InputBinder,
    /// Register the `INTERNAL_ui_host` object
    UiHost,
}

#[derive(Default)]
pub struct Game {
    pub internal_objects: Vec<InternalObject>,
    /// Content objects, imported in order after the internal ones
    pub objects: Vec<ObjectSpec>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_internal(mut self, internal: InternalObject) -> Self {
        if !self.internal_objects.contains(&internal) {
            self.internal_objects.push(internal);
        }
        self
    }

    pub fn with_object(mut self, spec: ObjectSpec) -> Self {
        self.objects.push(spec);
        self
    }
}
