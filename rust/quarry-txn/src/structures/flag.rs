use crate::transactional::{Changes, Staged, Transactional};

/// A transactional boolean, e.g. "index needs rebuild".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flag(bool);

impl Flag {
    pub const fn new(value: bool) -> Flag {
        Flag(value)
    }

    pub const fn get(self) -> bool {
        self.0
    }
}

/// Pending value of a [`Flag`]; the last `set` wins. Setting the value the base
/// already holds clears the pending value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagChanges(Option<bool>);

impl FlagChanges {
    pub fn set(&mut self, base: Flag, value: bool) {
        self.0 = (value != base.get()).then_some(value);
    }

    pub fn pending(&self) -> Option<bool> {
        self.0
    }
}

impl Changes for FlagChanges {
    fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl Staged<'_, Flag> {
    pub fn set(&mut self, value: bool) {
        let (base, changes) = self.parts();
        changes.set(*base, value);
    }
}

impl Transactional for Flag {
    type Changes = FlagChanges;

    fn apply(&self, changes: &FlagChanges) -> Option<Flag> {
        match changes.0 {
            Some(value) if value != self.0 => Some(Flag(value)),
            _ => None,
        }
    }
}
