use std::collections::HashSet;

/// Outcome of a join or leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    /// Cardinality after the operation.
    pub count: usize,
    /// False when the name was already in (join) or already out (leave).
    pub changed: bool,
}

/// Names of the participants currently connected to the room.
///
/// Membership is per name, not per connection: a second socket with the
/// same name does not add a member, and the first leave removes it.
#[derive(Debug, Default)]
pub struct PresenceSet {
    names: HashSet<String>,
}

impl PresenceSet {
    pub fn join(&mut self, name: &str) -> Change {
        let changed = self.names.insert(name.to_string());
        Change {
            count: self.count(),
            changed,
        }
    }

    pub fn leave(&mut self, name: &str) -> Change {
        let changed = self.names.remove(name);
        Change {
            count: self.count(),
            changed,
        }
    }

    pub fn count(&self) -> usize {
        self.names.len()
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
