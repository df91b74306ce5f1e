use crate::{ConnectionId, Participant};

/// Members of one room, kept in join order.
#[derive(Debug, Default)]
pub struct Presence {
    participants: Vec<Participant>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `participant`. A connection that is already present keeps its
    /// slot and gets its display attributes replaced.
    pub fn insert(&mut self, participant: Participant) {
        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.id == participant.id)
        {
            *existing = participant;
        } else {
            self.participants.push(participant);
        }
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.id == connection_id)?;
        Some(self.participants.remove(index))
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == connection_id)
    }

    pub fn list(&self) -> Vec<Participant> {
        self.participants.clone()
    }

    pub fn connection_ids(&self) -> impl Iterator<Item = &ConnectionId> + '_ {
        self.participants.iter().map(|p| &p.id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: ConnectionId, name: &str) -> Participant {
        Participant {
            id,
            username: name.into(),
            color: "#000000".into(),
        }
    }

    #[test]
    fn it_lists_participants_in_join_order() {
        let mut presence = Presence::new();
        presence.insert(participant(3, "Carol"));
        presence.insert(participant(1, "Alice"));
        presence.insert(participant(2, "Bob"));
        presence.remove(&1);

        let names: Vec<_> = presence.list().into_iter().map(|p| p.username).collect();
        assert_eq!(names, vec!["Carol", "Bob"]);
    }

    #[test]
    fn it_replaces_attributes_in_place_on_reinsert() {
        let mut presence = Presence::new();
        presence.insert(participant(1, "Alice"));
        presence.insert(participant(2, "Bob"));
        presence.insert(participant(1, "Alicia"));

        assert_eq!(presence.len(), 2);
        assert_eq!(presence.list()[0].username, "Alicia");
    }

    #[test]
    fn it_ignores_removal_of_unknown_connection() {
        let mut presence = Presence::new();
        assert!(presence.remove(&9).is_none());
        assert!(presence.is_empty());
    }
}
