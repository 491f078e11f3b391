use bimap::BiMap;

use super::{types::PlayerName, RequirementEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerId(pub u32);

/// Stable ids for the players appearing on a division roster.
///
/// Matching still happens by normalized name. The directory exists so that names which
/// don't belong to anyone on the roster (typos, renamed players) can be spotted.
#[derive(Debug, Default)]
pub struct PlayerDirectory {
    players: BiMap<PlayerId, PlayerName>,
}

impl PlayerDirectory {
    pub fn from_roster<'a>(entries: impl IntoIterator<Item = &'a RequirementEntry>) -> Self {
        let mut directory = PlayerDirectory::default();

        for entry in entries {
            directory.register(&entry.player_a);
            directory.register(&entry.player_b);
        }

        directory
    }

    /// Returns the id for `name`, allocating the next one if the name is new.
    pub fn register(&mut self, name: &PlayerName) -> PlayerId {
        if let Some(id) = self.players.get_by_right(name) {
            return *id;
        }

        let id = PlayerId(self.players.len() as _);
        self.players.insert(id, name.clone());
        id
    }

    pub fn id_of(&self, name: &PlayerName) -> Option<PlayerId> {
        self.players.get_by_right(name).copied()
    }

    pub fn name_of(&self, id: PlayerId) -> Option<&PlayerName> {
        self.players.get_by_left(&id)
    }

    pub fn contains(&self, name: &PlayerName) -> bool {
        self.players.contains_right(name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{PlayerDirectory, PlayerId};
    use crate::models::{
        types::{Division, PlayerName},
        RequirementEntry,
    };

    fn entry(a: &str, b: &str) -> RequirementEntry {
        RequirementEntry {
            division: Division::new("D"),
            phase: None,
            player_a: PlayerName::new(a),
            player_b: PlayerName::new(b),
        }
    }

    #[test]
    fn ids_are_stable_across_spellings() {
        let roster = [entry("Ann", "Bob"), entry("bob ", "Cid"), entry("ANN", "cid")];
        let directory = PlayerDirectory::from_roster(&roster);

        assert_eq!(directory.len(), 3);
        assert_eq!(directory.id_of(&PlayerName::new("ann")), Some(PlayerId(0)));
        assert_eq!(directory.id_of(&PlayerName::new("BOB")), Some(PlayerId(1)));
        assert_eq!(directory.name_of(PlayerId(2)).map(|n| n.to_string()), Some("Cid".to_string()));
        assert!(!directory.contains(&PlayerName::new("Dee")));
    }
}
