use std::{
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
};

/// Comparison key for human-entered names: trimmed and lowercased.
fn normalized_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

macro_rules! normalized_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            display: String,
            key: String,
        }

        impl $name {
            pub fn new(raw: impl AsRef<str>) -> $name {
                let raw = raw.as_ref();
                $name {
                    display: raw.trim().to_owned(),
                    key: normalized_key(raw),
                }
            }

            /// The normalized key used for equality.
            pub fn key(&self) -> &str {
                &self.key
            }

            pub fn is_blank(&self) -> bool {
                self.key.is_empty()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.key.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.key.cmp(&other.key)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.display)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.display
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name::new(value)
            }
        }
    };
}

normalized_name!(
    /// A player's full name as entered by a human. Compared case-insensitively, ignoring
    /// surrounding whitespace; the trimmed original is kept for display.
    PlayerName
);

normalized_name!(
    /// A division name, compared the same way as player names.
    Division
);

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{Division, PlayerName};

    #[test]
    fn case_and_whitespace_insensitive() {
        assert_eq!(PlayerName::new("  John Smith "), PlayerName::new("john smith"));
        assert_eq!(Division::new("FRIDAY 8-Ball"), Division::new("friday 8-ball\t"));
    }

    #[test]
    fn keeps_trimmed_display() {
        let name = PlayerName::new("  Jane Doe  ");
        assert_eq!(name.to_string(), "Jane Doe");
        assert_eq!(name.key(), "jane doe");
    }

    #[test]
    fn hashes_by_key() {
        let names: HashSet<_> = ["Ann", "ANN", " ann "].into_iter().map(PlayerName::new).collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn blank() {
        assert!(PlayerName::new("   ").is_blank());
        assert!(!PlayerName::new("x").is_blank());
    }
}
