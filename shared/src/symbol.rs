use serde::{Deserialize, Serialize};
use std::fmt;

/// A symbol printed on a card corner or center.
///
/// The four kingdoms double as card colors. The three objects only ever appear
/// on corners. `Empty` marks a corner that exists but carries nothing, so it can
/// be covered yet never contributes to the symbol pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Symbol {
    Fungi,
    Animal,
    Plant,
    Insect,
    Inkwell,
    Quill,
    Manuscript,
    Empty,
}

impl Symbol {
    pub const KINGDOMS: [Symbol; 4] = [Symbol::Fungi, Symbol::Animal, Symbol::Plant, Symbol::Insect];
    pub const OBJECTS: [Symbol; 3] = [Symbol::Inkwell, Symbol::Quill, Symbol::Manuscript];

    pub fn is_kingdom(self) -> bool {
        Self::KINGDOMS.contains(&self)
    }

    pub fn is_object(self) -> bool {
        Self::OBJECTS.contains(&self)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbol::Fungi => "FUNGI",
            Symbol::Animal => "ANIMAL",
            Symbol::Plant => "PLANT",
            Symbol::Insect => "INSECT",
            Symbol::Inkwell => "INKWELL",
            Symbol::Quill => "QUILL",
            Symbol::Manuscript => "MANUSCRIPT",
            Symbol::Empty => "EMPTY",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_classes_are_disjoint() {
        for symbol in Symbol::KINGDOMS {
            assert!(symbol.is_kingdom());
            assert!(!symbol.is_object());
        }
        for symbol in Symbol::OBJECTS {
            assert!(symbol.is_object());
            assert!(!symbol.is_kingdom());
        }
        assert!(!Symbol::Empty.is_kingdom());
        assert!(!Symbol::Empty.is_object());
    }

    #[test]
    fn test_symbol_json_names() {
        let json = serde_json::to_string(&Symbol::Manuscript).unwrap();
        assert_eq!(json, "\"MANUSCRIPT\"");
        let back: Symbol = serde_json::from_str("\"FUNGI\"").unwrap();
        assert_eq!(back, Symbol::Fungi);
        assert!(serde_json::from_str::<Symbol>("\"DRAGON\"").is_err());
    }
}
