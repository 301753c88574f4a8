//! Static card and objective definitions.

use crate::{
    Card, CardFace, CardId, Corner, DispositionObjective, GoldCard, Objective, ResourceCard,
    StarterCard, Symbol, SymbolObjective,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug)]
pub enum CatalogError {
    Format(serde_json::Error),
    /// A card sits in the wrong list, e.g. a gold card among the resources.
    WrongKind { id: CardId, list: &'static str },
    DuplicateId { id: u16 },
    TooFew { list: &'static str, needed: usize, available: usize },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Format(err) => write!(f, "Invalid catalog file: {}", err),
            CatalogError::WrongKind { id, list } => {
                write!(f, "Card {} does not belong in the {} list", id, list)
            }
            CatalogError::DuplicateId { id } => write!(f, "Id {} is used twice", id),
            CatalogError::TooFew {
                list,
                needed,
                available,
            } => write!(f, "Need {} {} but the catalog has {}", needed, list, available),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Format(err)
    }
}

/// All the cards and objectives a match is dealt from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCatalog {
    pub starters: Vec<Card>,
    pub resources: Vec<Card>,
    pub golds: Vec<Card>,
    pub objectives: Vec<Objective>,
}

impl CardCatalog {
    /// Parses and checks a catalog written as JSON.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: CardCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let lists: [(&'static str, &Vec<Card>, fn(&Card) -> bool); 3] = [
            ("starter", &self.starters, Card::is_starter),
            ("resource", &self.resources, |c| matches!(c, Card::Resource(_))),
            ("gold", &self.golds, Card::is_gold),
        ];
        let mut ids = HashSet::new();
        for (list, cards, belongs) in lists {
            for card in cards {
                if !belongs(card) {
                    return Err(CatalogError::WrongKind { id: card.id(), list });
                }
                if !ids.insert(card.id()) {
                    return Err(CatalogError::DuplicateId { id: card.id() });
                }
            }
        }
        let mut objective_ids = HashSet::new();
        for objective in &self.objectives {
            if !objective_ids.insert(objective.id()) {
                return Err(CatalogError::DuplicateId { id: objective.id() });
            }
        }
        Ok(())
    }

    /// Checks that a match of `players` can be dealt.
    pub fn ensure_playable(&self, players: usize) -> Result<(), CatalogError> {
        let needs = [
            ("starters", players, self.starters.len()),
            ("resources", players * 2 + 2, self.resources.len()),
            ("golds", players + 2, self.golds.len()),
            ("objectives", players * 2 + 2, self.objectives.len()),
        ];
        for (list, needed, available) in needs {
            if available < needed {
                return Err(CatalogError::TooFew {
                    list,
                    needed,
                    available,
                });
            }
        }
        Ok(())
    }

    /// The built-in set: 40 resources, 40 golds, 6 starters and 16 objectives.
    pub fn standard() -> Self {
        let mut resources = Vec::new();
        let mut golds = Vec::new();
        let mut next_id: CardId = 1;
        for (index, kingdom) in Symbol::KINGDOMS.into_iter().enumerate() {
            let object = Symbol::OBJECTS[index % Symbol::OBJECTS.len()];
            for (pattern, points) in RESOURCE_PATTERNS {
                resources.push(Card::Resource(ResourceCard {
                    id: next_id,
                    kingdom,
                    corners: corners(pattern, kingdom, object),
                    points,
                }));
                next_id += 1;
            }
        }
        for (index, kingdom) in Symbol::KINGDOMS.into_iter().enumerate() {
            let neighbor = Symbol::KINGDOMS[(index + 1) % Symbol::KINGDOMS.len()];
            for n in 0..10 {
                golds.push(standard_gold(next_id, kingdom, neighbor, n));
                next_id += 1;
            }
        }
        let starters = STARTERS
            .iter()
            .map(|(front, center, back)| {
                let card = Card::Starter(StarterCard {
                    id: next_id,
                    front: CardFace::new(starter_corners(front), center.to_vec()),
                    back: CardFace::new(starter_corners(back), Vec::new()),
                });
                next_id += 1;
                card
            })
            .collect();

        Self {
            starters,
            resources,
            golds,
            objectives: standard_objectives(),
        }
    }
}

/// Corner patterns in `TopLeft, TopRight, BottomLeft, BottomRight` order:
/// `K` kingdom, `O` object, `E` blank, `H` hidden.
const RESOURCE_PATTERNS: [(&str, u32); 10] = [
    ("KKEH", 0),
    ("KHKE", 0),
    ("EKHK", 0),
    ("HEKK", 0),
    ("KOEH", 0),
    ("HKOE", 0),
    ("EHKO", 0),
    ("KEHE", 1),
    ("HKEE", 1),
    ("EEHK", 1),
];

fn corners(pattern: &str, kingdom: Symbol, object: Symbol) -> [Corner; 4] {
    let mut corners = [Corner::Hidden; 4];
    for (corner, code) in corners.iter_mut().zip(pattern.chars()) {
        *corner = match code {
            'K' => Corner::Visible(kingdom),
            'O' => Corner::Visible(object),
            'E' => Corner::Visible(Symbol::Empty),
            _ => Corner::Hidden,
        };
    }
    corners
}

fn standard_gold(id: CardId, kingdom: Symbol, neighbor: Symbol, n: usize) -> Card {
    const ROTATIONS: [&str; 4] = ["EEHO", "HEEO", "EHOE", "OEEH"];
    let pattern = ROTATIONS[n % ROTATIONS.len()];
    match n {
        0..=2 => {
            let object = Symbol::OBJECTS[n];
            Card::GoldByObject {
                gold: GoldCard {
                    id,
                    kingdom,
                    corners: corners(pattern, kingdom, object),
                    points: 1,
                    requirement: vec![(kingdom, 2), (neighbor, 1)],
                },
                object,
            }
        }
        3..=5 => Card::GoldByCorner(GoldCard {
            id,
            kingdom,
            corners: corners(pattern, kingdom, Symbol::Empty),
            points: 2,
            requirement: vec![(kingdom, 3), (neighbor, 1)],
        }),
        9 => Card::GoldByCount(GoldCard {
            id,
            kingdom,
            corners: corners("EHHE", kingdom, Symbol::Empty),
            points: 5,
            requirement: vec![(kingdom, 5)],
        }),
        _ => {
            let object = Symbol::OBJECTS[n % Symbol::OBJECTS.len()];
            Card::GoldByCount(GoldCard {
                id,
                kingdom,
                corners: corners(pattern, kingdom, object),
                points: 3,
                requirement: vec![(kingdom, 3)],
            })
        }
    }
}

/// Starter faces: front corners, front center, back corners.
/// Corner letters are kingdom initials, `E` blank, `H` hidden.
const STARTERS: [(&str, &[Symbol], &str); 6] = [
    ("EPEI", &[Symbol::Insect], "FPAI"),
    ("AEEF", &[Symbol::Fungi], "PAIF"),
    ("EEEE", &[Symbol::Plant, Symbol::Fungi], "IAFP"),
    ("EEEE", &[Symbol::Animal, Symbol::Insect], "PIFA"),
    ("EEHH", &[Symbol::Animal, Symbol::Insect, Symbol::Plant], "FAPI"),
    ("EEHH", &[Symbol::Plant, Symbol::Animal, Symbol::Fungi], "IFAP"),
];

fn starter_corners(pattern: &str) -> [Corner; 4] {
    let mut corners = [Corner::Hidden; 4];
    for (corner, code) in corners.iter_mut().zip(pattern.chars()) {
        *corner = match code {
            'F' => Corner::Visible(Symbol::Fungi),
            'A' => Corner::Visible(Symbol::Animal),
            'P' => Corner::Visible(Symbol::Plant),
            'I' => Corner::Visible(Symbol::Insect),
            'E' => Corner::Visible(Symbol::Empty),
            _ => Corner::Hidden,
        };
    }
    corners
}

fn standard_objectives() -> Vec<Objective> {
    let mut objectives = Vec::new();
    let mut id = 87;
    let mut push = |objective: fn(u16) -> Objective| {
        objectives.push(objective(id));
        id += 1;
    };

    // Diagonals of one kingdom.
    push(|id| diagonal(id, Symbol::Fungi, 1));
    push(|id| diagonal(id, Symbol::Plant, -1));
    push(|id| diagonal(id, Symbol::Animal, 1));
    push(|id| diagonal(id, Symbol::Insect, -1));

    // Two stacked cards with a third hanging off a corner.
    push(|id| l_shape(id, [Symbol::Fungi, Symbol::Fungi, Symbol::Plant], [(0, -2), (1, -3)]));
    push(|id| l_shape(id, [Symbol::Plant, Symbol::Plant, Symbol::Insect], [(0, -2), (-1, -3)]));
    push(|id| l_shape(id, [Symbol::Animal, Symbol::Animal, Symbol::Fungi], [(0, 2), (1, 3)]));
    push(|id| l_shape(id, [Symbol::Insect, Symbol::Insect, Symbol::Animal], [(0, 2), (-1, 3)]));

    push(|id| symbols(id, &[(Symbol::Fungi, 3)], 2));
    push(|id| symbols(id, &[(Symbol::Plant, 3)], 2));
    push(|id| symbols(id, &[(Symbol::Animal, 3)], 2));
    push(|id| symbols(id, &[(Symbol::Insect, 3)], 2));
    push(|id| symbols(id, &[(Symbol::Quill, 2)], 2));
    push(|id| symbols(id, &[(Symbol::Inkwell, 2)], 2));
    push(|id| symbols(id, &[(Symbol::Manuscript, 2)], 2));
    push(|id| {
        symbols(
            id,
            &[(Symbol::Quill, 1), (Symbol::Inkwell, 1), (Symbol::Manuscript, 1)],
            3,
        )
    });

    objectives
}

fn diagonal(id: u16, kingdom: Symbol, dx: i32) -> Objective {
    Objective::Disposition(DispositionObjective {
        id,
        kingdoms: [kingdom; 3],
        offsets: [(dx, 1), (2 * dx, 2)],
        multiplier: 2,
    })
}

fn l_shape(id: u16, kingdoms: [Symbol; 3], offsets: [(i32, i32); 2]) -> Objective {
    Objective::Disposition(DispositionObjective {
        id,
        kingdoms,
        offsets,
        multiplier: 3,
    })
}

fn symbols(id: u16, required: &[(Symbol, u32)], multiplier: u32) -> Objective {
    Objective::Symbol(SymbolObjective {
        id,
        required: required.to_vec(),
        multiplier,
    })
}
