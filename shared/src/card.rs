use crate::{Symbol, SymbolPool};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type CardId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Front,
    Back,
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Front => f.write_str("front"),
            Face::Back => f.write_str("back"),
        }
    }
}

/// One of the four corners of a card face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CornerDirection {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CornerDirection {
    pub const ALL: [CornerDirection; 4] = [
        CornerDirection::TopLeft,
        CornerDirection::TopRight,
        CornerDirection::BottomLeft,
        CornerDirection::BottomRight,
    ];

    pub fn index(self) -> usize {
        match self {
            CornerDirection::TopLeft => 0,
            CornerDirection::TopRight => 1,
            CornerDirection::BottomLeft => 2,
            CornerDirection::BottomRight => 3,
        }
    }

    /// Grid offset from a card to the diagonal neighbor touching this corner.
    ///
    /// `x` grows to the right and `y` grows upwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            CornerDirection::TopLeft => (-1, 1),
            CornerDirection::TopRight => (1, 1),
            CornerDirection::BottomLeft => (-1, -1),
            CornerDirection::BottomRight => (1, -1),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            CornerDirection::TopLeft => CornerDirection::BottomRight,
            CornerDirection::TopRight => CornerDirection::BottomLeft,
            CornerDirection::BottomLeft => CornerDirection::TopRight,
            CornerDirection::BottomRight => CornerDirection::TopLeft,
        }
    }
}

/// A corner is either missing from the face or present with a symbol.
///
/// `Visible(Symbol::Empty)` is a present but blank corner: other cards may be
/// attached to it, but it adds nothing to the symbol pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    Hidden,
    Visible(Symbol),
}

impl Corner {
    pub fn is_present(self) -> bool {
        matches!(self, Corner::Visible(_))
    }

    /// The symbol this corner contributes to a pool, if any.
    pub fn counted_symbol(self) -> Option<Symbol> {
        match self {
            Corner::Visible(Symbol::Empty) | Corner::Hidden => None,
            Corner::Visible(symbol) => Some(symbol),
        }
    }
}

/// Corners in `CornerDirection::index` order plus permanent center symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    pub corners: [Corner; 4],
    #[serde(default)]
    pub center: Vec<Symbol>,
}

impl CardFace {
    pub fn new(corners: [Corner; 4], center: Vec<Symbol>) -> Self {
        Self { corners, center }
    }

    /// The back of every resource and gold card.
    pub fn plain_back(kingdom: Symbol) -> Self {
        Self {
            corners: [Corner::Visible(Symbol::Empty); 4],
            center: vec![kingdom],
        }
    }

    pub fn corner(&self, direction: CornerDirection) -> Corner {
        self.corners[direction.index()]
    }

    /// Every symbol this face adds to a pool when placed.
    pub fn counted_symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.corners
            .iter()
            .filter_map(|corner| corner.counted_symbol())
            .chain(self.center.iter().copied().filter(|s| *s != Symbol::Empty))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterCard {
    pub id: CardId,
    pub front: CardFace,
    pub back: CardFace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCard {
    pub id: CardId,
    pub kingdom: Symbol,
    pub corners: [Corner; 4],
    #[serde(default)]
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldCard {
    pub id: CardId,
    pub kingdom: Symbol,
    pub corners: [Corner; 4],
    pub points: u32,
    /// Minimum visible count per symbol before the front may be played.
    pub requirement: Vec<(Symbol, u32)>,
}

/// Every kind of card in the game.
///
/// Gold cards share one payload and differ only in how their front scores:
/// a flat value, a value per visible object, or a value per covered corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Card {
    Starter(StarterCard),
    Resource(ResourceCard),
    GoldByCount(GoldCard),
    GoldByObject { gold: GoldCard, object: Symbol },
    GoldByCorner(GoldCard),
}

impl Card {
    pub fn id(&self) -> CardId {
        match self {
            Card::Starter(card) => card.id,
            Card::Resource(card) => card.id,
            Card::GoldByCount(gold) | Card::GoldByObject { gold, .. } | Card::GoldByCorner(gold) => {
                gold.id
            }
        }
    }

    /// Starters have no kingdom.
    pub fn kingdom(&self) -> Option<Symbol> {
        match self {
            Card::Starter(_) => None,
            Card::Resource(card) => Some(card.kingdom),
            Card::GoldByCount(gold) | Card::GoldByObject { gold, .. } | Card::GoldByCorner(gold) => {
                Some(gold.kingdom)
            }
        }
    }

    pub fn is_starter(&self) -> bool {
        matches!(self, Card::Starter(_))
    }

    pub fn is_gold(&self) -> bool {
        matches!(
            self,
            Card::GoldByCount(_) | Card::GoldByObject { .. } | Card::GoldByCorner(_)
        )
    }

    /// What an opponent sees of this card: the symbol printed on its back.
    pub fn back_symbol(&self) -> Option<Symbol> {
        self.kingdom()
    }

    pub fn face(&self, face: Face) -> CardFace {
        match (self, face) {
            (Card::Starter(card), Face::Front) => card.front.clone(),
            (Card::Starter(card), Face::Back) => card.back.clone(),
            (Card::Resource(card), Face::Front) => CardFace::new(card.corners, Vec::new()),
            (
                Card::GoldByCount(gold) | Card::GoldByObject { gold, .. } | Card::GoldByCorner(gold),
                Face::Front,
            ) => CardFace::new(gold.corners, Vec::new()),
            (_, Face::Back) => match self.kingdom() {
                Some(kingdom) => CardFace::plain_back(kingdom),
                None => CardFace::new([Corner::Visible(Symbol::Empty); 4], Vec::new()),
            },
        }
    }

    pub fn corner(&self, face: Face, direction: CornerDirection) -> Corner {
        match (self, face) {
            (Card::Starter(card), Face::Front) => card.front.corner(direction),
            (Card::Starter(card), Face::Back) => card.back.corner(direction),
            (_, Face::Back) => Corner::Visible(Symbol::Empty),
            (Card::Resource(card), Face::Front) => card.corners[direction.index()],
            (
                Card::GoldByCount(gold) | Card::GoldByObject { gold, .. } | Card::GoldByCorner(gold),
                Face::Front,
            ) => gold.corners[direction.index()],
        }
    }

    /// Symbols that must be visible before this face can be played.
    pub fn requirement(&self, face: Face) -> &[(Symbol, u32)] {
        match (self, face) {
            (
                Card::GoldByCount(gold) | Card::GoldByObject { gold, .. } | Card::GoldByCorner(gold),
                Face::Front,
            ) => gold.requirement.as_slice(),
            _ => &[],
        }
    }

    /// Points earned by placing this card.
    ///
    /// `pool` must already include the placement, and `covered` is the number of
    /// corners the placement covered.
    pub fn points_on_play(&self, face: Face, pool: &SymbolPool, covered: u32) -> u32 {
        if face == Face::Back {
            return 0;
        }
        match self {
            Card::Starter(_) => 0,
            Card::Resource(card) => card.points,
            Card::GoldByCount(gold) => gold.points,
            Card::GoldByObject { gold, object } => {
                gold.points * pool.count(*object).max(0) as u32
            }
            Card::GoldByCorner(gold) => gold.points * covered,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Card::Starter(card) => write!(f, "starter #{}", card.id),
            Card::Resource(card) => write!(f, "{} resource #{}", card.kingdom, card.id),
            Card::GoldByCount(gold) => write!(f, "{} gold #{}", gold.kingdom, gold.id),
            Card::GoldByObject { gold, object } => {
                write!(f, "{} gold #{} ({} per {})", gold.kingdom, gold.id, gold.points, object)
            }
            Card::GoldByCorner(gold) => {
                write!(f, "{} gold #{} ({} per corner)", gold.kingdom, gold.id, gold.points)
            }
        }
    }
}
