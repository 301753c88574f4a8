//! One player's field: the cards they placed and the symbols left visible.
//!
//! Cards sit on a diagonal lattice. Two cards touch when their positions differ
//! by one step on both axes, and the newer card covers the corner of the older
//! card it overlaps. Only positions with an even coordinate sum hold cards.

use crate::{Card, CornerDirection, Face, GridError, Symbol, SymbolPool};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cards may only occupy positions where `x + y` is even.
    pub fn is_on_lattice(self) -> bool {
        (i64::from(self.x) + i64::from(self.y)).rem_euclid(2) == 0
    }

    /// Offset from `self` to `other`.
    pub fn distance(self, other: Position) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// None when the result falls outside the coordinate range.
    pub fn translate(self, (dx, dy): (i32, i32)) -> Option<Position> {
        Some(Position::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    pub fn neighbor(self, direction: CornerDirection) -> Option<Position> {
        self.translate(direction.offset())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which corner of an existing card a new card covers.
///
/// `offset` goes from the new card to the existing neighbor. A neighbor up and
/// to the right, `(1, 1)`, loses its bottom-left corner. Anything other than a
/// single diagonal step is a caller error.
pub fn covered_corner((dx, dy): (i32, i32)) -> Result<CornerDirection, GridError> {
    match (dx, dy) {
        (1, 1) => Ok(CornerDirection::BottomLeft),
        (-1, 1) => Ok(CornerDirection::BottomRight),
        (1, -1) => Ok(CornerDirection::TopLeft),
        (-1, -1) => Ok(CornerDirection::TopRight),
        _ => Err(GridError::NoCoveredCorner { dx, dy }),
    }
}

/// A card on a field. Never modified once placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    card: Card,
    face: Face,
    position: Position,
}

impl Placement {
    pub fn new(card: Card, face: Face, position: Position) -> Self {
        Self {
            card,
            face,
            position,
        }
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

/// The cards placed on one field, in placement order, and their visible symbols.
///
/// The first placement is always the starter at the origin. The pool is kept in
/// step with every placement and never rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    placements: Vec<Placement>,
    occupied: HashMap<Position, usize>,
    pool: SymbolPool,
}

impl Grid {
    /// Starts a field with its starter card at the origin.
    pub fn new(starter: Card, face: Face) -> Result<Self, GridError> {
        if !starter.is_starter() {
            return Err(GridError::MissingStarter);
        }
        let mut pool = SymbolPool::new();
        for symbol in starter.face(face).counted_symbols() {
            pool.add(symbol);
        }
        let mut occupied = HashMap::new();
        occupied.insert(Position::ORIGIN, 0);

        Ok(Self {
            placements: vec![Placement::new(starter, face, Position::ORIGIN)],
            occupied,
            pool,
        })
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn starter(&self) -> &Placement {
        &self.placements[0]
    }

    pub fn pool(&self) -> &SymbolPool {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn get(&self, position: Position) -> Option<&Placement> {
        self.occupied
            .get(&position)
            .map(|index| &self.placements[*index])
    }

    pub fn index_at(&self, position: Position) -> Option<usize> {
        self.occupied.get(&position).copied()
    }

    /// Whether a card could be placed at `position`.
    ///
    /// The position must be free and on the lattice, every card touching it
    /// must have its facing corner, and at least one card must touch it.
    pub fn is_placeable(&self, position: Position) -> bool {
        if self.occupied.contains_key(&position) || !position.is_on_lattice() {
            return false;
        }

        let mut attached = false;
        for direction in CornerDirection::ALL {
            let Some(neighbor_position) = position.neighbor(direction) else {
                continue;
            };
            let Some(neighbor) = self.get(neighbor_position) else {
                continue;
            };
            let Ok(corner) = covered_corner(position.distance(neighbor_position)) else {
                continue;
            };
            if !neighbor.card.corner(neighbor.face, corner).is_present() {
                return false;
            }
            attached = true;
        }
        attached
    }

    /// Every free position that currently accepts a card.
    pub fn available_positions(&self) -> Vec<Position> {
        let mut candidates: Vec<Position> = self
            .placements
            .iter()
            .flat_map(|p| CornerDirection::ALL.map(|d| p.position.neighbor(d)))
            .flatten()
            .filter(|position| self.is_placeable(*position))
            .collect();
        candidates.sort();
        candidates.dedup();
        candidates
    }

    /// Places a card and updates the pool.
    ///
    /// The new card's symbols are added first, then the symbols on the corners it
    /// covers are removed. Returns how many corners were covered.
    pub fn place(&mut self, card: Card, face: Face, position: Position) -> Result<u32, GridError> {
        if card.is_starter() {
            return Err(GridError::StarterAlreadyPlaced);
        }
        if !self.is_placeable(position) {
            return Err(GridError::IllegalPosition { position });
        }

        for symbol in card.face(face).counted_symbols() {
            self.pool.add(symbol);
        }

        let mut covered = 0;
        for direction in CornerDirection::ALL {
            let Some(neighbor_position) = position.neighbor(direction) else {
                continue;
            };
            let Some(neighbor) = self.get(neighbor_position) else {
                continue;
            };
            let corner = covered_corner(position.distance(neighbor_position))?;
            let hidden = neighbor.card.corner(neighbor.face, corner).counted_symbol();
            covered += 1;
            if let Some(symbol) = hidden {
                self.pool.remove(symbol);
            }
        }

        self.occupied.insert(position, self.placements.len());
        self.placements.push(Placement::new(card, face, position));
        Ok(covered)
    }

    /// Rebuilds the set of visible symbols from scratch.
    ///
    /// A corner is hidden exactly when a later placement sits on the diagonal
    /// it points to. Used to audit the incremental pool.
    pub fn recount(&self) -> SymbolPool {
        let mut pool = SymbolPool::new();
        for (index, placement) in self.placements.iter().enumerate() {
            let face = placement.card.face(placement.face);
            for symbol in face.center.iter().filter(|s| **s != Symbol::Empty) {
                pool.add(*symbol);
            }
            for direction in CornerDirection::ALL {
                let covered = placement
                    .position
                    .neighbor(direction)
                    .and_then(|neighbor| self.index_at(neighbor))
                    .map_or(false, |other| other > index);
                if covered {
                    continue;
                }
                if let Some(symbol) = face.corner(direction).counted_symbol() {
                    pool.add(symbol);
                }
            }
        }
        pool
    }
}
