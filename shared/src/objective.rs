//! Objective scoring.
//!
//! An objective is a pure function of one field. Symbol objectives count how
//! many times a set of visible symbols can be paid for; disposition objectives
//! count non-overlapping copies of a three-card pattern.

use crate::{Grid, Symbol, SymbolPool};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ObjectiveId = u16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolObjective {
    pub id: ObjectiveId,
    pub required: Vec<(Symbol, u32)>,
    pub multiplier: u32,
}

impl SymbolObjective {
    pub fn completions(&self, pool: &SymbolPool) -> u32 {
        self.required
            .iter()
            .filter(|(_, needed)| *needed > 0)
            .map(|(symbol, needed)| pool.count(*symbol).max(0) as u32 / needed)
            .min()
            .unwrap_or(0)
    }
}

/// Three cards of given kingdoms at fixed offsets from the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionObjective {
    pub id: ObjectiveId,
    pub kingdoms: [Symbol; 3],
    /// Offsets of the second and third card from the first.
    pub offsets: [(i32, i32); 2],
    pub multiplier: u32,
}

impl DispositionObjective {
    /// Every placement-index triple matching the pattern, in scan order.
    pub fn occurrences(&self, grid: &Grid) -> Vec<[usize; 3]> {
        let placements = grid.placements();
        let [k0, k1, k2] = self.kingdoms;
        let [d0, d1] = self.offsets;
        let mut found = Vec::new();

        for (i, p0) in placements.iter().enumerate() {
            if p0.card().kingdom() != Some(k0) {
                continue;
            }
            for (j, p1) in placements.iter().enumerate() {
                if p1.card().kingdom() != Some(k1) || p0.position().distance(p1.position()) != d0 {
                    continue;
                }
                for (k, p2) in placements.iter().enumerate() {
                    if p2.card().kingdom() == Some(k2)
                        && p0.position().distance(p2.position()) == d1
                    {
                        found.push([i, j, k]);
                    }
                }
            }
        }
        found
    }

    pub fn completions(&self, grid: &Grid) -> u32 {
        greedy_disjoint_count(self.occurrences(grid))
    }
}

/// Counts pairwise card-disjoint occurrences with a greedy rule.
///
/// Repeatedly takes the occurrence whose cards appear in the fewest remaining
/// occurrences (summed over its three cards; the earliest wins ties), then drops
/// every occurrence sharing a card with it. This is not a maximum matching and
/// must not be replaced by one: scores depend on this exact rule.
pub fn greedy_disjoint_count(mut occurrences: Vec<[usize; 3]>) -> u32 {
    let mut frequency: HashMap<usize, u32> = HashMap::new();
    for occurrence in &occurrences {
        for tile in occurrence {
            *frequency.entry(*tile).or_insert(0) += 1;
        }
    }
    let mut selected = 0;
    loop {
        let Some((best, _)) = occurrences
            .iter()
            .enumerate()
            .min_by_key(|(_, occurrence)| weight(occurrence, &frequency))
        else {
            break;
        };
        let chosen = occurrences.remove(best);
        selected += 1;

        occurrences.retain(|occurrence| {
            let overlaps = occurrence.iter().any(|tile| chosen.contains(tile));
            if overlaps {
                for tile in occurrence {
                    if let Some(count) = frequency.get_mut(tile) {
                        *count = count.saturating_sub(1);
                    }
                }
            }
            !overlaps
        });
    }
    selected
}

fn weight(occurrence: &[usize; 3], frequency: &HashMap<usize, u32>) -> u32 {
    occurrence
        .iter()
        .map(|tile| frequency.get(tile).copied().unwrap_or(0))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    Symbol(SymbolObjective),
    Disposition(DispositionObjective),
}

impl Objective {
    pub fn id(&self) -> ObjectiveId {
        match self {
            Objective::Symbol(objective) => objective.id,
            Objective::Disposition(objective) => objective.id,
        }
    }

    pub fn multiplier(&self) -> u32 {
        match self {
            Objective::Symbol(objective) => objective.multiplier,
            Objective::Disposition(objective) => objective.multiplier,
        }
    }

    pub fn completions(&self, grid: &Grid) -> u32 {
        match self {
            Objective::Symbol(objective) => objective.completions(grid.pool()),
            Objective::Disposition(objective) => objective.completions(grid),
        }
    }

    pub fn score(&self, grid: &Grid) -> u32 {
        self.completions(grid) * self.multiplier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Card, CardFace, Corner, Face, Position, ResourceCard, StarterCard};

    fn open_starter() -> Card {
        Card::Starter(StarterCard {
            id: 1,
            front: CardFace::new([Corner::Visible(Symbol::Empty); 4], Vec::new()),
            back: CardFace::new([Corner::Visible(Symbol::Empty); 4], Vec::new()),
        })
    }

    fn open_card(id: u16, kingdom: Symbol) -> Card {
        Card::Resource(ResourceCard {
            id,
            kingdom,
            corners: [Corner::Visible(Symbol::Empty); 4],
            points: 0,
        })
    }

    /// Twelve fungi on the rising diagonal, plus animals and plants around them.
    fn fungi_diagonal_field() -> Grid {
        let mut grid = Grid::new(open_starter(), Face::Front).unwrap();
        let mut id = 10;
        for step in 1..=12 {
            grid.place(open_card(id, Symbol::Fungi), Face::Front, Position::new(step, step))
                .unwrap();
            id += 1;
        }
        for (x, y, kingdom) in [
            (1, -1, Symbol::Animal),
            (2, -2, Symbol::Animal),
            (-1, 1, Symbol::Plant),
            (-2, 2, Symbol::Fungi),
            (3, 1, Symbol::Plant),
        ] {
            grid.place(open_card(id, kingdom), Face::Back, Position::new(x, y))
                .unwrap();
            id += 1;
        }
        grid
    }

    #[test]
    fn test_symbol_objective_arithmetic() {
        let mut pool = SymbolPool::new();
        for _ in 0..10 {
            pool.add(Symbol::Fungi);
            pool.add(Symbol::Quill);
        }
        let objective = SymbolObjective {
            id: 1,
            required: vec![(Symbol::Fungi, 2), (Symbol::Quill, 1)],
            multiplier: 3,
        };
        assert_eq!(objective.completions(&pool), 5);
        assert_eq!(objective.completions(&pool) * objective.multiplier, 15);
    }

    #[test]
    fn test_symbol_objective_limited_by_scarcest_symbol() {
        let mut pool = SymbolPool::new();
        for _ in 0..7 {
            pool.add(Symbol::Plant);
        }
        pool.add(Symbol::Inkwell);
        let objective = SymbolObjective {
            id: 2,
            required: vec![(Symbol::Plant, 3), (Symbol::Inkwell, 1), (Symbol::Quill, 1)],
            multiplier: 2,
        };
        assert_eq!(objective.completions(&pool), 0);

        pool.add(Symbol::Quill);
        pool.add(Symbol::Quill);
        assert_eq!(objective.completions(&pool), 1);
    }

    #[test]
    fn test_disposition_objective_on_diagonal() {
        let grid = fungi_diagonal_field();
        let objective = Objective::Disposition(DispositionObjective {
            id: 3,
            kingdoms: [Symbol::Fungi; 3],
            offsets: [(1, 1), (2, 2)],
            multiplier: 3,
        });
        assert_eq!(objective.completions(&grid), 4);
        assert_eq!(objective.score(&grid), 12);
    }

    #[test]
    fn test_disposition_objective_without_matching_cards() {
        let grid = fungi_diagonal_field();
        let objective = Objective::Disposition(DispositionObjective {
            id: 4,
            kingdoms: [Symbol::Insect; 3],
            offsets: [(1, 1), (2, 2)],
            multiplier: 10,
        });
        assert_eq!(objective.completions(&grid), 0);
        assert_eq!(objective.score(&grid), 0);
    }

    #[test]
    fn test_occurrences_are_listed_in_scan_order() {
        let grid = fungi_diagonal_field();
        let objective = DispositionObjective {
            id: 5,
            kingdoms: [Symbol::Fungi; 3],
            offsets: [(1, 1), (2, 2)],
            multiplier: 2,
        };
        let occurrences = objective.occurrences(&grid);
        assert_eq!(occurrences.len(), 10);
        assert_eq!(occurrences[0], [1, 2, 3]);
        assert_eq!(occurrences[9], [10, 11, 12]);
    }

    #[test]
    fn test_greedy_selection_drops_overlapping_occurrences() {
        // Taking 0-1-2 first rules out the two occurrences sharing cards 1 and 2.
        let occurrences = vec![[0, 1, 2], [1, 6, 7], [2, 3, 4], [3, 4, 5], [6, 7, 8]];
        assert_eq!(greedy_disjoint_count(occurrences), 3);
    }

    #[test]
    fn test_greedy_is_not_exact() {
        // [0, 3, 4] and [1, 5, 6] are disjoint, but all five occurrences weigh
        // the same and the first one listed blocks every other.
        let occurrences = vec![[0, 1, 2], [0, 3, 4], [1, 5, 6], [0, 3, 5], [1, 4, 6]];
        assert_eq!(greedy_disjoint_count(occurrences), 1);

        let reordered = vec![[0, 3, 4], [0, 1, 2], [1, 5, 6], [0, 3, 5], [1, 4, 6]];
        assert_eq!(greedy_disjoint_count(reordered), 2);
    }

    #[test]
    fn test_greedy_on_empty_input() {
        assert_eq!(greedy_disjoint_count(Vec::new()), 0);
    }

    #[test]
    fn test_objective_json_round_trip() {
        let objective = Objective::Symbol(SymbolObjective {
            id: 7,
            required: vec![(Symbol::Quill, 2)],
            multiplier: 2,
        });
        let json = serde_json::to_string(&objective).unwrap();
        assert!(json.contains("\"Symbol\""));
        assert_eq!(serde_json::from_str::<Objective>(&json).unwrap(), objective);
    }
}
