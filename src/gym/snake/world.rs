use std::{
    collections::{HashSet, VecDeque},
    fmt,
};

use log::{debug, trace, warn};
use rand::{
    rngs::StdRng,
    seq::{IteratorRandom, SliceRandom},
    Rng, SeedableRng,
};
use serde::{Deserialize, Serialize};
use strum::VariantArray;

use crate::{Error, Result};

/// Length of the snake after a reset
pub const INITIAL_LENGTH: usize = 3;

/// A cell on the board, signed so that a head stepping off the left or top edge is representable
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `dir`
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn in_bounds(self, grid_size: i32) -> bool {
        (0..grid_size).contains(&self.x) && (0..grid_size).contains(&self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// A heading on the board, in action order
#[derive(VariantArray, Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl Direction {
    /// Unit vector `(dx, dy)`, with `y` growing downwards
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ItemKind {
    /// Grows the snake by one when eaten
    Beneficial,
    /// Shrinks the snake by one when eaten
    Harmful,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    pub kind: ItemKind,
    pub position: Position,
}

/// The single outcome of a simulation step
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Event {
    /// Nothing has happened yet since the last reset
    #[default]
    None,
    NoCollision,
    BeneficialEaten,
    HarmfulEaten,
    Died,
}

/// Configuration for a [`GridWorld`]
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Width and height of the square board
    ///
    /// **Default**: `10`
    pub grid_size: usize,
    /// Number of beneficial items on the board at all times
    ///
    /// **Default**: `2`
    pub beneficial_items: usize,
    /// Number of harmful items on the board at all times
    ///
    /// **Default**: `1`
    pub harmful_items: usize,
    /// Start each episode at a uniformly random position and heading instead of the fixed start
    ///
    /// **Default**: `false`
    pub random_start: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            beneficial_items: 2,
            harmful_items: 1,
            random_start: false,
        }
    }
}

impl WorldConfig {
    /// Reject boards that cannot hold a fresh snake plus every item
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < INITIAL_LENGTH || self.grid_size > i16::MAX as usize {
            return Err(Error::Configuration(format!(
                "grid size must be between {} and {}, got {}",
                INITIAL_LENGTH,
                i16::MAX,
                self.grid_size
            )));
        }
        let crowded = || {
            Error::Configuration(format!(
                "a {0}x{0} board cannot hold a snake, {1} beneficial and {2} harmful items",
                self.grid_size, self.beneficial_items, self.harmful_items
            ))
        };
        let needed = INITIAL_LENGTH
            .checked_add(self.beneficial_items)
            .and_then(|n| n.checked_add(self.harmful_items))
            .ok_or_else(crowded)?;
        if needed > self.grid_size * self.grid_size {
            return Err(crowded());
        }
        Ok(())
    }
}

/// The snake simulation: a body, a heading, a set of items and the outcome of the last step
///
/// All randomness comes from the world's own [`StdRng`], so a seeded world replays identically.
pub struct GridWorld {
    config: WorldConfig,
    snake: VecDeque<Position>,
    heading: Direction,
    items: Vec<Item>,
    last_event: Event,
    /// Set when an eaten item found no vacant cell; cleared by [`GridWorld::reset`]
    halted: bool,
    rng: StdRng,
}

impl GridWorld {
    /// Create a world seeded from system entropy and reset it
    pub fn new(config: WorldConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a reproducible world and reset it
    pub fn with_seed(config: WorldConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: WorldConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let mut world = Self {
            config,
            snake: VecDeque::with_capacity(INITIAL_LENGTH),
            heading: Direction::Right,
            items: Vec::new(),
            last_event: Event::None,
            halted: false,
            rng,
        };
        world.reset()?;
        Ok(world)
    }

    /// Place a fresh 3-cell snake and scatter the items on empty cells
    ///
    /// The fixed start lays the snake along the middle row against the left wall, facing right.
    pub fn reset(&mut self) -> Result<()> {
        let size = self.size();
        let (head, heading) = if self.config.random_start {
            let heading = *Direction::VARIANTS
                .choose(&mut self.rng)
                .expect("there are four directions");
            // the tail lies two cells behind the head and must stay on the board
            let (dx, dy) = heading.delta();
            let x = self.rng.gen_range((2 * dx).max(0)..size + (2 * dx).min(0));
            let y = self.rng.gen_range((2 * dy).max(0)..size + (2 * dy).min(0));
            (Position::new(x, y), heading)
        } else {
            (Position::new(INITIAL_LENGTH as i32 - 1, size / 2), Direction::Right)
        };

        let behind = heading.opposite();
        self.snake.clear();
        self.snake.push_back(head);
        for _ in 1..INITIAL_LENGTH {
            let tail = *self.snake.back().expect("snake is not empty");
            self.snake.push_back(tail.step(behind));
        }
        self.heading = heading;
        self.last_event = Event::None;
        self.halted = false;

        self.items.clear();
        let kinds = std::iter::repeat(ItemKind::Beneficial)
            .take(self.config.beneficial_items)
            .chain(std::iter::repeat(ItemKind::Harmful).take(self.config.harmful_items));
        for kind in kinds {
            let position = self.vacant_cell()?;
            self.items.push(Item { kind, position });
        }

        debug!("world reset: head {:?} heading {:?}", head, heading);
        Ok(())
    }

    /// Advance the simulation by one step and classify what happened
    ///
    /// A request to reverse into the neck is ignored and the current heading is kept.
    ///
    /// **Errors**
    /// - [`Error::InvalidTransition`] if the snake has already died or the world is halted
    /// - [`Error::CapacityExhausted`] if an eaten item has nowhere to go. The world is left as it
    ///   was before the step and halts until the next reset.
    pub fn step(&mut self, direction: Direction) -> Result<Event> {
        if self.is_terminal() {
            return Err(Error::InvalidTransition("cannot step a world whose snake has died"));
        }
        if self.halted {
            return Err(Error::InvalidTransition("cannot step a world whose board is full"));
        }

        let heading = if direction == self.heading.opposite() {
            self.heading
        } else {
            direction
        };
        let new_head = self.head().step(heading);

        let event = if !new_head.in_bounds(self.size()) || self.snake.contains(&new_head) {
            Event::Died
        } else {
            match self.item_at(new_head) {
                Some((ix, ItemKind::Beneficial)) => {
                    let position = self
                        .vacant_cell_after(new_head, 0)
                        .map_err(|err| self.halt(err))?;
                    self.snake.push_front(new_head);
                    self.relocate(ix, position);
                    Event::BeneficialEaten
                }
                Some((_, ItemKind::Harmful)) if self.snake.len() == 1 => Event::Died,
                Some((ix, ItemKind::Harmful)) => {
                    let position = self
                        .vacant_cell_after(new_head, 2)
                        .map_err(|err| self.halt(err))?;
                    self.snake.push_front(new_head);
                    self.snake.pop_back();
                    self.snake.pop_back();
                    self.relocate(ix, position);
                    Event::HarmfulEaten
                }
                None => {
                    self.snake.push_front(new_head);
                    self.snake.pop_back();
                    Event::NoCollision
                }
            }
        };

        trace!("step {:?} -> {:?}", heading, event);
        self.heading = heading;
        self.last_event = event;
        Ok(event)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid_size(&self) -> usize {
        self.config.grid_size
    }

    /// Body cells from head to tail
    pub fn snake(&self) -> &VecDeque<Position> {
        &self.snake
    }

    pub fn head(&self) -> Position {
        *self.snake.front().expect("body is not empty")
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn len(&self) -> usize {
        self.snake.len()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn last_event(&self) -> Event {
        self.last_event
    }

    pub fn is_terminal(&self) -> bool {
        self.last_event == Event::Died
    }

    /// Whether a full board stopped the world; only a reset lets it step again
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    fn size(&self) -> i32 {
        self.config.grid_size as i32
    }

    fn item_at(&self, pos: Position) -> Option<(usize, ItemKind)> {
        self.items
            .iter()
            .position(|item| item.position == pos)
            .map(|ix| (ix, self.items[ix].kind))
    }

    fn relocate(&mut self, ix: usize, position: Position) {
        debug!(
            "relocating {:?} item from {:?} to {:?}",
            self.items[ix].kind, self.items[ix].position, position
        );
        self.items[ix].position = position;
    }

    fn halt(&mut self, err: Error) -> Error {
        warn!("no vacant cell left on the board, halting until the next reset");
        self.halted = true;
        err
    }

    /// A random cell free of the body and of every item
    fn vacant_cell(&mut self) -> Result<Position> {
        let occupied = self
            .snake
            .iter()
            .chain(self.items.iter().map(|item| &item.position))
            .copied()
            .collect::<HashSet<_>>();
        self.pick_vacant(&occupied)
    }

    /// A random vacant cell as it will be once the head moves onto `head` and the last
    /// `released` tail cells leave the board. Every item, including the one under `head`,
    /// still counts as occupied.
    fn vacant_cell_after(&mut self, head: Position, released: usize) -> Result<Position> {
        let kept = self.snake.len().saturating_sub(released);
        let occupied = std::iter::once(head)
            .chain(self.snake.iter().take(kept).copied())
            .chain(self.items.iter().map(|item| item.position))
            .collect::<HashSet<_>>();
        self.pick_vacant(&occupied)
    }

    fn pick_vacant(&mut self, occupied: &HashSet<Position>) -> Result<Position> {
        let size = self.size();
        (0..size)
            .flat_map(|y| (0..size).map(move |x| Position::new(x, y)))
            .filter(|pos| !occupied.contains(pos))
            .choose(&mut self.rng)
            .ok_or(Error::CapacityExhausted)
    }
}

#[cfg(test)]
impl GridWorld {
    pub(crate) fn set_snake(&mut self, body: &[(i32, i32)], heading: Direction) {
        self.snake = body.iter().map(|&p| Position::from(p)).collect();
        self.heading = heading;
        self.last_event = Event::None;
        self.halted = false;
    }

    pub(crate) fn set_items(&mut self, items: &[(ItemKind, (i32, i32))]) {
        self.items = items
            .iter()
            .map(|&(kind, p)| Item {
                kind,
                position: p.into(),
            })
            .collect();
    }
}

impl fmt::Display for GridWorld {
    /// ASCII board: `H` head, `S` body, `G` beneficial, `R` harmful, `.` empty
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size();
        for y in 0..size {
            let row = (0..size)
                .map(|x| {
                    let pos = Position::new(x, y);
                    if self.snake.front() == Some(&pos) {
                        'H'
                    } else if self.snake.contains(&pos) {
                        'S'
                    } else {
                        match self.item_at(pos) {
                            Some((_, ItemKind::Beneficial)) => 'G',
                            Some((_, ItemKind::Harmful)) => 'R',
                            None => '.',
                        }
                    }
                })
                .collect::<String>();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> GridWorld {
        GridWorld::with_seed(WorldConfig::default(), 42).unwrap()
    }

    fn body(world: &GridWorld) -> Vec<(i32, i32)> {
        world.snake().iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn fixed_reset_layout() {
        let world = world();
        assert_eq!(body(&world), [(2, 5), (1, 5), (0, 5)], "snake along the middle row");
        assert_eq!(world.heading(), Direction::Right, "facing right");
        assert_eq!(world.last_event(), Event::None, "no event yet");

        let kinds = world.items().iter().map(|i| i.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            [ItemKind::Beneficial, ItemKind::Beneficial, ItemKind::Harmful],
            "two beneficial items and one harmful item"
        );
        let cells = world
            .items()
            .iter()
            .map(|i| i.position)
            .chain(world.snake().iter().copied())
            .collect::<HashSet<_>>();
        assert_eq!(cells.len(), 6, "no item overlaps the body or another item");
    }

    #[test]
    fn random_reset_fits_on_board() {
        let config = WorldConfig {
            grid_size: 3,
            random_start: true,
            beneficial_items: 1,
            ..Default::default()
        };
        let mut world = GridWorld::with_seed(config, 1).unwrap();
        for _ in 0..200 {
            world.reset().unwrap();
            assert_eq!(world.len(), 3, "three cells");
            assert!(world.snake().iter().all(|p| p.in_bounds(3)), "body on the board");
            let next = world.snake()[1].step(world.heading());
            assert_eq!(next, world.head(), "body trails the heading");
        }
    }

    #[test]
    fn rejects_tiny_or_crowded_boards() {
        let tiny = WorldConfig {
            grid_size: 2,
            ..Default::default()
        };
        assert!(matches!(GridWorld::new(tiny), Err(Error::Configuration(_))));

        let crowded = WorldConfig {
            grid_size: 3,
            beneficial_items: 6,
            ..Default::default()
        };
        assert!(matches!(GridWorld::new(crowded), Err(Error::Configuration(_))));

        let absurd = WorldConfig {
            beneficial_items: usize::MAX,
            harmful_items: 1,
            ..Default::default()
        };
        assert!(
            matches!(absurd.validate(), Err(Error::Configuration(_))),
            "item counts that overflow are rejected, not wrapped"
        );
    }

    #[test]
    fn step_into_empty_cell() {
        let mut world = world();
        world.set_items(&[(ItemKind::Beneficial, (9, 9)), (ItemKind::Harmful, (9, 0))]);

        let event = world.step(Direction::Right).unwrap();
        assert_eq!(event, Event::NoCollision);
        assert_eq!(world.head(), Position::new(3, 5), "head advanced");
        assert_eq!(world.len(), 3, "length unchanged");
    }

    #[test]
    fn reversal_is_ignored() {
        let mut world = world();
        world.set_items(&[(ItemKind::Beneficial, (9, 9))]);

        let event = world.step(Direction::Left).unwrap();
        assert_eq!(event, Event::NoCollision, "reversal does not kill the snake");
        assert_eq!(world.head(), Position::new(3, 5), "kept moving right");
        assert_eq!(world.heading(), Direction::Right);

        world.step(Direction::Up).unwrap();
        assert_eq!(world.head(), Position::new(3, 4), "turns are honoured");
    }

    #[test]
    fn eating_beneficial_grows_and_relocates() {
        let mut world = world();
        world.set_items(&[(ItemKind::Beneficial, (3, 5)), (ItemKind::Harmful, (9, 0))]);

        let event = world.step(Direction::Right).unwrap();
        assert_eq!(event, Event::BeneficialEaten);
        assert_eq!(world.len(), 4, "grew by one");
        assert_eq!(body(&world), [(3, 5), (2, 5), (1, 5), (0, 5)], "tail retained");
        assert_ne!(
            world.items()[0].position,
            Position::new(3, 5),
            "item moved away from where it was eaten"
        );
        assert!(!world.snake().contains(&world.items()[0].position));
    }

    #[test]
    fn eating_harmful_shrinks() {
        let mut world = world();
        world.set_items(&[(ItemKind::Harmful, (3, 5))]);

        let event = world.step(Direction::Right).unwrap();
        assert_eq!(event, Event::HarmfulEaten);
        assert_eq!(body(&world), [(3, 5), (2, 5)], "net length minus one");
        assert!(!world.is_terminal(), "still alive");
        assert_ne!(world.items()[0].position, Position::new(3, 5), "item relocated");
    }

    #[test]
    fn eating_harmful_at_length_one_dies() {
        let mut world = world();
        world.set_snake(&[(5, 5)], Direction::Right);
        world.set_items(&[(ItemKind::Harmful, (6, 5))]);

        let event = world.step(Direction::Right).unwrap();
        assert_eq!(event, Event::Died);
        assert!(world.is_terminal());
        assert_eq!(body(&world), [(5, 5)], "no mutation after death");
        assert_eq!(world.items()[0].position, Position::new(6, 5));
    }

    #[test]
    fn wall_and_body_collisions() {
        let mut world = world();
        world.set_items(&[]);
        world.set_snake(&[(9, 0), (8, 0), (7, 0)], Direction::Right);
        assert_eq!(world.step(Direction::Right).unwrap(), Event::Died, "wall kills");
        assert_eq!(world.head(), Position::new(9, 0), "body untouched");

        world.set_snake(&[(5, 5), (5, 6), (4, 6), (4, 5), (4, 4)], Direction::Up);
        assert_eq!(world.step(Direction::Left).unwrap(), Event::Died, "body kills");
    }

    #[test]
    fn stepping_after_death_is_rejected() {
        let mut world = world();
        world.set_snake(&[(0, 0)], Direction::Left);
        assert_eq!(world.step(Direction::Left).unwrap(), Event::Died);
        assert!(matches!(
            world.step(Direction::Up),
            Err(Error::InvalidTransition(_))
        ));

        world.reset().unwrap();
        assert!(world.step(Direction::Right).is_ok(), "reset revives the world");
    }

    #[test]
    fn full_board_exhausts_capacity() {
        let config = WorldConfig {
            grid_size: 3,
            beneficial_items: 1,
            harmful_items: 0,
            ..Default::default()
        };
        let mut world = GridWorld::with_seed(config, 3).unwrap();
        // snake fills every cell but (2,2), where the item sits
        world.set_snake(
            &[(2, 1), (1, 1), (0, 1), (0, 0), (1, 0), (2, 0), (0, 2), (1, 2)],
            Direction::Down,
        );
        world.set_items(&[(ItemKind::Beneficial, (2, 2))]);
        let before = body(&world);
        assert!(matches!(
            world.step(Direction::Down),
            Err(Error::CapacityExhausted)
        ));

        assert_eq!(body(&world), before, "body untouched by the failed step");
        assert_eq!(world.len(), 8);
        assert_eq!(world.heading(), Direction::Down);
        assert_eq!(world.head(), Position::new(2, 1));
        assert_eq!(world.items()[0].position, Position::new(2, 2), "item not moved");
        assert_eq!(world.last_event(), Event::None, "no event was recorded");
        assert!(world.is_halted(), "a full board halts the world");
        assert!(
            matches!(world.step(Direction::Down), Err(Error::InvalidTransition(_))),
            "a halted world refuses further steps"
        );
        assert!(
            matches!(world.step(Direction::Left), Err(Error::InvalidTransition(_))),
            "in any direction"
        );

        world.reset().unwrap();
        assert!(!world.is_halted(), "reset clears the halt");
        assert!(world.step(Direction::Right).is_ok());
    }

    #[test]
    fn seeded_worlds_replay_identically() {
        let config = WorldConfig {
            random_start: true,
            ..Default::default()
        };
        let a = GridWorld::with_seed(config.clone(), 9).unwrap();
        let b = GridWorld::with_seed(config, 9).unwrap();
        assert_eq!(a.to_string(), b.to_string(), "same seed, same board");
    }

    #[test]
    fn display_board() {
        let mut world = GridWorld::with_seed(
            WorldConfig {
                grid_size: 3,
                beneficial_items: 1,
                harmful_items: 1,
                ..Default::default()
            },
            0,
        )
        .unwrap();
        world.set_items(&[(ItemKind::Beneficial, (0, 0)), (ItemKind::Harmful, (2, 2))]);
        assert_eq!(world.to_string(), "G..\nSSH\n..R\n");
    }
}
