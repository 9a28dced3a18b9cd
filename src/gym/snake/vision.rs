use std::fmt;

use serde::{Deserialize, Serialize};
use strum::VariantArray;

use super::world::{Direction, GridWorld, ItemKind, Position};

/// The nearest thing the snake sees along one ray
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sight {
    Beneficial,
    Harmful,
    /// A body segment or the wall further than one cell away
    Obstacle,
    /// A body segment or the wall directly next to the head
    Adjacent,
}

impl Sight {
    fn symbol(self) -> char {
        match self {
            Sight::Beneficial => 'G',
            Sight::Harmful => 'R',
            Sight::Obstacle => 'S',
            Sight::Adjacent => 'C',
        }
    }
}

/// The compressed perception used as the learning state key
///
/// One [`Sight`] per direction, in [`Direction`] order (left, up, right, down).
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Observation {
    Terminal,
    Live([Sight; 4]),
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Terminal => f.write_str("terminal"),
            Observation::Live(sights) => sights.iter().try_for_each(|s| write!(f, "{}", s.symbol())),
        }
    }
}

/// Distances in cells from the head to the first object of each category along one direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ray {
    pub beneficial: Option<u32>,
    pub harmful: Option<u32>,
    /// Always defined: the wall sits one cell past the last cell on the board
    pub obstacle: u32,
}

impl Ray {
    /// Reduce to the nearest category, preferring beneficial over harmful over obstacle on ties
    pub fn nearest(&self) -> Sight {
        let candidates = [
            (self.beneficial, Sight::Beneficial),
            (self.harmful, Sight::Harmful),
            (Some(self.obstacle), Sight::Obstacle),
        ];
        let (distance, sight) = candidates
            .into_iter()
            .filter_map(|(d, s)| d.map(|d| (d, s)))
            .min()
            .expect("obstacle distance is always defined");

        if sight == Sight::Obstacle && distance == 1 {
            Sight::Adjacent
        } else {
            sight
        }
    }
}

/// Turns a [`GridWorld`] into what the snake can see from its head
pub struct VisionEncoder;

impl VisionEncoder {
    /// Scan outward from the head in each direction, or `None` if the world is terminal
    pub fn scan(world: &GridWorld) -> Option<[Ray; 4]> {
        if world.is_terminal() {
            return None;
        }
        let head = world.head();
        Some(std::array::from_fn(|i| {
            Self::cast(world, head, Direction::VARIANTS[i])
        }))
    }

    /// The learning state for the current world
    pub fn encode(world: &GridWorld) -> Observation {
        match Self::scan(world) {
            Some(rays) => Observation::Live(rays.map(|ray| ray.nearest())),
            None => Observation::Terminal,
        }
    }

    /// The rays drawn around the head, for debugging: `H` head, `G`/`R` items, `S` body,
    /// `0` empty and `W` wall
    pub fn render(world: &GridWorld) -> String {
        let size = world.grid_size() + 2;
        let mut canvas = vec![vec![' '; size]; size];
        let head = world.head();
        canvas[head.y as usize + 1][head.x as usize + 1] = 'H';

        for &dir in Direction::VARIANTS {
            let mut cursor = head.step(dir);
            loop {
                let symbol = Self::symbol_at(world, cursor);
                canvas[(cursor.y + 1) as usize][(cursor.x + 1) as usize] = symbol;
                if symbol == 'W' {
                    break;
                }
                cursor = cursor.step(dir);
            }
        }

        canvas
            .into_iter()
            .map(|row| row.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn cast(world: &GridWorld, head: Position, dir: Direction) -> Ray {
        let size = world.grid_size() as i32;
        let mut ray = Ray {
            beneficial: None,
            harmful: None,
            obstacle: 0,
        };
        let mut obstacle = None;
        let mut cursor = head.step(dir);
        let mut distance = 1;
        while cursor.in_bounds(size) {
            if world.snake().contains(&cursor) {
                obstacle.get_or_insert(distance);
            } else if let Some(item) = world.items().iter().find(|i| i.position == cursor) {
                match item.kind {
                    ItemKind::Beneficial => ray.beneficial.get_or_insert(distance),
                    ItemKind::Harmful => ray.harmful.get_or_insert(distance),
                };
            }
            cursor = cursor.step(dir);
            distance += 1;
        }
        ray.obstacle = obstacle.unwrap_or(distance);
        ray
    }

    fn symbol_at(world: &GridWorld, pos: Position) -> char {
        if !pos.in_bounds(world.grid_size() as i32) {
            return 'W';
        }
        if world.snake().contains(&pos) {
            return 'S';
        }
        match world.items().iter().find(|i| i.position == pos).map(|i| i.kind) {
            Some(ItemKind::Beneficial) => 'G',
            Some(ItemKind::Harmful) => 'R',
            None => '0',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gym::snake::world::WorldConfig;

    fn world() -> GridWorld {
        GridWorld::with_seed(WorldConfig::default(), 5).unwrap()
    }

    #[test]
    fn scan_distances() {
        let mut world = world();
        // head (2,5) facing right, body (1,5) (0,5)
        world.set_items(&[(ItemKind::Beneficial, (6, 5)), (ItemKind::Harmful, (2, 1))]);

        let [left, up, right, down] = VisionEncoder::scan(&world).unwrap();
        assert_eq!(
            left,
            Ray {
                beneficial: None,
                harmful: None,
                obstacle: 1
            },
            "neck is adjacent"
        );
        assert_eq!(up.harmful, Some(4), "harmful item four cells up");
        assert_eq!(up.obstacle, 6, "top wall past row 0");
        assert_eq!(right.beneficial, Some(4));
        assert_eq!(right.obstacle, 8, "right wall past column 9");
        assert_eq!(down.obstacle, 5, "bottom wall past row 9");
    }

    #[test]
    fn obstacle_always_defined() {
        let mut world = GridWorld::with_seed(
            WorldConfig {
                random_start: true,
                ..Default::default()
            },
            11,
        )
        .unwrap();
        for _ in 0..50 {
            world.reset().unwrap();
            for ray in VisionEncoder::scan(&world).unwrap() {
                assert!(ray.obstacle >= 1, "obstacle distance is at least one cell");
            }
        }
    }

    #[test]
    fn encode_nearest_category() {
        let mut world = world();
        world.set_items(&[(ItemKind::Beneficial, (6, 5)), (ItemKind::Harmful, (2, 1))]);

        assert_eq!(
            VisionEncoder::encode(&world),
            Observation::Live([
                Sight::Adjacent,
                Sight::Harmful,
                Sight::Beneficial,
                Sight::Obstacle
            ])
        );
        assert_eq!(VisionEncoder::encode(&world).to_string(), "CRGS");
    }

    #[test]
    fn nearer_item_hides_farther_one() {
        let mut world = world();
        world.set_items(&[(ItemKind::Harmful, (4, 5)), (ItemKind::Beneficial, (6, 5))]);
        let Observation::Live(sights) = VisionEncoder::encode(&world) else {
            panic!("world is live");
        };
        assert_eq!(sights[2], Sight::Harmful, "harmful item is nearer to the right");
    }

    #[test]
    fn wall_adjacent() {
        let mut world = world();
        world.set_items(&[]);
        world.set_snake(&[(0, 0)], Direction::Right);
        assert_eq!(
            VisionEncoder::encode(&world),
            Observation::Live([
                Sight::Adjacent,
                Sight::Adjacent,
                Sight::Obstacle,
                Sight::Obstacle
            ])
        );
    }

    #[test]
    fn terminal_world_encodes_sentinel() {
        let mut world = world();
        world.set_snake(&[(0, 0)], Direction::Left);
        world.step(Direction::Left).unwrap();
        assert!(VisionEncoder::scan(&world).is_none());
        assert_eq!(VisionEncoder::encode(&world), Observation::Terminal);
    }

    #[test]
    fn render_vision_cross() {
        let mut world = GridWorld::with_seed(
            WorldConfig {
                grid_size: 3,
                beneficial_items: 0,
                harmful_items: 0,
                ..Default::default()
            },
            0,
        )
        .unwrap();
        world.set_snake(&[(1, 1), (0, 1)], Direction::Right);
        world.set_items(&[(ItemKind::Beneficial, (1, 0))]);
        let expected = ["  W  ", "  G  ", "WSH0W", "  0  ", "  W  "].join("\n");
        assert_eq!(VisionEncoder::render(&world), expected);
    }
}
