use serde::{Deserialize, Serialize};

/// Side length of a chunk column, in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// A block position in the 3-D world. The stable identity of a node.
///
/// Ordered lexicographically by (x, y, z) so that member sets and host
/// iteration are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring position one block away in `dir`.
    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.delta();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The six face-adjacent positions (up, down, north, south, east, west).
    pub fn neighbors(self) -> [BlockPos; 6] {
        Direction::all().map(|d| self.offset(d))
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &BlockPos) -> u32 {
        (self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs()
    }

    /// The chunk column containing this position.
    pub fn chunk(self) -> ChunkPos {
        ChunkPos {
            x: self.x.div_euclid(CHUNK_SIZE),
            z: self.z.div_euclid(CHUNK_SIZE),
        }
    }
}

/// A chunk column coordinate. Chunks are the unit of loading and unloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// The six axis-aligned directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All six directions, in neighbour-enumeration order.
    pub fn all() -> [Direction; 6] {
        [
            Direction::Up,
            Direction::Down,
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }

    /// Unit offset for this direction.
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Direction::Up => (0, 1, 0),
            Direction::Down => (0, -1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}

/// The two independent simulation domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Electrical,
    Fluid,
}

impl ResourceKind {
    pub fn all() -> [ResourceKind; 2] {
        [ResourceKind::Electrical, ResourceKind::Fluid]
    }
}

/// A small set of resource kinds: the capability table a block declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindSet {
    pub electrical: bool,
    pub fluid: bool,
}

impl KindSet {
    pub const NONE: KindSet = KindSet {
        electrical: false,
        fluid: false,
    };

    pub fn contains(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Electrical => self.electrical,
            ResourceKind::Fluid => self.fluid,
        }
    }

    pub fn insert(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Electrical => self.electrical = true,
            ResourceKind::Fluid => self.fluid = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.electrical && !self.fluid
    }

    pub fn iter(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        ResourceKind::all().into_iter().filter(|k| self.contains(*k))
    }
}

/// Identifies a fluid medium (water, oil, steam, ...). Cheap to copy and compare.
///
/// Networks of different media never merge, even when physically adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediumId(pub u16);

/// Identifies a live network within one manager. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_are_six_distinct_adjacent_positions() {
        let p = BlockPos::new(1, 2, 3);
        let n = p.neighbors();
        assert_eq!(n.len(), 6);
        for q in n {
            assert_eq!(p.manhattan_distance(&q), 1);
        }
        let unique: std::collections::BTreeSet<_> = n.iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn offset_and_opposite_cancel() {
        let p = BlockPos::new(-4, 0, 9);
        for d in Direction::all() {
            assert_eq!(p.offset(d).offset(d.opposite()), p);
        }
    }

    #[test]
    fn chunk_of_negative_coordinates() {
        assert_eq!(BlockPos::new(0, 64, 15).chunk(), ChunkPos::new(0, 0));
        assert_eq!(BlockPos::new(16, 0, 0).chunk(), ChunkPos::new(1, 0));
        assert_eq!(BlockPos::new(-1, 0, -16).chunk(), ChunkPos::new(-1, -1));
        assert_eq!(BlockPos::new(-17, 0, -17).chunk(), ChunkPos::new(-2, -2));
    }

    #[test]
    fn kind_set_membership() {
        let mut set = KindSet::NONE;
        assert!(set.is_empty());
        set.insert(ResourceKind::Fluid);
        assert!(set.contains(ResourceKind::Fluid));
        assert!(!set.contains(ResourceKind::Electrical));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![ResourceKind::Fluid]);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(MediumId(0), "water");
        map.insert(MediumId(1), "oil");
        assert_eq!(map[&MediumId(1)], "oil");
    }
}
