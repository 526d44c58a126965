//! Connected-component discovery.
//!
//! A breadth-first flood over the host's adjacency that admits a neighbour
//! only when it carries the same kind capability and the same partition key
//! (fluid medium) as the start node. Components found in one pass never share
//! a member: a visited set spans every origin of the pass.

use std::collections::{BTreeSet, VecDeque};

use crate::capability::{FlowNode, Resource};
use crate::host::NodeHost;
use crate::id::BlockPos;

/// A maximal connected set of same-kind, same-partition nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component<R: Resource> {
    pub members: BTreeSet<BlockPos>,
    pub partition: R::Partition,
}

impl<R: Resource> Component<R> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.members.contains(&pos)
    }
}

fn partition_of<R: Resource>(node: &dyn FlowNode<R>) -> R::Partition {
    R::partition(&node.level_state())
}

/// Flood from `start`. `None` if `start` no longer holds a node of this kind.
pub fn flood<R, H>(host: &H, start: BlockPos) -> Option<Component<R>>
where
    R: Resource,
    H: NodeHost<R> + ?Sized,
{
    let partition = partition_of(host.node(start)?);
    let mut members = BTreeSet::from([start]);
    let mut frontier = VecDeque::from([start]);

    while let Some(pos) = frontier.pop_front() {
        for next in host.neighbors(pos) {
            if members.contains(&next) {
                continue;
            }
            let Some(node) = host.node(next) else {
                continue;
            };
            if partition_of(node) != partition {
                continue;
            }
            members.insert(next);
            frontier.push_back(next);
        }
    }

    Some(Component { members, partition })
}

/// Components reachable from `origins`. Stale origins contribute nothing, and
/// an origin already absorbed by an earlier component is skipped.
pub fn discover_from_origins<R, H>(
    host: &H,
    origins: impl IntoIterator<Item = BlockPos>,
) -> Vec<Component<R>>
where
    R: Resource,
    H: NodeHost<R> + ?Sized,
{
    let mut visited = BTreeSet::new();
    let mut found = Vec::new();
    for origin in origins {
        if visited.contains(&origin) {
            continue;
        }
        let Some(component) = flood::<R, H>(host, origin) else {
            continue;
        };
        visited.extend(component.members.iter().copied());
        found.push(component);
    }
    found
}

/// Every component in the host, in ascending order of smallest member.
pub fn discover_all<R, H>(host: &H) -> Vec<Component<R>>
where
    R: Resource,
    H: NodeHost<R> + ?Sized,
{
    discover_from_origins(host, host.nodes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Electrical, Fluid};
    use crate::id::MediumId;
    use crate::test_utils::{MapHost, TestCell, TestTank};

    fn p(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(x, y, z)
    }

    #[test]
    fn flood_collects_line() {
        let mut host = MapHost::new();
        for x in 0..4 {
            host.place(p(x, 0, 0), TestCell::conductor());
        }
        let c = flood::<Electrical, _>(&host, p(2, 0, 0)).unwrap();
        assert_eq!(c.len(), 4);
        assert!(c.contains(p(0, 0, 0)));
    }

    #[test]
    fn flood_from_empty_position_is_none() {
        let host = MapHost::new();
        assert!(flood::<Electrical, _>(&host, p(0, 0, 0)).is_none());
    }

    #[test]
    fn flood_skips_blocks_without_capability() {
        let mut host = MapHost::new();
        host.place(p(0, 0, 0), TestCell::conductor());
        host.place(p(1, 0, 0), TestTank::new(MediumId(0), 1000, 0));
        host.place(p(2, 0, 0), TestCell::conductor());
        let c = flood::<Electrical, _>(&host, p(0, 0, 0)).unwrap();
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn media_do_not_merge() {
        let mut host = MapHost::new();
        host.place(p(0, 0, 0), TestTank::new(MediumId(0), 1000, 0));
        host.place(p(1, 0, 0), TestTank::new(MediumId(0), 1000, 0));
        host.place(p(2, 0, 0), TestTank::new(MediumId(1), 1000, 0));
        let all = discover_all::<Fluid, _>(&host);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].partition, MediumId(0));
        assert_eq!(all[0].len(), 2);
        assert_eq!(all[1].partition, MediumId(1));
    }

    #[test]
    fn shared_visited_set_across_origins() {
        let mut host = MapHost::new();
        for x in 0..3 {
            host.place(p(x, 0, 0), TestCell::conductor());
        }
        let found =
            discover_from_origins::<Electrical, _>(&host, [p(0, 0, 0), p(2, 0, 0), p(9, 9, 9)]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn discover_all_partitions_nodes() {
        let mut host = MapHost::new();
        host.place(p(0, 0, 0), TestCell::conductor());
        host.place(p(0, 1, 0), TestCell::conductor());
        host.place(p(5, 0, 0), TestCell::conductor());
        host.place(p(0, 0, 9), TestCell::conductor());
        let all = discover_all::<Electrical, _>(&host);
        assert_eq!(all.len(), 3);
        let total: usize = all.iter().map(Component::len).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn dual_capability_block_joins_both_kinds() {
        let mut host = MapHost::new();
        host.place(p(0, 0, 0), TestCell::conductor());
        host.place(p(1, 0, 0), TestTank::electric_pump(MediumId(0)));
        host.place(p(2, 0, 0), TestCell::conductor());
        host.place(p(1, 1, 0), TestTank::new(MediumId(0), 1000, 0));
        let electric = discover_all::<Electrical, _>(&host);
        assert_eq!(electric.len(), 1);
        assert_eq!(electric[0].len(), 3);
        let fluid = discover_all::<Fluid, _>(&host);
        assert_eq!(fluid.len(), 1);
        assert_eq!(fluid[0].len(), 2);
    }
}
