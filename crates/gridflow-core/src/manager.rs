//! Per-kind network ownership: dirty scheduling, rebuild merging, ticking.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::capability::Resource;
use crate::config::EngineConfig;
use crate::dirty::DirtyTracker;
use crate::discovery::{Component, discover_all, discover_from_origins};
use crate::event::NetworkEvent;
use crate::fixed::{Fixed64, Ticks};
use crate::host::NodeHost;
use crate::id::{BlockPos, NetworkId};
use crate::network::{FlowReport, Network};

/// What one [`NetworkManager::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport<R: Resource> {
    pub tick: Ticks,
    /// Dirty origins consumed by incremental rebuilds this step.
    pub rebuilt_origins: usize,
    /// A full rediscovery ran this step.
    pub rescanned: bool,
    pub events: Vec<NetworkEvent>,
    /// Flow of every live network, in network id order.
    pub flows: Vec<(NetworkId, FlowReport<R>)>,
}

impl<R: Resource> StepReport<R> {
    fn new(tick: Ticks) -> Self {
        Self {
            tick,
            rebuilt_origins: 0,
            rescanned: false,
            events: Vec::new(),
            flows: Vec::new(),
        }
    }

    pub fn topology_changed(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Owns every live network of one resource kind.
///
/// Networks are never edited member by member: a rebuild dissolves every
/// network it touches and forms fresh ones from the rediscovered components,
/// which handles splits and merges uniformly.
#[derive(Debug, Clone)]
pub struct NetworkManager<R: Resource> {
    tracker: DirtyTracker,
    networks: BTreeMap<NetworkId, Network<R>>,
    owners: BTreeMap<BlockPos, NetworkId>,
    next_id: u32,
    tick_seconds: Fixed64,
}

impl<R: Resource> Default for NetworkManager<R> {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl<R: Resource> NetworkManager<R> {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tracker: DirtyTracker::new(config),
            networks: BTreeMap::new(),
            owners: BTreeMap::new(),
            next_id: 0,
            tick_seconds: config.tick_seconds_fixed(),
        }
    }

    pub fn mark_dirty(&mut self, origin: BlockPos) {
        self.tracker.mark(origin);
    }

    pub fn mark_dirty_all(&mut self) {
        self.tracker.mark_all();
    }

    pub fn tracker(&self) -> &DirtyTracker {
        &self.tracker
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network<R>> {
        self.networks.values()
    }

    pub fn network(&self, id: NetworkId) -> Option<&Network<R>> {
        self.networks.get(&id)
    }

    /// The network currently holding `pos`, if any.
    pub fn network_of(&self, pos: BlockPos) -> Option<&Network<R>> {
        self.owners.get(&pos).and_then(|id| self.networks.get(id))
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Advance the scheduler, apply due rebuilds, then tick every network.
    pub fn step<H>(&mut self, host: &mut H, tick: Ticks) -> StepReport<R>
    where
        H: NodeHost<R> + ?Sized,
    {
        let mut report = StepReport::new(tick);
        let due = self.tracker.step();
        if due.full_rescan {
            self.rescan(&*host, tick, &mut report);
        } else if !due.origins.is_empty() {
            report.rebuilt_origins = due.origins.len();
            self.rebuild(&*host, &due.origins, tick, &mut report);
        }

        let dt = self.tick_seconds;
        for network in self.networks.values_mut() {
            let id = network.id();
            let flow = network.tick(host, tick, dt).clone();
            report.flows.push((id, flow));
        }
        report
    }

    /// Rediscover the components around `origins` and swap them in.
    ///
    /// A network that owns an origin is rediscovered from all of its members,
    /// so removing a node splits its old network even when only the removed
    /// position was marked. Falls back to a full rescan when nothing is
    /// found.
    fn rebuild<H>(&mut self, host: &H, origins: &[BlockPos], tick: Ticks, report: &mut StepReport<R>)
    where
        H: NodeHost<R> + ?Sized,
    {
        let mut doomed = BTreeSet::new();
        let mut seeds = origins.to_vec();
        for origin in origins {
            let Some(&id) = self.owners.get(origin) else {
                continue;
            };
            if !doomed.insert(id) {
                continue;
            }
            if let Some(network) = self.networks.get(&id) {
                seeds.extend(network.members().iter().copied());
            }
        }

        let found = discover_from_origins::<R, H>(host, seeds);
        if found.is_empty() {
            debug!(
                "{:?}: origins {:?} are stale, falling back to full rescan",
                R::KIND,
                origins
            );
            self.rescan(host, tick, report);
            return;
        }

        for component in &found {
            doomed.extend(component.members.iter().filter_map(|p| self.owners.get(p)).copied());
        }
        for id in doomed {
            self.dissolve(id, tick, report);
        }
        debug!(
            "{:?}: rebuilt {} component(s) from {} origin(s) at tick {}",
            R::KIND,
            found.len(),
            origins.len(),
            tick
        );
        for component in found {
            self.form(component, tick, report);
        }
    }

    /// Replace every network with a fresh full discovery.
    fn rescan<H>(&mut self, host: &H, tick: Ticks, report: &mut StepReport<R>)
    where
        H: NodeHost<R> + ?Sized,
    {
        let ids: Vec<NetworkId> = self.networks.keys().copied().collect();
        for id in ids {
            self.dissolve(id, tick, report);
        }
        let found = discover_all::<R, H>(host);
        let count = found.len();
        for component in found {
            self.form(component, tick, report);
        }
        debug!("{:?}: full rescan found {} network(s) at tick {}", R::KIND, count, tick);
        report.rescanned = true;
        report.events.push(NetworkEvent::Rescanned {
            kind: R::KIND,
            networks: count,
            tick,
        });
    }

    fn dissolve(&mut self, id: NetworkId, tick: Ticks, report: &mut StepReport<R>) {
        let Some(network) = self.networks.remove(&id) else {
            return;
        };
        for pos in network.members() {
            self.owners.remove(pos);
        }
        debug!("{:?}: dissolved network {:?} ({} members)", R::KIND, id, network.len());
        report.events.push(NetworkEvent::Dissolved {
            network: id,
            kind: R::KIND,
            tick,
        });
    }

    fn form(&mut self, component: Component<R>, tick: Ticks, report: &mut StepReport<R>) {
        let id = NetworkId(self.next_id);
        self.next_id += 1;
        for &pos in &component.members {
            self.owners.insert(pos, id);
        }
        let network = Network::new(id, component, tick);
        report.events.push(NetworkEvent::Formed {
            network: id,
            kind: R::KIND,
            size: network.len(),
            tick,
        });
        self.networks.insert(id, network);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Electrical, Fluid};
    use crate::id::MediumId;
    use crate::test_utils::{MapHost, TestCell, TestTank, fixed, pos};

    fn instant() -> EngineConfig {
        let _ = env_logger::builder().is_test(true).try_init();
        EngineConfig {
            debounce_ticks: 0,
            ..Default::default()
        }
    }

    fn line(host: &mut MapHost, len: i32) {
        for x in 0..len {
            host.place(pos(x, 0, 0), TestCell::conductor());
        }
    }

    fn mark_line<R: Resource>(manager: &mut NetworkManager<R>, len: i32) {
        for x in 0..len {
            manager.mark_dirty(pos(x, 0, 0));
        }
    }

    #[test]
    fn networks_form_after_debounce() {
        let mut host = MapHost::new();
        line(&mut host, 3);
        let mut manager = NetworkManager::<Electrical>::default();
        manager.mark_dirty(pos(0, 0, 0));

        for tick in 0..3 {
            let report = manager.step(&mut host, tick);
            assert!(report.events.is_empty());
            assert!(manager.is_empty());
        }
        let report = manager.step(&mut host, 3);
        assert_eq!(report.rebuilt_origins, 1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.network_of(pos(2, 0, 0)).unwrap().len(), 3);
        assert!(matches!(
            report.events[0],
            NetworkEvent::Formed { size: 3, .. }
        ));
    }

    #[test]
    fn removal_splits_network() {
        let mut host = MapHost::new();
        line(&mut host, 5);
        let mut manager = NetworkManager::<Electrical>::new(&instant());
        manager.mark_dirty(pos(0, 0, 0));
        manager.step(&mut host, 0);
        assert_eq!(manager.len(), 1);

        host.remove(pos(2, 0, 0));
        manager.mark_dirty(pos(2, 0, 0));
        let report = manager.step(&mut host, 1);

        assert!(!report.rescanned);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.network_of(pos(0, 0, 0)).unwrap().len(), 2);
        assert_eq!(manager.network_of(pos(4, 0, 0)).unwrap().len(), 2);
        assert!(manager.network_of(pos(2, 0, 0)).is_none());
        let dissolved = report
            .events
            .iter()
            .filter(|e| matches!(e, NetworkEvent::Dissolved { .. }))
            .count();
        assert_eq!(dissolved, 1);
    }

    #[test]
    fn placement_merges_networks() {
        let mut host = MapHost::new();
        host.place(pos(0, 0, 0), TestCell::conductor());
        host.place(pos(2, 0, 0), TestCell::conductor());
        let mut manager = NetworkManager::<Electrical>::new(&instant());
        manager.mark_dirty_all();
        manager.step(&mut host, 0);
        assert_eq!(manager.len(), 2);

        host.place(pos(1, 0, 0), TestCell::conductor());
        manager.mark_dirty(pos(1, 0, 0));
        manager.step(&mut host, 1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.network_of(pos(0, 0, 0)).unwrap().len(), 3);
    }

    #[test]
    fn stale_origin_falls_back_to_rescan() {
        let mut host = MapHost::new();
        line(&mut host, 2);
        let mut manager = NetworkManager::<Electrical>::new(&instant());
        manager.mark_dirty(pos(9, 9, 9));
        let report = manager.step(&mut host, 0);
        assert!(report.rescanned);
        assert_eq!(manager.len(), 1);
        assert!(matches!(
            report.events.last(),
            Some(NetworkEvent::Rescanned { networks: 1, .. })
        ));
    }

    #[test]
    fn rebuilds_are_rate_limited() {
        let mut host = MapHost::new();
        for x in 0..5 {
            host.place(pos(x * 2, 0, 0), TestCell::conductor());
        }
        let config = EngineConfig {
            debounce_ticks: 0,
            max_rebuilds_per_step: 2,
            requeue_delay: 0,
            ..Default::default()
        };
        let mut manager = NetworkManager::<Electrical>::new(&config);
        for x in 0..5 {
            manager.mark_dirty(pos(x * 2, 0, 0));
        }
        let first = manager.step(&mut host, 0);
        assert_eq!(first.rebuilt_origins, 2);
        assert_eq!(manager.len(), 2);
        manager.step(&mut host, 1);
        manager.step(&mut host, 2);
        assert_eq!(manager.len(), 5);
        assert!(!manager.tracker().is_dirty());
    }

    #[test]
    fn step_ticks_every_network() {
        let mut host = MapHost::new();
        host.place(pos(0, 0, 0), TestCell::source(120.0, 10.0));
        host.place(pos(1, 0, 0), TestCell::sink(4.0));
        let mut manager = NetworkManager::<Electrical>::new(&instant());
        manager.mark_dirty(pos(0, 0, 0));
        let report = manager.step(&mut host, 0);
        assert_eq!(report.flows.len(), 1);
        assert_eq!(report.flows[0].1.flow, fixed(4.0));
        assert_eq!(host.get::<TestCell>(pos(1, 0, 0)).unwrap().received, fixed(4.0));
    }

    #[test]
    fn fluid_media_form_separate_networks() {
        let mut host = MapHost::new();
        host.place(pos(0, 0, 0), TestTank::new(MediumId(0), 100, 50));
        host.place(pos(1, 0, 0), TestTank::new(MediumId(1), 100, 50));
        let mut manager = NetworkManager::<Fluid>::new(&instant());
        mark_line(&mut manager, 2);
        manager.step(&mut host, 0);
        assert_eq!(manager.len(), 2);
        assert_eq!(
            manager.network_of(pos(1, 0, 0)).unwrap().partition(),
            MediumId(1)
        );
    }

    #[test]
    fn network_ids_are_never_reused() {
        let mut host = MapHost::new();
        line(&mut host, 2);
        let mut manager = NetworkManager::<Electrical>::new(&instant());
        mark_line(&mut manager, 2);
        manager.step(&mut host, 0);
        let first = manager.network_of(pos(0, 0, 0)).unwrap().id();
        manager.mark_dirty(pos(0, 0, 0));
        manager.step(&mut host, 1);
        let second = manager.network_of(pos(0, 0, 0)).unwrap().id();
        assert!(second > first);
        assert!(manager.network(first).is_none());
    }
}
