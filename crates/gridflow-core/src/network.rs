//! A live network and its per-tick distribution.
//!
//! Each tick a network sorts its members into sources, sinks, and conductors
//! by their current rate limits, moves `min(supply, demand)` across the
//! component, and splits it proportionally: each sink receives its share of
//! total demand, each source gives its share of total supply. Shares are
//! rounded toward zero, so the sum handed out never exceeds the flow. The
//! truncation remainder is reported, not redistributed.

use std::collections::BTreeSet;

use log::{trace, warn};

use crate::capability::{Quantity, Resource};
use crate::discovery::Component;
use crate::fixed::{Fixed64, Ticks};
use crate::host::NodeHost;
use crate::id::{BlockPos, NetworkId};

/// What one network did in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReport<R: Resource> {
    pub tick: Ticks,
    pub sources: usize,
    pub sinks: usize,
    pub conductors: usize,
    /// Members whose partition no longer matches the network's.
    pub excluded: usize,
    /// Members the host no longer resolves.
    pub missing: usize,
    pub drive: R::Drive,
    pub total_supply: R::Amount,
    pub total_demand: R::Amount,
    /// `min(total_supply, total_demand)`.
    pub flow: R::Amount,
    /// Sum of shares requested from sinks. Never exceeds `flow`.
    pub sink_shares: R::Amount,
    /// Sum of shares requested from sources. Never exceeds `flow`.
    pub source_shares: R::Amount,
    /// Actually accepted by sinks.
    pub delivered: R::Amount,
    /// Actually given up by sources, as a positive amount.
    pub drawn: R::Amount,
    /// Flow left unassigned to sinks by share truncation.
    pub residual: R::Amount,
    /// Instrumentation only; never affects allocation.
    pub loss: Fixed64,
}

impl<R: Resource> FlowReport<R> {
    fn empty(tick: Ticks) -> Self {
        Self {
            tick,
            sources: 0,
            sinks: 0,
            conductors: 0,
            excluded: 0,
            missing: 0,
            drive: R::Drive::default(),
            total_supply: R::Amount::ZERO,
            total_demand: R::Amount::ZERO,
            flow: R::Amount::ZERO,
            sink_shares: R::Amount::ZERO,
            source_shares: R::Amount::ZERO,
            delivered: R::Amount::ZERO,
            drawn: R::Amount::ZERO,
            residual: R::Amount::ZERO,
            loss: Fixed64::ZERO,
        }
    }

    /// No resource moved: missing sources or sinks, or nothing to give.
    pub fn is_inert(&self) -> bool {
        self.flow <= R::Amount::ZERO
    }
}

struct Participant<R: Resource> {
    pos: BlockPos,
    rate: R::Amount,
    level: R::Level,
}

/// A connected component promoted to a simulated network.
///
/// Membership is immutable: a topology change replaces the whole network.
#[derive(Debug, Clone)]
pub struct Network<R: Resource> {
    id: NetworkId,
    members: BTreeSet<BlockPos>,
    partition: R::Partition,
    formed_at: Ticks,
    last_flow: Option<FlowReport<R>>,
}

impl<R: Resource> Network<R> {
    pub fn new(id: NetworkId, component: Component<R>, formed_at: Ticks) -> Self {
        Self {
            id,
            members: component.members,
            partition: component.partition,
            formed_at,
            last_flow: None,
        }
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn members(&self) -> &BTreeSet<BlockPos> {
        &self.members
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.members.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn partition(&self) -> R::Partition {
        self.partition
    }

    pub fn formed_at(&self) -> Ticks {
        self.formed_at
    }

    /// The report from the most recent tick, if the network has ticked.
    pub fn last_flow(&self) -> Option<&FlowReport<R>> {
        self.last_flow.as_ref()
    }

    /// Distribute one tick's worth of resource across the members.
    ///
    /// Each member's `transfer` is called at most once per role: a hybrid
    /// node may be both filled and drained in the same tick. `dt` is the
    /// tick length in seconds and only feeds loss instrumentation.
    pub fn tick<H>(&mut self, host: &mut H, tick: Ticks, dt: Fixed64) -> &FlowReport<R>
    where
        H: NodeHost<R> + ?Sized,
    {
        let zero = R::Amount::ZERO;
        let mut report = FlowReport::<R>::empty(tick);
        let mut sources: Vec<Participant<R>> = Vec::new();
        let mut sinks: Vec<Participant<R>> = Vec::new();
        let mut conductors: Vec<BlockPos> = Vec::new();

        for &pos in &self.members {
            let Some(node) = host.node(pos) else {
                report.missing += 1;
                continue;
            };
            let level = node.level_state();
            if R::partition(&level) != self.partition {
                report.excluded += 1;
                continue;
            }
            let limits = node.rate_limits();
            if limits.is_source() {
                sources.push(Participant {
                    pos,
                    rate: limits.max_output,
                    level: level.clone(),
                });
            }
            if limits.is_sink() {
                sinks.push(Participant {
                    pos,
                    rate: limits.max_intake,
                    level,
                });
            } else if !limits.is_source() {
                conductors.push(pos);
            }
        }

        if report.excluded > 0 {
            warn!(
                "{:?} network {:?}: {} member(s) no longer match partition {:?}",
                R::KIND,
                self.id,
                report.excluded,
                self.partition
            );
        }

        report.sources = sources.len();
        report.sinks = sinks.len();
        report.conductors = conductors.len();
        report.drive = R::drive(sources.iter().map(|s| &s.level));
        report.total_supply = sources.iter().fold(zero, |acc, s| acc.saturating_add(s.rate));
        report.total_demand = sinks.iter().fold(zero, |acc, s| acc.saturating_add(s.rate));

        if !sources.is_empty() && !sinks.is_empty() {
            report.flow = report.total_supply.smaller(report.total_demand);
        }

        if report.flow > zero {
            let flow = report.flow;
            let drive = report.drive;

            let mut remaining = flow;
            for sink in &sinks {
                let share = flow.share(sink.rate, report.total_demand).smaller(remaining);
                if share <= zero {
                    continue;
                }
                remaining = remaining - share;
                report.sink_shares = report.sink_shares.saturating_add(share);
                if let Some(node) = host.node_mut(sink.pos) {
                    let moved = node.transfer(drive, share);
                    report.delivered = report.delivered.saturating_add(moved);
                    report.loss = report.loss.saturating_add(R::loss(&sink.level, moved, dt));
                }
            }
            report.residual = flow - report.sink_shares;

            let mut remaining = flow;
            for source in &sources {
                let share = flow.share(source.rate, report.total_supply).smaller(remaining);
                if share <= zero {
                    continue;
                }
                remaining = remaining - share;
                report.source_shares = report.source_shares.saturating_add(share);
                if let Some(node) = host.node_mut(source.pos) {
                    let moved = node.transfer(drive, -share);
                    report.drawn = report.drawn.saturating_add(moved.magnitude());
                    report.loss = report
                        .loss
                        .saturating_add(R::loss(&source.level, moved, dt));
                }
            }
        }

        for &pos in &conductors {
            if let Some(node) = host.node_mut(pos) {
                node.sense(report.drive, report.flow);
            }
        }

        trace!(
            "{:?} network {:?} tick {}: supply {:?} demand {:?} flow {:?} residual {:?}",
            R::KIND,
            self.id,
            tick,
            report.total_supply,
            report.total_demand,
            report.flow,
            report.residual
        );

        self.last_flow.insert(report)
    }
}
