//! Arbitration between the planner's path and the host path finder's.

use umbra_geom::Vec2;

use crate::search::path_length;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSource {
    Planner,
    Host,
    Direct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParityVerdict {
    KeepPlanner,
    /// Forced by configuration.
    HostForced,
    /// Host path ends closer to the requested endpoint.
    HostCloser,
    /// Lengths diverge by more than `2 * grid` and more than 35%.
    HostDiverged,
    /// Planner had nothing.
    HostOnly,
}

impl ParityVerdict {
    pub fn prefers_host(self) -> bool {
        !matches!(self, ParityVerdict::KeepPlanner)
    }
}

const DIVERGENCE_RATIO: f32 = 0.35;
const END_EPS: f32 = 0.5;

pub fn arbitrate(
    planner: Option<&[Vec2]>,
    host: Option<&[Vec2]>,
    end: Vec2,
    grid_size: f32,
    force_host: bool,
) -> ParityVerdict {
    let host = match host {
        Some(h) if h.len() >= 2 => h,
        _ => return ParityVerdict::KeepPlanner,
    };
    if force_host {
        return ParityVerdict::HostForced;
    }
    let Some(own) = planner.filter(|p| p.len() >= 2) else {
        return ParityVerdict::HostOnly;
    };
    let own_miss = own[own.len() - 1].distance(end);
    let host_miss = host[host.len() - 1].distance(end);
    if host_miss + END_EPS < own_miss {
        return ParityVerdict::HostCloser;
    }
    let (lo, lh) = (path_length(own), path_length(host));
    let diff = (lo - lh).abs();
    if diff > 2.0 * grid_size && diff > DIVERGENCE_RATIO * lo.max(f32::EPSILON) {
        return ParityVerdict::HostDiverged;
    }
    ParityVerdict::KeepPlanner
}
