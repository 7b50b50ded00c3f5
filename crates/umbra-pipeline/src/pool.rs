//! Render-target pool keyed by `(width, height, format)`. Named slots are
//! resized lazily; released targets are recycled; teardown drains everything.

use hashbrown::HashMap;

use crate::backend::{RenderBackend, TargetDesc, TargetFormat, TargetHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetId {
    Roof,
    WeatherRoof,
    Rope,
    Token,
    Masks,
    OutdoorsScreen,
    Light,
    Darkness,
    Diffuse,
    Depth,
}

impl TargetId {
    pub fn name(self) -> &'static str {
        match self {
            TargetId::Roof => "roof",
            TargetId::WeatherRoof => "weather-roof",
            TargetId::Rope => "rope",
            TargetId::Token => "token",
            TargetId::Masks => "masks",
            TargetId::OutdoorsScreen => "outdoors",
            TargetId::Light => "light",
            TargetId::Darkness => "darkness",
            TargetId::Diffuse => "diffuse",
            TargetId::Depth => "depth",
        }
    }

    pub fn from_name(name: &str) -> Option<TargetId> {
        [
            TargetId::Roof,
            TargetId::WeatherRoof,
            TargetId::Rope,
            TargetId::Token,
            TargetId::Masks,
            TargetId::OutdoorsScreen,
            TargetId::Light,
            TargetId::Darkness,
            TargetId::Diffuse,
            TargetId::Depth,
        ]
        .into_iter()
        .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn format(self) -> TargetFormat {
        match self {
            TargetId::Light => TargetFormat::Rgba16F,
            TargetId::Darkness | TargetId::OutdoorsScreen => TargetFormat::R8,
            TargetId::Depth => TargetFormat::Depth32F,
            _ => TargetFormat::Rgba8,
        }
    }
}

type PoolKey = (i32, i32, TargetFormat);

#[derive(Default)]
pub struct TargetPool {
    named: HashMap<TargetId, (TargetHandle, TargetDesc)>,
    free: HashMap<PoolKey, Vec<TargetHandle>>,
    created: usize,
}

impl TargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot's target at exactly `width x height`, creating or
    /// swapping it only when the size changed.
    pub fn acquire(
        &mut self,
        backend: &mut dyn RenderBackend,
        id: TargetId,
        width: i32,
        height: i32,
    ) -> Option<TargetHandle> {
        let desc = TargetDesc {
            width,
            height,
            format: id.format(),
        };
        if let Some((h, d)) = self.named.get(&id) {
            if *d == desc {
                return Some(*h);
            }
        }
        if let Some((old, d)) = self.named.remove(&id) {
            self.free
                .entry((d.width, d.height, d.format))
                .or_default()
                .push(old);
        }
        let key = (desc.width, desc.height, desc.format);
        let handle = match self.free.get_mut(&key).and_then(|v| v.pop()) {
            Some(h) => h,
            None => {
                let h = backend.create_target(desc)?;
                self.created += 1;
                log::debug!(target: "pipeline", "created {} target {}x{} {:?}",
                    id.name(), width, height, desc.format);
                h
            }
        };
        self.named.insert(id, (handle, desc));
        Some(handle)
    }

    #[inline]
    pub fn get(&self, id: TargetId) -> Option<TargetHandle> {
        self.named.get(&id).map(|(h, _)| *h)
    }

    #[inline]
    pub fn desc(&self, id: TargetId) -> Option<TargetDesc> {
        self.named.get(&id).map(|(_, d)| *d)
    }

    /// Destroys pooled targets that no slot uses.
    pub fn trim(&mut self, backend: &mut dyn RenderBackend) {
        for (_, list) in self.free.drain() {
            for h in list {
                backend.destroy_target(h);
            }
        }
    }

    pub fn drain(&mut self, backend: &mut dyn RenderBackend) {
        self.trim(backend);
        for (_, (h, _)) in self.named.drain() {
            backend.destroy_target(h);
        }
    }

    #[inline]
    pub fn created_count(&self) -> usize {
        self.created
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.named.len() + self.free.values().map(Vec::len).sum::<usize>()
    }
}
