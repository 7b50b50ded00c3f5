//! Live source set keyed by document id. Applies hook events, batches
//! geometry rebuilds on lighting refresh and advances animation each frame.

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use serde_json::Value;
use umbra_scene::config::LightingConfig;
use umbra_scene::{DocId, HookEvent, LightDoc, SceneHost, apply_patch};

use crate::builder::{BuildContext, DarknessSourceBuilder, FrameTime, LightSourceBuilder};
use crate::error::SourceError;
use crate::geometry::{GeometryInput, build_geometry};
use crate::noise::SmoothNoise;

pub enum SourceBuilder {
    Light(LightSourceBuilder),
    Darkness(DarknessSourceBuilder),
}

impl SourceBuilder {
    fn new(doc: LightDoc, ctx: &BuildContext) -> Self {
        if doc.config.negative {
            SourceBuilder::Darkness(DarknessSourceBuilder::new(doc, ctx))
        } else {
            SourceBuilder::Light(LightSourceBuilder::new(doc, ctx))
        }
    }

    pub fn doc(&self) -> &LightDoc {
        match self {
            SourceBuilder::Light(b) => b.doc(),
            SourceBuilder::Darkness(b) => b.doc(),
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, SourceBuilder::Darkness(_))
    }

    fn is_dirty(&self) -> bool {
        match self {
            SourceBuilder::Light(b) => b.is_dirty(),
            SourceBuilder::Darkness(b) => b.is_dirty(),
        }
    }

    fn is_fallback(&self) -> bool {
        match self {
            SourceBuilder::Light(b) => b.is_fallback(),
            SourceBuilder::Darkness(b) => b.is_fallback(),
        }
    }

    fn mark_dirty(&mut self) {
        match self {
            SourceBuilder::Light(b) => b.mark_dirty(),
            SourceBuilder::Darkness(b) => b.mark_dirty(),
        }
    }

    fn geometry_input(&self, los: Option<Vec<f32>>, ctx: &BuildContext) -> GeometryInput {
        match self {
            SourceBuilder::Light(b) => b.geometry_input(los, ctx),
            SourceBuilder::Darkness(b) => b.geometry_input(los, ctx),
        }
    }

    fn set_geometry(&mut self, g: Option<crate::geometry::SourceGeometry>) {
        match self {
            SourceBuilder::Light(b) => b.set_geometry(g),
            SourceBuilder::Darkness(b) => b.set_geometry(g),
        }
    }

    fn rebuild_uniforms(&mut self, ctx: &BuildContext) {
        match self {
            SourceBuilder::Light(b) => b.rebuild_uniforms(ctx),
            SourceBuilder::Darkness(b) => b.rebuild_uniforms(ctx),
        }
    }
}

/// Result of one rebuild pass, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildStats {
    pub rebuilt: usize,
    pub fallbacks: usize,
    pub skipped: usize,
    pub parallel: bool,
}

pub struct SourceRegistry {
    sources: HashMap<DocId, SourceBuilder>,
    ctx: BuildContext,
    noise: SmoothNoise,
    audio_level: f32,
    walls_changed: bool,
}

impl SourceRegistry {
    pub fn new(lighting: LightingConfig, scene_height: f32) -> Self {
        Self {
            sources: HashMap::new(),
            ctx: BuildContext::new(lighting, scene_height),
            noise: SmoothNoise::default(),
            audio_level: 0.0,
            walls_changed: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&SourceBuilder> {
        self.sources.get(id)
    }

    #[inline]
    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Latest amplitude for sound-reactive pulses, in [0,1].
    pub fn set_audio_level(&mut self, level: f32) {
        self.audio_level = level.clamp(0.0, 1.0);
    }

    /// New lighting tunables. Geometry is rebuilt when the inset or circle
    /// resolution changed, otherwise only uniforms.
    pub fn set_config(&mut self, lighting: LightingConfig) {
        let geometry_changed = lighting.effective_inset() != self.ctx.lighting.effective_inset()
            || lighting.circle_segments != self.ctx.lighting.circle_segments
            || lighting.darkness_padding_px != self.ctx.lighting.darkness_padding_px;
        self.ctx.lighting = lighting;
        for src in self.sources.values_mut() {
            src.rebuild_uniforms(&self.ctx);
            if geometry_changed {
                src.mark_dirty();
            }
        }
    }

    /// Drops everything and recreates one builder per host light.
    pub fn sync_from_host(&mut self, host: &dyn SceneHost) {
        self.sources.clear();
        self.ctx.scene_height = host.dimensions().height;
        for doc in host.lights() {
            self.create(doc);
        }
        self.rebuild_dirty(host);
    }

    pub fn create(&mut self, doc: LightDoc) {
        log::debug!(target: "lighting", "create {} source {}",
            if doc.config.negative { "darkness" } else { "light" }, doc.id);
        let id = doc.id.clone();
        self.sources.insert(id, SourceBuilder::new(doc, &self.ctx));
    }

    /// Deep-merges an update payload into the stored document. A flip of
    /// `negative` swaps the builder in one step.
    pub fn update(&mut self, id: &str, changes: &Value) -> Result<(), SourceError> {
        let Some(entry) = self.sources.get_mut(id) else {
            return Err(SourceError::MissingDocument(id.to_string()));
        };
        let doc = apply_patch(entry.doc(), changes).map_err(|source| SourceError::Patch {
            id: id.to_string(),
            source,
        })?;
        if doc.config.negative != entry.is_negative() {
            log::debug!(target: "lighting", "source {} flipped negative={}", id, doc.config.negative);
            *entry = SourceBuilder::new(doc, &self.ctx);
            return Ok(());
        }
        match entry {
            SourceBuilder::Light(b) => b.update(doc, &self.ctx),
            SourceBuilder::Darkness(b) => b.update(doc, &self.ctx),
        }
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let removed = self.sources.remove(id).is_some();
        if removed {
            log::debug!(target: "lighting", "delete source {}", id);
        }
        removed
    }

    /// Routes a hook event. Wall changes only mark sources; geometry follows
    /// on the next `LightingRefresh`.
    pub fn handle_event(&mut self, event: &HookEvent, host: &dyn SceneHost) {
        match event {
            HookEvent::CreateAmbientLight { doc } => self.create(doc.clone()),
            HookEvent::UpdateAmbientLight { id, changes } => {
                if let Err(e) = self.update(id, changes) {
                    log::warn!(target: "lighting", "{} ({})", e, e.reason());
                }
            }
            HookEvent::DeleteAmbientLight { id } => {
                self.delete(id);
            }
            HookEvent::CreateWall { .. }
            | HookEvent::UpdateWall { .. }
            | HookEvent::DeleteWall { .. } => self.walls_changed = true,
            HookEvent::LightingRefresh => {
                if std::mem::take(&mut self.walls_changed) {
                    for src in self.sources.values_mut() {
                        src.mark_dirty();
                    }
                }
                self.rebuild_dirty(host);
            }
            HookEvent::CanvasReady => self.sync_from_host(host),
            HookEvent::UpdateScene { .. } => {
                let h = host.dimensions().height;
                if h != self.ctx.scene_height {
                    self.ctx.scene_height = h;
                    for src in self.sources.values_mut() {
                        src.mark_dirty();
                    }
                }
            }
            _ => {}
        }
    }

    /// Rebuilds every dirty source. Polygon work fans out over rayon once the
    /// batch is large enough; results are applied on the calling thread.
    pub fn rebuild_dirty(&mut self, host: &dyn SceneHost) -> RebuildStats {
        let jobs: Vec<(DocId, GeometryInput)> = self
            .sources
            .iter()
            .filter(|(_, s)| s.is_dirty())
            .map(|(id, s)| (id.clone(), s.geometry_input(host.light_los(id), &self.ctx)))
            .collect();
        self.apply_jobs(jobs)
    }

    /// Rebuilds in place any circle-fallback source whose LOS polygon is now available.
    pub fn upgrade_fallbacks(&mut self, host: &dyn SceneHost) -> RebuildStats {
        let jobs: Vec<(DocId, GeometryInput)> = self
            .sources
            .iter()
            .filter(|(_, s)| s.is_fallback())
            .filter_map(|(id, s)| {
                host.light_los(id)
                    .map(|los| (id.clone(), s.geometry_input(Some(los), &self.ctx)))
            })
            .collect();
        self.apply_jobs(jobs)
    }

    fn apply_jobs(&mut self, jobs: Vec<(DocId, GeometryInput)>) -> RebuildStats {
        let mut stats = RebuildStats::default();
        if jobs.is_empty() {
            return stats;
        }
        stats.parallel = jobs.len() > self.ctx.lighting.parallel_rebuild_threshold;
        let built: Vec<_> = if stats.parallel {
            jobs.into_par_iter()
                .map(|(id, input)| (id, build_geometry(&input)))
                .collect()
        } else {
            jobs.into_iter()
                .map(|(id, input)| (id, build_geometry(&input)))
                .collect()
        };
        for (id, geometry) in built {
            let Some(src) = self.sources.get_mut(&id) else { continue };
            match &geometry {
                None => stats.skipped += 1,
                Some(g) if g.fallback => stats.fallbacks += 1,
                Some(_) => {}
            }
            stats.rebuilt += 1;
            src.set_geometry(geometry);
        }
        log::debug!(target: "lighting", "rebuilt {} sources ({} fallback, {} skipped, parallel={})",
            stats.rebuilt, stats.fallbacks, stats.skipped, stats.parallel);
        stats
    }

    pub fn tick(&mut self, frame: FrameTime, darkness_level: f32) {
        for src in self.sources.values_mut() {
            match src {
                SourceBuilder::Light(b) => b.tick(frame, &self.noise, self.audio_level),
                SourceBuilder::Darkness(b) => b.tick(frame, darkness_level),
            }
        }
    }

    /// Renderable light sources in id order.
    pub fn lights(&self) -> Vec<&LightSourceBuilder> {
        let mut v: Vec<_> = self
            .sources
            .values()
            .filter_map(|s| match s {
                SourceBuilder::Light(b) if b.is_renderable() => Some(b),
                _ => None,
            })
            .collect();
        v.sort_by(|a, b| a.id().cmp(b.id()));
        v
    }

    /// Renderable darkness sources in id order.
    pub fn darkness(&self) -> Vec<&DarknessSourceBuilder> {
        let mut v: Vec<_> = self
            .sources
            .values()
            .filter_map(|s| match s {
                SourceBuilder::Darkness(b) if b.is_renderable() => Some(b),
                _ => None,
            })
            .collect();
        v.sort_by(|a, b| a.id().cmp(b.id()));
        v
    }

    pub fn ids(&self) -> HashSet<DocId> {
        self.sources.keys().cloned().collect()
    }
}
