//! Observer for the host's visibility results. The per-token path is fed by
//! the host after each token computes its visibility; the bulk path runs once
//! per animation frame after `sightRefresh`/`visibilityRefresh`.

use hashbrown::{HashMap, HashSet};
use umbra_scene::config::VisibilityConfig;
use umbra_scene::{DocId, HookEvent, LevelContext, SceneHost};

use crate::level::above_active_level;
use crate::surface::{SpriteSink, TokenPlaceables};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenVisibility {
    pub visible: bool,
    pub detection_filter: Option<String>,
}

pub struct VisibilityController {
    cfg: VisibilityConfig,
    level: Option<LevelContext>,
    pending: bool,
    states: HashMap<DocId, TokenVisibility>,
    scratch: Vec<DocId>,
    live: HashSet<DocId>,
    refreshes: u64,
}

impl VisibilityController {
    pub fn new(cfg: VisibilityConfig) -> Self {
        Self {
            cfg,
            level: None,
            pending: false,
            states: HashMap::new(),
            scratch: Vec::new(),
            live: HashSet::new(),
            refreshes: 0,
        }
    }

    pub fn set_config(&mut self, cfg: VisibilityConfig) {
        self.cfg = cfg;
    }

    pub fn set_level_context(&mut self, ctx: Option<LevelContext>) {
        log::debug!(target: "visibility", "level context {ctx:?}");
        self.level = ctx;
    }

    /// Picks up the host's level context; call on `canvasReady` and
    /// `updateScene`.
    pub fn sync_from_host(&mut self, host: &dyn SceneHost) {
        let ctx = host.level_context();
        if ctx != self.level {
            self.set_level_context(ctx);
        }
        self.request_refresh();
    }

    #[inline]
    pub fn level_context(&self) -> Option<&LevelContext> {
        self.level.as_ref()
    }

    pub fn state(&self, id: &str) -> Option<&TokenVisibility> {
        self.states.get(id)
    }

    /// `{tokenId -> {visible, detectionFilter}}` for outline and glow effects.
    pub fn states(&self) -> &HashMap<DocId, TokenVisibility> {
        &self.states
    }

    /// Number of bulk refreshes run so far.
    #[inline]
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Schedules a bulk refresh for the next animation frame. Returns false
    /// when one was already pending.
    pub fn request_refresh(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    pub fn handle_hook(&mut self, event: &HookEvent) {
        match event {
            HookEvent::SightRefresh | HookEvent::VisibilityRefresh => {
                self.request_refresh();
            }
            HookEvent::LevelContextChanged { context } => {
                self.set_level_context(*context);
                self.request_refresh();
            }
            _ => {}
        }
    }

    fn hidden_by_level(&self, elevation: f32) -> bool {
        above_active_level(elevation, self.level.as_ref(), self.cfg.level_epsilon)
    }

    /// Per-token path: the host just computed `is_visible` for `id`.
    pub fn on_token_visibility_computed(
        &mut self,
        id: &str,
        is_visible: bool,
        host: &mut dyn TokenPlaceables,
        sprites: &mut dyn SpriteSink,
    ) {
        if !sprites.has_sprite(id) {
            return;
        }
        let elevation = host.document(id).map_or(0.0, |d| d.elevation);
        let visible = is_visible && !self.hidden_by_level(elevation);
        sprites.set_sprite_visible(id, visible);
        host.keep_interactive(id);
        let filter = host.detection_filter(id);
        self.states.insert(
            id.to_string(),
            TokenVisibility {
                visible,
                detection_filter: filter,
            },
        );
    }

    /// Runs the coalesced bulk refresh if one is pending.
    pub fn on_animation_frame(
        &mut self,
        host: &mut dyn TokenPlaceables,
        sprites: &mut dyn SpriteSink,
    ) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.refresh_all(host, sprites);
        true
    }

    /// Bulk path over every sprite-backed token. Sprites without a host
    /// counterpart are hidden.
    pub fn refresh_all(&mut self, host: &mut dyn TokenPlaceables, sprites: &mut dyn SpriteSink) {
        let mut ids = std::mem::take(&mut self.scratch);
        ids.clear();
        sprites.sprite_ids(&mut ids);
        let mut shown = 0usize;
        for id in &ids {
            let (visible, opacity, filter) = match host.is_visible(id) {
                None => (false, 1.0, None),
                Some(v) => {
                    let doc = host.document(id);
                    let elevation = doc.as_ref().map_or(0.0, |d| d.elevation);
                    let hidden_flag = doc.as_ref().is_some_and(|d| d.hidden);
                    let opacity = if hidden_flag {
                        self.cfg.hidden_opacity.clamp(0.0, 1.0)
                    } else {
                        1.0
                    };
                    (
                        v && !self.hidden_by_level(elevation),
                        opacity,
                        host.detection_filter(id),
                    )
                }
            };
            sprites.set_sprite_visible(id, visible);
            sprites.set_sprite_opacity(id, opacity);
            shown += visible as usize;
            self.states.insert(
                id.clone(),
                TokenVisibility {
                    visible,
                    detection_filter: filter,
                },
            );
        }
        let mut live = std::mem::take(&mut self.live);
        live.clear();
        live.extend(ids.iter().cloned());
        self.states.retain(|id, _| live.contains(id));
        self.live = live;
        self.refreshes += 1;
        log::trace!(target: "visibility", "refresh {}: {shown}/{} visible", self.refreshes, ids.len());
        self.scratch = ids;
    }
}
