//! In-process hook bus. Hosts emit typed events at any time; the engine drains
//! them at the start of the next frame so no document change lands mid-frame.

use std::collections::VecDeque;

use serde_json::Value;

use crate::model::{DocId, LevelContext, LightDoc, WallDoc};

#[derive(Clone, Debug, PartialEq)]
pub enum HookEvent {
    CreateAmbientLight { doc: LightDoc },
    UpdateAmbientLight { id: DocId, changes: Value },
    DeleteAmbientLight { id: DocId },
    CreateWall { doc: WallDoc },
    UpdateWall { id: DocId, changes: Value },
    DeleteWall { id: DocId },
    LightingRefresh,
    SightRefresh,
    VisibilityRefresh,
    ControlToken { id: DocId, controlled: bool },
    CreateCombat,
    UpdateCombat,
    DeleteCombat,
    CanvasReady,
    UpdateScene { changes: Value },
    LevelContextChanged { context: Option<LevelContext> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    CreateAmbientLight,
    UpdateAmbientLight,
    DeleteAmbientLight,
    CreateWall,
    UpdateWall,
    DeleteWall,
    LightingRefresh,
    SightRefresh,
    VisibilityRefresh,
    ControlToken,
    CreateCombat,
    UpdateCombat,
    DeleteCombat,
    CanvasReady,
    UpdateScene,
    LevelContextChanged,
}

impl HookEvent {
    pub fn kind(&self) -> HookKind {
        match self {
            HookEvent::CreateAmbientLight { .. } => HookKind::CreateAmbientLight,
            HookEvent::UpdateAmbientLight { .. } => HookKind::UpdateAmbientLight,
            HookEvent::DeleteAmbientLight { .. } => HookKind::DeleteAmbientLight,
            HookEvent::CreateWall { .. } => HookKind::CreateWall,
            HookEvent::UpdateWall { .. } => HookKind::UpdateWall,
            HookEvent::DeleteWall { .. } => HookKind::DeleteWall,
            HookEvent::LightingRefresh => HookKind::LightingRefresh,
            HookEvent::SightRefresh => HookKind::SightRefresh,
            HookEvent::VisibilityRefresh => HookKind::VisibilityRefresh,
            HookEvent::ControlToken { .. } => HookKind::ControlToken,
            HookEvent::CreateCombat => HookKind::CreateCombat,
            HookEvent::UpdateCombat => HookKind::UpdateCombat,
            HookEvent::DeleteCombat => HookKind::DeleteCombat,
            HookEvent::CanvasReady => HookKind::CanvasReady,
            HookEvent::UpdateScene { .. } => HookKind::UpdateScene,
            HookEvent::LevelContextChanged { .. } => HookKind::LevelContextChanged,
        }
    }
}

impl HookKind {
    pub fn name(self) -> &'static str {
        match self {
            HookKind::CreateAmbientLight => "createAmbientLight",
            HookKind::UpdateAmbientLight => "updateAmbientLight",
            HookKind::DeleteAmbientLight => "deleteAmbientLight",
            HookKind::CreateWall => "createWall",
            HookKind::UpdateWall => "updateWall",
            HookKind::DeleteWall => "deleteWall",
            HookKind::LightingRefresh => "lightingRefresh",
            HookKind::SightRefresh => "sightRefresh",
            HookKind::VisibilityRefresh => "visibilityRefresh",
            HookKind::ControlToken => "controlToken",
            HookKind::CreateCombat => "createCombat",
            HookKind::UpdateCombat => "updateCombat",
            HookKind::DeleteCombat => "deleteCombat",
            HookKind::CanvasReady => "canvasReady",
            HookKind::UpdateScene => "updateScene",
            HookKind::LevelContextChanged => "levelContextChanged",
        }
    }
}

pub struct HookEnvelope {
    pub id: u64,
    pub frame: u64,
    pub event: HookEvent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&HookEvent)>;

pub struct HookBus {
    queue: VecDeque<HookEnvelope>,
    listeners: Vec<(ListenerId, HookKind, Listener)>,
    pub frame: u64,
    next_id: u64,
}

impl Default for HookBus {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            listeners: Vec::new(),
            frame: 0,
            next_id: 1,
        }
    }
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn on<F>(&mut self, kind: HookKind, f: F) -> ListenerId
    where
        F: FnMut(&HookEvent) + 'static,
    {
        let id = ListenerId(self.alloc_id());
        self.listeners.push((id, kind, Box::new(f)));
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: HookEvent) -> u64 {
        let id = self.alloc_id();
        log::debug!(target: "hooks", "[frame {}] queued {}", self.frame, event.kind().name());
        self.queue.push_back(HookEnvelope {
            id,
            frame: self.frame,
            event,
        });
        id
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Delivers everything queued so far to registered listeners and hands the
    /// events back in emission order. Events emitted by listeners wait for the
    /// next drain.
    pub fn drain(&mut self) -> Vec<HookEvent> {
        let batch: Vec<HookEnvelope> = self.queue.drain(..).collect();
        let mut out = Vec::with_capacity(batch.len());
        for env in batch {
            let kind = env.event.kind();
            for (_, lk, f) in self.listeners.iter_mut() {
                if *lk == kind {
                    f(&env.event);
                }
            }
            log::trace!(target: "hooks", "[frame {}] delivered #{} {} (queued at {})",
                self.frame, env.id, kind.name(), env.frame);
            out.push(env.event);
        }
        out
    }

    pub fn advance_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}
