//! Engine-drawn sprites: the map, tiles and tokens, addressed by document id.

use hashbrown::HashMap;
use umbra_geom::{Rect, Vec2};
use umbra_pipeline::{Layers, SpriteId};
use umbra_scene::{DocId, OcclusionLayer, TileDoc, TokenDoc};

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub doc: DocId,
    /// Key into the texture cache.
    pub texture: String,
    /// Host pixels, before rotation.
    pub rect: Rect,
    /// Degrees, about the rect centre.
    pub rotation: f32,
    /// Visual lift in pixels (pick-up, hover).
    pub lift: f32,
    pub elevation: f32,
    pub alpha: f32,
    pub layers: Layers,
    pub visible: bool,
    pub token: bool,
}

impl Sprite {
    pub fn for_tile(doc: &TileDoc, fallback_texture: &str) -> Self {
        let layers = match doc.occlusion {
            OcclusionLayer::None => Layers::BASE,
            OcclusionLayer::Roof => Layers::ROOF,
            OcclusionLayer::WeatherRoof => Layers::WEATHER_ROOF,
            OcclusionLayer::RopeMask => Layers::ROPE,
        };
        Self {
            doc: doc.id.clone(),
            texture: doc
                .texture
                .clone()
                .unwrap_or_else(|| fallback_texture.to_string()),
            rect: doc.rect(),
            rotation: doc.rotation,
            lift: 0.0,
            elevation: doc.elevation,
            alpha: doc.alpha.clamp(0.0, 1.0),
            layers,
            visible: !doc.hidden,
            token: false,
        }
    }

    pub fn for_token(doc: &TokenDoc, grid_size: f32, fallback_texture: &str) -> Self {
        Self {
            doc: doc.id.clone(),
            texture: doc
                .texture
                .clone()
                .unwrap_or_else(|| fallback_texture.to_string()),
            rect: Rect::new(doc.x, doc.y, doc.width * grid_size, doc.height * grid_size),
            rotation: doc.rotation,
            lift: 0.0,
            elevation: doc.elevation,
            alpha: 1.0,
            layers: Layers::BASE,
            visible: true,
            token: true,
        }
    }

    /// Moves the rect so its centre sits on `center`.
    pub fn center_on(&mut self, center: Vec2) {
        self.rect.x = center.x - self.rect.width * 0.5;
        self.rect.y = center.y - self.rect.height * 0.5;
    }

    #[inline]
    pub fn drawable(&self) -> bool {
        self.visible && self.alpha > 0.0
    }
}

#[derive(Default)]
pub struct SpriteStore {
    sprites: Vec<Sprite>,
    by_doc: HashMap<DocId, usize>,
    order: Vec<usize>,
    order_dirty: bool,
}

impl SpriteStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Inserts or replaces the sprite for `sprite.doc`.
    pub fn upsert(&mut self, sprite: Sprite) -> SpriteId {
        self.order_dirty = true;
        match self.by_doc.get(&sprite.doc) {
            Some(&i) => {
                self.sprites[i] = sprite;
                SpriteId(i as u32)
            }
            None => {
                let i = self.sprites.len();
                self.by_doc.insert(sprite.doc.clone(), i);
                self.sprites.push(sprite);
                SpriteId(i as u32)
            }
        }
    }

    /// Ids of later sprites shift; callers never hold ids across frames.
    pub fn remove(&mut self, doc: &str) -> Option<Sprite> {
        let i = self.by_doc.remove(doc)?;
        let removed = self.sprites.swap_remove(i);
        if let Some(moved) = self.sprites.get(i) {
            self.by_doc.insert(moved.doc.clone(), i);
        }
        self.order_dirty = true;
        Some(removed)
    }

    #[inline]
    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(id.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.get_mut(id.0 as usize)
    }

    pub fn by_doc(&self, doc: &str) -> Option<&Sprite> {
        self.by_doc.get(doc).map(|&i| &self.sprites[i])
    }

    /// Elevation may change through the returned borrow, so the draw order
    /// is recomputed.
    pub fn by_doc_mut(&mut self, doc: &str) -> Option<&mut Sprite> {
        let i = *self.by_doc.get(doc)?;
        self.order_dirty = true;
        self.sprites.get_mut(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn set_layers(&mut self, id: SpriteId, layers: Layers) {
        if let Some(s) = self.sprites.get_mut(id.0 as usize) {
            s.layers = layers;
        }
    }

    pub fn token_layers(&self, out: &mut Vec<(SpriteId, Layers)>) {
        out.extend(
            self.sprites
                .iter()
                .enumerate()
                .filter(|(_, s)| s.token)
                .map(|(i, s)| (SpriteId(i as u32), s.layers)),
        );
    }

    /// Draw order: elevation, then tokens above tiles, then insertion.
    pub fn refresh_order(&mut self) {
        if !self.order_dirty && self.order.len() == self.sprites.len() {
            return;
        }
        self.order.clear();
        self.order.extend(0..self.sprites.len());
        let sprites = &self.sprites;
        self.order.sort_by(|&a, &b| {
            let (sa, sb) = (&sprites[a], &sprites[b]);
            sa.elevation
                .total_cmp(&sb.elevation)
                .then(sa.token.cmp(&sb.token))
                .then(a.cmp(&b))
        });
        self.order_dirty = false;
    }

    pub fn ordered(&mut self) -> impl Iterator<Item = &Sprite> + '_ {
        self.refresh_order();
        let sprites = &self.sprites;
        self.order.iter().map(move |&i| &sprites[i])
    }
}
