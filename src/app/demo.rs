//! Built-in demo scene: a walled room with doors, an overhead porch, a
//! window, animated lights, a darkness source and three tokens. Textures are
//! generated procedurally at startup.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use hashbrown::HashSet;
use raylib::consts::{TextureFilter, TextureWrap};
use raylib::prelude::*;
use umbra_geom::{Rect, Vec2};
use umbra_render_raylib::TextureCache;
use umbra_scene::{
    DoorKind, DoorState, Environment, GridInfo, LevelContext, LightAnimation, LightConfig,
    LightDoc, OcclusionLayer, Rgb, SceneDimensions, TileDoc, TokenDoc, TokenFlags, WallDoc,
};

use super::host::DemoScene;

pub const MAP_TEXTURE: &str = "map";
pub const CLOUD_TEXTURE: &str = "clouds";
pub const OUTDOORS_TEXTURE: &str = "outdoors";
pub const FALLBACK_TEXTURE: &str = "fallback";

pub const SCENE_W: f32 = 2000.0;
pub const SCENE_H: f32 = 1500.0;
const ROOM: Rect = Rect::new(600.0, 400.0, 800.0, 700.0);
const OUTDOORS_SCALE: f32 = 0.1;

/// Ground floor of a two-storey scene; the wisp hovers on the floor above.
pub const GROUND_LEVEL: LevelContext = LevelContext {
    level_count: 2,
    active_bottom: 0.0,
    active_top: 50.0,
};
const WISP_ELEVATION: f32 = 60.0;

fn wall(id: &str, c: [f32; 4]) -> WallDoc {
    WallDoc {
        id: id.to_string(),
        c,
        ..WallDoc::default()
    }
}

fn door(id: &str, c: [f32; 4], door: DoorKind, ds: DoorState) -> WallDoc {
    WallDoc {
        id: id.to_string(),
        c,
        door,
        ds,
    }
}

fn light(id: &str, at: Vec2, dim: f32, bright: f32, color: &str, anim: Option<&str>) -> LightDoc {
    LightDoc {
        id: id.to_string(),
        x: at.x,
        y: at.y,
        config: LightConfig {
            dim,
            bright,
            color: Some(color.to_string()),
            alpha: 0.6,
            animation: LightAnimation {
                kind: anim.map(str::to_string),
                ..LightAnimation::default()
            },
            ..LightConfig::default()
        },
        ..LightDoc::default()
    }
}

fn tile(id: &str, rect: Rect, occlusion: OcclusionLayer, texture: &str, elevation: f32) -> TileDoc {
    TileDoc {
        id: id.to_string(),
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        elevation,
        occlusion,
        texture: Some(texture.to_string()),
        ..TileDoc::default()
    }
}

fn token(id: &str, cell: (f32, f32), grid: f32, style: Option<&str>, hidden: bool) -> TokenDoc {
    TokenDoc {
        id: id.to_string(),
        name: id.to_string(),
        x: cell.0 * grid,
        y: cell.1 * grid,
        hidden,
        texture: Some(format!("token-{id}")),
        flags: TokenFlags {
            movement_style: style.map(str::to_string),
        },
        ..TokenDoc::default()
    }
}

pub fn build_scene(gm: bool) -> DemoScene {
    let grid = GridInfo::default();
    let g = grid.size;
    let (l, t, r, b) = (ROOM.x, ROOM.y, ROOM.right(), ROOM.bottom());
    let walls = vec![
        wall("w-top", [l, t, r, t]),
        wall("w-bottom", [l, b, r, b]),
        wall("w-left-n", [l, t, l, 700.0]),
        door("door-west", [l, 700.0, l, 800.0], DoorKind::Door, DoorState::Closed),
        wall("w-left-s", [l, 800.0, l, b]),
        wall("w-right-n", [r, t, r, 700.0]),
        door("door-east", [r, 700.0, r, 800.0], DoorKind::Door, DoorState::Locked),
        wall("w-right-s", [r, 800.0, r, b]),
        wall("w-pillar", [900.0, 650.0, 1000.0, 650.0]),
        door("door-secret", [1000.0, 900.0, 1000.0, b], DoorKind::Secret, DoorState::Closed),
    ];

    let mut darkness = light("gloom", Vec2::new(350.0, 1150.0), 260.0, 0.0, "#302040", Some("magicalGloom"));
    darkness.config.negative = true;
    let lights = vec![
        light("torch", Vec2::new(800.0, 550.0), 350.0, 150.0, "#ff9b40", Some("torch")),
        light("pulse", Vec2::new(1250.0, 950.0), 300.0, 100.0, "#5080ff", Some("pulse")),
        light("chroma", Vec2::new(300.0, 300.0), 400.0, 120.0, "#ffffff", Some("chroma")),
        light("fairy", Vec2::new(1700.0, 1200.0), 250.0, 80.0, "#a0ffb0", Some("fairy")),
        light("lantern", Vec2::new(1600.0, 550.0), 300.0, 120.0, "#ffe0a0", None),
        darkness,
    ];

    let tiles = vec![
        tile(MAP_TEXTURE, Rect::new(0.0, 0.0, SCENE_W, SCENE_H), OcclusionLayer::None, MAP_TEXTURE, 0.0),
        tile("porch-roof", Rect::new(1400.0, 400.0, 400.0, 300.0), OcclusionLayer::Roof, "roof", 20.0),
        tile("awning", Rect::new(200.0, 1150.0, 300.0, 250.0), OcclusionLayer::WeatherRoof, "roof", 15.0),
        tile("window", Rect::new(1000.0, 390.0, 100.0, 20.0), OcclusionLayer::RopeMask, "window", 5.0),
    ];

    let mut wisp = token("wisp", (10.0, 6.0), g, Some("flying-glide"), false);
    wisp.elevation = WISP_ELEVATION;
    let tokens = vec![
        token("hero", (4.0, 7.0), g, None, false),
        wisp,
        token("rogue", (16.0, 9.0), g, Some("pick-up-drop"), true),
    ];

    let mut owned = HashSet::new();
    owned.insert("hero".to_string());
    DemoScene {
        grid,
        dims: SceneDimensions {
            width: SCENE_W,
            height: SCENE_H,
            scene_x: 0.0,
            scene_y: 0.0,
            scene_width: SCENE_W,
            scene_height: SCENE_H,
            distance: 5.0,
            size: g,
        },
        env: Environment {
            darkness_level: 0.65,
            ambient_darkness: Rgb::from_hex(0x1c1c3a),
            sun_dir: Vec2::new(0.6, 0.4),
            hour: 21.0,
            ..Environment::default()
        },
        lights,
        walls,
        tokens,
        tiles,
        level: None,
        gm,
        in_combat: false,
        owned,
        los_rays: 360,
        door_revision: 0,
        interactive: HashSet::new(),
    }
}

/// Outdoors coverage at a host point: 1 outside the room, 0 inside.
pub fn outdoors_at(p: Vec2) -> f32 {
    if ROOM.contains(p) { 0.0 } else { 1.0 }
}

fn noise(seed: i32, freq: f32, octaves: i32) -> FastNoiseLite {
    let mut n = FastNoiseLite::with_seed(seed);
    n.set_noise_type(Some(NoiseType::OpenSimplex2));
    n.set_frequency(Some(freq));
    n.set_fractal_type(Some(FractalType::FBm));
    n.set_fractal_octaves(Some(octaves));
    n
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn upload(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    cache: &mut TextureCache,
    key: &str,
    img: &Image,
    filter: TextureFilter,
    wrap: TextureWrap,
) {
    match rl.load_texture_from_image(thread, img) {
        Ok(tex) => {
            tex.set_texture_filter(thread, filter);
            tex.set_texture_wrap(thread, wrap);
            cache.replace_loaded(key.to_string(), tex);
        }
        Err(e) => log::warn!("texture {key}: upload failed: {e}"),
    }
}

/// Generates every texture the demo scene references.
pub fn generate_textures(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    cache: &mut TextureCache,
    seed: i32,
) {
    let bilinear = TextureFilter::TEXTURE_FILTER_BILINEAR;
    let clamp = TextureWrap::TEXTURE_WRAP_CLAMP;

    // Ground: grass outside, flagstones inside the room.
    let (mw, mh) = (500, 375);
    let ground = noise(seed, 0.02, 4);
    let mut map = Image::gen_image_color(mw, mh, Color::BLACK);
    for y in 0..mh {
        for x in 0..mw {
            let n = ground.get_noise_2d(x as f32, y as f32) * 0.5 + 0.5;
            let host = Vec2::new(x as f32 * SCENE_W / mw as f32, y as f32 * SCENE_H / mh as f32);
            let c = if outdoors_at(host) > 0.5 {
                Color::new(to_u8(0.18 + 0.12 * n), to_u8(0.35 + 0.2 * n), to_u8(0.15 + 0.08 * n), 255)
            } else {
                let seam = (x % 20 == 0 || y % 20 == 0) as u8 as f32 * 0.12;
                let v = 0.45 + 0.15 * n - seam;
                Color::new(to_u8(v), to_u8(v * 0.95), to_u8(v * 0.9), 255)
            };
            map.draw_pixel(x, y, c);
        }
    }
    upload(rl, thread, cache, MAP_TEXTURE, &map, bilinear, clamp);

    let mut roof = Image::gen_image_color(128, 128, Color::new(90, 45, 35, 255));
    for row in 0..8 {
        let off = if row % 2 == 0 { 0 } else { 8 };
        for col in 0..9 {
            roof.draw_rectangle(col * 16 - off, row * 16, 15, 15, Color::new(120, 60, 45, 255));
        }
    }
    upload(rl, thread, cache, "roof", &roof, bilinear, TextureWrap::TEXTURE_WRAP_REPEAT);

    let window = Image::gen_image_color(64, 16, Color::new(200, 225, 255, 220));
    upload(rl, thread, cache, "window", &window, bilinear, clamp);

    for (id, color) in [
        ("hero", Color::new(70, 130, 230, 255)),
        ("wisp", Color::new(180, 240, 255, 255)),
        ("rogue", Color::new(150, 40, 60, 255)),
    ] {
        let mut img = Image::gen_image_color(64, 64, Color::BLANK);
        img.draw_circle(32, 32, 30, Color::new(20, 20, 20, 255));
        img.draw_circle(32, 32, 26, color);
        upload(rl, thread, cache, &format!("token-{id}"), &img, bilinear, clamp);
    }

    let fallback = Image::gen_image_color(8, 8, Color::MAGENTA);
    upload(rl, thread, cache, FALLBACK_TEXTURE, &fallback, bilinear, clamp);

    // Cloud shadows: alpha carries density, tiled across the screen.
    let clouds = noise(seed.wrapping_add(7), 0.012, 5);
    let mut cloud = Image::gen_image_color(256, 256, Color::BLANK);
    for y in 0..256 {
        for x in 0..256 {
            let n = clouds.get_noise_2d(x as f32, y as f32) * 0.5 + 0.5;
            let a = ((n - 0.45) * 2.5).clamp(0.0, 1.0);
            cloud.draw_pixel(x, y, Color::new(255, 255, 255, to_u8(a)));
        }
    }
    upload(rl, thread, cache, CLOUD_TEXTURE, &cloud, bilinear, TextureWrap::TEXTURE_WRAP_REPEAT);

    let (ow, oh) = ((SCENE_W * OUTDOORS_SCALE) as i32, (SCENE_H * OUTDOORS_SCALE) as i32);
    let mut outdoors = Image::gen_image_color(ow, oh, Color::BLACK);
    for y in 0..oh {
        for x in 0..ow {
            let host = Vec2::new((x as f32 + 0.5) / OUTDOORS_SCALE, (y as f32 + 0.5) / OUTDOORS_SCALE);
            let v = to_u8(outdoors_at(host));
            outdoors.draw_pixel(x, y, Color::new(v, v, v, 255));
        }
    }
    upload(rl, thread, cache, OUTDOORS_TEXTURE, &outdoors, bilinear, clamp);
    log::info!("generated {} demo textures (seed {seed})", cache.map.len());
}
