//! Packed-mask channel convention: R=outdoors, G=rope, B=token, A=roof.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaskSample {
    pub outdoors: f32,
    pub rope: f32,
    pub token: f32,
    pub roof: f32,
}

#[inline]
fn quantize(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

#[inline]
pub fn pack(m: MaskSample) -> [u8; 4] {
    [
        quantize(m.outdoors),
        quantize(m.rope),
        quantize(m.token),
        quantize(m.roof),
    ]
}

#[inline]
pub fn unpack(px: [u8; 4]) -> MaskSample {
    MaskSample {
        outdoors: px[0] as f32 / 255.0,
        rope: px[1] as f32 / 255.0,
        token: px[2] as f32 / 255.0,
        roof: px[3] as f32 / 255.0,
    }
}

/// Packs whole planes; missing outdoors reads as fully outdoors.
pub fn pack_planes(outdoors: Option<&[f32]>, rope: &[f32], token: &[f32], roof: &[f32]) -> Vec<[u8; 4]> {
    let n = rope.len().min(token.len()).min(roof.len());
    (0..n)
        .map(|i| {
            pack(MaskSample {
                outdoors: outdoors.and_then(|o| o.get(i).copied()).unwrap_or(1.0),
                rope: rope[i],
                token: token[i],
                roof: roof[i],
            })
        })
        .collect()
}
