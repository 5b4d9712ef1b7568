use tribatch_engine::coords::{ColorRgba, Viewport};
use tribatch_engine::scene::UniformBlock;
use tribatch_engine::texture::ImageData;

/// One quad of the grid: where it goes and which texture slot it samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub uniform: UniformBlock,
    pub slot: usize,
}

/// Lays `count` quads out in a grid filling NDC space, roughly square cells
/// for the given viewport. Quads are unit sized in vertex data; the uniform
/// block scales and offsets them into their cell.
pub fn grid(count: u32, viewport: Viewport, slots: usize) -> Vec<Placement> {
    if count == 0 {
        return Vec::new();
    }

    let cols = ((count as f32 * viewport.aspect()).sqrt().ceil() as u32).clamp(1, count);
    let rows = count.div_ceil(cols);
    let cell = [2.0 / cols as f32, 2.0 / rows as f32];

    (0..count)
        .map(|i| {
            let (col, row) = (i % cols, i / cols);
            let center = [
                -1.0 + cell[0] * (col as f32 + 0.5),
                1.0 - cell[1] * (row as f32 + 0.5),
            ];
            let scale = [cell[0] * 0.9, cell[1] * 0.9];
            Placement {
                uniform: UniformBlock::tinted(tint(i, count), center, scale),
                slot: i as usize % slots.max(1),
            }
        })
        .collect()
}

/// Soft gradient across the grid so every draw carries a distinct uniform block.
fn tint(index: u32, count: u32) -> [f32; 4] {
    let t = index as f32 / count.max(1) as f32;
    [0.6 + 0.4 * t, 0.8, 1.0 - 0.4 * t, 1.0]
}

/// Pixels for texture slot `slot`: the decoded image if any, else a checkerboard
/// whose colors depend on the slot.
pub fn texture_pixels(image: Option<&ImageData>, slot: usize) -> ImageData {
    if let Some(image) = image {
        return image.clone();
    }

    const PALETTE: [(u8, u8, u8); 6] = [
        (230, 57, 70),
        (42, 157, 143),
        (233, 196, 106),
        (69, 123, 157),
        (244, 162, 97),
        (131, 56, 236),
    ];
    let (r, g, b) = PALETTE[slot % PALETTE.len()];
    let light = ColorRgba::from_rgb8(r, g, b).to_rgba8();
    let dark = [r / 3, g / 3, b / 3, 255];
    ImageData::checkerboard(64, 8 << (slot % 3), light, dark)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_places_every_quad_inside_ndc() {
        let layout = grid(37, Viewport::new(1024, 768), 4);
        assert_eq!(layout.len(), 37);

        for p in &layout {
            let [x, y, sx, sy] = p.uniform.vectors[1];
            assert!(x - sx / 2.0 >= -1.0 - 1e-5 && x + sx / 2.0 <= 1.0 + 1e-5);
            assert!(y - sy / 2.0 >= -1.0 - 1e-5 && y + sy / 2.0 <= 1.0 + 1e-5);
            assert!(p.slot < 4);
        }
    }

    #[test]
    fn slots_cycle() {
        let layout = grid(6, Viewport::new(100, 100), 3);
        let slots: Vec<_> = layout.iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn empty_grid() {
        assert!(grid(0, Viewport::new(100, 100), 1).is_empty());
    }

    #[test]
    fn generated_textures_are_rgba() {
        let img = texture_pixels(None, 5);
        assert_eq!(img.pixels.len(), (img.width * img.height * 4) as usize);
    }

    #[test]
    fn supplied_image_is_reused() {
        let solid = ImageData::solid(2, 3, [1, 2, 3, 4]);
        assert_eq!(texture_pixels(Some(&solid), 9), solid);
    }
}
