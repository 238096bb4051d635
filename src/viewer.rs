//! Interactive map viewer.
//!
//! The viewport controller from the system diagram, as a demo: drives the
//! engine with center/zoom once per frame and blits the published display
//! plane into a minifb window. The synthetic provider's loaded window
//! follows the viewport center, so panning streams terrain in the way a
//! real client would.

use minifb::{Key, Window, WindowOptions};

use crate::canvas::SAMPLE_SIZE;
use crate::coords::TileCoord;
use crate::engine::MapEngine;
use crate::synthetic::NoiseTerrain;

/// Blocks panned per frame per blocks-per-pixel of zoom.
const PAN_STEP: i32 = 4;

/// Run the interactive viewer until the window closes or Escape is hit.
/// Arrows/WASD pan (with the builder's boost budget while held), `-`/`=`
/// zoom, Escape exits.
pub fn run_viewer(
    engine: &mut MapEngine,
    world: &mut NoiseTerrain,
    start_blocks_per_pixel: i32,
    scale: usize,
) -> Result<(), minifb::Error> {
    let scale = scale.max(1);
    let window_size = SAMPLE_SIZE * scale;

    let mut window = Window::new(
        "groundmap - arrows/WASD: pan, -/=: zoom, Esc: exit",
        window_size,
        window_size,
        WindowOptions::default(),
    )?;
    window.set_target_fps(60);

    let mut center_x = 0i32;
    let mut center_z = 0i32;
    let mut bpp = start_blocks_per_pixel;
    let mut buffer = vec![0u32; window_size * window_size];

    println!("Viewer started. Controls:");
    println!("  Arrows / WASD: pan (hold for boost)");
    println!("  - / =: zoom out / in");
    println!("  Esc: exit");

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let mut panning = false;
        let step = PAN_STEP * bpp;

        if window.is_key_down(Key::Left) || window.is_key_down(Key::A) {
            center_x -= step;
            panning = true;
        }
        if window.is_key_down(Key::Right) || window.is_key_down(Key::D) {
            center_x += step;
            panning = true;
        }
        if window.is_key_down(Key::Up) || window.is_key_down(Key::W) {
            center_z -= step;
            panning = true;
        }
        if window.is_key_down(Key::Down) || window.is_key_down(Key::S) {
            center_z += step;
            panning = true;
        }
        if window.is_key_pressed(Key::Minus, minifb::KeyRepeat::No) {
            bpp += 1;
        }
        if window.is_key_pressed(Key::Equal, minifb::KeyRepeat::No) {
            bpp = (bpp - 1).max(1);
        }

        // the loaded window follows the viewport, like a player walking
        world.set_anchor(TileCoord::from_world(center_x, center_z));

        engine.tick(world, bpp, center_x, center_z, panning);
        bpp = engine.blocks_per_pixel();

        blit_scaled(engine.display(), &mut buffer, scale);
        if engine.is_rebuilding() {
            draw_build_indicator(&mut buffer, window_size);
        }

        window.update_with_buffer(&buffer, window_size, window_size)?;
    }

    println!("{}", engine.stats().summary());
    Ok(())
}

/// Integer-scale the 256×256 display plane into the window buffer.
/// minifb wants 0RGB, which is the ARGB plane with alpha ignored.
fn blit_scaled(display: &[u32], buffer: &mut [u32], scale: usize) {
    let out_width = SAMPLE_SIZE * scale;
    for sy in 0..SAMPLE_SIZE {
        let src_base = sy * SAMPLE_SIZE;
        for sx in 0..SAMPLE_SIZE {
            let color = display[src_base + sx] & 0x00FF_FFFF;
            let ox = sx * scale;
            for dy in 0..scale {
                let dst_base = (sy * scale + dy) * out_width + ox;
                buffer[dst_base..dst_base + scale].fill(color);
            }
        }
    }
}

/// Small square in the top-left corner while a rebuild is in flight, so
/// partial frames are visibly "in progress".
fn draw_build_indicator(buffer: &mut [u32], window_size: usize) {
    const SIZE: usize = 6;
    const MARGIN: usize = 4;
    for y in 0..SIZE {
        let base = (MARGIN + y) * window_size + MARGIN;
        buffer[base..base + SIZE].fill(0x00FF_C832);
    }
}
