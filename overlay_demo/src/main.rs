//! Statistics overlay demo
//!
//! Drives the overlay on the headless backend for a few frames: a statistics
//! box, a pair of buttons and an input box, with scripted pointer and key
//! events. Run with `RUST_LOG=debug` to see per-batch upload logging.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use overlay2d::foundation::logging;
use overlay2d::prelude::*;
use overlay2d::ui::FrameSample;

const FRAMES: u32 = 5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = OverlayConfig::default();
    logging::init_with_level(&config.log_level);
    log::info!("Starting overlay demo");

    let loader = MonospaceFontLoader::new(&config.screen);
    let mut manager = Manager::new(config, HeadlessBackend::new(), Box::new(loader))?;
    manager.load_font("fonts/mono.ttf", 16)?;

    let stats = manager.create_statistics()?;
    manager.show_widget(stats)?;

    let toggles = Rc::new(Cell::new(0_u32));
    let details = manager.create_button("Details", 0.5, -0.9, 0.4, 0.12)?;
    let counter = Rc::clone(&toggles);
    manager.add_click_listener(details, move |_| counter.set(counter.get() + 1))?;

    let quit = manager.create_button("Quit", 0.5, -0.75, 0.4, 0.12)?;
    let quit_requested = Rc::new(Cell::new(false));
    let flag = Rc::clone(&quit_requested);
    manager.add_click_listener(quit, move |_| flag.set(true))?;

    manager.set_color(Vec4::new(1.0, 0.8, 0.2, 1.0));
    manager.create_string("Name:", -0.5, 0.1)?;
    let name = manager.create_input_box(-0.5, 0.0)?;

    let mut extended = false;
    let mut last = Instant::now();
    for frame in 0..FRAMES {
        manager.backend_mut().clear_commands();

        // Scripted input
        match frame {
            1 => {
                manager.mouse_pressed(0.7, -0.85, MouseButton::Left);
                manager.mouse_released(0.7, -0.85, MouseButton::Left);
            }
            2 => {
                for c in "overlay".chars() {
                    manager.key_pressed(Key::Char(c))?;
                }
            }
            3 => {
                manager.mouse_pressed(0.7, -0.7, MouseButton::Left);
                manager.mouse_released(0.7, -0.7, MouseButton::Left);
            }
            _ => {}
        }

        let want_extended = toggles.get() % 2 == 1;
        if want_extended != extended {
            manager.set_statistics_extended(stats, want_extended)?;
            extended = want_extended;
        }

        let elapsed = last.elapsed().as_secs_f32().max(f32::EPSILON);
        last = Instant::now();
        let sample = FrameSample::from_frame(1.0 / elapsed, &manager.frame_stats());
        manager.update_statistics(stats, &sample)?;
        manager.set_physics_time(stats, 0.0)?;

        let frame_stats = manager.render()?;
        log::info!(
            "Frame {frame}: {} quads in {} draws, {} elements republished",
            frame_stats.quads(),
            frame_stats.draw_calls(),
            frame_stats.untextured.elements_written
                + frame_stats.textured.elements_written
                + frame_stats.text.elements_written
        );

        if quit_requested.get() {
            log::info!("Quit clicked after frame {frame}");
            break;
        }
    }

    log::info!("Name field holds {:?}", manager.input_text(name)?);
    manager.shutdown();
    Ok(())
}
