//! Headless driver for the viewer.
//! Usage: skyfall <world.glb> <character.glb> [--frames N] [--config tuning.json]

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::env;
    use std::path::Path;

    use skyfall::glb::load_assets_from_paths;
    use skyfall::{InputState, LogSink, Viewer, ViewerConfig};
    use winit::keyboard::KeyCode;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let flag = |name: &str| args.iter().skip_while(|a| a.as_str() != name).nth(1);
    let positional: Vec<&String> = args
        .iter()
        .enumerate()
        .filter(|(i, a)| !a.starts_with("--") && (*i == 0 || !args[i - 1].starts_with("--")))
        .map(|(_, a)| a)
        .collect();
    let (Some(world), Some(character)) = (positional.first(), positional.get(1)) else {
        eprintln!("usage: skyfall <world.glb> <character.glb> [--frames N] [--config tuning.json]");
        std::process::exit(2);
    };

    let frames: u64 = match flag("--frames") {
        Some(n) => n.parse()?,
        None => 600,
    };
    let config = match flag("--config") {
        Some(path) => ViewerConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ViewerConfig::default(),
    };

    let assets = load_assets_from_paths(Path::new(world), Path::new(character))?;
    let mut viewer = Viewer::new(assets, config, LogSink::new(60))?;
    let mut input = InputState::new();

    // Wait for the landing, walk long enough to break into a sprint, jump,
    // then stop.
    let mut landed_at = None;
    for frame in 0..frames {
        let Some(report) = viewer.frame(1.0 / 60.0, &mut input) else {
            break;
        };
        if report.camera_switched {
            landed_at = Some(frame);
        }
        let Some(start) = landed_at else {
            continue;
        };
        match frame - start {
            30 => input.handle_key_press(KeyCode::KeyW),
            150 => input.handle_key_press(KeyCode::Space),
            152 => input.handle_key_release(KeyCode::Space),
            240 => input.release_all(),
            _ => {}
        }
    }

    let player = viewer.player();
    log::info!(
        "Finished at {:?}, phase {:?}, sprint {}, camera {:?}",
        player.body.position,
        player.state.phase,
        player.state.sprint_intent,
        viewer.camera().mode()
    );
    viewer.destroy();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
