use simple_walker::{RenderMode, WalkerConfig, WalkerEnv, ACTION_DIM, OBSERVATION_DIM};

fn main() {
    let mut env = match WalkerEnv::new(WalkerConfig::default(), RenderMode::OffscreenBuffer) {
        Ok(env) => env,
        Err(err) => {
            eprintln!("failed to create environment: {err}");
            return;
        }
    };

    println!("Walker environment demo");
    println!("=======================\n");
    println!("Observation size: {OBSERVATION_DIM}");
    println!("Action size: {ACTION_DIM}\n");

    let (observation, _) = env.reset(Some(42), None);
    println!("Spawn observation: {:?}\n", observation.as_slice());

    // Drive the legs in opposite directions and watch the torso.
    for step in 0..5 {
        let result = env.step([1.0, -1.0]);
        let obs = result.observation;
        println!("Step {}:", step + 1);
        println!("  torso angle: {:+.3}", obs.torso_angle());
        println!(
            "  torso position: ({:.1}, {:.1})",
            obs.torso_position()[0],
            obs.torso_position()[1]
        );
        println!(
            "  leg angles (relative): {:+.3}, {:+.3}",
            obs.leg_relative_angle(0),
            obs.leg_relative_angle(1)
        );
        println!("  reward: {:+.4}", result.reward);
        if let Some(breakdown) = env.last_reward() {
            println!(
                "  forward {:+.4}  energy -{:.4}  survival +{:.1}",
                breakdown.forward, breakdown.energy_penalty, breakdown.survival_bonus
            );
        }
        println!();
    }

    match env.render() {
        Ok(Some(frame)) => {
            println!("Rendered frame: {}x{} ({} bytes)", frame.width, frame.height, frame.pixels.len());
            println!("HUD: {}", env.scene().hud_line());
        }
        Ok(None) => println!("No frame rendered"),
        Err(err) => eprintln!("render failed: {err}"),
    }
    env.close();
}
