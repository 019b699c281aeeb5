use camera_launch_core::{
    bake_trajectory, export_baked_json, CameraLaunchCommand, LaunchConfig, MemoryHost, NodeKind,
    SceneHost, Trajectory, Vector3,
};
use serde_json::to_string_pretty;

fn main() -> anyhow::Result<()> {
    let mut host = MemoryHost::new();
    host.add_node("camera1", NodeKind::Camera, Vector3::new(0.0, 1.5, 0.0));

    // Launch from the command line flags, e.g. `-v 2 12 0 -s 1`
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cmd = CameraLaunchCommand::new(LaunchConfig::default());
    let mut full = vec!["-c".to_string(), "camera1".to_string()];
    full.extend(args);
    cmd.parse(&host, &full)?;

    let report = cmd.execute(&mut host)?;
    println!("Launch:\n{}", to_string_pretty(&report.to_json())?);

    // Dense samples for the same launch, for inspection
    if let Some(params) = cmd.params() {
        let traj = Trajectory::solve(params, host.time_unit(), &LaunchConfig::default());
        let baked = bake_trajectory(&traj);
        println!("{} baked frames", baked.len());
        if let Some(first) = export_baked_json(&baked).get(0) {
            println!("First frame:\n{}", to_string_pretty(first)?);
        }
    }

    cmd.undo(&mut host)?;
    println!("Undone; {} animated channel(s) left", host.curve_count());
    Ok(())
}
