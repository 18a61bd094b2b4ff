use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::f32::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harrier::steering::obstacles::Obstacle;
use harrier::steering::query::{CandidateFilter, Faction};
use harrier::steering::{
    Behavior, FlowFieldAnchor, HeadingMode, Kinematics, LinePath, PathCompleted, PathFollower, SteerTick,
    SteeringParams, SteeringPlan, SteeringPlugin, SteeringProfile, SteeringProfilesPlugin,
};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "bevy_ecs=info,bevy_asset=warn,harrier=info";

fn setup_file_logging() -> std::io::Result<String> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("harrier_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // Don't rotate during a single run
        &log_dir,
        &log_filename,
    );

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn setup_stdout_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with("harrier") && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

/// Wall-clock run time of the demo before it exits.
#[derive(Resource)]
struct DemoTimer(Timer);

fn main() {
    match setup_file_logging() {
        Ok(log_file) => {
            println!("╔══════════════════════════════════════════════════════════╗");
            println!("║  Harrier steering demo - Logging to file                 ║");
            println!("╠══════════════════════════════════════════════════════════╣");
            println!("║  Log file: {:<45} ║", log_file);
            println!("╚══════════════════════════════════════════════════════════╝");
        }
        Err(e) => {
            eprintln!("Could not set up file logging ({e}), logging to stdout only");
            setup_stdout_logging();
        }
    }

    let run_secs = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<f32>().ok())
        .unwrap_or(20.0);

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))))
        .add_plugins(AssetPlugin::default())
        .add_plugins((SteeringPlugin, SteeringProfilesPlugin))
        .insert_resource(DemoTimer(Timer::from_seconds(run_secs, TimerMode::Once)))
        .add_systems(Startup, spawn_demo_scene)
        .add_systems(Update, (report_path_completions, report_status, exit_when_done))
        .run();
}

/// An arena ring, a handful of rocks, a ship flying a patrol loop, enemies
/// hunting it, a missile, and miners hiding among the rocks.
fn spawn_demo_scene(mut commands: Commands) {
    commands.spawn((Transform::default(), Obstacle::boundary(40.0)));
    for i in 0..8 {
        let angle = i as f32 / 8.0 * TAU;
        let center = Vec2::from_angle(angle) * 18.0;
        commands.spawn((
            Transform::from_translation(center.extend(0.0)),
            Obstacle::solid(1.5 + (i % 3) as f32),
        ));
    }

    let Some(patrol) = LinePath::new(vec![
        Vec2::new(-25.0, -25.0),
        Vec2::new(25.0, -25.0),
        Vec2::new(25.0, 25.0),
        Vec2::new(-25.0, 25.0),
        Vec2::new(-25.0, -25.0),
    ]) else {
        return;
    };

    let ship = commands
        .spawn((
            Name::new("ship"),
            Kinematics::new(Vec2::new(-25.0, -25.0), 0.6, 6.0, 14.0),
            Faction(0),
            SteeringProfile("ship".into()),
            PathFollower::new(patrol).looping(),
            HeadingMode::SmoothedVelocity,
            FlowFieldAnchor,
            SteeringPlan::new()
                .with(Behavior::FollowPath, 1.0)
                .with(Behavior::ObstacleAvoidance, 1.5)
                .with(Behavior::FlowBias { radius: 1.5 }, 0.5),
        ))
        .id();

    for i in 0..6 {
        let pos = Vec2::new(30.0, -10.0 + i as f32 * 4.0);
        commands.spawn((
            Name::new(format!("enemy_{i}")),
            Kinematics::new(pos, 0.5, 4.5, 10.0),
            Faction(1),
            SteeringProfile("enemy".into()),
            SteeringPlan::new()
                .with(Behavior::Pursue(ship), 1.0)
                .with(Behavior::Separation(CandidateFilter::Friendly), 1.0)
                .with(Behavior::CollisionAvoidance(CandidateFilter::All), 1.0)
                .with(Behavior::ObstacleAvoidance, 1.5),
        ));
    }

    commands.spawn((
        Name::new("missile"),
        Kinematics::new(Vec2::new(0.0, -35.0), 0.2, 9.0, 30.0).with_turn_speed(8.0),
        Faction(1),
        SteeringProfile("missile".into()),
        SteeringPlan::new()
            .with(Behavior::Pursue(ship), 1.0)
            .with(Behavior::ObstacleAvoidance, 1.0),
    ));

    for i in 0..3 {
        let pos = Vec2::new(-5.0 + i as f32 * 5.0, 0.0);
        commands.spawn((
            Name::new(format!("miner_{i}")),
            Kinematics::new(pos, 0.4, 3.0, 8.0),
            Faction(0),
            SteeringProfile("miner".into()),
            SteeringPlan::new()
                .with(Behavior::Wander2, 0.6)
                .with(Behavior::Hide(ship), 0.4)
                .with(Behavior::Separation(CandidateFilter::Friendly), 1.0)
                .with(Behavior::ObstacleAvoidance, 1.0),
        ));
    }

    // A courier running its route backwards, once.
    if let Some(route) = LinePath::new(vec![Vec2::new(-10.0, 10.0), Vec2::new(10.0, 10.0), Vec2::new(10.0, 30.0)]) {
        commands.spawn((
            Name::new("courier"),
            Kinematics::new(Vec2::new(10.0, 30.0), 0.4, 4.0, 12.0),
            SteeringParams {
                stop_radius: 0.05,
                ..Default::default()
            },
            PathFollower::new(route).reversed(),
            SteeringPlan::new()
                .with(Behavior::FollowPath, 1.0)
                .with(Behavior::ObstacleAvoidance, 1.0),
        ));
    }

    info!("[STEERING] Demo scene spawned");
}

fn report_path_completions(mut completed: MessageReader<PathCompleted>, names: Query<&Name>) {
    for event in completed.read() {
        let name = names.get(event.entity).map(|n| n.as_str()).unwrap_or("<unnamed>");
        info!("[PATH] {} finished its path", name);
    }
}

fn report_status(tick: Res<SteerTick>, agents: Query<(&Name, &Kinematics)>, mut last: Local<u64>) {
    if tick.0 / 150 == *last / 150 {
        return;
    }
    *last = tick.0;

    for (name, k) in agents.iter() {
        debug!(
            "[STEERING] {:<10} pos ({:>6.2}, {:>6.2}) speed {:>5.2}",
            name.as_str(),
            k.position.x,
            k.position.y,
            k.speed()
        );
    }
    info!("[STEERING] Tick {}: {} agents", tick.0, agents.iter().count());
}

fn exit_when_done(time: Res<Time<Real>>, mut timer: ResMut<DemoTimer>, mut exit: MessageWriter<AppExit>) {
    if timer.0.tick(time.delta()).just_finished() {
        info!("Demo finished after {:.1}s", timer.0.duration().as_secs_f32());
        exit.write(AppExit::Success);
    }
}
