//! The reversible `cameraLaunch` command.
//!
//! A command instance walks `Idle -> Parsed -> Executed <-> Undone`, and can be
//! disposed from any state. Everything is computed before the host is touched;
//! the channels about to be replaced are snapshotted so that undo (and a failed
//! execute) can put them back exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::args::LaunchArgs;
use crate::baking::{bake_channel_plans, check_bake_span};
use crate::channel::{ChannelId, LaunchHost, NodeKind, SceneHost};
use crate::config::{KeyMode, LaunchConfig};
use crate::error::LaunchError;
use crate::frames::{check_start_frame, ControlFrames};
use crate::params::LaunchParameters;
use crate::trajectory::Trajectory;
use crate::undo::UndoStore;
use crate::writer::{ChannelPlan, ChannelWriter};
use crate::Result;

/// Name the command is registered under.
pub const COMMAND_NAME: &str = "cameraLaunch";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    Idle,
    Parsed,
    Executed,
    Undone,
    Disposed,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandState::Idle => "idle",
            CommandState::Parsed => "parsed",
            CommandState::Executed => "executed",
            CommandState::Undone => "undone",
            CommandState::Disposed => "disposed",
        };
        f.write_str(s)
    }
}

/// Summary of a successful execute or redo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchReport {
    pub camera: String,
    pub key_mode: KeyMode,
    pub frames: ControlFrames,
    pub fps: f64,
    /// `None` when the input had no ballistic arc.
    pub flight_seconds: Option<f64>,
    pub channels: Vec<ChannelId>,
    pub keys_written: usize,
    /// False when the vertical tangent fit was degenerate.
    pub tangents_fitted: bool,
}

impl LaunchReport {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Default)]
struct PriorState {
    selection: Option<Vec<String>>,
    playback_range: Option<(f64, f64)>,
}

/// One invocation of `cameraLaunch`.
#[derive(Debug)]
pub struct CameraLaunchCommand {
    config: LaunchConfig,
    state: CommandState,
    params: Option<LaunchParameters>,
    key_mode: KeyMode,
    update_playback_range: bool,
    undo: UndoStore,
    prior: PriorState,
}

impl Default for CameraLaunchCommand {
    fn default() -> Self {
        Self::new(LaunchConfig::default())
    }
}

impl CameraLaunchCommand {
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            key_mode: config.key_mode,
            update_playback_range: config.update_playback_range,
            config,
            state: CommandState::Idle,
            params: None,
            undo: UndoStore::new(),
            prior: PriorState::default(),
        }
    }

    /// A command that skips flag parsing and is ready to execute.
    pub fn from_parameters(config: LaunchConfig, params: LaunchParameters) -> Self {
        let mut cmd = Self::new(config);
        cmd.params = Some(params);
        cmd.state = CommandState::Parsed;
        cmd
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn params(&self) -> Option<&LaunchParameters> {
        self.params.as_ref()
    }

    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    pub fn set_key_mode(&mut self, mode: KeyMode) {
        self.key_mode = mode;
    }

    pub fn set_update_playback_range(&mut self, on: bool) {
        self.update_playback_range = on;
    }

    pub fn is_undoable(&self) -> bool {
        true
    }

    /// Validate the flags and resolve the target camera.
    ///
    /// On failure the command stays `Idle` and nothing in the host changes.
    pub fn parse<H, I, S>(&mut self, host: &H, args: I) -> Result<()>
    where
        H: SceneHost + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.expect_state(CommandState::Idle, "parse")?;
        let args = LaunchArgs::parse(args)?;
        let camera = resolve_camera(host, args.camera.as_deref())?;
        let start_position = host.world_translation(&camera)?;

        let params = LaunchParameters::new(camera, start_position, args.resolved_velocity())
            .with_gravity(args.gravity.unwrap_or(self.config.default_gravity))
            .with_start_frame(args.start_frame.unwrap_or(0));
        check_start_frame(params.start_frame, &self.config)?;

        if args.bake {
            self.key_mode = KeyMode::Baked;
        }
        if args.playback_range {
            self.update_playback_range = true;
        }
        self.params = Some(params);
        self.state = CommandState::Parsed;
        Ok(())
    }

    /// Solve the launch and write it into the host.
    pub fn execute<H: LaunchHost + ?Sized>(&mut self, host: &mut H) -> Result<LaunchReport> {
        self.expect_state(CommandState::Parsed, "execute")?;
        let report = self.run(host)?;
        self.state = CommandState::Executed;
        log::info!(
            "{COMMAND_NAME}: keyed {} over frames {}..={} ({} keys)",
            report.camera,
            report.frames.start,
            report.frames.end,
            report.keys_written
        );
        Ok(report)
    }

    /// Re-run the launch after an undo with the same parameters.
    pub fn redo<H: LaunchHost + ?Sized>(&mut self, host: &mut H) -> Result<LaunchReport> {
        self.expect_state(CommandState::Undone, "redo")?;
        let report = self.run(host)?;
        self.state = CommandState::Executed;
        log::info!("{COMMAND_NAME}: redo on {}", report.camera);
        Ok(report)
    }

    /// Put back every touched channel, the selection and the playback range.
    pub fn undo<H: LaunchHost + ?Sized>(&mut self, host: &mut H) -> Result<()> {
        self.expect_state(CommandState::Executed, "undo")?;
        let restored = self.undo.restore(host)?;
        if let Some(selection) = self.prior.selection.take() {
            host.set_active_selection(&selection)?;
        }
        if let Some((min, max)) = self.prior.playback_range.take() {
            host.set_playback_range(min, max)?;
        }
        host.refresh_viewport();
        self.state = CommandState::Undone;
        log::info!("{COMMAND_NAME}: undo restored {restored} channel(s)");
        Ok(())
    }

    /// Drop the snapshot. Valid from any state.
    pub fn dispose(&mut self) {
        self.undo.discard();
        self.prior = PriorState::default();
        self.state = CommandState::Disposed;
    }

    fn expect_state(&self, expected: CommandState, requested: &str) -> Result<()> {
        if self.state != expected {
            return Err(LaunchError::InvalidState {
                current: self.state.to_string(),
                requested: requested.to_string(),
            });
        }
        Ok(())
    }

    fn run<H: LaunchHost + ?Sized>(&mut self, host: &mut H) -> Result<LaunchReport> {
        let params = self.params.clone().ok_or_else(|| LaunchError::InvalidState {
            current: self.state.to_string(),
            requested: "execute without parameters".to_string(),
        })?;

        check_start_frame(params.start_frame, &self.config)?;

        let trajectory = Trajectory::solve(&params, host.time_unit(), &self.config);
        let plans = match self.key_mode {
            KeyMode::Analytic => {
                trajectory.channel_plans(&params.camera, self.config.tangent_weight)
            }
            KeyMode::Baked => {
                check_bake_span(&trajectory, &self.config)?;
                bake_channel_plans(&trajectory, &params.camera)
            }
        };
        let channels: Vec<ChannelId> = plans.iter().map(|p| p.channel.clone()).collect();

        self.undo.capture(&*host, &channels)?;
        let prior_selection = host.active_selection();
        let prior_range = if self.update_playback_range {
            host.playback_range()
        } else {
            None
        };

        let keys_written = match apply(
            host,
            &params.camera,
            &plans,
            trajectory.frames,
            self.update_playback_range,
        ) {
            Ok(n) => n,
            Err(err) => {
                self.roll_back(host, &prior_selection, prior_range, &err);
                return Err(err);
            }
        };

        self.prior = PriorState {
            selection: Some(prior_selection),
            playback_range: prior_range,
        };
        host.refresh_viewport();

        Ok(LaunchReport {
            camera: params.camera,
            key_mode: self.key_mode,
            frames: trajectory.frames,
            fps: trajectory.scheduler.fps(),
            flight_seconds: trajectory.kinematics.flight_time(),
            channels,
            keys_written,
            tangents_fitted: trajectory.vertical_tangents.is_some(),
        })
    }

    fn roll_back<H: LaunchHost + ?Sized>(
        &mut self,
        host: &mut H,
        selection: &[String],
        range: Option<(f64, f64)>,
        cause: &LaunchError,
    ) {
        log::warn!("{COMMAND_NAME}: {cause}; rolling back");
        if let Err(err) = self.undo.restore(host) {
            log::warn!("{COMMAND_NAME}: rollback of channels failed: {err}");
        }
        self.undo.discard();
        if host.active_selection() != selection {
            if let Err(err) = host.set_active_selection(selection) {
                log::warn!("{COMMAND_NAME}: rollback of selection failed: {err}");
            }
        }
        if let Some((min, max)) = range {
            if let Err(err) = host.set_playback_range(min, max) {
                log::warn!("{COMMAND_NAME}: rollback of playback range failed: {err}");
            }
        }
        host.refresh_viewport();
    }
}

/// Explicit name, else the first camera in the active selection.
fn resolve_camera<H: SceneHost + ?Sized>(host: &H, name: Option<&str>) -> Result<String> {
    match name {
        Some(name) => match host.node_kind(name) {
            Some(NodeKind::Camera) => Ok(name.to_string()),
            Some(_) => Err(LaunchError::NotACamera {
                name: name.to_string(),
            }),
            None => Err(LaunchError::CameraNotFound {
                name: name.to_string(),
            }),
        },
        None => host
            .active_selection()
            .into_iter()
            .find(|n| host.node_kind(n) == Some(NodeKind::Camera))
            .ok_or(LaunchError::NoCamera),
    }
}

fn apply<H: LaunchHost + ?Sized>(
    host: &mut H,
    camera: &str,
    plans: &[ChannelPlan],
    frames: ControlFrames,
    fit_playback_range: bool,
) -> Result<usize> {
    let written = ChannelWriter::new(host).replace_all(plans)?;
    host.set_active_selection(&[camera.to_string()])?;
    if fit_playback_range {
        host.set_playback_range(frames.start as f64, frames.end as f64)?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{AnimationChannelStore, ChannelAttr};
    use crate::memory::MemoryHost;
    use crate::value::Vector3;

    fn scene() -> MemoryHost {
        let mut host = MemoryHost::new();
        host.add_node("cam", NodeKind::Camera, Vector3::new(0.0, 1.0, 0.0));
        host.add_node("box", NodeKind::Transform, Vector3::ZERO);
        host
    }

    #[test]
    fn wrong_state_is_rejected_without_side_effects() {
        let mut host = scene();
        let mut cmd = CameraLaunchCommand::default();
        assert!(matches!(
            cmd.execute(&mut host),
            Err(LaunchError::InvalidState { .. })
        ));
        assert!(matches!(cmd.undo(&mut host), Err(LaunchError::InvalidState { .. })));
        assert!(matches!(cmd.redo(&mut host), Err(LaunchError::InvalidState { .. })));
        assert_eq!(cmd.state(), CommandState::Idle);
        assert_eq!(host.curve_count(), 0);
    }

    #[test]
    fn camera_resolution() {
        let mut host = scene();
        let mut cmd = CameraLaunchCommand::default();
        assert!(matches!(
            cmd.parse(&host, ["-c", "box"]),
            Err(LaunchError::NotACamera { .. })
        ));
        assert!(matches!(
            cmd.parse(&host, ["-c", "ghost"]),
            Err(LaunchError::CameraNotFound { .. })
        ));
        assert!(matches!(
            cmd.parse(&host, Vec::<&str>::new()),
            Err(LaunchError::NoCamera)
        ));
        assert_eq!(cmd.state(), CommandState::Idle);

        host.set_active_selection(&["box".into(), "cam".into()]).unwrap();
        cmd.parse(&host, ["-v", "0", "5", "0"]).unwrap();
        assert_eq!(cmd.state(), CommandState::Parsed);
        let params = cmd.params().unwrap();
        assert_eq!(params.camera, "cam");
        assert_eq!(params.start_position, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(params.gravity, -9.81);
    }

    #[test]
    fn execute_undo_redo_cycle() {
        let mut host = scene();
        let mut cmd = CameraLaunchCommand::default();
        cmd.parse(&host, ["-c", "cam", "-v", "1", "20", "0", "-g", "-10"]).unwrap();

        let report = cmd.execute(&mut host).unwrap();
        assert_eq!(cmd.state(), CommandState::Executed);
        assert_eq!(report.channels.len(), 5);
        assert_eq!(report.keys_written, 15);
        assert_eq!(host.active_selection(), vec!["cam".to_string()]);
        assert!(host.refresh_count() >= 1);

        cmd.undo(&mut host).unwrap();
        assert_eq!(cmd.state(), CommandState::Undone);
        assert_eq!(host.curve_count(), 0);
        assert!(host.active_selection().is_empty());

        let again = cmd.redo(&mut host).unwrap();
        assert_eq!(again, report);
        assert_eq!(
            host.num_keys(&ChannelId::new("cam", ChannelAttr::RotateY)),
            3
        );
    }

    #[test]
    fn dispose_from_any_state() {
        let mut host = scene();
        let mut cmd = CameraLaunchCommand::default();
        cmd.parse(&host, ["-c", "cam"]).unwrap();
        cmd.execute(&mut host).unwrap();
        cmd.dispose();
        assert_eq!(cmd.state(), CommandState::Disposed);
        assert!(matches!(cmd.undo(&mut host), Err(LaunchError::InvalidState { .. })));
        // disposing never touches the host
        assert_eq!(host.curve_count(), 5);
    }

    #[test]
    fn last_representable_start_frame_is_rejected() {
        let mut host = scene();
        let mut cmd = CameraLaunchCommand::default();
        let err = cmd
            .parse(&host, ["-c", "cam", "-s", "9223372036854775807"])
            .unwrap_err();
        assert!(matches!(err, LaunchError::InvalidFlagValue { .. }));
        assert_eq!(cmd.state(), CommandState::Idle);

        // parameters built without flags are checked at execute
        let params = LaunchParameters::new("cam", Vector3::ZERO, Vector3::new(0.0, 5.0, 0.0))
            .with_start_frame(i64::MAX);
        let mut cmd = CameraLaunchCommand::from_parameters(LaunchConfig::default(), params);
        assert!(matches!(
            cmd.execute(&mut host),
            Err(LaunchError::InvalidFlagValue { .. })
        ));
        assert_eq!(cmd.state(), CommandState::Parsed);
        assert_eq!(host.curve_count(), 0);
    }

    #[test]
    fn enormous_velocity_lands_at_the_flight_cap() {
        let mut host = scene();
        let mut cmd = CameraLaunchCommand::default();
        cmd.parse(&host, ["-c", "cam", "-v", "0", "1e300", "0", "-s", "1"])
            .unwrap();
        let report = cmd.execute(&mut host).unwrap();
        let cap = LaunchConfig::default().max_flight_frames;
        assert_eq!(report.frames.start, 1);
        assert_eq!(report.frames.end, 1 + cap);
        assert_eq!(report.frames.middle, report.frames.end);
        cmd.undo(&mut host).unwrap();
        assert_eq!(host.curve_count(), 0);
    }

    #[test]
    fn long_bake_fails_before_touching_the_host() {
        let mut host = scene();
        host.set_active_selection(&["box".into()]).unwrap();
        let mut cmd = CameraLaunchCommand::default();
        cmd.parse(&host, ["-c", "cam", "-v", "0", "1000", "0", "-g", "-0.01", "-b"])
            .unwrap();
        let err = cmd.execute(&mut host).unwrap_err();
        assert!(matches!(err, LaunchError::BakeTooLong { limit: 10_000, .. }));
        assert!(err.is_recoverable());
        assert_eq!(cmd.state(), CommandState::Parsed);
        assert_eq!(host.curve_count(), 0);
        assert_eq!(host.active_selection(), vec!["box".to_string()]);

        // the same launch keys fine in analytic mode
        cmd.set_key_mode(KeyMode::Analytic);
        cmd.execute(&mut host).unwrap();
        assert_eq!(cmd.state(), CommandState::Executed);
    }

    #[test]
    fn setters_override_config_before_execute() {
        let mut host = scene();
        host.set_playback_range(0.0, 10.0).unwrap();
        let params = LaunchParameters::new("cam", Vector3::ZERO, Vector3::new(0.0, 5.0, 0.0))
            .with_start_frame(3);
        let mut cmd = CameraLaunchCommand::from_parameters(LaunchConfig::default(), params);
        cmd.set_key_mode(KeyMode::Baked);
        cmd.set_update_playback_range(true);

        let report = cmd.execute(&mut host).unwrap();
        assert_eq!(report.key_mode, KeyMode::Baked);
        assert_eq!(report.keys_written as i64, report.frames.span() * 5);
        assert_eq!(
            host.playback_range(),
            Some((3.0, report.frames.end as f64))
        );
        cmd.undo(&mut host).unwrap();
        assert_eq!(host.playback_range(), Some((0.0, 10.0)));
    }

    #[test]
    fn report_serializes() {
        let mut host = scene();
        let mut cmd = CameraLaunchCommand::default();
        cmd.parse(&host, ["-c", "cam", "-v", "0", "10", "0", "-b"]).unwrap();
        let report = cmd.execute(&mut host).unwrap();
        let json = report.to_json();
        assert_eq!(json["camera"], "cam");
        assert_eq!(json["key_mode"], "baked");
        assert_eq!(json["keys_written"].as_u64(), Some(report.keys_written as u64));
    }
}
