//! Command syntax and flag parsing.
//!
//! Flags use the host convention of a single dash for both the short and the
//! long form (`-v 1 2 3` or `-velocity 1 2 3`). Each flag takes a fixed number
//! of values and may appear at most once. Values are positional, so negative
//! numbers need no quoting.

use serde::{Deserialize, Serialize};

use crate::error::LaunchError;
use crate::params::velocity_from_speed_and_angle;
use crate::value::Vector3;

/// Elevation used with `-speed` when `-angle` is absent.
pub const DEFAULT_ELEVATION_DEG: f64 = 45.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    String,
    Double,
    Int,
    /// Presence-only switch.
    Bool,
}

/// One entry of the command syntax.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct FlagSpec {
    pub short: &'static str,
    pub long: &'static str,
    pub kind: ArgKind,
    /// Number of values following the flag.
    pub arity: usize,
}

impl FlagSpec {
    const fn new(short: &'static str, long: &'static str, kind: ArgKind, arity: usize) -> Self {
        Self {
            short,
            long,
            kind,
            arity,
        }
    }

    fn matches(&self, token: &str) -> bool {
        token == self.short || token == self.long
    }
}

const CAMERA: FlagSpec = FlagSpec::new("-c", "-camera", ArgKind::String, 1);
const VELOCITY: FlagSpec = FlagSpec::new("-v", "-velocity", ArgKind::Double, 3);
const GRAVITY: FlagSpec = FlagSpec::new("-g", "-gravity", ArgKind::Double, 1);
const START_FRAME: FlagSpec = FlagSpec::new("-s", "-startFrame", ArgKind::Int, 1);
const SPEED: FlagSpec = FlagSpec::new("-sp", "-speed", ArgKind::Double, 1);
const ANGLE: FlagSpec = FlagSpec::new("-a", "-angle", ArgKind::Double, 1);
const HEADING: FlagSpec = FlagSpec::new("-hd", "-heading", ArgKind::Double, 1);
const BAKE: FlagSpec = FlagSpec::new("-b", "-bake", ArgKind::Bool, 0);
const PLAYBACK_RANGE: FlagSpec = FlagSpec::new("-pr", "-playbackRange", ArgKind::Bool, 0);

const SYNTAX: [FlagSpec; 9] = [
    CAMERA,
    VELOCITY,
    GRAVITY,
    START_FRAME,
    SPEED,
    ANGLE,
    HEADING,
    BAKE,
    PLAYBACK_RANGE,
];

/// Every flag the command accepts.
pub fn syntax() -> &'static [FlagSpec] {
    &SYNTAX
}

/// Raw parsed flags; absent flags are `None`/`false`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchArgs {
    pub camera: Option<String>,
    pub velocity: Option<Vector3>,
    pub gravity: Option<f64>,
    pub start_frame: Option<i64>,
    pub speed: Option<f64>,
    pub angle: Option<f64>,
    pub heading: Option<f64>,
    pub bake: bool,
    pub playback_range: bool,
}

impl LaunchArgs {
    pub fn parse<I, S>(args: I) -> Result<Self, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<S> = args.into_iter().collect();
        let mut out = LaunchArgs::default();
        let mut seen: Vec<&'static str> = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i].as_ref();
            let spec = SYNTAX
                .iter()
                .find(|s| s.matches(token))
                .ok_or_else(|| LaunchError::UnknownFlag {
                    flag: token.to_string(),
                })?;
            if seen.contains(&spec.long) {
                return Err(LaunchError::DuplicateFlag {
                    flag: spec.long.to_string(),
                });
            }
            seen.push(spec.long);

            let values: Vec<&str> = tokens
                .iter()
                .skip(i + 1)
                .take(spec.arity)
                .map(|t| t.as_ref())
                .collect();
            if values.len() < spec.arity {
                return Err(LaunchError::MissingFlagValue {
                    flag: spec.long.to_string(),
                    expected: spec.arity,
                });
            }
            out.apply(spec, &values)?;
            i += 1 + spec.arity;
        }

        if out.velocity.is_some() && out.speed.is_some() {
            return Err(LaunchError::ConflictingFlags {
                first: VELOCITY.long.to_string(),
                second: SPEED.long.to_string(),
            });
        }
        if out.speed.is_none() {
            if let Some(flag) = [(ANGLE, out.angle), (HEADING, out.heading)]
                .iter()
                .find_map(|(spec, v)| v.map(|_| spec.long))
            {
                return Err(LaunchError::ConflictingFlags {
                    first: flag.to_string(),
                    second: format!("missing {}", SPEED.long),
                });
            }
        }
        Ok(out)
    }

    fn apply(&mut self, spec: &FlagSpec, values: &[&str]) -> Result<(), LaunchError> {
        match spec.long {
            "-camera" => {
                let name = values[0].trim();
                if name.is_empty() {
                    return Err(LaunchError::invalid_value(spec.long, "empty camera name"));
                }
                self.camera = Some(name.to_string());
            }
            "-velocity" => {
                let x = parse_double(spec, values[0])?;
                let y = parse_double(spec, values[1])?;
                let z = parse_double(spec, values[2])?;
                self.velocity = Some(Vector3::new(x, y, z));
            }
            "-gravity" => self.gravity = Some(parse_double(spec, values[0])?),
            "-startFrame" => self.start_frame = Some(parse_int(spec, values[0])?),
            "-speed" => {
                let speed = parse_double(spec, values[0])?;
                if speed < 0.0 {
                    return Err(LaunchError::invalid_value(spec.long, "speed cannot be negative"));
                }
                self.speed = Some(speed);
            }
            "-angle" => self.angle = Some(parse_double(spec, values[0])?),
            "-heading" => self.heading = Some(parse_double(spec, values[0])?),
            "-bake" => self.bake = true,
            "-playbackRange" => self.playback_range = true,
            other => {
                return Err(LaunchError::UnknownFlag {
                    flag: other.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Launch velocity: `-velocity`, else derived from `-speed`/`-angle`/`-heading`,
    /// else zero.
    pub fn resolved_velocity(&self) -> Vector3 {
        match (self.velocity, self.speed) {
            (Some(v), _) => v,
            (None, Some(speed)) => velocity_from_speed_and_angle(
                speed,
                self.angle.unwrap_or(DEFAULT_ELEVATION_DEG),
                self.heading.unwrap_or(0.0),
            ),
            (None, None) => Vector3::ZERO,
        }
    }
}

fn parse_double(spec: &FlagSpec, raw: &str) -> Result<f64, LaunchError> {
    let v: f64 = raw
        .trim()
        .parse()
        .map_err(|_| LaunchError::invalid_value(spec.long, format!("'{raw}' is not a number")))?;
    if !v.is_finite() {
        return Err(LaunchError::invalid_value(
            spec.long,
            format!("'{raw}' is not finite"),
        ));
    }
    Ok(v)
}

/// Integers, or doubles with no fractional part (hosts often pass `12.0`).
fn parse_int(spec: &FlagSpec, raw: &str) -> Result<i64, LaunchError> {
    if let Ok(v) = raw.trim().parse::<i64>() {
        return Ok(v);
    }
    let v = parse_double(spec, raw)?;
    if v.fract() != 0.0 || v.abs() > i64::MAX as f64 {
        return Err(LaunchError::invalid_value(
            spec.long,
            format!("'{raw}' is not a whole frame"),
        ));
    }
    Ok(v as i64)
}
