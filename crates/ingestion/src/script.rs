//! Motion scripts: a timed sequence of profiles.
//!
//! Text form is a comma-separated list of `profile:seconds`, e.g.
//! `walking:20,running:20,idle:10`.

use std::str::FromStr;

use crate::error::{IngestionError, Result};
use crate::profile::MotionProfile;

/// One profile held for a duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSegment {
    pub profile: MotionProfile,
    pub duration_s: f64,
}

/// Ordered motion segments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionScript {
    segments: Vec<MotionSegment>,
}

impl MotionScript {
    pub fn new(segments: Vec<MotionSegment>) -> Self {
        Self { segments }
    }

    /// A single profile held for `duration_s`
    pub fn single(profile: MotionProfile, duration_s: f64) -> Self {
        Self::new(vec![MotionSegment {
            profile,
            duration_s,
        }])
    }

    /// Parse `profile:seconds[,profile:seconds...]`
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, duration) = part.split_once(':').ok_or_else(|| {
                IngestionError::invalid_script(text, format!("'{part}' is not profile:seconds"))
            })?;

            let profile = name
                .trim()
                .parse::<MotionProfile>()
                .map_err(|e| IngestionError::invalid_script(text, e))?;
            let duration_s = duration.trim().parse::<f64>().map_err(|_| {
                IngestionError::invalid_script(text, format!("bad duration '{duration}'"))
            })?;
            if !duration_s.is_finite() || duration_s <= 0.0 {
                return Err(IngestionError::invalid_script(
                    text,
                    format!("duration must be positive, got {duration_s}"),
                ));
            }

            segments.push(MotionSegment {
                profile,
                duration_s,
            });
        }

        if segments.is_empty() {
            return Err(IngestionError::invalid_script(text, "no segments"));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[MotionSegment] {
        &self.segments
    }

    pub fn total_duration_s(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_s).sum()
    }

    /// Profile active at `t_s` seconds from the start; None past the end
    pub fn profile_at(&self, t_s: f64) -> Option<MotionProfile> {
        let mut end = 0.0;
        for segment in &self.segments {
            end += segment.duration_s;
            if t_s < end {
                return Some(segment.profile);
            }
        }
        None
    }
}

impl FromStr for MotionScript {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for MotionScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", segment.profile, segment.duration_s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = MotionScript::parse("walking:20, running:7.5,idle:10").unwrap();
        assert_eq!(script.segments().len(), 3);
        assert_eq!(script.segments()[1].profile, MotionProfile::Running);
        assert_eq!(script.segments()[1].duration_s, 7.5);
        assert_eq!(script.total_duration_s(), 37.5);
    }

    #[test]
    fn test_profile_at() {
        let script: MotionScript = "walking:2,cycling:3".parse().unwrap();
        assert_eq!(script.profile_at(0.0), Some(MotionProfile::Walking));
        assert_eq!(script.profile_at(1.99), Some(MotionProfile::Walking));
        assert_eq!(script.profile_at(2.0), Some(MotionProfile::Cycling));
        assert_eq!(script.profile_at(5.0), None);
    }

    #[test]
    fn test_display_parses_back() {
        let script = MotionScript::parse("walking:20, running:7.5").unwrap();
        assert_eq!(script.to_string(), "walking:20,running:7.5");
        assert_eq!(script.to_string().parse::<MotionScript>().unwrap(), script);
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "walking", "walking:abc", "walking:-1", "swimming:5", "walking:0"] {
            let err = MotionScript::parse(bad);
            assert!(
                matches!(err, Err(IngestionError::InvalidScript { .. })),
                "{bad:?} should fail"
            );
        }
    }
}
