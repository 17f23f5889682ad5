use crate::core::align::{AlignmentError, AlignmentScores};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid scores for the {stage} stage: {source}")]
    InvalidScores {
        stage: &'static str,
        source: AlignmentError,
    },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Scores for the first alignment, full sequence against full sequence.
pub const SEQUENCE_SCORES: AlignmentScores = AlignmentScores::new(2.0, 1.0, -0.5, -0.1);
/// Scores for projecting a representative sequence onto the aligned frame.
pub const PROJECTION_SCORES: AlignmentScores = AlignmentScores::new(2.0, 1.0, -0.5, -0.2);
/// Scores for the final alignment of the two projected representative sequences.
pub const REPRESENTATIVE_SCORES: AlignmentScores = AlignmentScores::new(2.0, 1.0, -1.0, -0.5);

/// Parameters of a single matching run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    pub sequence: AlignmentScores,
    pub projection: AlignmentScores,
    pub representative: AlignmentScores,
    /// Copy reference contacts missing from the map in as false negatives.
    pub add_false_negatives: bool,
    /// Drop contacts still unknown once classification is done.
    pub remove_unmatched: bool,
    /// Rewrite primary numbering and chains into the reference's numbering.
    pub renumber: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            sequence: SEQUENCE_SCORES,
            projection: PROJECTION_SCORES,
            representative: REPRESENTATIVE_SCORES,
            add_false_negatives: false,
            remove_unmatched: false,
            renumber: false,
        }
    }
}

impl MatchConfig {
    /// Loads a configuration from a TOML file. Omitted keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config: MatchConfig = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (stage, scores) in self.stages() {
            scores
                .validate()
                .map_err(|source| ConfigError::InvalidScores { stage, source })?;
        }
        Ok(())
    }

    pub(crate) fn stages(&self) -> [(&'static str, &AlignmentScores); 3] {
        [
            ("sequence", &self.sequence),
            ("projection", &self.projection),
            ("representative", &self.representative),
        ]
    }
}

#[derive(Default)]
pub struct MatchConfigBuilder {
    sequence: Option<AlignmentScores>,
    projection: Option<AlignmentScores>,
    representative: Option<AlignmentScores>,
    add_false_negatives: Option<bool>,
    remove_unmatched: Option<bool>,
    renumber: Option<bool>,
}

impl MatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence_scores(mut self, scores: AlignmentScores) -> Self {
        self.sequence = Some(scores);
        self
    }
    pub fn projection_scores(mut self, scores: AlignmentScores) -> Self {
        self.projection = Some(scores);
        self
    }
    pub fn representative_scores(mut self, scores: AlignmentScores) -> Self {
        self.representative = Some(scores);
        self
    }
    pub fn add_false_negatives(mut self, enabled: bool) -> Self {
        self.add_false_negatives = Some(enabled);
        self
    }
    pub fn remove_unmatched(mut self, enabled: bool) -> Self {
        self.remove_unmatched = Some(enabled);
        self
    }
    pub fn renumber(mut self, enabled: bool) -> Self {
        self.renumber = Some(enabled);
        self
    }

    pub fn build(self) -> Result<MatchConfig, ConfigError> {
        let defaults = MatchConfig::default();
        let config = MatchConfig {
            sequence: self.sequence.unwrap_or(defaults.sequence),
            projection: self.projection.unwrap_or(defaults.projection),
            representative: self.representative.unwrap_or(defaults.representative),
            add_false_negatives: self
                .add_false_negatives
                .unwrap_or(defaults.add_false_negatives),
            remove_unmatched: self.remove_unmatched.unwrap_or(defaults.remove_unmatched),
            renumber: self.renumber.unwrap_or(defaults.renumber),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    mod builder {
        use super::*;

        #[test]
        fn build_without_setters_yields_defaults() {
            let config = MatchConfigBuilder::new().build().unwrap();
            assert_eq!(config, MatchConfig::default());
            assert_eq!(config.sequence, SEQUENCE_SCORES);
            assert_eq!(config.projection.gap_extend, -0.2);
            assert_eq!(config.representative.gap_open, -1.0);
            assert!(!config.add_false_negatives);
            assert!(!config.remove_unmatched);
            assert!(!config.renumber);
        }

        #[test]
        fn build_applies_every_setter() {
            let scores = AlignmentScores::new(5.0, -4.0, -10.0, -0.5);
            let config = MatchConfigBuilder::new()
                .sequence_scores(scores)
                .projection_scores(scores)
                .representative_scores(scores)
                .add_false_negatives(true)
                .remove_unmatched(true)
                .renumber(true)
                .build()
                .unwrap();
            assert_eq!(config.sequence, scores);
            assert_eq!(config.projection, scores);
            assert_eq!(config.representative, scores);
            assert!(config.add_false_negatives && config.remove_unmatched && config.renumber);
        }

        #[test]
        fn build_rejects_positive_gap_penalty() {
            let err = MatchConfigBuilder::new()
                .projection_scores(AlignmentScores::new(2.0, -1.0, 0.5, -0.1))
                .build()
                .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidScores {
                    stage: "projection",
                    ..
                }
            ));
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn load_fills_omitted_keys_with_defaults() {
            let file = write_config(
                r#"
renumber = true

[representative]
match_score = 3.0
mismatch_score = -2.0
gap_open = -2.0
gap_extend = -1.0
"#,
            );
            let config = MatchConfig::load(file.path()).unwrap();
            assert!(config.renumber);
            assert!(!config.add_false_negatives);
            assert_eq!(config.sequence, SEQUENCE_SCORES);
            assert_eq!(
                config.representative,
                AlignmentScores::new(3.0, -2.0, -2.0, -1.0)
            );
        }

        #[test]
        fn load_rejects_unknown_keys() {
            let file = write_config("inplace = true\n");
            assert!(matches!(
                MatchConfig::load(file.path()),
                Err(ConfigError::Toml { .. })
            ));
        }

        #[test]
        fn load_reports_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("absent.toml");
            match MatchConfig::load(&path) {
                Err(ConfigError::Io { path: reported, .. }) => {
                    assert!(reported.ends_with("absent.toml"))
                }
                other => panic!("expected I/O error, got {other:?}"),
            }
        }

        #[test]
        fn load_validates_scores() {
            let file = write_config(
                r#"
[sequence]
match_score = 2.0
mismatch_score = -1.0
gap_open = -0.1
gap_extend = -0.5
"#,
            );
            assert!(matches!(
                MatchConfig::load(file.path()),
                Err(ConfigError::InvalidScores {
                    stage: "sequence",
                    ..
                })
            ));
        }
    }
}
