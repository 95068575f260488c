//! Typed configuration surface (spec.md §6, SPEC_FULL.md §3 "Ambient
//! addition — typed configuration"). The core never parses a config
//! file; it consumes an already-built, validated `FeedConfig`.

use crate::error::ConfigError;

/// `partial_publish` mode (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialPublish {
    /// Full image on every message.
    All,
    /// Curated value-added subset (spec.md §4.4 "Update-flags").
    ValueAdded,
}

/// Multicast join parameters for one physical line (one side of one FT
/// line), spec.md §6 `a_lines[i]`/`b_lines[i]`.
#[derive(Debug, Clone)]
pub struct LineEndpoint {
    pub enable: bool,
    pub address: String,
    pub port: u16,
    pub interface: String,
}

/// The A/B pair for one FT line.
#[derive(Debug, Clone)]
pub struct LineEndpoints {
    pub a: LineEndpoint,
    pub b: LineEndpoint,
}

/// One configured stanza of the topic-rendering template (spec.md §6
/// "Topic format").
#[derive(Debug, Clone)]
pub struct TopicFormat {
    pub stanza_delim: char,
    pub stanzas: Vec<String>,
}

impl TopicFormat {
    const VALID_VARIABLES: &'static [char] = &['S', 'Y', 'M', 'D', 'C', 'I', 'F', 'X'];

    /// Validates that every `$`-variable referenced in every stanza is a
    /// recognized topic variable (spec.md §6).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for stanza in &self.stanzas {
            let mut chars = stanza.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '$' {
                    match chars.next() {
                        Some(v) if Self::VALID_VARIABLES.contains(&v) => {}
                        Some(v) => return Err(ConfigError::InvalidTopicVariable { variable: v }),
                        None => return Err(ConfigError::InvalidTopicVariable { variable: '$' }),
                    }
                }
            }
        }
        Ok(())
    }
}

/// Per-process CPU pinning and FT-line range assignment (spec.md §6
/// `processes[i]`).
#[derive(Debug, Clone)]
pub struct ProcessAssignment {
    pub cpu: Option<usize>,
    pub line_from: u16,
    pub line_to: u16,
}

/// The immutable, validated configuration the core is constructed from.
/// `wrap_limit_high`/`wrap_limit_low` are accepted for
/// forward-compatible deserialization by the embedding binary but are
/// not modeled here: spec.md's Open Questions resolve them as vestigial
/// in v2, subsumed by `seq_jump_threshold`.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub table_size: usize,
    pub seq_jump_threshold: u64,
    pub jitter_stats: bool,
    pub partial_publish: PartialPublish,
    pub line_status_enable: bool,
    pub line_status_period_secs: u64,
    pub periodic_stats: bool,
    pub periodic_stats_interval_secs: u64,
    pub topic_fmt: TopicFormat,
    pub lines: Vec<LineEndpoints>,
    pub processes: Vec<ProcessAssignment>,
}

impl FeedConfig {
    /// Validates cross-field invariants spec.md §6/§7 require hold
    /// before the ingest loop may start: nonzero table size, symmetric
    /// A/B enablement per line, a well-formed topic format, and
    /// non-overlapping process FT-line ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::ZeroTableSize);
        }
        for (i, pair) in self.lines.iter().enumerate() {
            if pair.a.enable != pair.b.enable {
                return Err(ConfigError::AsymmetricLineEnablement { ftline: i as u16 });
            }
        }
        self.topic_fmt.validate()?;

        for i in 0..self.processes.len() {
            for j in (i + 1)..self.processes.len() {
                let a = &self.processes[i];
                let b = &self.processes[j];
                if a.line_from <= b.line_to && b.line_from <= a.line_to {
                    return Err(ConfigError::OverlappingProcessLines {
                        line: a.line_from.max(b.line_from),
                        process_a: i,
                        process_b: j,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn num_lines(&self) -> u16 {
        self.lines.len() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(enable: bool) -> LineEndpoint {
        LineEndpoint {
            enable,
            address: "224.0.1.1".to_string(),
            port: 12345,
            interface: "eth0".to_string(),
        }
    }

    fn minimal_config() -> FeedConfig {
        FeedConfig {
            table_size: 1024,
            seq_jump_threshold: 100_000,
            jitter_stats: false,
            partial_publish: PartialPublish::ValueAdded,
            line_status_enable: false,
            line_status_period_secs: 30,
            periodic_stats: false,
            periodic_stats_interval_secs: 60,
            topic_fmt: TopicFormat {
                stanza_delim: '.',
                stanzas: vec!["OPRA.$S".to_string()],
            },
            lines: vec![LineEndpoints { a: endpoint(true), b: endpoint(true) }],
            processes: vec![ProcessAssignment { cpu: Some(0), line_from: 0, line_to: 0 }],
        }
    }

    #[test]
    fn minimal_config_validates() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn zero_table_size_rejected() {
        let mut c = minimal_config();
        c.table_size = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ZeroTableSize)));
    }

    #[test]
    fn asymmetric_line_enablement_rejected() {
        let mut c = minimal_config();
        c.lines[0].b.enable = false;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::AsymmetricLineEnablement { ftline: 0 })
        ));
    }

    #[test]
    fn invalid_topic_variable_rejected() {
        let mut c = minimal_config();
        c.topic_fmt.stanzas = vec!["OPRA.$Z".to_string()];
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidTopicVariable { variable: 'Z' })
        ));
    }

    #[test]
    fn overlapping_process_lines_rejected() {
        let mut c = minimal_config();
        c.processes.push(ProcessAssignment { cpu: Some(1), line_from: 0, line_to: 2 });
        assert!(matches!(
            c.validate(),
            Err(ConfigError::OverlappingProcessLines { .. })
        ));
    }
}
