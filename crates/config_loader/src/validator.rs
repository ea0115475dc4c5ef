//! Config validation
//!
//! Rules:
//! - engine option ranges (declared on `EngineConfig`)
//! - window_size <= buffer_capacity
//! - min_samples_for_classification <= window_size
//! - sink names non-empty and unique
//! - sink queue_capacity > 0
//! - file sinks carry a `path` param

use std::collections::HashSet;

use contracts::{ContractError, EngineConfig, MonitorConfig, SinkType};
use validator::Validate;

/// Validate a MonitorConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &MonitorConfig) -> Result<(), ContractError> {
    validate_engine(&config.engine)?;
    validate_sinks(config)?;
    Ok(())
}

/// Validate engine options
pub fn validate_engine(engine: &EngineConfig) -> Result<(), ContractError> {
    validate_engine_ranges(engine)?;
    validate_engine_capacity(engine)?;
    Ok(())
}

fn validate_engine_ranges(engine: &EngineConfig) -> Result<(), ContractError> {
    let Err(errors) = engine.validate() else {
        return Ok(());
    };

    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().cloned().collect();
    fields.sort();

    let field = fields
        .first()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "engine".to_string());
    let message = field_errors
        .get(field.as_str())
        .and_then(|errs| errs.first())
        .map(|e| format!("value out of range ({})", e.code))
        .unwrap_or_else(|| errors.to_string());

    Err(ContractError::config_validation(
        format!("engine.{field}"),
        message,
    ))
}

fn validate_engine_capacity(engine: &EngineConfig) -> Result<(), ContractError> {
    if engine.window_size > engine.buffer_capacity {
        return Err(ContractError::config_validation(
            "engine.window_size / engine.buffer_capacity",
            format!(
                "window_size ({}) must be <= buffer_capacity ({})",
                engine.window_size, engine.buffer_capacity
            ),
        ));
    }

    // the scorer only ever sees one window of samples
    if engine.min_samples_for_classification > engine.window_size {
        return Err(ContractError::config_validation(
            "engine.min_samples_for_classification",
            format!(
                "min_samples_for_classification ({}) can never be reached with window_size ({})",
                engine.min_samples_for_classification, engine.window_size
            ),
        ));
    }

    Ok(())
}

/// Validate sink configs
fn validate_sinks(config: &MonitorConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::File && !sink.params.contains_key("path") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.path", sink.name),
                "file sink requires a 'path' param",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ConfigVersion, ObservabilitySettings, SinkConfig};
    use std::collections::HashMap;

    fn minimal_config() -> MonitorConfig {
        MonitorConfig {
            version: ConfigVersion::V1,
            engine: EngineConfig::default(),
            sinks: vec![SinkConfig {
                name: "log".into(),
                sink_type: SinkType::Log,
                queue_capacity: 100,
                params: Default::default(),
            }],
            observability: ObservabilitySettings::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = minimal_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_tick_interval() {
        let mut config = minimal_config();
        config.engine.tick_interval_ms = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("engine.tick_interval_ms"), "got: {err}");
    }

    #[test]
    fn test_confidence_floor_out_of_range() {
        let mut config = minimal_config();
        config.engine.confidence_floor = -0.1;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("confidence_floor"), "got: {err}");
    }

    #[test]
    fn test_window_larger_than_buffer() {
        let mut config = minimal_config();
        config.engine.window_size = 80;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("must be <= buffer_capacity"), "got: {err}");
    }

    #[test]
    fn test_unreachable_min_samples() {
        let mut config = minimal_config();
        config.engine.buffer_capacity = 20;
        config.engine.min_samples_for_classification = 25;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("can never be reached"), "got: {err}");
    }

    #[test]
    fn test_window_smaller_than_min_samples() {
        let mut config = minimal_config();
        config.engine.window_size = 5;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("engine.min_samples_for_classification"), "got: {err}");
        assert!(err.contains("window_size (5)"), "got: {err}");

        config.engine.min_samples_for_classification = 5;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_duplicate_sink_name() {
        let mut config = minimal_config();
        config.sinks.push(config.sinks[0].clone());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate sink name"), "got: {err}");
    }

    #[test]
    fn test_empty_sink_name() {
        let mut config = minimal_config();
        config.sinks[0].name = String::new();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_file_sink_requires_path() {
        let mut config = minimal_config();
        config.sinks.push(SinkConfig {
            name: "history".into(),
            sink_type: SinkType::File,
            queue_capacity: 10,
            params: HashMap::new(),
        });
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("requires a 'path' param"), "got: {err}");
    }
}
