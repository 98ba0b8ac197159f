use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::error::ModelError;

/// Environment variable that overrides the log level.
pub const LOG_LEVEL_ENV_VAR: &str = "GENMODELS_LOG";

/// Parse a log level given either by name (case-insensitive) or as an integer from 0 (off) to 5 (trace).
pub fn parse_level(value: &str) -> Result<LevelFilter, ModelError> {
    let value = value.trim();
    if let Ok(n) = value.parse::<u8>() {
        return match n {
            0 => Ok(LevelFilter::Off),
            1 => Ok(LevelFilter::Error),
            2 => Ok(LevelFilter::Warn),
            3 => Ok(LevelFilter::Info),
            4 => Ok(LevelFilter::Debug),
            5 => Ok(LevelFilter::Trace),
            _ => Err(ModelError::InvalidLogLevel(value.to_string())),
        };
    }
    value
        .parse::<LevelFilter>()
        .map_err(|_| ModelError::InvalidLogLevel(value.to_string()))
}

/// Log level from [LOG_LEVEL_ENV_VAR], falling back to `default` when it is unset.
pub fn level_from_env(default: LevelFilter) -> Result<LevelFilter, ModelError> {
    match std::env::var(LOG_LEVEL_ENV_VAR) {
        Ok(value) => parse_level(&value),
        Err(_) => Ok(default),
    }
}

/// Install a terminal logger at the level given by the environment (default `Warn`).
pub fn init() -> Result<(), ModelError> {
    let level = level_from_env(LevelFilter::Warn)?;
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .map_err(|e| ModelError::Other(e.to_string()))?;
    log::info!("logging started at level {level}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_levels() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("warn").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_level(" off ").unwrap(), LevelFilter::Off);
    }

    #[test]
    fn test_parse_integer_levels() {
        assert_eq!(parse_level("0").unwrap(), LevelFilter::Off);
        assert_eq!(parse_level("5").unwrap(), LevelFilter::Trace);
        assert!(matches!(
            parse_level("6"),
            Err(ModelError::InvalidLogLevel(_))
        ));
    }

    // the only test that touches the variable, so it cannot race with others
    #[test]
    fn test_level_from_env() {
        std::env::remove_var(LOG_LEVEL_ENV_VAR);
        assert_eq!(
            level_from_env(LevelFilter::Warn).unwrap(),
            LevelFilter::Warn
        );

        std::env::set_var(LOG_LEVEL_ENV_VAR, "debug");
        assert_eq!(
            level_from_env(LevelFilter::Warn).unwrap(),
            LevelFilter::Debug
        );

        std::env::set_var(LOG_LEVEL_ENV_VAR, "1");
        assert_eq!(
            level_from_env(LevelFilter::Warn).unwrap(),
            LevelFilter::Error
        );

        std::env::set_var(LOG_LEVEL_ENV_VAR, "loud");
        let result = level_from_env(LevelFilter::Warn);
        let init_result = init();
        std::env::remove_var(LOG_LEVEL_ENV_VAR);
        assert!(matches!(result, Err(ModelError::InvalidLogLevel(v)) if v == "loud"));
        assert!(matches!(init_result, Err(ModelError::InvalidLogLevel(_))));

        // a second logger cannot be installed
        init().unwrap();
        assert!(matches!(init(), Err(ModelError::Other(_))));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_level("CRITICAL").is_err());
        assert!(parse_level("").is_err());
    }
}
