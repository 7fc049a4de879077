//! Configuration validation.
//!
//! Missing keys fall back to the defaults, so only present-but-bad values fail.

use crate::domain::error::BotError;
use crate::domain::execution::{DEFAULT_FEE_RATE, DEFAULT_RSI_ENTRY, DEFAULT_STOP_LOSS_PCT};
use crate::domain::indicator::{DEFAULT_BAND_WIDTH, DEFAULT_RSI_PERIOD, DEFAULT_SMA_PERIOD};
use crate::domain::position::DEFAULT_STARTING_CASH;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_ASSET: &str = "Bitcoin";
pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 60;
/// One day.
pub const MAX_POLL_INTERVAL_SECS: i64 = 86_400;
/// One year.
pub const MAX_LOOKBACK_MINUTES: i64 = 525_600;

pub fn validate_trader_config(config: &dyn ConfigPort) -> Result<(), BotError> {
    validate_asset(config)?;
    validate_starting_cash(config)?;
    validate_bounded_int(
        config,
        "trader",
        "poll_interval_secs",
        DEFAULT_POLL_INTERVAL_SECS,
        MAX_POLL_INTERVAL_SECS,
    )?;
    validate_bounded_int(
        config,
        "trader",
        "lookback_minutes",
        DEFAULT_LOOKBACK_MINUTES,
        MAX_LOOKBACK_MINUTES,
    )?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BotError> {
    validate_periods(config)?;
    validate_band_width(config)?;
    validate_rsi_entry(config)?;
    validate_stop_loss(config)?;
    validate_fee_rate(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> BotError {
    BotError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_asset(config: &dyn ConfigPort) -> Result<(), BotError> {
    match config.get_string("trader", "asset") {
        Some(s) if s.trim().is_empty() => Err(invalid("trader", "asset", "asset must not be empty")),
        _ => Ok(()),
    }
}

fn validate_starting_cash(config: &dyn ConfigPort) -> Result<(), BotError> {
    let value = config.get_double("trader", "starting_cash", DEFAULT_STARTING_CASH);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "trader",
            "starting_cash",
            "starting_cash must be positive",
        ));
    }
    Ok(())
}

fn validate_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), BotError> {
    if config.get_int(section, key, default) < 1 {
        return Err(invalid(section, key, &format!("{key} must be at least 1")));
    }
    Ok(())
}

fn validate_bounded_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    max: i64,
) -> Result<(), BotError> {
    validate_positive_int(config, section, key, default)?;
    if config.get_int(section, key, default) > max {
        return Err(invalid(section, key, &format!("{key} must be at most {max}")));
    }
    Ok(())
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), BotError> {
    let sma = config.get_int("indicators", "sma_period", DEFAULT_SMA_PERIOD as i64);
    if sma < 2 {
        return Err(invalid(
            "indicators",
            "sma_period",
            "sma_period must be at least 2",
        ));
    }
    validate_positive_int(config, "indicators", "rsi_period", DEFAULT_RSI_PERIOD as i64)
}

fn validate_band_width(config: &dyn ConfigPort) -> Result<(), BotError> {
    let value = config.get_double("indicators", "band_width", DEFAULT_BAND_WIDTH);
    if !(value >= 0.0 && value.is_finite()) {
        return Err(invalid(
            "indicators",
            "band_width",
            "band_width must be non-negative",
        ));
    }
    Ok(())
}

fn validate_rsi_entry(config: &dyn ConfigPort) -> Result<(), BotError> {
    let value = config.get_double("strategy", "rsi_entry", DEFAULT_RSI_ENTRY);
    if !(value > 0.0 && value <= 100.0) {
        return Err(invalid(
            "strategy",
            "rsi_entry",
            "rsi_entry must be in (0, 100]",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), BotError> {
    let value = config.get_double("strategy", "stop_loss_pct", DEFAULT_STOP_LOSS_PCT);
    if !(value > 0.0 && value < 100.0) {
        return Err(invalid(
            "strategy",
            "stop_loss_pct",
            "stop_loss_pct must be in (0, 100)",
        ));
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), BotError> {
    let value = config.get_double("strategy", "fee_rate", DEFAULT_FEE_RATE);
    if !(value >= 0.0 && value < 1.0) {
        return Err(invalid("strategy", "fee_rate", "fee_rate must be in [0, 1)"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        let config = make_config("[trader]\n");
        assert!(validate_trader_config(&config).is_ok());
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn valid_full_config_passes() {
        let config = make_config(
            r#"
[trader]
asset = Ethereum
starting_cash = 2500
poll_interval_secs = 30
lookback_minutes = 45

[indicators]
sma_period = 20
rsi_period = 14
band_width = 2.0

[strategy]
rsi_entry = 30
stop_loss_pct = 2.5
fee_rate = 0.002
"#,
        );
        assert!(validate_trader_config(&config).is_ok());
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn starting_cash_must_be_positive() {
        let config = make_config("[trader]\nstarting_cash = 0\n");
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "starting_cash"));
    }

    #[test]
    fn blank_asset_fails() {
        let config = make_config("[trader]\nasset =    \n");
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "asset"));
    }

    #[test]
    fn poll_interval_zero_fails() {
        let config = make_config("[trader]\npoll_interval_secs = 0\n");
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "poll_interval_secs"));
    }

    #[test]
    fn lookback_negative_fails() {
        let config = make_config("[trader]\nlookback_minutes = -5\n");
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "lookback_minutes"));
    }

    #[test]
    fn huge_lookback_fails() {
        let config = make_config("[trader]\nlookback_minutes = 9223372036854775807\n");
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "lookback_minutes"));

        let config = make_config("[trader]\nlookback_minutes = 525601\n");
        assert!(validate_trader_config(&config).is_err());

        let config = make_config("[trader]\nlookback_minutes = 525600\n");
        assert!(validate_trader_config(&config).is_ok());
    }

    #[test]
    fn poll_interval_over_a_day_fails() {
        let config = make_config("[trader]\npoll_interval_secs = 86401\n");
        let err = validate_trader_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "poll_interval_secs"));

        let config = make_config("[trader]\npoll_interval_secs = 18446744073709551\n");
        assert!(validate_trader_config(&config).is_err());
    }

    #[test]
    fn sma_period_below_two_fails() {
        let config = make_config("[indicators]\nsma_period = 1\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "sma_period"));
    }

    #[test]
    fn rsi_period_zero_fails() {
        let config = make_config("[indicators]\nrsi_period = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "rsi_period"));
    }

    #[test]
    fn negative_band_width_fails() {
        let config = make_config("[indicators]\nband_width = -1\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "band_width"));
    }

    #[test]
    fn rsi_entry_out_of_range_fails() {
        let config = make_config("[strategy]\nrsi_entry = 120\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "rsi_entry"));
    }

    #[test]
    fn stop_loss_zero_fails() {
        let config = make_config("[strategy]\nstop_loss_pct = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "stop_loss_pct"));
    }

    #[test]
    fn fee_rate_of_one_fails() {
        let config = make_config("[strategy]\nfee_rate = 1.0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, BotError::ConfigInvalid { key, .. } if key == "fee_rate"));
    }
}
