//! dashhaorch entry point.
//!
//! Loads a DASH HA configuration, applies it through DashHaOrch against the
//! in-memory SAI adapter and prints the resulting objects and state as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use sonic_dash_ha_orch::audit::{init_logging, init_logging_pretty, AuditCategory, AuditOutcome, AuditRecord};
use sonic_dash_ha_orch::runner::DEFAULT_SWITCH_ATTR_END;
use sonic_dash_ha_orch::{audit_log, run, DashHaConfigFile, RunOptions};
use sonic_sai_dash_ha::SwitchAttrExtensionRange;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable
    Pretty,
}

fn parse_attr_id(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    let id = parsed.map_err(|e| format!("invalid attribute id '{}': {}", s, e))?;
    if SwitchAttrExtensionRange::try_new(id).is_none() {
        return Err(format!(
            "attribute id '{}' leaves no room for the switch extension range",
            s
        ));
    }
    Ok(id)
}

/// SONiC DASH HA orchestration agent
#[derive(Parser, Debug)]
#[command(name = "dashhaorch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with ENIs, HA pairs and HA sessions
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    /// SAI_SWITCH_ATTR_END of the base SAI headers (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_attr_id, default_value_t = DEFAULT_SWITCH_ATTR_END)]
    switch_attr_end: u32,

    /// Include HA session counters in the output
    #[arg(long)]
    dump_counters: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match args.log_format {
        LogFormat::Json => init_logging(&args.log_level),
        LogFormat::Pretty => init_logging_pretty(&args.log_level),
    }

    info!("Starting dashhaorch, config {}", args.config.display());
    audit_log!(AuditRecord::new(AuditCategory::SystemLifecycle, "dashhaorch", "start")
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({
            "config": args.config.display().to_string(),
            "switch_attr_end": format!("0x{:x}", args.switch_attr_end),
        })));

    let config = match DashHaConfigFile::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            audit_log!(AuditRecord::new(AuditCategory::ConfigurationChange, "dashhaorch", "load_config")
                .with_object_id(args.config.display().to_string())
                .with_error(e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions {
        switch_attr_end: args.switch_attr_end,
        dump_counters: args.dump_counters,
    };
    let report = match run(&config, &options) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize report: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if report.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::try_parse_from([
            "dashhaorch",
            "--config",
            "/etc/sonic/dash_ha.json",
            "--switch-attr-end",
            "0x1000",
            "--log-format",
            "pretty",
            "--dump-counters",
        ])
        .unwrap();
        assert_eq!(args.switch_attr_end, 0x1000);
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert!(args.dump_counters);

        let args = Args::try_parse_from(["dashhaorch", "-c", "x.json"]).unwrap();
        assert_eq!(args.switch_attr_end, DEFAULT_SWITCH_ATTR_END);
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_parse_attr_id() {
        assert_eq!(parse_attr_id("512"), Ok(512));
        assert_eq!(parse_attr_id("0X200"), Ok(0x200));
        assert!(parse_attr_id("0xzz").is_err());
        assert_eq!(parse_attr_id("0xfffffffe"), Ok(0xffff_fffe));
        assert!(parse_attr_id("0xffffffff").is_err());
        assert!(Args::try_parse_from([
            "dashhaorch",
            "-c",
            "x.json",
            "--switch-attr-end",
            "4294967295",
        ])
        .is_err());
    }
}
