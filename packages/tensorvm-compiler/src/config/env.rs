//! Environment overrides
//!
//! Variables are named `TENSORVM__<GROUP>__<FIELD>` (e.g.
//! `TENSORVM__SCHEDULING__EXECUTION_MODEL=inline-static`), plus the top-level
//! `TENSORVM__STRICT_MODE`. Lists are comma-separated. Any other
//! `TENSORVM__` variable is an error.

use super::error::{ConfigError, ConfigResult};
use super::option_groups::*;
use super::pipeline_options::PipelineOptions;
use super::provenance::ConfigSource;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "TENSORVM__";

const GROUPS: &[&str] = &[
    "binding",
    "input_dialect",
    "high_level_optimization",
    "scheduling",
    "target_backend",
    "bytecode_target",
    "strict_mode",
];

/// A group settable field-by-field from strings
trait EnvOverride {
    const GROUP: &'static str;
    const FIELDS: &'static [&'static str];

    fn set_field(&mut self, field: &str, value: &str) -> ConfigResult<()>;

    fn unknown(field: &str) -> ConfigError {
        ConfigError::unknown_field_with_suggestion(
            field,
            Self::GROUP,
            Self::FIELDS.iter().map(|f| f.to_string()).collect(),
        )
    }
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value_with_suggestion(
            field,
            value,
            &["true", "false"],
        )),
    }
}

fn parse_u32(field: &str, value: &str) -> ConfigResult<u32> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        suggestion: "Expected an unsigned integer".to_string(),
    })
}

fn non_utf8(var: &str, raw: &OsStr) -> ConfigError {
    ConfigError::InvalidValue {
        field: var.to_string(),
        value: raw.to_string_lossy().into_owned(),
        suggestion: "Environment variables must be valid UTF-8".to_string(),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl EnvOverride for BindingOptions {
    const GROUP: &'static str = "binding";
    const FIELDS: &'static [&'static str] = &["native", "tflite"];

    fn set_field(&mut self, field: &str, value: &str) -> ConfigResult<()> {
        match field {
            "native" => self.native = parse_bool("binding.native", value)?,
            "tflite" => self.tflite = parse_bool("binding.tflite", value)?,
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl EnvOverride for InputDialectOptions {
    const GROUP: &'static str = "input_dialect";
    const FIELDS: &'static [&'static str] = &["dialect"];

    fn set_field(&mut self, field: &str, value: &str) -> ConfigResult<()> {
        match field {
            "dialect" => self.dialect = value.parse()?,
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl EnvOverride for HighLevelOptimizationOptions {
    const GROUP: &'static str = "high_level_optimization";
    const FIELDS: &'static [&'static str] = &[
        "const_expr_hoisting",
        "numeric_precision_reduction",
        "const_eval",
        "strip_assertions",
    ];

    fn set_field(&mut self, field: &str, value: &str) -> ConfigResult<()> {
        let qualified = format!("{}.{}", Self::GROUP, field);
        match field {
            "const_expr_hoisting" => self.const_expr_hoisting = parse_bool(&qualified, value)?,
            "numeric_precision_reduction" => {
                self.numeric_precision_reduction = parse_bool(&qualified, value)?
            }
            "const_eval" => self.const_eval = parse_bool(&qualified, value)?,
            "strip_assertions" => self.strip_assertions = parse_bool(&qualified, value)?,
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl EnvOverride for SchedulingOptions {
    const GROUP: &'static str = "scheduling";
    const FIELDS: &'static [&'static str] = &[
        "execution_model",
        "dump_statistics_format",
        "dump_statistics_file",
    ];

    fn set_field(&mut self, field: &str, value: &str) -> ConfigResult<()> {
        match field {
            "execution_model" => self.execution_model = value.parse()?,
            "dump_statistics_format" => self.dump_statistics_format = value.parse()?,
            "dump_statistics_file" => {
                self.dump_statistics_file = match value.trim() {
                    "" => None,
                    path => Some(PathBuf::from(path)),
                }
            }
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl EnvOverride for TargetBackendOptions {
    const GROUP: &'static str = "target_backend";
    const FIELDS: &'static [&'static str] = &[
        "targets",
        "verify_transform_legality",
        "legality_op_kind",
        "legality_marker",
    ];

    fn set_field(&mut self, field: &str, value: &str) -> ConfigResult<()> {
        match field {
            "targets" => self.targets = parse_list(value),
            "verify_transform_legality" => {
                self.verify_transform_legality =
                    parse_bool("target_backend.verify_transform_legality", value)?
            }
            "legality_op_kind" => self.legality_op_kind = value.trim().to_string(),
            "legality_marker" => self.legality_marker = value.trim().to_string(),
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl EnvOverride for BytecodeTargetOptions {
    const GROUP: &'static str = "bytecode_target";
    const FIELDS: &'static [&'static str] = &[
        "index_bits",
        "f32_extension",
        "f64_extension",
        "truncate_unsupported_floats",
        "optimize_for_stack_size",
    ];

    fn set_field(&mut self, field: &str, value: &str) -> ConfigResult<()> {
        let qualified = format!("{}.{}", Self::GROUP, field);
        match field {
            "index_bits" => self.index_bits = parse_u32(&qualified, value)?,
            "f32_extension" => self.f32_extension = parse_bool(&qualified, value)?,
            "f64_extension" => self.f64_extension = parse_bool(&qualified, value)?,
            "truncate_unsupported_floats" => {
                self.truncate_unsupported_floats = parse_bool(&qualified, value)?
            }
            "optimize_for_stack_size" => {
                self.optimize_for_stack_size = parse_bool(&qualified, value)?
            }
            _ => return Err(Self::unknown(field)),
        }
        Ok(())
    }
}

impl PipelineOptions {
    /// Defaults overlaid with every `TENSORVM__*` variable of the process
    ///
    /// Variables outside the prefix are skipped without being decoded; a
    /// prefixed variable whose name or value is not UTF-8 is rejected.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_os_vars(std::env::vars_os())
    }

    fn from_os_vars<I>(vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut decoded = Vec::new();
        for (key, value) in vars {
            let key = match key.into_string() {
                Ok(key) if key.starts_with(ENV_PREFIX) => key,
                Ok(_) => continue,
                Err(raw) => {
                    let lossy = raw.to_string_lossy();
                    if lossy.starts_with(ENV_PREFIX) {
                        return Err(non_utf8(&lossy, &raw));
                    }
                    continue;
                }
            };
            let value = value.into_string().map_err(|raw| non_utf8(&key, &raw))?;
            decoded.push((key, value));
        }
        Self::from_env_map(decoded)
    }

    /// Defaults overlaid with `TENSORVM__*` entries from an explicit map
    ///
    /// Keys without the prefix are ignored. Entries apply in key order, so
    /// the result does not depend on iteration order of the input.
    pub fn from_env_map<I, K, V>(vars: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let relevant: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();

        let mut options = Self::new();
        for (key, value) in &relevant {
            options.apply_env(key, value)?;
        }
        Ok(options)
    }

    fn apply_env(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let path = key[ENV_PREFIX.len()..].to_lowercase();
        let (group, field) = match path.split_once("__") {
            Some((group, field)) => (group.to_string(), field.to_string()),
            None => (path.clone(), String::new()),
        };

        match (group.as_str(), field.as_str()) {
            ("strict_mode", "") => {
                self.strict_mode = parse_bool("strict_mode", value)?;
                self.provenance
                    .track_field("strict_mode", ConfigSource::Env(key.to_string()));
                return Ok(());
            }
            ("binding", f) => self.binding.set_field(f, value)?,
            ("input_dialect", f) => self.input_dialect.set_field(f, value)?,
            ("high_level_optimization", f) => self.high_level_optimization.set_field(f, value)?,
            ("scheduling", f) => self.scheduling.set_field(f, value)?,
            ("target_backend", f) => self.target_backend.set_field(f, value)?,
            ("bytecode_target", f) => self.bytecode_target.set_field(f, value)?,
            (other, _) => {
                return Err(ConfigError::unknown_field_with_suggestion(
                    other,
                    "<root>",
                    GROUPS.iter().map(|g| g.to_string()).collect(),
                ))
            }
        }

        tracing::debug!(var = key, "option overridden from environment");
        self.provenance.track_field(
            &format!("{}.{}", group, field),
            ConfigSource::Env(key.to_string()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> ConfigResult<PipelineOptions> {
        PipelineOptions::from_env_map(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_empty_env_is_default() {
        let options = env(&[("PATH", "/usr/bin"), ("HOME", "/root")]).unwrap();
        assert_eq!(options.to_yaml().unwrap(), PipelineOptions::new().to_yaml().unwrap());
        assert!(options.provenance().field_sources().is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let options = env(&[
            ("TENSORVM__SCHEDULING__EXECUTION_MODEL", "inline-static"),
            ("TENSORVM__BINDING__TFLITE", "1"),
            ("TENSORVM__TARGET_BACKEND__TARGETS", "llvm-cpu, vulkan-spirv"),
            ("TENSORVM__BYTECODE_TARGET__INDEX_BITS", "64"),
            ("TENSORVM__STRICT_MODE", "yes"),
        ])
        .unwrap();

        assert_eq!(options.scheduling.execution_model, ExecutionModel::InlineStatic);
        assert!(options.binding.tflite);
        assert_eq!(options.target_backend.targets, vec!["llvm-cpu", "vulkan-spirv"]);
        assert_eq!(options.bytecode_target.index_bits, 64);
        assert!(options.is_strict());
        assert_eq!(
            options.provenance().get_source("binding.tflite"),
            &ConfigSource::Env("TENSORVM__BINDING__TFLITE".to_string())
        );
    }

    #[test]
    fn test_env_unknown_field_suggests() {
        let err = env(&[("TENSORVM__SCHEDULING__EXECUTION_MODE", "host-only")]).unwrap_err();
        match err {
            ConfigError::UnknownField {
                group, suggestion, ..
            } => {
                assert_eq!(group, "scheduling");
                assert!(suggestion.contains("execution_model"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_unknown_group() {
        let err = env(&[("TENSORVM__SCHEDULE__EXECUTION_MODEL", "host-only")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { .. }));
        assert!(err.to_string().contains("scheduling"));
    }

    #[test]
    fn test_env_bad_values() {
        assert!(matches!(
            env(&[("TENSORVM__BINDING__NATIVE", "maybe")]).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
        assert!(matches!(
            env(&[("TENSORVM__BYTECODE_TARGET__INDEX_BITS", "wide")]).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
        let err = env(&[("TENSORVM__INPUT_DIALECT__DIALECT", "mhloo")]).unwrap_err();
        assert!(err.to_string().contains("Did you mean 'mhlo'?"));
    }

    #[test]
    #[cfg(unix)]
    fn test_unrelated_non_utf8_variable_is_skipped() {
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var(
            "TENSORVM_TEST_UNRELATED_BYTES",
            OsStr::from_bytes(b"f\xffo"),
        );
        let result = PipelineOptions::from_env();
        std::env::remove_var("TENSORVM_TEST_UNRELATED_BYTES");

        assert!(result.is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn test_non_utf8_prefixed_value_rejected() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (
                OsString::from("UNRELATED"),
                OsString::from_vec(b"\xfe\xff".to_vec()),
            ),
            (
                OsString::from("TENSORVM__BINDING__TFLITE"),
                OsString::from("true"),
            ),
        ];
        let options = PipelineOptions::from_os_vars(vars).unwrap();
        assert!(options.binding.tflite);

        let bad = vec![(
            OsString::from("TENSORVM__INPUT_DIALECT__DIALECT"),
            OsString::from_vec(b"mh\xfflo".to_vec()),
        )];
        match PipelineOptions::from_os_vars(bad).unwrap_err() {
            ConfigError::InvalidValue { field, .. } => {
                assert_eq!(field, "TENSORVM__INPUT_DIALECT__DIALECT")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_statistics_file() {
        let options = env(&[
            ("TENSORVM__SCHEDULING__DUMP_STATISTICS_FORMAT", "csv"),
            ("TENSORVM__SCHEDULING__DUMP_STATISTICS_FILE", "/tmp/stats.csv"),
        ])
        .unwrap();
        assert_eq!(options.scheduling.dump_statistics_format, DumpStatisticsFormat::Csv);
        assert_eq!(
            options.scheduling.dump_statistics_file,
            Some(PathBuf::from("/tmp/stats.csv"))
        );
    }
}
