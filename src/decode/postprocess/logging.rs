//! Log format and level tags, shared by `[logging]` and the console logger.

use crate::config::errors::{ConfigError, ErrorList, VariantFamily};
use crate::config::schema::{LogFormat, LogLevel, LoggingOptions};
use crate::decode::skeleton::LoggingSkeleton;

/// Resolve an optional tag through `parse`, reporting unrecognized values.
pub(super) fn resolve<T>(
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    family: VariantFamily,
    context: &str,
    errors: &mut ErrorList,
) -> Option<T> {
    let value = value.filter(|v| !v.is_empty())?;
    let resolved = parse(value);
    if resolved.is_none() {
        errors.push(ConfigError::unsupported(context, family, value));
    }
    resolved
}

pub(super) fn resolve_options(
    skel: &LoggingSkeleton,
    context: &str,
    errors: &mut ErrorList,
) -> (Option<LogFormat>, Option<LogLevel>) {
    let format = resolve(
        skel.format.as_deref(),
        LogFormat::parse,
        VariantFamily::LogFormat,
        context,
        errors,
    );
    let level = resolve(
        skel.level.as_deref(),
        LogLevel::parse,
        VariantFamily::LogLevel,
        context,
        errors,
    );
    (format, level)
}

pub(super) fn process_logging(skel: LoggingSkeleton, errors: &mut ErrorList) -> LoggingOptions {
    let (format, level) = resolve_options(&skel, "logging", errors);
    LoggingOptions { format, level }
}
