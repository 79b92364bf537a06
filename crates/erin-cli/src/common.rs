//! Logging setup and small CLI-boundary helpers shared across subcommands.

use erin_core::diagnostics::{Diagnostics, Severity};
use std::fmt;
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Formats each event as `[LEVEL] message`, matching the `[ERROR]` /
/// `[WARNING]` / `[INFO]` convention the CLI reports diagnostics under.
struct BracketedLevel;

impl<S, N> FormatEvent<S, N> for BracketedLevel
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let level = match *event.metadata().level() {
            Level::ERROR => "ERROR",
            Level::WARN => "WARNING",
            Level::INFO => "INFO",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
        };
        write!(writer, "[{level}] ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global `tracing` subscriber at the requested level, using
/// the `[LEVEL] message` formatter instead of `tracing-subscriber`'s
/// default layout.
pub fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .event_format(BracketedLevel)
        .without_time()
        .with_target(false)
        .init();
}

/// Logs every diagnostic issue at the tracing level matching its severity.
pub fn log_diagnostics(diagnostics: &Diagnostics) {
    for issue in &diagnostics.issues {
        let message = match &issue.entity {
            Some(entity) => format!("{entity}: {}", issue.message),
            None => issue.message.clone(),
        };
        match issue.severity {
            Severity::Error => tracing::error!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
        }
    }
}
