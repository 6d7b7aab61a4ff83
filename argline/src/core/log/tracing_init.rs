// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DisplayPreference, TracingConfig, WriterConfig, rolling_file_appender_impl};
use tracing_core::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt, registry::LookupSpan,
                         util::SubscriberInitExt};

pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer.
#[macro_export]
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    };
}

/// Install the layers for `tracing_config` as the global default subscriber. Returns
/// `Ok(())` without installing anything for [`WriterConfig::None`].
///
/// # Errors
///
/// Returns an error if the log file can't be created, or a global subscriber is
/// already installed.
pub fn try_initialize_logging_global(tracing_config: TracingConfig) -> miette::Result<()> {
    let Some(layers) = try_create_layers(tracing_config)? else {
        return Ok(());
    };
    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|err| miette::miette!("Failed to install tracing subscriber: {err}"))
}

/// Returns the layers. This does not initialize the tracing system.
///
/// # Errors
///
/// Returns an error if the log file can't be created.
pub fn try_create_layers(
    tracing_config: TracingConfig,
) -> miette::Result<Option<Vec<Box<DynLayer<tracing_subscriber::Registry>>>>> {
    let level_filter = tracing_config.get_level_filter();

    let (maybe_display, maybe_file) = match tracing_config.writer_config {
        WriterConfig::None => return Ok(None),
        WriterConfig::Display(display) => (Some(display), None),
        WriterConfig::File(path) => (None, Some(path)),
        WriterConfig::DisplayAndFile(display, path) => (Some(display), Some(path)),
    };

    let mut return_it: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    // Level filter for layers that don't carry their own.
    return_it.push(Box::new(level_filter));

    if let Some(display) = maybe_display {
        return_it.push(create_display_layer(level_filter, display));
    }

    if let Some(path) = maybe_file {
        return_it.push(try_create_file_layer(level_filter, &path)?);
    }

    Ok(Some(return_it))
}

fn create_display_layer<S>(
    level_filter: LevelFilter,
    preferred_display: DisplayPreference,
) -> Box<DynLayer<S>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let fmt_layer = create_fmt!();
    match preferred_display {
        DisplayPreference::Stdout => Box::new(
            fmt_layer
                .with_writer(std::io::stdout)
                .with_filter(level_filter),
        ),
        DisplayPreference::Stderr => Box::new(
            fmt_layer
                .with_writer(std::io::stderr)
                .with_filter(level_filter),
        ),
        DisplayPreference::SharedWriter(shared_writer) => {
            let tracing_writer =
                move || -> Box<dyn std::io::Write> { Box::new(shared_writer.clone()) };
            Box::new(
                fmt_layer
                    .with_writer(tracing_writer)
                    .with_filter(level_filter),
            )
        }
    }
}

fn try_create_file_layer<S>(
    level_filter: LevelFilter,
    path: &str,
) -> miette::Result<Box<DynLayer<S>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let file = rolling_file_appender_impl::try_create(path)?;
    Ok(Box::new(
        create_fmt!()
            .with_ansi(false)
            .with_writer(file)
            .with_filter(level_filter),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SharedWriter;
    use serial_test::serial;

    #[test]
    fn test_none_creates_no_layers() {
        let config = TracingConfig {
            writer_config: WriterConfig::None,
            level: tracing::Level::INFO,
        };
        assert!(try_create_layers(config).unwrap().is_none());
    }

    /// The global subscriber can be set once per process.
    #[test]
    #[serial]
    fn test_global_subscriber_is_installed_once() {
        let config = || {
            TracingConfig::new_display(DisplayPreference::Stderr)
                .with_level(tracing::Level::ERROR)
        };
        assert!(try_initialize_logging_global(config()).is_ok());
        assert!(try_initialize_logging_global(config()).is_err());
    }

    #[tokio::test]
    async fn test_shared_writer_display_layer() {
        let (sender, _receiver) = tokio::sync::mpsc::channel(10);
        let config =
            TracingConfig::new_display(DisplayPreference::SharedWriter(SharedWriter::new(sender)))
                .with_level(tracing::Level::WARN);
        let layers = try_create_layers(config).unwrap().unwrap();
        // Level filter plus the display layer.
        assert_eq!(layers.len(), 2);
    }
}
