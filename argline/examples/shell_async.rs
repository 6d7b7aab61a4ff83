// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A tiny deploy shell. Every line that is not a built in command is bound against a
//! [`DescriptorSet`], and <kbd>Tab</kbd> completes switches and choice values from the
//! same set.
//!
//! ```text
//! cargo run --example shell_async
//! ```

use argline::{ArgsError, BoundValues, Descriptor, DescriptorSet, DisplayPreference,
              ReadlineAsyncContext, ReadlineEvent, ReadlineOptions, TracingConfig,
              ValueType, bind, rla_println, tokenize, try_initialize_logging_global};
use miette::IntoDiagnostic;
use std::{ops::ControlFlow, str::FromStr, time::Duration};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use tokio::{select, time::interval};

/// Built in commands, everything else is a deploy.
#[derive(Debug, PartialEq, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
enum Command {
    #[strum(ascii_case_insensitive)]
    Help,

    #[strum(ascii_case_insensitive)]
    Login,

    #[strum(ascii_case_insensitive)]
    Confirm,

    #[strum(ascii_case_insensitive)]
    Clear,

    #[strum(ascii_case_insensitive)]
    Heartbeat,

    #[strum(ascii_case_insensitive)]
    Exit,
}

fn deploy_descriptors() -> miette::Result<DescriptorSet> {
    DescriptorSet::new(vec![
        Descriptor::required("target").help("Host to deploy to"),
        Descriptor::optional("profile")
            .short('p')
            .value_type(ValueType::Choice(vec![
                "debug".into(),
                "release".into(),
                "dev build".into(),
            ]))
            .default_value("debug")
            .help("Build profile"),
        Descriptor::optional("retries")
            .short('r')
            .value_type(ValueType::Int)
            .init_value(3_i64)
            .help("How often to retry"),
        Descriptor::switch("dry-run").short('n').help("Only print the plan"),
        Descriptor::optional("reason")
            .short('m')
            .trigger("profile", "release")
            .help("Why, only for release deploys"),
        Descriptor::variadic("services").help("Services to restart"),
    ])
    .into_diagnostic()
}

fn get_info_message() -> String {
    let commands = Command::iter()
        .map(|it| it.to_string())
        .collect::<Vec<String>>();
    format!(
        "Built in commands: {commands:?}\n\
         Anything else deploys, e.g. `web-1 -p release -m 'hot fix' api worker`.\n\
         Try Tab after `-p `, Up, Down, Ctrl+W, Ctrl+U, Alt+Enter."
    )
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let descriptors = deploy_descriptors()?;

    let options = ReadlineOptions::default()
        .with_prompt("deploy> ")
        .with_completion_source(descriptors.clone());

    // If the terminal is not fully interactive, then return early.
    let Some(mut rl_ctx) = ReadlineAsyncContext::try_new(options)? else {
        return Ok(());
    };

    // Pre-populate the readline's history with some entries.
    for command in Command::iter() {
        rl_ctx.readline.add_history_entry(command.to_string());
    }

    // Initialize tracing w/ the "async stdout" (SharedWriter).
    try_initialize_logging_global(
        TracingConfig::new_display(DisplayPreference::SharedWriter(
            rl_ctx.clone_shared_writer(),
        ))
        .with_level(tracing::Level::INFO),
    )?;

    rla_println!(rl_ctx, "{}", get_info_message());

    let mut heartbeat = interval(Duration::from_secs(5));
    let mut heartbeat_on = false;

    loop {
        select! {
            _ = heartbeat.tick() => {
                if heartbeat_on {
                    tracing::info!(message = "still here");
                }
            },
            result_readline_event = rl_ctx.read_line() => {
                let control_flow = match result_readline_event? {
                    ReadlineEvent::Line(line) => {
                        process_line(&mut rl_ctx, &descriptors, &line, &mut heartbeat_on)
                            .await?
                    }
                    ReadlineEvent::Interrupted => {
                        rla_println!(rl_ctx, "^C");
                        ControlFlow::Continue(())
                    }
                    ReadlineEvent::Eof => ControlFlow::Break(()),
                    _ => ControlFlow::Continue(()),
                };
                if control_flow.is_break() {
                    break;
                }
            }
        }
    }

    rl_ctx.request_shutdown(Some("Goodbye")).await?;

    Ok(())
}

async fn process_line(
    rl_ctx: &mut ReadlineAsyncContext,
    descriptors: &DescriptorSet,
    line: &str,
    heartbeat_on: &mut bool,
) -> miette::Result<ControlFlow<()>> {
    let tokens = match tokenize(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            rla_println!(rl_ctx, "{err}");
            return Ok(ControlFlow::Continue(()));
        }
    };
    let Some(first) = tokens.first() else {
        return Ok(ControlFlow::Continue(()));
    };

    let Ok(command) = Command::from_str(first) else {
        match bind(descriptors, &tokens) {
            Ok(bound) => print_plan(rl_ctx, &bound),
            Err(err) => print_error(rl_ctx, &err),
        }
        return Ok(ControlFlow::Continue(()));
    };

    match command {
        Command::Help => rla_println!(rl_ctx, "{}", get_info_message()),
        Command::Login => {
            if let ReadlineEvent::Password(password) =
                rl_ctx.read_password("Password: ").await?
            {
                rla_println!(rl_ctx, "Logged in ({} chars)", password.len());
            }
        }
        Command::Confirm => {
            rla_println!(rl_ctx, "Press y to confirm");
            if let ReadlineEvent::Key(key_event) = rl_ctx.read_key().await? {
                rla_println!(rl_ctx, "Got {:?}", key_event.code);
            }
        }
        Command::Clear => rl_ctx.readline.clear().into_diagnostic()?,
        Command::Heartbeat => {
            *heartbeat_on = !*heartbeat_on;
            rla_println!(rl_ctx, "Heartbeat logging: {heartbeat_on}");
        }
        Command::Exit => return Ok(ControlFlow::Break(())),
    }

    Ok(ControlFlow::Continue(()))
}

fn print_plan(rl_ctx: &mut ReadlineAsyncContext, bound: &BoundValues) {
    let verb = if bound.get_bool("dry-run").unwrap_or(false) {
        "Would deploy"
    } else {
        "Deploying"
    };
    rla_println!(
        rl_ctx,
        "{verb} to {} with profile {}",
        bound.get_str("target").unwrap_or_default(),
        bound.get_str("profile").unwrap_or_default(),
    );
    for (name, value) in bound.iter() {
        let supplied = if bound.was_supplied(name) { "*" } else { " " };
        rla_println!(rl_ctx, "  {supplied} {name} = {value}");
    }
}

fn print_error(rl_ctx: &mut ReadlineAsyncContext, err: &ArgsError) {
    rla_println!(rl_ctx, "error: {err}");
}
