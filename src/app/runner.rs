use crate::config::cli::{CliCommand, ModuleCommand, VersionCommand};
use crate::core::bus::CommandBus;
use crate::core::response::CommandResponse;
use crate::domain::model::{DownloadLocation, Module, ModuleVersion};
use crate::utils::error::Result;
use serde::Serialize;
use std::fmt::Write as _;

/// Human readable form of a command payload.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Module {
    fn render(&self) -> String {
        format!("{}  {}", self.id, self.key())
    }
}

impl Render for ModuleVersion {
    fn render(&self) -> String {
        format!(
            "{}  {}  {}  {}  {}",
            self.id,
            self.version,
            self.status,
            self.repository_url,
            self.download_url.as_deref().unwrap_or("-")
        )
    }
}

impl Render for DownloadLocation {
    fn render(&self) -> String {
        self.location
            .clone()
            .unwrap_or_else(|| "no archive available yet".to_string())
    }
}

impl<T: Render> Render for Vec<T> {
    fn render(&self) -> String {
        if self.is_empty() {
            return "(none)".to_string();
        }
        self.iter().map(Render::render).collect::<Vec<_>>().join("\n")
    }
}

/// Runs one CLI command and prints its outcome. Returns the process exit
/// code for outcomes that are not errors.
pub async fn execute(bus: &CommandBus, command: CliCommand, json: bool) -> Result<i32> {
    match command {
        CliCommand::Module(command) => execute_module(bus, command, json).await,
        CliCommand::Version(command) => execute_version(bus, command, json).await,
        CliCommand::Discovery => {
            let (_, document) = bus.service_discovery();
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(0)
        }
    }
}

async fn execute_module(bus: &CommandBus, command: ModuleCommand, json: bool) -> Result<i32> {
    match command {
        ModuleCommand::Add(args) => {
            let response = bus.add_module_from_cli(args.file.as_deref()).await?;
            report(&response, json)
        }
        ModuleCommand::List {
            provider,
            namespace,
        } => {
            let response = bus.list_modules_from_cli(provider, namespace).await?;
            report(&response, json)
        }
        ModuleCommand::Show { id_or_fqn } => {
            let response = bus.show_module_from_cli(&id_or_fqn).await?;
            report(&response, json)
        }
        ModuleCommand::Delete {
            id_or_fqn,
            versions,
            yes,
        } => {
            let response = bus.delete_module_from_cli(&id_or_fqn, versions, yes).await?;
            report(&response, json)
        }
    }
}

async fn execute_version(bus: &CommandBus, command: VersionCommand, json: bool) -> Result<i32> {
    match command {
        VersionCommand::Add(args) => {
            let response = bus.add_module_version_from_cli(args.file.as_deref()).await?;
            report(&response, json)
        }
        VersionCommand::List { module } => {
            let response = bus.list_module_versions_from_cli(&module).await?;
            report(&response, json)
        }
        VersionCommand::Show { id_or_fqn } => {
            let response = bus.show_module_version_from_cli(&id_or_fqn).await?;
            report(&response, json)
        }
        VersionCommand::Delete { id_or_fqn, yes } => {
            let response = bus.delete_module_version_from_cli(&id_or_fqn, yes).await?;
            report(&response, json)
        }
        VersionCommand::Download { key } => {
            let response = bus.download_module_version_from_cli(&key).await?;
            report(&response, json)
        }
    }
}

fn report<T: Serialize + Render>(response: &CommandResponse<T>, json: bool) -> Result<i32> {
    let output = if json {
        serde_json::to_string_pretty(response)?
    } else {
        render_text(response)
    };
    println!("{}", output);

    Ok(if response.is_success() { 0 } else { 1 })
}

pub fn render_text<T: Render>(response: &CommandResponse<T>) -> String {
    let mut out = format!("{}", response.status);

    if let Some(payload) = response.payload() {
        let _ = write!(out, "\n{}", payload.render());
    }

    for error in &response.validation_errors {
        let _ = write!(
            out,
            "\n  - {}: {} (rule: {}, value: '{}')",
            error.field, error.message, error.rule, error.value
        );
    }

    out
}
