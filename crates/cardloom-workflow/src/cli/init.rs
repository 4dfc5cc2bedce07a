/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When AppConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use std::path::Path;

use cardloom_workflow::config::{ApiConfig, AppConfig, LoggingConfig, PollingConfig};

pub fn run_init(output: &Path) -> Result<()> {
    println!("{}", style("Welcome to cardloom").bold().cyan());
    println!(
        "{}",
        style("This will guide you through connecting the CLI to your account.").dim()
    );

    let theme = ColorfulTheme::default();

    println!("\n{}", style("--- Backend ---").bold());
    let base_url: String = Input::with_theme(&theme)
        .with_prompt("API base URL")
        .default("https://api.cardloom.app".to_string())
        .validate_with(|value: &String| -> std::result::Result<(), String> {
            url::Url::parse(value).map(|_| ()).map_err(|err| err.to_string())
        })
        .interact_text()?;

    let user_id: String = Input::with_theme(&theme)
        .with_prompt("User ID")
        .interact_text()?;

    let access_token: String = Password::with_theme(&theme)
        .with_prompt("Access token")
        .interact()?;

    println!("\n{}", style("--- Polling ---").bold());
    let interval_secs: u64 = Input::with_theme(&theme)
        .with_prompt("Status check interval (seconds)")
        .default(5)
        .interact_text()?;

    let config = build_config(base_url, user_id, access_token, interval_secs);
    config.validate().context("configuration is invalid")?;
    write_config(&config, output)?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!("Configuration written to: {}", style(output.display()).cyan());

    Ok(())
}

fn build_config(
    base_url: String,
    user_id: String,
    access_token: String,
    interval_secs: u64,
) -> AppConfig {
    AppConfig {
        api: ApiConfig {
            base_url,
            access_token,
            user_id,
            timeout_secs: 30,
        },
        polling: PollingConfig {
            interval_secs,
            max_duration_secs: None,
        },
        logging: LoggingConfig::default(),
        data_dir: None,
    }
}

fn write_config(config: &AppConfig, output: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("failed to serialize config to YAML")?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))
}
