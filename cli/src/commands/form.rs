//! Interactive configuration form: one page per setting group.
//!
//! Every field is pre-filled with the resolved value and validated as soon
//! as it is submitted; a rejected value is reported and asked for again.

use anyhow::{Context, Result};
use dialoguer::{Input, Password, Select};
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::ports::ResourceChecker;
use crate::application::services::validation;
use crate::domain::{DeploymentConfig, DeploymentKind, Setting};

/// Walk the operator through every group of `config`.
///
/// # Errors
///
/// Returns an error if a prompt fails, a field cannot be set, or the
/// operator declines the final confirmation.
pub async fn edit(
    app: &AppContext,
    config: &mut DeploymentConfig,
    checker: &impl ResourceChecker,
) -> Result<()> {
    let groups = config.settings().groups();
    for group in groups {
        println!();
        println!("  {}", group.style(app.output.styles.group));
        let indices: Vec<usize> = config
            .settings()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.group == group)
            .map(|(i, _)| i)
            .collect();
        for idx in indices {
            edit_field(app, config, idx, checker).await?;
        }
    }

    if config.kind() == DeploymentKind::Cloud {
        app.renderer().render_config(config);
        if !app.confirm("Deploy with this configuration?", true)? {
            anyhow::bail!("deployment cancelled");
        }
    }
    Ok(())
}

async fn edit_field(
    app: &AppContext,
    config: &mut DeploymentConfig,
    idx: usize,
    checker: &impl ResourceChecker,
) -> Result<()> {
    loop {
        let Some(setting) = config.settings().by_index(idx) else {
            return Ok(());
        };
        if !setting.description.is_empty() {
            println!("  {}", setting.description.style(app.output.styles.dim));
        }
        let env = setting.env;
        let value = prompt(setting)?;
        config.settings_mut().set(env, value)?;

        match validation::validate_setting(config.settings_mut(), idx, checker).await {
            Ok(()) => return Ok(()),
            Err(e) => app.output.error(&e.to_string()),
        }
    }
}

fn prompt(setting: &Setting) -> Result<String> {
    if !setting.choices.is_empty() {
        let labels: Vec<&str> = setting.choices.iter().map(|c| c.label).collect();
        let current = setting
            .choices
            .iter()
            .position(|c| c.value == setting.value)
            .unwrap_or(0);
        let idx = Select::new()
            .with_prompt(setting.title)
            .items(&labels)
            .default(current)
            .interact()
            .with_context(|| format!("{} selection", setting.title))?;
        return Ok(setting.choices[idx].value.to_string());
    }

    if setting.is_secret() {
        let hint = if setting.value.is_empty() {
            setting.title.to_string()
        } else {
            format!("{} (leave empty to keep current)", setting.title)
        };
        let entered = Password::new()
            .with_prompt(hint)
            .allow_empty_password(true)
            .interact()
            .with_context(|| format!("{} input", setting.title))?;
        if entered.is_empty() {
            return Ok(setting.value.clone());
        }
        return Ok(entered);
    }

    Input::<String>::new()
        .with_prompt(setting.title)
        .default(setting.value.clone())
        .allow_empty(true)
        .interact_text()
        .with_context(|| format!("{} input", setting.title))
}
