//! A single environment-bound configuration value and the fixed-shape
//! collection a deployment config is built from.

use crate::domain::envfile;
use crate::domain::error::ConfigError;
use crate::domain::rules::Rule;

/// One option of a fixed-choice setting. `label` is shown, `value` is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub label: &'static str,
    pub value: &'static str,
}

/// A configurable value bound to an environment-variable name.
#[derive(Debug, Clone)]
pub struct Setting {
    /// Environment variable name; the stable identity of the setting.
    pub env: &'static str,
    /// Human title, used in prompts and error messages.
    pub title: &'static str,
    pub description: &'static str,
    /// Section the setting belongs to in the config file and the form.
    pub group: &'static str,
    pub value: String,
    /// File name the value is stored under when the setting is a secret.
    pub secret: Option<&'static str>,
    pub rule: Option<Rule>,
    pub choices: &'static [Choice],
    validated: Option<String>,
}

impl Setting {
    #[must_use]
    pub fn new(env: &'static str, title: &'static str, group: &'static str) -> Self {
        Self {
            env,
            title,
            description: "",
            group,
            value: String::new(),
            secret: None,
            rule: None,
            choices: &[],
            validated: None,
        }
    }

    #[must_use]
    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    #[must_use]
    pub fn secret(mut self, file_name: &'static str) -> Self {
        self.secret = Some(file_name);
        self
    }

    #[must_use]
    pub fn choices(mut self, choices: &'static [Choice]) -> Self {
        self.choices = choices;
        self
    }

    #[must_use]
    pub fn is_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// `false` when there is no rule or the current value already passed it.
    #[must_use]
    pub fn needs_validation(&self) -> bool {
        self.rule.is_some() && self.validated.as_deref() != Some(self.value.as_str())
    }

    /// Record that `value` passed this setting's rule.
    pub fn mark_validated(&mut self, value: String) {
        self.validated = Some(value);
    }

    /// The config-file line for this setting. Secrets become a comment
    /// pointing at their sibling file.
    #[must_use]
    pub fn serialize(&self) -> String {
        match self.secret {
            Some(file) => format!("# {} is a secret located at ./{file}\n", self.env),
            None => envfile::assignment(self.env, &self.value),
        }
    }
}

/// Read access to other settings' live values, by env name.
pub trait FieldReader {
    fn field(&self, env: &str) -> Option<&str>;
}

/// Ordered, fixed set of settings. Values change; membership does not.
#[derive(Debug, Clone)]
pub struct Settings(Vec<Setting>);

impl Settings {
    #[must_use]
    pub fn new(settings: Vec<Setting>) -> Self {
        Self(settings)
    }

    #[must_use]
    pub fn get(&self, env: &str) -> Option<&Setting> {
        self.0.iter().find(|s| s.env == env)
    }

    /// Current value of `env`, or `""` if no such setting exists.
    #[must_use]
    pub fn value(&self, env: &str) -> &str {
        self.get(env).map_or("", |s| s.value.as_str())
    }

    /// Replace the value of an existing setting.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownSetting` if `env` is not part of this set.
    pub fn set(&mut self, env: &str, value: impl Into<String>) -> Result<(), ConfigError> {
        let setting = self
            .0
            .iter_mut()
            .find(|s| s.env == env)
            .ok_or_else(|| ConfigError::UnknownSetting(env.to_string()))?;
        setting.value = value.into();
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn by_index(&self, idx: usize) -> Option<&Setting> {
        self.0.get(idx)
    }

    pub(crate) fn by_index_mut(&mut self, idx: usize) -> Option<&mut Setting> {
        self.0.get_mut(idx)
    }

    /// Group names in first-appearance order.
    #[must_use]
    pub fn groups(&self) -> Vec<&'static str> {
        let mut groups: Vec<&'static str> = Vec::new();
        for s in &self.0 {
            if !groups.contains(&s.group) {
                groups.push(s.group);
            }
        }
        groups
    }
}

impl FieldReader for Settings {
    fn field(&self, env: &str) -> Option<&str> {
        self.get(env).map(|s| s.value.as_str())
    }
}
