//! Persona template — optional identity and tone instructions.

use sheetwise_config::{ConfigError, PersonaConfig};

/// A static, versioned block of style instructions, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaTemplate {
    pub version: String,
    pub name: String,
    pub block: String,
    pub addressee: Option<String>,
    pub directives: Vec<String>,
}

impl PersonaTemplate {
    pub fn new(name: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            version: "1".into(),
            name: name.into(),
            block: block.into(),
            addressee: None,
            directives: Vec::new(),
        }
    }

    pub fn with_addressee(mut self, addressee: impl Into<String>) -> Self {
        self.addressee = Some(addressee.into());
        self
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Build the template from `[persona]`, reading `block_file` if set.
    /// `Ok(None)` when no persona is configured.
    pub fn from_config(config: &PersonaConfig) -> Result<Option<Self>, ConfigError> {
        let block = match (&config.block, &config.block_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => {
                std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            (None, None) => return Ok(None),
        };

        if block.trim().is_empty() {
            return Err(ConfigError::ValidationError("persona block is empty".into()));
        }

        Ok(Some(Self {
            version: config.version.clone(),
            name: config.name.clone(),
            block,
            addressee: config.addressee.clone(),
            directives: config.directives.clone(),
        }))
    }

    /// Reminder lines closing a persona prompt. Data-grounded prompts also
    /// ask the model to hide the data source and stay speakable.
    pub fn reminders(&self, grounded: bool) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(addressee) = &self.addressee {
            lines.push(format!("Address the user as {addressee}."));
        }
        if grounded {
            lines.push("Do not mention where the data came from.".into());
            lines.push("Keep the response natural and easy to speak aloud.".into());
        }
        lines.extend(self.directives.iter().cloned());
        lines
    }
}

/// Prepend the persona block to a base prompt, separated by a blank line.
/// Without a persona the base prompt is returned unchanged.
pub fn apply_persona(base: &str, persona: Option<&PersonaTemplate>) -> String {
    match persona {
        Some(p) => format!("{}\n\n{}", p.block.trim(), base),
        None => base.to_string(),
    }
}
