use std::path::Path;

use crate::Config;

/// Attachment kind names accepted in `supported_attachments`
const KNOWN_ATTACHMENT_KINDS: &[&str] = &["image", "video", "document", "text", "binary"];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured, a model references
    /// an unknown provider, or an attachment kind name is unrecognized
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.providers.is_empty() {
            anyhow::bail!("at least one LLM provider must be configured");
        }

        for (model_id, entry) in &self.llm.models {
            if !self.llm.providers.contains_key(&entry.provider) {
                anyhow::bail!("model '{model_id}' references unknown provider '{}'", entry.provider);
            }

            for kind in &entry.supported_attachments {
                if !KNOWN_ATTACHMENT_KINDS.contains(&kind.as_str()) {
                    anyhow::bail!("model '{model_id}' lists unknown attachment kind '{kind}'");
                }
            }
        }

        if self.llm.max_tool_round_trips == 0 {
            anyhow::bail!("llm.max_tool_round_trips must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Config;

    fn parse(raw: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn minimal_config_validates() {
        let config = parse(
            r#"
            [llm.providers.grok]
            type = "openai"

            [llm.models.grok-2-latest]
            provider = "grok"
            supported_attachments = ["image"]
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.providers.len(), 1);
        assert!(config.llm.models.contains_key("grok-2-latest"));
    }

    #[test]
    fn model_with_unknown_provider_rejected() {
        let err = parse(
            r#"
            [llm.providers.grok]
            type = "openai"

            [llm.models.gemini-pro]
            provider = "gemini"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("unknown provider"));
    }

    #[test]
    fn unknown_attachment_kind_rejected() {
        let err = parse(
            r#"
            [llm.providers.grok]
            type = "openai"

            [llm.models.grok-2-latest]
            provider = "grok"
            supported_attachments = ["hologram"]
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("hologram"));
    }

    #[test]
    fn empty_providers_rejected() {
        let err = parse("[server]").unwrap_err();
        assert!(err.to_string().contains("at least one LLM provider"));
    }
}
