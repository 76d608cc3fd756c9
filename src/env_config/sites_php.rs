//! sites.php from a name => sites directory mapping

use super::php::quote;
use super::EnvConfigError;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

pub const DEFAULT_PATTERN: &str = "{{ upper }}";
pub const ORIGINAL_PATTERN: &str = "{{ original }}";

#[derive(Debug, Clone)]
pub struct SitesPhpGenerator {
    mapping: Map<String, Value>,
    env_var_name_pattern: String,
}

impl Default for SitesPhpGenerator {
    fn default() -> Self {
        Self {
            mapping: Map::new(),
            env_var_name_pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

impl SitesPhpGenerator {
    pub fn new(mapping: Map<String, Value>) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    /// An empty pattern means the name is used as is
    pub fn env_var_name_pattern(mut self, pattern: &str) -> Self {
        self.env_var_name_pattern = if pattern.is_empty() {
            ORIGINAL_PATTERN.to_string()
        } else {
            pattern.to_string()
        };
        self
    }

    pub fn env_var_name(&self, original: &str) -> Result<String, EnvConfigError> {
        let placeholder = Regex::new(r"\{\{ (original|upper) \}\}")?;
        Ok(placeholder
            .replace_all(&self.env_var_name_pattern, |caps: &Captures| match &caps[1] {
                "upper" => original.to_uppercase(),
                _ => original.to_string(),
            })
            .into_owned())
    }

    pub fn generate(&self) -> Result<String, EnvConfigError> {
        if self.mapping.is_empty() {
            return Ok("<?php\n\n$sites = [];\n".to_string());
        }

        let mut lines = vec!["<?php".to_string(), String::new(), "$sites = [".to_string()];
        for (name, dir) in &self.mapping {
            let dir = match dir {
                Value::String(dir) => dir.clone(),
                other => other.to_string(),
            };
            lines.push(format!(
                "  getenv({}) => {},",
                quote(&self.env_var_name(name)?),
                quote(&dir)
            ));
        }
        lines.push("];".to_string());
        lines.push(String::new());

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_mapping() {
        assert_eq!(SitesPhpGenerator::default().generate().unwrap(), "<?php\n\n$sites = [];\n");
        assert_eq!(
            SitesPhpGenerator::default()
                .env_var_name_pattern(ORIGINAL_PATTERN)
                .generate()
                .unwrap(),
            "<?php\n\n$sites = [];\n"
        );
    }

    #[test]
    fn test_generate() {
        let mapping = json!({"site_a": "my-domain-a.hu", "site_b": "my-domain-b.hu"});
        let generator = SitesPhpGenerator::new(mapping.as_object().unwrap().clone())
            .env_var_name_pattern("WS_HOST_{{ upper }}");

        let expected = [
            "<?php",
            "",
            "$sites = [",
            "  getenv('WS_HOST_SITE_A') => 'my-domain-a.hu',",
            "  getenv('WS_HOST_SITE_B') => 'my-domain-b.hu',",
            "];",
            "",
        ]
        .join("\n");
        assert_eq!(generator.generate().unwrap(), expected);
    }

    #[test]
    fn test_env_var_name() {
        let generator = SitesPhpGenerator::default();
        assert_eq!(generator.env_var_name("a").unwrap(), "A");

        let generator = generator.env_var_name_pattern("");
        assert_eq!(generator.env_var_name("a").unwrap(), "a");

        let generator = generator.env_var_name_pattern("X_{{ original }}_{{ upper }}");
        assert_eq!(generator.env_var_name("ab").unwrap(), "X_ab_AB");
    }
}
