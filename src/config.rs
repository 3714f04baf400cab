use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_manager_agent_id() -> String {
    "6999679c3f15947a386b5b1e".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_title_max_chars() -> usize {
    40
}

fn default_preview_max_chars() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub agent: AgentConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_manager_agent_id")]
    pub manager_agent_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_roster")]
    pub roster: Vec<AgentInfo>,
}

/// One entry of the agent pipeline shown in the sidebar.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub provider: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    #[serde(default)]
    pub sample_data: bool,
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
    #[serde(default = "default_preview_max_chars")]
    pub preview_max_chars: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 1100,
            height: 760,
            min_width: 640,
            min_height: 420,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            sample_data: false,
            title_max_chars: default_title_max_chars(),
            preview_max_chars: default_preview_max_chars(),
        }
    }
}

fn default_roster() -> Vec<AgentInfo> {
    vec![
        AgentInfo {
            id: default_manager_agent_id(),
            name: "Research Coordinator".to_string(),
            role: "Manager - coordinates sub-agents".to_string(),
            provider: "OpenAI / gpt-4.1".to_string(),
        },
        AgentInfo {
            id: "69996776771423cce61cd012".to_string(),
            name: "Web Research Agent".to_string(),
            role: "Sub-agent - web search".to_string(),
            provider: "Perplexity / sonar-pro".to_string(),
        },
        AgentInfo {
            id: "699967889f3636d6dd80970f".to_string(),
            name: "ArXiv Research Agent".to_string(),
            role: "Sub-agent - academic papers".to_string(),
            provider: "OpenAI / gpt-4.1".to_string(),
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            agent: AgentConfig {
                endpoint: "http://localhost:8080/api/agent".to_string(),
                api_key: None,
                manager_agent_id: default_manager_agent_id(),
                timeout_secs: default_timeout_secs(),
                roster: default_roster(),
            },
            window: WindowConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        let mut config = if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match Self::from_toml(&contents) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("[Config] Error parsing {}: {}. Using defaults.", config_path.display(), e);
                        Config::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("[Config] Error reading {}: {}. Using defaults.", config_path.display(), e);
                    Config::default()
                }
            }
        } else {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Environment wins over the file for the endpoint and the API key.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("PROAI_AGENT_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            self.agent.endpoint = endpoint;
        }
        if let Some(key) = lookup("PROAI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.agent.api_key = Some(key);
        }
    }

    pub fn get_config_path() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/pro-ai/config.toml")
        } else {
            PathBuf::from("config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [agent]
            endpoint = "https://agents.example.com/chat"

            [window]
            width = 900
            height = 700
            min_width = 400
            min_height = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.endpoint, "https://agents.example.com/chat");
        assert_eq!(config.agent.manager_agent_id, "6999679c3f15947a386b5b1e");
        assert_eq!(config.agent.roster.len(), 3);
        assert_eq!(config.agent.timeout_secs, 300);
        assert!(!config.ui.sample_data);
        assert_eq!(config.ui.title_max_chars, 40);
        assert_eq!(config.ui.preview_max_chars, 50);
    }

    #[test]
    fn test_agent_section_alone_is_enough() {
        let config = Config::from_toml(
            r#"
            [agent]
            endpoint = "https://agents.example.com/chat"
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.endpoint, "https://agents.example.com/chat");
        assert_eq!(config.window.width, 1100);
        assert_eq!(config.window.min_height, 420);
    }

    #[test]
    fn test_custom_roster() {
        let config = Config::from_toml(
            r#"
            [agent]
            endpoint = "http://localhost:9000"
            manager_agent_id = "lead"

            [[agent.roster]]
            id = "lead"
            name = "Lead"
            role = "Manager"

            [window]
            width = 900
            height = 700
            min_width = 400
            min_height = 300

            [ui]
            sample_data = true
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.roster.len(), 1);
        assert_eq!(config.agent.roster[0].provider, "");
        assert!(config.ui.sample_data);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("[agent\nendpoint = 1").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            "PROAI_AGENT_ENDPOINT" => Some("https://override.example.com".to_string()),
            "PROAI_API_KEY" => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.agent.endpoint, "https://override.example.com");
        assert_eq!(config.agent.api_key.as_deref(), Some("secret"));

        let mut untouched = Config::default();
        untouched.apply_env_overrides(|_| Some("   ".to_string()));
        assert_eq!(untouched.agent.endpoint, Config::default().agent.endpoint);
        assert!(untouched.agent.api_key.is_none());
    }
}
