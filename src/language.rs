//! Output language for user-facing strings.
//!
//! Only the two languages the reading app ships with are supported.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Meaning shown when the generator could not produce one
    pub fn no_definition(&self) -> &'static str {
        match self {
            Self::En => "No definition available",
            Self::Zh => "暂无释义信息",
        }
    }

    /// Example shown when the generator could not produce one
    pub fn no_example(&self) -> &'static str {
        match self {
            Self::En => "No example available",
            Self::Zh => "暂无例句信息",
        }
    }

    /// Meaning of a batch item whose lookup failed outright
    pub fn lookup_failed(&self) -> &'static str {
        match self {
            Self::En => "lookup failed",
            Self::Zh => "查询失败",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => f.write_str("en"),
            Self::Zh => f.write_str("zh"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "zh" | "chinese" | "zh-cn" => Ok(Self::Zh),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}
