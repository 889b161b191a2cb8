use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Operations every automation package provides
pub const COMMON_OPERATIONS: &[&str] = &[
    "send_message",
    "send_file",
    "chat_with",
    "get_subwindows",
    "get_messages",
];

/// Operations only the extended package provides
pub const EXTENDED_ONLY_OPERATIONS: &[&str] = &[
    "send_url_card",
    "get_new_friends",
    "accept_new_friend",
    "switch_to_chat_page",
    "switch_to_contact_page",
    "is_online",
];

/// Variant of the messaging automation library deployed next to this service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AutomationPackage {
    #[default]
    Basic,
    Extended,
}

impl AutomationPackage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationPackage::Basic => "basic",
            AutomationPackage::Extended => "extended",
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, AutomationPackage::Extended)
    }

    pub fn description(&self) -> &'static str {
        match self {
            AutomationPackage::Basic => "Open-source edition with the core messaging operations",
            AutomationPackage::Extended => {
                "Extended edition with URL cards, friend requests and page switching"
            }
        }
    }
}

impl fmt::Display for AutomationPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationPackage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(AutomationPackage::Basic),
            "extended" => Ok(AutomationPackage::Extended),
            other => Err(format!(
                "Invalid AUTOMATION_PACKAGE '{}': expected 'basic' or 'extended'",
                other
            )),
        }
    }
}
