//! The fixed set of privileged browser-side operations.
//!
//! These run with page access on the client itself, so the set is closed:
//! a name either resolves to a known capability or the invocation is routed
//! to the remote tool domain instead.

use serde::{Deserialize, Serialize};

/// A privileged browser-side operation the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Load a URL in the active tab
    Navigate,
    /// Click the element identified in the arguments
    Click,
    /// Type text into the focused or identified element
    TypeText,
    /// Press a single key or chord
    PressKey,
    /// Scroll the page or an element
    Scroll,
    /// Capture an accessibility snapshot of the page
    TakeSnapshot,
    /// Capture a screenshot of the visible viewport
    TakeScreenshot,
    /// Read recent console log entries
    ReadConsoleLogs,
    /// List the open tabs
    ListTabs,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::Navigate,
        Capability::Click,
        Capability::TypeText,
        Capability::PressKey,
        Capability::Scroll,
        Capability::TakeSnapshot,
        Capability::TakeScreenshot,
        Capability::ReadConsoleLogs,
        Capability::ListTabs,
    ];

    /// Resolve a tool name from model output. `None` means the name is not a
    /// local capability (it may still be a valid remote tool).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "navigate" => Some(Self::Navigate),
            "click" => Some(Self::Click),
            "type_text" => Some(Self::TypeText),
            "press_key" => Some(Self::PressKey),
            "scroll" => Some(Self::Scroll),
            "take_snapshot" => Some(Self::TakeSnapshot),
            "take_screenshot" => Some(Self::TakeScreenshot),
            "read_console_logs" => Some(Self::ReadConsoleLogs),
            "list_tabs" => Some(Self::ListTabs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Click => "click",
            Self::TypeText => "type_text",
            Self::PressKey => "press_key",
            Self::Scroll => "scroll",
            Self::TakeSnapshot => "take_snapshot",
            Self::TakeScreenshot => "take_screenshot",
            Self::ReadConsoleLogs => "read_console_logs",
            Self::ListTabs => "list_tabs",
        }
    }

    /// Read-only capabilities observe the page without changing it. The loop
    /// appends a fresh page snapshot after any capability that is **not** in
    /// this set.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::TakeSnapshot | Self::TakeScreenshot | Self::ReadConsoleLogs | Self::ListTabs
        )
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_capability_round_trips_through_its_name() {
        for cap in Capability::ALL {
            assert_eq!(Capability::from_name(cap.as_str()), Some(cap));
        }
    }

    #[test]
    fn unknown_names_are_not_capabilities() {
        assert_eq!(Capability::from_name("fetch_page"), None);
        assert_eq!(Capability::from_name(""), None);
        assert_eq!(Capability::from_name("Navigate"), None);
    }

    #[test]
    fn mutating_and_read_only_sets_partition_the_registry() {
        let read_only: Vec<_> = Capability::ALL
            .iter()
            .filter(|c| c.is_read_only())
            .collect();
        assert_eq!(read_only.len(), 4);
        assert!(Capability::TakeSnapshot.is_read_only());
        assert!(Capability::ReadConsoleLogs.is_read_only());
        assert!(!Capability::Navigate.is_read_only());
        assert!(!Capability::Click.is_read_only());
        assert!(!Capability::Scroll.is_read_only());
    }
}
