//! Default prompt assembly.
//!
//! Builds the first prompt of a run: the tool-protocol instructions the
//! model needs, then the user's text. Embedders with their own framing can
//! swap in any [`PromptAssembler`] instead.

use lariat_core::{
    AssembledPrompt, Capability, PromptAssembler, PromptRequest, RemoteToolMode,
};

/// The assembler shipped with Lariat.
///
/// When the request enables no tools the instruction section collapses to
/// the host preamble (possibly empty) and the model sees the user text
/// as-is.
#[derive(Debug, Clone, Default)]
pub struct ProtocolAssembler {
    preamble: String,
}

impl ProtocolAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host-supplied instruction text placed before the tool protocol.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    fn protocol_instructions(request: &PromptRequest) -> String {
        let mut sections = vec![
            "You can use tools to complete the user's request.".to_string(),
            "To invoke a tool, end your reply with exactly one fenced code block of this form, \
             and write nothing after it:\n\n```json\n{\"tool\": \"<name>\", \"args\": { ... }}\n```"
                .to_string(),
            "You will receive the tool's output as the next message. Invoke one tool at a time. \
             When you have everything you need, reply with the final answer and no tool block."
                .to_string(),
        ];

        if request.enable_browser_control {
            let mut listing = String::from("Browser tools:");
            for capability in Capability::ALL {
                listing.push_str("\n- ");
                listing.push_str(capability_usage(capability));
            }
            sections.push(listing);
        }

        if request.enable_remote_tools {
            match request.remote_tool_mode {
                RemoteToolMode::All => sections.push(
                    "Tools exposed by the connected tool server can be invoked by name the same way."
                        .to_string(),
                ),
                RemoteToolMode::Selected => {
                    let names = request.remote_enabled_tools.join(", ");
                    sections.push(format!(
                        "These tools from the connected tool server are available: {names}. \
                         No other server tool may be invoked."
                    ));
                }
            }
        }

        sections.join("\n\n")
    }
}

impl PromptAssembler for ProtocolAssembler {
    fn assemble(&self, request: &PromptRequest) -> AssembledPrompt {
        let system_instruction = if request.tools_enabled() {
            let protocol = Self::protocol_instructions(request);
            if self.preamble.is_empty() {
                protocol
            } else {
                format!("{}\n\n{}", self.preamble, protocol)
            }
        } else {
            self.preamble.clone()
        };

        AssembledPrompt {
            system_instruction,
            user_prompt: request.text.clone(),
        }
    }
}

fn capability_usage(capability: Capability) -> &'static str {
    match capability {
        Capability::Navigate => r#"navigate {"url": "<absolute url>"}: load a URL in the active tab"#,
        Capability::Click => r#"click {"ref": "<element ref>"}: click an element from the snapshot"#,
        Capability::TypeText => {
            r#"type_text {"ref": "<element ref>", "text": "..."}: type into an element"#
        }
        Capability::PressKey => r#"press_key {"key": "<key or chord>"}: press a key"#,
        Capability::Scroll => r#"scroll {"direction": "up"|"down"}: scroll the page"#,
        Capability::TakeSnapshot => r#"take_snapshot {}: capture an accessibility snapshot of the page"#,
        Capability::TakeScreenshot => r#"take_screenshot {}: capture a screenshot of the viewport"#,
        Capability::ReadConsoleLogs => r#"read_console_logs {}: read recent console output"#,
        Capability::ListTabs => r#"list_tabs {}: list the open tabs"#,
    }
}
