//! The agentic control loop at the heart of Lariat.
//!
//! One run follows a **dispatch → parse → execute → observe** cycle:
//!
//! 1. **Assemble** the first prompt (protocol instructions + user text)
//! 2. **Dispatch** it to the streaming backend, forwarding partial replies
//! 3. **Parse** the consolidated reply for a trailing tool-call block
//! 4. **If a tool is requested**: execute it, fold the observation into the
//!    next prompt, back off briefly, loop back to step 2
//! 5. **If not**: the reply is the final answer
//!
//! The loop continues until the model stops requesting tools, the loop
//! budget runs out, or the run is cancelled. Cancellation is cooperative
//! and silent: a cancelled run writes no further history and never calls
//! the notification sink again.

pub mod assembler;
pub mod follow_up;
pub mod loop_runner;
pub mod registry;
pub mod tool_call;

pub use assembler::ProtocolAssembler;
pub use follow_up::FollowUpSuggester;
pub use loop_runner::{AgentLoop, LoopHandle};
pub use registry::LoopRegistry;
pub use tool_call::parse_tool_call;
