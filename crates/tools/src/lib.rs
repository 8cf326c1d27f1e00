//! # Lariat Tools
//!
//! Tool routing and execution. An invocation parsed from model output is
//! resolved by name: members of the fixed capability registry run on the
//! privileged browser backend, everything else goes to the remote tool
//! server, gated by the run's allow-list policy.
//!
//! Execution never fails outward. Every refusal, missing backend, and
//! backend error is rendered as observation text in a normal result, so
//! the agent loop always has something to feed back to the model.

pub mod invoker;
pub mod remote;

pub use invoker::{RemoteToolPolicy, ToolAccess, ToolInvoker};
pub use remote::HttpRemoteBackend;
