//! runrelay: drives asynchronous assistant runs to completion.
//!
//! A chat turn is modelled by the engine as a long-running run over a
//! conversation thread. The relay submits the user message, starts the run,
//! polls it on a bounded backoff schedule, executes any tool calls the run
//! asks for through an external action router, submits their outputs, and
//! finally returns the assistant's answer together with an audit trail of
//! every tool call.
//!
//! # Quick Start
//!
//! ```no_run
//! use runrelay::prelude::*;
//!
//! # async fn example() -> runrelay::error::Result<()> {
//! let config = RelayConfig::load(None)?;
//! let orchestrator = RunOrchestrator::from_config(&config)?;
//! let outcome = orchestrator
//!     .handle_turn(&TurnRequest::builder().message("What is on my task list?").build())
//!     .await?;
//! println!("{}", outcome.response);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod recorder;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;
