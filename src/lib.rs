//! # DayWise
//!
//! A personal day planner for the terminal. Tasks carry a name, a
//! description, an optional due date, a priority and an estimate in hours.
//! DayWise lists them by due status and can ask a language model to
//! suggest a schedule for everything still open.
//!
//! ## Features
//!
//! *   **Due-status lists**: today, upcoming, overdue and completed.
//! *   **Schedule suggestions**: one request to an OpenAI-compatible model,
//!     answered with an ordered list of time slots and the reasoning for each.
//! *   **Two stores**: a local JSON file, or a remote task API keyed by a
//!     device identifier generated on first use.
//!
//! ## Usage
//!
//! ```bash
//! # Add a task
//! daywise add "Write report" --description "Q3 numbers" --priority high --hours 2 --due 2025-12-01
//!
//! # List tasks (add --hide-completed to skip finished ones)
//! daywise list
//!
//! # Complete or reopen a task by id or id prefix
//! daywise toggle 3f2a
//!
//! # Suggest a schedule for every open task
//! daywise schedule
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `config.toml` in the platform config directory
//! (`~/.config/daywise/config.toml` on Linux), or from `--config <path>`:
//!
//! ```toml
//! [store]
//! backend = "remote"            # or "local" (default)
//! endpoint = "https://example.com/tasks.php"
//!
//! [engine]
//! api_url = "https://api.openai.com"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//! ```
//!
//! The local store lives in `~/.local/share/daywise/tasks.json` unless
//! `store.path` or the `DAYWISE_DB` environment variable says otherwise.

pub mod classify;
pub mod commands;
pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod schedule;
pub mod store;

pub use error::{PlannerError, Result, ValidationError};
