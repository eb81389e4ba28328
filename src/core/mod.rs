//! # Core Session Logic
//!
//! Decides what every event *means*. It knows nothing about terminals,
//! timers, audio devices or the script engine.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Session (loop state) │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • Command (scripts)    │
//!                    │                         │
//!                    │  Reducer does no I/O.   │
//!                    └───────────┬─────────────┘
//!                                │ Effect
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │ Evaluator  │      │   Input    │      │   Audio    │
//!     │  (rhai)    │      │(crossterm) │      │  (rodio)   │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `Session`, `Phase` and `ExitReason`
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`command`]: `Direction` and the script snippets sent per action
//! - [`config`]: layered settings

pub mod action;
pub mod command;
pub mod config;
pub mod state;
