//! # Core Application Logic
//!
//! This module contains easychat's business logic. It knows nothing about
//! any specific UI technology and performs no I/O of its own.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!                ┌───────────────┴───────────────┐
//!                ▼                               ▼
//!         ┌────────────┐                  ┌────────────┐
//!         │    TUI     │                  │    api     │
//!         │  Adapter   │                  │ (effects)  │
//!         │ (ratatui)  │                  │            │
//!         └────────────┘                  └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all client state in one place
//! - [`action`]: The `Action`/`Effect` enums and the `update()` reducer
//! - [`config`]: Client settings with the defaults → file → env → CLI chain

pub mod action;
pub mod config;
pub mod state;
