//! Intake — resumable conversational data-collection engine.
//!
//! An ordered registry of steps, each turning one raw user input into one
//! validated data fragment, driven by a [`flow::Flow`] orchestrator whose
//! state is persisted to a [`session::SessionStore`] between suspension
//! points. Steps compose with cancel/skip/bounded-retry plugins through the
//! [`form::FormStep`] builder.

pub mod config;
pub mod error;
pub mod event;
pub mod flow;
pub mod form;
pub mod plugin;
pub mod session;
pub mod step;
pub mod steps;
