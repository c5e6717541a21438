//! Schedule translation, position advancement, and periodic jobs for
//! persona movement.
//!
//! This crate turns each character's daily schedule into movement on the
//! tile map. Two jobs drive it: a slow translate job that converts the
//! current activity into a stored path, and a fast advance job that moves
//! every character along that path as wall-clock time passes.
//!
//! # Modules
//!
//! - [`advancer`] -- Path phase and tile-at-time computation.
//! - [`config`] -- Configuration loading from `persona-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- [`JobControl`] pause, resume, and stop signals.
//! - [`locks`] -- Per-character mutual exclusion between the jobs.
//! - [`runner`] -- The periodic advance and translate loops.
//! - [`schedule`] -- [`ScheduleSource`] trait and
//!   [`StaticScheduleSource`].
//! - [`service`] -- [`MovementService`], the operations callers use.
//! - [`translator`] -- Activity-to-path translation.
//!
//! [`JobControl`]: control::JobControl
//! [`ScheduleSource`]: schedule::ScheduleSource
//! [`StaticScheduleSource`]: schedule::StaticScheduleSource
//! [`MovementService`]: service::MovementService

pub mod advancer;
pub mod config;
pub mod control;
pub mod error;
pub mod locks;
pub mod runner;
pub mod schedule;
pub mod service;
pub mod translator;

pub use error::CoreError;
pub use service::{BatchReport, MovementService};
