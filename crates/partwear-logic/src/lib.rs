//! Pure reliability logic for PartWear.
//!
//! This crate contains the wear, failure and repair rules that are
//! independent of any ECS or host game. Functions take plain data, and
//! every random roll takes an injected [`rand::Rng`], so the whole model is
//! unit-testable with a seeded generator.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cost`] | Part price from component quality |
//! | [`curve`] | De Casteljau Bezier evaluation, quality → lifetime curve |
//! | [`decay`] | Drain per check, activity gates, check timer |
//! | [`failure`] | Failure chances, rolls, kind selection, decoupler staging |
//! | [`fleet`] | Vessel-wide instrument aggregation and display inaccuracy |
//! | [`reliability`] | Per-component state, component and failure kinds |
//! | [`repair`] | Repair resource, kicks, maintenance, leaks, flickering |
//! | [`schema`] | Flat key-value field list for host persistence |
//! | [`tuning`] | Per-component tunables and session settings |

pub mod cost;
pub mod curve;
pub mod decay;
pub mod failure;
pub mod fleet;
pub mod reliability;
pub mod repair;
pub mod schema;
pub mod tuning;
