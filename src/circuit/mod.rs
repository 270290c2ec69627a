//! Circuit-level garbling, evaluation and verification.
//!
//! ```text
//! BooleanCircuit ──garble──▶ GarbledCircuit ──evaluate──▶ output keys ──translate──▶ bits
//!        │                        │   ▲
//!        │                        │   └── set_garbled_tables / set_translation_table
//!        └──── CircuitCreationValues (both keys of inputs and outputs)
//!                                 │
//!                     verify ◀────┘  (opened garblings in cut-and-choose)
//! ```
//!
//! Gates are processed in levels: every gate of a level only reads wires
//! produced by circuit inputs or by earlier levels. With
//! [`Parallelism::Levels`] the gates of a level run on a rayon pool and are
//! joined before the next level starts.

pub mod commitment;
mod config;
mod errors;
mod evaluation;
mod garbled;
mod garbling;
mod structure;
mod translate;
mod verification;

pub use commitment::{LabelCommit, OutputCommitments};
pub use config::{Config, Parallelism};
pub use errors::CircuitError;
pub use evaluation::CircuitEvaluator;
pub use garbled::{ActiveKeys, CircuitCreationValues, GarbledCircuit};
pub use garbling::{CircuitGarbler, Seed};
pub use structure::BooleanCircuit;
pub use translate::{translate, translate_committed, verified_translate};
pub use verification::CircuitVerifier;
