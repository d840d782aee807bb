//! Layout configuration.
//!
//! Every field has a default, and `#[serde(default)]` lets a partial JSON
//! document override only what it names:
//!
//! ```
//! let opts: crabdraw::Options = serde_json::from_str(r#"{ "bond_length": 25.0 }"#).unwrap();
//! assert_eq!(opts.bond_length, 25.0);
//! assert_eq!(opts.overlap_sensitivity, 0.42);
//! ```

use serde::{Deserialize, Serialize};

use crate::kamada_kawai::KkParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Target length of every drawn bond.
    pub bond_length: f64,
    /// Per-vertex overlap score above which a vertex counts as crowded.
    pub overlap_sensitivity: f64,
    /// Number of backbone rotation sweeps after the primary pass.
    pub overlap_resolution_iterations: usize,
    /// Rotation applied to crowded terminal atoms, in degrees.
    pub terminal_push_angle: f64,
    pub finetune: bool,
    pub finetune_max_steps: usize,
    pub finetune_max_duration_ms: u64,
    /// Angular step of the finetune sweep, in degrees.
    pub rotation_snap_increment: f64,
    /// Added to the best finetune step before it is applied, in degrees.
    pub finetune_rotation_offset: f64,
    pub kk_threshold: f64,
    pub kk_inner_threshold: f64,
    pub kk_max_iteration: usize,
    pub kk_max_inner_iteration: usize,
    pub kk_max_energy: f64,
    /// Radius, in bond lengths, of the neighbourhood whose center of mass
    /// steers chains leaving a ring.
    pub center_of_mass_radius_factor: f64,
    /// Upper bound for diagnostic cycle enumeration.
    pub max_cycle_length: Option<usize>,
    /// Horizontal gap between disconnected fragments, in bond lengths.
    pub fragment_spacing: f64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            bond_length: 30.0,
            overlap_sensitivity: 0.42,
            overlap_resolution_iterations: 1,
            terminal_push_angle: 20.0,
            finetune: true,
            finetune_max_steps: 24,
            finetune_max_duration_ms: 100,
            rotation_snap_increment: 30.0,
            finetune_rotation_offset: 2.0,
            kk_threshold: 0.1,
            kk_inner_threshold: 0.1,
            kk_max_iteration: 20000,
            kk_max_inner_iteration: 50,
            kk_max_energy: 1e9,
            center_of_mass_radius_factor: 2.0,
            max_cycle_length: None,
            fragment_spacing: 2.0,
        }
    }
}

impl Options {
    pub fn kk_params(&self) -> KkParams {
        KkParams {
            threshold: self.kk_threshold,
            inner_threshold: self.kk_inner_threshold,
            max_iteration: self.kk_max_iteration,
            max_inner_iteration: self.kk_max_inner_iteration,
            max_energy: self.kk_max_energy,
        }
    }
}
