//! Export/import of trained policy parameters

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::PolicyDims;
use crate::{error::PgError, utils::Matrix};

/// Trained θ together with the environment it was fitted on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyWeights {
    /// Environment identifier
    pub env_id: String,
    /// Observation dimensionality `S`
    pub obs_dim: usize,
    /// Action dimensionality `A`
    pub action_dim: usize,
    /// θ flattened row-major, `A * (S + 1)` entries
    pub theta: Vec<f64>,
}

impl PolicyWeights {
    /// Snapshot a parameter matrix
    pub fn from_theta(env_id: impl Into<String>, theta: &Matrix) -> Self {
        Self {
            env_id: env_id.into(),
            obs_dim: theta.cols().saturating_sub(1),
            action_dim: theta.rows(),
            theta: theta.as_slice().to_vec(),
        }
    }

    /// Dimensions the weights were trained with
    pub fn dims(&self) -> PolicyDims {
        PolicyDims { obs_dim: self.obs_dim, action_dim: self.action_dim }
    }

    /// Rebuild the parameter matrix
    pub fn to_theta(&self) -> Result<Matrix, PgError> {
        let (rows, cols) = self.dims().theta_shape();
        Matrix::from_vec(rows, cols, self.theta.clone())
    }

    /// Save weights to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load weights from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let weights: Self = serde_json::from_str(&contents)?;
        weights.to_theta()?;
        Ok(weights)
    }
}
