//! Weights export and resume

use anyhow::Result;
use simplepg::{
    env::{cartpole::CartPole, point::Point},
    error::PgError,
    policy::{CategoricalSoftmax, GaussianLinear, PolicyWeights},
    train::pg::{PgConfig, PgTrainer},
    utils::Matrix,
};
use tempfile::NamedTempFile;

#[test]
fn test_checkpoint_roundtrip_and_resume() -> Result<()> {
    let config = PgConfig::new().batch_size(100).n_itrs(2);
    let mut trainer = PgTrainer::new(config.clone(), CategoricalSoftmax, CartPole::new(42))?;
    trainer.train()?;

    let temp_file = NamedTempFile::new()?;
    trainer.weights("CartPole-v0").save_json(temp_file.path())?;

    let loaded = PolicyWeights::load_json(temp_file.path())?;
    assert_eq!(loaded.env_id, "CartPole-v0");
    assert_eq!(loaded.obs_dim, 4);
    assert_eq!(loaded.action_dim, 2);
    assert_eq!(&loaded.to_theta()?, trainer.theta());

    let mut resumed = PgTrainer::new(config, CategoricalSoftmax, CartPole::new(42))?
        .with_theta(loaded.to_theta()?);
    resumed.initialize()?;
    assert_eq!(resumed.theta(), trainer.theta());
    assert_eq!(resumed.iteration(), 0);
    Ok(())
}

#[test]
fn test_weights_for_wrong_environment_rejected() -> Result<()> {
    // CartPole-shaped θ is (2, 5); Point needs (2, 3)
    let cartpole_theta = Matrix::zeros(2, 5);
    let config = PgConfig::new().batch_size(10).n_itrs(1);
    let mut trainer =
        PgTrainer::new(config, GaussianLinear, Point::new(0))?.with_theta(cartpole_theta);

    let err = trainer.initialize().unwrap_err();
    assert!(matches!(err.downcast_ref::<PgError>(), Some(PgError::DimensionMismatch { .. })));
    Ok(())
}

#[test]
fn test_truncated_weights_file_rejected() -> Result<()> {
    let temp_file = NamedTempFile::new()?;
    std::fs::write(
        temp_file.path(),
        r#"{ "env_id": "Point-v0", "obs_dim": 2, "action_dim": 2, "theta": [0.1, 0.2] }"#,
    )?;
    assert!(PolicyWeights::load_json(temp_file.path()).is_err());
    Ok(())
}
