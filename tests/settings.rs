mod support;

use std::path::PathBuf;

use macadvisor::config::{self, CONFIG_FILE_NAME, Settings};
use macadvisor::ml::TrainOptions;
use support::env::MacadvisorEnvGuard;
use tempfile::tempdir;

#[test]
fn defaults_apply_when_app_dir_has_no_file() {
    let dir = tempdir().unwrap();
    let _guard = MacadvisorEnvGuard::set_home(dir.path().to_path_buf());
    let settings = config::load_or_default(None).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.generate.count, 2000);
    assert_eq!(TrainOptions::from(&settings.training), TrainOptions::default());
}

#[test]
fn app_dir_file_is_picked_up() {
    let dir = tempdir().unwrap();
    let _guard = MacadvisorEnvGuard::set_home(dir.path().to_path_buf());
    let path = config::config_path().unwrap();
    assert!(path.starts_with(dir.path()));
    std::fs::write(&path, "dataset_path = \"data/profiles.csv\"\n[generate]\ncount = 150\n")
        .unwrap();

    let settings = config::load_or_default(None).unwrap();
    assert_eq!(settings.dataset_path, PathBuf::from("data/profiles.csv"));
    assert_eq!(settings.generate.count, 150);
    assert_eq!(settings.generate.seed, 42);
}

#[test]
fn explicit_file_wins_over_app_dir() {
    let home = tempdir().unwrap();
    let _guard = MacadvisorEnvGuard::set_home(home.path().to_path_buf());
    std::fs::write(
        config::config_path().unwrap(),
        "model_path = \"from-home.bin\"\n",
    )
    .unwrap();
    let other = tempdir().unwrap();
    let explicit = other.path().join(CONFIG_FILE_NAME);
    std::fs::write(&explicit, "model_path = \"explicit.bin\"\n[explain]\ntop_k = 3\n").unwrap();

    let settings = config::load_or_default(Some(&explicit)).unwrap();
    assert_eq!(settings.model_path, PathBuf::from("explicit.bin"));
    assert_eq!(settings.explain.top_k, 3);
}
