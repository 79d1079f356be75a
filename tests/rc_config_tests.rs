use std::env;
use std::fs;

use serial_test::serial;

use plotopt::config::{CONFIG_DIR_ENV_KEY, RC_ENV_KEY, RC_FILE_NAME, config_dir, config_file};
use plotopt::config::RcParams;
use plotopt::OptionValue;

fn clear_env() {
    // set_var/remove_var are unsafe in edition 2024; #[serial] keeps these
    // tests from racing each other over process environment.
    unsafe {
        env::remove_var(RC_ENV_KEY);
        env::remove_var(CONFIG_DIR_ENV_KEY);
    }
}

#[test]
#[serial]
fn configdir_env_overrides_the_platform_dir() {
    clear_env();
    unsafe {
        env::set_var(CONFIG_DIR_ENV_KEY, "/opt/plotopt-config");
    }
    assert_eq!(
        config_dir(),
        Some(std::path::PathBuf::from("/opt/plotopt-config"))
    );
    clear_env();
}

#[test]
#[serial]
fn rc_env_accepts_a_file_path() {
    clear_env();
    let workdir = tempfile::tempdir().expect("tempdir");
    let rc_path = workdir.path().join("custom.toml");
    fs::write(&rc_path, "auto_draw = false\n").expect("rc file");

    unsafe {
        env::set_var(RC_ENV_KEY, &rc_path);
        // point the configdir fallback somewhere empty so it cannot shadow
        env::set_var(CONFIG_DIR_ENV_KEY, workdir.path());
    }
    assert_eq!(config_file(), Some(rc_path));
    clear_env();
}

#[test]
#[serial]
fn rc_env_accepts_a_directory_containing_the_rc_file() {
    clear_env();
    let workdir = tempfile::tempdir().expect("tempdir");
    let rc_path = workdir.path().join(RC_FILE_NAME);
    fs::write(&rc_path, "auto_show = true\n").expect("rc file");

    unsafe {
        env::set_var(RC_ENV_KEY, workdir.path());
    }
    assert_eq!(config_file(), Some(rc_path));
    clear_env();
}

#[test]
#[serial]
fn configdir_rc_file_is_the_last_fallback() {
    clear_env();
    let workdir = tempfile::tempdir().expect("tempdir");
    let rc_path = workdir.path().join(RC_FILE_NAME);
    fs::write(&rc_path, "auto_show = true\n").expect("rc file");

    unsafe {
        env::set_var(CONFIG_DIR_ENV_KEY, workdir.path());
    }
    assert_eq!(config_file(), Some(rc_path));
    clear_env();
}

#[test]
#[serial]
fn missing_rc_file_resolves_to_none() {
    clear_env();
    let workdir = tempfile::tempdir().expect("tempdir");
    unsafe {
        env::set_var(CONFIG_DIR_ENV_KEY, workdir.path());
    }
    assert_eq!(config_file(), None);
    clear_env();
}

#[test]
#[serial]
fn load_default_merges_the_resolved_rc_file() {
    clear_env();
    let workdir = tempfile::tempdir().expect("tempdir");
    let rc_path = workdir.path().join(RC_FILE_NAME);
    fs::write(
        &rc_path,
        "auto_draw = false\n\n[project]\nauto_update = false\n\n[plugin.mapplot]\ncmap = \"plasma\"\n",
    )
    .expect("rc file");

    unsafe {
        env::set_var(RC_ENV_KEY, &rc_path);
    }
    let params = RcParams::load_default().expect("load");
    clear_env();

    assert!(!params.bool_or("auto_draw", true));
    assert!(!params.bool_or("project.auto_update", true));
    // untouched defaults survive the merge
    assert!(!params.bool_or("auto_show", true));
    // unknown keys are kept for plugins
    assert_eq!(
        params.get("plugin.mapplot.cmap"),
        Some(&OptionValue::from("plasma"))
    );
}

#[test]
#[serial]
fn load_file_reads_an_explicit_path() {
    clear_env();
    let workdir = tempfile::tempdir().expect("tempdir");
    let rc_path = workdir.path().join("elsewhere.toml");
    fs::write(&rc_path, "auto_show = true\nlevels = [10, 20, 30]\n").expect("rc file");

    let params = RcParams::load_file(&rc_path).expect("load");
    assert!(params.bool_or("auto_show", false));
    assert_eq!(
        params.get("levels"),
        Some(&OptionValue::List(vec![
            OptionValue::Int(10),
            OptionValue::Int(20),
            OptionValue::Int(30),
        ]))
    );
}

#[test]
#[serial]
fn malformed_toml_surfaces_a_config_error() {
    clear_env();
    let workdir = tempfile::tempdir().expect("tempdir");
    let rc_path = workdir.path().join("broken.toml");
    fs::write(&rc_path, "auto_draw = [unclosed\n").expect("rc file");

    let err = RcParams::load_file(&rc_path).unwrap_err();
    assert!(matches!(err, plotopt::PlotError::Config(_)));
}
