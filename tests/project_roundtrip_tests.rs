use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;

use plotopt::registry::DataArity;
use plotopt::render::NullBackend;
use plotopt::{
    DataArray, DimSelection, OptionSpec, OptionValue, PlotError, PlotMethod, PlotMethodRegistry,
    PlotterSchema, Project, UpdateStage,
};
use plotopt::core::DataSelection;

fn map_schema() -> Arc<PlotterSchema> {
    Arc::new(
        PlotterSchema::builder()
            .option(OptionSpec::new("lonlatbox", UpdateStage::Data, 0i64))
            .option(
                OptionSpec::new("cmap", UpdateStage::Plotting, "viridis")
                    .with_dependencies(&["lonlatbox"]),
            )
            .option(OptionSpec::new("title", UpdateStage::Labeling, ""))
            .build()
            .expect("map schema"),
    )
}

fn map_registry() -> PlotMethodRegistry {
    let mut registry = PlotMethodRegistry::new();
    registry
        .register(PlotMethod::new("mapplot", map_schema(), DataArity::Single))
        .expect("register mapplot");
    registry
}

fn temperature(source: &std::path::Path) -> DataArray {
    DataArray::new("t2m")
        .with_dim("time", 4)
        .with_dim("lat", 96)
        .with_source(source)
        .with_values(vec![271.5, 288.2, 290.0, 275.1])
}

#[test]
fn save_and_load_reproduce_option_values() {
    let workdir = tempfile::tempdir().expect("tempdir");
    let source = workdir.path().join("t2m.nc");
    fs::write(&source, b"netcdf stand-in").expect("source file");
    let project_file = workdir.path().join("project.json");

    let registry = map_registry();
    let mut project = Project::new();
    let mut plotter = registry
        .create_plotter(
            "mapplot",
            temperature(&source),
            DataSelection::Array {
                selection: DimSelection::new().select("time", 2),
            },
            NullBackend::default(),
        )
        .expect("plotter");
    plotter.initialize().expect("initialize");
    let mut batch = IndexMap::new();
    batch.insert("cmap".to_owned(), OptionValue::from("plasma"));
    batch.insert("title".to_owned(), OptionValue::from("2m temperature"));
    plotter.update(batch).expect("update");
    project.attach("mapplot", plotter);

    project.save(&project_file).expect("save");

    let restored = Project::load(
        &project_file,
        &registry,
        NullBackend::default,
        &HashMap::new(),
    )
    .expect("load");

    assert_eq!(restored.len(), 1);
    let entry = restored.entry(0).expect("entry");
    assert_eq!(entry.plot_method(), "mapplot");
    let plotter = entry.plotter();
    assert_eq!(
        plotter.value("cmap").expect("cmap"),
        &OptionValue::from("plasma")
    );
    assert_eq!(
        plotter.value("title").expect("title"),
        &OptionValue::from("2m temperature")
    );
    assert_eq!(
        plotter.value("lonlatbox").expect("lonlatbox"),
        &OptionValue::Int(0)
    );
    assert_eq!(
        plotter.selection(),
        &DataSelection::Array {
            selection: DimSelection::new().select("time", 2),
        }
    );
    // values are never persisted, only the source reference
    for array in plotter.data().arrays() {
        assert!(array.values().is_empty());
        assert_eq!(array.source(), Some(source.as_path()));
    }
    // each restored plotter was brought current exactly once
    assert!(!plotter.is_dirty());
    assert_eq!(plotter.backend().replots, 1);
}

#[test]
fn loading_with_a_vanished_source_names_the_path() {
    let workdir = tempfile::tempdir().expect("tempdir");
    let source = workdir.path().join("t2m.nc");
    fs::write(&source, b"netcdf stand-in").expect("source file");
    let project_file = workdir.path().join("project.json");

    let registry = map_registry();
    let mut project = Project::new();
    let plotter = registry
        .create_plotter(
            "mapplot",
            temperature(&source),
            DataSelection::Array {
                selection: DimSelection::new(),
            },
            NullBackend::default(),
        )
        .expect("plotter");
    project.attach("mapplot", plotter);
    project.save(&project_file).expect("save");

    fs::remove_file(&source).expect("remove source");

    let err = Project::load(
        &project_file,
        &registry,
        NullBackend::default,
        &HashMap::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PlotError::MissingSourceFile { path } if path == source
    ));
}

#[test]
fn alternative_paths_remap_moved_sources() {
    let workdir = tempfile::tempdir().expect("tempdir");
    let old_source = workdir.path().join("t2m.nc");
    fs::write(&old_source, b"netcdf stand-in").expect("source file");
    let project_file = workdir.path().join("project.json");

    let registry = map_registry();
    let mut project = Project::new();
    let plotter = registry
        .create_plotter(
            "mapplot",
            temperature(&old_source),
            DataSelection::Array {
                selection: DimSelection::new(),
            },
            NullBackend::default(),
        )
        .expect("plotter");
    project.attach("mapplot", plotter);
    project.save(&project_file).expect("save");

    // simulate the dataset moving between save and load
    let new_source = workdir.path().join("archive").join("t2m.nc");
    fs::create_dir_all(new_source.parent().expect("parent")).expect("archive dir");
    fs::rename(&old_source, &new_source).expect("move source");

    let mut alternative_paths = HashMap::new();
    alternative_paths.insert(old_source.clone(), new_source.clone());
    let restored = Project::load(
        &project_file,
        &registry,
        NullBackend::default,
        &alternative_paths,
    )
    .expect("load with remap");

    let arrays: Vec<&DataArray> = restored
        .entry(0)
        .expect("entry")
        .plotter()
        .data()
        .arrays()
        .collect();
    assert_eq!(arrays[0].source(), Some(new_source.as_path()));
}

#[test]
fn unknown_plot_method_in_state_fails_the_load() {
    let workdir = tempfile::tempdir().expect("tempdir");
    let project_file = workdir.path().join("project.json");

    let registry = map_registry();
    let mut project = Project::new();
    let plotter = registry
        .create_plotter(
            "mapplot",
            DataArray::new("t2m"),
            DataSelection::Array {
                selection: DimSelection::new(),
            },
            NullBackend::default(),
        )
        .expect("plotter");
    project.attach("mapplot", plotter);
    project.save(&project_file).expect("save");

    let empty_registry = PlotMethodRegistry::new();
    let err = Project::load(
        &project_file,
        &empty_registry,
        NullBackend::default,
        &HashMap::new(),
    )
    .unwrap_err();
    assert!(matches!(err, PlotError::UnknownPlotMethod { name } if name == "mapplot"));
}

#[test]
fn deferred_project_updates_flush_in_one_pass() {
    let registry = map_registry();
    let mut project = Project::new();
    for _ in 0..2 {
        let mut plotter = registry
            .create_plotter(
                "mapplot",
                DataArray::new("t2m"),
                DataSelection::Array {
                    selection: DimSelection::new(),
                },
                NullBackend::default(),
            )
            .expect("plotter");
        plotter.initialize().expect("initialize");
        project.attach("mapplot", plotter);
    }
    project.set_auto_update(false);

    let mut batch = IndexMap::new();
    batch.insert("cmap".to_owned(), OptionValue::from("plasma"));
    let registered = project.update_all(&batch).expect("register");
    assert!(registered.iter().all(Option::is_none));
    for entry in project.entries() {
        assert_eq!(entry.plotter().backend().replots, 1);
    }

    let reports = project.start_update().expect("flush");
    for report in reports {
        let report = report.expect("flushed report");
        assert_eq!(report.applied, vec!["cmap".to_owned()]);
    }
    for entry in project.entries() {
        assert_eq!(entry.plotter().backend().replots, 2);
    }
}

#[test]
fn close_releases_the_entry() {
    let registry = map_registry();
    let mut project = Project::new();
    let plotter = registry
        .create_plotter(
            "mapplot",
            DataArray::new("t2m"),
            DataSelection::Array {
                selection: DimSelection::new(),
            },
            NullBackend::default(),
        )
        .expect("plotter");
    project.attach("mapplot", plotter);

    assert!(project.close(1).is_none());
    let closed = project.close(0).expect("closed entry");
    assert_eq!(closed.plot_method(), "mapplot");
    assert!(project.is_empty());
}

#[test]
fn state_files_are_versioned_json() {
    let workdir = tempfile::tempdir().expect("tempdir");
    let project_file = workdir.path().join("project.json");
    let project: Project<NullBackend> = Project::new();
    project.save(&project_file).expect("save");

    let raw = fs::read_to_string(&project_file).expect("read");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(
        value["format_version"],
        serde_json::json!(plotopt::project::STATE_FORMAT_VERSION)
    );
    assert!(PathBuf::from(&project_file).exists());
}
