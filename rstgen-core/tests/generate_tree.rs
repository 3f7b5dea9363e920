use std::collections::BTreeMap;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

use rstgen_core::config::{DocsLayout, GeneratorConfig};
use rstgen_core::contract::GenerateError;
use rstgen_core::generate::generate;
use rstgen_core::rules::ExclusionRules;
use tempfile::{tempdir, TempDir};
use walkdir::WalkDir;

const SHAPES: &str = "import math\n\ndef _helper():\n    return 1\n\ndef area(r):\n    return math.pi * r * r\n\nclass Circle:\n    def __init__(self, r):\n        self.r = r\n";

struct Fixture {
    _tmp: TempDir,
    repo: PathBuf,
}

impl Fixture {
    /// repo/
    ///   README.rst
    ///   docs/partial_source/...      static inputs
    ///   docs/doc_pages.txt
    ///   pkg/general.py
    ///   pkg/geometry/README.rst
    ///   pkg/geometry/shapes/shapes.py
    ///   pkg/geometry/tests/test_shapes.py
    fn new() -> Self {
        let tmp = tempdir().unwrap();
        let repo = tmp.path().join("repo");
        let partial = repo.join("docs/partial_source");
        create_dir_all(partial.join("images")).unwrap();
        fs::write(
            repo.join("README.rst"),
            "Pkg\n===\n\nCheck out the docs_ for more info!\n\n.. image:: docs/partial_source/images/diagram.png\n",
        )
        .unwrap();
        fs::write(partial.join("supported_frameworks.rst"), "\n.. image:: logos/jax.png\n").unwrap();
        fs::write(partial.join("index_prepend.rst"), ".. prelude\n").unwrap();
        fs::write(partial.join("conf.py"), "project = 'Ivy'\n").unwrap();
        fs::write(partial.join("images/diagram.png"), [1u8, 2, 3]).unwrap();
        fs::write(repo.join("docs/doc_pages.txt"), "contributing\nfaq\n").unwrap();

        let pkg = repo.join("pkg");
        create_dir_all(pkg.join("geometry/shapes")).unwrap();
        create_dir_all(pkg.join("geometry/tests")).unwrap();
        fs::write(pkg.join("general.py"), "def top():\n    pass\n").unwrap();
        fs::write(pkg.join("__init__.py"), "").unwrap();
        fs::write(pkg.join("geometry/README.rst"), "Geometry\n========\n\nShapes and angles.\n").unwrap();
        fs::write(pkg.join("geometry/shapes/shapes.py"), SHAPES).unwrap();
        fs::write(pkg.join("geometry/tests/test_shapes.py"), "def test_area():\n    pass\n").unwrap();

        Self { _tmp: tmp, repo }
    }

    fn docs(&self) -> PathBuf {
        self.repo.join("docs")
    }

    fn out(&self) -> PathBuf {
        self.docs().join("autogenerated_source")
    }

    fn write_list(&self, name: &str, lines: &[&str]) {
        let mut contents = String::from("# header\n");
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        fs::write(self.docs().join(name), contents).unwrap();
    }

    fn config(&self, title: Option<&str>) -> Result<GeneratorConfig, GenerateError> {
        let rules = ExclusionRules::with_defaults().load_lists(&self.docs())?;
        GeneratorConfig::new(
            self.repo.join("pkg"),
            DocsLayout::new(self.docs()),
            rules,
            title.map(str::to_string),
        )
    }

    fn read_out(&self, rel: &str) -> String {
        fs::read_to_string(self.out().join(rel))
            .unwrap_or_else(|e| panic!("missing output page {rel}: {e}"))
    }
}

fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

#[test]
fn generates_symbol_module_and_directory_pages() {
    let fx = Fixture::new();
    let report = generate(&fx.config(None).unwrap()).expect("generation should succeed");

    assert_eq!(report.symbol_pages, 3);
    assert_eq!(report.module_pages, 2);
    assert_eq!(report.directory_pages, 2);
    assert_eq!(report.stub_pages, 2);

    let shapes_dir = fx.out().join("geometry/shapes/shapes");
    assert!(shapes_dir.join("area.rst").is_file());
    assert!(shapes_dir.join("Circle.rst").is_file());
    assert!(!shapes_dir.join("_helper.rst").exists());

    let area = fx.read_out("geometry/shapes/shapes/area.rst");
    assert!(area.starts_with("area\n====\n\n.. autofunction:: pkg.geometry.shapes.shapes.area\n"));
    assert!(area.contains(".. image:: ../../../logos/jax.png"));

    let top = fx.read_out("general/top.rst");
    assert!(top.contains(".. image:: ../logos/jax.png"));

    let module = fx.read_out("geometry/shapes/shapes.rst");
    assert!(module.contains(".. automodule:: pkg.geometry.shapes.shapes\n"));
    assert!(module.contains("   shapes/area.rst\n   shapes/Circle.rst\n"));

    let package = fx.read_out("geometry/shapes.rst");
    assert!(package.starts_with("Shapes\n======\n\n.. automodule:: pkg.geometry.shapes\n"));
    assert!(!package.contains("toctree"));

    let geometry = fx.read_out("geometry.rst");
    assert!(geometry.starts_with("Geometry\n========\n\nShapes and angles.\n"));
    assert!(geometry.contains(":caption: Geometry\n\n   geometry/shapes.rst\n"));
}

#[test]
fn excluded_directories_and_modules_produce_nothing() {
    let fx = Fixture::new();
    generate(&fx.config(None).unwrap()).unwrap();

    assert!(!fx.out().join("geometry/tests").exists());
    assert!(!fx.out().join("__init__.rst").exists());
    let all = snapshot(&fx.out());
    assert!(all.keys().all(|p| !p.to_string_lossy().contains("test_shapes")));
    assert!(!fx.read_out("geometry.rst").contains("tests"));
}

#[test]
fn root_index_is_composed_with_directory_groups_and_stubs() {
    let fx = Fixture::new();
    generate(&fx.config(None).unwrap()).unwrap();

    let index = fx.read_out("index.rst");
    assert!(index.starts_with(".. prelude\n\nPkg\n===\n"));
    assert!(!index.contains("Check out the docs_ for more info!"));
    assert!(index.contains(".. image:: _images/diagram.png"));
    assert!(index.contains(":caption: Geometry\n\n   geometry/shapes.rst\n"));
    assert!(index.contains(":caption: Docs\n\n   docs/contributing.rst\n   docs/faq.rst\n"));

    assert_eq!(fx.read_out("docs/faq.rst"), "Faq\n===");
    assert_eq!(fx.read_out("docs/contributing.rst"), "Contributing\n============");
}

#[test]
fn titled_grouping_lists_root_modules_under_the_title() {
    let fx = Fixture::new();
    generate(&fx.config(Some("Functional API")).unwrap()).unwrap();

    let index = fx.read_out("index.rst");
    assert!(index.contains(":caption: Functional API\n\n   general.rst\n"));
    assert!(!index.contains(":caption: Geometry"));
    assert!(index.contains(":caption: Docs\n"));
}

#[test]
fn staging_copies_static_sources_and_sets_project_title() {
    let fx = Fixture::new();
    generate(&fx.config(None).unwrap()).unwrap();

    let conf = fs::read_to_string(fx.docs().join("partial_source/conf.py")).unwrap();
    assert_eq!(conf, "project = 'Pkg'\n");
    assert!(fx.out().join("conf.py").is_file());
    assert!(fx.out().join("supported_frameworks.rst").is_file());
    assert_eq!(
        fs::read(fx.docs().join("build/_images/diagram.png")).unwrap(),
        vec![1u8, 2, 3]
    );
}

#[test]
fn stepped_directory_is_flattened_into_parent() {
    let fx = Fixture::new();
    fx.write_list("submods_to_step.txt", &["geometry/shapes"]);
    let report = generate(&fx.config(None).unwrap()).unwrap();

    assert_eq!(report.directory_pages, 1);
    assert!(!fx.out().join("geometry/shapes.rst").exists());
    assert!(fx.out().join("geometry/shapes/shapes.rst").is_file());
    assert!(fx.out().join("geometry/shapes/shapes/area.rst").is_file());

    let geometry = fx.read_out("geometry.rst");
    assert!(geometry.contains("\n   geometry/shapes/shapes.rst\n"));
    assert!(!geometry.contains("\n   geometry/shapes.rst\n"));
}

#[test]
fn skipped_subtree_contributes_no_pages_or_entries() {
    let fx = Fixture::new();
    fx.write_list("submods_to_skip.txt", &["geometry"]);
    let report = generate(&fx.config(None).unwrap()).unwrap();

    assert_eq!(report.skipped, vec!["geometry".to_string()]);
    assert_eq!(report.symbol_pages, 1);
    assert!(!fx.out().join("geometry").exists());
    assert!(!fx.out().join("geometry.rst").exists());
    assert!(!fx.read_out("index.rst").contains("geometry"));
}

#[test]
fn explicit_order_overrides_sorted_children() {
    let fx = Fixture::new();
    let geometry = fx.repo.join("pkg/geometry");
    fs::write(geometry.join("angles.py"), "def degrees(x):\n    pass\n").unwrap();
    fs::write(geometry.join("vectors.py"), "class Vector:\n    pass\n").unwrap();

    generate(&fx.config(None).unwrap()).unwrap();
    assert!(fx
        .read_out("geometry.rst")
        .contains("   geometry/shapes.rst\n   geometry/angles.rst\n   geometry/vectors.rst\n"));

    fx.write_list("submod_orders.txt", &["(vectors, shapes, angles)"]);
    generate(&fx.config(None).unwrap()).unwrap();
    assert!(fx
        .read_out("geometry.rst")
        .contains("   geometry/vectors.rst\n   geometry/shapes.rst\n   geometry/angles.rst\n"));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let fx = Fixture::new();
    fx.write_list("submod_orders.txt", &["(shapes)"]);
    let config = fx.config(None).unwrap();

    generate(&config).unwrap();
    let first = snapshot(&fx.out());
    generate(&config).unwrap();
    let second = snapshot(&fx.out());

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn stale_pages_are_cleared_between_runs() {
    let fx = Fixture::new();
    generate(&fx.config(None).unwrap()).unwrap();
    assert!(fx.out().join("general/top.rst").is_file());

    fs::write(fx.repo.join("pkg/general.py"), "def renamed():\n    pass\n").unwrap();
    generate(&fx.config(None).unwrap()).unwrap();

    assert!(!fx.out().join("general/top.rst").exists());
    assert!(fx.out().join("general/renamed.rst").is_file());
}

#[test]
fn path_in_skip_and_step_lists_is_rejected() {
    let fx = Fixture::new();
    fx.write_list("submods_to_skip.txt", &["geometry"]);
    fx.write_list("submods_to_step.txt", &["geometry"]);

    let err = fx.config(None).unwrap_err();
    assert!(matches!(err, GenerateError::InvalidConfig(_)));
}

#[test]
fn missing_fragment_aborts_before_output_is_cleared() {
    let fx = Fixture::new();
    generate(&fx.config(None).unwrap()).unwrap();
    fs::remove_file(fx.docs().join("doc_pages.txt")).unwrap();

    let err = generate(&fx.config(None).unwrap()).unwrap_err();
    assert!(matches!(err, GenerateError::MissingFragment { .. }));
    assert!(fx.out().join("index.rst").is_file(), "previous output must survive");
}

#[test]
fn unreadable_root_directory_is_fatal() {
    let fx = Fixture::new();
    let config = GeneratorConfig::new(
        fx.repo.join("does_not_exist"),
        DocsLayout::new(fx.docs()),
        ExclusionRules::with_defaults(),
        None,
    )
    .unwrap();

    let err = generate(&config).unwrap_err();
    assert!(matches!(err, GenerateError::ReadDir { .. }));
}

#[cfg(unix)]
#[test]
fn non_utf8_names_are_reported_not_dropped_silently() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    let pkg = fx.repo.join("pkg");
    let odd_dir = pkg.join(OsStr::from_bytes(b"caf\xff"));
    create_dir_all(&odd_dir).unwrap();
    fs::write(odd_dir.join("mod.py"), "def hidden():\n    pass\n").unwrap();
    fs::write(pkg.join(OsStr::from_bytes(b"m\xff.py")), "def other():\n    pass\n").unwrap();
    fs::write(pkg.join(OsStr::from_bytes(b"notes\xff.txt")), "ignored\n").unwrap();

    let report = generate(&fx.config(None).unwrap()).expect("generation should succeed");

    assert_eq!(
        report.invalid_names,
        vec!["caf\u{FFFD}".to_string(), "m\u{FFFD}.py".to_string()]
    );
    assert_eq!(report.symbol_pages, 3);
    assert_eq!(report.module_pages, 2);
    assert!(!fx.out().join("caf\u{FFFD}").exists());
}

#[test]
fn redefined_symbols_are_counted_once() {
    let fx = Fixture::new();
    fs::write(
        fx.repo.join("pkg/dupes.py"),
        "def f():\n    pass\n\ndef f(x):\n    return x\n",
    )
    .unwrap();

    let report = generate(&fx.config(None).unwrap()).unwrap();

    assert_eq!(report.symbol_pages, 4);
    let on_disk = snapshot(&fx.out())
        .keys()
        .filter(|p| p.starts_with("dupes"))
        .count();
    assert_eq!(on_disk, 1);
    assert!(fx.read_out("dupes/f.rst").contains(".. autofunction:: pkg.dupes.f"));
}
