//! End-to-end scenarios against on-disk fixture trees, modeled on the
//! `watchergolden` tree: a root package, a nested test sub-package, a flat
//! re-export chain, and a deliberately broken module.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tdw::{PlainTextRenderer, Renderer, WatchedDir};

fn pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap()
}

fn mkpkg(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("__init__.py"), "").unwrap();
}

fn touch_forward(path: &Path, secs_ahead: u64) {
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(secs_ahead)).unwrap();
}

fn ignore_init() -> Vec<String> {
    vec!["__init__.py".to_string()]
}

/// Scenario 1: direct imports fan each production edit out to the right
/// subset of tests, and a file untouched by any edit never reappears.
#[test]
fn scenario_direct_imports_fan_out_precisely() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    fs::write(pkg.join("pm1.py"), "def pm1f():\n    pass\n").unwrap();
    fs::write(pkg.join("pm2.py"), "def pm2f():\n    pass\n").unwrap();
    fs::write(pkg.join("suffix_test.py"), "from pm1 import pm1f\nfrom pm2 import pm2f\n").unwrap();
    fs::write(pkg.join("test_prefix.py"), "from pm1 import pm1f\n").unwrap();

    let mut wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_secs(5), "python3".to_string()).unwrap();
    let p = pool();

    let first = wd.test_modules_to_run(&p).to_run();
    assert_eq!(first, [pkg.join("suffix_test.py"), pkg.join("test_prefix.py")].into_iter().collect());

    touch_forward(&pkg.join("pm1.py"), 10);
    let second = wd.test_modules_to_run(&p).to_run();
    assert_eq!(second, [pkg.join("suffix_test.py"), pkg.join("test_prefix.py")].into_iter().collect());

    touch_forward(&pkg.join("pm2.py"), 20);
    let third = wd.test_modules_to_run(&p).to_run();
    assert_eq!(third, [pkg.join("suffix_test.py")].into_iter().collect());
}

/// Scenario 2: a test nested in a sub-package that package-imports a
/// production module is reached by editing that module, alongside any
/// sibling test that reaches it directly.
#[test]
fn scenario_nested_test_reached_via_package_import() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    fs::write(pkg.join("pm2.py"), "def pm2f():\n    pass\n").unwrap();
    fs::write(pkg.join("suffix_test.py"), "from pm2 import pm2f\n").unwrap();
    let tests_dir = pkg.join("tests");
    mkpkg(&tests_dir);
    fs::write(tests_dir.join("test_prefix_dir.py"), "from pkg import pm2\n").unwrap();

    let mut wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_secs(5), "python3".to_string()).unwrap();
    let p = pool();
    let _ = wd.test_modules_to_run(&p);

    touch_forward(&pkg.join("pm2.py"), 10);
    let to_run = wd.test_modules_to_run(&p).to_run();
    assert!(to_run.contains(&tests_dir.join("test_prefix_dir.py")));
    assert!(to_run.contains(&pkg.join("suffix_test.py")));
}

/// Scenario 3: editing a module reached only through a one-level wildcard
/// re-export still reruns the test that imports it by the re-exported name.
#[test]
fn scenario_wildcard_reexport_fans_out() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    let than_nested = pkg.join("flat").join("is_better").join("than_nested");
    mkpkg(&pkg.join("flat"));
    mkpkg(&pkg.join("flat").join("is_better"));
    mkpkg(&than_nested);
    fs::write(than_nested.join("deep.py"), "def answer():\n    return 42\n").unwrap();
    fs::write(
        pkg.join("flat").join("is_better").join("nest.py"),
        "from pkg.flat.is_better.than_nested.deep import *\n",
    )
    .unwrap();
    let tests_dir = pkg.join("tests");
    mkpkg(&tests_dir);
    fs::write(tests_dir.join("test_prefix_dir.py"), "from pkg.flat.is_better.nest import deep\n").unwrap();

    let mut wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_secs(5), "python3".to_string()).unwrap();
    let p = pool();
    let _ = wd.test_modules_to_run(&p);

    touch_forward(&than_nested.join("deep.py"), 10);
    let to_run = wd.test_modules_to_run(&p).to_run();
    assert!(to_run.contains(&tests_dir.join("test_prefix_dir.py")), "to_run: {to_run:?}");
}

/// Scenario 4: a registered static mapping reruns a test that has no import
/// relationship whatsoever with the production file.
#[test]
fn scenario_static_mapping_forces_rerun() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    fs::write(pkg.join("deep.py"), "def answer():\n    return 42\n").unwrap();
    fs::write(pkg.join("suffix_test.py"), "x = 1\n").unwrap();

    let mut wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_secs(5), "python3".to_string()).unwrap();
    wd.register_mapping("deep.py->suffix_test.py");
    let p = pool();
    let _ = wd.test_modules_to_run(&p);

    touch_forward(&pkg.join("deep.py"), 10);
    let to_run = wd.test_modules_to_run(&p).to_run();
    assert!(to_run.contains(&pkg.join("suffix_test.py")));
}

/// Scenario 5: a test module with a syntax error produces no JSON and
/// non-empty stderr; the dispatcher reports it as a single keyed error
/// rather than crashing the run.
#[test]
fn scenario_broken_module_surfaces_as_single_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    let broken = pkg.join("compile_test.py");
    fs::write(&broken, "def f(:\n    pass\n").unwrap();

    let wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_secs(10), "python3".to_string()).unwrap();
    let p = pool();
    let outcome = wd.run(&[broken.clone()], &p);

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    let (_key, message) = outcome.errors.iter().next().unwrap();
    assert!(message.starts_with("    "));
}

/// Scenario 6: two suite records emitted by a single module both decode,
/// and their counters sum correctly once rendered.
#[test]
fn scenario_two_suites_in_one_stdout_both_decode() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    let multi = pkg.join("suffix_test.py");
    fs::write(
        &multi,
        "print('{\"test_suite\": \"a\", \"tests_count\": 2, \"fails_count\": 0, \"fails\": [], \"test_logs\": {}}')\n\
         print('{\"test_suite\": \"b\", \"tests_count\": 3, \"fails_count\": 1, \"fails\": [\"test_x\"], \"test_logs\": {}}')\n",
    )
    .unwrap();

    let wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_secs(10), "python3".to_string()).unwrap();
    let p = pool();
    let outcome = wd.run(&[multi], &p);

    assert_eq!(outcome.records.len(), 2);
    let records = tdw::parse_records(&outcome.records);
    assert_eq!(records.len(), 2);
    let total_tests: u64 = records.iter().map(|r| r.tests_count).sum();
    let total_fails: u64 = records.iter().map(|r| r.fails_count).sum();
    assert_eq!(total_tests, 5);
    assert_eq!(total_fails, 1);

    let mut renderer = PlainTextRenderer;
    renderer.on_cycle(&tdw::CycleReport { cycle: 1, records, errors: outcome.errors, elapsed: Duration::from_millis(1) });
}

/// P2: the resolved root package is always an ancestor-or-self of the
/// watched directory, never a sibling or descendant.
#[test]
fn property_root_package_is_prefix_of_watched_dir() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path().join("pkg");
    mkpkg(&root);
    let nested = root.join("tests");
    mkpkg(&nested);
    let resolved = tdw::walker::resolve_root_package(&nested);
    assert!(nested.canonicalize().unwrap().starts_with(&resolved));
}

/// P4: a second cycle with nothing touched yields an empty to-run set.
#[test]
fn property_unchanged_second_cycle_is_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    fs::write(pkg.join("test_a.py"), "").unwrap();
    let mut wd = WatchedDir::new(pkg, vec![], ignore_init(), Duration::from_secs(5), "python3".to_string()).unwrap();
    let p = pool();
    let _ = wd.test_modules_to_run(&p);
    assert!(wd.test_modules_to_run(&p).is_empty());
}

/// P9: a dispatcher split on concatenated stdout always yields individually
/// parseable JSON objects.
#[test]
fn property_split_records_are_each_valid_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    let multi = pkg.join("suffix_test.py");
    fs::write(
        &multi,
        "print('{\"test_suite\": \"a\", \"tests_count\": 1, \"fails_count\": 0, \"fails\": [], \"test_logs\": {}}')\n\
         print('{\"test_suite\": \"b\", \"tests_count\": 1, \"fails_count\": 0, \"fails\": [], \"test_logs\": {}}')\n",
    )
    .unwrap();

    let wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_secs(5), "python3".to_string()).unwrap();
    let p = pool();
    let outcome = wd.run(&[multi], &p);
    for raw in &outcome.records {
        assert!(serde_json::from_str::<serde_json::Value>(raw).is_ok(), "not valid json: {raw}");
    }
}

/// P10: a test that sleeps well past its configured timeout is killed and
/// reported as a timeout error rather than hanging the cycle.
#[test]
fn property_timeout_bounds_a_single_slow_module() {
    let tmp = tempfile::TempDir::new().unwrap();
    let pkg = tmp.path().join("pkg");
    mkpkg(&pkg);
    let slow = pkg.join("test_slow.py");
    fs::write(&slow, "import time\ntime.sleep(5)\n").unwrap();

    let wd = WatchedDir::new(pkg.clone(), vec![], ignore_init(), Duration::from_millis(200), "python3".to_string()).unwrap();
    let p = pool();
    let start = std::time::Instant::now();
    let outcome = wd.run(&[slow], &p);
    assert!(start.elapsed() < Duration::from_secs(3), "timeout did not bound the run");
    assert_eq!(outcome.errors.len(), 1);
}
