// Integration tests for Djangoscope

use assert_cmd::Command;
use djangoscope::{
    render_text, Config, FieldDeclaration, ManagerDeclaration, ProjectAnalyzer, Relation,
    RelationKind,
};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// Helper to create an analyzer with default config
fn create_analyzer() -> ProjectAnalyzer {
    ProjectAnalyzer::new(Config::default()).expect("Failed to create analyzer")
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

// ============================================================================
// Analysis Tests
// ============================================================================

#[test]
fn test_analyze_shop_models() {
    let report = create_analyzer()
        .analyze(&fixtures_path("shop"))
        .expect("Analysis failed");

    let names: Vec<&str> = report
        .models()
        .iter()
        .map(|m| m.qualified_name.as_str())
        .collect();
    assert_eq!(names, vec!["blog.Post", "products.Category", "products.Product"]);

    let product = report.model("products.Product").unwrap();
    assert_eq!(
        product.fields,
        vec![
            FieldDeclaration::new("name", "CharField").with_max_length(200),
            FieldDeclaration::new("price", "DecimalField"),
            FieldDeclaration::new("is_available", "BooleanField"),
        ]
    );
    assert_eq!(product.methods, vec!["__str__", "get_absolute_url", "sale_price"]);

    // ForeignKey does not end in `Field`
    let category = report.model("products.Category").unwrap();
    assert_eq!(category.fields.len(), 2);
    assert_eq!(category.methods, vec!["__str__"]);
    assert!(!category.is_abstract);

    let post = report.model("blog.Post").unwrap();
    let post_fields: Vec<&str> = post.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(post_fields, vec!["title", "body", "published", "draft"]);
    assert_eq!(post.methods, vec!["notify"]);
}

#[test]
fn test_analyze_shop_relations_and_managers() {
    let report = create_analyzer()
        .analyze(&fixtures_path("shop"))
        .expect("Analysis failed");

    let product = report.model("products.Product").unwrap();
    assert_eq!(
        product.relations,
        vec![Relation {
            field: "category".to_string(),
            kind: RelationKind::ForeignKey,
            target: "Category".to_string(),
            related_name: None,
        }]
    );
    assert_eq!(
        product.managers,
        vec![ManagerDeclaration::new("objects", "ProductManager")]
    );

    let category = report.model("products.Category").unwrap();
    assert_eq!(category.relations[0].field, "parent");
    assert_eq!(category.relations[0].target, "self");
    assert!(category.fields.iter().all(|f| f.required));
    assert_eq!(category.fields[0].max_length, Some(200));

    let post = report.model("blog.Post").unwrap();
    assert!(post.relations.is_empty());
    assert!(post.managers.is_empty());
}

#[test]
fn test_analyze_shop_routes() {
    let report = create_analyzer()
        .analyze(&fixtures_path("shop"))
        .expect("Analysis failed");

    let files: Vec<String> = report
        .routes
        .iter()
        .map(|f| f.path.parent().unwrap().file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(files, vec!["blog", "broken", "config", "products"]);

    let blog = &report.routes[0];
    assert_eq!(blog.patterns.len(), 1);
    assert_eq!(blog.patterns[0].pattern, "");
    assert_eq!(blog.patterns[0].view.as_deref(), Some("index"));
    assert_eq!(blog.patterns[0].name, None);

    let products = &report.routes[3];
    assert_eq!(products.namespace.as_deref(), Some("products"));
    let detail = &products.patterns[2];
    assert_eq!(detail.pattern, "product/<slug:slug>/");
    assert_eq!(detail.view, None);
    assert_eq!(detail.name.as_deref(), Some("product_detail"));

    let featured = &products.patterns[1];
    assert_eq!(featured.pattern, "featured/");
    assert_eq!(featured.view.as_deref(), Some("views.featured_products"));
    assert_eq!(featured.name.as_deref(), Some("featured_products"));
}

#[test]
fn test_invalid_file_does_not_abort_sibling() {
    let report = create_analyzer()
        .analyze(&fixtures_path("shop"))
        .expect("Analysis failed");

    assert_eq!(report.parse_errors.len(), 1);
    assert!(report.parse_errors[0].path.ends_with("broken/models.py"));
    assert!(report.models().iter().all(|m| m.app != "broken"));

    let broken_routes = report
        .routes
        .iter()
        .find(|f| f.path.ends_with("broken/urls.py"))
        .expect("sibling urls.py should still be processed");
    assert_eq!(broken_routes.patterns[0].name.as_deref(), Some("still_works"));
}

#[test]
fn test_excluded_directories_never_reported() {
    let report = create_analyzer()
        .analyze(&fixtures_path("shop"))
        .expect("Analysis failed");

    assert!(report.models().iter().all(|m| m.name != "Vendored" && m.name != "Widget"));
    assert!(report
        .parse_errors
        .iter()
        .all(|f| !f.path.to_string_lossy().contains("venv")));
}

#[test]
fn test_report_is_deterministic() {
    let analyzer = create_analyzer();
    let first = render_text(&analyzer.analyze(&fixtures_path("shop")).unwrap());
    let second = render_text(&analyzer.analyze(&fixtures_path("shop")).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_collision_depends_on_traversal_order() {
    let alpha = "class Item(models.Model):\n    alpha = models.CharField()\n";
    let beta = "class Item(models.Model):\n    beta = models.IntegerField()\n";

    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/shop/models.py", alpha);
    write(dir.path(), "b/shop/models.py", beta);
    let report = create_analyzer().analyze(dir.path()).unwrap();
    assert_eq!(report.model("shop.Item").unwrap().fields[0].name, "beta");

    // Same two files, visited in the opposite order
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/shop/models.py", beta);
    write(dir.path(), "b/shop/models.py", alpha);
    let report = create_analyzer().analyze(dir.path()).unwrap();
    assert_eq!(report.model("shop.Item").unwrap().fields[0].name, "alpha");
    assert_eq!(report.models().len(), 1);
}

#[test]
fn test_custom_route_functions() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "legacy/urls.py",
        "urlpatterns = [re_path(r'^(?P<year>[0-9]{4})/$', views.archive, name='archive')]\n",
    );

    let report = create_analyzer().analyze(dir.path()).unwrap();
    assert!(report.routes.is_empty());

    let mut config = Config::default();
    config.routes.functions.push("re_path".to_string());
    let report = ProjectAnalyzer::new(config).unwrap().analyze(dir.path()).unwrap();
    assert_eq!(report.routes[0].patterns[0].params, vec!["year"]);
}

// ============================================================================
// CLI Tests
// ============================================================================

#[test]
fn test_cli_text_report() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("djangoscope")
        .unwrap()
        .current_dir(dir.path())
        .arg("analyze")
        .arg(fixtures_path("shop"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Model: products.Product\n  Fields: [name:CharField, price:DecimalField, is_available:BooleanField]\n  Methods: [__str__, get_absolute_url, sale_price]\n",
        ))
        .stdout(predicate::str::contains(
            "  Pattern: product/<slug:slug>/ -> N/A\n    Name: product_detail\n",
        ))
        .stdout(predicate::str::contains(
            "  Pattern: featured/ -> views.featured_products\n    Name: featured_products\n",
        ))
        .stdout(predicate::str::contains("  Pattern: admin/ -> N/A\n"))
        .stdout(predicate::str::contains("Vendored").not());
}

#[test]
fn test_cli_json_report() {
    let dir = TempDir::new().unwrap();
    let output = Command::cargo_bin("djangoscope")
        .unwrap()
        .current_dir(dir.path())
        .args(["analyze", "--format", "json"])
        .arg(fixtures_path("shop"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["models"]["products.Product"]["fields"][0]["type"], "CharField");
    assert_eq!(value["models"]["products.Product"]["fields"][0]["max_length"], 200);
    assert_eq!(
        value["models"]["products.Product"]["relations"][0]["target"],
        "Category"
    );
    assert_eq!(
        value["models"]["products.Product"]["managers"][0]["type"],
        "ProductManager"
    );
    assert_eq!(value["parse_errors"].as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_default_root_is_working_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "shop/models.py", "class Cart(models.Model):\n    pass\n");

    Command::cargo_bin("djangoscope")
        .unwrap()
        .current_dir(dir.path())
        .arg("analyze")
        .assert()
        .success()
        .stdout("Model: shop.Cart\n  Fields: []\n  Methods: []\n");
}

#[test]
fn test_cli_config_file_in_working_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "djangoscope.toml", "[output]\nformat = \"json\"\n");
    write(dir.path(), "shop/models.py", "class Cart(models.Model):\n    pass\n");

    Command::cargo_bin("djangoscope")
        .unwrap()
        .current_dir(dir.path())
        .arg("analyze")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"shop.Cart\""));
}

#[test]
fn test_cli_missing_root_fails() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("djangoscope")
        .unwrap()
        .current_dir(dir.path())
        .args(["analyze", "/nonexistent/project/root"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_cli_parse_errors_do_not_change_exit_code() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad/models.py", "def (:\n");

    Command::cargo_bin("djangoscope")
        .unwrap()
        .current_dir(dir.path())
        .arg("analyze")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("djangoscope")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("djangoscope "));
}
