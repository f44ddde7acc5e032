//! Tests for the `budgetdoc generate` command
//!
//! | Situation | Exit | Writes |
//! |-----------|------|--------|
//! | clean input | 0 | requested outputs |
//! | warnings only | 0 | requested outputs |
//! | warnings with --strict | 1 | nothing |
//! | missing required column | 1 | nothing |
//! | nothing left to render | 0 (1 with --strict) | nothing |

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::{tempdir, TempDir};

const HEADER: &str =
    "Director,Mes,Año,Línea de negocio,Ramo,Zona,Canal,Sub-Canal,Oficina,Líder Equipo,Valor";

fn row(director: &str, month: &str, line: &str, amount: &str) -> String {
    format!("{director},{month},2025,{line},Generales,Centro,Agencias,Directo,Bogotá,Ruiz,{amount}")
}

fn perez_csv() -> String {
    [
        HEADER.to_string(),
        row("Pérez", "1", "A", "100"),
        row("Pérez", "1", "B", "200"),
        row("Pérez", "2", "A", "50"),
    ]
    .join("\n")
}

fn write_input(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("presupuesto.csv");
    fs::write(&path, content).unwrap();
    path
}

fn budgetdoc(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_budgetdoc"));
    cmd.current_dir(dir)
        .env_remove("BUDGETDOC_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn generate(dir: &TempDir, input: &Path, args: &[&str]) -> Output {
    budgetdoc(dir.path())
        .arg("generate")
        .arg(input)
        .args(args)
        .output()
        .expect("failed to execute budgetdoc")
}

fn files_in(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn writes_pdf_and_workbook() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, &perez_csv());

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--xlsx", "out.xlsx"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let pdf = fs::read(dir.path().join("out.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    let xlsx = fs::read(dir.path().join("out.xlsx")).unwrap();
    assert_eq!(&xlsx[0..2], b"PK");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Wrote out.pdf (2 unit(s), total 350)"));
}

#[test]
fn default_output_is_the_pdf() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, &perez_csv());

    let output = generate(&dir, &input, &[]);
    assert!(output.status.success());
    assert_eq!(
        files_in(&dir),
        vec!["presupuesto.csv", "programa_asignacion_presupuestal.pdf"]
    );
}

#[test]
fn missing_column_fails_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let csv = "Director,Mes,Año,Línea de negocio,Ramo,Zona,Canal,Sub-Canal,Oficina,Líder Equipo\n\
               Pérez,1,2025,A,Generales,Centro,Agencias,Directo,Bogotá,Ruiz\n";
    let input = write_input(&dir, csv);

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--xlsx", "out.xlsx"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[E001]: missing required columns: Valor"));
    assert!(stderr.contains("available columns: Director, Mes"));
    assert_eq!(files_in(&dir), vec!["presupuesto.csv"]);
}

#[test]
fn dropped_rows_warn_but_succeed() {
    let dir = tempdir().unwrap();
    let csv = format!("{}\n{}\n", perez_csv(), row("", "3", "A", "10"));
    let input = write_input(&dir, &csv);

    let output = generate(&dir, &input, &["--pdf", "out.pdf"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning[W001]"));
    assert!(dir.path().join("out.pdf").exists());
}

#[test]
fn strict_turns_warnings_into_failure() {
    let dir = tempdir().unwrap();
    let csv = format!("{}\n{}\n", perez_csv(), row("", "3", "A", "10"));
    let input = write_input(&dir, &csv);

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--strict"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[W001]"));
    assert!(!dir.path().join("out.pdf").exists());
}

#[test]
fn quiet_hides_warnings() {
    let dir = tempdir().unwrap();
    let csv = format!("{}\n{}\n", perez_csv(), row("", "3", "A", "10"));
    let input = write_input(&dir, &csv);

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--quiet"]);
    assert!(output.status.success());
    assert!(output.stderr.is_empty());
    assert!(output.stdout.is_empty());
}

#[test]
fn selection_limits_units() {
    let dir = tempdir().unwrap();
    let csv = format!("{}\n{}\n", perez_csv(), row("Gómez", "1", "C", "5"));
    let input = write_input(&dir, &csv);

    let output = generate(
        &dir,
        &input,
        &["--pdf", "out.pdf", "--director", "perez", "--month", "enero"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(1 unit(s), total 300)"));
}

#[test]
fn unmatched_selection_writes_nothing() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, &perez_csv());

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--director", "Nadie"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning[W002]: no records for director 'Nadie'"));
    assert!(stderr.contains("warning[W003]"));
    assert!(!dir.path().join("out.pdf").exists());

    let strict = generate(&dir, &input, &["--pdf", "out.pdf", "--director", "Nadie", "--strict"]);
    assert_eq!(strict.status.code(), Some(1));
}

#[test]
fn json_output_describes_the_run() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, &perez_csv());

    let output = generate(&dir, &input, &["--xlsx", "out.xlsx", "--format", "json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["units"].as_array().unwrap().len(), 2);
    assert_eq!(json["units"][0]["director"], "Pérez");
    assert_eq!(json["units"][0]["month"], "enero");
    assert_eq!(json["units"][0]["total"], "300");
    assert_eq!(json["total"], "350");
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
    assert_eq!(json["outputs"], serde_json::json!(["out.xlsx"]));
    assert_eq!(json["diagnostics"], serde_json::json!([]));
    assert!(!dir.path().join("programa_asignacion_presupuestal.pdf").exists());
}

#[test]
fn json_output_reports_missing_columns() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "Director,Mes\nPérez,1\n");

    let output = generate(&dir, &input, &["--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let diagnostics = json["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["code"], "E001");
    assert_eq!(diagnostics[0]["severity"], "error");
    assert!(diagnostics[0]["message"].as_str().unwrap().contains("Valor"));
}

#[test]
fn profile_adds_column_names() {
    let dir = tempdir().unwrap();
    let csv = perez_csv().replacen("Director", "Gerente", 1);
    let input = write_input(&dir, &csv);
    let profile = dir.path().join("budgetdoc.toml");
    fs::write(&profile, "[columns]\nDirector = [\"Gerente\"]\n").unwrap();

    let without = generate(&dir, &input, &["--pdf", "a.pdf"]);
    assert_eq!(without.status.code(), Some(1));

    let with = budgetdoc(dir.path())
        .env("BUDGETDOC_CONFIG", &profile)
        .arg("generate")
        .arg(&input)
        .args(["--pdf", "b.pdf"])
        .output()
        .unwrap();
    assert!(with.status.success(), "stderr: {}", String::from_utf8_lossy(&with.stderr));
    assert!(dir.path().join("b.pdf").exists());
}

#[test]
fn unreadable_input_is_a_fatal_error() {
    let dir = tempdir().unwrap();
    let output = generate(&dir, &dir.path().join("nope.csv"), &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: cannot read"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("presupuesto.txt");
    fs::write(&path, "x").unwrap();
    let output = generate(&dir, &path, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported input format"));
}

#[test]
fn png_logo_is_used() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, &perez_csv());
    let logo = dir.path().join("logo.png");
    image::RgbaImage::from_pixel(6, 3, image::Rgba([10, 20, 30, 128]))
        .save(&logo)
        .unwrap();

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--logo", "logo.png"]);
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("logo not usable"));
    assert!(dir.path().join("out.pdf").exists());
}

#[test]
fn unusable_logo_is_skipped_with_a_warning() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, &perez_csv());
    fs::write(dir.path().join("logo.png"), "not an image").unwrap();

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--logo", "logo.png"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("logo not usable"));
    assert!(dir.path().join("out.pdf").exists());
}

#[test]
fn oversized_amounts_count_as_zero() {
    let dir = tempdir().unwrap();
    let csv = [
        HEADER.to_string(),
        row("Pérez", "1", "A", "5e28"),
        row("Pérez", "1", "A", "5e28"),
        row("Pérez", "1", "B", "25"),
    ]
    .join("\n");
    let input = write_input(&dir, &csv);

    let output = generate(&dir, &input, &["--pdf", "out.pdf", "--xlsx", "out.xlsx"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("info[I001]: 2 amount value(s)"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(1 unit(s), total 25)"));
}
