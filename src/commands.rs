use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use allergy_check::config::DataPaths;
use allergy_check::license_db::builder::build_table_file;
use allergy_check::license_db::{FileSource, HttpSource, LicenseSource, LicenseTableCache};
use allergy_check::matching::messages::ReasonTemplates;
use allergy_check::models::allergy_list::{
    export_allergy_list, import_allergy_list, resolve_user_list, store_user_data,
};
use allergy_check::{AllergyChecker, AllergyEntry, Evaluation, ReferenceData, WaitPolicy};

use crate::cli::{BuildDbArgs, CheckArgs, ImportListArgs};

/// Exit code 2 flags a high-risk verdict for scripts.
pub const EXIT_HIGH_RISK: i32 = 2;

pub fn run_check(paths: &DataPaths, args: &CheckArgs) -> Result<i32> {
    let reference = ReferenceData::load(&paths.config())?;
    let allergies = load_user_list(paths, &reference.default_allergies);

    let source = license_source(paths, args);
    tracing::debug!(source = %source.describe(), "License table source");
    let cache = Arc::new(LicenseTableCache::new(source));
    let policy = if args.no_wait {
        WaitPolicy::NoWait
    } else {
        WaitPolicy::Block
    };
    let checker = AllergyChecker::new(reference, cache).with_policy(policy);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let evaluation = runtime.block_on(async {
        checker.preload();
        checker.check(&args.text, &args.license, &allergies).await
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_evaluation(&evaluation, checker.disclaimer());
    }

    Ok(if evaluation.worst_rank >= 3 {
        EXIT_HIGH_RISK
    } else {
        0
    })
}

fn license_source(paths: &DataPaths, args: &CheckArgs) -> Arc<dyn LicenseSource> {
    match args.license_db.as_deref() {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            let mut source = HttpSource::new(url);
            if let Some(version) = &args.db_version {
                source = source.with_version(version);
            }
            Arc::new(source)
        }
        Some(path) => Arc::new(FileSource::new(path)),
        None => Arc::new(FileSource::new(paths.license_db())),
    }
}

/// Stored list when present and well-formed, otherwise the bundle defaults.
fn load_user_list(paths: &DataPaths, defaults: &[AllergyEntry]) -> Vec<AllergyEntry> {
    let stored = std::fs::read_to_string(paths.user_list()).ok();
    resolve_user_list(stored.as_deref(), defaults)
}

fn print_evaluation(evaluation: &Evaluation, disclaimer: &str) {
    println!("{}", evaluation.verdict.label());

    if !evaluation.resolved_actives.is_empty() {
        println!("License ingredients: {}", evaluation.resolved_actives.join(", "));
    }
    if let Some(name) = evaluation
        .license_info
        .as_ref()
        .and_then(|info| info.name_zh.as_deref())
    {
        println!("Product: {name}");
    }

    for hit in &evaluation.match_result.direct_hits {
        if hit.note.is_empty() {
            println!("  ! {} (your list)", hit.value);
        } else {
            println!("  ! {} (your list: {})", hit.value, hit.note);
        }
    }
    for group in evaluation.ranked_group_hits() {
        println!(
            "  - {} [{}]: {}",
            group.name,
            group.severity,
            group.hit_members.join(", ")
        );
    }

    if evaluation.show_unverified_warning() {
        let reason = if evaluation.verification.reason.is_empty() {
            ReasonTemplates::insufficient_data()
        } else {
            evaluation.verification.reason.clone()
        };
        println!();
        println!("Not verified: {reason}");
    }

    if !disclaimer.is_empty() {
        println!();
        println!("{disclaimer}");
    }
}

pub fn run_build_db(paths: &DataPaths, args: &BuildDbArgs) -> Result<()> {
    let out = args.out.clone().unwrap_or_else(|| paths.license_db());
    let today = chrono::Local::now().date_naive();
    let report = build_table_file(&args.ingredients, args.names.as_deref(), &out, today)
        .with_context(|| format!("building {}", out.display()))?;

    println!(
        "Wrote {} licenses ({} keys) to {}; skipped {} rows",
        report.licenses,
        report.keys,
        out.display(),
        report.skipped_rows
    );
    Ok(())
}

pub fn run_import_list(paths: &DataPaths, args: &ImportListArgs) -> Result<()> {
    let json = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let entries = import_allergy_list(&json)?;
    write_user_list(&paths.user_list(), &entries)?;
    println!("Imported {} allergy entries", entries.len());
    Ok(())
}

pub fn run_export_list(paths: &DataPaths) -> Result<()> {
    println!("{}", export_list_json(paths)?);
    Ok(())
}

/// The list `check` would use, as a pretty JSON array.
fn export_list_json(paths: &DataPaths) -> Result<String> {
    let defaults = match ReferenceData::load(&paths.config()) {
        Ok(reference) => reference.default_allergies,
        Err(e) => {
            tracing::warn!(error = %e, "No configuration bundle, exporting stored list only");
            Vec::new()
        }
    };
    let entries = load_user_list(paths, &defaults);
    Ok(export_allergy_list(&entries)?)
}

fn write_user_list(path: &Path, entries: &[AllergyEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, store_user_data(entries)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "disclaimer": "For reference only.",
        "allergies": [{"type": "active", "value": "penicillin"}],
        "groups": [{"id": "nsaids", "name": "NSAIDs", "severity": "high",
                    "members": ["aspirin", "ibuprofen"]}]
    }"#;

    fn data_dir() -> (tempfile::TempDir, DataPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        std::fs::write(paths.config(), BUNDLE).unwrap();
        std::fs::create_dir_all(paths.license_db().parent().unwrap()).unwrap();
        std::fs::write(paths.license_db(), r#"{"012345": ["aspirin"], "054321": ["metformin"]}"#)
            .unwrap();
        (dir, paths)
    }

    fn check_args(text: &str, license: &str) -> CheckArgs {
        CheckArgs {
            text: text.to_string(),
            license: license.to_string(),
            license_db: None,
            db_version: None,
            no_wait: false,
            json: false,
        }
    }

    #[test]
    fn high_risk_exits_with_two() {
        let (_dir, paths) = data_dir();
        let code = run_check(&paths, &check_args("", "衛署藥製字第012345號")).unwrap();
        assert_eq!(code, EXIT_HIGH_RISK);
    }

    #[test]
    fn clear_exits_with_zero() {
        let (_dir, paths) = data_dir();
        assert_eq!(run_check(&paths, &check_args("", "054321")).unwrap(), 0);
        assert_eq!(run_check(&paths, &check_args("metformin", "")).unwrap(), 0);
    }

    #[test]
    fn blank_check_is_an_error() {
        let (_dir, paths) = data_dir();
        assert!(run_check(&paths, &check_args(" ", "")).is_err());
    }

    #[test]
    fn missing_bundle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        assert!(run_check(&paths, &check_args("aspirin", "")).is_err());
    }

    #[test]
    fn import_then_export_round_trips_through_data_dir() {
        let (dir, paths) = data_dir();
        let before = import_allergy_list(&export_list_json(&paths).unwrap()).unwrap();
        assert_eq!(before, vec![AllergyEntry::active("penicillin")]);

        let file = dir.path().join("import.json");
        std::fs::write(&file, r#"[{"value": "ibuprofen", "note": "hives"}, {"note": "x"}]"#)
            .unwrap();
        run_import_list(&paths, &ImportListArgs { file }).unwrap();

        let after = import_allergy_list(&export_list_json(&paths).unwrap()).unwrap();
        assert_eq!(after, vec![AllergyEntry::active("ibuprofen").with_note("hives")]);

        let code = run_check(&paths, &check_args("Ibuprofen 200mg", "")).unwrap();
        assert_eq!(code, EXIT_HIGH_RISK);
    }

    #[test]
    fn malformed_import_leaves_stored_list_alone() {
        let (dir, paths) = data_dir();
        let file = dir.path().join("import.json");
        std::fs::write(&file, r#"{"value": "ibuprofen"}"#).unwrap();
        assert!(run_import_list(&paths, &ImportListArgs { file }).is_err());
        assert!(!paths.user_list().exists());
    }

    #[test]
    fn build_db_writes_table_for_check() {
        let (dir, paths) = data_dir();
        let csv = dir.path().join("43_2.csv");
        std::fs::write(&csv, "許可證字號,成分名稱\n衛署藥製字第077777號,Ibuprofen 200mg\n").unwrap();

        run_build_db(
            &paths,
            &BuildDbArgs {
                ingredients: csv,
                names: None,
                out: None,
            },
        )
        .unwrap();

        let code = run_check(&paths, &check_args("", "077777")).unwrap();
        assert_eq!(code, EXIT_HIGH_RISK);
    }
}
