//! End-to-end pipeline test: raw extracts in, enriched Parquet fact
//! table out, on real files in a scratch directory.

use std::fs;
use std::path::PathBuf;

use casemix::models::LegalStatus;
use casemix::{EnrichmentDriver, PipelineConfig, Result};

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("casemix-{test}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch directory");
    dir
}

fn ej_row(id: &str, name: &str, code: &str) -> String {
    let mut fields = vec![""; 17];
    fields[0] = "structureej";
    fields[1] = id;
    fields[2] = name;
    fields[16] = code;
    fields.join(";")
}

/// Write the full set of input extracts for one run.
fn write_fixtures(config: &PipelineConfig) {
    let casemix = "\
Finess;Annee;Code;Libellé;Effectif;Durée moyennede séjour;Age moyen;Sexe ratio(% homme);% décès;DA;GP;Classif PKCS
ET1;2023;GHM01;Arthroplastie du genou;10;4,2;68,0;45,0%;0,5%;Orthopédie;G1;C
ET1;2024;GHM01;Arthroplastie du genou;12;4,0;67,5;44,0%;0,4%;Orthopédie;G1;C
ZZ;2023;ZZZZ;Acte hors campagne;2;;;;;;;
ET1;2023;;Total toutes activités;22;;;;;;;
";
    fs::write(&config.raw_casemix, casemix).unwrap();

    let status = format!(
        "{}\n{}\nstructureet;ET1;EJ1\n",
        ej_row("EJ1", "CH EXEMPLE", "30"),
        ej_row("EJ2", "SAS CLINIQUE EXEMPLE", "73"),
    );
    fs::write(&config.legal_status_file, status).unwrap();

    for (year, path) in &config.tariff_files {
        let body = match *year {
            2022 => "Code;Libellé;Tarif public;Tarif privé\nGHM01;Arthroplastie;900,00;1 300,00\n",
            2023 => "Code;Libellé;Tarif public;Tarif privé\nGHM01;Arthroplastie;1 000,00;1 500,00\n",
            // 2024 campaign published without GHM01
            _ => "Code;Libellé;Tarif public;Tarif privé\n",
        };
        fs::write(path, body).unwrap();
    }

    fs::write(
        &config.names_file,
        "Finess,Raison sociale\nET1,CH EXEMPLE SITE PRINCIPAL\nZZ,ETABLISSEMENT X\n",
    )
    .unwrap();
}

#[test]
fn test_ingest_then_enrich_end_to_end() -> Result<()> {
    let dir = scratch_dir("pipeline");
    let config = PipelineConfig::for_dir(&dir);
    write_fixtures(&config);

    let driver = EnrichmentDriver::new(config.clone());

    let report = driver.ingest()?;
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.retained_rows, 3);
    assert_eq!(report.dropped_rows, 1); // the "Total" aggregate line

    let summary = driver.enrich()?;
    assert_eq!(summary.row_count, 3);
    assert_eq!(summary.status.via_correspondence, 2); // both ET1 rows
    assert_eq!(summary.status.unresolved, 1); // ZZ, nowhere in the registry
    assert_eq!(summary.tariffs.with_public_tariff, 1); // only GHM01 2023
    assert_eq!(summary.tariffs.code_unknown, 1);

    let rows = casemix::store::read_fact_table(&config.fact_table)?;
    assert_eq!(rows.len(), 3);

    let et1_2023 = rows
        .iter()
        .find(|r| r.finess == "ET1" && r.year == 2023)
        .expect("ET1 2023 row");
    assert_eq!(et1_2023.legal_status, LegalStatus::Public);
    assert_eq!(et1_2023.status_detail.as_deref(), Some("EJ EJ1, code 30"));
    assert_eq!(et1_2023.public_tariff, Some(1000.0));
    assert_eq!(et1_2023.public_revenue, Some(10_000.0));
    assert_eq!(et1_2023.private_revenue, Some(15_000.0));
    assert_eq!(et1_2023.mean_stay, Some(4.2));

    // The 2024 campaign has no tariff for this code: nulls, no borrowing
    // from 2023.
    let et1_2024 = rows
        .iter()
        .find(|r| r.finess == "ET1" && r.year == 2024)
        .expect("ET1 2024 row");
    assert_eq!(et1_2024.legal_status, LegalStatus::Public);
    assert_eq!(et1_2024.public_tariff, None);
    assert_eq!(et1_2024.public_revenue, None);

    // Unknown code: all-null financials, row preserved.
    let zz = rows.iter().find(|r| r.finess == "ZZ").expect("ZZ row");
    assert_eq!(zz.legal_status, LegalStatus::Unresolved);
    assert_eq!(zz.public_tariff, None);
    assert_eq!(zz.private_revenue, None);

    // The enrichment pass overwrote the fact table, so a backup of the
    // ingested generation must exist; the side artifacts too.
    assert!(config.backup_path().exists());
    assert!(config.tariff_reference.exists());
    let summary_json = fs::read_to_string(&config.summary_file)?;
    let parsed: serde_json::Value = serde_json::from_str(&summary_json)
        .map_err(|e| casemix::CasemixError::other(format!("bad summary JSON: {e}")))?;
    assert_eq!(parsed["row_count"], 3);

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_backup_is_one_generation_only() -> Result<()> {
    let dir = scratch_dir("backup");
    let config = PipelineConfig::for_dir(&dir);
    write_fixtures(&config);

    let driver = EnrichmentDriver::new(config.clone());
    driver.ingest()?;
    driver.enrich()?;

    let first_backup = fs::read(config.backup_path())?;
    // A rerun must not clobber the existing backup.
    driver.enrich()?;
    let second_backup = fs::read(config.backup_path())?;
    assert_eq!(first_backup, second_backup);

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_fact_table_roundtrip_preserves_nulls() -> Result<()> {
    let dir = scratch_dir("roundtrip");
    let path = dir.join("facts.parquet");

    let mut enriched = casemix::FactRow::new("750712184", 2023, "01C031", "Craniotomies", 12);
    enriched.mean_stay = Some(6.4);
    enriched.legal_status = LegalStatus::PrivateNonProfit;
    enriched.status_detail = Some("code 63".to_string());
    enriched.public_tariff = Some(5332.90);
    enriched.public_revenue = Some(12.0 * 5332.90);
    let bare = casemix::FactRow::new("690781810", 2022, "02C051", "Interventions", 3);

    casemix::store::write_fact_table(&path, &[enriched.clone(), bare.clone()])?;
    let rows = casemix::store::read_fact_table(&path)?;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], enriched);
    assert_eq!(rows[1], bare);
    assert_eq!(rows[1].legal_status, LegalStatus::Unresolved);
    assert_eq!(rows[1].mean_stay, None);

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_enrich_without_fact_table_fails() {
    let dir = scratch_dir("missing");
    let config = PipelineConfig::for_dir(&dir);
    write_fixtures(&config);
    // No ingest: the fact table does not exist yet.
    let err = EnrichmentDriver::new(config).enrich().unwrap_err();
    assert!(err.to_string().contains("fact table"));

    let _ = fs::remove_dir_all(&dir);
}
