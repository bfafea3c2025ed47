// src/pipeline/info.rs

//! Report what has been collected so far.

use crate::error::Result;
use crate::models::YearRange;
use crate::storage::LocalStorage;
use crate::utils;

/// Collected data for one year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearInfo {
    pub year: i32,
    pub records: usize,
    pub with_pdf_link: usize,
    pub pdfs_on_disk: usize,
}

/// Count recorded papers and downloaded PDFs per year.
pub async fn run_info(storage: &LocalStorage, years: YearRange) -> Result<Vec<YearInfo>> {
    utils::log::header(&format!("Collected data in {}", storage.root().display()));

    let mut report = Vec::new();
    for year in years.iter() {
        let records = storage.load_records(year).await?;
        let info = YearInfo {
            year,
            records: records.len(),
            with_pdf_link: records.iter().filter(|r| r.has_pdf()).count(),
            pdfs_on_disk: storage.count_pdfs(year).await?,
        };
        log::info!(
            "{year}: {} papers recorded, {} with PDF link, {} PDFs on disk",
            info.records,
            info.with_pdf_link,
            info.pdfs_on_disk
        );
        report.push(info);
    }
    Ok(report)
}
